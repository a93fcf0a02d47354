//! New asset form, optionally preselecting a strategy via `?strategy=`.

use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{LookupTable, NewAsset, Strategy};
use crate::dom::{Document, EventKind};
use crate::page::{Page, PageContext};
use crate::pages::common::{
    hide, lookup_options, read_asset_fields, require_user, show_message, ASSET_FIELDS_INVALID,
};
use crate::util::html::{escape, escape_attr};

pub const TITLE: &str = "Add Asset | Asset Tracking System";

/// Delay between the success toast and the redirect.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(1500);

const ASSETS_HASH: &str = "#/assets";

const MARKUP: &str = r##"<section class="row justify-content-center">
  <div class="col-lg-8">
    <h1 class="h3 mb-4">Add Asset</h1>
    <div class="alert alert-info" id="strategy-info" hidden>Adding to <strong id="strategy-name"></strong></div>
    <div class="alert alert-danger" id="form-error" hidden></div>
    <div class="alert alert-success" id="success-toast" hidden>Asset created</div>
    <form id="asset-form" class="card card-body border-0 shadow-sm" novalidate>
      <label class="form-label" for="strategy-id">Strategy</label>
      <select class="form-select mb-3" id="strategy-id" required><option value="">-- Select a Strategy --</option></select>
      <label class="form-label" for="ticker">Ticker</label>
      <input type="text" class="form-control mb-3" id="ticker" required>
      <label class="form-label" for="name">Name</label>
      <input type="text" class="form-control mb-3" id="name" required>
      <label class="form-label" for="exchange">Exchange</label>
      <input type="text" class="form-control mb-3" id="exchange" required>
      <label class="form-label" for="quantity">Quantity</label>
      <input type="number" class="form-control mb-3" id="quantity" min="0" step="any" required>
      <label class="form-label" for="target">Target</label>
      <select class="form-select mb-3" id="target" required><option value="">-- Select a Target --</option></select>
      <div class="d-flex gap-2">
        <button type="button" class="btn btn-accent" id="submit-btn">Add Asset</button>
        <button type="button" class="btn btn-outline-secondary" id="cancel-btn">Cancel</button>
      </div>
    </form>
  </div>
</section>"##;

pub struct AssetAddPage;

#[async_trait]
impl Page for AssetAddPage {
    fn title(&self) -> &str {
        TITLE
    }

    fn render(&self) -> String {
        MARKUP.to_string()
    }

    async fn init(&self, ctx: PageContext) {
        let Some(user) = require_user(&ctx).await else {
            return;
        };
        let preselected = ctx.query("strategy").filter(|id| !id.is_empty());

        let backend = match ctx.backend().client().await {
            Ok(backend) => backend,
            Err(e) => return show_message(ctx.document(), "form-error", &e.to_string()),
        };
        let (strategies, targets) = tokio::join!(
            backend.user_strategies(&user.id),
            backend.lookup(LookupTable::Targets)
        );
        let strategies = strategies.unwrap_or_else(|e| {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to fetch strategies");
            Vec::new()
        });
        let targets = targets.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch targets");
            Vec::new()
        });

        let doc = ctx.document();
        doc.set_inner_html("strategy-id", &strategy_options(&strategies));
        doc.set_inner_html("target", &lookup_options("-- Select a Target --", &targets));

        // Only a strategy the user owns can be preselected.
        if let Some(strategy) = preselected
            .as_deref()
            .and_then(|id| strategies.iter().find(|s| s.id == id))
        {
            doc.set_value("strategy-id", &strategy.id);
            doc.set_text("strategy-name", &strategy.title);
            doc.set_visible("strategy-info", true);
        }

        ctx.on("submit-btn", EventKind::Click, move |ctx, _| {
            let preselected = preselected.clone();
            async move { submit(ctx, preselected).await }
        });
        ctx.on("cancel-btn", EventKind::Click, |ctx, _| async move {
            ctx.redirect(ASSETS_HASH);
        });
    }
}

async fn submit(ctx: PageContext, preselected: Option<String>) {
    let doc = ctx.document();
    hide(doc, "form-error");

    let strategy_id = doc.value("strategy-id").unwrap_or_default();
    if strategy_id.is_empty() {
        show_message(doc, "form-error", "Please select or specify a strategy");
        return;
    }
    let Some(fields) = read_asset_fields(doc) else {
        doc.toggle_class("asset-form", "was-validated", true);
        show_message(doc, "form-error", ASSET_FIELDS_INVALID);
        return;
    };

    doc.set_disabled("submit-btn", true);
    let result = match ctx.backend().client().await {
        Ok(backend) => {
            backend
                .create_asset(NewAsset {
                    strategy_id: strategy_id.clone(),
                    ticker: fields.ticker,
                    name: fields.name,
                    exchange: fields.exchange,
                    quantity: fields.quantity,
                    target_id: fields.target_id,
                    action_id: None,
                })
                .await
        }
        Err(e) => Err(e),
    };

    let doc = ctx.document();
    match result {
        Ok(asset) => {
            tracing::info!(asset_id = %asset.id, strategy_id = %strategy_id, "Asset created");
            doc.set_visible("success-toast", true);
            let next = match preselected {
                Some(id) => format!("#/strategies/{}", id),
                None => ASSETS_HASH.to_string(),
            };
            ctx.redirect_after(REDIRECT_DELAY, &next).await;
        }
        Err(e) => {
            tracing::warn!(strategy_id = %strategy_id, error = %e, "Failed to create asset");
            show_message(doc, "form-error", &format!("Failed to create asset: {}", e));
            doc.set_disabled("submit-btn", false);
        }
    }
}

fn strategy_options(strategies: &[Strategy]) -> String {
    let mut markup = r#"<option value="">-- Select a Strategy --</option>"#.to_string();
    for strategy in strategies {
        markup.push_str(&format!(
            r#"<option value="{}">{}</option>"#,
            escape_attr(&strategy.id),
            escape(&strategy.title)
        ));
    }
    markup
}
