//! Edit one asset; ownership comes from the asset's strategy.

use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{Asset, AssetUpdate, LookupTable};
use crate::dom::{Document, EventKind};
use crate::page::{Page, PageContext};
use crate::pages::common::{
    hide, lookup_options, read_asset_fields, require_user, show_message, ASSET_FIELDS_INVALID,
};
use crate::util::format;

pub const TITLE: &str = "Edit Asset | Asset Tracking System";

/// Delay between the success toast and the redirect.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(1500);

const ASSETS_HASH: &str = "#/assets";

const MARKUP: &str = r##"<section class="row justify-content-center">
  <div class="col-lg-8">
    <h1 class="h3 mb-4">Edit Asset</h1>
    <div class="text-center py-5" id="loading-message"><span class="spinner-border" role="status"></span></div>
    <div class="alert alert-info" id="strategy-info" hidden>Strategy: <strong id="strategy-name"></strong></div>
    <div class="alert alert-danger" id="form-error" hidden></div>
    <div class="alert alert-success" id="success-toast" hidden>Asset updated</div>
    <form id="asset-form" class="card card-body border-0 shadow-sm" novalidate hidden>
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
      <label class="form-label" for="action">Action</label>
      <select class="form-select mb-3" id="action"><option value="">-- No Action --</option></select>
      <div class="d-flex gap-2">
        <button type="button" class="btn btn-accent" id="submit-btn">Save Changes</button>
        <button type="button" class="btn btn-outline-secondary" id="cancel-btn">Cancel</button>
      </div>
    </form>
  </div>
</section>"##;

pub struct AssetEditPage;

#[async_trait]
impl Page for AssetEditPage {
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
        let Some(asset_id) = ctx.param("id").map(str::to_string) else {
            ctx.redirect(ASSETS_HASH);
            return;
        };

        let backend = match ctx.backend().client().await {
            Ok(backend) => backend,
            Err(e) => {
                tracing::warn!(error = %e, "Backend unavailable");
                ctx.redirect(ASSETS_HASH);
                return;
            }
        };
        let asset = match backend.asset(&asset_id).await {
            Ok(Some(asset)) => asset,
            Ok(None) => {
                tracing::info!(asset_id = %asset_id, "Asset not found");
                ctx.redirect(ASSETS_HASH);
                return;
            }
            Err(e) => {
                tracing::warn!(asset_id = %asset_id, error = %e, "Failed to fetch asset");
                ctx.redirect(ASSETS_HASH);
                return;
            }
        };
        if asset.strategy.as_ref().is_some_and(|s| s.owner_id != user.id) {
            tracing::info!(asset_id = %asset_id, user_id = %user.id, "Asset belongs to another user");
            ctx.redirect(ASSETS_HASH);
            return;
        }

        let (targets, actions) = tokio::join!(
            backend.lookup(LookupTable::Targets),
            backend.lookup(LookupTable::Actions)
        );
        let doc = ctx.document();
        doc.set_inner_html(
            "target",
            &lookup_options("-- Select a Target --", &targets.unwrap_or_default()),
        );
        doc.set_inner_html(
            "action",
            &lookup_options("-- No Action --", &actions.unwrap_or_default()),
        );

        populate(doc, &asset);
        doc.set_visible("asset-form", true);
        hide(doc, "loading-message");

        let strategy_id = asset.strategy_id.clone();
        ctx.on("submit-btn", EventKind::Click, move |ctx, _| {
            let asset_id = asset_id.clone();
            let strategy_id = strategy_id.clone();
            async move { submit(ctx, &asset_id, &strategy_id).await }
        });
        ctx.on("cancel-btn", EventKind::Click, |ctx, _| async move {
            ctx.redirect(ASSETS_HASH);
        });
    }
}

fn populate(doc: &dyn Document, asset: &Asset) {
    doc.set_value("ticker", &asset.ticker);
    doc.set_value("name", &asset.name);
    doc.set_value("exchange", asset.exchange.as_deref().unwrap_or(""));
    doc.set_value("quantity", &format::quantity(asset.quantity));
    doc.set_value("target", asset.target_id.as_deref().unwrap_or(""));
    doc.set_value("action", asset.action_id.as_deref().unwrap_or(""));
    if let Some(strategy) = &asset.strategy {
        doc.set_text("strategy-name", &strategy.title);
        doc.set_visible("strategy-info", true);
    }
}

async fn submit(ctx: PageContext, asset_id: &str, strategy_id: &str) {
    let doc = ctx.document();
    hide(doc, "form-error");

    let Some(fields) = read_asset_fields(doc) else {
        doc.toggle_class("asset-form", "was-validated", true);
        show_message(doc, "form-error", ASSET_FIELDS_INVALID);
        return;
    };

    doc.set_disabled("submit-btn", true);
    let update = AssetUpdate {
        ticker: fields.ticker,
        name: fields.name,
        exchange: fields.exchange,
        quantity: fields.quantity,
        target_id: fields.target_id,
        action_id: fields.action_id,
    };
    let result = match ctx.backend().client().await {
        Ok(backend) => backend.update_asset(asset_id, update).await,
        Err(e) => Err(e),
    };

    let doc = ctx.document();
    match result {
        Ok(_) => {
            tracing::info!(asset_id, "Asset updated");
            doc.set_visible("success-toast", true);
            ctx.redirect_after(REDIRECT_DELAY, &format!("#/strategies/{}", strategy_id))
                .await;
        }
        Err(e) => {
            tracing::warn!(asset_id, error = %e, "Failed to update asset");
            show_message(doc, "form-error", &format!("Failed to update asset: {}", e));
            doc.set_disabled("submit-btn", false);
        }
    }
}
