//! One strategy with its assets.

use async_trait::async_trait;

use crate::backend::{Asset, Strategy};
use crate::dom::Document;
use crate::page::{Page, PageContext};
use crate::pages::common::{delete_modal, error_alert, require_user, DeleteFlow, DASHBOARD_HASH};
use crate::util::format;
use crate::util::html::{escape, escape_attr, escape_or_dash};

pub const TITLE: &str = "Strategy | Asset Tracking System";

const SECTION: &str = "strategy-section";
const ASSETS_BODY: &str = "assets-tbody";
const TOAST: &str = "delete-success-toast";

pub struct StrategyPage;

#[async_trait]
impl Page for StrategyPage {
    fn title(&self) -> &str {
        TITLE
    }

    fn render(&self) -> String {
        format!(
            r##"<section id="{section}">
  <div class="d-flex justify-content-between align-items-start mb-4">
    <div>
      <h1 class="h3 mb-1" id="strategy-title">Loading...</h1>
      <p class="text-muted-strong mb-0" id="strategy-description"></p>
    </div>
    <a href="#/assets/add" class="btn btn-accent" id="create-asset-btn">Add Asset</a>
  </div>
  <div class="row g-3 mb-4">
    <div class="col-sm-6"><div class="card summary-card"><div class="card-body">
      <p class="text-muted small mb-1">Assets</p><p class="h4 mb-0" id="strategy-asset-count">-</p>
    </div></div></div>
    <div class="col-sm-6"><div class="card summary-card"><div class="card-body">
      <p class="text-muted small mb-1">Created</p><p class="h4 mb-0" id="strategy-created-date">-</p>
    </div></div></div>
  </div>
  <div class="alert alert-success" id="{toast}" hidden>Asset deleted</div>
  <div class="card border-0 shadow-sm"><div class="table-responsive">
    <table class="table table-hover mb-0">
      <thead class="table-light"><tr><th>Ticker</th><th>Name</th><th>Exchange</th><th>Quantity</th><th>Target</th><th>Action</th><th class="text-center">Actions</th></tr></thead>
      <tbody id="{body}"><tr><td colspan="7" class="text-center py-4"><span class="spinner-border" role="status"></span></td></tr></tbody>
    </table>
  </div></div>
  {modal}
</section>"##,
            section = SECTION,
            toast = TOAST,
            body = ASSETS_BODY,
            modal = delete_modal("asset"),
        )
    }

    async fn init(&self, ctx: PageContext) {
        let Some(strategy_id) = ctx.param("id").map(str::to_string) else {
            ctx.redirect(DASHBOARD_HASH);
            return;
        };
        let Some(user) = require_user(&ctx).await else {
            return;
        };

        let strategy = match ctx.backend().client().await {
            Ok(backend) => backend.strategy(&strategy_id).await,
            Err(e) => Err(e),
        };
        let strategy = match strategy {
            Ok(Some(strategy)) => strategy,
            Ok(None) => return show_error(&ctx, "Strategy not found"),
            Err(e) => {
                tracing::warn!(strategy_id = %strategy_id, error = %e, "Failed to fetch strategy");
                return show_error(&ctx, "Strategy not found");
            }
        };
        if strategy.owner_id != user.id {
            return show_error(&ctx, "You do not have permission to view this strategy");
        }

        render_header(&ctx, &strategy);

        let flow = DeleteFlow::new(&ctx);
        flow.on_confirm({
            let flow = flow.clone();
            let strategy_id = strategy_id.clone();
            move |ctx, asset_id| {
                let flow = flow.clone();
                let strategy_id = strategy_id.clone();
                async move {
                    let result = match ctx.backend().client().await {
                        Ok(backend) => backend.delete_asset(&asset_id).await,
                        Err(e) => Err(e),
                    };
                    if let Err(e) = result {
                        tracing::warn!(asset_id = %asset_id, error = %e, "Failed to delete asset");
                        ctx.document()
                            .set_inner_html(ASSETS_BODY, &error_row(&format!("Failed to delete asset: {}", e)));
                        return;
                    }
                    tracing::info!(asset_id = %asset_id, strategy_id = %strategy_id, "Asset deleted");
                    if load_assets(&ctx, &strategy_id).await {
                        flow.bind_rows();
                        ctx.document().set_visible(TOAST, true);
                    }
                }
            }
        });

        if load_assets(&ctx, &strategy_id).await {
            flow.bind_rows();
        }
    }
}

fn render_header(ctx: &PageContext, strategy: &Strategy) {
    let doc = ctx.document();
    doc.set_text("strategy-title", &strategy.title);
    doc.set_text(
        "strategy-description",
        strategy
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("No description provided"),
    );
    doc.set_text("strategy-created-date", &format::date(&strategy.created_at));
    doc.set_attribute(
        "create-asset-btn",
        "href",
        &format!("#/assets/add?strategy={}", strategy.id),
    );
}

/// Fetch and render the asset table. True when rows were rendered.
async fn load_assets(ctx: &PageContext, strategy_id: &str) -> bool {
    let result = match ctx.backend().client().await {
        Ok(backend) => backend.assets_by_strategy(strategy_id).await,
        Err(e) => Err(e),
    };
    let doc = ctx.document();
    match result {
        Ok(assets) => {
            doc.set_text("strategy-asset-count", &assets.len().to_string());
            doc.set_inner_html(ASSETS_BODY, &render_rows(&assets))
        }
        Err(e) => {
            tracing::warn!(strategy_id, error = %e, "Failed to fetch assets");
            doc.set_inner_html(ASSETS_BODY, &error_row(&format!("Failed to load assets: {}", e)));
            false
        }
    }
}

/// Replace the whole section with an error and a way back.
fn show_error(ctx: &PageContext, message: &str) {
    ctx.document().set_inner_html(
        SECTION,
        &format!(
            r##"{}<a href="#/dashboard" class="btn btn-outline-secondary">Back to Dashboard</a>"##,
            error_alert(message)
        ),
    );
}

fn error_row(message: &str) -> String {
    format!(r#"<tr><td colspan="7">{}</td></tr>"#, error_alert(message))
}

pub fn render_rows(assets: &[Asset]) -> String {
    if assets.is_empty() {
        return r#"<tr><td colspan="7" class="text-center text-muted py-4">No assets in this strategy yet</td></tr>"#
            .to_string();
    }

    assets
        .iter()
        .map(|asset| {
            let id = escape_attr(&asset.id);
            let target = asset
                .target
                .as_ref()
                .map(|t| format!(r#"<span class="badge bg-info text-dark">{}</span>"#, escape(&t.name)))
                .unwrap_or_else(|| "-".to_string());
            format!(
                r##"<tr>
  <td><strong>{ticker}</strong></td>
  <td>{name}</td>
  <td>{exchange}</td>
  <td>{quantity}</td>
  <td>{target}</td>
  <td>{action}</td>
  <td class="text-center">
    <a href="#/assets/edit/{id}" class="btn btn-sm btn-outline-warning" title="Edit"><i class="bi bi-gear-fill"></i></a>
    <button type="button" class="btn btn-sm btn-outline-danger" id="delete-asset-{id}" data-delete-id="{id}" data-delete-label="{label}" title="Delete"><i class="bi bi-trash-fill"></i></button>
  </td>
</tr>"##,
                id = id,
                ticker = escape(&asset.ticker),
                label = escape_attr(&asset.ticker),
                name = escape(&asset.name),
                exchange = escape_or_dash(asset.exchange.as_deref()),
                quantity = format::quantity(asset.quantity),
                target = target,
                action = escape_or_dash(asset.action.as_ref().map(|a| a.name.as_str())),
            )
        })
        .collect()
}
