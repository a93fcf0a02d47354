//! Every asset across the signed-in user's strategies.

use async_trait::async_trait;

use crate::backend::Asset;
use crate::dom::Document;
use crate::page::{Page, PageContext};
use crate::pages::common::{delete_modal, error_alert, require_user, DeleteFlow};
use crate::util::format;
use crate::util::html::{escape, escape_attr, escape_or_dash};

pub const TITLE: &str = "Assets | Asset Tracking System";

const CONTAINER: &str = "assets-list-container";
const TOAST: &str = "delete-success-toast";

pub struct AssetsPage;

#[async_trait]
impl Page for AssetsPage {
    fn title(&self) -> &str {
        TITLE
    }

    fn render(&self) -> String {
        format!(
            r##"<section class="assets">
  <div class="d-flex justify-content-between align-items-center mb-4">
    <h1 class="h3 mb-0">Assets</h1>
    <a href="#/assets/add" class="btn btn-accent" id="add-asset-btn">New Asset</a>
  </div>
  <div class="alert alert-success" id="{toast}" hidden>Asset deleted</div>
  <div class="card border-0 shadow-sm" id="{container}">
    <div class="text-center py-5"><span class="spinner-border" role="status"></span></div>
  </div>
  {modal}
</section>"##,
            toast = TOAST,
            container = CONTAINER,
            modal = delete_modal("asset"),
        )
    }

    async fn init(&self, ctx: PageContext) {
        let Some(user) = require_user(&ctx).await else {
            return;
        };

        let flow = DeleteFlow::new(&ctx);
        flow.on_confirm({
            let flow = flow.clone();
            let owner_id = user.id.clone();
            move |ctx, id| {
                let flow = flow.clone();
                let owner_id = owner_id.clone();
                async move {
                    let result = match ctx.backend().client().await {
                        Ok(backend) => backend.delete_asset(&id).await,
                        Err(e) => Err(e),
                    };
                    if let Err(e) = result {
                        tracing::warn!(asset_id = %id, error = %e, "Failed to delete asset");
                        return show_error(&ctx, "Failed to delete asset");
                    }
                    tracing::info!(asset_id = %id, "Asset deleted");
                    if load(&ctx, &owner_id).await {
                        flow.bind_rows();
                        ctx.document().set_visible(TOAST, true);
                    }
                }
            }
        });

        if load(&ctx, &user.id).await {
            flow.bind_rows();
        }
    }
}

/// Fetch and render the table. True when rows were rendered.
async fn load(ctx: &PageContext, owner_id: &str) -> bool {
    let result = match ctx.backend().client().await {
        Ok(backend) => backend.user_assets(owner_id).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(assets) => ctx.document().set_inner_html(CONTAINER, &render_list(&assets)),
        Err(e) => {
            tracing::warn!(owner_id, error = %e, "Failed to fetch assets");
            show_error(ctx, &format!("Failed to load assets: {}", e));
            false
        }
    }
}

fn show_error(ctx: &PageContext, message: &str) {
    ctx.document().set_inner_html(CONTAINER, &error_alert(message));
}

pub fn render_list(assets: &[Asset]) -> String {
    if assets.is_empty() {
        return r##"<div class="card-body text-center py-5">
  <p class="text-muted mb-3">No assets yet</p>
  <a href="#/assets/add" class="btn btn-accent">Create Your First Asset</a>
</div>"##
            .to_string();
    }

    let rows: String = assets
        .iter()
        .map(|asset| {
            let id = escape_attr(&asset.id);
            let strategy = asset
                .strategy
                .as_ref()
                .map(|s| {
                    format!(
                        r##"<a href="#/strategies/{}" class="text-decoration-none">{}</a>"##,
                        escape_attr(&s.id),
                        escape(&s.title)
                    )
                })
                .unwrap_or_else(|| "-".to_string());
            format!(
                r##"<tr>
  <td><strong>{ticker}</strong></td>
  <td><span class="text-muted-strong">{name}</span></td>
  <td><span class="text-muted-strong">{exchange}</span></td>
  <td><span class="text-muted-strong">{quantity}</span></td>
  <td><span class="text-muted-strong">{target}</span></td>
  <td><span class="text-muted-strong">{strategy}</span></td>
  <td><span class="text-muted-strong">{action}</span></td>
  <td class="text-center">
    <a href="#/assets/edit/{id}" class="btn btn-sm btn-outline-warning" title="Edit"><i class="bi bi-gear-fill"></i></a>
    <button type="button" class="btn btn-sm btn-outline-danger" id="delete-asset-{id}" data-delete-id="{id}" data-delete-label="{label}" title="Delete"><i class="bi bi-trash-fill"></i></button>
  </td>
</tr>"##,
                id = id,
                ticker = escape(&asset.ticker),
                label = escape_attr(&asset.ticker),
                name = escape_or_dash(Some(asset.name.as_str()).filter(|n| !n.is_empty())),
                exchange = escape_or_dash(asset.exchange.as_deref()),
                quantity = format::quantity(asset.quantity),
                target = escape_or_dash(asset.target.as_ref().map(|t| t.name.as_str())),
                strategy = strategy,
                action = escape_or_dash(asset.action.as_ref().map(|a| a.name.as_str())),
            )
        })
        .collect();

    format!(
        r#"<div class="table-responsive"><table class="table table-hover mb-0">
<thead class="table-light"><tr><th>Ticker</th><th>Name</th><th>Exchange</th><th>Quantity</th><th>Target</th><th>Strategy</th><th>Action</th><th class="text-center">Actions</th></tr></thead>
<tbody>{}</tbody>
</table></div>"#,
        rows
    )
}
