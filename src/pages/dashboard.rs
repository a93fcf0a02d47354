//! Per-strategy summary for the signed-in user.

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::backend::{Asset, Strategy};
use crate::dom::Document;
use crate::page::{Page, PageContext};
use crate::pages::common::{error_alert, require_user};
use crate::util::format;
use crate::util::html::{escape, escape_attr};

pub const TITLE: &str = "Dashboard | Asset Tracking System";

/// Assets listed on a strategy card before collapsing into "+N more".
pub const CARD_ASSET_LIMIT: usize = 5;

const MARKUP: &str = r##"<section class="dashboard">
  <div class="d-flex justify-content-between align-items-center mb-4">
    <h1 class="h3 mb-0">Dashboard</h1>
    <a href="#/strategies/add" class="btn btn-accent">New Strategy</a>
  </div>
  <div class="row g-3 mb-4">
    <div class="col-sm-6"><div class="card summary-card"><div class="card-body">
      <p class="text-muted small mb-1">Strategies</p><p class="h4 mb-0" id="total-strategies">-</p>
    </div></div></div>
    <div class="col-sm-6"><div class="card summary-card"><div class="card-body">
      <p class="text-muted small mb-1">Assets</p><p class="h4 mb-0" id="total-assets">-</p>
    </div></div></div>
  </div>
  <div class="row g-4" id="strategies-container">
    <div class="col-12 text-center py-5"><span class="spinner-border" role="status"></span></div>
  </div>
</section>"##;

pub struct DashboardPage;

#[async_trait]
impl Page for DashboardPage {
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

        let backend = match ctx.backend().client().await {
            Ok(backend) => backend,
            Err(e) => return show_error(&ctx, &e.to_string()),
        };

        let strategies = match backend.user_strategies(&user.id).await {
            Ok(strategies) => strategies,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to fetch strategies");
                return show_error(&ctx, "Failed to load strategies");
            }
        };
        ctx.document()
            .set_text("total-strategies", &strategies.len().to_string());

        // A strategy whose assets fail to load counts as empty.
        let assets = join_all(strategies.iter().map(|s| {
            let backend = backend.clone();
            async move { backend.assets_by_strategy(&s.id).await.unwrap_or_default() }
        }))
        .await;

        let cards: Vec<(Strategy, Vec<Asset>)> = strategies.into_iter().zip(assets).collect();
        let total: usize = cards.iter().map(|(_, assets)| assets.len()).sum();

        let doc = ctx.document();
        doc.set_text("total-assets", &total.to_string());
        doc.set_inner_html("strategies-container", &render_cards(&cards));
    }
}

fn show_error(ctx: &PageContext, message: &str) {
    ctx.document().set_inner_html(
        "strategies-container",
        &format!(r#"<div class="col-12">{}</div>"#, error_alert(message)),
    );
}

/// Strategy cards, each listing its first few assets.
pub fn render_cards(cards: &[(Strategy, Vec<Asset>)]) -> String {
    if cards.is_empty() {
        return r##"<div class="col-12"><div class="card border-0 shadow-sm"><div class="card-body text-center py-5">
  <p class="text-muted mb-3">No strategies yet</p>
  <a href="#/strategies/add" class="btn btn-accent">Create Your First Strategy</a>
</div></div></div>"##
            .to_string();
    }

    cards
        .iter()
        .map(|(strategy, assets)| render_card(strategy, assets))
        .collect()
}

fn render_card(strategy: &Strategy, assets: &[Asset]) -> String {
    let id = escape_attr(&strategy.id);
    let description = strategy
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| format!(r#"<p class="text-muted-strong small mb-3">{}</p>"#, escape(d)))
        .unwrap_or_default();

    let asset_list = if assets.is_empty() {
        r#"<p class="text-muted small">No assets added yet</p>"#.to_string()
    } else {
        let mut rows: String = assets
            .iter()
            .take(CARD_ASSET_LIMIT)
            .map(|asset| {
                format!(
                    r#"<div class="list-group-item border-0 px-0 py-2 d-flex justify-content-between"><div><strong>{}</strong><span class="text-muted-strong small ms-2">{}</span></div><span class="badge bg-light text-dark">{}</span></div>"#,
                    escape(&asset.ticker),
                    escape(&asset.name),
                    format::quantity(asset.quantity)
                )
            })
            .collect();
        if assets.len() > CARD_ASSET_LIMIT {
            rows.push_str(&format!(
                r#"<div class="list-group-item border-0 px-0 py-2 text-center"><small class="text-muted-strong">+{} more</small></div>"#,
                assets.len() - CARD_ASSET_LIMIT
            ));
        }
        format!(r#"<div class="list-group list-group-sm">{}</div>"#, rows)
    };

    format!(
        r##"<div class="col-lg-6"><div class="card border-0 shadow-sm h-100" id="strategy-card-{id}"><div class="card-body">
  <h5 class="card-title mb-1"><a href="#/strategies/{id}" class="text-decoration-none">{title}</a></h5>
  <p class="text-muted-strong small mb-3">{count} asset(s)</p>
  {description}
  <h6 class="text-uppercase text-muted-strong small mb-2">Assets</h6>
  {asset_list}
  <a href="#/strategies/{id}" class="btn btn-sm btn-outline-primary w-100 mt-3">View Details</a>
</div></div></div>"##,
        id = id,
        title = escape(&strategy.title),
        count = assets.len(),
        description = description,
        asset_list = asset_list,
    )
}
