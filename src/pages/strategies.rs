//! The signed-in user's strategies, with deletion.

use async_trait::async_trait;

use crate::backend::Strategy;
use crate::dom::Document;
use crate::page::{Page, PageContext};
use crate::pages::common::{delete_modal, error_alert, require_user, DeleteFlow};
use crate::util::format;
use crate::util::html::{escape, escape_attr, escape_or_dash};

pub const TITLE: &str = "Strategies | Asset Tracking System";

const CONTAINER: &str = "strategies-list-container";

pub struct StrategiesPage;

#[async_trait]
impl Page for StrategiesPage {
    fn title(&self) -> &str {
        TITLE
    }

    fn render(&self) -> String {
        format!(
            r##"<section class="strategies">
  <div class="d-flex justify-content-between align-items-center mb-4">
    <h1 class="h3 mb-0">Strategies</h1>
    <a href="#/strategies/add" class="btn btn-accent" id="add-strategy-btn">New Strategy</a>
  </div>
  <div class="card border-0 shadow-sm" id="{container}">
    <div class="text-center py-5"><span class="spinner-border" role="status"></span></div>
  </div>
  {modal}
</section>"##,
            container = CONTAINER,
            modal = delete_modal("strategy"),
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
                        Ok(backend) => backend.delete_strategy(&id).await,
                        Err(e) => Err(e),
                    };
                    if let Err(e) = result {
                        tracing::warn!(strategy_id = %id, error = %e, "Failed to delete strategy");
                        return show_error(&ctx, "Failed to delete strategy");
                    }
                    tracing::info!(strategy_id = %id, "Strategy deleted");
                    if load(&ctx, &owner_id).await {
                        flow.bind_rows();
                    }
                }
            }
        });

        if load(&ctx, &user.id).await {
            flow.bind_rows();
        }
    }
}

/// Fetch and render the list. True when rows were rendered.
async fn load(ctx: &PageContext, owner_id: &str) -> bool {
    let result = match ctx.backend().client().await {
        Ok(backend) => backend.user_strategies(owner_id).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(strategies) => ctx.document().set_inner_html(CONTAINER, &render_list(&strategies)),
        Err(e) => {
            tracing::warn!(owner_id, error = %e, "Failed to fetch strategies");
            show_error(ctx, &format!("Failed to load strategies: {}", e));
            false
        }
    }
}

fn show_error(ctx: &PageContext, message: &str) {
    ctx.document().set_inner_html(CONTAINER, &error_alert(message));
}

pub fn render_list(strategies: &[Strategy]) -> String {
    if strategies.is_empty() {
        return r##"<div class="card-body text-center py-5">
  <p class="text-muted mb-3">No strategies yet</p>
  <a href="#/strategies/add" class="btn btn-accent">Create Your First Strategy</a>
</div>"##
            .to_string();
    }

    let rows: String = strategies
        .iter()
        .map(|s| {
            let id = escape_attr(&s.id);
            format!(
                r##"<tr>
  <td><strong>{title}</strong></td>
  <td><span class="text-muted-strong">{description}</span></td>
  <td><span class="text-muted-strong">{created}</span></td>
  <td class="text-center">
    <a href="#/strategies/{id}" class="btn btn-sm btn-outline-primary" title="View"><i class="bi bi-file-earmark-text-fill"></i></a>
    <a href="#/strategies/edit/{id}" class="btn btn-sm btn-outline-warning" title="Edit"><i class="bi bi-gear-fill"></i></a>
    <button type="button" class="btn btn-sm btn-outline-danger" id="delete-strategy-{id}" data-delete-id="{id}" data-delete-label="{label}" title="Delete"><i class="bi bi-trash-fill"></i></button>
  </td>
</tr>"##,
                id = id,
                title = escape(&s.title),
                label = escape_attr(&s.title),
                description = escape_or_dash(s.description.as_deref()),
                created = format::date(&s.created_at),
            )
        })
        .collect();

    format!(
        r#"<div class="table-responsive"><table class="table table-hover mb-0">
<thead class="table-light"><tr><th>Strategy Name</th><th>Description</th><th>Created</th><th class="text-center">Actions</th></tr></thead>
<tbody>{}</tbody>
</table></div>"#,
        rows
    )
}
