//! Edit a strategy and its attachments.

use async_trait::async_trait;

use crate::backend::StrategyUpdate;
use crate::dom::{Document, EventKind};
use crate::page::{Page, PageContext};
use crate::pages::attachments::{self, AttachmentEditor};
use crate::pages::common::{hide, require_user, show_message};
use crate::util::format;

pub const TITLE: &str = "Edit Strategy | Asset Tracking System";

const LIST_HASH: &str = "#/strategies";

pub struct StrategyEditPage;

#[async_trait]
impl Page for StrategyEditPage {
    fn title(&self) -> &str {
        TITLE
    }

    fn render(&self) -> String {
        format!(
            r##"<section class="row justify-content-center">
  <div class="col-lg-8">
    <h1 class="h3 mb-4">Edit Strategy</h1>
    <div class="text-center py-5" id="loading"><span class="spinner-border" role="status"></span></div>
    <div class="alert alert-danger" id="error-loading" hidden></div>
    <form id="edit-strategy-form" class="card card-body border-0 shadow-sm" novalidate hidden>
      <div class="alert alert-danger" id="error-message" hidden></div>
      <label class="form-label" for="title">Title</label>
      <input type="text" class="form-control mb-3" id="title" required>
      <label class="form-label" for="description">Description</label>
      <textarea class="form-control mb-3" id="description" rows="4"></textarea>
      {attachments}
      <dl class="row small text-muted">
        <dt class="col-sm-4">Created</dt><dd class="col-sm-8" id="created-date">-</dd>
        <dt class="col-sm-4">Last updated</dt><dd class="col-sm-8" id="updated-date">-</dd>
        <dt class="col-sm-4">Assets</dt><dd class="col-sm-8" id="asset-count">0</dd>
      </dl>
      <div class="d-flex gap-2">
        <button type="submit" class="btn btn-accent" id="submit-btn">Save Changes</button>
        <a href="#/strategies" class="btn btn-outline-secondary">Cancel</a>
      </div>
    </form>
  </div>
</section>"##,
            attachments = attachments::markup(),
        )
    }

    async fn init(&self, ctx: PageContext) {
        let Some(strategy_id) = ctx.param("id").map(str::to_string) else {
            ctx.redirect(LIST_HASH);
            return;
        };
        let Some(user) = require_user(&ctx).await else {
            return;
        };

        let backend = match ctx.backend().client().await {
            Ok(backend) => backend,
            Err(e) => return show_loading_error(&ctx, &e.to_string()),
        };
        let strategy = match backend.strategy(&strategy_id).await {
            Ok(Some(strategy)) => strategy,
            Ok(None) => return show_loading_error(&ctx, "Strategy not found"),
            Err(e) => {
                tracing::warn!(strategy_id = %strategy_id, error = %e, "Failed to fetch strategy");
                return show_loading_error(&ctx, "Strategy not found");
            }
        };
        if strategy.owner_id != user.id {
            return show_loading_error(&ctx, "You do not have permission to edit this strategy");
        }

        let asset_count = backend
            .assets_by_strategy(&strategy_id)
            .await
            .map(|assets| assets.len())
            .unwrap_or(0);

        let doc = ctx.document();
        hide(doc, "loading");
        doc.set_visible("edit-strategy-form", true);
        doc.set_value("title", &strategy.title);
        doc.set_value("description", strategy.description.as_deref().unwrap_or(""));
        doc.set_text("created-date", &format::date_time(&strategy.created_at));
        doc.set_text("updated-date", &format::date_time(&strategy.updated_at));
        doc.set_text("asset-count", &asset_count.to_string());

        let editor = AttachmentEditor::load(&ctx, &strategy_id).await;

        ctx.on("edit-strategy-form", EventKind::Submit, move |ctx, _| {
            let strategy_id = strategy_id.clone();
            let editor = editor.clone();
            async move { submit(ctx, &strategy_id, editor.as_ref()).await }
        });
    }
}

async fn submit(ctx: PageContext, strategy_id: &str, editor: Option<&AttachmentEditor>) {
    let doc = ctx.document();
    let title = doc.value("title").unwrap_or_default().trim().to_string();
    if title.is_empty() {
        doc.toggle_class("edit-strategy-form", "was-validated", true);
        return;
    }
    let description = doc
        .value("description")
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    doc.set_disabled("submit-btn", true);
    hide(doc, "error-message");

    let result = match ctx.backend().client().await {
        Ok(backend) => {
            backend
                .update_strategy(strategy_id, StrategyUpdate { title, description })
                .await
        }
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::warn!(strategy_id, error = %e, "Failed to update strategy");
        return fail(&ctx, &e.to_string());
    }

    if let Some(editor) = editor {
        if let Err(e) = editor.commit().await {
            tracing::warn!(strategy_id, error = %e, "Failed to save attachments");
            let message = e.to_string();
            editor.show_error(&message);
            return fail(&ctx, &message);
        }
    }

    tracing::info!(strategy_id, "Strategy updated");
    ctx.redirect(LIST_HASH);
}

fn fail(ctx: &PageContext, message: &str) {
    let doc = ctx.document();
    show_message(doc, "error-message", message);
    doc.set_disabled("submit-btn", false);
}

fn show_loading_error(ctx: &PageContext, message: &str) {
    let doc = ctx.document();
    hide(doc, "loading");
    show_message(doc, "error-loading", message);
}
