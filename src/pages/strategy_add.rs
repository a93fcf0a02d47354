//! New strategy form.

use std::time::Duration;

use async_trait::async_trait;

use crate::backend::NewStrategy;
use crate::dom::{Document, EventKind};
use crate::page::{Page, PageContext};
use crate::pages::common::{hide, require_user, show_message};

pub const TITLE: &str = "Create Strategy | Asset Tracking System";

/// Delay between the success toast and the list redirect.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(1500);

const MARKUP: &str = r##"<section class="row justify-content-center">
  <div class="col-lg-8">
    <h1 class="h3 mb-4">Create Strategy</h1>
    <div class="alert alert-danger" id="error-message" hidden></div>
    <div class="alert alert-success" id="success-toast" hidden>Strategy created</div>
    <form id="add-strategy-form" class="card card-body border-0 shadow-sm" novalidate>
      <label class="form-label" for="title">Title</label>
      <input type="text" class="form-control mb-3" id="title" required>
      <label class="form-label" for="description">Description</label>
      <textarea class="form-control mb-3" id="description" rows="4"></textarea>
      <div class="d-flex gap-2">
        <button type="submit" class="btn btn-accent" id="submit-btn">Create Strategy</button>
        <a href="#/strategies" class="btn btn-outline-secondary">Cancel</a>
      </div>
    </form>
  </div>
</section>"##;

pub struct StrategyAddPage;

#[async_trait]
impl Page for StrategyAddPage {
    fn title(&self) -> &str {
        TITLE
    }

    fn render(&self) -> String {
        MARKUP.to_string()
    }

    async fn init(&self, ctx: PageContext) {
        if require_user(&ctx).await.is_none() {
            return;
        }
        ctx.on("add-strategy-form", EventKind::Submit, |ctx, _| submit(ctx));
    }
}

async fn submit(ctx: PageContext) {
    let doc = ctx.document();
    hide(doc, "error-message");

    let title = doc.value("title").unwrap_or_default().trim().to_string();
    if title.is_empty() {
        doc.toggle_class("add-strategy-form", "was-validated", true);
        return;
    }
    let description = doc
        .value("description")
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let Some(user) = require_user(&ctx).await else {
        return;
    };

    ctx.document().set_disabled("submit-btn", true);
    let result = match ctx.backend().client().await {
        Ok(backend) => {
            backend
                .create_strategy(NewStrategy {
                    owner_id: user.id.clone(),
                    title,
                    description,
                })
                .await
        }
        Err(e) => Err(e),
    };

    let doc = ctx.document();
    match result {
        Ok(strategy) => {
            tracing::info!(strategy_id = %strategy.id, owner_id = %user.id, "Strategy created");
            doc.set_visible("success-toast", true);
            ctx.redirect_after(REDIRECT_DELAY, "#/strategies").await;
        }
        Err(e) => {
            tracing::warn!(owner_id = %user.id, error = %e, "Failed to create strategy");
            show_message(doc, "error-message", &format!("Failed to create strategy: {}", e));
            doc.set_disabled("submit-btn", false);
        }
    }
}
