//! Site footer with the newsletter form.

use std::time::Duration;

use crate::dom::{Document, EventKind};
use crate::page::PageContext;

pub const FORM_ID: &str = "newsletter-form";
const EMAIL_ID: &str = "newsletter-email";
const BUTTON_ID: &str = "newsletter-btn";

const SUBMITTED: &str = r#"<i class="bi bi-check-circle-fill"></i>"#;

/// How long the check mark stays before the form resets.
pub const RESET_AFTER: Duration = Duration::from_secs(2);

pub const MARKUP: &str = r##"<footer class="site-footer border-top mt-5">
  <div class="container py-4 d-flex flex-column flex-lg-row justify-content-between gap-3">
    <p class="text-muted small mb-0">Asset Tracking System. Track strategies and the assets behind them.</p>
    <form class="newsletter d-flex gap-2" id="newsletter-form">
      <input type="email" class="form-control form-control-sm" id="newsletter-email" placeholder="you@example.com">
      <button type="submit" class="btn btn-sm btn-newsletter" id="newsletter-btn"><i class="bi bi-send-fill"></i></button>
    </form>
  </div>
</footer>"##;

/// Bind the newsletter form. Signups stay local: nothing is sent.
pub fn init_footer(ctx: &PageContext) {
    ctx.on(FORM_ID, EventKind::Submit, |ctx, _| async move { submit(ctx) });
}

fn submit(ctx: PageContext) {
    let doc = ctx.document();
    let email = doc.value(EMAIL_ID).unwrap_or_default();
    let email = email.trim();
    if email.is_empty() {
        return;
    }

    let original = doc.inner_html(BUTTON_ID).unwrap_or_default();
    doc.set_inner_html(BUTTON_ID, SUBMITTED);
    doc.set_disabled(BUTTON_ID, true);
    tracing::info!(email = %email, "Newsletter signup");

    tokio::spawn(async move {
        if !ctx.sleep(RESET_AFTER).await {
            return;
        }
        let doc = ctx.document();
        doc.set_value(EMAIL_ID, "");
        doc.set_inner_html(BUTTON_ID, &original);
        doc.set_disabled(BUTTON_ID, false);
    });
}
