//! Sign-in form.

use std::time::Duration;

use async_trait::async_trait;

use crate::dom::{Document, EventKind};
use crate::page::{Page, PageContext};
use crate::pages::common::{hide, set_auth_loading, show_message, DASHBOARD_HASH};

pub const TITLE: &str = "Sign In | Asset Tracking System";

/// Delay between a successful sign-in and the dashboard redirect.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(500);

const DEMO_PASSWORD: &str = "password123";
const DEMO_ACCOUNTS: [(&str, &str); 3] = [
    ("demo-alice", "alice@example.com"),
    ("demo-bob", "bob@example.com"),
    ("demo-carol", "carol@example.com"),
];

const MARKUP: &str = r##"<section class="auth-page row justify-content-center">
  <div class="col-md-6 col-lg-5">
    <h1 class="h3 mb-3">Sign in</h1>
    <div class="alert alert-danger d-none" id="error-alert" role="alert"></div>
    <div class="text-center py-4 d-none" id="loading-state">
      <span class="spinner-border" role="status"></span>
      <p class="mt-2 text-muted">Signing you in...</p>
    </div>
    <div class="auth-form" id="auth-form">
      <form id="login-form" novalidate>
        <label class="form-label" for="email">Email</label>
        <input type="email" class="form-control mb-3" id="email" required>
        <label class="form-label" for="password">Password</label>
        <input type="password" class="form-control mb-3" id="password" required>
        <button type="submit" class="btn btn-accent w-100" id="submit-btn">Sign In</button>
      </form>
      <p class="small text-muted mt-3">No account? <a href="#/register">Register</a></p>
    </div>
    <div class="demo-accounts mt-4">
      <p class="small text-muted mb-2">Demo accounts</p>
      <button type="button" class="btn btn-sm btn-outline-secondary" id="demo-alice">Alice</button>
      <button type="button" class="btn btn-sm btn-outline-secondary" id="demo-bob">Bob</button>
      <button type="button" class="btn btn-sm btn-outline-secondary" id="demo-carol">Carol</button>
    </div>
  </div>
</section>"##;

pub struct LoginPage;

#[async_trait]
impl Page for LoginPage {
    fn title(&self) -> &str {
        TITLE
    }

    fn render(&self) -> String {
        MARKUP.to_string()
    }

    async fn init(&self, ctx: PageContext) {
        if !ctx.document().contains("login-form") {
            return;
        }

        ctx.on("login-form", EventKind::Submit, |ctx, _| submit(ctx));

        for (button, email) in DEMO_ACCOUNTS {
            ctx.on(button, EventKind::Click, move |ctx, _| async move {
                let doc = ctx.document();
                doc.set_value("email", email);
                doc.set_value("password", DEMO_PASSWORD);
            });
        }
    }
}

async fn submit(ctx: PageContext) {
    let doc = ctx.document();
    hide(doc, "error-alert");

    let email = doc.value("email").unwrap_or_default().trim().to_string();
    let password = doc.value("password").unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        show_message(doc, "error-alert", "Email and password are required");
        return;
    }

    set_auth_loading(doc, true);
    match ctx.backend().sign_in(&email, &password).await {
        Ok(_) => {
            ctx.redirect_after(REDIRECT_DELAY, DASHBOARD_HASH).await;
        }
        Err(e) => {
            tracing::info!(email = %email, error = %e, "Sign in failed");
            let doc = ctx.document();
            show_message(doc, "error-alert", &e.to_string());
            set_auth_loading(doc, false);
        }
    }
}
