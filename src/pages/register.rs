//! Account registration form.

use std::time::Duration;

use async_trait::async_trait;

use crate::dom::{Document, EventKind};
use crate::page::{Page, PageContext};
use crate::pages::common::{hide, set_auth_loading, show_message, LOGIN_HASH};

pub const TITLE: &str = "Register | Asset Tracking System";

pub const MIN_PASSWORD_LEN: usize = 8;

/// Delay between a successful registration and the login redirect.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

const SUCCESS: &str =
    "Account created successfully! Please check your email to confirm your account.";

const MARKUP: &str = r##"<section class="auth-page row justify-content-center">
  <div class="col-md-6 col-lg-5">
    <h1 class="h3 mb-3">Create an account</h1>
    <div class="alert alert-danger d-none" id="error-alert" role="alert"></div>
    <div class="alert alert-success d-none" id="success-alert" role="alert"></div>
    <div class="text-center py-4 d-none" id="loading-state">
      <span class="spinner-border" role="status"></span>
      <p class="mt-2 text-muted">Creating your account...</p>
    </div>
    <div class="auth-form" id="auth-form">
      <form id="register-form" novalidate>
        <label class="form-label" for="email">Email</label>
        <input type="email" class="form-control mb-3" id="email" required>
        <label class="form-label" for="password">Password</label>
        <input type="password" class="form-control mb-3" id="password" minlength="8" required>
        <label class="form-label" for="password-confirm">Confirm password</label>
        <input type="password" class="form-control mb-3" id="password-confirm" required>
        <button type="submit" class="btn btn-accent w-100" id="submit-btn">Register</button>
      </form>
      <p class="small text-muted mt-3">Already registered? <a href="#/login">Sign in</a></p>
    </div>
  </div>
</section>"##;

pub struct RegisterPage;

#[async_trait]
impl Page for RegisterPage {
    fn title(&self) -> &str {
        TITLE
    }

    fn render(&self) -> String {
        MARKUP.to_string()
    }

    async fn init(&self, ctx: PageContext) {
        ctx.on("register-form", EventKind::Submit, |ctx, _| submit(ctx));
    }
}

/// First problem with the entered values, if any.
pub fn validate(email: &str, password: &str, confirm: &str) -> Option<&'static str> {
    if email.is_empty() || password.is_empty() || confirm.is_empty() {
        Some("All fields are required")
    } else if password != confirm {
        Some("Passwords do not match")
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        Some("Password must be at least 8 characters")
    } else {
        None
    }
}

async fn submit(ctx: PageContext) {
    let doc = ctx.document();
    hide(doc, "error-alert");
    hide(doc, "success-alert");

    let email = doc.value("email").unwrap_or_default().trim().to_string();
    let password = doc.value("password").unwrap_or_default();
    let confirm = doc.value("password-confirm").unwrap_or_default();

    if let Some(problem) = validate(&email, &password, &confirm) {
        show_message(doc, "error-alert", problem);
        return;
    }

    set_auth_loading(doc, true);
    let result = ctx.backend().sign_up(&email, &password).await;
    let doc = ctx.document();
    set_auth_loading(doc, false);

    match result {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Account registered");
            show_message(doc, "success-alert", SUCCESS);
            for id in ["email", "password", "password-confirm"] {
                doc.set_value(id, "");
            }
            ctx.redirect_after(REDIRECT_DELAY, LOGIN_HASH).await;
        }
        Err(e) => show_message(doc, "error-alert", &e.to_string()),
    }
}
