//! Site header: navigation, auth-dependent links, logout.

use tokio::task::JoinHandle;

use crate::backend::User;
use crate::dom::{Document, EventKind};
use crate::page::PageContext;

pub const NAV_ID: &str = "main-nav";

/// Shown only when signed out.
const GUEST_LINKS: [&str; 2] = ["nav-login", "nav-register"];
/// Shown only when signed in.
const MEMBER_LINKS: [&str; 4] = ["nav-dashboard", "nav-strategies", "nav-assets", "nav-account"];
const ADMIN_LINK: &str = "nav-admin";
const LOGOUT_LINK: &str = "nav-logout";
const ACCOUNT_EMAIL: &str = "nav-account-email";

pub const MARKUP: &str = r##"<header class="site-header border-bottom">
  <nav class="navbar navbar-expand-lg container" id="main-nav">
    <a class="navbar-brand fw-bold" href="#/" id="nav-brand">Asset Tracker</a>
    <ul class="navbar-nav ms-auto align-items-lg-center gap-lg-2">
      <li class="nav-item"><a class="nav-link" href="#/" id="nav-home" data-route="/">Home</a></li>
      <li class="nav-item"><a class="nav-link d-none" href="#/dashboard" id="nav-dashboard" data-route="/dashboard">Dashboard</a></li>
      <li class="nav-item"><a class="nav-link d-none" href="#/strategies" id="nav-strategies" data-route="/strategies">Strategies</a></li>
      <li class="nav-item"><a class="nav-link d-none" href="#/assets" id="nav-assets" data-route="/assets">Assets</a></li>
      <li class="nav-item"><a class="nav-link d-none" href="#/admin" id="nav-admin" data-route="/admin">Admin</a></li>
      <li class="nav-item"><a class="nav-link" href="#/login" id="nav-login" data-route="/login">Sign In</a></li>
      <li class="nav-item"><a class="btn btn-accent btn-sm" href="#/register" id="nav-register" data-route="/register">Register</a></li>
      <li class="nav-item d-none" id="nav-account">
        <span class="navbar-text small me-2" id="nav-account-email"></span>
        <a class="btn btn-outline-secondary btn-sm" href="#/" id="nav-logout">Sign Out</a>
      </li>
    </ul>
  </nav>
</header>"##;

/// Mark the active nav link, then resolve auth-dependent links in the
/// background.
///
/// The active link is set before returning; the returned task finishes
/// once visibility reflects the current user.
pub fn init_header(ctx: &PageContext) -> JoinHandle<()> {
    let doc = ctx.document();
    let active = ctx.route_path();
    for (id, route) in doc.ids_with_attribute("data-route") {
        doc.toggle_class(&id, "active", route == active);
    }

    bind_logout(ctx);

    let ctx = ctx.clone();
    tokio::spawn(async move {
        let user = match ctx.backend().current_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(error = %e, "Header auth lookup failed; showing guest links");
                None
            }
        };
        let is_admin = match &user {
            Some(_) => ctx.backend().is_current_user_admin().await.unwrap_or(false),
            None => false,
        };
        apply_auth_state(ctx.document(), user.as_ref(), is_admin);
    })
}

fn apply_auth_state(doc: &dyn Document, user: Option<&User>, is_admin: bool) {
    let signed_in = user.is_some();
    for id in GUEST_LINKS {
        doc.set_visible(id, !signed_in);
    }
    for id in MEMBER_LINKS {
        doc.set_visible(id, signed_in);
    }
    doc.set_visible(ADMIN_LINK, signed_in && is_admin);
    doc.set_text(ACCOUNT_EMAIL, user.map(|u| u.email.as_str()).unwrap_or(""));
}

fn bind_logout(ctx: &PageContext) {
    ctx.on(LOGOUT_LINK, EventKind::Click, |ctx, _| async move {
        if let Err(e) = ctx.backend().sign_out().await {
            tracing::warn!(error = %e, "Sign out failed");
            return;
        }
        apply_auth_state(ctx.document(), None, false);
        ctx.redirect("#/");
    });
}
