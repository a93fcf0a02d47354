//! Page flows driven through the router and document events.

use strategy_tracker::backend::{Backend, LookupTable};
use strategy_tracker::dom::{Document, DomEvent, EventKind, SelectedFile};
use strategy_tracker::pages::{admin, dashboard, login, strategies, strategy_add};

mod common;
use common::Harness;

#[tokio::test(start_paused = true)]
async fn test_login_with_demo_account() {
    let mut h = Harness::new();
    h.navigate("#/login").await;
    assert_eq!(h.title(), login::TITLE);

    assert_eq!(h.click("demo-bob").await, 1);
    assert_eq!(h.document.value("email").as_deref(), Some("bob@example.com"));
    assert_eq!(h.document.value("password").as_deref(), Some("password123"));

    h.submit("login-form").await;
    let settled = h.follow().await.expect("redirected after sign in");
    assert_eq!(settled.last().unwrap().path, "/dashboard");
    assert_eq!(h.title(), dashboard::TITLE);
    // Bob owns nothing.
    assert_eq!(h.text("total-strategies"), "0");
}

#[tokio::test]
async fn test_login_requires_fields() {
    let mut h = Harness::new();
    h.navigate("#/login").await;

    h.submit("login-form").await;
    assert!(h.visible("error-alert"));
    assert_eq!(h.text("error-alert"), "Email and password are required");
    assert!(h.follow().await.is_none());
}

#[tokio::test]
async fn test_login_shows_backend_error() {
    let mut h = Harness::new();
    h.navigate("#/login").await;

    h.fill("email", "alice@example.com");
    h.fill("password", "wrong-password");
    h.submit("login-form").await;

    assert_eq!(h.text("error-alert"), "Invalid login credentials");
    assert!(h.visible("auth-form"));
    assert!(!h.visible("loading-state"));
    assert_eq!(h.document.is_disabled("submit-btn"), Some(false));
}

#[tokio::test(start_paused = true)]
async fn test_register_validates_then_redirects() {
    let mut h = Harness::new();
    h.navigate("#/register").await;

    h.fill("email", "dave@example.com");
    h.fill("password", "longenough");
    h.fill("password-confirm", "different");
    h.submit("register-form").await;
    assert_eq!(h.text("error-alert"), "Passwords do not match");

    h.fill("password-confirm", "longenough");
    h.submit("register-form").await;
    let settled = h.follow().await.expect("redirected to login");
    assert_eq!(settled.last().unwrap().path, "/login");
    assert!(h.backend.user_id("dave@example.com").is_some());
}

#[tokio::test]
async fn test_dashboard_lists_strategy_cards() {
    let mut h = Harness::signed_in("alice@example.com").await;
    h.navigate("#/dashboard").await;

    assert_eq!(h.text("total-strategies"), "1");
    assert_eq!(h.text("total-assets"), "2");
    let cards = h.html("strategies-container");
    assert!(cards.contains("Dividend Growth"));
    assert!(cards.contains("MSFT"));
}

#[tokio::test]
async fn test_header_reflects_auth_state() {
    let mut h = Harness::new();
    h.navigate("#/").await;
    assert!(h.document.has_class("nav-home", "active"));
    assert!(h.visible("nav-login"));
    assert!(!h.visible("nav-dashboard"));

    h.handle.sign_in("alice@example.com", "password123").await.unwrap();
    h.navigate("#/strategies").await;
    assert!(h.document.has_class("nav-strategies", "active"));
    assert!(!h.document.has_class("nav-home", "active"));
    assert!(!h.visible("nav-login"));
    assert!(h.visible("nav-admin"));
    assert_eq!(h.text("nav-account-email"), "alice@example.com");
}

#[tokio::test]
async fn test_logout_returns_home() {
    let mut h = Harness::signed_in("bob@example.com").await;
    h.navigate("#/dashboard").await;
    assert!(!h.visible("nav-admin"));

    h.click("nav-logout").await;
    let settled = h.follow().await.expect("redirected home");
    assert_eq!(settled.last().unwrap().path, "/");
    assert!(h.handle.current_user().await.unwrap().is_none());
    assert!(h.visible("nav-login"));
}

#[tokio::test(start_paused = true)]
async fn test_footer_signup_resets() {
    let mut h = Harness::new();
    h.navigate("#/").await;

    h.fill("newsletter-email", "reader@example.com");
    h.submit("newsletter-form").await;
    assert_eq!(h.document.is_disabled("newsletter-btn"), Some(true));

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    assert_eq!(h.document.is_disabled("newsletter-btn"), Some(false));
    assert_eq!(h.document.value("newsletter-email").as_deref(), Some(""));
}

#[tokio::test]
async fn test_strategy_delete_flow() {
    let mut h = Harness::signed_in("alice@example.com").await;
    h.navigate("#/strategies").await;
    assert_eq!(h.title(), strategies::TITLE);

    let rows = h.document.ids_with_attribute("data-delete-id");
    assert_eq!(rows.len(), 1);
    let (button, strategy_id) = rows[0].clone();

    h.click(&button).await;
    assert!(h.visible("delete-modal"));
    assert_eq!(h.text("delete-modal-title"), "Delete \"Dividend Growth\"?");

    h.click("cancel-delete-btn").await;
    assert!(!h.visible("delete-modal"));

    h.click(&button).await;
    h.click("confirm-delete-btn").await;
    assert!(!h.visible("delete-modal"));
    assert!(h.html("strategies-list-container").contains("No strategies yet"));
    assert!(h.backend.strategy(&strategy_id).await.unwrap().is_none());

    let alice = h.user_id("alice@example.com");
    assert!(h.backend.user_assets(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_strategy_detail_checks_owner() {
    let mut h = Harness::signed_in("bob@example.com").await;
    let alice = h.user_id("alice@example.com");
    let strategy_id = h.backend.user_strategies(&alice).await.unwrap()[0].id.clone();

    h.navigate(&format!("#/strategies/{}", strategy_id)).await;
    assert!(h
        .html("strategy-section")
        .contains("You do not have permission to view this strategy"));
}

#[tokio::test]
async fn test_strategy_detail_deletes_asset() {
    let mut h = Harness::signed_in("alice@example.com").await;
    let alice = h.user_id("alice@example.com");
    let strategy_id = h.backend.user_strategies(&alice).await.unwrap()[0].id.clone();

    h.navigate(&format!("#/strategies/{}", strategy_id)).await;
    assert_eq!(h.text("strategy-title"), "Dividend Growth");
    assert_eq!(h.text("strategy-asset-count"), "2");
    assert_eq!(
        h.document.attribute("create-asset-btn", "href"),
        Some(format!("#/assets/add?strategy={}", strategy_id))
    );

    let (button, _) = h.document.ids_with_attribute("data-delete-id")[0].clone();
    h.click(&button).await;
    h.click("confirm-delete-btn").await;

    assert_eq!(h.text("strategy-asset-count"), "1");
    assert!(h.visible("delete-success-toast"));
}

#[tokio::test(start_paused = true)]
async fn test_create_strategy() {
    let mut h = Harness::signed_in("bob@example.com").await;
    h.navigate("#/strategies/add").await;
    assert_eq!(h.title(), strategy_add::TITLE);

    h.submit("add-strategy-form").await;
    assert!(h.document.has_class("add-strategy-form", "was-validated"));

    h.fill("title", "Momentum");
    h.submit("add-strategy-form").await;
    assert!(h.visible("success-toast"));

    let settled = h.follow().await.expect("redirected to list");
    assert_eq!(settled.last().unwrap().path, "/strategies");
    assert!(h.html("strategies-list-container").contains("Momentum"));
}

#[tokio::test]
async fn test_edit_strategy_with_attachments() {
    let mut h = Harness::signed_in("alice@example.com").await;
    let alice = h.user_id("alice@example.com");
    let strategy_id = h.backend.user_strategies(&alice).await.unwrap()[0].id.clone();

    h.navigate(&format!("#/strategies/edit/{}", strategy_id)).await;
    assert!(h.visible("edit-strategy-form"));
    assert_eq!(h.document.value("title").as_deref(), Some("Dividend Growth"));
    assert_eq!(h.text("asset-count"), "2");
    assert!(h.visible("attachment-empty"));

    let file = SelectedFile {
        name: "chart.png".into(),
        mime_type: Some("image/png".into()),
        bytes: vec![0; 2048],
    };
    h.dispatch(DomEvent::new(EventKind::Change, "attachment-input").with_files(vec![file]))
        .await;
    assert_eq!(h.text("attachment-count"), "1");
    assert!(h.html("attachment-list").contains("Will be uploaded after Save Changes"));

    h.fill("title", "Dividend Growth II");
    h.submit("edit-strategy-form").await;
    let settled = h.follow().await.expect("redirected to list");
    assert_eq!(settled.last().unwrap().path, "/strategies");

    let attachments = h.backend.attachments(&strategy_id).await.unwrap();
    assert_eq!(attachments.len(), 1);
    assert!(h.backend.has_file(&attachments[0].file_path));
    assert_eq!(
        h.backend.strategy(&strategy_id).await.unwrap().unwrap().title,
        "Dividend Growth II"
    );

    // Reopen: the stored file is listed with a preview and can be removed.
    h.navigate(&format!("#/strategies/edit/{}", strategy_id)).await;
    assert!(h.html("attachment-list").contains("memory://attachments/"));
    let (remove, _) = h.document.ids_with_attribute("data-remove-key")[0].clone();
    h.click(&remove).await;
    assert_eq!(h.text("attachment-count"), "0");
    assert!(h.html("attachment-list").contains("Will be removed after Save Changes"));

    h.submit("edit-strategy-form").await;
    h.follow().await;
    assert!(h.backend.attachments(&strategy_id).await.unwrap().is_empty());
    assert!(!h.backend.has_file(&attachments[0].file_path));
}

#[tokio::test(start_paused = true)]
async fn test_add_asset_from_strategy() {
    let mut h = Harness::signed_in("alice@example.com").await;
    let alice = h.user_id("alice@example.com");
    let strategy_id = h.backend.user_strategies(&alice).await.unwrap()[0].id.clone();
    let targets = h.backend.lookup(LookupTable::Targets).await.unwrap();

    h.navigate(&format!("#/assets/add?strategy={}", strategy_id)).await;
    assert!(h.visible("strategy-info"));
    assert_eq!(h.text("strategy-name"), "Dividend Growth");
    assert_eq!(h.document.value("strategy-id"), Some(strategy_id.clone()));
    assert!(h.html("target").contains("-- Select a Target --"));

    h.fill("ticker", "AAPL");
    h.fill("name", "Apple");
    h.fill("exchange", "NASDAQ");
    h.fill("quantity", "0");
    h.fill("target", &targets[1].id);
    h.click("submit-btn").await;
    assert_eq!(h.text("form-error"), "Please fill in all required fields correctly");

    h.fill("quantity", "3");
    h.click("submit-btn").await;
    let settled = h.follow().await.expect("redirected to strategy");
    assert_eq!(settled.last().unwrap().path, format!("/strategies/{}", strategy_id));
    assert_eq!(h.text("strategy-asset-count"), "3");
}

#[tokio::test]
async fn test_add_asset_cancel() {
    let mut h = Harness::signed_in("alice@example.com").await;
    h.navigate("#/assets/add").await;
    assert!(!h.visible("strategy-info"));

    h.click("submit-btn").await;
    assert_eq!(h.text("form-error"), "Please select or specify a strategy");

    h.click("cancel-btn").await;
    let settled = h.follow().await.expect("redirected to assets");
    assert_eq!(settled.last().unwrap().path, "/assets");
    assert!(h.html("assets-list-container").contains("MSFT"));
}

#[tokio::test]
async fn test_edit_asset_of_other_user_redirects() {
    let mut h = Harness::signed_in("carol@example.com").await;
    let alice = h.user_id("alice@example.com");
    let asset_id = h.backend.user_assets(&alice).await.unwrap()[0].id.clone();

    let settled = h.navigate(&format!("#/assets/edit/{}", asset_id)).await;
    assert_eq!(settled.last().unwrap().path, "/assets");
}

#[tokio::test(start_paused = true)]
async fn test_edit_asset() {
    let mut h = Harness::signed_in("alice@example.com").await;
    let alice = h.user_id("alice@example.com");
    let asset = h.backend.user_assets(&alice).await.unwrap()[0].clone();
    let sell = h.backend.lookup(LookupTable::Actions).await.unwrap()[2].clone();

    h.navigate(&format!("#/assets/edit/{}", asset.id)).await;
    assert!(h.visible("asset-form"));
    assert!(!h.visible("loading-message"));
    assert_eq!(h.document.value("ticker"), Some(asset.ticker.clone()));
    assert!(h.html("action").contains("-- No Action --"));

    h.fill("action", &sell.id);
    h.fill("quantity", "7.5");
    h.click("submit-btn").await;
    let settled = h.follow().await.expect("redirected to strategy");
    assert_eq!(
        settled.last().unwrap().path,
        format!("/strategies/{}", asset.strategy_id)
    );

    let updated = h.backend.asset(&asset.id).await.unwrap().unwrap();
    assert_eq!(updated.quantity, 7.5);
    assert_eq!(updated.action_id, Some(sell.id));
}

#[tokio::test]
async fn test_admin_page_for_admin() {
    let mut h = Harness::signed_in("alice@example.com").await;
    h.navigate("#/admin").await;
    assert_eq!(h.title(), admin::TITLE);
    assert!(h.visible("admin-content"));
    assert!(!h.visible("admin-loading"));
    assert!(h.html("exchanges-table-body").contains("NASDAQ"));
    assert!(h.html("orders-table-body").contains("Market"));
}

#[tokio::test]
async fn test_admin_page_refuses_non_admin() {
    let mut h = Harness::signed_in("bob@example.com").await;
    let settled = h.navigate("#/admin").await;
    let paths: Vec<&str> = settled.navigations.iter().map(|n| n.path.as_str()).collect();
    assert_eq!(paths, ["/admin", "/dashboard"]);
}
