//! Helpers shared by the routed pages.

use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::backend::{LookupRecord, User};
use crate::dom::{Document, EventKind};
use crate::page::PageContext;
use crate::util::html::{escape, escape_attr};

pub const LOGIN_HASH: &str = "#/login";
pub const DASHBOARD_HASH: &str = "#/dashboard";

/// The signed-in user, or a redirect to the login page.
pub async fn require_user(ctx: &PageContext) -> Option<User> {
    match ctx.backend().require_user().await {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::debug!(
                navigation_id = %ctx.navigation_id(),
                path = %ctx.path(),
                reason = %e,
                "Not signed in; redirecting to login"
            );
            ctx.redirect(LOGIN_HASH);
            None
        }
    }
}

/// Put `message` into an alert element and show it.
pub fn show_message(doc: &dyn Document, id: &str, message: &str) {
    doc.set_text(id, message);
    doc.set_visible(id, true);
}

pub fn hide(doc: &dyn Document, id: &str) {
    doc.set_visible(id, false);
}

/// Markup for a red alert box.
pub fn error_alert(message: &str) -> String {
    format!(
        r#"<div class="alert alert-danger" role="alert">{}</div>"#,
        escape(message)
    )
}

/// `<option>` list for a lookup select, led by a placeholder.
pub fn lookup_options(placeholder: &str, records: &[LookupRecord]) -> String {
    let mut markup = format!(r#"<option value="">{}</option>"#, escape(placeholder));
    for record in records {
        markup.push_str(&format!(
            r#"<option value="{}">{}</option>"#,
            escape_attr(&record.id),
            escape(record.name.as_deref().unwrap_or("-"))
        ));
    }
    markup
}

/// Swap the auth form for its loading indicator, or back.
pub fn set_auth_loading(doc: &dyn Document, loading: bool) {
    doc.set_visible("auth-form", !loading);
    doc.set_visible("loading-state", loading);
    doc.set_disabled("submit-btn", loading);
}

/// Shown when the asset form is incomplete or the quantity is not positive.
pub const ASSET_FIELDS_INVALID: &str = "Please fill in all required fields correctly";

/// Values of the asset add/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetFields {
    pub ticker: String,
    pub name: String,
    pub exchange: String,
    pub quantity: f64,
    pub target_id: String,
    pub action_id: Option<String>,
}

/// Read the asset form. `None` when a required field is blank or the
/// quantity is not a positive number.
pub fn read_asset_fields(doc: &dyn Document) -> Option<AssetFields> {
    let field = |id: &str| doc.value(id).unwrap_or_default().trim().to_string();

    let fields = AssetFields {
        ticker: field("ticker"),
        name: field("name"),
        exchange: field("exchange"),
        quantity: field("quantity").parse::<f64>().ok().filter(|q| q.is_finite())?,
        target_id: field("target"),
        action_id: Some(field("action")).filter(|a| !a.is_empty()),
    };

    let complete = !fields.ticker.is_empty()
        && !fields.name.is_empty()
        && !fields.exchange.is_empty()
        && !fields.target_id.is_empty();
    (complete && fields.quantity > 0.0).then_some(fields)
}

const MODAL_ID: &str = "delete-modal";
const MODAL_TITLE_ID: &str = "delete-modal-title";
const CONFIRM_ID: &str = "confirm-delete-btn";
const CANCEL_ID: &str = "cancel-delete-btn";
const CONFIRM_LABEL: &str = r#"<i class="bi bi-trash-fill me-2"></i>Delete Permanently"#;

/// Attribute carried by row delete buttons; its value is the record id.
pub const DELETE_ID_ATTR: &str = "data-delete-id";
/// Optional attribute naming the record in the confirmation title.
pub const DELETE_LABEL_ATTR: &str = "data-delete-label";

/// Shared markup for the delete confirmation dialog.
pub fn delete_modal(noun: &str) -> String {
    format!(
        r#"<div class="modal-panel card border-danger" id="{modal}" hidden>
  <div class="card-body">
    <h5 class="card-title" id="{title}">Delete this {noun}?</h5>
    <p class="text-muted mb-3">This action cannot be undone.</p>
    <button type="button" class="btn btn-outline-secondary" id="{cancel}">Cancel</button>
    <button type="button" class="btn btn-danger" id="{confirm}">{label}</button>
  </div>
</div>"#,
        modal = MODAL_ID,
        title = MODAL_TITLE_ID,
        noun = noun,
        cancel = CANCEL_ID,
        confirm = CONFIRM_ID,
        label = CONFIRM_LABEL,
    )
}

/// Row delete buttons open a confirmation; confirming runs a handler
/// with the chosen record id.
#[derive(Clone)]
pub struct DeleteFlow {
    ctx: PageContext,
    pending: Arc<Mutex<Option<String>>>,
}

impl DeleteFlow {
    /// Bind the dialog's cancel button.
    pub fn new(ctx: &PageContext) -> Self {
        let flow = Self {
            ctx: ctx.clone(),
            pending: Arc::new(Mutex::new(None)),
        };

        let pending = flow.pending.clone();
        ctx.on(CANCEL_ID, EventKind::Click, move |ctx, _| {
            let pending = pending.clone();
            async move {
                pending.lock().expect("pending mutex poisoned").take();
                ctx.document().set_visible(MODAL_ID, false);
            }
        });

        flow
    }

    /// Bind the confirm button. `handler` owns error display and
    /// refreshing whatever list the record was in.
    pub fn on_confirm<F, Fut>(&self, handler: F)
    where
        F: Fn(PageContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let pending = self.pending.clone();
        let handler = Arc::new(handler);
        self.ctx.on(CONFIRM_ID, EventKind::Click, move |ctx, _| {
            let pending = pending.clone();
            let handler = handler.clone();
            async move {
                let Some(id) = pending.lock().expect("pending mutex poisoned").take() else {
                    return;
                };
                let doc = ctx.document();
                doc.set_disabled(CONFIRM_ID, true);
                doc.set_text(CONFIRM_ID, "Deleting...");

                handler(ctx.clone(), id).await;

                let doc = ctx.document();
                doc.set_visible(MODAL_ID, false);
                doc.set_inner_html(CONFIRM_ID, CONFIRM_LABEL);
                doc.set_disabled(CONFIRM_ID, false);
            }
        });
    }

    /// Bind every rendered row delete button. Call after each render.
    pub fn bind_rows(&self) {
        let doc = self.ctx.document();
        for (button, record_id) in doc.ids_with_attribute(DELETE_ID_ATTR) {
            let label = doc.attribute(&button, DELETE_LABEL_ATTR);
            let pending = self.pending.clone();
            self.ctx.on(&button, EventKind::Click, move |ctx, _| {
                let pending = pending.clone();
                let record_id = record_id.clone();
                let label = label.clone();
                async move {
                    *pending.lock().expect("pending mutex poisoned") = Some(record_id);
                    let doc = ctx.document();
                    if let Some(label) = label {
                        doc.set_text(MODAL_TITLE_ID, &format!("Delete \"{}\"?", label));
                    }
                    doc.set_visible(MODAL_ID, true);
                }
            });
        }
    }

    /// The record awaiting confirmation.
    pub fn pending(&self) -> Option<String> {
        self.pending.lock().expect("pending mutex poisoned").clone()
    }
}
