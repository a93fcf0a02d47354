//! Lookup table overview for admins.

use async_trait::async_trait;

use crate::backend::{LookupRecord, LookupTable};
use crate::dom::Document;
use crate::page::{Page, PageContext};
use crate::pages::common::{hide, require_user, show_message, DASHBOARD_HASH};
use crate::util::format;
use crate::util::html::escape;

pub const TITLE: &str = "Admin Panel | Asset Tracking System";

/// Tables in display order, with the body each renders into.
const TABLES: [(LookupTable, &str); 4] = [
    (LookupTable::Actions, "actions-table-body"),
    (LookupTable::Exchanges, "exchanges-table-body"),
    (LookupTable::Orders, "orders-table-body"),
    (LookupTable::Targets, "targets-table-body"),
];

pub struct AdminPage;

#[async_trait]
impl Page for AdminPage {
    fn title(&self) -> &str {
        TITLE
    }

    fn render(&self) -> String {
        let cards: String = TABLES
            .iter()
            .map(|(table, body)| {
                format!(
                    r#"<div class="col-lg-6"><div class="card border-0 shadow-sm h-100"><div class="card-body">
  <h2 class="h5 text-capitalize">{name}</h2>
  <table class="table table-sm mb-0">
    <thead><tr><th>Name</th><th>Created</th><th class="text-end">Actions</th></tr></thead>
    <tbody id="{body}"></tbody>
  </table>
</div></div></div>"#,
                    name = table.table_name(),
                    body = body,
                )
            })
            .collect();

        format!(
            r#"<section class="admin">
  <h1 class="h3 mb-4">Admin Panel</h1>
  <div class="text-center py-5" id="admin-loading"><span class="spinner-border" role="status"></span></div>
  <div class="alert alert-danger" id="admin-error" hidden></div>
  <div class="row g-4" id="admin-content" hidden>{}</div>
</section>"#,
            cards
        )
    }

    async fn init(&self, ctx: PageContext) {
        if require_user(&ctx).await.is_none() {
            return;
        }
        match ctx.backend().is_current_user_admin().await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(navigation_id = %ctx.navigation_id(), "Admin page refused for non-admin");
                ctx.redirect(DASHBOARD_HASH);
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Admin check failed");
                ctx.redirect(DASHBOARD_HASH);
                return;
            }
        }

        load(&ctx).await;
    }
}

async fn load(ctx: &PageContext) {
    let doc = ctx.document();
    if !["admin-loading", "admin-error", "admin-content"]
        .iter()
        .all(|id| doc.contains(id))
    {
        return;
    }
    hide(doc, "admin-error");

    let backend = match ctx.backend().client().await {
        Ok(backend) => backend,
        Err(e) => {
            hide(doc, "admin-loading");
            return show_message(doc, "admin-error", &e.to_string());
        }
    };

    let (actions, exchanges, orders, targets) = tokio::join!(
        backend.lookup(LookupTable::Actions),
        backend.lookup(LookupTable::Exchanges),
        backend.lookup(LookupTable::Orders),
        backend.lookup(LookupTable::Targets),
    );

    let results = [actions, exchanges, orders, targets];
    let doc = ctx.document();
    if let Some(e) = results.iter().find_map(|r| r.as_ref().err()) {
        tracing::warn!(error = %e, "Failed to load lookup tables");
        hide(doc, "admin-loading");
        show_message(doc, "admin-error", &e.to_string());
        return;
    }

    for ((_, body), records) in TABLES.iter().zip(results) {
        doc.set_inner_html(body, &render_rows(&records.unwrap_or_default()));
    }
    hide(doc, "admin-loading");
    doc.set_visible("admin-content", true);
}

pub fn render_rows(records: &[LookupRecord]) -> String {
    if records.is_empty() {
        return r#"<tr><td colspan="3" class="admin-empty-row py-3">No records</td></tr>"#.to_string();
    }

    records
        .iter()
        .map(|record| {
            format!(
                r#"<tr><td>{}</td><td>{}</td><td class="text-end"><div class="admin-table-actions"><button type="button" class="btn btn-sm btn-outline-primary">View</button> <button type="button" class="btn btn-sm btn-outline-warning">Edit</button> <button type="button" class="btn btn-sm btn-outline-danger">Delete</button></div></td></tr>"#,
                escape(record.name.as_deref().unwrap_or("-")),
                format::optional_date(record.created_at.as_ref()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows() {
        assert!(render_rows(&[]).contains("No records"));

        let rows = render_rows(&[LookupRecord {
            id: "1".into(),
            name: None,
            created_at: None,
        }]);
        assert!(rows.contains("<td>-</td><td>-</td>"));
    }

    #[test]
    fn test_render_has_every_table_body() {
        let markup = AdminPage.render();
        for (_, body) in TABLES {
            assert!(markup.contains(body));
        }
    }
}
