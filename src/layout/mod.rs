//! Shared page shell.
//!
//! # Data Flow
//! ```text
//! page.render() markup
//!     → render_layout: header + <main><div id="page-root">markup</div></main> + footer
//!     → mount element (replaced wholesale, old listeners dropped with it)
//!
//! After mounting:
//!     → header.rs: active nav link, auth-dependent visibility, logout
//!     → footer.rs: newsletter form
//! ```

pub mod footer;
pub mod header;

use crate::dom::Document;

pub use footer::init_footer;
pub use header::init_header;

/// Id of the wrapper the page markup is nested in.
pub const PAGE_ROOT_ID: &str = "page-root";

/// The full shell around a page's markup.
pub fn shell(content: &str) -> String {
    format!(
        "{header}\n<main class=\"page-shell\">\n  <div class=\"container py-4\" id=\"{root}\">\n{content}\n  </div>\n</main>\n{footer}",
        header = header::MARKUP,
        root = PAGE_ROOT_ID,
        content = content,
        footer = footer::MARKUP,
    )
}

/// Replace the mount element's contents with the shell.
///
/// Returns `false` without touching anything when the mount is absent.
pub fn render_layout(document: &dyn Document, mount_id: &str, content: &str) -> bool {
    if !document.contains(mount_id) {
        tracing::debug!(mount_id, "Mount element missing; layout skipped");
        return false;
    }
    document.set_inner_html(mount_id, &shell(content))
}
