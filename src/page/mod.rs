//! Page descriptor contract.
//!
//! # Responsibilities
//! - Define what every routed view provides: a title, pure markup, and
//!   optional async initialization against the mounted document
//! - Carry per-navigation state into `init` via [`PageContext`]
//!
//! # Design Decisions
//! - Pages are process-wide singletons behind `Arc<dyn Page>`
//! - `render` never touches the document; `init` runs after mounting
//! - `init` returns nothing: failures are the page's to display

mod context;

use async_trait::async_trait;

pub use context::PageContext;

/// A routed view.
#[async_trait]
pub trait Page: Send + Sync {
    /// Document title while this page is shown.
    fn title(&self) -> &str;

    /// Markup mounted into the content region.
    fn render(&self) -> String;

    /// Load data and bind listeners once the markup is mounted.
    async fn init(&self, _ctx: PageContext) {}
}

/// A page with fixed markup and no initialization.
#[derive(Debug, Clone)]
pub struct StaticPage {
    title: String,
    markup: String,
}

impl StaticPage {
    pub fn new(title: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            markup: markup.into(),
        }
    }
}

#[async_trait]
impl Page for StaticPage {
    fn title(&self) -> &str {
        &self.title
    }

    fn render(&self) -> String {
        self.markup.clone()
    }
}
