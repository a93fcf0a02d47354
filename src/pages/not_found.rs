//! Fallback for unmatched paths.

use async_trait::async_trait;

use crate::page::Page;

pub const TITLE: &str = "Page Not Found | Asset Tracking System";

const MARKUP: &str = r##"<section class="text-center py-5" id="not-found">
  <h1 class="display-6 fw-bold">Page not found</h1>
  <p class="text-muted-strong">The page you are looking for does not exist or has moved.</p>
  <a href="#/" class="btn btn-accent" id="not-found-home">Back to Home</a>
</section>"##;

pub struct NotFoundPage;

#[async_trait]
impl Page for NotFoundPage {
    fn title(&self) -> &str {
        TITLE
    }

    fn render(&self) -> String {
        MARKUP.to_string()
    }
}
