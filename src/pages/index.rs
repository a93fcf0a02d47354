//! Landing page.

use async_trait::async_trait;

use crate::page::Page;

pub const TITLE: &str = "Asset Tracking System - Manage Your Investment Portfolio";

const MARKUP: &str = r##"<section class="hero text-center py-5" id="hero">
  <h1 class="display-5 fw-bold">Track every strategy and the assets behind it</h1>
  <p class="lead text-muted-strong">Group holdings into strategies, set targets, attach research, and see it all on one dashboard.</p>
  <div class="d-flex justify-content-center gap-3 mt-4">
    <a href="#/register" class="btn btn-accent btn-lg" id="cta-register">Get Started</a>
    <a href="#/login" class="btn btn-outline-secondary btn-lg" id="cta-login">Sign In</a>
  </div>
</section>
<section class="row g-4 py-4" id="features">
  <div class="col-md-4"><h5>Strategies</h5><p class="text-muted">Name an idea once and keep its assets together.</p></div>
  <div class="col-md-4"><h5>Assets</h5><p class="text-muted">Ticker, exchange, quantity, target and next action per holding.</p></div>
  <div class="col-md-4"><h5>Attachments</h5><p class="text-muted">Keep reports and screenshots next to the strategy they support.</p></div>
</section>"##;

pub struct IndexPage;

#[async_trait]
impl Page for IndexPage {
    fn title(&self) -> &str {
        TITLE
    }

    fn render(&self) -> String {
        MARKUP.to_string()
    }
}
