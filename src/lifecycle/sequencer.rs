//! Navigation cycle orchestration.
//!
//! # Responsibilities
//! - Run one full cycle per fragment change, in a fixed order
//! - Start a new cancellation generation per cycle
//! - Loop over fragment changes until shutdown
//! - Follow page-issued redirects for the headless driver
//!
//! # Design Decisions
//! - Everything up to and including header activation, plus footer
//!   binding, runs before `handle_route` returns
//! - Page init is spawned, never awaited by the loop; consecutive
//!   changes are not coalesced
//! - No error path: a missing mount or unmatched path degrades to a
//!   no-op or the fallback page

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::backend::BackendHandle;
use crate::dom::{Document, GuardedDocument, HashChange};
use crate::layout;
use crate::lifecycle::cancel::{CycleToken, CycleTracker};
use crate::observability::metrics;
use crate::page::PageContext;
use crate::routing::{resolve_path, MatchSource, RouteParams, RouteTable};

/// One started navigation cycle.
#[derive(Debug)]
pub struct Navigation {
    pub id: Uuid,
    /// Resolved path, query included.
    pub path: String,
    pub title: String,
    pub source: MatchSource,
    pub params: RouteParams,
    pub token: CycleToken,
    /// Background auth lookup started by the header.
    pub header: JoinHandle<()>,
    /// The page's init.
    pub init: JoinHandle<()>,
}

impl Navigation {
    /// Wait for the header lookup and page init to finish.
    pub async fn finished(self) -> NavigationSummary {
        let summary = self.summary();
        if let Err(e) = self.header.await {
            tracing::warn!(navigation_id = %summary.id, error = %e, "Header task failed");
        }
        if let Err(e) = self.init.await {
            tracing::warn!(navigation_id = %summary.id, error = %e, "Page init failed");
        }
        summary
    }

    pub fn summary(&self) -> NavigationSummary {
        NavigationSummary {
            id: self.id,
            path: self.path.clone(),
            title: self.title.clone(),
            kind: self.source.kind(),
            params: self
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Serializable record of a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationSummary {
    pub id: Uuid,
    pub path: String,
    pub title: String,
    pub kind: &'static str,
    pub params: BTreeMap<String, String>,
}

/// Result of driving navigations until no redirect is pending.
#[derive(Debug, Clone, Serialize)]
pub struct Settled {
    /// Every cycle run, in order. The last one is what is mounted.
    pub navigations: Vec<NavigationSummary>,
    /// A redirect was still pending when the hop limit was reached.
    pub truncated: bool,
}

impl Settled {
    pub fn last(&self) -> Option<&NavigationSummary> {
        self.navigations.last()
    }
}

/// Hash router and page lifecycle controller.
pub struct Router {
    table: Arc<RouteTable>,
    document: Arc<dyn Document>,
    backend: BackendHandle,
    tracker: CycleTracker,
    mount_id: String,
}

impl Router {
    pub fn new(
        table: Arc<RouteTable>,
        document: Arc<dyn Document>,
        backend: BackendHandle,
        mount_id: impl Into<String>,
    ) -> Self {
        Self {
            table,
            document,
            backend,
            tracker: CycleTracker::new(),
            mount_id: mount_id.into(),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn document(&self) -> &Arc<dyn Document> {
        &self.document
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    /// Run one navigation cycle for the current fragment.
    ///
    /// Must be called from within a Tokio runtime: page init is spawned.
    pub fn handle_route(&self) -> Navigation {
        let started = Instant::now();

        // 1. Resolve
        let path = resolve_path(&self.document.location_hash());

        // 2. Match
        let resolution = self.table.resolve(&path);
        let page = resolution.page.clone();

        let token = self.tracker.begin();
        let id = Uuid::new_v4();

        // 3. Render shell
        let markup = page.render();
        if !layout::render_layout(self.document.as_ref(), &self.mount_id, &markup) {
            tracing::warn!(
                navigation_id = %id,
                mount_id = %self.mount_id,
                "Mount element missing; page not rendered"
            );
        }

        // 4. Set title
        self.document.set_title(page.title());

        // 5. Shared chrome
        let ctx = PageContext::new(
            id,
            path.clone(),
            resolution.params.clone(),
            GuardedDocument::new(self.document.clone(), token.clone()),
            self.backend.clone(),
        );
        let header = layout::init_header(&ctx);

        // 6. Page init, not awaited
        let init = {
            let ctx = ctx.clone();
            let page = page.clone();
            tokio::spawn(async move { page.init(ctx).await })
        };

        // 7. Footer
        layout::init_footer(&ctx);

        metrics::record_navigation(&resolution.source, started);
        tracing::info!(
            navigation_id = %id,
            path = %path,
            page = %page.title(),
            kind = resolution.source.kind(),
            generation = token.generation(),
            "Navigated"
        );

        Navigation {
            id,
            path,
            title: page.title().to_string(),
            source: resolution.source,
            params: resolution.params,
            token,
            header,
            init,
        }
    }

    /// Run a cycle at startup and one per fragment change until the
    /// change stream ends or shutdown is signalled.
    ///
    /// Returns the number of cycles run.
    pub async fn run(
        &self,
        mut changes: mpsc::UnboundedReceiver<HashChange>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> usize {
        tracing::info!(routes = self.table.entries().len(), "Router started");
        self.handle_route();
        let mut cycles = 1;

        loop {
            // Queued changes are handled before a pending shutdown.
            tokio::select! {
                biased;
                change = changes.recv() => match change {
                    Some(change) => {
                        tracing::debug!(old = %change.old, new = %change.new, "Fragment changed");
                        self.handle_route();
                        cycles += 1;
                    }
                    None => break,
                },
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping router");
                    break;
                }
            }
        }

        tracing::info!(cycles, "Router stopped");
        cycles
    }

    /// Run the cycle for the current fragment, wait for its page init,
    /// and keep following redirects until none is pending or
    /// `max_redirects` hops have been taken.
    pub async fn settle(
        &self,
        changes: &mut mpsc::UnboundedReceiver<HashChange>,
        max_redirects: usize,
    ) -> Settled {
        drain(changes);
        let mut navigations = vec![self.handle_route().finished().await];
        let mut hops = 0;

        while drain(changes) {
            if hops == max_redirects {
                tracing::warn!(
                    max_redirects,
                    hash = %self.document.location_hash(),
                    "Redirect limit reached"
                );
                return Settled {
                    navigations,
                    truncated: true,
                };
            }
            hops += 1;
            navigations.push(self.handle_route().finished().await);
        }

        Settled {
            navigations,
            truncated: false,
        }
    }

    /// Set the fragment and settle.
    pub async fn navigate(
        &self,
        changes: &mut mpsc::UnboundedReceiver<HashChange>,
        hash: &str,
        max_redirects: usize,
    ) -> Settled {
        self.document.set_location_hash(hash);
        self.settle(changes, max_redirects).await
    }
}

/// Discard queued changes; true when there were any.
fn drain(changes: &mut mpsc::UnboundedReceiver<HashChange>) -> bool {
    let mut any = false;
    while changes.try_recv().is_ok() {
        any = true;
    }
    any
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::dom::MemoryDocument;
    use crate::page::{Page, StaticPage};
    use async_trait::async_trait;

    struct Bounce;

    #[async_trait]
    impl Page for Bounce {
        fn title(&self) -> &str {
            "bounce"
        }

        fn render(&self) -> String {
            String::new()
        }

        async fn init(&self, ctx: PageContext) {
            let next = if ctx.route_path() == "/a" { "#/b" } else { "#/a" };
            ctx.redirect(next);
        }
    }

    fn router(hash: &str) -> (Router, mpsc::UnboundedReceiver<HashChange>) {
        let (doc, rx) = MemoryDocument::at("app", hash);
        let table = RouteTable::builder(Arc::new(StaticPage::new("missing", "")))
            .exact("/", Arc::new(StaticPage::new("home", r#"<p id="home"></p>"#)))
            .exact("/a", Arc::new(Bounce))
            .exact("/b", Arc::new(Bounce))
            .build();
        let backend = BackendHandle::with_backend(Arc::new(MemoryBackend::seeded()));
        (Router::new(Arc::new(table), Arc::new(doc), backend, "app"), rx)
    }

    #[tokio::test]
    async fn test_cycle_renders_and_titles() {
        let (router, _rx) = router("");
        let nav = router.handle_route();
        assert_eq!(nav.path, "/");
        assert_eq!(nav.source, MatchSource::Exact);
        assert_eq!(router.document().title(), "home");
        assert!(router.document().contains("home"));
        nav.finished().await;
    }

    #[tokio::test]
    async fn test_new_cycle_cancels_previous_token() {
        let (router, _rx) = router("#/");
        let first = router.handle_route();
        let second = router.handle_route();
        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());
    }

    #[tokio::test]
    async fn test_redirect_loop_is_bounded() {
        let (router, mut rx) = router("#/");
        let settled = router.navigate(&mut rx, "#/a", 3).await;
        assert!(settled.truncated);
        assert_eq!(settled.navigations.len(), 4);
        let paths: Vec<&str> = settled.navigations.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, ["/a", "/b", "/a", "/b"]);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (router, rx) = router("#/");
        let shutdown = crate::lifecycle::Shutdown::new();
        let stop = shutdown.subscribe();
        shutdown.trigger();
        assert_eq!(router.run(rx, stop).await, 1);
    }
}
