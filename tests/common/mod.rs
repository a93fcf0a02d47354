//! Shared harness for integration tests: an in-memory document, the
//! seeded in-memory backend and the application router.

#![allow(dead_code)]

use std::sync::Arc;

use tokio::sync::mpsc;

use strategy_tracker::backend::{BackendHandle, MemoryBackend};
use strategy_tracker::dom::{Document, DomEvent, EventKind, HashChange, MemoryDocument};
use strategy_tracker::lifecycle::Settled;
use strategy_tracker::{build_route_table, Router};

pub const MOUNT_ID: &str = "app";
pub const MAX_REDIRECTS: usize = 5;
pub const DEMO_PASSWORD: &str = "password123";

pub struct Harness {
    pub document: Arc<MemoryDocument>,
    pub backend: Arc<MemoryBackend>,
    pub handle: BackendHandle,
    pub router: Router,
    pub changes: mpsc::UnboundedReceiver<HashChange>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_backend(MemoryBackend::seeded())
    }

    pub fn with_backend(backend: MemoryBackend) -> Self {
        let (document, changes) = MemoryDocument::new(MOUNT_ID);
        let document = Arc::new(document);
        let backend = Arc::new(backend);
        let handle = BackendHandle::with_backend(backend.clone());
        let table = build_route_table().expect("route table builds");
        let router = Router::new(Arc::new(table), document.clone(), handle.clone(), MOUNT_ID);
        Self {
            document,
            backend,
            handle,
            router,
            changes,
        }
    }

    /// Harness with `email` already signed in.
    pub async fn signed_in(email: &str) -> Self {
        let harness = Self::new();
        harness
            .handle
            .sign_in(email, DEMO_PASSWORD)
            .await
            .expect("demo sign in");
        harness
    }

    /// Navigate and follow redirects until settled.
    pub async fn navigate(&mut self, hash: &str) -> Settled {
        self.router
            .navigate(&mut self.changes, hash, MAX_REDIRECTS)
            .await
    }

    /// Settle any navigation a listener triggered.
    pub async fn follow(&mut self) -> Option<Settled> {
        if self.changes.try_recv().is_err() {
            return None;
        }
        Some(self.router.settle(&mut self.changes, MAX_REDIRECTS).await)
    }

    /// Run an element's click listeners. Returns how many ran.
    pub async fn click(&self, id: &str) -> usize {
        self.document.dispatch(id, EventKind::Click).await
    }

    pub async fn submit(&self, id: &str) -> usize {
        self.document.dispatch(id, EventKind::Submit).await
    }

    pub async fn dispatch(&self, event: DomEvent) -> usize {
        self.document.dispatch_event(event).await
    }

    pub fn fill(&self, id: &str, value: &str) {
        assert!(self.document.set_value(id, value), "no element {:?}", id);
    }

    pub fn hash(&self) -> String {
        self.document.location_hash()
    }

    pub fn title(&self) -> String {
        self.document.title()
    }

    pub fn text(&self, id: &str) -> String {
        self.document.text(id).unwrap_or_default()
    }

    pub fn html(&self, id: &str) -> String {
        self.document.inner_html(id).unwrap_or_default()
    }

    pub fn visible(&self, id: &str) -> bool {
        self.document.is_visible(id).unwrap_or(false)
    }

    pub fn user_id(&self, email: &str) -> String {
        self.backend.user_id(email).expect("demo account")
    }
}
