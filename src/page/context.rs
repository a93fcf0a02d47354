//! Per-navigation context handed to page `init`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::backend::BackendHandle;
use crate::dom::{listener, Document, DomEvent, EventKind, GuardedDocument};
use crate::lifecycle::cancel::CycleToken;
use crate::routing::{query_string, route_path, RouteParams};

struct ContextInner {
    navigation_id: Uuid,
    path: String,
    params: RouteParams,
    document: GuardedDocument,
    backend: BackendHandle,
}

/// Cheap to clone; listeners bound in `init` keep their own copy.
#[derive(Clone)]
pub struct PageContext {
    inner: Arc<ContextInner>,
}

impl PageContext {
    pub fn new(
        navigation_id: Uuid,
        path: impl Into<String>,
        params: RouteParams,
        document: GuardedDocument,
        backend: BackendHandle,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                navigation_id,
                path: path.into(),
                params,
                document,
                backend,
            }),
        }
    }

    pub fn navigation_id(&self) -> Uuid {
        self.inner.navigation_id
    }

    /// Full current path, query included.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Current path without its query.
    pub fn route_path(&self) -> &str {
        route_path(&self.inner.path)
    }

    /// A placeholder captured by the matched dynamic route.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.inner.params.get(name)
    }

    /// First value of a query parameter, decoded.
    pub fn query(&self, name: &str) -> Option<String> {
        let query = query_string(&self.inner.path)?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// The document, fenced to this navigation's cycle.
    pub fn document(&self) -> &GuardedDocument {
        &self.inner.document
    }

    pub fn backend(&self) -> &BackendHandle {
        &self.inner.backend
    }

    pub fn token(&self) -> &CycleToken {
        self.inner.document.token()
    }

    /// True once a later navigation has started.
    pub fn is_stale(&self) -> bool {
        self.token().is_cancelled()
    }

    /// Change the location fragment. Dropped when stale.
    pub fn redirect(&self, hash: &str) {
        tracing::debug!(
            navigation_id = %self.inner.navigation_id,
            to = hash,
            "Page redirect"
        );
        self.inner.document.set_location_hash(hash);
    }

    /// Bind `handler` to an element of this cycle's document. Each call
    /// receives its own clone of the context.
    pub fn on<F, Fut>(&self, id: &str, kind: EventKind, handler: F) -> bool
    where
        F: Fn(PageContext, DomEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ctx = self.clone();
        self.inner
            .document
            .add_listener(id, kind, listener(move |event| handler(ctx.clone(), event)))
    }

    /// Wait `delay`, then report whether this cycle is still current.
    /// Returns early with `false` when superseded while waiting.
    pub async fn sleep(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => !self.is_stale(),
            _ = self.token().cancelled() => false,
        }
    }

    /// Redirect after `delay` unless superseded first.
    pub async fn redirect_after(&self, delay: Duration, hash: &str) -> bool {
        if self.sleep(delay).await {
            self.redirect(hash);
            true
        } else {
            false
        }
    }
}
