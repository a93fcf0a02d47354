//! Shared, lazily created backend client.
//!
//! # Responsibilities
//! - Build the client on first use from configuration
//! - Hand every caller the same client, including callers racing the
//!   first initialization
//! - Cache the current user's admin flag
//!
//! # Design Decisions
//! - `tokio::sync::OnceCell`: concurrent first callers await the one
//!   pending initialization instead of building duplicates
//! - A failed initialization is not cached; the next caller retries
//! - Admin flag cached per user id and dropped on sign-in/sign-out

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::OnceCell;

use crate::backend::memory::MemoryBackend;
use crate::backend::model::{Session, User};
use crate::backend::rest::RestBackend;
use crate::backend::{Backend, BackendError, BackendResult};
use crate::config::{BackendConfig, BackendMode};

#[derive(Debug)]
struct AdminRecord {
    user_id: String,
    is_admin: bool,
}

struct HandleInner {
    config: BackendConfig,
    client: OnceCell<Arc<dyn Backend>>,
    admin: ArcSwapOption<AdminRecord>,
    initializations: AtomicUsize,
}

/// Cloneable handle every page reads the backend through.
#[derive(Clone)]
pub struct BackendHandle {
    inner: Arc<HandleInner>,
}

impl BackendHandle {
    /// Handle that builds its client from `config` on first use.
    pub fn from_config(config: BackendConfig) -> Self {
        Self::build(config, OnceCell::new())
    }

    /// Handle around an already constructed client.
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self::build(BackendConfig::default(), OnceCell::new_with(Some(backend)))
    }

    fn build(config: BackendConfig, client: OnceCell<Arc<dyn Backend>>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                config,
                client,
                admin: ArcSwapOption::empty(),
                initializations: AtomicUsize::new(0),
            }),
        }
    }

    /// The shared client, created on first call.
    pub async fn client(&self) -> BackendResult<Arc<dyn Backend>> {
        let client = self
            .inner
            .client
            .get_or_try_init(|| async {
                self.inner.initializations.fetch_add(1, Ordering::SeqCst);
                create_client(&self.inner.config)
            })
            .await?;
        Ok(client.clone())
    }

    /// How many times a client has been constructed by this handle.
    pub fn initializations(&self) -> usize {
        self.inner.initializations.load(Ordering::SeqCst)
    }

    pub async fn current_user(&self) -> BackendResult<Option<User>> {
        self.client().await?.current_user().await
    }

    /// The current user, or `NotAuthenticated`.
    pub async fn require_user(&self) -> BackendResult<User> {
        self.current_user()
            .await?
            .ok_or(BackendError::NotAuthenticated)
    }

    /// Whether the signed-in user is an admin. Cached per user.
    pub async fn is_current_user_admin(&self) -> BackendResult<bool> {
        let user = self.require_user().await?;

        if let Some(record) = self.inner.admin.load_full() {
            if record.user_id == user.id {
                return Ok(record.is_admin);
            }
        }

        let is_admin = self.client().await?.is_admin(&user.id).await?;
        self.inner.admin.store(Some(Arc::new(AdminRecord {
            user_id: user.id,
            is_admin,
        })));
        Ok(is_admin)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        self.inner.admin.store(None);
        let session = self.client().await?.sign_in(email, password).await?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> BackendResult<User> {
        self.client().await?.sign_up(email, password).await
    }

    pub async fn sign_out(&self) -> BackendResult<()> {
        self.inner.admin.store(None);
        self.client().await?.sign_out().await?;
        tracing::info!("Signed out");
        Ok(())
    }
}

fn create_client(config: &BackendConfig) -> BackendResult<Arc<dyn Backend>> {
    match config.mode {
        BackendMode::Memory => {
            tracing::info!("Using in-memory backend with demo data");
            Ok(Arc::new(MemoryBackend::seeded()))
        }
        BackendMode::Rest => {
            if config.url.is_empty() || config.anon_key.is_empty() {
                return Err(BackendError::MissingCredentials);
            }
            let client = RestBackend::new(config)?;
            tracing::info!(url = %config.url, "Backend client initialized");
            Ok(Arc::new(client))
        }
    }
}
