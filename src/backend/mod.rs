//! Backend collaborator.
//!
//! # Data Flow
//! ```text
//! Page init / listeners
//!     → handle.rs (lazy shared client, admin cache)
//!     → Backend trait
//!         → rest.rs   (hosted auth / tables / storage over HTTP)
//!         → memory.rs (in-process store, demo data)
//! ```
//!
//! # Design Decisions
//! - `{ data, error }` results become `Result<T, BackendError>`
//! - Row-level authorization belongs to the hosted service; pages only
//!   compare owner ids for display
//! - The client is created once per process and shared

pub mod handle;
pub mod memory;
pub mod model;
pub mod rest;

use async_trait::async_trait;
use thiserror::Error;

use crate::dom::SelectedFile;

pub use handle::BackendHandle;
pub use memory::MemoryBackend;
pub use model::*;
pub use rest::RestBackend;

/// Errors surfaced by backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// URL or anonymous key missing from configuration.
    #[error("Missing backend credentials. Please set TRACKER_BACKEND_URL and TRACKER_BACKEND_ANON_KEY")]
    MissingCredentials,

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("{0} not found")]
    NotFound(String),

    /// The service refused the request (bad credentials, constraint...).
    #[error("{0}")]
    Rejected(String),

    /// Non-success HTTP status from the hosted service.
    #[error("Backend returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Operations the pages need from the hosted backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn session(&self) -> BackendResult<Option<Session>>;
    async fn current_user(&self) -> BackendResult<Option<User>>;
    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<User>;
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session>;
    async fn sign_out(&self) -> BackendResult<()>;
    async fn is_admin(&self, user_id: &str) -> BackendResult<bool>;

    async fn user_strategies(&self, owner_id: &str) -> BackendResult<Vec<Strategy>>;
    async fn strategy(&self, id: &str) -> BackendResult<Option<Strategy>>;
    async fn create_strategy(&self, strategy: NewStrategy) -> BackendResult<Strategy>;
    async fn update_strategy(&self, id: &str, update: StrategyUpdate) -> BackendResult<Strategy>;
    async fn delete_strategy(&self, id: &str) -> BackendResult<()>;

    async fn assets_by_strategy(&self, strategy_id: &str) -> BackendResult<Vec<Asset>>;
    /// Every asset in strategies owned by `owner_id`, strategy joined.
    async fn user_assets(&self, owner_id: &str) -> BackendResult<Vec<Asset>>;
    /// One asset with its strategy joined.
    async fn asset(&self, id: &str) -> BackendResult<Option<Asset>>;
    async fn create_asset(&self, asset: NewAsset) -> BackendResult<Asset>;
    async fn update_asset(&self, id: &str, update: AssetUpdate) -> BackendResult<Asset>;
    async fn delete_asset(&self, id: &str) -> BackendResult<()>;

    async fn lookup(&self, table: LookupTable) -> BackendResult<Vec<LookupRecord>>;

    async fn attachments(&self, strategy_id: &str) -> BackendResult<Vec<Attachment>>;
    /// Store the file and return its object path.
    async fn upload_attachment(&self, strategy_id: &str, file: &SelectedFile) -> BackendResult<String>;
    async fn create_attachment(&self, attachment: NewAttachment) -> BackendResult<Attachment>;
    async fn attachment_signed_url(&self, path: &str) -> BackendResult<String>;
    async fn remove_attachment_file(&self, path: &str) -> BackendResult<()>;
    async fn delete_attachment(&self, id: &str) -> BackendResult<()>;
}

/// Object path for a new attachment: `<strategy>/<uuid>-<safe name>`.
pub fn attachment_object_path(strategy_id: &str, file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}/{}-{}", strategy_id, uuid::Uuid::new_v4(), safe)
}
