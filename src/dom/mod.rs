//! Document abstraction.
//!
//! # Data Flow
//! ```text
//! Layout renderer / chrome / pages
//!     → Document trait (ids, text, values, classes, listeners)
//!     → memory.rs (in-process document, hashchange channel)
//!
//! Page init for a superseded cycle
//!     → guarded.rs (every call becomes a no-op once cancelled)
//! ```
//!
//! # Design Decisions
//! - Elements are addressed by id only; that is all the pages need
//! - Missing ids are a normal condition: writes return `false`, reads `None`
//! - Listeners are async and owned by their element; replacing markup
//!   drops them with the element

pub mod guarded;
pub mod memory;

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

pub use guarded::GuardedDocument;
pub use memory::{HashChange, MemoryDocument};

/// Events pages and chrome bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Submit,
    Change,
}

/// A file picked through a file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// An event delivered to a listener.
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub kind: EventKind,
    /// Id of the element the listener is bound to.
    pub target: String,
    /// Files carried by a `Change` event on a file input.
    pub files: Vec<SelectedFile>,
}

impl DomEvent {
    pub fn new(kind: EventKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            files: Vec::new(),
        }
    }

    pub fn with_files(mut self, files: Vec<SelectedFile>) -> Self {
        self.files = files;
        self
    }
}

/// Async event callback.
pub type Listener = Arc<dyn Fn(DomEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure as a [`Listener`].
pub fn listener<F, Fut>(f: F) -> Listener
where
    F: Fn(DomEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |event| Box::pin(f(event)))
}

/// The document the router renders into.
pub trait Document: Send + Sync {
    /// Current location fragment, including its leading `#` when set.
    fn location_hash(&self) -> String;

    /// Change the location fragment. Emits a change event when it differs.
    fn set_location_hash(&self, hash: &str);

    fn title(&self) -> String;

    fn set_title(&self, title: &str);

    fn contains(&self, id: &str) -> bool;

    /// Replace an element's children with parsed markup.
    fn set_inner_html(&self, id: &str, markup: &str) -> bool;

    /// Markup last written into an element.
    fn inner_html(&self, id: &str) -> Option<String>;

    /// Replace an element's children with plain text.
    fn set_text(&self, id: &str, text: &str) -> bool;

    fn text(&self, id: &str) -> Option<String>;

    /// Form control value.
    fn value(&self, id: &str) -> Option<String>;

    fn set_value(&self, id: &str, value: &str) -> bool;

    fn attribute(&self, id: &str, name: &str) -> Option<String>;

    fn set_attribute(&self, id: &str, name: &str, value: &str) -> bool;

    fn has_class(&self, id: &str, class: &str) -> bool;

    /// Add (`on`) or remove a class.
    fn toggle_class(&self, id: &str, class: &str, on: bool) -> bool;

    fn is_visible(&self, id: &str) -> Option<bool>;

    fn set_visible(&self, id: &str, visible: bool) -> bool;

    fn is_disabled(&self, id: &str) -> Option<bool>;

    fn set_disabled(&self, id: &str, disabled: bool) -> bool;

    /// `(id, value)` for every element carrying the attribute.
    fn ids_with_attribute(&self, name: &str) -> Vec<(String, String)>;

    /// Bind a listener to an element.
    fn add_listener(&self, id: &str, kind: EventKind, listener: Listener) -> bool;
}
