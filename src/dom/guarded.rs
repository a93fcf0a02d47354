//! Cycle-scoped view of a document.

use std::sync::Arc;

use crate::dom::{Document, EventKind, Listener};
use crate::lifecycle::cancel::CycleToken;
use crate::observability::metrics;

/// Forwards to the real document until its cycle is superseded, then
/// turns every write into a no-op and every read into `None`.
///
/// The currency check and the forwarded call happen inside one
/// [`CycleToken::fenced`] section, so a write can never land after the
/// next cycle has begun.
#[derive(Clone)]
pub struct GuardedDocument {
    inner: Arc<dyn Document>,
    token: CycleToken,
}

impl GuardedDocument {
    pub fn new(inner: Arc<dyn Document>, token: CycleToken) -> Self {
        Self { inner, token }
    }

    pub fn token(&self) -> &CycleToken {
        &self.token
    }

    fn read<T>(&self, f: impl FnOnce(&dyn Document) -> Option<T>) -> Option<T> {
        self.token.fenced(|| f(self.inner.as_ref())).flatten()
    }

    fn write(&self, f: impl FnOnce(&dyn Document) -> bool) -> bool {
        match self.token.fenced(|| f(self.inner.as_ref())) {
            Some(written) => written,
            None => {
                metrics::record_stale_write();
                false
            }
        }
    }
}

impl Document for GuardedDocument {
    fn location_hash(&self) -> String {
        self.inner.location_hash()
    }

    fn set_location_hash(&self, hash: &str) {
        if !self.write(|d| {
            d.set_location_hash(hash);
            true
        }) {
            tracing::debug!(hash, "Dropping redirect from superseded cycle");
        }
    }

    fn title(&self) -> String {
        self.inner.title()
    }

    fn set_title(&self, title: &str) {
        self.write(|d| {
            d.set_title(title);
            true
        });
    }

    fn contains(&self, id: &str) -> bool {
        self.token.fenced(|| self.inner.contains(id)).unwrap_or(false)
    }

    fn set_inner_html(&self, id: &str, markup: &str) -> bool {
        self.write(|d| d.set_inner_html(id, markup))
    }

    fn inner_html(&self, id: &str) -> Option<String> {
        self.read(|d| d.inner_html(id))
    }

    fn set_text(&self, id: &str, text: &str) -> bool {
        self.write(|d| d.set_text(id, text))
    }

    fn text(&self, id: &str) -> Option<String> {
        self.read(|d| d.text(id))
    }

    fn value(&self, id: &str) -> Option<String> {
        self.read(|d| d.value(id))
    }

    fn set_value(&self, id: &str, value: &str) -> bool {
        self.write(|d| d.set_value(id, value))
    }

    fn attribute(&self, id: &str, name: &str) -> Option<String> {
        self.read(|d| d.attribute(id, name))
    }

    fn set_attribute(&self, id: &str, name: &str, value: &str) -> bool {
        self.write(|d| d.set_attribute(id, name, value))
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.token
            .fenced(|| self.inner.has_class(id, class))
            .unwrap_or(false)
    }

    fn toggle_class(&self, id: &str, class: &str, on: bool) -> bool {
        self.write(|d| d.toggle_class(id, class, on))
    }

    fn is_visible(&self, id: &str) -> Option<bool> {
        self.read(|d| d.is_visible(id))
    }

    fn set_visible(&self, id: &str, visible: bool) -> bool {
        self.write(|d| d.set_visible(id, visible))
    }

    fn is_disabled(&self, id: &str) -> Option<bool> {
        self.read(|d| d.is_disabled(id))
    }

    fn set_disabled(&self, id: &str, disabled: bool) -> bool {
        self.write(|d| d.set_disabled(id, disabled))
    }

    fn ids_with_attribute(&self, name: &str) -> Vec<(String, String)> {
        self.token
            .fenced(|| self.inner.ids_with_attribute(name))
            .unwrap_or_default()
    }

    fn add_listener(&self, id: &str, kind: EventKind, listener: Listener) -> bool {
        self.write(|d| d.add_listener(id, kind, listener))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    use crate::dom::MemoryDocument;
    use crate::layout::{render_layout, PAGE_ROOT_ID};
    use crate::lifecycle::cancel::CycleTracker;

    /// Pauses the first `set_inner_html` on the page root between
    /// entering the document and applying the write.
    struct PausingDocument {
        inner: MemoryDocument,
        armed: AtomicBool,
        entered: Barrier,
        release: Barrier,
    }

    impl Document for PausingDocument {
        fn location_hash(&self) -> String {
            self.inner.location_hash()
        }
        fn set_location_hash(&self, hash: &str) {
            self.inner.set_location_hash(hash)
        }
        fn title(&self) -> String {
            self.inner.title()
        }
        fn set_title(&self, title: &str) {
            self.inner.set_title(title)
        }
        fn contains(&self, id: &str) -> bool {
            self.inner.contains(id)
        }
        fn set_inner_html(&self, id: &str, markup: &str) -> bool {
            if id == PAGE_ROOT_ID && self.armed.swap(false, Ordering::SeqCst) {
                self.entered.wait();
                self.release.wait();
            }
            self.inner.set_inner_html(id, markup)
        }
        fn inner_html(&self, id: &str) -> Option<String> {
            self.inner.inner_html(id)
        }
        fn set_text(&self, id: &str, text: &str) -> bool {
            self.inner.set_text(id, text)
        }
        fn text(&self, id: &str) -> Option<String> {
            self.inner.text(id)
        }
        fn value(&self, id: &str) -> Option<String> {
            self.inner.value(id)
        }
        fn set_value(&self, id: &str, value: &str) -> bool {
            self.inner.set_value(id, value)
        }
        fn attribute(&self, id: &str, name: &str) -> Option<String> {
            self.inner.attribute(id, name)
        }
        fn set_attribute(&self, id: &str, name: &str, value: &str) -> bool {
            self.inner.set_attribute(id, name, value)
        }
        fn has_class(&self, id: &str, class: &str) -> bool {
            self.inner.has_class(id, class)
        }
        fn toggle_class(&self, id: &str, class: &str, on: bool) -> bool {
            self.inner.toggle_class(id, class, on)
        }
        fn is_visible(&self, id: &str) -> Option<bool> {
            self.inner.is_visible(id)
        }
        fn set_visible(&self, id: &str, visible: bool) -> bool {
            self.inner.set_visible(id, visible)
        }
        fn is_disabled(&self, id: &str) -> Option<bool> {
            self.inner.is_disabled(id)
        }
        fn set_disabled(&self, id: &str, disabled: bool) -> bool {
            self.inner.set_disabled(id, disabled)
        }
        fn ids_with_attribute(&self, name: &str) -> Vec<(String, String)> {
            self.inner.ids_with_attribute(name)
        }
        fn add_listener(&self, id: &str, kind: EventKind, listener: Listener) -> bool {
            self.inner.add_listener(id, kind, listener)
        }
    }

    #[test]
    fn test_write_in_flight_cannot_outlive_next_cycle() {
        let (inner, _rx) = MemoryDocument::new("app");
        let doc = Arc::new(PausingDocument {
            inner,
            armed: AtomicBool::new(false),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        });
        render_layout(doc.as_ref(), "app", r#"<p id="first"></p>"#);
        doc.armed.store(true, Ordering::SeqCst);

        let tracker = CycleTracker::new();
        let stale = GuardedDocument::new(doc.clone(), tracker.begin());

        // The old cycle's write has passed its check and is mid-flight.
        let writer = std::thread::spawn(move || {
            stale.set_inner_html(PAGE_ROOT_ID, r#"<p id="stale"></p>"#)
        });
        doc.entered.wait();

        // The next cycle starts and renders its shell.
        let next = std::thread::spawn({
            let doc = doc.clone();
            let tracker = tracker.clone();
            move || {
                let token = tracker.begin();
                render_layout(doc.as_ref(), "app", r#"<p id="second"></p>"#);
                token
            }
        });
        std::thread::sleep(Duration::from_millis(50));
        doc.release.wait();

        writer.join().unwrap();
        let token = next.join().unwrap();
        assert!(!token.is_cancelled());
        assert!(doc.contains("second"));
        assert!(!doc.contains("stale"));
    }

    #[test]
    fn test_writes_stop_after_cancellation() {
        let (doc, mut rx) = MemoryDocument::new("app");
        let doc: Arc<dyn Document> = Arc::new(doc);
        doc.set_inner_html("app", r#"<p id="msg"></p>"#);

        let tracker = CycleTracker::new();
        let guarded = GuardedDocument::new(doc.clone(), tracker.begin());
        assert!(guarded.set_text("msg", "first"));

        tracker.begin();
        assert!(!guarded.set_text("msg", "stale"));
        assert!(guarded.text("msg").is_none());
        assert!(!guarded.contains("msg"));
        guarded.set_location_hash("#/login");

        assert_eq!(doc.text("msg").as_deref(), Some("first"));
        assert!(rx.try_recv().is_err());
    }
}
