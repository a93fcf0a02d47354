//! In-process document.
//!
//! # Responsibilities
//! - Track every element carrying an `id` in mounted markup
//! - Drop a subtree (and its listeners) when an ancestor is rewritten
//! - Emit fragment change events, like the browser's `hashchange`
//! - Dispatch events to bound listeners
//!
//! # Design Decisions
//! - Elements without an id are not addressable and not tracked
//! - An element's parent is its nearest id'd ancestor

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::dom::{Document, DomEvent, EventKind, Listener};
use crate::util::html;

/// A fragment change observed on the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashChange {
    pub old: String,
    pub new: String,
}

#[derive(Default)]
struct Element {
    tag: String,
    parent: Option<String>,
    attrs: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    inner_html: String,
    text: String,
    value: String,
    hidden: bool,
    disabled: bool,
    listeners: Vec<(EventKind, Listener)>,
}

struct DocState {
    hash: String,
    title: String,
    elements: HashMap<String, Element>,
}

/// Document held entirely in memory.
pub struct MemoryDocument {
    state: Mutex<DocState>,
    changes: mpsc::UnboundedSender<HashChange>,
}

impl MemoryDocument {
    /// Create a document whose body holds one empty mount element.
    ///
    /// Returns the document and a receiver for fragment changes.
    pub fn new(mount_id: &str) -> (Self, mpsc::UnboundedReceiver<HashChange>) {
        Self::at(mount_id, "")
    }

    /// Like [`MemoryDocument::new`], starting at the given fragment.
    pub fn at(mount_id: &str, hash: &str) -> (Self, mpsc::UnboundedReceiver<HashChange>) {
        let (doc, rx) = Self::detached(hash);
        doc.lock().elements.insert(
            mount_id.to_string(),
            Element {
                tag: "div".to_string(),
                ..Element::default()
            },
        );
        (doc, rx)
    }

    /// A document with no mount element at all.
    pub fn detached(hash: &str) -> (Self, mpsc::UnboundedReceiver<HashChange>) {
        let (changes, rx) = mpsc::unbounded_channel();
        let doc = Self {
            state: Mutex::new(DocState {
                hash: hash.to_string(),
                title: String::new(),
                elements: HashMap::new(),
            }),
            changes,
        };
        (doc, rx)
    }

    /// Run every listener bound to `id` for `kind`, in binding order.
    ///
    /// Returns the number of listeners run.
    pub async fn dispatch(&self, id: &str, kind: EventKind) -> usize {
        self.dispatch_event(DomEvent::new(kind, id)).await
    }

    /// Like [`MemoryDocument::dispatch`] with a prepared event.
    pub async fn dispatch_event(&self, event: DomEvent) -> usize {
        let listeners: Vec<Listener> = {
            let state = self.lock();
            match state.elements.get(&event.target) {
                Some(element) => element
                    .listeners
                    .iter()
                    .filter(|(k, _)| *k == event.kind)
                    .map(|(_, l)| l.clone())
                    .collect(),
                None => Vec::new(),
            }
        };

        for listener in &listeners {
            listener(event.clone()).await;
        }
        listeners.len()
    }

    /// Number of tracked elements, mount included.
    pub fn element_count(&self) -> usize {
        self.lock().elements.len()
    }

    /// Tag name of a tracked element.
    pub fn tag(&self, id: &str) -> Option<String> {
        self.lock().elements.get(id).map(|e| e.tag.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DocState> {
        self.state.lock().expect("document mutex poisoned")
    }

    fn with_element<R>(&self, id: &str, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        let mut state = self.lock();
        state.elements.get_mut(id).map(f)
    }
}

impl DocState {
    fn remove_descendants(&mut self, id: &str) {
        let mut pending = vec![id.to_string()];
        while let Some(parent) = pending.pop() {
            let children: Vec<String> = self
                .elements
                .iter()
                .filter(|(_, e)| e.parent.as_deref() == Some(parent.as_str()))
                .map(|(child, _)| child.clone())
                .collect();
            for child in children {
                self.elements.remove(&child);
                pending.push(child);
            }
        }
    }
}

struct ParsedElement {
    id: String,
    element: Element,
}

fn parse_elements(markup: &str, container: &str) -> Vec<ParsedElement> {
    let Ok(dom) = tl::parse(markup, tl::ParserOptions::default()) else {
        tracing::warn!(container, "Markup could not be parsed; no elements registered");
        return Vec::new();
    };

    let parser = dom.parser();
    let mut out = Vec::new();
    for handle in dom.children() {
        collect(*handle, parser, container, &mut out);
    }
    out
}

fn collect(handle: tl::NodeHandle, parser: &tl::Parser, parent: &str, out: &mut Vec<ParsedElement>) {
    let Some(tl::Node::Tag(tag)) = handle.get(parser) else {
        return;
    };

    let mut attrs = BTreeMap::new();
    for (key, value) in tag.attributes().iter() {
        let key: &str = key.as_ref();
        attrs.insert(
            key.to_ascii_lowercase(),
            value
                .map(|v| html::unescape(&v).into_owned())
                .unwrap_or_default(),
        );
    }

    let id = attrs.get("id").filter(|id| !id.is_empty()).cloned();
    let next_parent = match id {
        Some(id) => {
            let classes: BTreeSet<String> = attrs
                .get("class")
                .map(|c| c.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();
            let element = Element {
                tag: tag.name().as_utf8_str().to_lowercase(),
                parent: Some(parent.to_string()),
                hidden: attrs.contains_key("hidden") || classes.contains("d-none"),
                disabled: attrs.contains_key("disabled"),
                value: attrs.get("value").cloned().unwrap_or_default(),
                inner_html: tag.inner_html(parser).to_string(),
                text: html::unescape(&tag.inner_text(parser)).into_owned(),
                classes,
                attrs,
                listeners: Vec::new(),
            };
            out.push(ParsedElement {
                id: id.clone(),
                element,
            });
            id
        }
        None => parent.to_string(),
    };

    for child in tag.children().top().iter() {
        collect(*child, parser, &next_parent, out);
    }
}

impl Document for MemoryDocument {
    fn location_hash(&self) -> String {
        self.lock().hash.clone()
    }

    fn set_location_hash(&self, hash: &str) {
        let new = if hash.is_empty() || hash.starts_with('#') {
            hash.to_string()
        } else {
            format!("#{}", hash)
        };

        let old = {
            let mut state = self.lock();
            if state.hash == new {
                return;
            }
            std::mem::replace(&mut state.hash, new.clone())
        };

        tracing::debug!(old = %old, new = %new, "Location fragment changed");
        // The receiver may be gone when nothing is routing; that is fine.
        let _ = self.changes.send(HashChange { old, new });
    }

    fn title(&self) -> String {
        self.lock().title.clone()
    }

    fn set_title(&self, title: &str) {
        self.lock().title = title.to_string();
    }

    fn contains(&self, id: &str) -> bool {
        self.lock().elements.contains_key(id)
    }

    fn set_inner_html(&self, id: &str, markup: &str) -> bool {
        let mut state = self.lock();
        if !state.elements.contains_key(id) {
            return false;
        }

        state.remove_descendants(id);
        let parsed = parse_elements(markup, id);

        if let Some(element) = state.elements.get_mut(id) {
            element.inner_html = markup.to_string();
            element.text = parsed_text(markup);
        }
        for ParsedElement { id, element } in parsed {
            state.elements.insert(id, element);
        }
        true
    }

    fn inner_html(&self, id: &str) -> Option<String> {
        self.lock().elements.get(id).map(|e| e.inner_html.clone())
    }

    fn set_text(&self, id: &str, text: &str) -> bool {
        let mut state = self.lock();
        if !state.elements.contains_key(id) {
            return false;
        }
        state.remove_descendants(id);
        if let Some(element) = state.elements.get_mut(id) {
            element.text = text.to_string();
            element.inner_html = html::escape(text).into_owned();
        }
        true
    }

    fn text(&self, id: &str) -> Option<String> {
        self.lock().elements.get(id).map(|e| e.text.clone())
    }

    fn value(&self, id: &str) -> Option<String> {
        self.lock().elements.get(id).map(|e| e.value.clone())
    }

    fn set_value(&self, id: &str, value: &str) -> bool {
        self.with_element(id, |e| e.value = value.to_string()).is_some()
    }

    fn attribute(&self, id: &str, name: &str) -> Option<String> {
        self.lock()
            .elements
            .get(id)
            .and_then(|e| e.attrs.get(&name.to_ascii_lowercase()).cloned())
    }

    fn set_attribute(&self, id: &str, name: &str, value: &str) -> bool {
        self.with_element(id, |e| {
            e.attrs.insert(name.to_ascii_lowercase(), value.to_string());
        })
        .is_some()
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.lock()
            .elements
            .get(id)
            .is_some_and(|e| e.classes.contains(class))
    }

    fn toggle_class(&self, id: &str, class: &str, on: bool) -> bool {
        self.with_element(id, |e| {
            if on {
                e.classes.insert(class.to_string());
            } else {
                e.classes.remove(class);
            }
        })
        .is_some()
    }

    fn is_visible(&self, id: &str) -> Option<bool> {
        self.lock().elements.get(id).map(|e| !e.hidden)
    }

    fn set_visible(&self, id: &str, visible: bool) -> bool {
        self.with_element(id, |e| e.hidden = !visible).is_some()
    }

    fn is_disabled(&self, id: &str) -> Option<bool> {
        self.lock().elements.get(id).map(|e| e.disabled)
    }

    fn set_disabled(&self, id: &str, disabled: bool) -> bool {
        self.with_element(id, |e| e.disabled = disabled).is_some()
    }

    fn ids_with_attribute(&self, name: &str) -> Vec<(String, String)> {
        let name = name.to_ascii_lowercase();
        let state = self.lock();
        let mut found: Vec<(String, String)> = state
            .elements
            .iter()
            .filter_map(|(id, e)| e.attrs.get(&name).map(|v| (id.clone(), v.clone())))
            .collect();
        found.sort();
        found
    }

    fn add_listener(&self, id: &str, kind: EventKind, listener: Listener) -> bool {
        self.with_element(id, |e| e.listeners.push((kind, listener)))
            .is_some()
    }
}

fn parsed_text(markup: &str) -> String {
    match tl::parse(markup, tl::ParserOptions::default()) {
        Ok(dom) => {
            let parser = dom.parser();
            dom.children()
                .iter()
                .filter_map(|h| h.get(parser))
                .map(|node| html::unescape(&node.inner_text(parser)).into_owned())
                .collect()
        }
        Err(_) => markup.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::listener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_markup_registers_nested_ids() {
        let (doc, _rx) = MemoryDocument::new("app");
        assert!(doc.set_inner_html(
            "app",
            r#"<main><div id="outer" class="a b"><span id="inner">hi</span></div></main>"#
        ));
        assert!(doc.contains("outer"));
        assert!(doc.contains("inner"));
        assert!(doc.has_class("outer", "b"));
        assert_eq!(doc.text("inner").as_deref(), Some("hi"));
        assert_eq!(doc.tag("inner").as_deref(), Some("span"));
    }

    #[test]
    fn test_rewrite_drops_subtree() {
        let (doc, _rx) = MemoryDocument::new("app");
        doc.set_inner_html("app", r#"<div id="outer"><p id="inner"></p></div>"#);
        doc.set_inner_html("outer", "<em>replaced</em>");
        assert!(doc.contains("outer"));
        assert!(!doc.contains("inner"));

        doc.set_inner_html("app", r#"<p id="other"></p>"#);
        assert!(!doc.contains("outer"));
        assert!(doc.contains("other"));
        assert_eq!(doc.element_count(), 2);
    }

    #[test]
    fn test_missing_ids_are_no_ops() {
        let (doc, _rx) = MemoryDocument::new("app");
        assert!(!doc.set_text("ghost", "x"));
        assert!(!doc.set_inner_html("ghost", "<p></p>"));
        assert!(doc.text("ghost").is_none());
        assert!(!doc.toggle_class("ghost", "active", true));
    }

    #[test]
    fn test_detached_has_no_mount() {
        let (doc, _rx) = MemoryDocument::detached("#/");
        assert!(!doc.contains("app"));
        assert_eq!(doc.location_hash(), "#/");
    }

    #[test]
    fn test_form_state_from_markup() {
        let (doc, _rx) = MemoryDocument::new("app");
        doc.set_inner_html(
            "app",
            r#"<input id="email" value="a@b.c"><button id="go" disabled>Go</button><div id="alert" class="d-none"></div>"#,
        );
        assert_eq!(doc.value("email").as_deref(), Some("a@b.c"));
        assert_eq!(doc.is_disabled("go"), Some(true));
        assert_eq!(doc.is_visible("alert"), Some(false));
    }

    #[test]
    fn test_hash_change_emits_only_on_difference() {
        let (doc, mut rx) = MemoryDocument::at("app", "#/");
        doc.set_location_hash("#/");
        assert!(rx.try_recv().is_err());

        doc.set_location_hash("/dashboard");
        let change = rx.try_recv().unwrap();
        assert_eq!(change.old, "#/");
        assert_eq!(change.new, "#/dashboard");
    }

    #[tokio::test]
    async fn test_dispatch_runs_listeners_and_rewrite_drops_them() {
        let (doc, _rx) = MemoryDocument::new("app");
        doc.set_inner_html("app", r#"<button id="btn"></button>"#);

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        doc.add_listener(
            "btn",
            EventKind::Click,
            listener(move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }),
        );

        assert_eq!(doc.dispatch("btn", EventKind::Click).await, 1);
        assert_eq!(doc.dispatch("btn", EventKind::Submit).await, 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        doc.set_inner_html("app", r#"<button id="btn"></button>"#);
        assert_eq!(doc.dispatch("btn", EventKind::Click).await, 0);
    }

    #[test]
    fn test_ids_with_attribute() {
        let (doc, _rx) = MemoryDocument::new("app");
        doc.set_inner_html(
            "app",
            r#"<a id="nav-b" data-route="/b"></a><a id="nav-a" data-route="/a"></a><a id="plain"></a>"#,
        );
        assert_eq!(
            doc.ids_with_attribute("data-route"),
            vec![
                ("nav-a".to_string(), "/a".to_string()),
                ("nav-b".to_string(), "/b".to_string()),
            ]
        );
    }
}
