//! # Placement targets
//!
//! An [`Element`] is the handle a component places into (and removes from)
//! the visible tree. It is a small retained node: identity, a parent link,
//! ordered children, box metrics and a bubbling listener registry. Platform
//! runners mirror it onto whatever they actually draw; the core only relies on
//! the structure and the metrics.
//!
//! ```rust
//! use veneer_core::*;
//!
//! let doc = Document::new();
//! let panel = doc.create_element("div");
//! doc.body().append_child(&panel);
//! assert_eq!(panel.parent().as_ref(), Some(doc.body()));
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::events::{ListenerId, Registry};
use crate::input::{EventKind, InputEvent};
use crate::{Rect, Size, Vec2};

pub type EventListener = Rc<dyn Fn(&InputEvent)>;

/// Box metrics of an element, in the same terms a browser reports them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Metrics {
    /// Bounding rect in viewport coordinates.
    pub rect: Rect,
    /// Current scroll position (`scrollLeft`/`scrollTop`).
    pub scroll: Vec2,
    /// Full scrollable content size (`scrollWidth`/`scrollHeight`).
    pub scroll_size: Size,
    /// Visible content size (`clientWidth`/`clientHeight`).
    pub client_size: Size,
    /// Left/top margin.
    pub margin: Vec2,
}

impl Metrics {
    /// How far the content can scroll on each axis. Changes when a scrollbar
    /// appears or disappears even if nobody scrolled.
    pub fn scroll_extent(&self) -> Size {
        Size {
            width: self.scroll_size.width - self.client_size.width,
            height: self.scroll_size.height - self.client_size.height,
        }
    }
}

#[derive(Clone)]
pub struct Element(Rc<Node>);

struct Node {
    tag: String,
    id: RefCell<Option<String>>,
    classes: RefCell<Vec<String>>,
    parent: RefCell<Weak<Node>>,
    children: RefCell<Vec<Element>>,
    metrics: Cell<Metrics>,
    listeners: RefCell<Registry<EventKind, EventListener>>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(Rc::new(Node {
            tag: tag.into(),
            id: RefCell::new(None),
            classes: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            metrics: Cell::new(Metrics::default()),
            listeners: RefCell::new(Registry::new()),
        }))
    }

    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn id(&self) -> Option<String> {
        self.0.id.borrow().clone()
    }

    pub fn set_id(&self, id: impl Into<String>) {
        *self.0.id.borrow_mut() = Some(id.into());
    }

    pub fn add_class(&self, class: impl Into<String>) {
        let class = class.into();
        let mut classes = self.0.classes.borrow_mut();
        if !classes.contains(&class) {
            classes.push(class);
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.0.classes.borrow().iter().any(|c| c == class)
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // --- tree ---

    pub fn parent(&self) -> Option<Element> {
        self.0.parent.borrow().upgrade().map(Element)
    }

    pub fn children(&self) -> Vec<Element> {
        self.0.children.borrow().clone()
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Element> {
        std::iter::successors(self.parent(), |e| e.parent())
    }

    /// Whether `other` is this element or one of its descendants.
    pub fn contains(&self, other: &Element) -> bool {
        other.ptr_eq(self) || other.ancestors().any(|a| a.ptr_eq(self))
    }

    /// Moves `child` to the end of this element's children, detaching it from
    /// its previous parent first. Appending an ancestor of `self` is refused.
    pub fn append_child(&self, child: &Element) {
        if child.contains(self) {
            log::warn!(
                "append_child: refusing to append <{}> into its own subtree",
                child.tag()
            );
            return;
        }
        child.remove();
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child.clone());
    }

    /// Detaches this element from its parent, if any.
    pub fn remove(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        parent.0.children.borrow_mut().retain(|c| !c.ptr_eq(self));
        *self.0.parent.borrow_mut() = Weak::new();
    }

    /// First descendant (pre-order) matching a single simple selector:
    /// `tag`, `#id` or `.class`.
    pub fn query(&self, selector: &str) -> Option<Element> {
        let selector = selector.trim();
        if selector.is_empty() {
            return None;
        }
        for child in self.0.children.borrow().iter() {
            if child.matches(selector) {
                return Some(child.clone());
            }
            if let Some(found) = child.query(selector) {
                return Some(found);
            }
        }
        None
    }

    fn matches(&self, selector: &str) -> bool {
        if let Some(id) = selector.strip_prefix('#') {
            self.0.id.borrow().as_deref() == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            self.has_class(class)
        } else {
            self.0.tag.eq_ignore_ascii_case(selector)
        }
    }

    // --- metrics ---

    pub fn metrics(&self) -> Metrics {
        self.0.metrics.get()
    }

    pub fn set_metrics(&self, metrics: Metrics) {
        self.0.metrics.set(metrics);
    }

    pub fn update_metrics(&self, f: impl FnOnce(&mut Metrics)) {
        let mut m = self.0.metrics.get();
        f(&mut m);
        self.0.metrics.set(m);
    }

    /// Sets the scroll position and dispatches a scroll event from here.
    pub fn scroll_to(&self, scroll: Vec2) {
        self.update_metrics(|m| m.scroll = scroll);
        self.dispatch_event(&InputEvent::scroll());
    }

    // --- events ---

    pub fn add_event_listener(
        &self,
        kind: EventKind,
        listener: impl Fn(&InputEvent) + 'static,
    ) -> ListenerId {
        self.0
            .listeners
            .borrow_mut()
            .add(kind, Rc::new(listener) as EventListener)
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.0.listeners.borrow_mut().remove(id).is_some()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.0.listeners.borrow().count(&kind)
    }

    /// Delivers `event` to this element's listeners, then bubbles it through
    /// every ancestor. Each element's listeners are snapshotted before any of
    /// them runs, so listeners added or removed during delivery take effect
    /// from the next element or event on.
    pub fn dispatch_event(&self, event: &InputEvent) {
        let path = std::iter::once(self.clone()).chain(self.ancestors());
        for el in path {
            let listeners = el.0.listeners.borrow().snapshot(&event.kind);
            for listener in listeners {
                listener(event);
            }
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.0.tag)
            .field("id", &*self.0.id.borrow())
            .field("children", &self.0.children.borrow().len())
            .finish()
    }
}

/// The root of a visible tree: a root element with a `body` child. Gesture
/// trackers listen for move/end/scroll events on the root.
#[derive(Clone, Debug)]
pub struct Document {
    root: Element,
    body: Element,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let root = Element::new("html");
        let body = Element::new("body");
        root.append_child(&body);
        Self { root, body }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn body(&self) -> &Element {
        &self.body
    }

    pub fn create_element(&self, tag: impl Into<String>) -> Element {
        Element::new(tag)
    }

    pub fn query(&self, selector: &str) -> Option<Element> {
        self.root.query(selector)
    }
}
