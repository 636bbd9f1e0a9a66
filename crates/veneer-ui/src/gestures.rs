//! # Pointer drag tracking
//!
//! [`PointerTracker`] turns raw mouse or touch events on one element into
//! per-contact drag callbacks. Every contact (each finger, or the single mouse
//! button) gets its own state from start to end, so two fingers dragging two
//! things never see each other's deltas.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use veneer_core::*;
//! use veneer_ui::gestures::*;
//!
//! let host = Rc::new(HeadlessHost::new());
//! let doc = Document::new();
//! let knob = doc.create_element("div");
//! doc.body().append_child(&knob);
//!
//! let tracker = PointerTracker::new(knob.clone(), &doc, host, TrackerOptions::default());
//! let moved = Rc::new(Cell::new(Vec2::ZERO));
//! let m = moved.clone();
//! tracker.enable(DragHandlers::new().on_move(move |dx, dy, _, _| m.set(Vec2::new(dx, dy))));
//!
//! knob.dispatch_event(&InputEvent::mouse(EventKind::MouseDown, Vec2::new(10.0, 10.0)));
//! doc.root().dispatch_event(&InputEvent::mouse(EventKind::MouseMove, Vec2::new(15.0, 18.0)));
//! assert_eq!(moved.get(), Vec2::new(5.0, 8.0));
//! ```
//!
//! Start events are taken from the element; move, end and scroll events are
//! taken from the document root, and only while at least one contact is
//! active. The shared listeners are armed by the first contact and removed by
//! the last.
//!
//! Move and end deltas are page-coordinate deltas plus a scroll correction.
//! Scroll events restart a debounce timer; when it fires, every active contact
//! gets `scroll_delta = (pos - start.pos) - (extent - start.extent)` over the
//! element's ancestors (see [`ScrollOffset`]).

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use smallvec::SmallVec;
use veneer_core::{Document, Element, EventKind, Host, InputEvent, ListenerId, PointerId, Vec2};

use crate::debounce::Debounce;
use crate::scroll::{ScrollOffset, element_offset};

pub type DragCallback = Rc<dyn Fn(f32, f32, &InputEvent, &mut GestureContext)>;

/// Which native event family a tracker listens to. Mouse and touch are
/// mutually exclusive per tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Mouse,
    Touch,
}

impl InputMode {
    fn start(self) -> EventKind {
        match self {
            InputMode::Mouse => EventKind::MouseDown,
            InputMode::Touch => EventKind::TouchStart,
        }
    }

    fn moves(self) -> EventKind {
        match self {
            InputMode::Mouse => EventKind::MouseMove,
            InputMode::Touch => EventKind::TouchMove,
        }
    }

    // touchcancel ends a contact like touchend
    fn ends(self) -> &'static [EventKind] {
        match self {
            InputMode::Mouse => &[EventKind::MouseUp],
            InputMode::Touch => &[EventKind::TouchEnd, EventKind::TouchCancel],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerOptions {
    /// Input family; `None` asks the host whether touch is available.
    pub input: Option<InputMode>,
    /// Delay before scroll correction is recomputed after the last scroll
    /// event. Zero means the next timer tick.
    pub scroll_debounce: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            input: None,
            scroll_debounce: Duration::ZERO,
        }
    }
}

/// Start, move and end callbacks. Each receives the drag position (relative
/// to the element on start, a delta since start otherwise), the raw event and
/// the contact's private context.
#[derive(Clone, Default)]
pub struct DragHandlers {
    pub onstart: Option<DragCallback>,
    pub onmove: Option<DragCallback>,
    pub onend: Option<DragCallback>,
}

impl DragHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(
        mut self,
        f: impl Fn(f32, f32, &InputEvent, &mut GestureContext) + 'static,
    ) -> Self {
        self.onstart = Some(Rc::new(f));
        self
    }

    pub fn on_move(
        mut self,
        f: impl Fn(f32, f32, &InputEvent, &mut GestureContext) + 'static,
    ) -> Self {
        self.onmove = Some(Rc::new(f));
        self
    }

    pub fn on_end(
        mut self,
        f: impl Fn(f32, f32, &InputEvent, &mut GestureContext) + 'static,
    ) -> Self {
        self.onend = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for DragHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragHandlers")
            .field("onstart", &self.onstart.is_some())
            .field("onmove", &self.onmove.is_some())
            .field("onend", &self.onend.is_some())
            .finish()
    }
}

/// Per-contact scratch space handed to every callback of that contact. It is
/// created empty on start and dropped when the contact ends or the tracker is
/// disabled.
#[derive(Default)]
pub struct GestureContext {
    values: HashMap<String, Box<dyn Any>>,
}

impl GestureContext {
    pub fn insert<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)?.downcast_mut()
    }

    /// Removes `key` and returns its value if it holds a `T`. A value of
    /// another type stays in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.values.get(key)?.is::<T>() {
            return None;
        }
        let value = self.values.remove(key)?;
        value.downcast().ok().map(|b| *b)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for GestureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// Tracking record of one active contact.
#[derive(Debug)]
struct PointerState {
    id: PointerId,
    start_page: Vec2,
    start_scroll: ScrollOffset,
    scroll_delta: Vec2,
    // `None` while a callback holds it
    context: Option<GestureContext>,
}

impl PointerState {
    fn delta(&self, page: Vec2) -> Vec2 {
        page - self.start_page + self.scroll_delta
    }
}

#[derive(Default)]
struct TrackerState {
    handlers: Option<DragHandlers>,
    start_listener: Option<ListenerId>,
    // on the document root; non-empty iff armed
    active_listeners: SmallVec<[ListenerId; 4]>,
    pointers: Vec<PointerState>,
}

/// Multi-contact drag recognizer bound to one element.
///
/// Cloning gives another handle to the same tracker. Listeners installed on
/// elements hold it weakly, so dropping every handle disables it.
#[derive(Clone)]
pub struct PointerTracker(Rc<TrackerInner>);

struct TrackerInner {
    element: Element,
    root: Element,
    body: Element,
    mode: InputMode,
    debounce: Debounce,
    state: RefCell<TrackerState>,
}

impl PointerTracker {
    pub fn new(
        element: Element,
        document: &Document,
        host: Rc<dyn Host>,
        options: TrackerOptions,
    ) -> Self {
        let mode = options.input.unwrap_or(if host.supports_touch() {
            InputMode::Touch
        } else {
            InputMode::Mouse
        });
        Self(Rc::new(TrackerInner {
            element,
            root: document.root().clone(),
            body: document.body().clone(),
            mode,
            debounce: Debounce::new(host, options.scroll_debounce),
            state: RefCell::new(TrackerState::default()),
        }))
    }

    pub fn element(&self) -> &Element {
        &self.0.element
    }

    pub fn mode(&self) -> InputMode {
        self.0.mode
    }

    pub fn is_enabled(&self) -> bool {
        self.0.state.borrow().handlers.is_some()
    }

    /// Identifiers of the active contacts, in start order.
    pub fn active_pointers(&self) -> Vec<PointerId> {
        self.0.state.borrow().pointers.iter().map(|p| p.id).collect()
    }

    /// Whether the move/end/scroll listeners are installed on the document.
    pub fn is_tracking(&self) -> bool {
        !self.0.state.borrow().active_listeners.is_empty()
    }

    /// Starts listening for drags on the element. Enabling an enabled tracker
    /// only swaps the handlers.
    pub fn enable(&self, handlers: DragHandlers) {
        let register = {
            let mut st = self.0.state.borrow_mut();
            st.handlers = Some(handlers);
            st.start_listener.is_none()
        };
        if !register {
            return;
        }
        let weak = self.downgrade();
        let id = self
            .0
            .element
            .add_event_listener(self.0.mode.start(), move |ev| {
                if let Some(tracker) = upgrade(&weak) {
                    tracker.on_start(ev);
                }
            });
        self.0.state.borrow_mut().start_listener = Some(id);
    }

    /// Removes every listener this tracker installed and drops all contact
    /// states, contexts included.
    pub fn disable(&self) {
        let (start, active, pointers) = {
            let mut st = self.0.state.borrow_mut();
            st.handlers = None;
            (
                st.start_listener.take(),
                std::mem::take(&mut st.active_listeners),
                std::mem::take(&mut st.pointers),
            )
        };
        if let Some(id) = start {
            self.0.element.remove_event_listener(id);
        }
        for id in active {
            self.0.root.remove_event_listener(id);
        }
        self.0.debounce.cancel();
        if !pointers.is_empty() {
            log::debug!("tracker: disabled with {} active contact(s)", pointers.len());
        }
        drop(pointers);
    }

    fn downgrade(&self) -> Weak<TrackerInner> {
        Rc::downgrade(&self.0)
    }

    fn handlers(&self) -> Option<DragHandlers> {
        self.0.state.borrow().handlers.clone()
    }

    fn on_start(&self, event: &InputEvent) {
        let offset = element_offset(&self.0.element, &self.0.body);
        let scroll = ScrollOffset::of_ancestors(&self.0.element);

        for contact in event.contacts() {
            let Some(handlers) = self.handlers() else {
                return;
            };
            let arm = {
                let mut st = self.0.state.borrow_mut();
                if st.pointers.iter().any(|p| p.id == contact.id) {
                    log::trace!("tracker: ignoring duplicate start for {:?}", contact.id);
                    continue;
                }
                st.pointers.push(PointerState {
                    id: contact.id,
                    start_page: contact.page,
                    start_scroll: scroll,
                    scroll_delta: Vec2::ZERO,
                    context: Some(GestureContext::default()),
                });
                st.active_listeners.is_empty()
            };
            if arm {
                self.arm();
            }
            let pos = contact.page - offset;
            self.invoke(contact.id, handlers.onstart.as_ref(), pos, event);
        }
    }

    fn on_move(&self, event: &InputEvent) {
        for contact in event.contacts() {
            let Some(handlers) = self.handlers() else {
                return;
            };
            let delta = {
                let st = self.0.state.borrow();
                st.pointers
                    .iter()
                    .find(|p| p.id == contact.id)
                    .map(|p| p.delta(contact.page))
            };
            match delta {
                Some(d) => self.invoke(contact.id, handlers.onmove.as_ref(), d, event),
                None => log::trace!("tracker: move for unknown contact {:?}", contact.id),
            }
        }
    }

    fn on_end(&self, event: &InputEvent) {
        for contact in event.contacts() {
            let Some(handlers) = self.handlers() else {
                return;
            };
            let ended = {
                let mut st = self.0.state.borrow_mut();
                st.pointers
                    .iter()
                    .position(|p| p.id == contact.id)
                    .map(|i| st.pointers.remove(i))
            };
            let Some(mut state) = ended else {
                log::trace!("tracker: end for unknown contact {:?}", contact.id);
                continue;
            };
            let delta = state.delta(contact.page);
            let mut context = state.context.take().unwrap_or_default();
            if let Some(onend) = &handlers.onend {
                onend(delta.x, delta.y, event, &mut context);
            }
        }
        if self.0.state.borrow().pointers.is_empty() {
            self.disarm();
        }
    }

    fn on_scroll(&self) {
        let weak = self.downgrade();
        self.0.debounce.call(move || {
            if let Some(tracker) = upgrade(&weak) {
                tracker.correct_scroll();
            }
        });
    }

    fn correct_scroll(&self) {
        let now = ScrollOffset::of_ancestors(&self.0.element);
        let mut st = self.0.state.borrow_mut();
        for p in &mut st.pointers {
            p.scroll_delta = now.correction_since(&p.start_scroll);
        }
    }

    /// Runs `callback` for contact `id` with the contact's context lent out.
    /// The context goes back only if the contact is still tracked afterwards.
    fn invoke(
        &self,
        id: PointerId,
        callback: Option<&DragCallback>,
        at: Vec2,
        event: &InputEvent,
    ) {
        let Some(callback) = callback else {
            return;
        };
        let mut context = {
            let mut st = self.0.state.borrow_mut();
            st.pointers
                .iter_mut()
                .find(|p| p.id == id)
                .and_then(|p| p.context.take())
                .unwrap_or_default()
        };
        callback(at.x, at.y, event, &mut context);
        let mut st = self.0.state.borrow_mut();
        if let Some(p) = st.pointers.iter_mut().find(|p| p.id == id) {
            p.context = Some(context);
        }
    }

    fn arm(&self) {
        let mode = self.0.mode;
        let root = &self.0.root;
        let mut ids: SmallVec<[ListenerId; 4]> = SmallVec::new();

        let weak = self.downgrade();
        ids.push(root.add_event_listener(mode.moves(), move |ev| {
            if let Some(tracker) = upgrade(&weak) {
                tracker.on_move(ev);
            }
        }));
        for &kind in mode.ends() {
            let weak = self.downgrade();
            ids.push(root.add_event_listener(kind, move |ev| {
                if let Some(tracker) = upgrade(&weak) {
                    tracker.on_end(ev);
                }
            }));
        }
        let weak = self.downgrade();
        ids.push(root.add_event_listener(EventKind::Scroll, move |_| {
            if let Some(tracker) = upgrade(&weak) {
                tracker.on_scroll();
            }
        }));

        log::debug!("tracker: armed {} document listener(s)", ids.len());
        self.0.state.borrow_mut().active_listeners = ids;
    }

    fn disarm(&self) {
        let ids = std::mem::take(&mut self.0.state.borrow_mut().active_listeners);
        if ids.is_empty() {
            return;
        }
        for id in ids {
            self.0.root.remove_event_listener(id);
        }
        self.0.debounce.cancel();
        log::debug!("tracker: last contact ended; document listeners removed");
    }
}

fn upgrade(weak: &Weak<TrackerInner>) -> Option<PointerTracker> {
    weak.upgrade().map(PointerTracker)
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        let st = self.state.get_mut();
        if let Some(id) = st.start_listener.take() {
            self.element.remove_event_listener(id);
        }
        for id in st.active_listeners.drain(..) {
            self.root.remove_event_listener(id);
        }
    }
}

impl fmt::Debug for PointerTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.0.state.borrow();
        f.debug_struct("PointerTracker")
            .field("element", &self.0.element)
            .field("mode", &self.0.mode)
            .field("enabled", &st.handlers.is_some())
            .field("pointers", &st.pointers)
            .finish()
    }
}
