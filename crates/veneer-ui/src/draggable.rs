use std::rc::Rc;

use veneer_core::{Component, Document};

use crate::gestures::{DragHandlers, PointerTracker, TrackerOptions};

/// Binds a [`PointerTracker`] to a component's element, using the host of the
/// component's scheduler.
///
/// ```rust
/// use veneer_core::*;
/// use veneer_ui::*;
///
/// let doc = Document::new();
/// let c = Component::new(ComponentOptions::default()).unwrap();
/// let d = Draggable::new(c.clone(), &doc);
///
/// let pos = c.prop("x", 0.0f32);
/// d.enable(DragHandlers::new().on_move(move |dx, _, _, _| {
///     pos.set(dx);
/// }));
/// assert!(d.is_enabled());
/// d.disable();
/// # Scheduler::reset_main();
/// ```
#[derive(Clone, Debug)]
pub struct Draggable {
    component: Component,
    tracker: PointerTracker,
}

impl Draggable {
    pub fn new(component: Component, document: &Document) -> Self {
        Self::with_options(component, document, TrackerOptions::default())
    }

    pub fn with_options(component: Component, document: &Document, options: TrackerOptions) -> Self {
        let host = Rc::clone(component.scheduler().host());
        let tracker = PointerTracker::new(component.element(), document, host, options);
        Self { component, tracker }
    }

    pub fn enable(&self, handlers: DragHandlers) {
        self.tracker.enable(handlers);
    }

    pub fn disable(&self) {
        self.tracker.disable();
    }

    pub fn is_enabled(&self) -> bool {
        self.tracker.is_enabled()
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn tracker(&self) -> &PointerTracker {
        &self.tracker
    }
}
