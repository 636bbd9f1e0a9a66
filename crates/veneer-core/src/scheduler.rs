//! # Batched redraw scheduler
//!
//! Components never redraw synchronously. Marking one dirty queues it on its
//! [`Scheduler`] and arms a single frame callback with the host; every further
//! marking before that frame fires just joins the queue.
//!
//! When the frame fires the scheduler runs two phases:
//!
//! 1. **Propagation.** Walk the dirty list from the start, running every
//!    relation attached to each component. Relations may mark more components
//!    dirty; once the current bound is walked, walk the newly appended suffix,
//!    and repeat until a pass appends nothing.
//! 2. **Redraw.** Take the list out of the scheduler, clear the pending frame,
//!    and call [`Component::redraw`] once per component in first-dirtied
//!    order. Anything marked dirty from here on goes into a fresh list and a
//!    fresh frame.
//!
//! Each thread has one default scheduler ([`Scheduler::main`]) on a
//! [`HeadlessHost`]; components use it unless constructed with another one.
//! Nothing pumps that host on its own: drive it through
//! [`Scheduler::main_host`], call [`Scheduler::flush`], or replace the default
//! with [`Scheduler::install_main`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::host::{Callback, HeadlessHost, Host, HostHandle};
use crate::Component;

/// Conventional display refresh period (60 Hz).
pub const FRAME_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 60);

thread_local! {
    static MAIN: RefCell<Option<Rc<Scheduler>>> = const { RefCell::new(None) };
    // set only while MAIN is the lazily created default
    static MAIN_HOST: RefCell<Option<Rc<HeadlessHost>>> = const { RefCell::new(None) };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerOptions {
    /// Timer period used when the host has no animation-frame primitive.
    pub fallback_interval: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            fallback_interval: FRAME_INTERVAL,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PendingFrame {
    Animation(HostHandle),
    Timer(HostHandle),
}

impl PendingFrame {
    fn handle(self) -> HostHandle {
        match self {
            PendingFrame::Animation(h) | PendingFrame::Timer(h) => h,
        }
    }
}

#[derive(Default)]
struct State {
    dirty: Vec<Component>,
    pending: Option<PendingFrame>,
}

pub struct Scheduler {
    host: Rc<dyn Host>,
    options: SchedulerOptions,
    state: RefCell<State>,
    this: Weak<Scheduler>,
    fallback_logged: Cell<bool>,
}

impl Scheduler {
    pub fn new(host: Rc<dyn Host>) -> Rc<Self> {
        Self::with_options(host, SchedulerOptions::default())
    }

    pub fn with_options(host: Rc<dyn Host>, options: SchedulerOptions) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            host,
            options,
            state: RefCell::new(State::default()),
            this: this.clone(),
            fallback_logged: Cell::new(false),
        })
    }

    /// The thread's default scheduler, created on first use on a
    /// [`HeadlessHost`] (see [`Scheduler::main_host`]).
    pub fn main() -> Rc<Scheduler> {
        MAIN.with(|m| {
            m.borrow_mut()
                .get_or_insert_with(|| {
                    let host = Rc::new(HeadlessHost::new());
                    MAIN_HOST.with(|h| *h.borrow_mut() = Some(host.clone()));
                    Scheduler::new(host)
                })
                .clone()
        })
    }

    /// The headless host behind the default scheduler, for embedders that
    /// pump frames and timers themselves. Creates the default scheduler if
    /// needed; `None` while an installed scheduler is in its place.
    pub fn main_host() -> Option<Rc<HeadlessHost>> {
        let _ = Self::main();
        MAIN_HOST.with(|h| h.borrow().clone())
    }

    /// Replaces the thread's default scheduler, returning the previous one.
    /// Components already constructed keep the scheduler they were built with.
    pub fn install_main(scheduler: Rc<Scheduler>) -> Option<Rc<Scheduler>> {
        MAIN_HOST.with(|h| h.borrow_mut().take());
        MAIN.with(|m| m.borrow_mut().replace(scheduler))
    }

    /// Resets and drops the thread's default scheduler; the next
    /// [`Scheduler::main`] call creates a fresh one.
    pub fn reset_main() {
        MAIN_HOST.with(|h| h.borrow_mut().take());
        let prev = MAIN.with(|m| m.borrow_mut().take());
        if let Some(prev) = prev {
            prev.reset();
        }
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// Queues `component` for the next frame (once per frame, however often it
    /// is called) and arms the frame callback if none is pending.
    pub fn mark_dirty(&self, component: &Component) {
        let arm = {
            let mut st = self.state.borrow_mut();
            if !st.dirty.iter().any(|c| c.ptr_eq(component)) {
                st.dirty.push(component.clone());
            }
            st.pending.is_none()
        };
        if arm {
            let pending = self.request_frame();
            self.state.borrow_mut().pending = Some(pending);
        }
    }

    pub fn is_dirty(&self, component: &Component) -> bool {
        self.state
            .borrow()
            .dirty
            .iter()
            .any(|c| c.ptr_eq(component))
    }

    /// Components queued for the next frame, in first-dirtied order.
    pub fn dirty_components(&self) -> Vec<Component> {
        self.state.borrow().dirty.clone()
    }

    pub fn dirty_len(&self) -> usize {
        self.state.borrow().dirty.len()
    }

    /// Host handle of the armed frame callback, if any.
    pub fn pending_frame(&self) -> Option<HostHandle> {
        self.state.borrow().pending.map(PendingFrame::handle)
    }

    /// Runs the pending frame now instead of waiting for the host. Returns
    /// `false` if nothing was pending.
    pub fn flush(&self) -> bool {
        let Some(pending) = self.state.borrow().pending else {
            return false;
        };
        self.cancel(pending);
        self.on_animate();
        true
    }

    /// Drops every queued component and cancels the pending frame.
    pub fn reset(&self) {
        let pending = {
            let mut st = self.state.borrow_mut();
            st.dirty.clear();
            st.pending.take()
        };
        if let Some(pending) = pending {
            self.cancel(pending);
        }
    }

    fn request_frame(&self) -> PendingFrame {
        let this = self.this.clone();
        let callback: Callback = Box::new(move || {
            if let Some(scheduler) = this.upgrade() {
                scheduler.on_animate();
            }
        });
        if self.host.supports_animation_frame() {
            log::trace!("scheduler: requesting animation frame");
            PendingFrame::Animation(self.host.request_animation_frame(callback))
        } else {
            if !self.fallback_logged.replace(true) {
                log::debug!(
                    "scheduler: host has no animation frames; using a {:?} timer",
                    self.options.fallback_interval
                );
            }
            PendingFrame::Timer(
                self.host
                    .set_timeout(callback, self.options.fallback_interval),
            )
        }
    }

    fn cancel(&self, pending: PendingFrame) {
        match pending {
            PendingFrame::Animation(h) => self.host.cancel_animation_frame(h),
            PendingFrame::Timer(h) => self.host.clear_timeout(h),
        }
    }

    fn on_animate(&self) {
        self.propagate();

        let dirty = {
            let mut st = self.state.borrow_mut();
            st.pending = None;
            std::mem::take(&mut st.dirty)
        };
        log::trace!("scheduler: redrawing {} component(s)", dirty.len());
        for component in &dirty {
            component.redraw();
        }
    }

    fn propagate(&self) {
        let mut start = 0;
        loop {
            let end = self.state.borrow().dirty.len();
            if start >= end {
                break;
            }
            for i in start..end {
                // a relation may reset the scheduler mid-walk
                let Some(component) = self.state.borrow().dirty.get(i).cloned() else {
                    return;
                };
                for relation in component.relations() {
                    relation.update(&component);
                }
            }
            start = end;
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.borrow();
        f.debug_struct("Scheduler")
            .field("options", &self.options)
            .field("dirty", &st.dirty.len())
            .field("pending", &st.pending)
            .finish()
    }
}
