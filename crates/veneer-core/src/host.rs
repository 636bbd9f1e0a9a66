//! # Hosts
//!
//! A [`Host`] is the environment the runtime borrows its clock from: a
//! per-display-frame callback (optional), cancellable timers, and the touch
//! capability query gesture trackers use to pick an input family.
//!
//! [`HeadlessHost`] keeps frames and timers in queues that only run when the
//! embedder pumps them, on a virtual clock. It backs the process-wide
//! scheduler by default and is what the tests drive.
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use std::time::Duration;
//! use veneer_core::*;
//!
//! let host = HeadlessHost::new();
//! let fired = Rc::new(Cell::new(false));
//! let f = fired.clone();
//! host.set_timeout(Box::new(move || f.set(true)), Duration::from_millis(5));
//!
//! host.advance(Duration::from_millis(4));
//! assert!(!fired.get());
//! host.advance(Duration::from_millis(1));
//! assert!(fired.get());
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::time::Duration;

use slotmap::{SlotMap, new_key_type};

pub type Callback = Box<dyn FnOnce()>;

new_key_type! {
    /// Identifies a scheduled frame callback or timer.
    pub struct HostHandle;
}

pub trait Host {
    /// Whether [`Host::request_animation_frame`] is backed by a real
    /// per-frame primitive. Callers fall back to timers when it is not.
    fn supports_animation_frame(&self) -> bool {
        true
    }

    fn request_animation_frame(&self, callback: Callback) -> HostHandle;

    fn cancel_animation_frame(&self, handle: HostHandle);

    fn set_timeout(&self, callback: Callback, delay: Duration) -> HostHandle;

    fn clear_timeout(&self, handle: HostHandle);

    fn supports_touch(&self) -> bool {
        false
    }
}

enum Pending {
    Frame(Callback),
    Timer {
        due: Duration,
        seq: u64,
        callback: Callback,
    },
}

pub struct HeadlessHost {
    animation_frames: bool,
    touch: bool,
    now: Cell<Duration>,
    seq: Cell<u64>,
    pending: RefCell<SlotMap<HostHandle, Pending>>,
    frame_order: RefCell<Vec<HostHandle>>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self {
            animation_frames: true,
            touch: false,
            now: Cell::new(Duration::ZERO),
            seq: Cell::new(0),
            pending: RefCell::new(SlotMap::with_key()),
            frame_order: RefCell::new(Vec::new()),
        }
    }

    /// A host without a per-frame primitive; schedulers fall back to timers.
    pub fn without_animation_frame() -> Self {
        Self {
            animation_frames: false,
            ..Self::new()
        }
    }

    pub fn with_touch(mut self, touch: bool) -> Self {
        self.touch = touch;
        self
    }

    /// Virtual time elapsed since the host was created.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn pending_frames(&self) -> usize {
        self.frame_order.borrow().len()
    }

    pub fn pending_timers(&self) -> usize {
        self.pending
            .borrow()
            .values()
            .filter(|p| matches!(p, Pending::Timer { .. }))
            .count()
    }

    /// Runs every frame callback requested before this call. Callbacks that
    /// request another frame land in the next one. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let order = std::mem::take(&mut *self.frame_order.borrow_mut());
        let mut ran = 0;
        for handle in order {
            let entry = self.pending.borrow_mut().remove(handle);
            if let Some(Pending::Frame(callback)) = entry {
                callback();
                ran += 1;
            }
        }
        ran
    }

    /// Moves the clock forward by `by`, running due timers in deadline order.
    /// Timers scheduled by those callbacks run too if they fall due within the
    /// window. Returns how many ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut ran = 0;
        while let Some(callback) = self.pop_due_timer(target) {
            callback();
            ran += 1;
        }
        self.now.set(target);
        ran
    }

    /// Runs timers that are already due without moving the clock.
    pub fn run_timers(&self) -> usize {
        self.advance(Duration::ZERO)
    }

    fn pop_due_timer(&self, target: Duration) -> Option<Callback> {
        let mut pending = self.pending.borrow_mut();
        let (handle, due) = pending
            .iter()
            .filter_map(|(h, p)| match p {
                Pending::Timer { due, seq, .. } if *due <= target => Some((h, *due, *seq)),
                _ => None,
            })
            .min_by_key(|(_, due, seq)| (*due, *seq))
            .map(|(h, due, _)| (h, due))?;
        if due > self.now.get() {
            self.now.set(due);
        }
        match pending.remove(handle) {
            Some(Pending::Timer { callback, .. }) => Some(callback),
            _ => None,
        }
    }

    fn next_seq(&self) -> u64 {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        seq
    }
}

impl Host for HeadlessHost {
    fn supports_animation_frame(&self) -> bool {
        self.animation_frames
    }

    fn request_animation_frame(&self, callback: Callback) -> HostHandle {
        let handle = self.pending.borrow_mut().insert(Pending::Frame(callback));
        self.frame_order.borrow_mut().push(handle);
        handle
    }

    fn cancel_animation_frame(&self, handle: HostHandle) {
        let mut pending = self.pending.borrow_mut();
        if matches!(pending.get(handle), Some(Pending::Frame(_))) {
            pending.remove(handle);
            self.frame_order.borrow_mut().retain(|h| *h != handle);
        }
    }

    fn set_timeout(&self, callback: Callback, delay: Duration) -> HostHandle {
        let due = self.now.get() + delay;
        let seq = self.next_seq();
        self.pending.borrow_mut().insert(Pending::Timer {
            due,
            seq,
            callback,
        })
    }

    fn clear_timeout(&self, handle: HostHandle) {
        let mut pending = self.pending.borrow_mut();
        if matches!(pending.get(handle), Some(Pending::Timer { .. })) {
            pending.remove(handle);
        }
    }

    fn supports_touch(&self) -> bool {
        self.touch
    }
}

impl fmt::Debug for HeadlessHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessHost")
            .field("animation_frames", &self.animation_frames)
            .field("touch", &self.touch)
            .field("now", &self.now.get())
            .field("pending_frames", &self.pending_frames())
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}
