use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use veneer_core::{Host, HostHandle};

/// Coalesces bursts of calls into one callback per host timer tick.
///
/// Each [`Debounce::call`] drops the previously scheduled callback and arms a
/// new timer `delay` from now; only the last call of a burst runs.
pub struct Debounce {
    host: Rc<dyn Host>,
    delay: Duration,
    pending: Rc<Cell<Option<HostHandle>>>,
}

impl Debounce {
    pub fn new(host: Rc<dyn Host>, delay: Duration) -> Self {
        Self {
            host,
            delay,
            pending: Rc::new(Cell::new(None)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    pub fn call(&self, f: impl FnOnce() + 'static) {
        self.cancel();
        let pending = self.pending.clone();
        let handle = self.host.set_timeout(
            Box::new(move || {
                pending.set(None);
                f();
            }),
            self.delay,
        );
        self.pending.set(Some(handle));
    }

    pub fn cancel(&self) {
        if let Some(handle) = self.pending.take() {
            self.host.clear_timeout(handle);
        }
    }
}

impl Drop for Debounce {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Debounce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounce")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}
