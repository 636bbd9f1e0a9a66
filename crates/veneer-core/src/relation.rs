//! # Relations
//!
//! A [`Relation`] is a dependency edge between components. When a component
//! it is attached to is dirty, the scheduler calls [`Relation::update`] during
//! the propagation phase of the frame; the relation may mark other components
//! dirty, and those get their own relations run in the same frame.
//!
//! ```rust
//! use std::rc::Rc;
//! use veneer_core::*;
//!
//! let host = Rc::new(HeadlessHost::new());
//! let sched = Scheduler::new(host.clone());
//! let opts = || ComponentOptions::default().scheduler(sched.clone());
//!
//! let source = Component::new(opts()).unwrap();
//! let derived = Component::new(opts()).unwrap();
//!
//! let target = derived.clone();
//! source.add_relation(relation(move |_| target.mark_dirty()));
//!
//! source.mark_dirty();
//! host.run_frame();
//! assert_eq!(sched.dirty_len(), 0);
//! ```
//!
//! Relations are shared: the same `Rc<dyn Relation>` may be attached to many
//! components, and attaching it twice to one component is a no-op. A relation
//! that keeps re-dirtying components in a cycle never lets the frame reach a
//! fixed point; avoiding that is up to the relation.

use std::fmt;
use std::rc::Rc;

use crate::Component;

pub trait Relation {
    fn update(&self, component: &Component);
}

/// Adapts a closure into a [`Relation`].
pub struct FnRelation<F>(F);

impl<F: Fn(&Component)> FnRelation<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F: Fn(&Component)> Relation for FnRelation<F> {
    fn update(&self, component: &Component) {
        (self.0)(component)
    }
}

impl<F> fmt::Debug for FnRelation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnRelation")
    }
}

pub fn relation(f: impl Fn(&Component) + 'static) -> Rc<dyn Relation> {
    Rc::new(FnRelation::new(f))
}

/// Identity comparison that ignores vtable pointers.
pub(crate) fn same_relation(a: &Rc<dyn Relation>, b: &Rc<dyn Relation>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}
