//! # Components, Relations, and the Redraw Scheduler
//!
//! Veneer is a small component runtime built around one idea: changes are
//! cheap to make and expensive to show, so showing them is batched. There are
//! four pieces:
//!
//! - `Prop<T>`: a memoized value slot that marks its owner dirty on change.
//! - `Component` owns a placement `Element`, props, relations and events.
//! - `Relation`: a dependency edge that can dirty other components.
//! - `Scheduler` collects dirty components and redraws them once per frame.
//!
//! ## Props
//!
//! ```rust
//! use std::rc::Rc;
//! use veneer_core::*;
//!
//! let host = Rc::new(HeadlessHost::new());
//! let sched = Scheduler::new(host.clone());
//! let c = Component::new(ComponentOptions::default().scheduler(sched.clone())).unwrap();
//!
//! let x = c.prop("x", 0);
//! x.set(5);
//! x.set(5); // equal value: no-op
//! assert_eq!(sched.dirty_len(), 1);
//! assert!(sched.pending_frame().is_some());
//!
//! host.run_frame();
//! assert_eq!(sched.dirty_len(), 0);
//! assert!(sched.pending_frame().is_none());
//! ```
//!
//! ## Redrawing from props
//!
//! `redraw_by` is how a component recomputes derived output only when its
//! inputs changed since the last redraw:
//!
//! ```rust
//! use veneer_core::*;
//!
//! let c = Component::new(ComponentOptions::default()).unwrap();
//! let width = c.prop("width", 10.0f32);
//! c.set_onredraw(|c| {
//!     let _ = c.redraw_by(&["width"], |c, v| {
//!         let w = v.get::<f32>(0).copied().unwrap_or_default();
//!         c.element().update_metrics(|m| m.rect.w = w);
//!     });
//! });
//!
//! width.set(20.0);
//! Scheduler::main().flush();
//! assert_eq!(c.element().metrics().rect.w, 20.0);
//! # Scheduler::reset_main();
//! ```
//!
//! ## Frames
//!
//! The scheduler never redraws synchronously. It asks its `Host` for an
//! animation frame (or a ~16.67 ms timer when the host has none), runs
//! relation propagation to a fixed point, then redraws every dirty component
//! exactly once in the order they were first marked. See [`scheduler`] for
//! the details and [`relation`] for propagation.

pub mod component;
pub mod element;
pub mod error;
pub mod events;
pub mod geometry;
pub mod host;
pub mod input;
pub mod prop;
pub mod relation;
pub mod scheduler;
mod tests;

pub use component::*;
pub use element::*;
pub use error::*;
pub use events::*;
pub use geometry::*;
pub use host::*;
pub use input::*;
pub use prop::{Prop, PropValue, RedrawValues};
pub use relation::{FnRelation, Relation, relation};
pub use scheduler::*;
