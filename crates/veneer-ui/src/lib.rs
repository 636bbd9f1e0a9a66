//! Pointer and touch dragging for Veneer components.
//!
//! - [`gestures`]: the multi-contact [`PointerTracker`].
//! - [`Draggable`]: a tracker bound to a component's element.
//! - [`scroll`]: ancestor scroll offsets used for drag scroll correction.
//! - [`debounce`]: host-timer debouncing.

pub mod debounce;
pub mod draggable;
pub mod gestures;
pub mod scroll;

pub use debounce::Debounce;
pub use draggable::Draggable;
pub use gestures::{
    DragCallback, DragHandlers, GestureContext, InputMode, PointerTracker, TrackerOptions,
};
pub use scroll::ScrollOffset;
