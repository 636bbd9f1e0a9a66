//! # Ancestor scroll offsets
//!
//! A drag that starts inside a scrollable container has to keep following the
//! pointer when the container scrolls under it. [`ScrollOffset`] sums the
//! scroll position *and* the scrollable extent (`scroll_size - client_size`)
//! of every ancestor of an element, so a tracker can tell a real scroll from a
//! layout shift caused by a scrollbar appearing or disappearing:
//!
//! ```rust
//! use veneer_core::*;
//! use veneer_ui::scroll::ScrollOffset;
//!
//! let doc = Document::new();
//! let list = doc.create_element("ul");
//! let item = doc.create_element("li");
//! list.append_child(&item);
//! doc.body().append_child(&list);
//!
//! let start = ScrollOffset::of_ancestors(&item);
//! list.update_metrics(|m| m.scroll.y = 30.0);
//! let now = ScrollOffset::of_ancestors(&item);
//! assert_eq!(now.correction_since(&start), Vec2::new(0.0, 30.0));
//! ```

use veneer_core::{Element, Vec2};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollOffset {
    /// Summed horizontal scroll position.
    pub x: f32,
    /// Summed vertical scroll position.
    pub y: f32,
    /// Summed horizontal scroll extent.
    pub width: f32,
    /// Summed vertical scroll extent.
    pub height: f32,
}

impl ScrollOffset {
    /// Sums scroll positions and extents from the parent of `element` up to
    /// the root.
    pub fn of_ancestors(element: &Element) -> Self {
        element.ancestors().fold(Self::default(), |acc, a| {
            let m = a.metrics();
            let extent = m.scroll_extent();
            Self {
                x: acc.x + m.scroll.x,
                y: acc.y + m.scroll.y,
                width: acc.width + extent.width,
                height: acc.height + extent.height,
            }
        })
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Effective scroll since `start`: the position change minus the extent
    /// change.
    pub fn correction_since(&self, start: &ScrollOffset) -> Vec2 {
        (self.position() - start.position()) - (self.extent() - start.extent())
    }
}

/// Where `element`'s content box starts in page coordinates: its bounding
/// rect, corrected for its own scroll and the document body's offset and
/// margin.
pub fn element_offset(element: &Element, body: &Element) -> Vec2 {
    let m = element.metrics();
    let b = body.metrics();
    m.rect.origin() - m.scroll - b.rect.origin() + b.margin
}
