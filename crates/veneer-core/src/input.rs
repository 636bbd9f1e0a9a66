use smallvec::{SmallVec, smallvec};

use crate::Vec2;

/// Logical contact key: the native identifier for touches, [`PointerId::MOUSE`]
/// for the single mouse contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

impl PointerId {
    pub const MOUSE: PointerId = PointerId(u64::MAX);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    MouseDown,
    MouseMove,
    MouseUp,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    Scroll,
}

impl EventKind {
    pub fn pointer_kind(self) -> Option<PointerKind> {
        match self {
            EventKind::MouseDown | EventKind::MouseMove | EventKind::MouseUp => {
                Some(PointerKind::Mouse)
            }
            EventKind::TouchStart
            | EventKind::TouchMove
            | EventKind::TouchEnd
            | EventKind::TouchCancel => Some(PointerKind::Touch),
            EventKind::Scroll => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool, // Cmd on Mac, Win key on Windows
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Touch {
    pub id: PointerId,
    /// Page coordinates.
    pub page: Vec2,
}

/// A raw input event as delivered by the host and passed through to gesture
/// callbacks untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct InputEvent {
    pub kind: EventKind,
    /// Page coordinates of the mouse; unused for touch and scroll events.
    pub page: Vec2,
    /// Touches that changed in this event (`changedTouches`).
    pub touches: SmallVec<[Touch; 2]>,
    pub modifiers: Modifiers,
}

impl InputEvent {
    pub fn mouse(kind: EventKind, page: Vec2) -> Self {
        Self {
            kind,
            page,
            touches: SmallVec::new(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn touch(kind: EventKind, touches: impl IntoIterator<Item = Touch>) -> Self {
        Self {
            kind,
            page: Vec2::ZERO,
            touches: touches.into_iter().collect(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn scroll() -> Self {
        Self::mouse(EventKind::Scroll, Vec2::ZERO)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// The contacts this event reports on: the changed touches for touch
    /// events, the mouse sentinel for mouse events, nothing otherwise.
    pub fn contacts(&self) -> SmallVec<[Touch; 2]> {
        match self.kind.pointer_kind() {
            Some(PointerKind::Mouse) => smallvec![Touch {
                id: PointerId::MOUSE,
                page: self.page,
            }],
            Some(PointerKind::Touch) => self.touches.clone(),
            None => SmallVec::new(),
        }
    }
}
