use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::component::{Component, ComponentInner};

type Converter<T> = Box<dyn Fn(T, &T) -> T>;

/// A memoized value slot owned by a component. Writing a value different from
/// the cached one marks the owner dirty; writing an equal value does nothing.
///
/// ```rust
/// use veneer_core::*;
///
/// let c = Component::new(ComponentOptions::default()).unwrap();
/// let x = c.prop("x", 0);
/// assert!(x.set(5));
/// assert!(!x.set(5));
/// assert_eq!(x.get(), 5);
/// # Scheduler::main().reset();
/// ```
pub struct Prop<T>(Rc<PropInner<T>>);

struct PropInner<T> {
    value: RefCell<T>,
    owner: Weak<ComponentInner>,
    converter: Option<Converter<T>>,
}

impl<T> Clone for Prop<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone + PartialEq + 'static> Prop<T> {
    pub(crate) fn new(owner: Weak<ComponentInner>, value: T) -> Self {
        Self(Rc::new(PropInner {
            value: RefCell::new(value),
            owner,
            converter: None,
        }))
    }

    /// The initial value is converted against `default`; every accepted write
    /// is converted against the previous value.
    pub(crate) fn with_converter(
        owner: Weak<ComponentInner>,
        initial: T,
        default: T,
        converter: impl Fn(T, &T) -> T + 'static,
    ) -> Self {
        let value = converter(initial, &default);
        Self(Rc::new(PropInner {
            value: RefCell::new(value),
            owner,
            converter: Some(Box::new(converter)),
        }))
    }

    pub fn get(&self) -> T {
        self.0.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.value.borrow())
    }

    /// Returns whether the value changed (and the owner was marked dirty).
    pub fn set(&self, value: T) -> bool {
        if *self.0.value.borrow() == value {
            return false;
        }
        let next = match &self.0.converter {
            Some(convert) => {
                let prev = self.0.value.borrow();
                convert(value, &prev)
            }
            None => value,
        };
        *self.0.value.borrow_mut() = next;
        if let Some(owner) = self.0.owner.upgrade() {
            Component::from_inner(owner).mark_dirty();
        }
        true
    }

    pub fn owner(&self) -> Option<Component> {
        self.0.owner.upgrade().map(Component::from_inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Prop<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Prop").field(&*self.0.value.borrow()).finish()
    }
}

/// A property value with its concrete type erased, compared by `PartialEq`
/// of the underlying type.
pub trait PropValue: Any {
    fn as_any(&self) -> &dyn Any;
    fn eq_value(&self, other: &dyn PropValue) -> bool;
    fn clone_value(&self) -> Box<dyn PropValue>;
}

impl<T: Any + Clone + PartialEq> PropValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_value(&self, other: &dyn PropValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn clone_value(&self) -> Box<dyn PropValue> {
        Box::new(self.clone())
    }
}

/// Object-safe view of a declared `Prop<T>`, kept in the component's property
/// registry.
pub(crate) trait PropSlot {
    fn read(&self) -> Box<dyn PropValue>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Clone + PartialEq + 'static> PropSlot for Prop<T> {
    fn read(&self) -> Box<dyn PropValue> {
        Box::new(self.get())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Current values handed to a `redraw_by` callback, in the order the names
/// were given.
pub struct RedrawValues {
    values: Vec<Box<dyn PropValue>>,
}

impl RedrawValues {
    pub(crate) fn new(values: Vec<Box<dyn PropValue>>) -> Self {
        Self { values }
    }

    /// The value at `index`, if it exists and has type `T`.
    pub fn get<T: 'static>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.as_any().downcast_ref::<T>()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for RedrawValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedrawValues")
            .field("len", &self.values.len())
            .finish()
    }
}
