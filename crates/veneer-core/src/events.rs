//! Ordered listener registry shared by elements (keyed by [`EventKind`]) and
//! component emitters (keyed by event name).
//!
//! [`EventKind`]: crate::input::EventKind

use std::borrow::Borrow;
use std::fmt;

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

new_key_type! {
    /// Returned by listener registration; pass it back to remove the listener.
    pub struct ListenerId;
}

pub struct Registry<T, F> {
    slots: SlotMap<ListenerId, (T, F)>,
    // registration order; slotmap iteration order is not stable
    order: Vec<ListenerId>,
}

impl<T, F> Default for Registry<T, F> {
    fn default() -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }
}

impl<T, F> fmt::Debug for Registry<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("listeners", &self.order.len())
            .finish()
    }
}

impl<T: PartialEq, F: Clone> Registry<T, F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, topic: T, listener: F) -> ListenerId {
        let id = self.slots.insert((topic, listener));
        self.order.push(id);
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> Option<F> {
        let (_, listener) = self.slots.remove(id)?;
        self.order.retain(|k| *k != id);
        Some(listener)
    }

    /// Removes every listener for `topic`, returning how many were dropped.
    pub fn remove_topic<Q>(&mut self, topic: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        let slots = &mut self.slots;
        let before = self.order.len();
        self.order.retain(|id| {
            let hit = matches!(slots.get(*id), Some((t, _)) if Borrow::<Q>::borrow(t) == topic);
            if hit {
                slots.remove(*id);
            }
            !hit
        });
        before - self.order.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
    }

    pub fn topic_of(&self, id: ListenerId) -> Option<&T> {
        self.slots.get(id).map(|(t, _)| t)
    }

    /// Listeners for `topic` in registration order, cloned out so the caller
    /// can invoke them without holding a borrow of the registry.
    pub fn snapshot<Q>(&self, topic: &Q) -> SmallVec<[F; 4]>
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(*id))
            .filter(|(t, _)| Borrow::<Q>::borrow(t) == topic)
            .map(|(_, f)| f.clone())
            .collect()
    }

    pub fn count<Q>(&self, topic: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.slots
            .values()
            .filter(|(t, _)| Borrow::<Q>::borrow(t) == topic)
            .count()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
