//! Per-type component storage.
//!
//! A [`SparseArray`] is a growable vector of optional slots indexed directly
//! by [`Entity::index`](crate::Entity::index). Entity indices are dense, so
//! this gives O(1) access without hashing; slots of dead or never-populated
//! entities stay allocated as empty markers.

use crate::component::Component;
use crate::storage::ErasedStorage;

/// Dense, sparsely populated storage for one component type.
#[derive(Debug, Clone)]
pub struct SparseArray<T> {
    slots: Vec<Option<T>>,
}

impl<T> SparseArray<T> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Create an empty table with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Returns the value at `index`, or `None` if the slot is empty or past
    /// the end of the table.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Mutable counterpart of [`SparseArray::get`]. Never grows the table.
    #[must_use]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    /// Returns the raw slot at `index`, growing the table with empty slots
    /// if `index` is past the end.
    pub fn slot_mut(&mut self, index: usize) -> &mut Option<T> {
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        &mut self.slots[index]
    }

    /// Store `value` at `index`, replacing any previous value.
    pub fn insert_at(&mut self, index: usize, value: T) -> &mut T {
        self.slot_mut(index).insert(value)
    }

    /// Construct a value in the slot at `index`, replacing any previous value.
    pub fn emplace_at<F>(&mut self, index: usize, make: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        self.slot_mut(index).insert(make())
    }

    /// Clear the slot at `index` and return what it held.
    ///
    /// The table never shrinks; erasing past the end is a no-op.
    pub fn erase(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Returns `true` if the slot at `index` holds a value.
    #[must_use]
    pub fn is_present(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Number of slots, present or empty.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Alias for [`SparseArray::len`].
    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the table has no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots that hold a value.
    #[must_use]
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterate over `(index, value)` for every present slot.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (index, value)))
    }

    /// Mutable counterpart of [`SparseArray::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_mut().map(|value| (index, value)))
    }
}

impl<T> Default for SparseArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ErasedStorage for SparseArray<T> {
    fn component_name(&self) -> &'static str {
        T::type_name()
    }

    fn erase_slot(&mut self, index: usize) -> bool {
        self.erase(index).is_some()
    }

    fn slot_count(&self) -> usize {
        self.len()
    }

    fn is_present(&self, index: usize) -> bool {
        SparseArray::is_present(self, index)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
