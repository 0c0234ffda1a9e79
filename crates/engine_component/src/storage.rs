//! Type-erased access to component tables.
//!
//! The registry holds tables of unrelated component types side by side. It
//! only ever needs a few operations that do not depend on the element type,
//! so those live on [`ErasedStorage`]; typed access goes through a checked
//! downcast.

use std::any::Any;

use crate::component::Component;
use crate::sparse::SparseArray;

/// The type-independent surface of a component table.
pub trait ErasedStorage: Any {
    /// Name of the component type stored in this table.
    fn component_name(&self) -> &'static str;

    /// Clear the slot at `index`. Returns `true` if it held a value.
    fn erase_slot(&mut self, index: usize) -> bool;

    /// Number of slots, present or empty.
    fn slot_count(&self) -> usize;

    /// Returns `true` if the slot at `index` holds a value.
    fn is_present(&self, index: usize) -> bool;

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn ErasedStorage {
    /// Downcast to the concrete table for `T`.
    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&SparseArray<T>> {
        self.as_any().downcast_ref()
    }

    /// Mutable downcast to the concrete table for `T`.
    #[must_use]
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut SparseArray<T>> {
        self.as_any_mut().downcast_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A(u8);
    impl Component for A {}

    struct B;
    impl Component for B {}

    #[test]
    fn test_downcast_to_matching_type() {
        let mut boxed: Box<dyn ErasedStorage> = Box::new(SparseArray::<A>::new());
        boxed.downcast_mut::<A>().unwrap().insert_at(0, A(9));
        assert_eq!(boxed.downcast_ref::<A>().unwrap().get(0).unwrap().0, 9);
    }

    #[test]
    fn test_downcast_to_other_type_fails() {
        let boxed: Box<dyn ErasedStorage> = Box::new(SparseArray::<A>::new());
        assert!(boxed.downcast_ref::<B>().is_none());
    }
}
