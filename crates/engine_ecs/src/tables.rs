//! The set of component tables owned by a registry.

use std::collections::HashMap;

use engine_component::{Component, ComponentTypeId, ErasedStorage, SparseArray};

use crate::error::RegistryError;

/// One [`SparseArray`] per registered component type, stored type-erased and
/// keyed by [`ComponentTypeId`].
#[derive(Default)]
pub struct ComponentTables {
    tables: HashMap<ComponentTypeId, Box<dyn ErasedStorage>>,
}

impl ComponentTables {
    /// Create an empty table set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the table for `T` if it does not exist yet.
    ///
    /// Returns `true` if a new table was created.
    ///
    /// # Panics
    ///
    /// Panics if a different Rust type already owns `T`'s type id, which
    /// happens when two component types share a [`Component::type_name`].
    #[track_caller]
    pub fn register<T: Component>(&mut self) -> bool {
        let type_id = T::component_type_id();
        if let Some(existing) = self.tables.get(&type_id) {
            if existing.downcast_ref::<T>().is_none() {
                panic!("{}", mismatch::<T>(existing.component_name()));
            }
            return false;
        }
        self.tables
            .insert(type_id, Box::new(SparseArray::<T>::new()));
        true
    }

    /// Returns `true` if a table for `T` exists.
    #[must_use]
    pub fn contains<T: Component>(&self) -> bool {
        self.tables.contains_key(&T::component_type_id())
    }

    /// Typed access to the table for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unregistered`] if `T` has no table.
    pub fn get<T: Component>(&self) -> Result<&SparseArray<T>, RegistryError> {
        let storage = self
            .tables
            .get(&T::component_type_id())
            .ok_or_else(unregistered::<T>)?;
        let stored = storage.component_name();
        storage
            .downcast_ref::<T>()
            .ok_or_else(|| mismatch::<T>(stored))
    }

    /// Mutable typed access to the table for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unregistered`] if `T` has no table.
    pub fn get_mut<T: Component>(&mut self) -> Result<&mut SparseArray<T>, RegistryError> {
        let storage = self
            .tables
            .get_mut(&T::component_type_id())
            .ok_or_else(unregistered::<T>)?;
        let stored = storage.component_name();
        storage
            .downcast_mut::<T>()
            .ok_or_else(|| mismatch::<T>(stored))
    }

    /// Clear slot `index` in every table. Returns how many slots held a value.
    pub fn erase_all(&mut self, index: usize) -> usize {
        self.tables
            .values_mut()
            .map(|table| table.erase_slot(index))
            .filter(|&cleared| cleared)
            .count()
    }

    /// Returns `true` if `index` is populated in every table of `signature`.
    #[must_use]
    pub fn all_present(&self, signature: &[ComponentTypeId], index: usize) -> bool {
        signature.iter().all(|type_id| {
            self.tables
                .get(type_id)
                .is_some_and(|table| table.is_present(index))
        })
    }

    /// Number of registered component types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if no component type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Names of every registered component type, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.tables.values().map(|t| t.component_name()).collect();
        names.sort_unstable();
        names
    }

    /// Borrow several distinct tables mutably at once.
    ///
    /// # Panics
    ///
    /// Panics if any type is unregistered or if a type appears twice.
    #[track_caller]
    pub(crate) fn disjoint_mut<const N: usize>(
        &mut self,
        type_ids: [ComponentTypeId; N],
        names: [&'static str; N],
    ) -> [&mut Box<dyn ErasedStorage>; N] {
        let mut slot = 0;
        self.tables
            .get_disjoint_mut(type_ids.each_ref())
            .map(|table| {
                let (type_id, name) = (type_ids[slot], names[slot]);
                slot += 1;
                match table {
                    Some(table) => table,
                    None => panic!("{}", RegistryError::Unregistered { name, type_id }),
                }
            })
    }

    /// Downcast a table handed out by [`ComponentTables::disjoint_mut`].
    #[track_caller]
    pub(crate) fn typed<T: Component>(table: &mut Box<dyn ErasedStorage>) -> &mut SparseArray<T> {
        let stored = table.component_name();
        match table.downcast_mut::<T>() {
            Some(table) => table,
            None => panic!("{}", mismatch::<T>(stored)),
        }
    }
}

impl std::fmt::Debug for ComponentTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentTables")
            .field("types", &self.names())
            .finish()
    }
}

fn unregistered<T: Component>() -> RegistryError {
    RegistryError::Unregistered {
        name: T::type_name(),
        type_id: T::component_type_id(),
    }
}

fn mismatch<T: Component>(stored: &'static str) -> RegistryError {
    RegistryError::TypeMismatch {
        type_id: T::component_type_id(),
        stored,
        requested: T::type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Mass(f32);
    impl Component for Mass {}

    #[derive(Debug, PartialEq)]
    struct Charge(f32);
    impl Component for Charge {}

    #[test]
    fn test_register_is_idempotent() {
        let mut tables = ComponentTables::new();
        assert!(tables.register::<Mass>());
        tables.get_mut::<Mass>().unwrap().insert_at(0, Mass(1.0));
        assert!(!tables.register::<Mass>());
        assert_eq!(tables.len(), 1);
        // Re-registering must not replace the existing table.
        assert_eq!(tables.get::<Mass>().unwrap().get(0), Some(&Mass(1.0)));
    }

    struct TagA;
    impl Component for TagA {
        fn type_name() -> &'static str {
            "Tag"
        }
    }

    struct TagB;
    impl Component for TagB {
        fn type_name() -> &'static str {
            "Tag"
        }
    }

    #[test]
    #[should_panic(expected = "holds `Tag`, not `Tag`")]
    fn test_colliding_type_names_rejected_at_registration() {
        let mut tables = ComponentTables::new();
        assert!(tables.register::<TagA>());
        tables.register::<TagB>();
    }

    #[test]
    fn test_unregistered_lookup_is_an_error() {
        let tables = ComponentTables::new();
        let err = tables.get::<Mass>().unwrap_err();
        assert!(matches!(err, RegistryError::Unregistered { .. }));
    }

    #[test]
    fn test_erase_all_clears_every_table() {
        let mut tables = ComponentTables::new();
        tables.register::<Mass>();
        tables.register::<Charge>();
        tables.get_mut::<Mass>().unwrap().insert_at(2, Mass(1.0));
        tables.get_mut::<Charge>().unwrap().insert_at(2, Charge(-1.0));

        assert_eq!(tables.erase_all(2), 2);
        assert_eq!(tables.erase_all(2), 0);
        assert_eq!(tables.get::<Mass>().unwrap().len(), 3);
    }

    #[test]
    fn test_all_present() {
        let mut tables = ComponentTables::new();
        tables.register::<Mass>();
        tables.register::<Charge>();
        tables.get_mut::<Mass>().unwrap().insert_at(0, Mass(1.0));
        let signature = [Mass::component_type_id(), Charge::component_type_id()];
        assert!(!tables.all_present(&signature, 0));
        tables.get_mut::<Charge>().unwrap().insert_at(0, Charge(1.0));
        assert!(tables.all_present(&signature, 0));
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn test_disjoint_mut_panics_on_unregistered() {
        let mut tables = ComponentTables::new();
        tables.register::<Mass>();
        let _ = tables.disjoint_mut(
            [Mass::component_type_id(), Charge::component_type_id()],
            [Mass::type_name(), Charge::type_name()],
        );
    }
}
