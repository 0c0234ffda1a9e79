//! The [`Registry`], owner of all component tables, systems and the entity
//! lifecycle.
//!
//! ## Tick Sequence
//!
//! [`Registry::run_systems`] is one tick of simulation work:
//!
//! 1. Run every system in registration order.
//! 2. Apply the [`Commands`] recorded by entity systems.
//! 3. Clean up entities killed this tick: clear their slot in every table,
//!    then return their index to the allocator.
//!
//! Killed entities stay visible to systems until step 3, so a kill never
//! changes what a system observes mid-tick, and an index killed in tick N
//! cannot be handed out by [`Registry::spawn_entity`] before tick N's cleanup.
//!
//! ## Threading
//!
//! The registry is neither `Send` nor `Sync`. It is created on
//! the simulation thread and stays there; other threads talk to it only by
//! pushing events into a queue the simulation drains.
//!
//! ```compile_fail
//! use engine_ecs::Registry;
//!
//! let registry = Registry::new();
//! std::thread::spawn(move || drop(registry));
//! ```

use std::marker::PhantomData;
use std::rc::Rc;

use engine_component::{Component, ComponentTypeId, Entity, EntityAllocator, SparseArray};
use tracing::{debug, trace};

use crate::commands::Commands;
use crate::error::RegistryError;
use crate::query::{ComponentSet, EntitySystemFn, SystemFn};
use crate::scheduler::{SystemEntry, TickReport};
use crate::tables::ComponentTables;

/// Entity-component storage plus the system list of one simulation.
pub struct Registry {
    tables: ComponentTables,
    entities: EntityAllocator,
    /// Entities killed since the last cleanup, in kill order, without duplicates.
    pending_deaths: Vec<Entity>,
    systems: Vec<SystemEntry>,
    commands: Commands,
    tick: u64,
    _not_send: PhantomData<Rc<()>>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: ComponentTables::new(),
            entities: EntityAllocator::new(),
            pending_deaths: Vec::new(),
            systems: Vec::new(),
            commands: Commands::new(),
            tick: 0,
            _not_send: PhantomData,
        }
    }

    // ── Component tables ────────────────────────────────────────────────────

    /// Create the table for `T`. Calling this again for the same type is a
    /// no-op and keeps the existing data.
    ///
    /// # Panics
    ///
    /// Panics if another component type already registered under the same
    /// [`Component::type_name`].
    #[track_caller]
    pub fn register_component<T: Component>(&mut self) -> &mut Self {
        if self.tables.register::<T>() {
            debug!(
                component = T::type_name(),
                type_id = %T::component_type_id(),
                "registered component type"
            );
        }
        self
    }

    /// Returns `true` if `T` has been registered.
    #[must_use]
    pub fn is_registered<T: Component>(&self) -> bool {
        self.tables.contains::<T>()
    }

    /// The full table for `T`, for direct indexed access.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    #[must_use]
    #[track_caller]
    pub fn get_components<T: Component>(&self) -> &SparseArray<T> {
        match self.tables.get::<T>() {
            Ok(table) => table,
            Err(err) => panic!("{err}"),
        }
    }

    /// Mutable counterpart of [`Registry::get_components`].
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    #[track_caller]
    pub fn get_components_mut<T: Component>(&mut self) -> &mut SparseArray<T> {
        match self.tables.get_mut::<T>() {
            Ok(table) => table,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible counterpart of [`Registry::get_components`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unregistered`] if `T` was never registered.
    pub fn try_get_components<T: Component>(&self) -> Result<&SparseArray<T>, RegistryError> {
        self.tables.get::<T>()
    }

    /// Fallible counterpart of [`Registry::get_components_mut`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unregistered`] if `T` was never registered.
    pub fn try_get_components_mut<T: Component>(
        &mut self,
    ) -> Result<&mut SparseArray<T>, RegistryError> {
        self.tables.get_mut::<T>()
    }

    /// Attach `value` to `entity`, replacing any previous `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered or `entity` is not alive.
    #[track_caller]
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) -> &mut T {
        self.assert_alive::<T>(entity);
        self.get_components_mut::<T>().insert_at(entity.index(), value)
    }

    /// Construct a `T` in place for `entity`, replacing any previous `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered or `entity` is not alive.
    #[track_caller]
    pub fn emplace_component<T, F>(&mut self, entity: Entity, make: F) -> &mut T
    where
        T: Component,
        F: FnOnce() -> T,
    {
        self.assert_alive::<T>(entity);
        self.get_components_mut::<T>().emplace_at(entity.index(), make)
    }

    /// Detach `T` from `entity`. Returns the removed value, if any.
    ///
    /// An entity that is not alive has nothing to remove; its index is left
    /// untouched.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    #[track_caller]
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let alive = self.entities.is_alive(entity);
        let table = self.get_components_mut::<T>();
        if !alive {
            return None;
        }
        table.erase(entity.index())
    }

    #[track_caller]
    fn assert_alive<T: Component>(&self, entity: Entity) {
        assert!(
            self.entities.is_alive(entity),
            "cannot attach `{}` to {entity}: entity is not alive",
            T::type_name()
        );
    }

    /// The `T` attached to `entity`, if any.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    #[must_use]
    #[track_caller]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.get_components::<T>().get(entity.index())
    }

    /// Mutable counterpart of [`Registry::get_component`].
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    #[track_caller]
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.get_components_mut::<T>().get_mut(entity.index())
    }

    /// Returns `true` if `entity` currently has a `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    #[must_use]
    #[track_caller]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_components::<T>().is_present(entity.index())
    }

    // ── Entity lifecycle ────────────────────────────────────────────────────

    /// Allocate an entity, reusing a cleaned-up index when one is available.
    pub fn spawn_entity(&mut self) -> Entity {
        let entity = self.entities.allocate();
        trace!(%entity, "spawned entity");
        entity
    }

    /// Mark `entity` for removal at the end of the current tick.
    ///
    /// Returns `true` if the entity was newly queued. Killing an entity that
    /// is already queued, or that is not alive, does nothing.
    pub fn kill_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            debug!(%entity, "ignoring kill of entity that is not alive");
            return false;
        }
        if self.pending_deaths.contains(&entity) {
            return false;
        }
        self.pending_deaths.push(entity);
        trace!(%entity, "entity queued for cleanup");
        true
    }

    /// Returns `true` from spawn until the cleanup following its kill.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Returns `true` if `entity` was killed and awaits cleanup.
    #[must_use]
    pub fn is_pending_death(&self, entity: Entity) -> bool {
        self.pending_deaths.contains(&entity)
    }

    /// Number of live entities, including those pending death.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Number of entities waiting for cleanup.
    #[must_use]
    pub fn pending_death_count(&self) -> usize {
        self.pending_deaths.len()
    }

    /// Clear every pending entity out of every table and free its index.
    ///
    /// [`Registry::run_systems`] calls this itself; callers that drive
    /// systems with [`Registry::run_system`] call it once their tick is done.
    /// Returns the number of entities cleaned up.
    pub fn cleanup(&mut self) -> usize {
        let dead = std::mem::take(&mut self.pending_deaths);
        for &entity in &dead {
            let cleared = self.tables.erase_all(entity.index());
            self.entities.free(entity);
            trace!(%entity, cleared, "entity cleaned up");
        }
        if !dead.is_empty() {
            debug!(count = dead.len(), "cleaned up dead entities");
        }
        dead.len()
    }

    // ── Systems ─────────────────────────────────────────────────────────────

    /// Register a routine that runs for every entity holding all of `Q`.
    ///
    /// The signature is inferred from the closure's argument types:
    /// `|pos: &mut Position, vel: &mut Velocity|` binds `(Position, Velocity)`.
    ///
    /// # Panics
    ///
    /// Panics if `Q` names the same component type twice.
    #[track_caller]
    pub fn add_system<Q, F>(&mut self, name: impl Into<String>, mut system: F) -> &mut Self
    where
        Q: ComponentSet,
        F: SystemFn<Q> + 'static,
    {
        self.push_system::<Q>(
            name.into(),
            Box::new(move |tables, commands| {
                <F as SystemFn<Q>>::run(&mut system, tables, commands)
            }),
        )
    }

    /// Register a routine that also receives the matched [`Entity`] and a
    /// [`Commands`] buffer for deferred mutations.
    ///
    /// # Panics
    ///
    /// Panics if `Q` names the same component type twice.
    #[track_caller]
    pub fn add_entity_system<Q, F>(&mut self, name: impl Into<String>, mut system: F) -> &mut Self
    where
        Q: ComponentSet,
        F: EntitySystemFn<Q> + 'static,
    {
        self.push_system::<Q>(
            name.into(),
            Box::new(move |tables, commands| {
                <F as EntitySystemFn<Q>>::run(&mut system, tables, commands)
            }),
        )
    }

    #[track_caller]
    fn push_system<Q: ComponentSet>(
        &mut self,
        name: String,
        runner: crate::scheduler::Runner,
    ) -> &mut Self {
        let signature = Q::signature();
        assert_distinct::<Q>(&signature);
        debug!(
            system = %name,
            components = ?Q::type_names(),
            "registered system"
        );
        self.systems.push(SystemEntry::new(name, signature, runner));
        self
    }

    /// Registered systems, in execution order.
    #[must_use]
    pub fn systems(&self) -> &[SystemEntry] {
        &self.systems
    }

    /// Number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Number of completed [`Registry::run_systems`] calls.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Run one tick: every system in registration order, then deferred
    /// commands, then cleanup of entities killed during or before the tick.
    ///
    /// # Panics
    ///
    /// Panics if a system's signature names an unregistered component type.
    pub fn run_systems(&mut self) -> TickReport {
        self.tick += 1;
        let systems = self
            .systems
            .iter_mut()
            .map(|system| system.run(&mut self.tables, &mut self.commands))
            .collect();
        let commands_applied = self.apply_commands();
        let entities_cleaned = self.cleanup();

        let report = TickReport {
            tick: self.tick,
            systems,
            commands_applied,
            entities_cleaned,
        };
        debug!(
            tick = report.tick,
            fired = report.total_fired(),
            commands = commands_applied,
            cleaned = entities_cleaned,
            "systems run"
        );
        report
    }

    /// Run only the systems registered with exactly the signature `Q`, in
    /// registration order, then apply their deferred commands.
    ///
    /// Does not clean up dead entities; see [`Registry::cleanup`]. Returns the
    /// total number of invocations.
    ///
    /// # Panics
    ///
    /// Panics if `Q` names an unregistered component type.
    pub fn run_system<Q: ComponentSet>(&mut self) -> usize {
        let signature = Q::signature();
        let fired = self
            .systems
            .iter_mut()
            .filter(|system| system.matches(&signature))
            .map(|system| system.run(&mut self.tables, &mut self.commands).fired)
            .sum();
        self.apply_commands();
        fired
    }

    fn apply_commands(&mut self) -> usize {
        if self.commands.is_empty() {
            return 0;
        }
        std::mem::take(&mut self.commands).apply(self)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tables", &self.tables)
            .field("entities", &self.entities)
            .field("pending_deaths", &self.pending_deaths)
            .field("systems", &self.systems)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

#[track_caller]
fn assert_distinct<Q: ComponentSet>(signature: &[ComponentTypeId]) {
    for (i, type_id) in signature.iter().enumerate() {
        assert!(
            !signature[..i].contains(type_id),
            "system signature {:?} names a component type twice",
            Q::type_names()
        );
    }
}
