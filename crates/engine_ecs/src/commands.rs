//! Deferred registry mutations recorded by systems.
//!
//! While a system runs, the registry's tables are borrowed for iteration, so
//! entity systems cannot mutate the registry directly. They record
//! [`Commands`] instead; the registry applies them in recording order once
//! every system has run and before pending deaths are cleaned up.

use engine_component::{Component, Entity};

use crate::registry::Registry;

type Deferred = Box<dyn FnOnce(&mut Registry)>;

enum Command {
    Kill(Entity),
    Apply(Deferred),
}

/// An ordered buffer of deferred registry mutations.
#[derive(Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `entity` for death, as [`Registry::kill_entity`] would.
    pub fn kill(&mut self, entity: Entity) {
        self.queue.push(Command::Kill(entity));
    }

    /// Attach `value` to `entity`, replacing any previous value of that type.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) {
        self.push(move |registry| {
            registry.add_component(entity, value);
        });
    }

    /// Detach the `T` component from `entity`, if present.
    pub fn remove<T: Component>(&mut self, entity: Entity) {
        self.push(move |registry| {
            registry.remove_component::<T>(entity);
        });
    }

    /// Spawn a new entity and hand it to `build` for initialisation.
    pub fn spawn<F>(&mut self, build: F)
    where
        F: FnOnce(&mut Registry, Entity) + 'static,
    {
        self.push(move |registry| {
            let entity = registry.spawn_entity();
            build(registry, entity);
        });
    }

    /// Record an arbitrary mutation.
    pub fn push<F>(&mut self, apply: F)
    where
        F: FnOnce(&mut Registry) + 'static,
    {
        self.queue.push(Command::Apply(Box::new(apply)));
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Apply every recorded command to `registry`, in order.
    ///
    /// Returns the number of commands applied.
    pub fn apply(self, registry: &mut Registry) -> usize {
        let applied = self.queue.len();
        for command in self.queue {
            match command {
                Command::Kill(entity) => {
                    registry.kill_entity(entity);
                }
                Command::Apply(apply) => apply(registry),
            }
        }
        applied
    }
}

impl std::fmt::Debug for Commands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commands")
            .field("len", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Label(&'static str);
    impl Component for Label {}

    #[test]
    fn test_commands_apply_in_order() {
        let mut registry = Registry::new();
        registry.register_component::<Label>();
        let e = registry.spawn_entity();

        let mut commands = Commands::new();
        commands.insert(e, Label("first"));
        commands.insert(e, Label("second"));
        assert_eq!(commands.len(), 2);

        assert_eq!(commands.apply(&mut registry), 2);
        assert_eq!(registry.get_component::<Label>(e), Some(&Label("second")));
    }

    #[test]
    fn test_remove_and_kill() {
        let mut registry = Registry::new();
        registry.register_component::<Label>();
        let e = registry.spawn_entity();
        registry.add_component(e, Label("doomed"));

        let mut commands = Commands::new();
        commands.remove::<Label>(e);
        commands.kill(e);
        commands.apply(&mut registry);

        assert_eq!(registry.get_component::<Label>(e), None);
        assert!(registry.is_pending_death(e));
    }

    #[test]
    fn test_spawn_builds_new_entity() {
        let mut registry = Registry::new();
        registry.register_component::<Label>();

        let mut commands = Commands::new();
        commands.spawn(|registry, entity| {
            registry.add_component(entity, Label("spawned"));
        });
        assert!(!commands.is_empty());
        commands.apply(&mut registry);

        assert_eq!(registry.entity_count(), 1);
        let labels = registry.get_components::<Label>();
        assert_eq!(labels.iter().count(), 1);
    }
}
