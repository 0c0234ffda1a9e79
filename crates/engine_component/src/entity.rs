//! Entity type and allocation utilities.
//!
//! An [`Entity`] is a lightweight index with no inherent data. Indices are
//! dense and recycled: a freed index goes onto a free list and is handed out
//! again by the next allocation.

use serde::{Deserialize, Serialize};

/// A unique entity identifier.
///
/// Entities are pure identifiers; they carry no data of their own. The raw
/// value doubles as the slot index into every component table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// Create an entity from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns the slot index of this entity in component tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Allocates entity indices, reusing freed ones before growing.
///
/// The allocator tracks which indices are live so a double free can never
/// put the same index on the free list twice.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    next_id: u64,
    free: Vec<Entity>,
    live: Vec<bool>,
}

impl EntityAllocator {
    /// Creates a new allocator. The first allocated index is 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an entity, preferring the most recently freed index.
    pub fn allocate(&mut self) -> Entity {
        let entity = match self.free.pop() {
            Some(entity) => entity,
            None => {
                let entity = Entity(self.next_id);
                self.next_id += 1;
                self.live.push(false);
                entity
            }
        };
        self.live[entity.index()] = true;
        entity
    }

    /// Returns an entity's index to the free list.
    ///
    /// Returns `false` (and does nothing) if the entity is not live.
    pub fn free(&mut self, entity: Entity) -> bool {
        match self.live.get_mut(entity.index()) {
            Some(live) if *live => {
                *live = false;
                self.free.push(entity);
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if the entity has been allocated and not freed since.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.live.get(entity.index()).copied().unwrap_or(false)
    }

    /// Returns the number of currently live entities.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len() - self.free.len()
    }

    /// Returns the number of distinct indices ever handed out.
    #[must_use]
    pub fn allocated_count(&self) -> u64 {
        self.next_id
    }

    /// Returns the number of indices waiting to be reused.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}
