//! Wire messages understood by the simulation and how they mutate it.

use anyhow::{Result, bail};
use engine_component::Entity;
use engine_ecs::Registry;
use engine_net::{DecoderTable, Event};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::{Position, Velocity};

/// Message-type tags.
pub mod tag {
    pub const SET_POSITION: u8 = 0x01;
    pub const SPAWN: u8 = 0x02;
    pub const DESPAWN: u8 = 0x03;
}

/// Overwrite an entity's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPosition {
    /// Target entity; must be alive.
    pub entity: Entity,
    /// New x coordinate.
    pub x: f32,
    /// New y coordinate.
    pub y: f32,
}

/// Create a moving entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    /// Initial position.
    pub position: Position,
    /// Initial velocity.
    pub velocity: Velocity,
}

/// Remove an entity at the end of the next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Despawn {
    /// Entity to kill.
    pub entity: Entity,
}

/// Every message the simulation accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Tag [`tag::SET_POSITION`].
    SetPosition(SetPosition),
    /// Tag [`tag::SPAWN`].
    Spawn(Spawn),
    /// Tag [`tag::DESPAWN`].
    Despawn(Despawn),
}

/// Decoders for every [`Payload`] variant.
#[must_use]
pub fn decoders() -> DecoderTable<Payload> {
    let mut table = DecoderTable::new();
    table
        .register_message(tag::SET_POSITION, Payload::SetPosition)
        .register_message(tag::SPAWN, Payload::Spawn)
        .register_message(tag::DESPAWN, Payload::Despawn);
    table
}

/// Apply one event to the registry.
///
/// # Errors
///
/// Fails if the event addresses an entity that is not alive.
pub fn apply(registry: &mut Registry, event: Event<Payload>) -> Result<()> {
    match event.payload {
        Payload::SetPosition(SetPosition { entity, x, y }) => {
            if !registry.is_alive(entity) {
                bail!("cannot move {entity}: not alive");
            }
            registry.add_component(entity, Position { x, y });
        }
        Payload::Spawn(Spawn { position, velocity }) => {
            let entity = registry.spawn_entity();
            registry.add_component(entity, position);
            registry.add_component(entity, velocity);
            debug!(%entity, sender = %event.sender, "spawned from network");
        }
        Payload::Despawn(Despawn { entity }) => {
            if !registry.kill_entity(entity) && !registry.is_pending_death(entity) {
                bail!("cannot despawn {entity}: not alive");
            }
        }
    }
    Ok(())
}
