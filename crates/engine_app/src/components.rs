//! Components and systems of the demo simulation.

use engine_component::{Component, Entity};
use engine_ecs::{Commands, Registry};
use serde::{Deserialize, Serialize};

/// Entities further than this from the origin on either axis are despawned.
pub const WORLD_EXTENT: f32 = 10_000.0;

/// World-space location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Component for Position {}

/// Displacement applied each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

impl Component for Velocity {}

/// Advance position by velocity, once per tick.
pub fn movement(pos: &mut Position, vel: &mut Velocity) {
    pos.x += vel.dx;
    pos.y += vel.dy;
}

/// Despawn anything that has left the world.
pub fn despawn_out_of_bounds(entity: Entity, commands: &mut Commands, pos: &mut Position) {
    if pos.x.abs() > WORLD_EXTENT || pos.y.abs() > WORLD_EXTENT {
        commands.kill(entity);
    }
}

/// Register the demo component types and systems, in execution order.
pub fn install(registry: &mut Registry) {
    registry
        .register_component::<Position>()
        .register_component::<Velocity>();
    registry
        .add_system("movement", movement)
        .add_entity_system("despawn_out_of_bounds", despawn_out_of_bounds);
}
