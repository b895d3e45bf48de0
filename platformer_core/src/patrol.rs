//! Enemy walking AI.
//!
//! Patrolling enemies walk at a constant speed, turn around when a solid
//! tile blocks the way, and optionally turn at ledges instead of walking off.

use crate::components::{Patrol, Position, Size, Velocity};
use crate::math::Vec2;
use crate::tile_grid::TileGrid;
use crate::world::World;

/// How far ahead of the leading edge walls and ledges are probed.
const PROBE: f32 = 0.5;

/// Set each patrolling entity's horizontal velocity for this frame.
pub fn update_patrols(world: &mut World, grid: &TileGrid) {
    let entities = world.entities_with::<(Patrol, Position, Size, Velocity)>();
    for entity in entities {
        let (Some(mut patrol), Some(position), Some(size)) = (
            world.get::<Patrol>(entity).copied(),
            world.get::<Position>(entity).copied(),
            world.get::<Size>(entity).copied(),
        ) else {
            continue;
        };

        if should_turn(grid, &patrol, &position, &size) {
            patrol.direction = -patrol.direction;
        }

        if let Some(p) = world.get_mut::<Patrol>(entity) {
            p.direction = patrol.direction;
        }
        if let Some(velocity) = world.get_mut::<Velocity>(entity) {
            velocity.vx = patrol.direction.signum() * patrol.speed;
        }
    }
}

fn should_turn(grid: &TileGrid, patrol: &Patrol, position: &Position, size: &Size) -> bool {
    let ahead_x = if patrol.direction >= 0.0 {
        position.x + size.width + PROBE
    } else {
        position.x - PROBE
    };

    let blocked = grid.is_solid_at(Vec2::new(ahead_x, position.y + size.height * 0.5));
    if blocked {
        return true;
    }

    if patrol.turn_at_ledges {
        let feet = position.y + size.height + PROBE;
        let standing = grid.is_solid_at(Vec2::new(position.x + size.width * 0.5, feet));
        let floor_ahead = grid.is_solid_at(Vec2::new(ahead_x, feet));
        return standing && !floor_ahead;
    }
    false
}
