//! Velocity integration: controller intent and gravity.
//!
//! Nothing here moves an entity. Positions are integrated from velocity only
//! by the tile collision resolver.

use crate::components::{PlayerController, Position, Velocity};
use crate::config::PhysicsConfig;
use crate::world::{EntityId, World};

/// Turn controller intent into velocity: horizontal run speed and jumps.
///
/// A jump request is consumed whether or not it fires; it fires only while
/// the controller has jumps left (`jump_count < max_jumps`).
pub fn apply_player_intent(world: &mut World, config: &PhysicsConfig) {
    let entities = world.entities_with::<(PlayerController, Velocity)>();
    for entity in entities {
        let Some(controller) = world.get::<PlayerController>(entity).copied() else {
            continue;
        };
        let mut jumped = false;
        if let Some(velocity) = world.get_mut::<Velocity>(entity) {
            velocity.vx = controller.move_axis.clamp(-1.0, 1.0) * config.run_speed;
            if controller.jump_requested && controller.jump_count < config.max_jumps {
                velocity.vy = -config.jump_speed;
                jumped = true;
            }
        }
        if let Some(controller) = world.get_mut::<PlayerController>(entity) {
            controller.jump_requested = false;
            if controller.move_axis != 0.0 {
                controller.facing_left = controller.move_axis < 0.0;
            }
            if jumped {
                controller.jump_count += 1;
                controller.grounded = false;
            }
        }
    }
}

/// Accelerate every moving body downwards, clamped to the terminal speed.
pub fn apply_gravity(world: &mut World, config: &PhysicsConfig, dt: f32) {
    let entities: Vec<EntityId> = world.entities_with::<(Position, Velocity)>();
    for entity in entities {
        if let Some(velocity) = world.get_mut::<Velocity>(entity) {
            velocity.vy = (velocity.vy + config.gravity * dt).min(config.max_fall_speed);
        }
    }
}
