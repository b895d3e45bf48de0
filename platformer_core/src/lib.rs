//! Platformer Core - the simulation half of a tile-based 2D platformer.
//!
//! A typed component store, gravity and controller integration, swept tile
//! collision, quadtree-accelerated entity collision with stomp kills, and an
//! animation state machine driven by collision outcomes. Rendering, input,
//! audio and level loading live outside this crate.

pub mod animation;
pub mod components;
pub mod config;
pub mod entity_collision;
pub mod math;
pub mod patrol;
pub mod physics;
pub mod quadtree;
pub mod simulation;
pub mod tile_collision;
pub mod tile_grid;
pub mod world;

pub use crate::components::{
    Animation, AnimationClip, AnimationClips, AnimationState, CollisionInfo, Enemy, EntityType,
    Patrol, PlayerController, Position, Size, Sprite, SpriteVisual, TextureHandle, Velocity,
};
pub use crate::config::{AnimationConfig, CollisionConfig, ConfigError, PhysicsConfig, SimConfig};
pub use crate::entity_collision::{CollisionReport, Stomp};
pub use crate::math::{Rect, TextureRect, Vec2};
pub use crate::quadtree::{QuadEntry, Quadtree};
pub use crate::simulation::Simulation;
pub use crate::tile_grid::{GridCoord, GridError, TileGrid};
pub use crate::world::{ComponentTable, EntityId, Query, World};
