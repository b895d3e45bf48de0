//! Entity-vs-entity collision: quadtree broadphase, AABB narrowphase and
//! player-centric response.
//!
//! The pass runs after tile resolution. Contacts are flagged on both sides,
//! players are pushed out of whatever they overlap, and falling players that
//! land on an enemy record a stomp. Stomps are collected during the pair scan
//! and applied only once the scan is finished, so no entity disappears while
//! the candidate lists still refer to it.

use std::collections::HashSet;

use crate::components::{
    bounds, Animation, CollisionInfo, EntityType, PlayerController, Position, Size, Velocity,
};
use crate::config::CollisionConfig;
use crate::math::Rect;
use crate::quadtree::{QuadEntry, Quadtree};
use crate::tile_collision::{find_floor_below, is_on_ground, resolve_motion};
use crate::tile_grid::TileGrid;
use crate::world::{EntityId, World};

/// A player landing on an enemy during this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stomp {
    pub player: EntityId,
    pub enemy: EntityId,
}

/// Summary of one entity collision pass, for the driver's game rules.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionReport {
    /// Broadphase pairs handed to the narrowphase.
    pub candidate_pairs: usize,
    /// Pairs whose boxes actually overlapped.
    pub contacts: usize,
    /// Stomps applied this frame, in detection order.
    pub stomps: Vec<Stomp>,
}

#[derive(Clone, Copy)]
struct Body {
    id: EntityId,
    kind: EntityType,
    size: Size,
}

/// Run one entity collision pass over every entity with Position, Size,
/// CollisionInfo and EntityType.
pub fn resolve_entities(
    world: &mut World,
    grid: &TileGrid,
    config: &CollisionConfig,
    dt: f32,
) -> CollisionReport {
    let mut report = CollisionReport::default();

    let mut ids = world.entities_with::<(Position, Size, CollisionInfo, EntityType)>();
    ids.sort();

    let mut bodies = Vec::with_capacity(ids.len());
    let mut tree = Quadtree::with_limits(
        grid.world_bounds(),
        config.quadtree_max_objects,
        config.quadtree_max_levels,
    );
    for id in ids {
        let (Some(position), Some(size), Some(kind)) = (
            world.get::<Position>(id).copied(),
            world.get::<Size>(id).copied(),
            world.get::<EntityType>(id).copied(),
        ) else {
            continue;
        };
        if let Some(info) = world.get_mut::<CollisionInfo>(id) {
            *info = CollisionInfo::default();
        }
        tree.insert(bounds(&position, &size), bodies.len());
        bodies.push(Body { id, kind, size });
    }

    let mut candidates: Vec<QuadEntry> = Vec::new();
    let mut stomps: Vec<Stomp> = Vec::new();
    let mut stomped_enemies: HashSet<EntityId> = HashSet::new();

    for i in 0..bodies.len() {
        let Some(rect_i) = current_rect(world, &bodies[i]) else {
            continue;
        };
        candidates.clear();
        tree.retrieve(&mut candidates, &rect_i);

        for candidate in &candidates {
            let j = candidate.payload;
            if j <= i {
                continue;
            }
            report.candidate_pairs += 1;

            let (Some(a), Some(b)) = (
                current_rect(world, &bodies[i]),
                current_rect(world, &bodies[j]),
            ) else {
                continue;
            };
            if !a.intersects(&b) {
                continue;
            }
            report.contacts += 1;
            mark_contact(world, bodies[i].id, bodies[j].kind);
            mark_contact(world, bodies[j].id, bodies[i].kind);

            let (player, other) = if bodies[i].kind == EntityType::Player {
                (bodies[i], bodies[j])
            } else if bodies[j].kind == EntityType::Player {
                (bodies[j], bodies[i])
            } else {
                continue;
            };

            if other.kind.is_enemy()
                && !stomped_enemies.contains(&other.id)
                && is_stomp(world, &player, &other, config.stomp_epsilon, dt)
            {
                stomped_enemies.insert(other.id);
                stomps.push(Stomp {
                    player: player.id,
                    enemy: other.id,
                });
                continue;
            }

            push_out(world, grid, &player, &other);
        }
    }

    let mut stomping_players = HashSet::new();
    for stomp in &stomps {
        if apply_stomp(world, grid, stomp) {
            stomping_players.insert(stomp.player);
            report.stomps.push(*stomp);
        }
    }

    update_ground_contact(world, grid, config, &stomping_players);
    report
}

fn current_rect(world: &World, body: &Body) -> Option<Rect> {
    let position = world.get::<Position>(body.id)?;
    Some(bounds(position, &body.size))
}

fn mark_contact(world: &mut World, entity: EntityId, other_type: EntityType) {
    if let Some(info) = world.get_mut::<CollisionInfo>(entity) {
        info.collided = true;
        info.other_type = other_type;
    }
}

/// A falling player whose bottom edge, one frame ago, was at or above the
/// enemy's top edge (within `epsilon`).
fn is_stomp(world: &World, player: &Body, enemy: &Body, epsilon: f32, dt: f32) -> bool {
    let (Some(position), Some(velocity), Some(enemy_position)) = (
        world.get::<Position>(player.id),
        world.get::<Velocity>(player.id),
        world.get::<Position>(enemy.id),
    ) else {
        return false;
    };
    if velocity.vy <= 0.0 {
        return false;
    }
    let previous_bottom = position.y - velocity.vy * dt + player.size.height;
    previous_bottom <= enemy_position.y + epsilon
}

/// Push the player out of `other` along the axis of least overlap. A push
/// against the player's motion on that axis zeroes that velocity component.
///
/// The push is swept against the tile grid like any other motion, so a
/// player pinned against a wall stays flush with it.
fn push_out(world: &mut World, grid: &TileGrid, player: &Body, other: &Body) {
    let (Some(player_rect), Some(other_rect)) =
        (current_rect(world, player), current_rect(world, other))
    else {
        return;
    };
    let overlap = player_rect.overlap(&other_rect);
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return;
    }

    let player_center = player_rect.center();
    let other_center = other_rect.center();
    let push_x = overlap.x < overlap.y;
    let direction = if push_x {
        if player_center.x < other_center.x {
            -1.0
        } else {
            1.0
        }
    } else if player_center.y < other_center.y {
        -1.0
    } else {
        1.0
    };

    let push = if push_x {
        Velocity::new(direction * overlap.x, 0.0)
    } else {
        Velocity::new(0.0, direction * overlap.y)
    };
    if let Some(position) = world.get_mut::<Position>(player.id) {
        *position = if grid.is_usable() {
            resolve_motion(grid, *position, push, player.size, 1.0).position
        } else {
            Position::new(position.x + push.vx, position.y + push.vy)
        };
    }
    if let Some(velocity) = world.get_mut::<Velocity>(player.id) {
        if push_x && velocity.vx * direction < 0.0 {
            velocity.vx = 0.0;
        } else if !push_x && velocity.vy * direction < 0.0 {
            velocity.vy = 0.0;
        }
    }
}

/// Land the player on the floor under the enemy and remove the enemy.
/// Returns false if either side vanished earlier in the frame.
fn apply_stomp(world: &mut World, grid: &TileGrid, stomp: &Stomp) -> bool {
    let (Some(enemy_position), Some(enemy_size), Some(player_size)) = (
        world.get::<Position>(stomp.enemy).copied(),
        world.get::<Size>(stomp.enemy).copied(),
        world.get::<Size>(stomp.player).copied(),
    ) else {
        return false;
    };
    if !world.has::<Position>(stomp.player) {
        return false;
    }

    let enemy_rect = bounds(&enemy_position, &enemy_size);
    let landing_y = match find_floor_below(grid, &enemy_rect) {
        Some(floor_top) => floor_top - player_size.height,
        None => enemy_position.y - player_size.height,
    };

    if let Some(position) = world.get_mut::<Position>(stomp.player) {
        position.y = landing_y;
    }
    if let Some(velocity) = world.get_mut::<Velocity>(stomp.player) {
        velocity.vy = 0.0;
    }
    if let Some(controller) = world.get_mut::<PlayerController>(stomp.player) {
        controller.grounded = true;
        controller.jump_count = 0;
    }
    if let Some(animation) = world.get_mut::<Animation>(stomp.player) {
        animation.request_celebrate();
    }

    world.despawn(stomp.enemy);
    log::info!(
        "entity {} stomped enemy {}",
        stomp.player.to_u32(),
        stomp.enemy.to_u32()
    );
    true
}

/// Refresh `grounded` on every controller and give back the jumps of any
/// player standing on a solid tile.
fn update_ground_contact(
    world: &mut World,
    grid: &TileGrid,
    config: &CollisionConfig,
    stomping_players: &HashSet<EntityId>,
) {
    let players = world.entities_with::<(PlayerController, Position, Size)>();
    for player in players {
        let (Some(position), Some(size)) = (
            world.get::<Position>(player).copied(),
            world.get::<Size>(player).copied(),
        ) else {
            continue;
        };
        let on_ground = is_on_ground(grid, &position, &size, config.ground_probe);
        if let Some(controller) = world.get_mut::<PlayerController>(player) {
            if on_ground {
                controller.jump_count = 0;
            }
            controller.grounded = on_ground || stomping_players.contains(&player);
        }
    }
}
