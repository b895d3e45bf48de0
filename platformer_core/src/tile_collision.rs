//! Swept AABB resolution of entity motion against the tile grid.
//!
//! This is the only place positions are integrated from velocity. Motion is
//! resolved one axis at a time, X first and then Y using the resolved X, so
//! a box sliding along a floor never catches on the seams between tiles.

use crate::components::{Position, Size, Velocity};
use crate::math::Rect;
use crate::tile_grid::{GridCoord, TileGrid};
use crate::world::World;

/// Slack when deciding whether a tile lies ahead of the box or behind it.
const EDGE_EPSILON: f32 = 1e-3;

/// Position and velocity after one step of tile resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolved {
    pub position: Position,
    pub velocity: Velocity,
    pub hit_x: bool,
    pub hit_y: bool,
}

/// Resolve one timestep of motion for a single box.
///
/// The previous position is reconstructed as `candidate - velocity * dt`.
/// Each axis sweeps the tiles between the previous and candidate extents;
/// the nearest solid tile in the direction of travel stops the box flush
/// against its near edge and zeroes that velocity component. A box that
/// already overlaps a solid tile is snapped out of it too, provided the
/// tile's centre lies ahead of the box's centre on that axis. An axis with
/// zero velocity is not resolved. With an unusable grid (non-positive tile
/// size) the inputs are returned unchanged.
pub fn resolve_motion(
    grid: &TileGrid,
    position: Position,
    velocity: Velocity,
    size: Size,
    dt: f32,
) -> Resolved {
    let mut resolved = Resolved {
        position,
        velocity,
        hit_x: false,
        hit_y: false,
    };
    if !grid.is_usable() {
        return resolved;
    }

    let candidate_x = position.x + velocity.vx * dt;
    let candidate_y = position.y + velocity.vy * dt;
    let prev_x = candidate_x - velocity.vx * dt;
    let prev_y = candidate_y - velocity.vy * dt;

    resolved.position.x = candidate_x;
    if velocity.vx != 0.0 {
        let sweep = Rect::new(
            prev_x.min(candidate_x),
            prev_y,
            (prev_x - candidate_x).abs() + size.width,
            size.height,
        );
        let mut limit: Option<f32> = None;
        for coord in grid.solid_tiles_in(&sweep) {
            let tile = grid.tile_rect(coord);
            if !(tile.top() < prev_y + size.height && prev_y < tile.bottom()) {
                continue;
            }
            if velocity.vx > 0.0 {
                let ahead = tile.left() >= prev_x + size.width - EDGE_EPSILON
                    || tile.center().x > prev_x + size.width * 0.5;
                if ahead && tile.left() < candidate_x + size.width {
                    let stop = tile.left() - size.width;
                    limit = Some(limit.map_or(stop, |l| l.min(stop)));
                }
            } else {
                let ahead = tile.right() <= prev_x + EDGE_EPSILON
                    || tile.center().x < prev_x + size.width * 0.5;
                if ahead && tile.right() > candidate_x {
                    let stop = tile.right();
                    limit = Some(limit.map_or(stop, |l| l.max(stop)));
                }
            }
        }
        if let Some(x) = limit {
            resolved.position.x = x;
            resolved.velocity.vx = 0.0;
            resolved.hit_x = true;
        }
    }

    let x = resolved.position.x;
    resolved.position.y = candidate_y;
    if velocity.vy != 0.0 {
        let sweep = Rect::new(
            x,
            prev_y.min(candidate_y),
            size.width,
            (prev_y - candidate_y).abs() + size.height,
        );
        let mut limit: Option<f32> = None;
        for coord in grid.solid_tiles_in(&sweep) {
            let tile = grid.tile_rect(coord);
            if !(tile.left() < x + size.width && x < tile.right()) {
                continue;
            }
            if velocity.vy > 0.0 {
                let ahead = tile.top() >= prev_y + size.height - EDGE_EPSILON
                    || tile.center().y > prev_y + size.height * 0.5;
                if ahead && tile.top() < candidate_y + size.height {
                    let stop = tile.top() - size.height;
                    limit = Some(limit.map_or(stop, |l| l.min(stop)));
                }
            } else {
                let ahead = tile.bottom() <= prev_y + EDGE_EPSILON
                    || tile.center().y < prev_y + size.height * 0.5;
                if ahead && tile.bottom() > candidate_y {
                    let stop = tile.bottom();
                    limit = Some(limit.map_or(stop, |l| l.max(stop)));
                }
            }
        }
        if let Some(y) = limit {
            resolved.position.y = y;
            resolved.velocity.vy = 0.0;
            resolved.hit_y = true;
        }
    }

    resolved
}

/// Integrate and resolve every entity with Position, Velocity and Size.
pub fn resolve_tiles(world: &mut World, grid: &TileGrid, dt: f32) {
    let entities = world.entities_with::<(Position, Velocity, Size)>();
    for entity in entities {
        let (Some(position), Some(velocity), Some(size)) = (
            world.get::<Position>(entity).copied(),
            world.get::<Velocity>(entity).copied(),
            world.get::<Size>(entity).copied(),
        ) else {
            continue;
        };

        let resolved = resolve_motion(grid, position, velocity, size, dt);
        if let Some(p) = world.get_mut::<Position>(entity) {
            *p = resolved.position;
        }
        if let Some(v) = world.get_mut::<Velocity>(entity) {
            *v = resolved.velocity;
        }
    }
}

/// True if a solid tile top lies within `probe` pixels below the box's feet.
pub fn is_on_ground(grid: &TileGrid, position: &Position, size: &Size, probe: f32) -> bool {
    if !grid.is_usable() {
        return false;
    }
    let feet = position.y + size.height;
    let area = Rect::new(position.x, feet, size.width, probe.max(0.0));
    grid.solid_tiles_in(&area).into_iter().any(|coord| {
        let tile = grid.tile_rect(coord);
        tile.left() < position.x + size.width
            && position.x < tile.right()
            && tile.top() >= feet - EDGE_EPSILON
            && tile.top() <= feet + probe
    })
}

/// Top edge of the nearest solid tile at or below the bottom of `rect`,
/// searching the columns the rectangle spans.
pub fn find_floor_below(grid: &TileGrid, rect: &Rect) -> Option<f32> {
    if !grid.is_usable() || grid.column_of(rect.right() - EDGE_EPSILON) < 0 {
        return None;
    }
    let first_col = grid.column_of(rect.left()).max(0);
    let last_col = grid
        .column_of(rect.right() - EDGE_EPSILON)
        .max(first_col)
        .min(grid.width() as i32 - 1);
    let first_row = grid.row_of(rect.bottom()).max(0);

    (first_row..grid.height() as i32)
        .find(|&row| (first_col..=last_col).any(|col| grid.is_solid(GridCoord::new(col, row))))
        .map(|row| grid.tile_rect(GridCoord::new(first_col, row)).top())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: f32 = 16.0;

    fn wall_grid() -> TileGrid {
        TileGrid::from_rows(
            &[
                "..........",
                "......#...",
                "......#...",
                "..........",
                "##########",
            ],
            TILE,
        )
        .unwrap()
    }

    #[test]
    fn moving_right_stops_flush_against_wall() {
        let grid = wall_grid();
        let size = Size::new(12.0, 12.0);
        let mut position = Position::new(40.0, 18.0);
        let mut velocity = Velocity::new(120.0, 0.0);
        for _ in 0..60 {
            let r = resolve_motion(&grid, position, velocity, size, 1.0 / 60.0);
            position = r.position;
            velocity = r.velocity;
        }
        assert_eq!(position.x + size.width, 6.0 * TILE);
        assert_eq!(velocity.vx, 0.0);
        assert_eq!(position.y, 18.0);
    }

    #[test]
    fn moving_left_stops_at_right_edge() {
        let grid = wall_grid();
        let size = Size::new(12.0, 12.0);
        let r = resolve_motion(
            &grid,
            Position::new(115.0, 20.0),
            Velocity::new(-600.0, 0.0),
            size,
            0.1,
        );
        assert!(r.hit_x);
        assert_eq!(r.position.x, 7.0 * TILE);
        assert_eq!(r.velocity.vx, 0.0);
    }

    #[test]
    fn fast_mover_does_not_tunnel() {
        let grid = wall_grid();
        let size = Size::new(8.0, 8.0);
        let r = resolve_motion(
            &grid,
            Position::new(0.0, 20.0),
            Velocity::new(5000.0, 0.0),
            size,
            0.1,
        );
        assert_eq!(r.position.x, 6.0 * TILE - 8.0);
    }

    #[test]
    fn falling_lands_on_floor() {
        let grid = wall_grid();
        let size = Size::new(10.0, 14.0);
        let r = resolve_motion(
            &grid,
            Position::new(20.0, 40.0),
            Velocity::new(0.0, 400.0),
            size,
            0.1,
        );
        assert!(r.hit_y);
        assert_eq!(r.position.y + size.height, 4.0 * TILE);
        assert_eq!(r.velocity.vy, 0.0);
    }

    #[test]
    fn jumping_bumps_ceiling() {
        let grid = wall_grid();
        let size = Size::new(10.0, 10.0);
        let r = resolve_motion(
            &grid,
            Position::new(98.0, 50.0),
            Velocity::new(0.0, -300.0),
            size,
            0.1,
        );
        assert_eq!(r.position.y, 3.0 * TILE);
        assert_eq!(r.velocity.vy, 0.0);
    }

    #[test]
    fn sliding_along_floor_is_not_blocked() {
        let grid = wall_grid();
        let size = Size::new(10.0, 10.0);
        let resting_y = 4.0 * TILE - size.height;
        let r = resolve_motion(
            &grid,
            Position::new(0.0, resting_y),
            Velocity::new(100.0, 0.0),
            size,
            0.1,
        );
        assert!(!r.hit_x);
        assert_eq!(r.position, Position::new(10.0, resting_y));
    }

    #[test]
    fn diagonal_motion_resolves_x_before_y() {
        let grid = wall_grid();
        let size = Size::new(10.0, 10.0);
        // Heading down-right into the wall's left face and the floor.
        let r = resolve_motion(
            &grid,
            Position::new(80.0, 30.0),
            Velocity::new(200.0, 300.0),
            size,
            0.1,
        );
        assert!(r.hit_x);
        assert_eq!(r.position.x, 6.0 * TILE - size.width);
        assert!(r.hit_y);
        assert_eq!(r.position.y, 4.0 * TILE - size.height);
    }

    #[test]
    fn unusable_grid_passes_through() {
        let grid = TileGrid::empty(4, 4, 0.0);
        let position = Position::new(3.0, 4.0);
        let velocity = Velocity::new(50.0, -20.0);
        let r = resolve_motion(&grid, position, velocity, Size::new(4.0, 4.0), 0.5);
        assert_eq!(r.position, position);
        assert_eq!(r.velocity, velocity);
    }

    #[test]
    fn ground_check_detects_floor_contact() {
        let grid = wall_grid();
        let size = Size::new(10.0, 10.0);
        let on_floor = Position::new(20.0, 4.0 * TILE - size.height);
        assert!(is_on_ground(&grid, &on_floor, &size, 1.0));
        let airborne = Position::new(20.0, 4.0 * TILE - size.height - 5.0);
        assert!(!is_on_ground(&grid, &airborne, &size, 1.0));
    }

    #[test]
    fn floor_search_finds_nearest_solid_row() {
        let grid = wall_grid();
        assert_eq!(find_floor_below(&grid, &Rect::new(96.0, 0.0, 10.0, 10.0)), Some(TILE));
        assert_eq!(find_floor_below(&grid, &Rect::new(20.0, 0.0, 10.0, 10.0)), Some(4.0 * TILE));
        let open = TileGrid::from_rows(&["....", "...."], TILE).unwrap();
        assert_eq!(find_floor_below(&open, &Rect::new(0.0, 0.0, 8.0, 8.0)), None);
    }

    #[test]
    fn floor_search_ignores_rects_left_of_the_grid() {
        let grid = wall_grid();
        assert_eq!(find_floor_below(&grid, &Rect::new(-40.0, 20.0, 12.0, 12.0)), None);
        assert_eq!(find_floor_below(&grid, &Rect::new(-6.0, 20.0, 12.0, 12.0)), Some(4.0 * TILE));
    }

    #[test]
    fn box_embedded_in_wall_is_snapped_out() {
        let grid = wall_grid();
        let size = Size::new(12.0, 12.0);
        // Right edge 3px past the wall's left face.
        let mut position = Position::new(6.0 * TILE - size.width + 3.0, 18.0);
        let mut velocity = Velocity::new(120.0, 0.0);
        for _ in 0..30 {
            let r = resolve_motion(&grid, position, velocity, size, 1.0 / 60.0);
            position = r.position;
            velocity = r.velocity;
            velocity.vx = 120.0;
        }
        assert_eq!(position.x + size.width, 6.0 * TILE);
    }

    #[test]
    fn box_embedded_from_the_right_is_snapped_out_moving_left() {
        let grid = wall_grid();
        let size = Size::new(12.0, 12.0);
        let r = resolve_motion(
            &grid,
            Position::new(7.0 * TILE - 4.0, 18.0),
            Velocity::new(-60.0, 0.0),
            size,
            0.1,
        );
        assert!(r.hit_x);
        assert_eq!(r.position.x, 7.0 * TILE);
    }

    #[test]
    fn box_sunk_into_floor_is_lifted_while_falling() {
        let grid = wall_grid();
        let size = Size::new(10.0, 10.0);
        let r = resolve_motion(
            &grid,
            Position::new(20.0, 4.0 * TILE - 7.0),
            Velocity::new(0.0, 50.0),
            size,
            0.1,
        );
        assert!(r.hit_y);
        assert_eq!(r.position.y, 4.0 * TILE - size.height);
    }

    #[test]
    fn system_writes_back_components() {
        let grid = wall_grid();
        let mut world = World::new();
        let e = world.create_entity();
        world.add(e, Position::new(20.0, 40.0));
        world.add(e, Velocity::new(0.0, 400.0));
        world.add(e, Size::new(10.0, 14.0));
        resolve_tiles(&mut world, &grid, 0.1);
        assert_eq!(world.get::<Position>(e).unwrap().y, 4.0 * TILE - 14.0);
        assert_eq!(world.get::<Velocity>(e).unwrap().vy, 0.0);
    }
}
