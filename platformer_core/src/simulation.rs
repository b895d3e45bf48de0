//! Per-frame driver for the simulation core.
//!
//! A level owns one `Simulation`. Each rendered frame the host writes input
//! into `PlayerController`s, calls [`Simulation::tick`], then renders from
//! the world's components.

use crate::animation::update_animations;
use crate::config::SimConfig;
use crate::entity_collision::{resolve_entities, CollisionReport};
use crate::patrol::update_patrols;
use crate::physics::{apply_gravity, apply_player_intent};
use crate::tile_collision::resolve_tiles;
use crate::tile_grid::TileGrid;
use crate::world::World;

pub struct Simulation {
    world: World,
    grid: TileGrid,
    config: SimConfig,
    frame: u64,
}

impl Simulation {
    pub fn new(grid: TileGrid, config: SimConfig) -> Self {
        Self {
            world: World::new(),
            grid,
            config,
            frame: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Frames stepped since the last level load.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Run one frame in the fixed order: intent and gravity, tile collision,
    /// entity collision, animation.
    ///
    /// The order is load-bearing: tile resolution is the only place positions
    /// move, and animation consumes the celebrations queued by stomps in
    /// the same frame. A non-positive or non-finite `dt` does nothing.
    pub fn tick(&mut self, dt: f32) -> CollisionReport {
        if !(dt.is_finite() && dt > 0.0) {
            return CollisionReport::default();
        }

        update_patrols(&mut self.world, &self.grid);
        apply_player_intent(&mut self.world, &self.config.physics);
        apply_gravity(&mut self.world, &self.config.physics, dt);

        resolve_tiles(&mut self.world, &self.grid, dt);

        let report = resolve_entities(&mut self.world, &self.grid, &self.config.collision, dt);

        update_animations(&mut self.world, &self.config.animation, dt);

        self.frame += 1;
        log::trace!(
            "frame {}: {} entities, {} candidate pairs, {} contacts, {} stomps",
            self.frame,
            self.world.len(),
            report.candidate_pairs,
            report.contacts,
            report.stomps.len()
        );
        report
    }

    /// Swap in a new level's grid and drop every entity from the old one.
    pub fn load_level(&mut self, grid: TileGrid) {
        self.grid = grid;
        self.clear();
    }

    /// Drop every entity; called on level exit.
    pub fn clear(&mut self) {
        self.world.clear();
        self.frame = 0;
    }
}
