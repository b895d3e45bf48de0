//! Tunable simulation constants.
//!
//! Every value has a working default; hosts may override them from JSON.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quadtree::{MAX_LEVELS, MAX_OBJECTS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be {requirement}, got {value}")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },
}

/// Gravity and player movement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration in pixels/sec².
    pub gravity: f32,
    /// Terminal falling speed in pixels/sec.
    pub max_fall_speed: f32,
    pub run_speed: f32,
    /// Initial upward speed of a jump.
    pub jump_speed: f32,
    /// Jumps allowed before touching ground again (2 = double jump).
    pub max_jumps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 1500.0,
            max_fall_speed: 900.0,
            run_speed: 200.0,
            jump_speed: 550.0,
            max_jumps: 2,
        }
    }
}

/// Entity collision and broadphase tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// How far (pixels) the player's previous bottom may sit below an
    /// enemy's top and still count as a stomp.
    pub stomp_epsilon: f32,
    /// Distance below the feet probed by the ground check.
    pub ground_probe: f32,
    pub quadtree_max_objects: usize,
    pub quadtree_max_levels: u32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            stomp_epsilon: 2.0,
            ground_probe: 1.0,
            quadtree_max_objects: MAX_OBJECTS,
            quadtree_max_levels: MAX_LEVELS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Horizontal speed above which a controller-less entity counts as running.
    pub run_threshold: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { run_threshold: 1.0 }
    }
}

/// All tunables of the simulation core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub collision: CollisionConfig,
    pub animation: AnimationConfig,
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override gravity (pixels/sec²).
    #[must_use]
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.physics.gravity = gravity;
        self
    }

    /// Override the stomp tolerance in pixels.
    #[must_use]
    pub fn with_stomp_epsilon(mut self, epsilon: f32) -> Self {
        self.collision.stomp_epsilon = epsilon;
        self
    }

    /// Override the broadphase node capacity and depth.
    #[must_use]
    pub fn with_quadtree_limits(mut self, max_objects: usize, max_levels: u32) -> Self {
        self.collision.quadtree_max_objects = max_objects;
        self.collision.quadtree_max_levels = max_levels;
        self
    }

    /// Parse and validate a config from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize this config to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json).map_err(|err| {
            log::warn!("rejecting config {}: {err}", path.display());
            err
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("physics.gravity", self.physics.gravity)?;
        non_negative("physics.max_fall_speed", self.physics.max_fall_speed)?;
        non_negative("physics.run_speed", self.physics.run_speed)?;
        non_negative("physics.jump_speed", self.physics.jump_speed)?;
        non_negative("collision.stomp_epsilon", self.collision.stomp_epsilon)?;
        non_negative("collision.ground_probe", self.collision.ground_probe)?;
        non_negative("animation.run_threshold", self.animation.run_threshold)?;
        if self.collision.quadtree_max_objects == 0 {
            return Err(ConfigError::OutOfRange {
                field: "collision.quadtree_max_objects",
                requirement: "at least 1",
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            requirement: "finite and non-negative",
            value: value as f64,
        })
    }
}
