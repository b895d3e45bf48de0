//! Built-in components for platformer entities.
//!
//! A spawner attaches Position, Velocity, Size, EntityType, CollisionInfo,
//! Sprite and Animation together; enemies additionally carry the `Enemy`
//! marker and the player carries a `PlayerController`.

use serde::{Deserialize, Serialize};

use crate::math::{Rect, TextureRect, Vec2};

/// Top-left corner of the entity in world pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Velocity in pixels per second. Positive `vy` points down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

impl Velocity {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// World-space bounding box of an entity.
pub fn bounds(position: &Position, size: &Size) -> Rect {
    Rect::new(position.x, position.y, size.width, size.height)
}

/// Gameplay kind of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Player,
    Goomba,
    Koopa,
    #[default]
    Unknown,
}

impl EntityType {
    pub fn is_enemy(self) -> bool {
        matches!(self, EntityType::Goomba | EntityType::Koopa)
    }
}

/// Result of the most recent entity collision pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionInfo {
    pub collided: bool,
    pub other_type: EntityType,
}

/// Marks an entity as an enemy.
#[derive(Clone, Copy, Debug, Default)]
pub struct Enemy;

/// Opaque handle to a texture owned by the render collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// What a sprite draws: a flat-colored shape or a region of a texture.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SpriteVisual {
    Shape { color: [f32; 4] },
    Texture(TextureHandle),
}

/// Visual representation of an entity, read by render systems.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub visual: SpriteVisual,
    /// Offset of the drawn quad relative to the entity position.
    pub offset: Vec2,
    /// Drawn size in world pixels.
    pub size: Vec2,
    pub sub_rect: TextureRect,
}

impl Sprite {
    pub fn shape(color: [f32; 4], size: Vec2) -> Self {
        Self {
            visual: SpriteVisual::Shape { color },
            offset: Vec2::ZERO,
            size,
            sub_rect: TextureRect::default(),
        }
    }

    pub fn texture(texture: TextureHandle, size: Vec2) -> Self {
        Self {
            visual: SpriteVisual::Texture(texture),
            offset: Vec2::ZERO,
            size,
            sub_rect: TextureRect::default(),
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }
}

/// Animation states. Celebrate is a one-shot; the others loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationState {
    #[default]
    Idle,
    Run,
    Jump,
    Celebrate,
}

impl AnimationState {
    pub fn is_one_shot(self) -> bool {
        matches!(self, AnimationState::Celebrate)
    }
}

/// Per-entity animation playback state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub state: AnimationState,
    pub current_frame: u32,
    pub frame_timer: f32,
    /// Seconds each frame is shown.
    pub frame_duration: f32,
    pub frame_count: u32,
    pub flip_x: bool,
    /// Set when the sprite sub-rectangle must be rebuilt.
    pub needs_rect_update: bool,
    pub is_one_shot: bool,
    /// Number of pending one-shot (Celebrate) plays.
    pub one_shot_queue: u32,
    /// Suppresses frame advancement for the first tick of a new state.
    pub just_started: bool,
}

impl Animation {
    pub fn new(frame_count: u32, frame_duration: f32) -> Self {
        Self {
            state: AnimationState::Idle,
            current_frame: 0,
            frame_timer: 0.0,
            frame_duration,
            frame_count,
            flip_x: false,
            needs_rect_update: true,
            is_one_shot: false,
            one_shot_queue: 0,
            just_started: false,
        }
    }

    /// Queue one Celebrate play.
    pub fn request_celebrate(&mut self) {
        self.one_shot_queue += 1;
    }
}

impl Default for Animation {
    fn default() -> Self {
        Self::new(1, 0.1)
    }
}

/// Frame layout of one animation state on a sprite sheet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub texture: Option<TextureHandle>,
    pub frame_count: u32,
    pub frame_duration: f32,
    pub frame_width: i32,
    pub frame_height: i32,
    /// Sheet row (in frames) the clip starts on.
    pub row: i32,
}

impl AnimationClip {
    pub fn new(frame_count: u32, frame_duration: f32, frame_width: i32, frame_height: i32) -> Self {
        Self {
            texture: None,
            frame_count,
            frame_duration,
            frame_width,
            frame_height,
            row: 0,
        }
    }

    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_row(mut self, row: i32) -> Self {
        self.row = row;
        self
    }
}

/// Clips for every animation state of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationClips {
    pub idle: AnimationClip,
    pub run: AnimationClip,
    pub jump: AnimationClip,
    pub celebrate: AnimationClip,
}

impl AnimationClips {
    /// Use the same clip for every state.
    pub fn uniform(clip: AnimationClip) -> Self {
        Self {
            idle: clip,
            run: clip,
            jump: clip,
            celebrate: clip,
        }
    }

    pub fn get(&self, state: AnimationState) -> &AnimationClip {
        match state {
            AnimationState::Idle => &self.idle,
            AnimationState::Run => &self.run,
            AnimationState::Jump => &self.jump,
            AnimationState::Celebrate => &self.celebrate,
        }
    }
}

/// Movement intent written by the input collaborator, plus jump bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerController {
    /// -1.0 (left) to 1.0 (right).
    pub move_axis: f32,
    pub jump_requested: bool,
    /// Animation state the controller wants; wins over velocity-derived state.
    pub requested_state: Option<AnimationState>,
    /// Jumps performed since the player last stood on the ground.
    pub jump_count: u32,
    pub grounded: bool,
    /// Last horizontal direction asked for; kept while `move_axis` is zero.
    pub facing_left: bool,
}

/// Walking AI for enemies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patrol {
    pub speed: f32,
    /// -1.0 walks left, 1.0 walks right.
    pub direction: f32,
    pub turn_at_ledges: bool,
}

impl Patrol {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            direction: -1.0,
            turn_at_ledges: false,
        }
    }

    pub fn turning_at_ledges(mut self) -> Self {
        self.turn_at_ledges = true;
        self
    }
}
