use crate::components::{
    Animation, AnimationClip, AnimationClips, AnimationState, PlayerController, Sprite,
    SpriteVisual, Velocity,
};
use crate::config::AnimationConfig;
use crate::math::TextureRect;
use crate::world::World;

/// The state an entity "wants" this frame: the controller's request if it
/// has one, otherwise Run or Idle from horizontal speed.
pub fn derive_state(
    controller: Option<&PlayerController>,
    velocity: Option<&Velocity>,
    config: &AnimationConfig,
) -> AnimationState {
    if let Some(requested) = controller.and_then(|c| c.requested_state) {
        return requested;
    }
    match velocity {
        Some(v) if v.vx.abs() > config.run_threshold => AnimationState::Run,
        _ => AnimationState::Idle,
    }
}

impl Animation {
    /// Advance the state machine by one tick.
    ///
    /// A playing one-shot ignores `derived` until it finishes. Otherwise a
    /// queued one-shot is consumed and forces Celebrate; failing that the
    /// animation follows `derived`. Returns true if the state changed.
    pub fn tick(
        &mut self,
        derived: AnimationState,
        dt: f32,
        clips: Option<&AnimationClips>,
    ) -> bool {
        let before = self.state;

        let target = if self.is_one_shot {
            None
        } else if self.one_shot_queue > 0 {
            self.one_shot_queue -= 1;
            Some(AnimationState::Celebrate)
        } else {
            Some(derived)
        };
        if let Some(target) = target {
            if target != self.state {
                self.enter(target, clips.map(|c| c.get(target)));
            }
        }

        self.advance(dt, clips);
        self.state != before
    }

    /// Switch to `state`, restarting from its first frame. The first tick in
    /// the new state does not advance frames.
    pub fn enter(&mut self, state: AnimationState, clip: Option<&AnimationClip>) {
        log::debug!("animation {:?} -> {:?}", self.state, state);
        self.state = state;
        self.current_frame = 0;
        self.frame_timer = 0.0;
        self.is_one_shot = state.is_one_shot();
        self.just_started = true;
        self.needs_rect_update = true;
        if let Some(clip) = clip {
            self.frame_count = clip.frame_count;
            self.frame_duration = clip.frame_duration;
        }
    }

    /// Update facing from a horizontal direction. Zero keeps the current facing.
    pub fn face(&mut self, horizontal: f32) {
        let flip = if horizontal < 0.0 {
            true
        } else if horizontal > 0.0 {
            false
        } else {
            return;
        };
        if flip != self.flip_x {
            self.flip_x = flip;
            self.needs_rect_update = true;
        }
    }

    fn advance(&mut self, dt: f32, clips: Option<&AnimationClips>) {
        if self.just_started {
            self.just_started = false;
            return;
        }
        if self.frame_duration <= 0.0 {
            return;
        }

        self.frame_timer += dt;
        while self.frame_timer >= self.frame_duration {
            self.frame_timer -= self.frame_duration;
            if !self.step_frame(clips) {
                break;
            }
        }
    }

    /// Move to the next frame. Returns false once a finished one-shot has
    /// handed back to Idle.
    fn step_frame(&mut self, clips: Option<&AnimationClips>) -> bool {
        let count = self.frame_count.max(1);
        self.needs_rect_update = true;

        if !self.is_one_shot {
            self.current_frame = (self.current_frame + 1) % count;
            return true;
        }
        if self.current_frame + 1 < count {
            self.current_frame += 1;
            return true;
        }
        if self.one_shot_queue > 0 {
            self.one_shot_queue -= 1;
            self.current_frame = 0;
            return true;
        }

        self.one_shot_queue = 0;
        self.enter(AnimationState::Idle, clips.map(|c| c.get(AnimationState::Idle)));
        false
    }

    /// Sub-rectangle of the current frame. Mirrored frames carry a negative
    /// width and start at the frame's right edge.
    pub fn frame_rect(&self, frame_width: i32, frame_height: i32, row: i32) -> TextureRect {
        let left = self.current_frame as i32 * frame_width;
        let top = row * frame_height;
        if self.flip_x {
            TextureRect::new(left + frame_width, top, -frame_width, frame_height)
        } else {
            TextureRect::new(left, top, frame_width, frame_height)
        }
    }
}

/// Step every entity with an `Animation` and refresh its sprite.
///
/// Must run after entity collision: celebrations queued by stomps this frame
/// are picked up here.
pub fn update_animations(world: &mut World, config: &AnimationConfig, dt: f32) {
    let entities = world.entities_with::<(Animation,)>();
    for entity in entities {
        let controller = world.get::<PlayerController>(entity).copied();
        let velocity = world.get::<Velocity>(entity).copied();
        let clips = world.get::<AnimationClips>(entity).copied();
        let derived = derive_state(controller.as_ref(), velocity.as_ref(), config);
        let facing = match (controller, velocity) {
            (Some(c), _) if c.move_axis != 0.0 => c.move_axis,
            (Some(c), _) => if c.facing_left { -1.0 } else { 1.0 },
            (_, Some(v)) => v.vx,
            _ => 0.0,
        };

        let Some(animation) = world.get_mut::<Animation>(entity) else {
            continue;
        };
        let changed = animation.tick(derived, dt, clips.as_ref());
        animation.face(facing);
        if !animation.needs_rect_update && !changed {
            continue;
        }
        animation.needs_rect_update = false;
        let snapshot = animation.clone();

        if let Some(sprite) = world.get_mut::<Sprite>(entity) {
            refresh_sprite(sprite, &snapshot, clips.as_ref().map(|c| c.get(snapshot.state)));
        }
    }
}

fn refresh_sprite(sprite: &mut Sprite, animation: &Animation, clip: Option<&AnimationClip>) {
    let (width, height, row) = match clip {
        Some(clip) => {
            if let Some(texture) = clip.texture {
                sprite.visual = SpriteVisual::Texture(texture);
            }
            (clip.frame_width, clip.frame_height, clip.row)
        }
        None => (sprite.size.x as i32, sprite.size.y as i32, 0),
    };
    sprite.sub_rect = animation.frame_rect(width, height, row);
}
