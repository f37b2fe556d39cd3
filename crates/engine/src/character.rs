use bitflags::bitflags;

use crate::collision::{move_and_resolve, TieBreak};
use crate::geometry::{Axis, Rect, Vec2};
use crate::level::LevelLayer;

bitflags! {
    /// Horizontal movement the player is currently asking for.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct MovementIntent: u8 {
        const MOVE_LEFT = 1 << 0;
        const MOVE_RIGHT = 1 << 1;
    }
}

bitflags! {
    /// Hitbox edges resting against solid geometry after the last tick.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct CollisionSides: u8 {
        const TOP = 1 << 0;
        const BOTTOM = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl CollisionSides {
    /// `(negative, positive)` side bits for movement along `axis`.
    pub fn for_axis(axis: Axis) -> (CollisionSides, CollisionSides) {
        match axis {
            Axis::X => (CollisionSides::LEFT, CollisionSides::RIGHT),
            Axis::Y => (CollisionSides::TOP, CollisionSides::BOTTOM),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Character {
    pub(crate) hitbox: Rect,
    pub(crate) velocity: Vec2,
    pub(crate) intent: MovementIntent,
    pub(crate) collision_sides: CollisionSides,
    speed: f32,
    jump_strength: f32,
}

impl Character {
    pub fn new(hitbox: Rect, speed: f32, jump_strength: f32) -> Self {
        Self {
            hitbox,
            velocity: Vec2::ZERO,
            intent: MovementIntent::empty(),
            collision_sides: CollisionSides::empty(),
            speed,
            jump_strength,
        }
    }

    pub fn hitbox(&self) -> Rect {
        self.hitbox
    }

    pub fn position(&self) -> Vec2 {
        self.hitbox.position()
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.hitbox.set_position(position);
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn movement_intent(&self) -> MovementIntent {
        self.intent
    }

    pub fn collision_sides(&self) -> CollisionSides {
        self.collision_sides
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn jump_strength(&self) -> f32 {
        self.jump_strength
    }

    pub fn set_movement_intent(&mut self, intent: MovementIntent) {
        self.intent |= intent;
    }

    pub fn unset_movement_intent(&mut self, intent: MovementIntent) {
        self.intent &= !intent;
    }

    pub fn intent_step(&self) -> f32 {
        let mut step = 0.0;
        if self.intent.contains(MovementIntent::MOVE_RIGHT) {
            step += self.speed;
        }
        if self.intent.contains(MovementIntent::MOVE_LEFT) {
            step -= self.speed;
        }
        step
    }

    pub fn apply_gravity(&mut self, gravity: f32) {
        self.velocity.y += gravity;
    }

    pub fn clamp_velocity(&mut self, max_speed: f32) {
        self.velocity.x = self.velocity.x.clamp(-max_speed, max_speed);
        self.velocity.y = self.velocity.y.clamp(-max_speed, max_speed);
    }

    /// Only possible while standing on something.
    pub fn jump(&mut self) -> bool {
        if !self.collision_sides.contains(CollisionSides::BOTTOM) {
            return false;
        }
        self.velocity.y -= self.jump_strength;
        true
    }

    /// Vertical axis first.
    pub fn tick(&mut self, layers: &[LevelLayer], max_velocity: f32) {
        self.tick_with(layers, max_velocity, TieBreak::LastCandidate);
    }

    pub fn tick_with(&mut self, layers: &[LevelLayer], max_velocity: f32, tie_break: TieBreak) {
        self.clamp_velocity(max_velocity);
        move_and_resolve(self, Axis::Y, layers, tie_break);
        move_and_resolve(self, Axis::X, layers, tie_break);
    }
}
