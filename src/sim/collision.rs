//! Collision detection
//!
//! Everything is an axis-aligned box. The player's box is inset horizontally
//! from the sprite so grazing an obstacle corner does not end the run.

use glam::Vec2;

use super::state::{Actor, Obstacle};
use crate::tuning::Tuning;

/// Axis-aligned bounding box (y grows upward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Strict overlap on both axes; touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.max.x > other.min.x
            && self.min.x < other.max.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// The player's shrunk hitbox at the actor's current height
pub fn player_hitbox(actor: &Actor, tuning: &Tuning) -> Aabb {
    Aabb::new(
        Vec2::new(tuning.player_x + tuning.hitbox_inset, actor.y),
        Vec2::new(
            tuning.player_x + tuning.player_size - tuning.hitbox_inset,
            actor.y + tuning.player_size,
        ),
    )
}

/// An obstacle's box, standing on the ground
pub fn obstacle_box(obstacle: &Obstacle, tuning: &Tuning) -> Aabb {
    Aabb::new(
        Vec2::new(obstacle.x, tuning.ground_y),
        Vec2::new(obstacle.x + tuning.obstacle_width, tuning.ground_y + obstacle.height),
    )
}

/// True if the player overlaps any obstacle
pub fn collides(actor: &Actor, obstacles: &[Obstacle], tuning: &Tuning) -> bool {
    let player = player_hitbox(actor, tuning);
    obstacles
        .iter()
        .any(|o| player.overlaps(&obstacle_box(o, tuning)))
}
