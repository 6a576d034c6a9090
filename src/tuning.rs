//! Data-driven game balance
//!
//! Every number the simulation reads lives here so a build can be re-tuned
//! from settings without touching the tick code. Defaults come from [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Physics and obstacle-field parameters for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub gravity: f32,
    pub jump_force: f32,
    pub max_fall_speed: f32,
    pub ground_y: f32,
    pub grounded_epsilon: f32,

    pub player_x: f32,
    pub player_size: f32,
    pub hitbox_inset: f32,

    pub spawn_x: f32,
    pub obstacle_width: f32,
    pub obstacle_gap: f32,
    pub obstacle_min_height: f32,
    pub obstacle_height_range: f32,

    pub base_speed: f32,
    pub max_speed: f32,
    pub speed_step: f32,
    pub points_per_speedup: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_force: JUMP_FORCE,
            max_fall_speed: MAX_FALL_SPEED,
            ground_y: GROUND_Y,
            grounded_epsilon: GROUNDED_EPSILON,

            player_x: PLAYER_X,
            player_size: PLAYER_SIZE,
            hitbox_inset: PLAYER_HITBOX_INSET,

            spawn_x: SPAWN_X,
            obstacle_width: OBSTACLE_WIDTH,
            obstacle_gap: OBSTACLE_GAP,
            obstacle_min_height: OBSTACLE_MIN_HEIGHT,
            obstacle_height_range: OBSTACLE_HEIGHT_RANGE,

            base_speed: BASE_SPEED,
            max_speed: MAX_SPEED,
            speed_step: SPEED_STEP,
            points_per_speedup: POINTS_PER_SPEEDUP,
        }
    }
}

impl Tuning {
    /// Ticks the jump animation lasts: time to reach the apex and come back down
    pub fn jump_duration_ticks(&self) -> u32 {
        if self.gravity <= 0.0 {
            return 0;
        }
        (2.0 * self.jump_force / self.gravity).round() as u32
    }

    /// Scroll speed after `score` points have been earned
    pub fn speed_for_score(&self, score: u32) -> f32 {
        if self.points_per_speedup == 0 {
            return self.base_speed;
        }
        let steps = (score / self.points_per_speedup) as f32;
        (self.base_speed + steps * self.speed_step).min(self.max_speed)
    }

    /// Reject settings that would break simulation invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.gravity <= 0.0 {
            return Err(format!("gravity must be positive, got {}", self.gravity));
        }
        if self.max_fall_speed >= 0.0 {
            return Err(format!(
                "max_fall_speed must be negative, got {}",
                self.max_fall_speed
            ));
        }
        if self.base_speed <= 0.0 || self.max_speed < self.base_speed {
            return Err(format!(
                "speed range invalid: base {} max {}",
                self.base_speed, self.max_speed
            ));
        }
        if self.obstacle_width <= 0.0 || self.obstacle_height_range < 0.0 {
            return Err("obstacle dimensions must be positive".to_string());
        }
        if self.hitbox_inset * 2.0 >= self.player_size {
            return Err("hitbox inset swallows the whole player".to_string());
        }
        Ok(())
    }
}
