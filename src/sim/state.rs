//! Game state and core simulation types
//!
//! One `GameState` is the whole aggregate of a running session. It is rebuilt
//! from scratch on every start/retry.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::obstacles::ObstacleField;
use crate::tuning::Tuning;

/// The player character (vertical axis only, horizontal position is fixed)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Bottom edge, measured up from the bottom of the playfield
    pub y: f32,
    /// Vertical velocity (positive = up), units per tick
    pub vy: f32,
    pub airborne: bool,
    /// Remaining ticks of the jump animation (presentation only)
    #[serde(default)]
    pub jump_ticks: u32,
}

impl Actor {
    /// Actor standing still on the ground
    pub fn grounded(ground_y: f32) -> Self {
        Self {
            y: ground_y,
            vy: 0.0,
            airborne: false,
            jump_ticks: 0,
        }
    }

    /// Whether the jump pose should be shown
    pub fn is_jumping(&self) -> bool {
        self.jump_ticks > 0
    }
}

/// A ground obstacle scrolling toward the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Session-scoped, monotonically increasing
    pub id: u32,
    /// Left edge
    pub x: f32,
    pub height: f32,
    /// Set once the obstacle has been counted as passed
    #[serde(default)]
    pub scored: bool,
}

/// Complete state of one session (deterministic given seed and inputs)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub actor: Actor,
    pub field: ObstacleField,
    pub score: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
}

impl GameState {
    /// Create a fresh session state with the given seed
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            actor: Actor::grounded(tuning.ground_y),
            field: ObstacleField::new(tuning.base_speed),
            score: 0,
            time_ticks: 0,
        }
    }

    /// Current scroll speed
    pub fn speed(&self) -> f32 {
        self.field.speed()
    }
}
