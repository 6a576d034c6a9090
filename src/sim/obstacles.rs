//! Scrolling obstacle field
//!
//! Obstacles are kept in spawn order: the last element is always the newest
//! and right-most, which is what the spawn gap check looks at.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::Obstacle;
use crate::tuning::Tuning;

/// Slack on the trailing side of the pass window for float drift
const PASS_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    next_id: u32,
    speed: f32,
}

impl ObstacleField {
    pub fn new(base_speed: f32) -> Self {
        Self {
            obstacles: Vec::new(),
            next_id: 0,
            speed: base_speed,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Current scroll speed (units per tick)
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Place an obstacle directly (tests and scripted layouts)
    pub fn push(&mut self, x: f32, height: f32) -> u32 {
        let id = self.allocate_id();
        self.obstacles.push(Obstacle {
            id,
            x,
            height,
            scored: false,
        });
        id
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Scroll everything left by the current speed and drop obstacles that
    /// have fully left the screen.
    pub fn advance(&mut self, width: f32) {
        let speed = self.speed;
        for obstacle in &mut self.obstacles {
            obstacle.x -= speed;
        }
        self.obstacles.retain(|o| o.x > -width);
    }

    /// Spawn at most one obstacle at the spawn edge once the newest one has
    /// opened up a full gap. Returns the new obstacle's id.
    pub fn maybe_spawn<R: Rng>(&mut self, rng: &mut R, tuning: &Tuning) -> Option<u32> {
        let due = match self.obstacles.last() {
            None => true,
            Some(last) => last.x < tuning.spawn_x - tuning.obstacle_gap,
        };
        if !due {
            return None;
        }

        let height = if tuning.obstacle_height_range > 0.0 {
            tuning.obstacle_min_height + rng.random_range(0.0..tuning.obstacle_height_range)
        } else {
            tuning.obstacle_min_height
        };
        Some(self.push(tuning.spawn_x, height))
    }

    /// Count obstacles whose trailing edge crossed `player_x` during the last
    /// advance. The window is one tick of scroll wide, and the `scored` latch
    /// keeps any obstacle from being counted twice.
    pub fn detect_passed(&mut self, player_x: f32, width: f32) -> u32 {
        let speed = self.speed;
        let mut passed = 0;
        for obstacle in &mut self.obstacles {
            if obstacle.scored {
                continue;
            }
            let trailing = obstacle.x + width;
            if trailing < player_x && trailing >= player_x - speed - PASS_EPSILON {
                obstacle.scored = true;
                passed += 1;
            }
        }
        passed
    }
}
