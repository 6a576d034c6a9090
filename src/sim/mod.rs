//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (units are per tick)
//! - Seeded RNG only
//! - Stable iteration order (obstacles kept in spawn order)
//! - No rendering, storage or ledger dependencies

pub mod body;
pub mod collision;
pub mod obstacles;
pub mod state;
pub mod tick;

pub use body::{integrate, jump};
pub use collision::{Aabb, collides, obstacle_box, player_hitbox};
pub use obstacles::ObstacleField;
pub use state::{Actor, GameState, Obstacle};
pub use tick::{TickInput, TickOutcome, tick};
