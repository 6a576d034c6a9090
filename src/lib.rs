//! Base Runner - a one-button side-scrolling runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, obstacles, collisions, game state)
//! - `session`: Session state machine driving the simulation
//! - `energy`: Rate-limited play attempts
//! - `reconcile`: End-of-run score persistence (local + remote ledger)
//! - `ledger`: Remote ledger interface and backends
//! - `persistence`: Local profile storage
//! - `leaderboard`: Remote leaderboard view state
//! - `settings`: Settings loading (file on native, LocalStorage on web)
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance

pub mod energy;
pub mod error;
pub mod leaderboard;
pub mod ledger;
pub mod persistence;
pub mod platform;
pub mod reconcile;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use energy::EnergyLedger;
pub use error::{ConfigError, LedgerError, SessionError, StorageError};
pub use leaderboard::{LeaderboardSnapshot, LeaderboardView};
pub use ledger::{ConfiguredLedger, DisabledLedger, Ledger, MemoryLedger};
pub use persistence::{Identity, MemoryStore, PlayerProfile, ProfileStore};
pub use reconcile::{RunResult, ScoreReconciler, SubmissionStatus};
pub use session::{SessionController, SessionSnapshot};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Playfield width; obstacles spawn at the right edge
    pub const SPAWN_X: f32 = 800.0;
    /// Height of ground from bottom
    pub const GROUND_Y: f32 = 80.0;

    /// Player defaults
    pub const PLAYER_X: f32 = 100.0;
    pub const PLAYER_SIZE: f32 = 40.0;
    /// Hitbox inset from the visual footprint (more forgiving feel)
    pub const PLAYER_HITBOX_INSET: f32 = 10.0;
    /// Jump is only accepted this close to the ground
    pub const GROUNDED_EPSILON: f32 = 5.0;

    /// Physics (units per tick)
    pub const GRAVITY: f32 = 0.6;
    pub const JUMP_FORCE: f32 = 12.0;
    /// Terminal velocity for falling
    pub const MAX_FALL_SPEED: f32 = -12.0;

    /// Obstacle defaults
    pub const OBSTACLE_WIDTH: f32 = 40.0;
    pub const OBSTACLE_GAP: f32 = 300.0;
    pub const OBSTACLE_MIN_HEIGHT: f32 = 40.0;
    pub const OBSTACLE_HEIGHT_RANGE: f32 = 60.0;

    /// Scroll speed progression
    pub const BASE_SPEED: f32 = 5.0;
    pub const MAX_SPEED: f32 = 12.0;
    pub const SPEED_STEP: f32 = 0.5;
    /// Speed increases every this many points
    pub const POINTS_PER_SPEEDUP: u32 = 5;

    /// Plays per refill window (mirrors the ledger's MAX_DAILY_PLAYS)
    pub const MAX_DAILY_PLAYS: u32 = 3;
    /// Energy refills completely after this long without consuming (24h)
    pub const ENERGY_REFILL_MS: u64 = 24 * 60 * 60 * 1000;

    /// Leaderboard size shown on the leaderboard screen
    pub const LEADERBOARD_SIZE: usize = 10;
}
