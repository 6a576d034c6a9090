//! Session state machine
//!
//! ```text
//!            start (energy)            collision
//!   Ready ─────────────────▶ Playing ───────────▶ GameOver
//!     ▲  │                    ▲  │ jump/tick        │  │
//!     │  │ view_leaderboard   │  └──────┘           │  │ retry (energy)
//!     │  ▼                    └─────────────────────┘  │
//!   Leaderboard ◀──────────────────────────────────────┘
//!          back                 view_leaderboard
//! ```
//!
//! The controller owns the whole session aggregate. A renderer only ever
//! reads [`SessionSnapshot`]s and feeds actions in; nothing here draws.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::energy::EnergyLedger;
use crate::error::{SessionError, StorageError};
use crate::leaderboard::{LeaderboardSnapshot, LeaderboardView};
use crate::ledger::{Ledger, LedgerReply, LedgerRequest, LedgerResponse, RequestId};
use crate::persistence::{Identity, PlayerProfile, ProfileStore, load_or_fresh, read_modify_write};
use crate::reconcile::{ConfirmSubmit, ReconcileOutcome, RunResult, ScoreReconciler, SubmissionStatus};
use crate::settings::Settings;
use crate::sim::{GameState, TickInput, TickOutcome, tick};
use crate::tuning::Tuning;

/// Current screen of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Ready,
    Playing,
    GameOver,
    Leaderboard,
}

/// Inputs that move the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionAction {
    Start,
    Retry,
    Jump,
    ViewLeaderboard,
    Back,
}

/// Fixed-cadence tick driver. Stopping is immediate and idempotent.
#[derive(Debug, Clone, Default)]
pub struct TickDriver {
    running: bool,
    accumulator: f32,
}

impl TickDriver {
    pub fn start(&mut self) {
        self.running = true;
        self.accumulator = 0.0;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.accumulator = 0.0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticks owed for `dt` seconds of wall time (capped to avoid a spiral of death)
    pub fn due_ticks(&mut self, dt: f32) -> u32 {
        if !self.running {
            return 0;
        }
        self.accumulator += dt.clamp(0.0, 0.1);
        let mut ticks = 0;
        while self.accumulator >= SIM_DT && ticks < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            ticks += 1;
        }
        if ticks == MAX_SUBSTEPS {
            // Drop the backlog rather than fast-forwarding later
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        ticks
    }
}

/// Things a UI may want to react to, drained with [`SessionController::take_events`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started { energy_left: u32 },
    Scored { score: u32 },
    SpeedUp { speed: f32 },
    GameOver { score: u32, is_new_best: bool },
    /// A local write failed; play continues on in-memory state
    StorageFailed(StorageError),
    Submission(SubmissionStatus),
    ProfileRefreshed,
    LeaderboardRefreshed,
}

/// Per-session configuration, usually built from [`Settings`]
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub identity: Identity,
    pub tuning: Tuning,
    pub max_energy: u32,
    pub energy_refill_ms: u64,
    pub leaderboard_size: usize,
    pub seed: u64,
}

impl SessionConfig {
    pub fn from_settings(settings: &Settings, fallback_seed: u64) -> Self {
        Self {
            identity: settings.identity_or_anonymous(),
            tuning: settings.tuning.clone(),
            max_energy: settings.max_energy,
            energy_refill_ms: settings.energy_refill_ms,
            leaderboard_size: settings.leaderboard_size(),
            seed: settings.seed.unwrap_or(fallback_seed),
        }
    }
}

/// Which outstanding ledger reads we are waiting on
#[derive(Debug, Clone, Default)]
struct RemoteReads {
    stats: Option<RequestId>,
    energy: Option<RequestId>,
    top: Option<RequestId>,
    rank: Option<RequestId>,
    total: Option<RequestId>,
}

/// Renderer-facing view of the whole session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub player_x: f32,
    pub player_y: f32,
    pub player_size: f32,
    pub ground_y: f32,
    pub airborne: bool,
    pub jumping: bool,
    pub obstacles: Vec<ObstacleView>,
    pub obstacle_width: f32,
    pub score: u32,
    pub best_score: u32,
    pub speed: f32,
    pub energy: u32,
    pub max_energy: u32,
    pub refill_in_ms: u64,
    pub is_new_best: bool,
    pub submission: SubmissionStatus,
    pub leaderboard: LeaderboardView,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObstacleView {
    pub id: u32,
    pub x: f32,
    pub height: f32,
}

pub struct SessionController<L: Ledger, S: ProfileStore> {
    config: SessionConfig,
    phase: SessionPhase,
    game: GameState,
    driver: TickDriver,
    /// Jump pressed since the last tick
    jump_latch: bool,
    energy: EnergyLedger,
    profile: PlayerProfile,
    store: S,
    ledger: L,
    reconciler: ScoreReconciler,
    last_run: Option<RunResult>,
    leaderboard: LeaderboardView,
    reads: RemoteReads,
    /// Rank and player count may resolve before the board itself
    player_rank: Option<u32>,
    total_players: Option<u64>,
    runs_started: u64,
    events: Vec<SessionEvent>,
}

impl<L: Ledger, S: ProfileStore> SessionController<L, S> {
    /// Load the local profile and kick off the first remote refresh
    pub fn new(
        config: SessionConfig,
        store: S,
        ledger: L,
        confirm: impl ConfirmSubmit + 'static,
        now_ms: u64,
    ) -> Self {
        let mut events = Vec::new();
        let profile = match load_or_fresh(&store, &config.identity) {
            Ok(profile) => profile,
            Err(e) => {
                log::warn!("Profile unavailable, starting fresh: {}", e);
                events.push(SessionEvent::StorageFailed(e));
                PlayerProfile::fresh(config.identity.clone())
            }
        };
        log::info!(
            "Session ready for {} (best {}, energy {})",
            config.identity.key(),
            profile.best_score,
            profile.energy
        );

        let mut controller = Self {
            game: GameState::new(config.seed, &config.tuning),
            energy: EnergyLedger::new(config.max_energy, config.energy_refill_ms),
            config,
            phase: SessionPhase::Ready,
            driver: TickDriver::default(),
            jump_latch: false,
            profile,
            store,
            ledger,
            reconciler: ScoreReconciler::new(confirm),
            last_run: None,
            leaderboard: LeaderboardView::Unavailable,
            reads: RemoteReads::default(),
            player_rank: None,
            total_players: None,
            runs_started: 0,
            events,
        };
        controller.refresh_profile(now_ms);
        controller
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// Mutable access to the running session (scripted layouts, tests)
    pub fn game_mut(&mut self) -> &mut GameState {
        &mut self.game
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn last_run(&self) -> Option<&RunResult> {
        self.last_run.as_ref()
    }

    pub fn leaderboard(&self) -> &LeaderboardView {
        &self.leaderboard
    }

    pub fn submission(&self) -> &SubmissionStatus {
        self.reconciler.status()
    }

    pub fn driver(&self) -> &TickDriver {
        &self.driver
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn tuning(&self) -> &Tuning {
        &self.config.tuning
    }

    pub fn energy_remaining(&self, now_ms: u64) -> u32 {
        self.energy.remaining(&self.profile, now_ms)
    }

    /// Drain queued events
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // === Transitions ===

    /// `ready --start--> playing`
    pub fn start(&mut self, now_ms: u64) -> Result<(), SessionError> {
        self.require(SessionPhase::Ready, SessionAction::Start)?;
        self.begin_run(now_ms)
    }

    /// `gameover --retry--> playing`
    pub fn retry(&mut self, now_ms: u64) -> Result<(), SessionError> {
        self.require(SessionPhase::GameOver, SessionAction::Retry)?;
        self.begin_run(now_ms)
    }

    /// Edge-triggered jump; applied on the next tick
    pub fn jump(&mut self) -> Result<(), SessionError> {
        self.require(SessionPhase::Playing, SessionAction::Jump)?;
        self.jump_latch = true;
        Ok(())
    }

    /// One-button control: start, jump or retry depending on phase
    pub fn press(&mut self, now_ms: u64) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Ready => self.start(now_ms),
            SessionPhase::Playing => self.jump(),
            SessionPhase::GameOver => self.retry(now_ms),
            SessionPhase::Leaderboard => Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: SessionAction::Start,
            }),
        }
    }

    /// `gameover|ready --view_leaderboard--> leaderboard`
    pub fn view_leaderboard(&mut self, now_ms: u64) -> Result<(), SessionError> {
        if !matches!(self.phase, SessionPhase::GameOver | SessionPhase::Ready) {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: SessionAction::ViewLeaderboard,
            });
        }
        self.phase = SessionPhase::Leaderboard;
        self.refresh_leaderboard(now_ms);
        Ok(())
    }

    /// `leaderboard --back--> ready`
    pub fn back(&mut self) -> Result<(), SessionError> {
        self.require(SessionPhase::Leaderboard, SessionAction::Back)?;
        self.phase = SessionPhase::Ready;
        Ok(())
    }

    /// Cancel the tick driver (unmount). Safe to call any number of times.
    pub fn stop(&mut self) {
        if self.driver.is_running() {
            log::info!("Tick driver stopped");
        }
        self.driver.stop();
    }

    fn require(&self, phase: SessionPhase, action: SessionAction) -> Result<(), SessionError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    fn begin_run(&mut self, now_ms: u64) -> Result<(), SessionError> {
        if !self.energy.has_energy(&self.profile, now_ms) {
            let refill_in_ms = self.energy.refill_in_ms(&self.profile, now_ms);
            log::info!("Start refused: no energy (refill in {} ms)", refill_in_ms);
            // The ledger may have refilled since the last reading
            self.refresh_profile(now_ms);
            return Err(SessionError::NoEnergy { refill_in_ms });
        }

        let (profile, storage_error) =
            self.energy
                .consume_and_persist(&mut self.store, &self.profile, now_ms);
        self.profile = profile;
        if let Some(e) = storage_error {
            self.events.push(SessionEvent::StorageFailed(e));
        }

        let seed = self.config.seed.wrapping_add(self.runs_started);
        self.runs_started += 1;
        self.game = GameState::new(seed, &self.config.tuning);
        self.jump_latch = false;
        self.phase = SessionPhase::Playing;
        self.driver.start();

        let energy_left = self.energy.remaining(&self.profile, now_ms);
        log::info!("Run started (seed {}, energy left {})", seed, energy_left);
        self.events.push(SessionEvent::Started { energy_left });
        Ok(())
    }

    // === Simulation ===

    /// Advance one display frame of `dt` seconds
    ///
    /// Drains ledger replies first, then runs however many fixed ticks are
    /// due. Returns the number of ticks run.
    pub fn frame(&mut self, dt: f32, now_ms: u64) -> u32 {
        self.poll_remote(now_ms);

        let due = self.driver.due_ticks(dt);
        let mut ran = 0;
        for _ in 0..due {
            if self.step(now_ms).is_none() {
                break;
            }
            ran += 1;
        }
        ran
    }

    /// Run exactly one tick if the session is playing
    pub fn step(&mut self, now_ms: u64) -> Option<TickOutcome> {
        if self.phase != SessionPhase::Playing || !self.driver.is_running() {
            return None;
        }

        let input = TickInput {
            jump: std::mem::take(&mut self.jump_latch),
        };
        let outcome = tick(&mut self.game, &input, &self.config.tuning);

        if outcome.passed > 0 {
            self.events.push(SessionEvent::Scored {
                score: self.game.score,
            });
        }
        if outcome.speed_up {
            self.events.push(SessionEvent::SpeedUp {
                speed: self.game.speed(),
            });
        }
        if outcome.collided {
            self.end_run(now_ms);
        }
        Some(outcome)
    }

    fn end_run(&mut self, now_ms: u64) {
        self.driver.stop();
        self.jump_latch = false;
        self.phase = SessionPhase::GameOver;

        let mut run = RunResult::new(self.game.score, now_ms);
        let ReconcileOutcome {
            is_new_best,
            storage_error,
            submission,
            ..
        } = self.reconciler.reconcile(
            &mut run,
            &mut self.profile,
            &mut self.store,
            &mut self.ledger,
            now_ms,
        );
        log::info!("Game over: score {} (new best: {})", run.score(), is_new_best);

        self.events.push(SessionEvent::GameOver {
            score: run.score(),
            is_new_best,
        });
        if let Some(e) = storage_error {
            self.events.push(SessionEvent::StorageFailed(e));
        }
        self.events.push(SessionEvent::Submission(submission));
        self.last_run = Some(run);
    }

    /// Show the submit prompt again for the last run
    pub fn reopen_submission(&mut self, now_ms: u64) -> Option<SubmissionStatus> {
        let run = self.last_run.as_mut()?;
        let status = self
            .reconciler
            .reopen(run, &self.profile, &mut self.ledger, now_ms);
        self.events.push(SessionEvent::Submission(status.clone()));
        Some(status)
    }

    // === Remote state ===

    fn dispatch_read(&mut self, request: LedgerRequest, now_ms: u64) -> Option<RequestId> {
        match self.ledger.dispatch(request, now_ms) {
            Ok(id) => Some(id),
            Err(e) => {
                log::debug!("Ledger read not sent: {}", e);
                None
            }
        }
    }

    /// Ask the ledger for this player's stats and energy
    pub fn refresh_profile(&mut self, now_ms: u64) {
        let Some(player) = self.config.identity.wallet().map(str::to_string) else {
            return;
        };
        if !self.ledger.is_configured() {
            return;
        }
        if self.reads.stats.is_none() {
            self.reads.stats = self.dispatch_read(
                LedgerRequest::PlayerStats {
                    player: player.clone(),
                },
                now_ms,
            );
        }
        if self.reads.energy.is_none() {
            self.reads.energy =
                self.dispatch_read(LedgerRequest::RemainingEnergy { player }, now_ms);
        }
    }

    /// Ask the ledger for the top players, our rank and the player count
    pub fn refresh_leaderboard(&mut self, now_ms: u64) {
        if !self.ledger.is_configured() {
            self.leaderboard = LeaderboardView::Unavailable;
            return;
        }
        if self.reads.top.is_none() {
            self.reads.top = self.dispatch_read(
                LedgerRequest::TopPlayers {
                    count: self.config.leaderboard_size,
                },
                now_ms,
            );
        }
        if self.reads.total.is_none() {
            self.reads.total = self.dispatch_read(LedgerRequest::TotalPlayers, now_ms);
        }
        if let Some(player) = self.config.identity.wallet().map(str::to_string) {
            if self.reads.rank.is_none() {
                self.reads.rank = self.dispatch_read(LedgerRequest::PlayerRank { player }, now_ms);
            }
        }

        if self.reads.top.is_none() {
            self.leaderboard = LeaderboardView::Unavailable;
        } else if matches!(self.leaderboard, LeaderboardView::Unavailable) {
            self.leaderboard = LeaderboardView::Loading;
        }
    }

    /// Apply everything the ledger has resolved since the last call
    pub fn poll_remote(&mut self, now_ms: u64) {
        for reply in self.ledger.poll(now_ms) {
            self.apply_reply(reply, now_ms);
        }
        if self.energy.remote_is_stale(&self.profile, now_ms) {
            log::debug!("Remote energy reading expired, fetching again");
            self.refresh_profile(now_ms);
        }
    }

    fn apply_reply(&mut self, reply: LedgerReply, now_ms: u64) {
        if let Some(status) = self.reconciler.handle_reply(&reply) {
            let confirmed = matches!(status, SubmissionStatus::Confirmed { .. });
            self.events.push(SessionEvent::Submission(status));
            if confirmed {
                // One-shot refresh so the new best shows up everywhere
                self.refresh_profile(now_ms);
                if self.phase == SessionPhase::Leaderboard {
                    self.refresh_leaderboard(now_ms);
                }
            }
            return;
        }

        let id = Some(reply.id);
        if id == self.reads.stats {
            self.reads.stats = None;
            match reply.result {
                Ok(LedgerResponse::PlayerStats(stats)) => {
                    self.energy.apply_remote(stats.remaining_energy, now_ms);
                    self.merge_remote_best(stats.best_score);
                    self.events.push(SessionEvent::ProfileRefreshed);
                }
                Ok(other) => log::warn!("Unexpected stats reply: {:?}", other),
                Err(e) => {
                    log::warn!("Player stats unavailable, using local profile: {}", e);
                    self.energy.clear_remote();
                }
            }
        } else if id == self.reads.energy {
            self.reads.energy = None;
            match reply.result {
                Ok(LedgerResponse::RemainingEnergy(energy)) => {
                    self.energy.apply_remote(energy, now_ms);
                }
                Ok(other) => log::warn!("Unexpected energy reply: {:?}", other),
                Err(e) => {
                    log::warn!("Remote energy unavailable, using local profile: {}", e);
                    self.energy.clear_remote();
                }
            }
        } else if id == self.reads.top {
            self.reads.top = None;
            match reply.result {
                Ok(LedgerResponse::TopPlayers(entries)) => {
                    let snapshot = LeaderboardSnapshot::from_entries(
                        entries,
                        self.config.leaderboard_size,
                        now_ms,
                    );
                    self.leaderboard = LeaderboardView::Ready {
                        snapshot,
                        player_rank: self.player_rank,
                        total_players: self.total_players,
                    };
                    self.events.push(SessionEvent::LeaderboardRefreshed);
                }
                Ok(other) => log::warn!("Unexpected leaderboard reply: {:?}", other),
                Err(e) => {
                    log::warn!("Leaderboard unavailable: {}", e);
                    // A stale board is still worth showing
                    if !matches!(self.leaderboard, LeaderboardView::Ready { .. }) {
                        self.leaderboard = LeaderboardView::Unavailable;
                    }
                }
            }
        } else if id == self.reads.rank {
            self.reads.rank = None;
            if let Ok(LedgerResponse::PlayerRank(rank)) = reply.result {
                self.player_rank = rank;
                if let LeaderboardView::Ready { player_rank, .. } = &mut self.leaderboard {
                    *player_rank = rank;
                }
            }
        } else if id == self.reads.total {
            self.reads.total = None;
            if let Ok(LedgerResponse::TotalPlayers(total)) = reply.result {
                self.total_players = Some(total);
                if let LeaderboardView::Ready { total_players, .. } = &mut self.leaderboard {
                    *total_players = Some(total);
                }
            }
        } else {
            log::debug!("Ignoring ledger reply {}", reply.id);
        }
    }

    /// The ledger knows a higher best (another device): adopt and cache it.
    /// A lower remote best never lowers the local one.
    fn merge_remote_best(&mut self, remote_best: u32) {
        if remote_best <= self.profile.best_score {
            return;
        }
        self.profile.best_score = remote_best;
        let identity = self.config.identity.clone();
        if let Err(e) = read_modify_write(&mut self.store, &identity, |stored| {
            stored.best_score = stored.best_score.max(remote_best);
        }) {
            log::warn!("Remote best not cached locally: {}", e);
            self.events.push(SessionEvent::StorageFailed(e));
        }
    }

    /// Everything a renderer needs for this frame
    pub fn snapshot(&self, now_ms: u64) -> SessionSnapshot {
        let tuning = &self.config.tuning;
        let actor = &self.game.actor;
        SessionSnapshot {
            phase: self.phase,
            player_x: tuning.player_x,
            player_y: actor.y,
            player_size: tuning.player_size,
            ground_y: tuning.ground_y,
            airborne: actor.airborne,
            jumping: actor.is_jumping(),
            obstacles: self
                .game
                .field
                .obstacles()
                .iter()
                .map(|o| ObstacleView {
                    id: o.id,
                    x: o.x,
                    height: o.height,
                })
                .collect(),
            obstacle_width: tuning.obstacle_width,
            score: self.game.score,
            best_score: self.profile.best_score,
            speed: self.game.speed(),
            energy: self.energy.remaining(&self.profile, now_ms),
            max_energy: self.energy.max_energy(),
            refill_in_ms: self.energy.refill_in_ms(&self.profile, now_ms),
            is_new_best: self.last_run.as_ref().is_some_and(RunResult::is_new_best),
            submission: self.reconciler.status().clone(),
            leaderboard: self.leaderboard.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::ledger::DisabledLedger;
    use crate::persistence::MemoryStore;
    use crate::reconcile::AutoConfirm;

    fn config() -> SessionConfig {
        SessionConfig {
            identity: Identity::Anonymous("tester".into()),
            tuning: Tuning::default(),
            max_energy: MAX_DAILY_PLAYS,
            energy_refill_ms: ENERGY_REFILL_MS,
            leaderboard_size: LEADERBOARD_SIZE,
            seed: 42,
        }
    }

    fn controller() -> SessionController<DisabledLedger, MemoryStore> {
        SessionController::new(config(), MemoryStore::new(), DisabledLedger, AutoConfirm(true), 0)
    }

    #[test]
    fn test_driver_stop_is_idempotent() {
        let mut driver = TickDriver::default();
        driver.start();
        assert_eq!(driver.due_ticks(SIM_DT * 2.5), 2);
        driver.stop();
        driver.stop();
        assert!(!driver.is_running());
        assert_eq!(driver.due_ticks(1.0), 0);
    }

    #[test]
    fn test_driver_caps_substeps() {
        let mut driver = TickDriver::default();
        driver.start();
        assert_eq!(driver.due_ticks(5.0), MAX_SUBSTEPS);
        assert!(driver.due_ticks(0.0) <= 1);
    }

    #[test]
    fn test_jump_only_while_playing() {
        let mut session = controller();
        assert_eq!(
            session.jump(),
            Err(SessionError::InvalidTransition {
                phase: SessionPhase::Ready,
                action: SessionAction::Jump
            })
        );
        session.start(1).unwrap();
        assert!(session.jump().is_ok());
    }

    #[test]
    fn test_repeated_presses_collapse_to_one_jump() {
        let mut session = controller();
        session.start(1).unwrap();
        session.jump().unwrap();
        session.jump().unwrap();
        let first = session.step(2).unwrap();
        assert!(first.jumped);
        // Latch was consumed by the tick
        let second = session.step(3).unwrap();
        assert!(!second.jumped && !second.jump_ignored);
    }

    #[test]
    fn test_no_ticks_after_stop() {
        let mut session = controller();
        session.start(1).unwrap();
        assert!(session.frame(SIM_DT, 2) >= 1);
        session.stop();
        session.stop();
        let ticks = session.game().time_ticks;
        assert_eq!(session.frame(1.0, 3), 0);
        assert!(session.step(4).is_none());
        assert_eq!(session.game().time_ticks, ticks);
    }

    #[test]
    fn test_collision_ends_run_and_stops_driver() {
        let mut session = controller();
        session.start(1).unwrap();
        session.game_mut().field.push(PLAYER_X, 50.0);

        assert!(session.step(2).unwrap().collided);
        assert_eq!(session.phase(), SessionPhase::GameOver);
        assert!(!session.driver().is_running());
        assert!(session.step(3).is_none());
        assert_eq!(session.last_run().unwrap().score(), 0);
    }

    #[test]
    fn test_leaderboard_round_trip() {
        let mut session = controller();
        session.view_leaderboard(0).unwrap();
        assert_eq!(session.phase(), SessionPhase::Leaderboard);
        assert_eq!(session.leaderboard(), &LeaderboardView::Unavailable);
        assert!(session.start(0).is_err());
        session.back().unwrap();
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[test]
    fn test_press_maps_to_phase_action() {
        let mut session = controller();
        session.press(1).unwrap();
        assert_eq!(session.phase(), SessionPhase::Playing);
        session.press(2).unwrap();
        assert!(session.step(3).unwrap().jumped);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut session = controller();
        session.start(1).unwrap();
        session.step(2);
        let snap = session.snapshot(2);
        assert_eq!(snap.phase, SessionPhase::Playing);
        assert_eq!(snap.energy, MAX_DAILY_PLAYS - 1);
        assert_eq!(snap.obstacles.len(), 1);
        assert_eq!(snap.obstacles[0].x, SPAWN_X);
        assert_eq!(snap.player_y, GROUND_Y);
        assert!(serde_json::to_string(&snap).is_ok());
    }
}
