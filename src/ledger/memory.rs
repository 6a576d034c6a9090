//! In-process ledger simulator
//!
//! Behaves like the deployed contract (daily play allowance, best-score
//! tracking, leaderboard ordering) and lets tests decide whether requests are
//! answered, held forever, or rejected.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    LedgerEvent, LedgerRequest, LedgerResponse, LedgerTransport, PlayerStats, RequestEnvelope,
    Responder,
};
use crate::consts::{ENERGY_REFILL_MS, MAX_DAILY_PLAYS};
use crate::error::LedgerError;
use crate::leaderboard::LeaderboardEntry;

/// How the simulator treats a class of requests
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReplyMode {
    /// Answer immediately
    #[default]
    Answer,
    /// Keep the request open until `release_held` (or forever)
    Hold,
    /// Refuse with the given reason
    Reject(String),
}

#[derive(Debug, Clone, Default)]
struct PlayerRecord {
    best_score: u32,
    best_timestamp: u64,
    total_games: u32,
    plays_in_window: u32,
    window_start: u64,
    last_play: u64,
}

impl PlayerRecord {
    fn remaining_energy(&self, now_ms: u64) -> u32 {
        if now_ms.saturating_sub(self.window_start) >= ENERGY_REFILL_MS {
            MAX_DAILY_PLAYS
        } else {
            MAX_DAILY_PLAYS.saturating_sub(self.plays_in_window)
        }
    }
}

#[derive(Debug, Default)]
struct State {
    players: HashMap<String, PlayerRecord>,
    read_mode: ReplyMode,
    submit_mode: ReplyMode,
    held: Vec<(RequestEnvelope, Responder)>,
    events: Vec<LedgerEvent>,
    submissions: u32,
}

impl State {
    fn ranking(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .players
            .iter()
            .filter(|(_, r)| r.best_score > 0)
            .map(|(player, r)| LeaderboardEntry {
                player: player.clone(),
                score: r.best_score,
                timestamp: r.best_timestamp,
            })
            .collect();
        // Higher score first, earlier achiever wins ties
        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.timestamp.cmp(&b.timestamp))
                .then(a.player.cmp(&b.player))
        });
        entries
    }

    fn execute(&mut self, envelope: &RequestEnvelope) -> Result<LedgerResponse, LedgerError> {
        let now = envelope.issued_ms;
        match &envelope.request {
            LedgerRequest::RemainingEnergy { player } => Ok(LedgerResponse::RemainingEnergy(
                self.players
                    .get(player)
                    .map(|r| r.remaining_energy(now))
                    .unwrap_or(MAX_DAILY_PLAYS),
            )),
            LedgerRequest::PlayerStats { player } => {
                let stats = self
                    .players
                    .get(player)
                    .map(|r| PlayerStats {
                        best_score: r.best_score,
                        total_games: r.total_games,
                        remaining_energy: r.remaining_energy(now),
                        last_play_timestamp: r.last_play,
                    })
                    .unwrap_or(PlayerStats {
                        remaining_energy: MAX_DAILY_PLAYS,
                        ..PlayerStats::default()
                    });
                Ok(LedgerResponse::PlayerStats(stats))
            }
            LedgerRequest::TopPlayers { count } => {
                let mut entries = self.ranking();
                entries.truncate(*count);
                Ok(LedgerResponse::TopPlayers(entries))
            }
            LedgerRequest::PlayerRank { player } => {
                let rank = self
                    .ranking()
                    .iter()
                    .position(|e| &e.player == player)
                    .map(|i| i as u32 + 1);
                Ok(LedgerResponse::PlayerRank(rank))
            }
            LedgerRequest::TotalPlayers => Ok(LedgerResponse::TotalPlayers(self.players.len() as u64)),
            LedgerRequest::SubmitScore { player, score } => self.submit(player, *score, now),
        }
    }

    fn submit(&mut self, player: &str, score: u32, now: u64) -> Result<LedgerResponse, LedgerError> {
        let record = self.players.entry(player.to_string()).or_default();
        if record.remaining_energy(now) == 0 {
            return Err(LedgerError::Rejected("no plays left today".into()));
        }
        if now.saturating_sub(record.window_start) >= ENERGY_REFILL_MS {
            record.window_start = now;
            record.plays_in_window = 0;
        }
        record.plays_in_window += 1;
        record.total_games += 1;
        record.last_play = now;

        let mut events = vec![LedgerEvent::ScoreSubmitted {
            player: player.to_string(),
            score,
            timestamp: now,
        }];
        if score > record.best_score {
            events.push(LedgerEvent::NewHighScore {
                player: player.to_string(),
                old_score: record.best_score,
                new_score: score,
            });
            record.best_score = score;
            record.best_timestamp = now;
        }

        self.submissions += 1;
        self.events.extend(events.iter().cloned());
        Ok(LedgerResponse::Submitted(events))
    }
}

/// Transport half, owned by the `ConfiguredLedger`
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    state: Arc<Mutex<State>>,
}

/// Control half, kept by the test or demo driving the simulator
#[derive(Debug, Clone)]
pub struct MemoryLedgerHandle {
    state: Arc<Mutex<State>>,
}

impl MemoryLedger {
    pub fn new() -> (Self, MemoryLedgerHandle) {
        let state = Arc::new(Mutex::new(State::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MemoryLedgerHandle { state },
        )
    }
}

impl LedgerTransport for MemoryLedger {
    fn send(&mut self, envelope: RequestEnvelope, responder: Responder) {
        let mut state = self.state.lock();
        let mode = if envelope.request.is_write() {
            state.submit_mode.clone()
        } else {
            state.read_mode.clone()
        };
        match mode {
            ReplyMode::Answer => {
                let result = state.execute(&envelope);
                drop(state);
                responder.resolve(result);
            }
            ReplyMode::Hold => state.held.push((envelope, responder)),
            ReplyMode::Reject(reason) => {
                drop(state);
                responder.resolve(Err(LedgerError::Rejected(reason)));
            }
        }
    }
}

impl MemoryLedgerHandle {
    pub fn set_read_mode(&self, mode: ReplyMode) {
        self.state.lock().read_mode = mode;
    }

    pub fn set_submit_mode(&self, mode: ReplyMode) {
        self.state.lock().submit_mode = mode;
    }

    /// Answer every held request now
    pub fn release_held(&self) {
        let mut state = self.state.lock();
        let held = std::mem::take(&mut state.held);
        let mut resolved = Vec::with_capacity(held.len());
        for (envelope, responder) in held {
            let result = state.execute(&envelope);
            resolved.push((responder, result));
        }
        drop(state);
        for (responder, result) in resolved {
            responder.resolve(result);
        }
    }

    /// Requests currently held open
    pub fn held_count(&self) -> usize {
        self.state.lock().held.len()
    }

    /// Put a player on the board directly
    pub fn seed_player(&self, player: &str, best_score: u32, timestamp: u64) {
        let mut state = self.state.lock();
        let record = state.players.entry(player.to_string()).or_default();
        record.best_score = best_score;
        record.best_timestamp = timestamp;
        record.last_play = timestamp;
        record.total_games = record.total_games.max(1);
    }

    /// Number of confirmed submissions
    pub fn submissions(&self) -> u32 {
        self.state.lock().submissions
    }

    /// Every event emitted so far
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.state.lock().events.clone()
    }

    pub fn best_score(&self, player: &str) -> Option<u32> {
        self.state.lock().players.get(player).map(|r| r.best_score)
    }
}
