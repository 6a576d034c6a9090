//! Remote score ledger
//!
//! The ledger is an opaque service holding cross-device best scores, energy
//! and the global leaderboard. Nothing here ever blocks the frame:
//!
//! ```text
//! ┌──────────────┐ dispatch ┌──────────────┐  send  ┌──────────────┐
//! │  Session     │ ───────▶ │ Configured   │ ─────▶ │  Transport   │
//! │  (per frame) │          │ Ledger       │        │  (RPC, sim)  │
//! └──────▲───────┘          └──────▲───────┘        └──────┬───────┘
//!        │ poll                    │ try_recv              │ Responder
//!        └─────────────────────────┴───────── channel ◀────┘
//! ```
//!
//! Every request has a deadline. A request that never confirms resolves as
//! [`LedgerError::Timeout`] and any later reply for it is dropped, so a
//! result can never be applied twice.

mod memory;

pub use memory::{MemoryLedger, MemoryLedgerHandle, ReplyMode};

use std::collections::HashMap;

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::leaderboard::LeaderboardEntry;

pub type RequestId = u64;

/// Default time a request may stay unresolved
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Calls the core makes against the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerRequest {
    RemainingEnergy { player: String },
    PlayerStats { player: String },
    TopPlayers { count: usize },
    PlayerRank { player: String },
    TotalPlayers,
    SubmitScore { player: String, score: u32 },
}

impl LedgerRequest {
    pub fn is_write(&self) -> bool {
        matches!(self, LedgerRequest::SubmitScore { .. })
    }
}

/// Per-player record as the ledger reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub best_score: u32,
    pub total_games: u32,
    pub remaining_energy: u32,
    pub last_play_timestamp: u64,
}

/// Notifications emitted by a confirmed submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    ScoreSubmitted {
        player: String,
        score: u32,
        timestamp: u64,
    },
    NewHighScore {
        player: String,
        old_score: u32,
        new_score: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerResponse {
    RemainingEnergy(u32),
    PlayerStats(PlayerStats),
    TopPlayers(Vec<LeaderboardEntry>),
    /// 1-based; `None` when the player has no entry
    PlayerRank(Option<u32>),
    TotalPlayers(u64),
    /// Confirmation of a submission with the events it produced
    Submitted(Vec<LedgerEvent>),
}

/// A resolved request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReply {
    pub id: RequestId,
    pub request: LedgerRequest,
    pub result: Result<LedgerResponse, LedgerError>,
}

/// What a transport receives for each request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    pub id: RequestId,
    pub request: LedgerRequest,
    /// Client wall-clock time the request was issued
    pub issued_ms: u64,
}

/// One-shot reply slot handed to the transport. Consuming `resolve` means a
/// request can be answered at most once.
#[derive(Debug)]
pub struct Responder {
    id: RequestId,
    request: LedgerRequest,
    tx: Sender<LedgerReply>,
}

impl Responder {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn resolve(self, result: Result<LedgerResponse, LedgerError>) {
        let reply = LedgerReply {
            id: self.id,
            request: self.request,
            result,
        };
        // Receiver gone means the ledger was dropped; nobody is waiting
        let _ = self.tx.send(reply);
    }
}

/// Wire side of a configured ledger (RPC client, test simulator, ...)
pub trait LedgerTransport {
    /// Start the request. Answer through `responder` now or later.
    fn send(&mut self, envelope: RequestEnvelope, responder: Responder);
}

/// What the session and reconciler depend on
pub trait Ledger {
    /// Whether a ledger endpoint exists at all
    fn is_configured(&self) -> bool;

    /// Start a request without waiting for it
    fn dispatch(&mut self, request: LedgerRequest, now_ms: u64) -> Result<RequestId, LedgerError>;

    /// Collect everything that resolved (or expired) since the last poll
    fn poll(&mut self, now_ms: u64) -> Vec<LedgerReply>;

    /// Requests still waiting for an answer
    fn in_flight(&self) -> usize;
}

/// No ledger configured: every request is refused up front
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledLedger;

impl Ledger for DisabledLedger {
    fn is_configured(&self) -> bool {
        false
    }

    fn dispatch(&mut self, _request: LedgerRequest, _now_ms: u64) -> Result<RequestId, LedgerError> {
        Err(LedgerError::Unavailable)
    }

    fn poll(&mut self, _now_ms: u64) -> Vec<LedgerReply> {
        Vec::new()
    }

    fn in_flight(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone)]
struct InFlight {
    request: LedgerRequest,
    issued_ms: u64,
    deadline_ms: u64,
}

/// A ledger backed by a real transport
pub struct ConfiguredLedger<T: LedgerTransport> {
    transport: T,
    tx: Sender<LedgerReply>,
    rx: Receiver<LedgerReply>,
    in_flight: HashMap<RequestId, InFlight>,
    next_id: RequestId,
    timeout_ms: u64,
}

impl<T: LedgerTransport> ConfiguredLedger<T> {
    pub fn new(transport: T, timeout_ms: u64) -> Self {
        let (tx, rx) = unbounded();
        Self {
            transport,
            tx,
            rx,
            in_flight: HashMap::new(),
            next_id: 1,
            timeout_ms,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: LedgerTransport> Ledger for ConfiguredLedger<T> {
    fn is_configured(&self) -> bool {
        true
    }

    fn dispatch(&mut self, request: LedgerRequest, now_ms: u64) -> Result<RequestId, LedgerError> {
        let id = self.next_id;
        self.next_id += 1;

        log::debug!("Ledger request {}: {:?}", id, request);
        self.in_flight.insert(
            id,
            InFlight {
                request: request.clone(),
                issued_ms: now_ms,
                deadline_ms: now_ms.saturating_add(self.timeout_ms),
            },
        );

        let responder = Responder {
            id,
            request: request.clone(),
            tx: self.tx.clone(),
        };
        self.transport.send(
            RequestEnvelope {
                id,
                request,
                issued_ms: now_ms,
            },
            responder,
        );
        Ok(id)
    }

    fn poll(&mut self, now_ms: u64) -> Vec<LedgerReply> {
        let mut replies = Vec::new();

        for reply in self.rx.try_iter() {
            if self.in_flight.remove(&reply.id).is_some() {
                replies.push(reply);
            } else {
                log::warn!("Dropping late ledger reply for request {}", reply.id);
            }
        }

        let mut expired: Vec<RequestId> = self
            .in_flight
            .iter()
            .filter(|(_, f)| now_ms >= f.deadline_ms)
            .map(|(id, _)| *id)
            .collect();
        expired.sort_unstable();

        for id in expired {
            if let Some(f) = self.in_flight.remove(&id) {
                let after_ms = now_ms.saturating_sub(f.issued_ms);
                log::warn!("Ledger request {} timed out after {} ms", id, after_ms);
                replies.push(LedgerReply {
                    id,
                    request: f.request,
                    result: Err(LedgerError::Timeout { id, after_ms }),
                });
            }
        }

        replies
    }

    fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
