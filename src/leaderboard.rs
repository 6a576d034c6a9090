//! Leaderboard state
//!
//! The global board lives on the ledger and is refreshed by polling. Between
//! refreshes the snapshot is simply stale. Without a ledger the view says so
//! explicitly instead of pretending nobody has scored.

use serde::{Deserialize, Serialize};

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Player identity (wallet address)
    pub player: String,
    pub score: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: u64,
}

/// Top-N board as of `fetched_ms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LeaderboardSnapshot {
    pub entries: Vec<LeaderboardEntry>,
    /// How many entries were asked for
    pub requested: usize,
    pub fetched_ms: u64,
}

impl LeaderboardSnapshot {
    /// Build from whatever the ledger returned, enforcing order and length
    pub fn from_entries(
        mut entries: Vec<LeaderboardEntry>,
        requested: usize,
        fetched_ms: u64,
    ) -> Self {
        // Stable: the ledger's tie order is kept
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(requested);
        Self {
            entries,
            requested,
            fetched_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What the leaderboard screen should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LeaderboardView {
    /// No ledger configured, or the last refresh failed
    #[default]
    Unavailable,
    /// A refresh is in flight and nothing has arrived yet
    Loading,
    Ready {
        snapshot: LeaderboardSnapshot,
        /// The local player's global rank, once known
        player_rank: Option<u32>,
        total_players: Option<u64>,
    },
}

impl LeaderboardView {
    pub fn snapshot(&self) -> Option<&LeaderboardSnapshot> {
        match self {
            LeaderboardView::Ready { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}

/// Shorten a wallet address for display: `0x1234…abcd`
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}…{}", &address[..6], &address[address.len() - 4..])
}

/// Format a timestamp as a relative date string
pub fn format_age(now_ms: u64, timestamp_ms: u64) -> String {
    let diff_secs = now_ms.saturating_sub(timestamp_ms) / 1000;
    let diff_mins = diff_secs / 60;
    let diff_hours = diff_mins / 60;
    let diff_days = diff_hours / 24;

    if diff_days >= 1 {
        if diff_days == 1 {
            "Yesterday".to_string()
        } else {
            format!("{} days ago", diff_days)
        }
    } else if diff_hours >= 1 {
        if diff_hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", diff_hours)
        }
    } else if diff_mins >= 1 {
        if diff_mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", diff_mins)
        }
    } else {
        "Just now".to_string()
    }
}
