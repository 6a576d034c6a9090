//! Energy: how many runs an identity may start before the refill window
//!
//! There is no refill timer. The stored value is the energy left right after
//! the last consumption; whenever it is read, enough elapsed wall-clock time
//! turns it back into a full bar.

use crate::consts::{ENERGY_REFILL_MS, MAX_DAILY_PLAYS};
use crate::error::StorageError;
use crate::persistence::{PlayerProfile, ProfileStore, read_modify_write};

/// A remote energy reading and when it arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RemoteReading {
    value: u32,
    received_ms: u64,
}

#[derive(Debug, Clone)]
pub struct EnergyLedger {
    max_energy: u32,
    refill_ms: u64,
    remote: Option<RemoteReading>,
}

impl Default for EnergyLedger {
    fn default() -> Self {
        Self::new(MAX_DAILY_PLAYS, ENERGY_REFILL_MS)
    }
}

impl EnergyLedger {
    pub fn new(max_energy: u32, refill_ms: u64) -> Self {
        Self {
            max_energy,
            refill_ms,
            remote: None,
        }
    }

    pub fn max_energy(&self) -> u32 {
        self.max_energy
    }

    /// Energy according to the local profile, with lazy refill
    pub fn local_remaining(&self, profile: &PlayerProfile, now_ms: u64) -> u32 {
        if self.window_elapsed(profile, now_ms) {
            self.max_energy
        } else {
            profile.energy.min(self.max_energy)
        }
    }

    /// Energy left. A resolved remote reading wins over the local cache
    /// until the refill window runs out on either of them.
    pub fn remaining(&self, profile: &PlayerProfile, now_ms: u64) -> u32 {
        match self.current_remote(profile, now_ms) {
            Some(reading) => reading.value.min(self.max_energy),
            None => self.local_remaining(profile, now_ms),
        }
    }

    /// The remote reading, unless a refill has happened since it was taken
    fn current_remote(&self, profile: &PlayerProfile, now_ms: u64) -> Option<RemoteReading> {
        self.remote.filter(|reading| {
            now_ms.saturating_sub(reading.received_ms) < self.refill_ms
                && !self.window_elapsed(profile, now_ms)
        })
    }

    /// Whether the remote reading has gone stale and should be fetched again
    pub fn remote_is_stale(&self, profile: &PlayerProfile, now_ms: u64) -> bool {
        self.remote.is_some() && self.current_remote(profile, now_ms).is_none()
    }

    pub fn has_energy(&self, profile: &PlayerProfile, now_ms: u64) -> bool {
        self.remaining(profile, now_ms) > 0
    }

    /// Time until the bar is full again (0 when already full or refilled)
    pub fn refill_in_ms(&self, profile: &PlayerProfile, now_ms: u64) -> u64 {
        if self.remaining(profile, now_ms) >= self.max_energy {
            return 0;
        }
        // Spent on another device: count from when the ledger told us
        let since = match (profile.last_play_ms, self.current_remote(profile, now_ms)) {
            (0, Some(reading)) => reading.received_ms,
            (0, None) => return 0,
            (last_play, _) => last_play,
        };
        (since + self.refill_ms).saturating_sub(now_ms)
    }

    fn window_elapsed(&self, profile: &PlayerProfile, now_ms: u64) -> bool {
        profile.last_play_ms > 0 && now_ms.saturating_sub(profile.last_play_ms) >= self.refill_ms
    }

    /// Record a remote energy reading; it stays authoritative until cleared
    pub fn apply_remote(&mut self, value: u32, now_ms: u64) {
        log::debug!("Remote energy {} (local cache replaced)", value);
        self.remote = Some(RemoteReading {
            value,
            received_ms: now_ms,
        });
    }

    /// Drop the remote reading (ledger went away or identity changed)
    pub fn clear_remote(&mut self) {
        self.remote = None;
    }

    /// When the current remote reading arrived, if any
    pub fn remote_received_ms(&self) -> Option<u64> {
        self.remote.map(|r| r.received_ms)
    }

    /// Spend one unit. Floors at zero, stamps the play time and counts the game.
    pub fn consume(&mut self, profile: &PlayerProfile, now_ms: u64) -> PlayerProfile {
        let left = self.remaining(profile, now_ms).saturating_sub(1);
        if self.remote_is_stale(profile, now_ms) {
            self.remote = None;
        }
        if let Some(reading) = self.remote.as_mut() {
            reading.value = left;
        }
        PlayerProfile {
            energy: left,
            last_play_ms: now_ms,
            total_games: profile.total_games + 1,
            ..profile.clone()
        }
    }

    /// [`consume`](Self::consume) and write the result straight to storage.
    ///
    /// The returned profile is the in-memory truth either way; a storage
    /// failure is handed back for reporting.
    pub fn consume_and_persist<S: ProfileStore + ?Sized>(
        &mut self,
        store: &mut S,
        profile: &PlayerProfile,
        now_ms: u64,
    ) -> (PlayerProfile, Option<StorageError>) {
        let updated = self.consume(profile, now_ms);
        let Some(identity) = updated.identity.clone() else {
            return (updated, None);
        };

        let result = read_modify_write(store, &identity, |stored| {
            stored.energy = updated.energy;
            stored.last_play_ms = updated.last_play_ms;
            stored.total_games = stored.total_games.max(updated.total_games);
            stored.best_score = stored.best_score.max(updated.best_score);
        });
        match result {
            Ok(_) => (updated, None),
            Err(e) => {
                log::warn!("Energy not persisted: {}", e);
                (updated, Some(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{Identity, MemoryStore};

    const HOUR: u64 = 60 * 60 * 1000;

    fn profile(energy: u32, last_play_ms: u64) -> PlayerProfile {
        PlayerProfile {
            energy,
            last_play_ms,
            ..PlayerProfile::fresh(Identity::Wallet("0x1".into()))
        }
    }

    #[test]
    fn test_consume_decrements_and_floors() {
        let mut ledger = EnergyLedger::default();
        let p = ledger.consume(&profile(1, 0), 10 * HOUR);
        assert_eq!(p.energy, 0);
        assert_eq!(p.last_play_ms, 10 * HOUR);
        assert_eq!(p.total_games, 1);

        let p = ledger.consume(&p, 11 * HOUR);
        assert_eq!(p.energy, 0);
    }

    #[test]
    fn test_lazy_refill_after_window() {
        let ledger = EnergyLedger::default();
        let p = profile(0, 10 * HOUR);
        assert_eq!(ledger.remaining(&p, 33 * HOUR), 0);
        assert_eq!(ledger.refill_in_ms(&p, 33 * HOUR), HOUR);
        assert_eq!(ledger.remaining(&p, 34 * HOUR), MAX_DAILY_PLAYS);
        assert_eq!(ledger.refill_in_ms(&p, 34 * HOUR), 0);
    }

    #[test]
    fn test_consume_after_refill_starts_from_full() {
        let mut ledger = EnergyLedger::default();
        let p = ledger.consume(&profile(0, HOUR), 30 * HOUR);
        assert_eq!(p.energy, MAX_DAILY_PLAYS - 1);
    }

    #[test]
    fn test_remote_reading_is_authoritative() {
        let mut ledger = EnergyLedger::default();
        let p = profile(3, 0);
        ledger.apply_remote(1, 5);
        assert_eq!(ledger.remaining(&p, 10), 1);
        assert_eq!(ledger.remote_received_ms(), Some(5));

        let p = ledger.consume(&p, 10);
        assert_eq!(p.energy, 0);
        assert!(!ledger.has_energy(&p, 11));

        ledger.clear_remote();
        assert_eq!(ledger.remaining(&p, 11), 0);
    }

    #[test]
    fn test_remote_reading_refills_after_window() {
        let mut ledger = EnergyLedger::default();
        ledger.apply_remote(1, HOUR);
        let p = ledger.consume(&profile(3, 0), HOUR);
        assert_eq!(ledger.remaining(&p, 2 * HOUR), 0);
        assert_eq!(ledger.refill_in_ms(&p, 2 * HOUR), ENERGY_REFILL_MS - HOUR);
        assert!(!ledger.remote_is_stale(&p, 2 * HOUR));

        let later = HOUR + ENERGY_REFILL_MS;
        assert!(ledger.remote_is_stale(&p, later));
        assert_eq!(ledger.remaining(&p, later), MAX_DAILY_PLAYS);

        // Spending again drops the stale reading
        let p = ledger.consume(&p, later);
        assert_eq!(p.energy, MAX_DAILY_PLAYS - 1);
        assert_eq!(ledger.remote_received_ms(), None);
    }

    #[test]
    fn test_refill_counts_from_reading_when_played_elsewhere() {
        let mut ledger = EnergyLedger::default();
        let p = profile(3, 0);
        ledger.apply_remote(0, 5 * HOUR);
        assert_eq!(ledger.remaining(&p, 6 * HOUR), 0);
        assert_eq!(ledger.refill_in_ms(&p, 6 * HOUR), ENERGY_REFILL_MS - HOUR);
        assert_eq!(ledger.remaining(&p, 5 * HOUR + ENERGY_REFILL_MS), MAX_DAILY_PLAYS);
    }

    #[test]
    fn test_consume_persists() {
        let mut ledger = EnergyLedger::default();
        let mut store = MemoryStore::new();
        let p = profile(3, 0);

        let (p, err) = ledger.consume_and_persist(&mut store, &p, 1_000);
        assert!(err.is_none());
        let stored = store.load(p.identity.as_ref().unwrap()).unwrap().unwrap();
        assert_eq!(stored.energy, 2);
        assert_eq!(stored.last_play_ms, 1_000);
    }

    #[test]
    fn test_consume_survives_storage_failure() {
        let mut ledger = EnergyLedger::default();
        let mut store = MemoryStore::new();
        store.set_offline(true);

        let (p, err) = ledger.consume_and_persist(&mut store, &profile(3, 0), 1_000);
        assert_eq!(p.energy, 2);
        assert!(err.is_some());
    }
}
