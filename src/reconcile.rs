//! End-of-run score reconciliation
//!
//! Runs once per finished session:
//! 1. New personal best? Write it to the local profile right away.
//! 2. If so, and a ledger plus a wallet are available, ask the player and
//!    submit without waiting for the answer.
//! 3. A run is submitted at most once, however often the prompt is reopened.
//! 4. Remote failure never touches the local best.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, StorageError};
use crate::ledger::{Ledger, LedgerEvent, LedgerReply, LedgerRequest, LedgerResponse, RequestId};
use crate::persistence::{PlayerProfile, ProfileStore, read_modify_write};

/// The terminal artifact of one completed session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    score: u32,
    timestamp_ms: u64,
    is_new_best: bool,
    /// One-way latch; set the moment a submission is dispatched
    submitted: bool,
}

impl RunResult {
    pub fn new(score: u32, timestamp_ms: u64) -> Self {
        Self {
            score,
            timestamp_ms,
            is_new_best: false,
            submitted: false,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn is_new_best(&self) -> bool {
        self.is_new_best
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Flip the latch. Returns false if it was already set.
    fn take_submission(&mut self) -> bool {
        !std::mem::replace(&mut self.submitted, true)
    }
}

/// Why a run was not sent to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    NotNewBest,
    LedgerUnavailable,
    NoIdentity,
    AlreadySubmitted,
}

/// Where the remote half of reconciliation stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Skipped { reason: SkipReason },
    /// The player said no; the prompt may be reopened
    Declined,
    Pending { request: RequestId },
    Confirmed { events: Vec<LedgerEvent> },
    Failed { reason: String },
}

impl SubmissionStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionStatus::Pending { .. })
    }
}

/// Asks the player whether a new best should go on the global board
pub trait ConfirmSubmit {
    fn confirm(&mut self, score: u32) -> bool;
}

impl<F: FnMut(u32) -> bool> ConfirmSubmit for F {
    fn confirm(&mut self, score: u32) -> bool {
        self(score)
    }
}

/// Fixed answer, for headless runs
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl ConfirmSubmit for AutoConfirm {
    fn confirm(&mut self, _score: u32) -> bool {
        self.0
    }
}

/// Result of reconciling one run
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub is_new_best: bool,
    pub previous_best: u32,
    /// Local write failed; the in-memory best is still updated
    pub storage_error: Option<StorageError>,
    pub submission: SubmissionStatus,
}

pub struct ScoreReconciler {
    confirm: Box<dyn ConfirmSubmit>,
    status: SubmissionStatus,
    /// Submissions still waiting on the ledger, oldest first
    in_flight: Vec<RequestId>,
}

impl ScoreReconciler {
    pub fn new(confirm: impl ConfirmSubmit + 'static) -> Self {
        Self {
            confirm: Box::new(confirm),
            status: SubmissionStatus::Idle,
            in_flight: Vec::new(),
        }
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    /// Steps 1 and 2 for a freshly finished run
    pub fn reconcile<S, L>(
        &mut self,
        run: &mut RunResult,
        profile: &mut PlayerProfile,
        store: &mut S,
        ledger: &mut L,
        now_ms: u64,
    ) -> ReconcileOutcome
    where
        S: ProfileStore + ?Sized,
        L: Ledger + ?Sized,
    {
        let previous_best = profile.best_score;
        let mut storage_error = None;

        if run.score > previous_best {
            run.is_new_best = true;
            profile.best_score = run.score;
            log::info!("New best score: {} (was {})", run.score, previous_best);

            if let Some(identity) = profile.identity.clone() {
                let score = run.score;
                if let Err(e) = read_modify_write(store, &identity, |stored| {
                    stored.best_score = stored.best_score.max(score);
                }) {
                    log::warn!("New best not persisted: {}", e);
                    storage_error = Some(e);
                }
            }
        }

        let submission = if run.is_new_best {
            self.offer(run, profile, ledger, now_ms)
        } else {
            SubmissionStatus::Skipped {
                reason: SkipReason::NotNewBest,
            }
        };
        self.status = submission.clone();

        ReconcileOutcome {
            is_new_best: run.is_new_best,
            previous_best,
            storage_error,
            submission,
        }
    }

    /// Ask again (player reopened the prompt). Never sends a run twice.
    pub fn reopen<L: Ledger + ?Sized>(
        &mut self,
        run: &mut RunResult,
        profile: &PlayerProfile,
        ledger: &mut L,
        now_ms: u64,
    ) -> SubmissionStatus {
        if !run.is_new_best {
            return SubmissionStatus::Skipped {
                reason: SkipReason::NotNewBest,
            };
        }
        if run.submitted {
            // Report the refusal without losing track of the real submission
            return SubmissionStatus::Skipped {
                reason: SkipReason::AlreadySubmitted,
            };
        }
        let status = self.offer(run, profile, ledger, now_ms);
        self.status = status.clone();
        status
    }

    fn offer<L: Ledger + ?Sized>(
        &mut self,
        run: &mut RunResult,
        profile: &PlayerProfile,
        ledger: &mut L,
        now_ms: u64,
    ) -> SubmissionStatus {
        if !ledger.is_configured() {
            return SubmissionStatus::Skipped {
                reason: SkipReason::LedgerUnavailable,
            };
        }
        let Some(player) = profile.identity.as_ref().and_then(|i| i.wallet()) else {
            return SubmissionStatus::Skipped {
                reason: SkipReason::NoIdentity,
            };
        };
        if run.submitted {
            return SubmissionStatus::Skipped {
                reason: SkipReason::AlreadySubmitted,
            };
        }
        if !self.confirm.confirm(run.score) {
            log::info!("Submission of {} declined", run.score);
            return SubmissionStatus::Declined;
        }
        if !run.take_submission() {
            return SubmissionStatus::Skipped {
                reason: SkipReason::AlreadySubmitted,
            };
        }

        let request = LedgerRequest::SubmitScore {
            player: player.to_string(),
            score: run.score,
        };
        match ledger.dispatch(request, now_ms) {
            Ok(id) => {
                log::info!("Submitting score {} (request {})", run.score, id);
                self.in_flight.push(id);
                SubmissionStatus::Pending { request: id }
            }
            Err(e) => {
                log::warn!("Score submission failed to start: {}", e);
                SubmissionStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Submissions dispatched and not yet resolved
    pub fn in_flight(&self) -> &[RequestId] {
        &self.in_flight
    }

    /// Feed a ledger reply. Returns the resolved status if the reply was one
    /// of our submissions, including one left over from an earlier run.
    pub fn handle_reply(&mut self, reply: &LedgerReply) -> Option<SubmissionStatus> {
        let index = self.in_flight.iter().position(|id| *id == reply.id)?;
        self.in_flight.remove(index);

        let status = match &reply.result {
            Ok(LedgerResponse::Submitted(events)) => {
                log::info!("Score submission {} confirmed", reply.id);
                SubmissionStatus::Confirmed {
                    events: events.clone(),
                }
            }
            Ok(other) => SubmissionStatus::Failed {
                reason: format!("unexpected ledger response: {other:?}"),
            },
            Err(e) => {
                if matches!(e, LedgerError::Timeout { .. }) {
                    log::warn!("Score submission {} never confirmed", reply.id);
                }
                SubmissionStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        // An earlier run's result must not overwrite the current run's pending state
        let current = matches!(
            self.status,
            SubmissionStatus::Pending { request } if request == reply.id
        );
        if current || !self.status.is_pending() {
            self.status = status.clone();
        }
        Some(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ConfiguredLedger, DisabledLedger, MemoryLedger, ReplyMode};
    use crate::persistence::{Identity, MemoryStore};
    use std::cell::Cell;
    use std::rc::Rc;

    fn wallet_profile(best: u32) -> PlayerProfile {
        PlayerProfile {
            best_score: best,
            ..PlayerProfile::fresh(Identity::Wallet("0xbest".into()))
        }
    }

    #[test]
    fn test_not_a_new_best() {
        let mut reconciler = ScoreReconciler::new(AutoConfirm(true));
        let mut store = MemoryStore::new();
        let mut profile = wallet_profile(10);
        let mut run = RunResult::new(3, 1);

        let outcome = reconciler.reconcile(&mut run, &mut profile, &mut store, &mut DisabledLedger, 1);
        assert!(!outcome.is_new_best);
        assert!(!run.is_new_best());
        assert_eq!(profile.best_score, 10);
        assert_eq!(
            outcome.submission,
            SubmissionStatus::Skipped {
                reason: SkipReason::NotNewBest
            }
        );
        // Nothing written
        assert!(store.load(profile.identity.as_ref().unwrap()).unwrap().is_none());
    }

    #[test]
    fn test_tie_is_not_a_new_best() {
        let mut reconciler = ScoreReconciler::new(AutoConfirm(true));
        let mut profile = wallet_profile(10);
        let mut run = RunResult::new(10, 1);
        let outcome = reconciler.reconcile(
            &mut run,
            &mut profile,
            &mut MemoryStore::new(),
            &mut DisabledLedger,
            1,
        );
        assert!(!outcome.is_new_best);
    }

    #[test]
    fn test_local_best_written_before_remote() {
        let (transport, handle) = MemoryLedger::new();
        handle.set_submit_mode(ReplyMode::Hold);
        let mut ledger = ConfiguredLedger::new(transport, 1_000);
        let mut store = MemoryStore::new();
        let mut profile = wallet_profile(10);
        let mut run = RunResult::new(15, 5);
        let mut reconciler = ScoreReconciler::new(AutoConfirm(true));

        let outcome = reconciler.reconcile(&mut run, &mut profile, &mut store, &mut ledger, 5);
        assert!(outcome.is_new_best);
        assert!(outcome.submission.is_pending());
        let stored = store.load(profile.identity.as_ref().unwrap()).unwrap().unwrap();
        assert_eq!(stored.best_score, 15);

        // Never confirms
        for reply in ledger.poll(5_000) {
            reconciler.handle_reply(&reply);
        }
        assert!(matches!(reconciler.status(), SubmissionStatus::Failed { .. }));
        assert_eq!(profile.best_score, 15);
        assert_eq!(
            store.load(profile.identity.as_ref().unwrap()).unwrap().unwrap().best_score,
            15
        );
    }

    #[test]
    fn test_reopen_never_submits_twice() {
        let (transport, handle) = MemoryLedger::new();
        let mut ledger = ConfiguredLedger::new(transport, 1_000);
        let asked = Rc::new(Cell::new(0));
        let counter = Rc::clone(&asked);
        let mut reconciler = ScoreReconciler::new(move |_score: u32| {
            counter.set(counter.get() + 1);
            true
        });
        let mut profile = wallet_profile(0);
        let mut run = RunResult::new(8, 1);

        reconciler.reconcile(&mut run, &mut profile, &mut MemoryStore::new(), &mut ledger, 1);
        assert!(run.is_submitted());

        let again = reconciler.reopen(&mut run, &profile, &mut ledger, 2);
        assert_eq!(
            again,
            SubmissionStatus::Skipped {
                reason: SkipReason::AlreadySubmitted
            }
        );
        assert_eq!(asked.get(), 1);

        for reply in ledger.poll(3) {
            reconciler.handle_reply(&reply);
        }
        assert!(matches!(reconciler.status(), SubmissionStatus::Confirmed { .. }));
        assert_eq!(handle.submissions(), 1);
    }

    #[test]
    fn test_declined_can_be_reopened() {
        let (transport, handle) = MemoryLedger::new();
        let mut ledger = ConfiguredLedger::new(transport, 1_000);
        let answer = Rc::new(Cell::new(false));
        let shared = Rc::clone(&answer);
        let mut reconciler = ScoreReconciler::new(move |_score: u32| shared.get());
        let mut profile = wallet_profile(0);
        let mut run = RunResult::new(4, 1);

        let outcome =
            reconciler.reconcile(&mut run, &mut profile, &mut MemoryStore::new(), &mut ledger, 1);
        assert_eq!(outcome.submission, SubmissionStatus::Declined);
        assert!(!run.is_submitted());
        assert_eq!(profile.best_score, 4);

        answer.set(true);
        assert!(reconciler.reopen(&mut run, &profile, &mut ledger, 2).is_pending());
        for reply in ledger.poll(2) {
            reconciler.handle_reply(&reply);
        }
        assert_eq!(handle.submissions(), 1);
    }

    #[test]
    fn test_rejected_submission_keeps_local_best() {
        let (transport, handle) = MemoryLedger::new();
        handle.set_submit_mode(ReplyMode::Reject("reverted".into()));
        let mut ledger = ConfiguredLedger::new(transport, 1_000);
        let mut reconciler = ScoreReconciler::new(AutoConfirm(true));
        let mut profile = wallet_profile(2);
        let mut run = RunResult::new(6, 1);

        reconciler.reconcile(&mut run, &mut profile, &mut MemoryStore::new(), &mut ledger, 1);
        let replies = ledger.poll(1);
        let status = reconciler.handle_reply(&replies[0]).unwrap();
        assert!(matches!(status, SubmissionStatus::Failed { .. }));
        assert_eq!(profile.best_score, 6);
    }

    #[test]
    fn test_earlier_submission_still_resolves_after_next_run() {
        let (transport, handle) = MemoryLedger::new();
        handle.set_submit_mode(ReplyMode::Hold);
        let mut ledger = ConfiguredLedger::new(transport, 10_000);
        let mut reconciler = ScoreReconciler::new(AutoConfirm(true));
        let mut store = MemoryStore::new();
        let mut profile = wallet_profile(0);

        let mut first = RunResult::new(12, 1);
        reconciler.reconcile(&mut first, &mut profile, &mut store, &mut ledger, 1);
        assert_eq!(reconciler.in_flight().len(), 1);

        let mut second = RunResult::new(3, 2);
        let outcome = reconciler.reconcile(&mut second, &mut profile, &mut store, &mut ledger, 2);
        assert_eq!(
            outcome.submission,
            SubmissionStatus::Skipped {
                reason: SkipReason::NotNewBest
            }
        );

        handle.release_held();
        let resolved: Vec<SubmissionStatus> = ledger
            .poll(3)
            .iter()
            .filter_map(|reply| reconciler.handle_reply(reply))
            .collect();
        assert_eq!(resolved.len(), 1);
        assert!(matches!(resolved[0], SubmissionStatus::Confirmed { .. }));
        assert!(matches!(reconciler.status(), SubmissionStatus::Confirmed { .. }));
        assert!(reconciler.in_flight().is_empty());
    }

    #[test]
    fn test_older_result_does_not_replace_current_pending() {
        let (transport, handle) = MemoryLedger::new();
        handle.set_submit_mode(ReplyMode::Hold);
        let mut ledger = ConfiguredLedger::new(transport, 1_000);
        let mut reconciler = ScoreReconciler::new(AutoConfirm(true));
        let mut store = MemoryStore::new();
        let mut profile = wallet_profile(0);

        let mut first = RunResult::new(5, 0);
        reconciler.reconcile(&mut first, &mut profile, &mut store, &mut ledger, 0);
        let mut second = RunResult::new(9, 800);
        reconciler.reconcile(&mut second, &mut profile, &mut store, &mut ledger, 800);
        assert_eq!(handle.held_count(), 2);

        // Only the first deadline has passed
        let replies = ledger.poll(1_000);
        assert_eq!(replies.len(), 1);
        let status = reconciler.handle_reply(&replies[0]).unwrap();
        assert!(matches!(status, SubmissionStatus::Failed { .. }));
        assert!(reconciler.status().is_pending());
        assert_eq!(reconciler.in_flight().len(), 1);
    }

    #[test]
    fn test_anonymous_player_is_not_submitted() {
        let (transport, handle) = MemoryLedger::new();
        let mut ledger = ConfiguredLedger::new(transport, 1_000);
        let mut reconciler = ScoreReconciler::new(AutoConfirm(true));
        let mut profile = PlayerProfile::fresh(Identity::Anonymous("guest".into()));
        let mut run = RunResult::new(6, 1);

        let outcome =
            reconciler.reconcile(&mut run, &mut profile, &mut MemoryStore::new(), &mut ledger, 1);
        assert!(outcome.is_new_best);
        assert_eq!(
            outcome.submission,
            SubmissionStatus::Skipped {
                reason: SkipReason::NoIdentity
            }
        );
        assert_eq!(handle.submissions(), 0);
    }

    #[test]
    fn test_storage_failure_is_reported_not_fatal() {
        let mut store = MemoryStore::new();
        store.set_offline(true);
        let mut reconciler = ScoreReconciler::new(AutoConfirm(false));
        let mut profile = wallet_profile(1);
        let mut run = RunResult::new(9, 1);

        let outcome = reconciler.reconcile(&mut run, &mut profile, &mut store, &mut DisabledLedger, 1);
        assert!(outcome.is_new_best);
        assert!(outcome.storage_error.is_some());
        assert_eq!(profile.best_score, 9);
        assert_eq!(
            outcome.submission,
            SubmissionStatus::Skipped {
                reason: SkipReason::LedgerUnavailable
            }
        );
    }
}
