//! Base Runner entry point
//!
//! Native builds run a headless autopilot through every run the energy bar
//! allows and log the results. The web build is driven from JavaScript
//! through `platform::web::WebGame`.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use base_runner::consts::SIM_DT;
    use base_runner::leaderboard::{LeaderboardView, format_age, short_address};
    use base_runner::ledger::{ConfiguredLedger, DisabledLedger, Ledger, MemoryLedger};
    use base_runner::persistence::{FileStore, MemoryStore, ProfileStore};
    use base_runner::platform::{fresh_seed, now_ms};
    use base_runner::reconcile::AutoConfirm;
    use base_runner::session::{SessionConfig, SessionController, SessionEvent, SessionPhase};
    use base_runner::{SessionError, Settings};

    /// Give up on a run that survives this long (autopilot can be too good)
    const MAX_FRAMES_PER_RUN: u32 = 60 * 180;
    /// Frames spent waiting for ledger replies between runs
    const SETTLE_FRAMES: u32 = 30;
    const FRAME_MS: u64 = 16;

    pub fn run() {
        let settings = Settings::load();
        let config = SessionConfig::from_settings(&settings, fresh_seed());
        log::info!("Seed: {}", config.seed);

        match settings.profile_dir.clone() {
            Some(dir) => {
                log::info!("Profiles stored in {}", dir);
                with_ledger(&settings, config, FileStore::new(dir));
            }
            None => with_ledger(&settings, config, MemoryStore::new()),
        }
    }

    fn with_ledger<S: ProfileStore>(settings: &Settings, config: SessionConfig, store: S) {
        match settings.active_ledger() {
            Some(ledger) => {
                log::info!(
                    "Ledger {} at {} (simulated in-process)",
                    ledger.contract_address,
                    ledger.endpoint
                );
                let (transport, handle) = MemoryLedger::new();
                let session = SessionController::new(
                    config,
                    store,
                    ConfiguredLedger::new(transport, ledger.timeout_ms),
                    AutoConfirm(true),
                    now_ms(),
                );
                play(session);
                log::info!("Ledger accepted {} submission(s)", handle.submissions());
            }
            None => {
                log::info!("No ledger configured; scores stay local");
                let session =
                    SessionController::new(config, store, DisabledLedger, AutoConfirm(true), now_ms());
                play(session);
            }
        }
    }

    /// Jump when the next obstacle's leading edge is about to reach the player
    fn autopilot<L: Ledger, S: ProfileStore>(session: &SessionController<L, S>) -> bool {
        let tuning = session.tuning();
        let game = session.game();
        let front = tuning.player_x + tuning.player_size;
        let lead = game.speed() * 6.0;
        game.field
            .obstacles()
            .iter()
            .filter(|o| !o.scored)
            .any(|o| o.x >= front && o.x - front <= lead)
    }

    fn play<L: Ledger, S: ProfileStore>(mut session: SessionController<L, S>) {
        let mut now = now_ms();
        settle(&mut session, &mut now);

        loop {
            match session.press(now) {
                Ok(()) => {}
                Err(SessionError::NoEnergy { refill_in_ms }) => {
                    println!(
                        "Out of energy, next refill in {:.1} h",
                        refill_in_ms as f64 / 3_600_000.0
                    );
                    break;
                }
                Err(e) => {
                    log::warn!("{}", e);
                    break;
                }
            }

            let mut frames = 0;
            while session.phase() == SessionPhase::Playing && frames < MAX_FRAMES_PER_RUN {
                if autopilot(&session) {
                    // Ignored while airborne
                    let _ = session.jump();
                }
                now += FRAME_MS;
                session.frame(SIM_DT, now);
                frames += 1;
            }
            if session.phase() == SessionPhase::Playing {
                println!("Run capped at score {}", session.game().score);
                session.stop();
                break;
            }

            settle(&mut session, &mut now);
            report(&mut session);
        }

        show_leaderboard(&mut session, &mut now);
        session.stop();
    }

    fn settle<L: Ledger, S: ProfileStore>(session: &mut SessionController<L, S>, now: &mut u64) {
        for _ in 0..SETTLE_FRAMES {
            if session.ledger().in_flight() == 0 {
                break;
            }
            *now += FRAME_MS;
            session.poll_remote(*now);
        }
        session.poll_remote(*now);
    }

    fn report<L: Ledger, S: ProfileStore>(session: &mut SessionController<L, S>) {
        for event in session.take_events() {
            match event {
                SessionEvent::GameOver { score, is_new_best } => {
                    println!(
                        "Game over: score {}{}",
                        score,
                        if is_new_best { " (new best!)" } else { "" }
                    );
                }
                SessionEvent::Submission(status) => log::info!("Submission: {:?}", status),
                SessionEvent::StorageFailed(e) => log::warn!("Storage: {}", e),
                _ => {}
            }
        }
    }

    fn show_leaderboard<L: Ledger, S: ProfileStore>(
        session: &mut SessionController<L, S>,
        now: &mut u64,
    ) {
        if session.view_leaderboard(*now).is_err() {
            return;
        }
        settle(session, now);

        match session.leaderboard() {
            LeaderboardView::Ready {
                snapshot,
                player_rank,
                total_players,
            } => {
                println!("Leaderboard ({} players)", total_players.unwrap_or(0));
                if snapshot.is_empty() {
                    println!("  No scores yet");
                }
                for (i, entry) in snapshot.entries.iter().enumerate() {
                    println!(
                        "{:>3}. {:<14} {:>5}  {}",
                        i + 1,
                        short_address(&entry.player),
                        entry.score,
                        format_age(*now, entry.timestamp)
                    );
                }
                if let Some(rank) = player_rank {
                    println!("Your rank: #{}", rank);
                }
            }
            _ => println!("Leaderboard unavailable"),
        }
        println!("Best score: {}", session.profile().best_score);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Base Runner (native) starting...");
    log::info!("Native mode runs a headless autopilot - build for wasm32 to play in a browser");
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::WebGame, this is just to satisfy the compiler
}
