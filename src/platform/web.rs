//! Browser binding
//!
//! The page owns the canvas and `requestAnimationFrame`; it forwards input
//! here and draws whatever [`WebGame::snapshot_json`] returns.

use wasm_bindgen::prelude::*;

use crate::ledger::DisabledLedger;
use crate::persistence::LocalStorageStore;
use crate::reconcile::AutoConfirm;
use crate::session::{SessionConfig, SessionController};
use crate::settings::Settings;

use super::{fresh_seed, now_ms};

#[wasm_bindgen]
pub struct WebGame {
    session: SessionController<DisabledLedger, LocalStorageStore>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        console_error_panic_hook::set_once();
        // Already initialized when a second game is constructed
        let _ = console_log::init_with_level(log::Level::Info);

        let settings = Settings::load();
        let config = SessionConfig::from_settings(&settings, fresh_seed());
        log::info!("Game initialized with seed: {}", config.seed);

        // No RPC transport ships with the web build yet; high scores stay local
        let session = SessionController::new(
            config,
            LocalStorageStore,
            DisabledLedger,
            AutoConfirm(false),
            now_ms(),
        );
        WebGame { session }
    }

    /// Start, jump or retry depending on the current screen.
    /// Returns an error message if the press was refused.
    pub fn press(&mut self) -> Option<String> {
        self.session.press(now_ms()).err().map(|e| e.to_string())
    }

    pub fn jump(&mut self) {
        if let Err(e) = self.session.jump() {
            log::debug!("{}", e);
        }
    }

    pub fn view_leaderboard(&mut self) -> Option<String> {
        self.session
            .view_leaderboard(now_ms())
            .err()
            .map(|e| e.to_string())
    }

    pub fn back(&mut self) -> Option<String> {
        self.session.back().err().map(|e| e.to_string())
    }

    /// Advance by `dt` seconds of wall time; call once per animation frame
    pub fn frame(&mut self, dt: f32) -> u32 {
        self.session.frame(dt, now_ms())
    }

    /// Stop ticking (page hidden or unmounting)
    pub fn stop(&mut self) {
        self.session.stop();
    }

    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.session.snapshot(now_ms())).unwrap_or_default()
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
