//! Best-score persistence
//!
//! A single integer in LocalStorage.

use serde::{Deserialize, Serialize};

/// The best score seen on this device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HighScore {
    pub best: u64,
}

impl HighScore {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "neon_high_score";

    pub fn new(best: u64) -> Self {
        Self { best }
    }

    /// Record a final score. Returns true when it beats the stored best.
    pub fn submit(&mut self, score: u64) -> bool {
        if score <= self.best {
            return false;
        }
        log::info!("New high score: {} (was {})", score, self.best);
        self.best = score;
        true
    }

    /// Parse the stored value: a bare integer, or the JSON form (used only in wasm32)
    #[allow(dead_code)]
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        raw.parse::<u64>()
            .ok()
            .map(Self::new)
            .or_else(|| serde_json::from_str::<HighScore>(raw).ok())
    }

    /// Load the high score from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(raw)) = storage.get_item(Self::STORAGE_KEY) {
                if let Some(score) = Self::parse(&raw) {
                    log::info!("Loaded high score {}", score.best);
                    return score;
                }
                log::warn!("Ignoring malformed high score {:?}", raw);
            }
        }

        log::info!("No high score found, starting fresh");
        Self::default()
    }

    /// Save the high score to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if storage
                .set_item(Self::STORAGE_KEY, &self.best.to_string())
                .is_err()
            {
                log::warn!("Failed to save high score");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
