//! Outbound game events
//!
//! The simulation only appends intents here; the app layer drains the queue
//! once per frame and drives audio/UI/persistence from it.

use super::state::{Lane, PowerUpKind};

/// What was hit, for collision sound selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactKind {
    /// Obstacle struck the car
    Crash,
    /// Obstacle absorbed by the shield
    ShieldBreak,
}

/// Something collaborators may want to react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// A run began (engine + music should start)
    RunStarted,
    /// Returned to the title screen
    ReturnedToMenu,
    /// Health reached zero; score is final
    RunEnded { score: u64 },
    /// Player input selected a different lane
    LaneChanged(Lane),
    /// An obstacle was hit
    Impact(ImpactKind),
    /// Health was lost
    Damaged { health: u8 },
    /// A power-up was picked up
    PowerUpCollected(PowerUpKind),
    /// A timed effect ran out
    EffectExpired(PowerUpKind),
    /// A coin was picked up
    CoinCollected { value: u64, total: u32 },
    /// An obstacle is close ahead (throttled)
    ProximityWarning,
}
