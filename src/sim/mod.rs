//! Simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering and
//! platform code:
//! - Seeded RNG only
//! - Side effects leave as queued `GameEvent`s
//! - Entity collections are only compacted with `retain` after iteration

pub mod collision;
pub mod effects;
pub mod events;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{check_collisions, is_hit};
pub use effects::ActiveEffects;
pub use events::{GameEvent, ImpactKind};
pub use spawn::{min_spacing, spacing_clear};
pub use state::{
    Building, Coin, GameState, Lane, Obstacle, Particle, ParticleKind, Player, PowerUp,
    PowerUpKind, SessionPhase, TrackEntity, TrailSegment,
};
pub use tick::{TickInput, end_run, return_to_menu, set_lane, start_run, tick};
