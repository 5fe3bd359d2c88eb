//! Neon Racer - A three-lane arcade racer
//!
//! Core modules:
//! - `sim`: Simulation (spawning, movement, collisions, power-ups, scoring)
//! - `renderer`: Perspective projection, vertex generation and the WebGPU pipeline
//! - `input`: Lane signals from the head tracker or keyboard
//! - `app`: Frame driver that wires the simulation to its collaborators
//! - `highscores` / `settings`: Persisted player data
//! - `error`: Startup failures

pub mod app;
pub mod error;
pub mod highscores;
pub mod input;
pub mod renderer;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod audio;

pub use app::{AudioSink, Game, HudSink, HudSnapshot, SoundEffect};
pub use error::InitError;
pub use highscores::HighScore;
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Largest frame delta fed to the simulation (tab suspend, slow frames)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// World speed at the start of a run (units/s)
    pub const SPEED_INITIAL: f32 = 600.0;
    /// Top world speed
    pub const SPEED_MAX: f32 = 2000.0;
    /// Idle scroll speed while the menu is shown
    pub const SPEED_MENU: f32 = 300.0;
    /// Speed gained per second of game time
    pub const ACCELERATION: f32 = 10.0;
    /// Score per world unit travelled (before multiplier)
    pub const SCORE_PER_UNIT: f32 = 0.1;

    /// Three lanes, `LANE_WIDTH` apart in world x
    pub const LANE_COUNT: u8 = 3;
    pub const LANE_WIDTH: f32 = 300.0;

    /// Perspective camera
    pub const FOV: f32 = 700.0;
    pub const CAMERA_Y: f32 = 400.0;
    pub const CAMERA_Z: f32 = -600.0;
    /// Points closer than this to the camera plane are not drawn
    pub const NEAR_PLANE: f32 = 10.0;

    /// Depth at which track entities appear
    pub const SPAWN_Z: f32 = 4000.0;
    /// Depth below which track entities and particles are removed
    pub const CULL_Z: f32 = -200.0;
    /// Depth of the player's car
    pub const PLAYER_Z: f32 = 50.0;

    /// Spawn intervals (game seconds)
    pub const OBSTACLE_INTERVAL: f32 = 0.8;
    pub const POWERUP_INTERVAL: f32 = 5.0;
    pub const COIN_INTERVAL: f32 = 0.2;
    /// Minimum obstacle gap = factor * speed
    pub const SPACING_FACTOR: f32 = 1.0;

    /// Hit band around the player's depth plane
    pub const HIT_Z_MIN: f32 = -50.0;
    pub const HIT_Z_MAX: f32 = 70.0;
    /// Lateral tolerance in lanes
    pub const HIT_LANE_TOLERANCE: f32 = 0.6;

    /// Health
    pub const MAX_HEALTH: u8 = 3;
    /// Invulnerability after taking damage (real seconds)
    pub const INVULNERABILITY_SECS: f32 = 1.5;
    pub const DAMAGE_FLASH_SECS: f32 = 0.4;
    pub const SHIELD_FLASH_SECS: f32 = 0.2;

    /// Power-up effects (real seconds)
    pub const SLOW_MOTION_SECS: f32 = 5.0;
    pub const SLOW_MOTION_SCALE: f32 = 0.5;
    pub const MULTIPLIER_SECS: f32 = 10.0;
    pub const MULTIPLIER: u32 = 2;

    /// Points per coin (before multiplier)
    pub const COIN_VALUE: u64 = 100;

    /// Player lateral smoothing rate (1/s)
    pub const STEER_RATE: f32 = 10.0;
    /// Tilt in degrees per lane of remaining distance
    pub const TILT_PER_LANE: f32 = 30.0;

    /// Proximity warning band and throttle
    pub const WARNING_Z_MIN: f32 = -50.0;
    pub const WARNING_Z_MAX: f32 = 300.0;
    pub const WARNING_COOLDOWN_SECS: f32 = 0.5;

    /// Trail segment lifetime (game seconds)
    pub const TRAIL_LIFE: f32 = 0.5;

    /// Scenery (parallax buildings)
    pub const SCENERY_SPAWN_Z: f32 = 6000.0;
    pub const SCENERY_CULL_Z: f32 = -500.0;
    pub const SCENERY_PARALLAX: f32 = 0.5;
    /// Expected buildings per game second
    pub const SCENERY_RATE: f32 = 3.0;

    /// Particles
    pub const SPARK_COUNT: usize = 15;
    pub const COIN_SQUARE_COUNT: usize = 20;
    pub const PARTICLE_GRAVITY: f32 = 500.0;
    /// Expected dust motes per game second while playing
    pub const DUST_RATE: f32 = 12.0;

    /// Onboarding power-up placed at the start of every run
    pub const ONBOARDING_POWERUP_Z: f32 = 1500.0;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Linear interpolation between two RGBA colors
#[inline]
pub fn lerp_color(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        lerp(a[0], b[0], t),
        lerp(a[1], b[1], t),
        lerp(a[2], b[2], t),
        lerp(a[3], b[3], t),
    ]
}
