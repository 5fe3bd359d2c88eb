//! Game state and core simulation types
//!
//! Everything a frame reads or writes lives in [`GameState`]; the renderer only
//! ever borrows it immutably.

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::ActiveEffects;
use super::events::GameEvent;
use super::spawn::SpawnTimers;
use crate::consts::*;

/// Top-level session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Title screen, world idles at menu speed
    Menu,
    /// Active run
    Playing,
    /// Run ended, world frozen
    GameOver,
}

/// One of the three travel corridors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lane {
    Left,
    #[default]
    Center,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Center, Lane::Right];

    /// Map an input-boundary index (0, 1, 2) to a lane
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Lane::Left),
            1 => Some(Lane::Center),
            2 => Some(Lane::Right),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Lane::Left => 0,
            Lane::Center => 1,
            Lane::Right => 2,
        }
    }

    /// Lateral offset in lanes: -1, 0 or 1
    pub fn offset(self) -> f32 {
        self.index() as f32 - 1.0
    }

    /// Canonical world x of the lane centre
    pub fn world_x(self) -> f32 {
        self.offset() * LANE_WIDTH
    }
}

/// The player's car
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Continuous lateral position in lanes (~[-1, 1])
    pub offset: f32,
    /// Lane the input asked for
    pub target: Lane,
    /// Visual lean in degrees, opposite to the remaining lane distance
    pub tilt: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            offset: 0.0,
            target: Lane::Center,
            tilt: 0.0,
        }
    }
}

impl Player {
    /// Ease toward the target lane. Always driven with real (unscaled) time.
    pub fn steer(&mut self, dt: f32) {
        let diff = self.target.offset() - self.offset;
        self.tilt = -diff * TILT_PER_LANE;
        self.offset += diff * (STEER_RATE * dt).min(1.0);
    }

    /// World x of the car
    pub fn world_x(&self) -> f32 {
        self.offset * LANE_WIDTH
    }
}

/// Common view over lane-bound entities (obstacles, coins, power-ups)
pub trait TrackEntity {
    fn lane(&self) -> Lane;
    fn z(&self) -> f32;
    fn z_mut(&mut self) -> &mut f32;
    fn is_active(&self) -> bool;
    fn deactivate(&mut self);

    /// World position of the entity on the ground plane
    fn world_pos(&self) -> Vec3 {
        Vec3::new(self.lane().world_x(), 0.0, self.z())
    }
}

macro_rules! impl_track_entity {
    ($ty:ty) => {
        impl TrackEntity for $ty {
            fn lane(&self) -> Lane {
                self.lane
            }
            fn z(&self) -> f32 {
                self.z
            }
            fn z_mut(&mut self) -> &mut f32 {
                &mut self.z
            }
            fn is_active(&self) -> bool {
                self.active
            }
            fn deactivate(&mut self) {
                self.active = false;
            }
        }
    };
}

/// A barrier that damages the car on contact
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub lane: Lane,
    pub z: f32,
    pub active: bool,
}

impl Obstacle {
    pub fn new(lane: Lane, z: f32) -> Self {
        Self { lane, z, active: true }
    }
}

/// A collectible coin
#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    pub lane: Lane,
    pub z: f32,
    pub active: bool,
}

impl Coin {
    pub fn new(lane: Lane, z: f32) -> Self {
        Self { lane, z, active: true }
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Absorbs the next obstacle hit
    Shield,
    /// Halves world time for a while
    SlowMotion,
    /// Doubles score gains for a while
    Multiplier,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::Shield,
        PowerUpKind::SlowMotion,
        PowerUpKind::Multiplier,
    ];

    /// Neon color used for the artifact and its collection burst
    pub fn color(self) -> [f32; 4] {
        match self {
            PowerUpKind::Shield => [0.0, 1.0, 0.0, 1.0],
            PowerUpKind::SlowMotion => [0.0, 1.0, 1.0, 1.0],
            PowerUpKind::Multiplier => [0.6, 0.0, 1.0, 1.0],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PowerUpKind::Shield => "SHIELD",
            PowerUpKind::SlowMotion => "SLOWMO",
            PowerUpKind::Multiplier => "MULT",
        }
    }
}

/// A power-up artifact on the track
#[derive(Debug, Clone, PartialEq)]
pub struct PowerUp {
    pub lane: Lane,
    pub z: f32,
    pub active: bool,
    pub kind: PowerUpKind,
}

impl PowerUp {
    pub fn new(lane: Lane, z: f32, kind: PowerUpKind) -> Self {
        Self {
            lane,
            z,
            active: true,
            kind,
        }
    }
}

impl_track_entity!(Obstacle);
impl_track_entity!(Coin);
impl_track_entity!(PowerUp);

/// Particle types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    /// Ballistic spark from a collection or shield break
    Spark,
    /// Ballistic gold square from a coin burst
    Square,
    /// Short white flash at a coin pickup
    Flash,
    /// Ambient speed dust, lives until it scrolls past the camera
    Dust,
}

impl ParticleKind {
    /// Life lost per game second, `None` for persistent kinds
    pub fn decay_rate(self) -> Option<f32> {
        match self {
            ParticleKind::Spark | ParticleKind::Square => Some(2.0),
            ParticleKind::Flash => Some(10.0),
            ParticleKind::Dust => None,
        }
    }

    /// Whether velocity and gravity apply
    pub fn is_ballistic(self) -> bool {
        matches!(self, ParticleKind::Spark | ParticleKind::Square)
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec3,
    /// Screen-plane velocity (x, y) for ballistic kinds
    pub vel: Vec2,
    pub life: f32,
    pub kind: ParticleKind,
    pub color: [f32; 4],
}

impl Particle {
    /// Temporary particles die when their life runs out
    pub fn is_alive(&self) -> bool {
        self.kind.decay_rate().is_none() || self.life > 0.0
    }
}

/// One point of the light trail behind the car
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSegment {
    pub x: f32,
    pub z: f32,
    pub life: f32,
}

/// A background building
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub height: f32,
}

/// Complete game state for one session
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the session RNG was created from
    pub seed: u64,
    /// Session RNG (spawn lanes, kinds, particle spread)
    pub rng: Pcg32,
    pub phase: SessionPhase,
    /// Score (frozen once the run ends)
    pub score: u64,
    /// Fractional distance score not yet credited
    pub score_carry: f32,
    pub coins_collected: u32,
    pub health: u8,
    /// World speed (units per game second)
    pub speed: f32,
    /// Distance travelled (drives lane marker scroll)
    pub distance: f32,
    pub player: Player,
    pub obstacles: Vec<Obstacle>,
    pub coins: Vec<Coin>,
    pub powerups: Vec<PowerUp>,
    pub particles: Vec<Particle>,
    pub trail: Vec<TrailSegment>,
    pub scenery: Vec<Building>,
    /// Active power-up effects
    pub effects: ActiveEffects,
    pub spawn_timers: SpawnTimers,
    /// Remaining invulnerability after damage (real seconds)
    pub invulnerable: f32,
    /// Red crash overlay timer (real seconds)
    pub damage_flash: f32,
    /// Green shield-break overlay timer (real seconds)
    pub shield_flash: f32,
    /// Proximity warning throttle (real seconds)
    pub warning_cooldown: f32,
    /// Upper bound on live particles (from quality settings)
    pub max_particles: usize,
    /// Whether scenery and dust are spawned
    pub ambient_effects: bool,
    /// Outbound intents for audio/UI collaborators, drained each frame
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new session sitting on the menu
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: SessionPhase::Menu,
            score: 0,
            score_carry: 0.0,
            coins_collected: 0,
            health: MAX_HEALTH,
            speed: SPEED_MENU,
            distance: 0.0,
            player: Player::default(),
            obstacles: Vec::new(),
            coins: Vec::new(),
            powerups: Vec::new(),
            particles: Vec::new(),
            trail: Vec::new(),
            scenery: Vec::new(),
            effects: ActiveEffects::default(),
            spawn_timers: SpawnTimers::default(),
            invulnerable: 0.0,
            damage_flash: 0.0,
            shield_flash: 0.0,
            warning_cooldown: 0.0,
            max_particles: 500,
            ambient_effects: true,
            events: Vec::new(),
        }
    }

    /// Queue an outbound event
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all queued events, leaving the queue empty
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Speed as a fraction of top speed (0..1)
    pub fn speed_ratio(&self) -> f32 {
        (self.speed / SPEED_MAX).clamp(0.0, 1.0)
    }

    /// Clear every entity collection
    pub fn clear_entities(&mut self) {
        self.obstacles.clear();
        self.coins.clear();
        self.powerups.clear();
        self.particles.clear();
        self.trail.clear();
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }
}
