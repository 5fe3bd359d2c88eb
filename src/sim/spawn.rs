//! Entity lifecycle: spawning, movement, ageing and culling
//!
//! Obstacles, coins and power-ups appear at `SPAWN_Z` and scroll toward the
//! camera. All three classes share one spacing guard derived from the most
//! recently spawned obstacle, so nothing lands inside an obstacle's safe gap.

use glam::{Vec2, Vec3};
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{
    Building, Coin, GameState, Lane, Obstacle, Particle, ParticleKind, PowerUp, PowerUpKind,
    TrackEntity, TrailSegment,
};
use crate::consts::*;

/// Accumulating spawn timers (game seconds)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnTimers {
    pub obstacle: f32,
    pub power_up: f32,
    pub coin: f32,
}

/// Minimum depth gap between consecutive obstacles at a given speed
#[inline]
pub fn min_spacing(speed: f32) -> f32 {
    SPACING_FACTOR * speed
}

/// Whether a new entity may appear at the spawn plane
pub fn spacing_clear(obstacles: &[Obstacle], speed: f32) -> bool {
    match obstacles.last() {
        None => true,
        Some(last) => SPAWN_Z - last.z > min_spacing(speed),
    }
}

fn random_lane(rng: &mut Pcg32) -> Lane {
    Lane::ALL[rng.random_range(0..Lane::ALL.len())]
}

fn random_kind(rng: &mut Pcg32) -> PowerUpKind {
    PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())]
}

/// Advance spawn timers and spawn whatever the policy permits
pub fn spawn_entities(state: &mut GameState, game_dt: f32) {
    let timers = &mut state.spawn_timers;
    timers.obstacle += game_dt;
    timers.power_up += game_dt;
    timers.coin += game_dt;

    if state.spawn_timers.obstacle > OBSTACLE_INTERVAL
        && spacing_clear(&state.obstacles, state.speed)
    {
        let lane = random_lane(&mut state.rng);
        state.obstacles.push(Obstacle::new(lane, SPAWN_Z));
        state.spawn_timers.obstacle = 0.0;
    }

    if state.spawn_timers.power_up > POWERUP_INTERVAL
        && spacing_clear(&state.obstacles, state.speed)
    {
        let lane = random_lane(&mut state.rng);
        let kind = random_kind(&mut state.rng);
        state.powerups.push(PowerUp::new(lane, SPAWN_Z, kind));
        state.spawn_timers.power_up = 0.0;
    }

    if state.spawn_timers.coin > COIN_INTERVAL && spacing_clear(&state.obstacles, state.speed) {
        let lane = random_lane(&mut state.rng);
        state.coins.push(Coin::new(lane, SPAWN_Z));
        state.spawn_timers.coin = 0.0;
    }

    if state.ambient_effects && state.rng.random::<f32>() < DUST_RATE * game_dt {
        spawn_dust(state);
    }
}

fn spawn_dust(state: &mut GameState) {
    if state.particles.len() >= state.max_particles {
        return;
    }
    let rng = &mut state.rng;
    let x = rng.random_range(-2000.0..2000.0);
    let y = rng.random_range(0.0..1200.0);
    let z = rng.random_range(2000.0..SPAWN_Z);
    state.particles.push(Particle {
        pos: Vec3::new(x, y, z),
        vel: Vec2::ZERO,
        life: 1.0,
        kind: ParticleKind::Dust,
        color: [0.6, 0.9, 1.0, 1.0],
    });
}

fn advance_track<T: TrackEntity>(entities: &mut [T], distance: f32) {
    for entity in entities {
        *entity.z_mut() -= distance;
    }
}

/// Scroll track entities and age particles by game time
pub fn advance_entities(state: &mut GameState, game_dt: f32) {
    let distance = state.speed * game_dt;
    advance_track(&mut state.obstacles, distance);
    advance_track(&mut state.coins, distance);
    advance_track(&mut state.powerups, distance);

    for particle in &mut state.particles {
        particle.pos.z -= distance;
        if particle.kind.is_ballistic() {
            particle.pos.x += particle.vel.x * game_dt;
            // World y points up, so gravity pulls velocity negative
            particle.pos.y += particle.vel.y * game_dt;
            particle.vel.y -= PARTICLE_GRAVITY * game_dt;
        }
        if let Some(rate) = particle.kind.decay_rate() {
            particle.life -= rate * game_dt;
        }
    }
}

/// Drop everything that has passed the camera or run out of life
pub fn cull_entities(state: &mut GameState) {
    state.obstacles.retain(|o| o.z > CULL_Z);
    state.coins.retain(|c| c.z > CULL_Z);
    state.powerups.retain(|p| p.z > CULL_Z);
    state
        .particles
        .retain(|p| p.pos.z > CULL_Z && p.is_alive());
}

/// Spawn, scroll and cull background buildings (parallax)
pub fn update_scenery(state: &mut GameState, game_dt: f32) {
    if state.ambient_effects && state.rng.random::<f32>() < SCENERY_RATE * game_dt {
        let rng = &mut state.rng;
        let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let x = side * rng.random_range(1000.0..3000.0);
        let width = rng.random_range(200.0..500.0);
        let height = rng.random_range(500.0..1500.0);
        state.scenery.push(Building {
            x,
            z: SCENERY_SPAWN_Z,
            width,
            height,
        });
    }

    let distance = state.speed * game_dt * SCENERY_PARALLAX;
    for building in &mut state.scenery {
        building.z -= distance;
    }
    state.scenery.retain(|b| b.z > SCENERY_CULL_Z);
}

/// Lay a trail point at the car and age the rest
pub fn update_trail(state: &mut GameState, game_dt: f32) {
    state.trail.push(TrailSegment {
        x: state.player.world_x(),
        z: PLAYER_Z,
        life: TRAIL_LIFE,
    });

    let distance = state.speed * game_dt;
    for segment in &mut state.trail {
        segment.z -= distance;
        segment.life -= game_dt;
    }
    state.trail.retain(|s| s.life > 0.0);
}

/// Burst of sparks (power-up pickup, shield break)
pub fn spawn_explosion(state: &mut GameState, origin: Vec3, color: [f32; 4]) {
    for _ in 0..SPARK_COUNT {
        let vel = Vec2::new(
            (state.rng.random::<f32>() - 0.5) * 500.0,
            (state.rng.random::<f32>() - 0.5) * 500.0 + 200.0,
        );
        push_particle(state, origin, vel, 1.0, ParticleKind::Spark, color);
    }
}

/// Gold squares plus a bright flash (coin pickup)
pub fn spawn_coin_burst(state: &mut GameState, origin: Vec3) {
    const GOLD: [f32; 4] = [1.0, 0.84, 0.0, 1.0];
    for _ in 0..COIN_SQUARE_COUNT {
        let vel = Vec2::new(
            (state.rng.random::<f32>() - 0.5) * 600.0,
            (state.rng.random::<f32>() - 0.5) * 600.0 + 100.0,
        );
        push_particle(state, origin, vel, 1.0, ParticleKind::Square, GOLD);
    }
    push_particle(
        state,
        origin,
        Vec2::ZERO,
        0.3,
        ParticleKind::Flash,
        [1.0, 1.0, 1.0, 1.0],
    );
}

fn push_particle(
    state: &mut GameState,
    pos: Vec3,
    vel: Vec2,
    life: f32,
    kind: ParticleKind,
    color: [f32; 4],
) {
    if state.particles.len() >= state.max_particles {
        return;
    }
    state.particles.push(Particle {
        pos,
        vel,
        life,
        kind,
        color,
    });
}
