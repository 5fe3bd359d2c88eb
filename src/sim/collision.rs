//! Collision detection and scoring
//!
//! The player occupies a thin depth band around `PLAYER_Z`. Anything active in
//! that band and within `HIT_LANE_TOLERANCE` lanes of the car's continuous
//! offset is hit. Each entity can be hit at most once because a hit deactivates it.

use glam::Vec3;

use super::events::{GameEvent, ImpactKind};
use super::spawn::{spawn_coin_burst, spawn_explosion};
use super::state::{GameState, PowerUpKind, SessionPhase, TrackEntity};
use crate::consts::*;

/// Result of the per-entity hit test
#[inline]
pub fn is_hit<T: TrackEntity>(entity: &T, player_offset: f32) -> bool {
    entity.is_active()
        && entity.z() > HIT_Z_MIN
        && entity.z() < HIT_Z_MAX
        && (player_offset - entity.lane().offset()).abs() < HIT_LANE_TOLERANCE
}

/// Collect indices of entities hit this frame (array order)
fn hits<T: TrackEntity>(entities: &[T], player_offset: f32) -> Vec<usize> {
    entities
        .iter()
        .enumerate()
        .filter(|(_, e)| is_hit(*e, player_offset))
        .map(|(i, _)| i)
        .collect()
}

/// Burst origin: the struck lane at the car's bumper depth
fn impact_point(lane_x: f32) -> Vec3 {
    Vec3::new(lane_x, 0.0, PLAYER_Z)
}

/// Run obstacle, power-up and coin checks once each, in that order
pub fn check_collisions(state: &mut GameState) {
    let offset = state.player.offset;

    for i in hits(&state.obstacles, offset) {
        if state.phase != SessionPhase::Playing {
            return;
        }
        let obstacle = &mut state.obstacles[i];
        obstacle.deactivate();
        let lane_x = obstacle.lane.world_x();
        hit_obstacle(state, lane_x);
    }

    for i in hits(&state.powerups, offset) {
        if state.phase != SessionPhase::Playing {
            return;
        }
        let powerup = &mut state.powerups[i];
        powerup.deactivate();
        let (kind, lane_x) = (powerup.kind, powerup.lane.world_x());
        collect_powerup(state, kind);
        spawn_explosion(state, impact_point(lane_x), kind.color());
    }

    for i in hits(&state.coins, offset) {
        if state.phase != SessionPhase::Playing {
            return;
        }
        let coin = &mut state.coins[i];
        coin.deactivate();
        let lane_x = coin.lane.world_x();
        collect_coin(state);
        spawn_coin_burst(state, impact_point(lane_x));
    }
}

fn hit_obstacle(state: &mut GameState, lane_x: f32) {
    if state.effects.absorb_hit() {
        state.shield_flash = SHIELD_FLASH_SECS;
        state.emit(GameEvent::Impact(ImpactKind::ShieldBreak));
        spawn_explosion(
            state,
            impact_point(lane_x),
            PowerUpKind::Shield.color(),
        );
        return;
    }

    state.emit(GameEvent::Impact(ImpactKind::Crash));
    apply_damage(state);
}

/// One unit of damage, honouring the invulnerability window
pub fn apply_damage(state: &mut GameState) {
    if state.invulnerable > 0.0 {
        return;
    }

    state.health = state.health.saturating_sub(1);
    state.damage_flash = DAMAGE_FLASH_SECS;
    state.emit(GameEvent::Damaged {
        health: state.health,
    });

    if state.health == 0 {
        super::tick::end_run(state);
    } else {
        state.invulnerable = INVULNERABILITY_SECS;
    }
}

/// Apply a collected power-up's effect
pub fn collect_powerup(state: &mut GameState, kind: PowerUpKind) {
    log::info!("Power-up: {}", kind.label());
    state.effects.activate(kind);
    if kind == PowerUpKind::Shield {
        state.health = (state.health + 1).min(MAX_HEALTH);
    }
    state.emit(GameEvent::PowerUpCollected(kind));
}

fn collect_coin(state: &mut GameState) {
    let value = COIN_VALUE * state.effects.score_multiplier() as u64;
    state.score += value;
    state.coins_collected += 1;
    state.emit(GameEvent::CoinCollected {
        value,
        total: state.coins_collected,
    });
}
