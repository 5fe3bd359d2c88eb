//! Whole-run scenarios driven through the public simulation API

use neon_racer::consts::*;
use neon_racer::sim::{
    Coin, GameEvent, GameState, ImpactKind, Lane, Obstacle, PowerUp, PowerUpKind, SessionPhase,
    TickInput, tick,
};
use proptest::prelude::*;

const DT: f32 = 1.0 / 60.0;

fn idle() -> TickInput {
    TickInput::default()
}

/// A fresh run with the onboarding pickup removed and nothing else on the road
fn playing(seed: u64) -> GameState {
    let mut state = GameState::new(seed);
    state.ambient_effects = false;
    tick(
        &mut state,
        &TickInput {
            start: true,
            ..Default::default()
        },
        0.0,
    );
    clear_road(&mut state);
    state.drain_events();
    state
}

fn clear_road(state: &mut GameState) {
    state.obstacles.clear();
    state.coins.clear();
    state.powerups.clear();
}

/// Advance `frames` frames, keeping the road empty so nothing is hit
fn coast(state: &mut GameState, frames: usize) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..frames {
        clear_road(state);
        tick(state, &idle(), DT);
        events.extend(state.drain_events());
    }
    events
}

/// Put an obstacle on the car and resolve it without moving the world
fn ram(state: &mut GameState) -> Vec<GameEvent> {
    state.obstacles.push(Obstacle::new(state.player.target, 10.0));
    tick(state, &idle(), 0.0);
    state.drain_events()
}

#[test]
fn one_second_of_driving() {
    let mut state = playing(2024);
    let mut last_score = state.score;

    for _ in 0..60 {
        tick(&mut state, &idle(), DT);
        assert!(state.score >= last_score);
        last_score = state.score;
    }

    // Speed ramps 600 -> 610, so the average is ~605
    assert!((state.speed - (SPEED_INITIAL + ACCELERATION)).abs() < 0.01);
    assert!((state.distance - 605.0).abs() < 1.0, "distance {}", state.distance);
    assert!(state.score >= 60);
    assert_eq!(state.phase, SessionPhase::Playing);
}

#[test]
fn coin_in_left_lane_scores_exactly() {
    let mut state = playing(5);
    state.player.target = Lane::Left;
    state.player.offset = -0.7;
    state.coins.push(Coin::new(Lane::Left, 60.0));

    let before = state.score;
    tick(&mut state, &idle(), 0.0);

    assert_eq!(state.score - before, COIN_VALUE);
    assert_eq!(state.coins_collected, 1);
    assert!(
        state
            .drain_events()
            .contains(&GameEvent::CoinCollected { value: 100, total: 1 })
    );

    // Under the multiplier the same coin is worth double
    state.effects.activate(PowerUpKind::Multiplier);
    state.coins.push(Coin::new(Lane::Left, -40.0));
    let before = state.score;
    tick(&mut state, &idle(), 0.0);
    assert_eq!(state.score - before, COIN_VALUE * MULTIPLIER as u64);
    assert_eq!(state.coins_collected, 2);
}

#[test]
fn three_spaced_hits_end_the_run() {
    let mut state = playing(77);

    let events = ram(&mut state);
    assert_eq!(state.health, 2);
    assert!(events.contains(&GameEvent::Impact(ImpactKind::Crash)));

    // Inside the invulnerability window: the obstacle is consumed, no damage
    let events = ram(&mut state);
    assert_eq!(state.health, 2);
    assert!(events.contains(&GameEvent::Impact(ImpactKind::Crash)));
    assert!(state.obstacles.iter().all(|o| !o.active));

    coast(&mut state, 100);
    ram(&mut state);
    assert_eq!(state.health, 1);
    assert_eq!(state.phase, SessionPhase::Playing);

    coast(&mut state, 100);
    let score = state.score;
    let events = ram(&mut state);
    assert_eq!(state.health, 0);
    assert_eq!(state.phase, SessionPhase::GameOver);
    assert!(events.contains(&GameEvent::RunEnded { score }));

    // The score is frozen after the run ends
    coast(&mut state, 30);
    assert_eq!(state.score, score);
}

#[test]
fn slow_motion_wears_off_once() {
    let mut state = playing(9);
    state
        .powerups
        .push(PowerUp::new(Lane::Center, 0.0, PowerUpKind::SlowMotion));
    tick(&mut state, &idle(), 0.0);
    assert_eq!(state.effects.time_scale(), SLOW_MOTION_SCALE);
    state.drain_events();

    // 4.8 s in: still slowed
    let events = coast(&mut state, 288);
    assert_eq!(state.effects.time_scale(), SLOW_MOTION_SCALE);
    assert!(!events.contains(&GameEvent::EffectExpired(PowerUpKind::SlowMotion)));

    let mut expiries = 0;
    let mut scales = Vec::new();
    for _ in 0..60 {
        let events = coast(&mut state, 1);
        expiries += events
            .iter()
            .filter(|e| **e == GameEvent::EffectExpired(PowerUpKind::SlowMotion))
            .count();
        scales.push(state.effects.time_scale());
    }

    assert_eq!(expiries, 1);
    assert_eq!(scales.last().copied(), Some(1.0));
    // Once back to normal it stays there
    let first_normal = scales.iter().position(|s| *s == 1.0).unwrap_or(scales.len());
    assert!(scales[first_normal..].iter().all(|s| *s == 1.0));
}

#[test]
fn shield_takes_the_hit() {
    let mut state = playing(3);
    state.effects.activate(PowerUpKind::Shield);

    let events = ram(&mut state);

    assert_eq!(state.health, MAX_HEALTH);
    assert!(!state.effects.shield);
    assert_eq!(state.invulnerable, 0.0);
    assert!(state.obstacles.iter().all(|o| !o.active));
    assert!(events.contains(&GameEvent::Impact(ImpactKind::ShieldBreak)));
    assert!(!events.iter().any(|e| matches!(e, GameEvent::Damaged { .. })));
}

#[test]
fn repeated_multiplier_pickup_refreshes_without_stacking() {
    let mut state = playing(11);
    state
        .powerups
        .push(PowerUp::new(Lane::Center, 0.0, PowerUpKind::Multiplier));
    tick(&mut state, &idle(), 0.0);
    coast(&mut state, 120);
    assert!(state.effects.multiplier < MULTIPLIER_SECS);

    state
        .powerups
        .push(PowerUp::new(Lane::Center, 0.0, PowerUpKind::Multiplier));
    tick(&mut state, &idle(), 0.0);
    assert_eq!(state.effects.multiplier, MULTIPLIER_SECS);
    assert_eq!(state.effects.score_multiplier(), MULTIPLIER);
}

#[test]
fn retry_after_game_over_starts_clean() {
    let mut state = playing(21);
    state.health = 1;
    ram(&mut state);
    assert_eq!(state.phase, SessionPhase::GameOver);

    tick(
        &mut state,
        &TickInput {
            start: true,
            ..Default::default()
        },
        DT,
    );
    assert_eq!(state.phase, SessionPhase::Playing);
    assert_eq!(state.health, MAX_HEALTH);
    assert_eq!(state.coins_collected, 0);
    assert!(state.obstacles.is_empty());
}

fn lane() -> impl Strategy<Value = Lane> {
    prop_oneof![Just(Lane::Left), Just(Lane::Center), Just(Lane::Right)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Health only rises through a shield pickup and never passes the cap
    #[test]
    fn health_bounded_and_only_healed_by_shield(
        seed in any::<u64>(),
        lanes in prop::collection::vec(lane(), 1..40),
    ) {
        let mut state = GameState::new(seed);
        state.ambient_effects = false;
        tick(&mut state, &TickInput { start: true, ..Default::default() }, 0.0);
        state.drain_events();

        for frame in 0..1200usize {
            if state.phase != SessionPhase::Playing {
                break;
            }
            let input = TickInput {
                lane: (frame % 30 == 0).then(|| lanes[(frame / 30) % lanes.len()]),
                ..Default::default()
            };
            let before = state.health;
            tick(&mut state, &input, 1.0 / 30.0);
            let events = state.drain_events();

            prop_assert!(state.health <= MAX_HEALTH);
            if state.health > before {
                prop_assert!(events.contains(&GameEvent::PowerUpCollected(PowerUpKind::Shield)));
            }
        }
    }
}
