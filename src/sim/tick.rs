//! Per-frame simulation step and session state machine
//!
//! Frame order while playing:
//! timers -> player -> speed/score -> spawning -> scenery/trail ->
//! movement -> culling -> collisions -> proximity warning.

use super::collision::check_collisions;
use super::events::GameEvent;
use super::spawn::{
    advance_entities, cull_entities, spawn_entities, update_scenery, update_trail,
};
use super::state::{GameState, Lane, PowerUp, PowerUpKind, SessionPhase, TrackEntity};
use crate::consts::*;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Lane requested by the tracker/keyboard, if it changed
    pub lane: Option<Lane>,
    /// Start (or retry) a run
    pub start: bool,
    /// Leave the game-over screen for the menu
    pub menu: bool,
}

/// Advance the session by one frame of `real_dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, real_dt: f32) {
    let real_dt = real_dt.clamp(0.0, MAX_FRAME_DT);

    if input.start && state.phase != SessionPhase::Playing {
        start_run(state);
    } else if input.menu && state.phase == SessionPhase::GameOver {
        return_to_menu(state);
    }

    if let Some(lane) = input.lane {
        set_lane(state, lane);
    }

    match state.phase {
        SessionPhase::Menu => idle(state, real_dt),
        SessionPhase::Playing => play(state, real_dt),
        SessionPhase::GameOver => {}
    }
}

/// Steer toward a lane; ignored outside of a run
pub fn set_lane(state: &mut GameState, lane: Lane) {
    if state.phase != SessionPhase::Playing || state.player.target == lane {
        return;
    }
    state.player.target = lane;
    state.emit(GameEvent::LaneChanged(lane));
}

/// Menu/GameOver -> Playing with a full reset
pub fn start_run(state: &mut GameState) {
    log::info!("Run started (seed {})", state.seed);

    state.phase = SessionPhase::Playing;
    state.score = 0;
    state.score_carry = 0.0;
    state.coins_collected = 0;
    state.health = MAX_HEALTH;
    state.speed = SPEED_INITIAL;
    state.player = Default::default();
    state.clear_entities();
    state.effects = Default::default();
    state.spawn_timers = Default::default();
    state.invulnerable = 0.0;
    state.damage_flash = 0.0;
    state.shield_flash = 0.0;
    state.warning_cooldown = 0.0;

    // Guaranteed early pickup so new players see one right away
    state.powerups.push(PowerUp::new(
        Lane::Center,
        ONBOARDING_POWERUP_Z,
        PowerUpKind::Shield,
    ));

    state.emit(GameEvent::RunStarted);
}

/// Playing -> GameOver; the score is final from here on
pub fn end_run(state: &mut GameState) {
    log::info!(
        "Run over: score {} ({} coins, {:.0} units)",
        state.score,
        state.coins_collected,
        state.distance
    );
    state.phase = SessionPhase::GameOver;
    state.invulnerable = 0.0;
    state.emit(GameEvent::RunEnded { score: state.score });
}

/// GameOver -> Menu
pub fn return_to_menu(state: &mut GameState) {
    log::info!("Returned to menu");
    state.phase = SessionPhase::Menu;
    state.speed = SPEED_MENU;
    state.clear_entities();
    state.effects = Default::default();
    state.player = Default::default();
    state.damage_flash = 0.0;
    state.shield_flash = 0.0;
    state.emit(GameEvent::ReturnedToMenu);
}

/// Menu: keep the road scrolling behind the title, nothing spawns or collides
fn idle(state: &mut GameState, real_dt: f32) {
    state.distance += state.speed * real_dt;
    update_scenery(state, real_dt);
}

fn play(state: &mut GameState, real_dt: f32) {
    // 1. Real-time timers
    for kind in state.effects.advance(real_dt) {
        log::debug!("{} expired", kind.label());
        state.emit(GameEvent::EffectExpired(kind));
    }
    state.invulnerable = (state.invulnerable - real_dt).max(0.0);
    state.damage_flash = (state.damage_flash - real_dt).max(0.0);
    state.shield_flash = (state.shield_flash - real_dt).max(0.0);
    state.warning_cooldown = (state.warning_cooldown - real_dt).max(0.0);

    // 2. World time
    let game_dt = real_dt * state.effects.time_scale();

    // 3. Steering stays on real time
    state.player.steer(real_dt);

    // 4. Speed ramp
    state.speed = (state.speed + ACCELERATION * game_dt).min(SPEED_MAX);

    // 5. Distance and score
    let travelled = state.speed * game_dt;
    state.distance += travelled;
    state.score_carry +=
        travelled * SCORE_PER_UNIT * state.effects.score_multiplier() as f32;
    let whole = state.score_carry.floor();
    state.score += whole as u64;
    state.score_carry -= whole;

    // 6-9. Lifecycle
    spawn_entities(state, game_dt);
    update_scenery(state, game_dt);
    update_trail(state, game_dt);
    advance_entities(state, game_dt);
    cull_entities(state);

    // 10. Collisions
    check_collisions(state);
    if state.phase != SessionPhase::Playing {
        return;
    }

    // 11. Proximity warning
    if state.warning_cooldown <= 0.0 && obstacle_near(state) {
        state.warning_cooldown = WARNING_COOLDOWN_SECS;
        state.emit(GameEvent::ProximityWarning);
    }
}

fn obstacle_near(state: &GameState) -> bool {
    state
        .obstacles
        .iter()
        .any(|o| o.is_active() && o.z() < WARNING_Z_MAX && o.z() > WARNING_Z_MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Coin, Obstacle};

    const DT: f32 = 1.0 / 60.0;

    fn started(seed: u64) -> GameState {
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
        state
    }

    #[test]
    fn test_menu_to_playing() {
        let mut state = GameState::new(12345);
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, SessionPhase::Menu);
        assert!(state.obstacles.is_empty());

        let state = started(12345);
        assert_eq!(state.phase, SessionPhase::Playing);
        assert_eq!(state.speed, SPEED_INITIAL);
        assert_eq!(state.health, MAX_HEALTH);
        assert_eq!(state.powerups.len(), 1);
        assert_eq!(state.powerups[0].kind, PowerUpKind::Shield);
        assert!(state.events.contains(&GameEvent::RunStarted));
    }

    #[test]
    fn test_menu_ignores_lane_input() {
        let mut state = GameState::new(1);
        let input = TickInput {
            lane: Some(Lane::Left),
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.player.target, Lane::Center);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_lane_change_event_only_on_change() {
        let mut state = started(2);
        state.events.clear();
        set_lane(&mut state, Lane::Right);
        set_lane(&mut state, Lane::Right);
        assert_eq!(state.events, vec![GameEvent::LaneChanged(Lane::Right)]);
    }

    #[test]
    fn test_score_and_speed_rise() {
        let mut state = started(3);
        let input = TickInput::default();
        let mut last_score = 0;
        for _ in 0..60 {
            tick(&mut state, &input, DT);
            assert!(state.score >= last_score);
            last_score = state.score;
        }
        assert!(state.speed > SPEED_INITIAL);
        assert!(state.score > 0);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut state = started(4);
        tick(&mut state, &TickInput::default(), 5.0);
        let expected = SPEED_INITIAL + ACCELERATION * MAX_FRAME_DT;
        assert!((state.speed - expected).abs() < 1e-3);
    }

    #[test]
    fn test_slow_motion_scales_world_not_steering() {
        let mut normal = started(5);
        let mut slow = started(5);
        slow.effects.activate(PowerUpKind::SlowMotion);

        let input = TickInput {
            lane: Some(Lane::Left),
            ..Default::default()
        };
        tick(&mut normal, &input, DT);
        tick(&mut slow, &input, DT);

        assert_eq!(normal.player.offset, slow.player.offset);
        assert!(slow.distance < normal.distance);
        assert!((slow.distance * 2.0 - normal.distance).abs() < 0.01);
    }

    #[test]
    fn test_proximity_warning_throttled() {
        let mut state = started(6);
        state.powerups.clear();
        state.obstacles.push(Obstacle::new(Lane::Left, 280.0));
        state.events.clear();

        tick(&mut state, &TickInput::default(), DT);
        let warnings = |s: &GameState| {
            s.events
                .iter()
                .filter(|e| **e == GameEvent::ProximityWarning)
                .count()
        };
        assert_eq!(warnings(&state), 1);

        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(warnings(&state), 1);
    }

    #[test]
    fn test_game_over_freezes_world() {
        let mut state = started(7);
        state.health = 1;
        state.obstacles.push(Obstacle::new(Lane::Center, 40.0));
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.phase, SessionPhase::GameOver);

        let frozen_score = state.score;
        let frozen_distance = state.distance;
        state.coins.push(Coin::new(Lane::Center, 0.0));
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.score, frozen_score);
        assert_eq!(state.distance, frozen_distance);
    }

    #[test]
    fn test_game_over_to_menu_and_retry() {
        let mut state = started(8);
        end_run(&mut state);
        tick(
            &mut state,
            &TickInput {
                menu: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase, SessionPhase::Menu);
        assert_eq!(state.speed, SPEED_MENU);

        end_run(&mut state);
        state.score = 999;
        tick(
            &mut state,
            &TickInput {
                start: true,
                ..Default::default()
            },
            DT,
        );
        assert_eq!(state.phase, SessionPhase::Playing);
        assert!(state.score < 999);
    }

    #[test]
    fn test_determinism() {
        let mut a = started(99999);
        let mut b = started(99999);
        let inputs = [
            TickInput {
                lane: Some(Lane::Left),
                ..Default::default()
            },
            TickInput::default(),
            TickInput {
                lane: Some(Lane::Right),
                ..Default::default()
            },
        ];
        for _ in 0..200 {
            for input in &inputs {
                tick(&mut a, input, DT);
                tick(&mut b, input, DT);
            }
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.obstacles, b.obstacles);
        assert_eq!(a.health, b.health);
        assert_eq!(a.player, b.player);
    }
}
