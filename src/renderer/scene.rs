//! Frame composition
//!
//! Turns an immutable view of [`GameState`] into a triangle list in screen
//! pixels. Painter's order, back to front:
//! sun, scenery, particles, lane markers, power-ups, coins, obstacles,
//! trail, player, shield cage, screen flashes.
//!
//! Every world point goes through the [`Projector`]; anything with a
//! non-positive scale is skipped.

use glam::{Quat, Vec2, Vec3};

use super::projection::Projector;
use super::shapes;
use super::vertex::{Vertex, colors, with_alpha};
use super::wireframe;
use crate::Settings;
use crate::consts::*;
use crate::sim::{GameState, ParticleKind, PowerUpKind, TrackEntity};

/// Sun disc radius and height above the viewport centre (pixels)
const SUN_RADIUS: f32 = 250.0;
const SUN_LIFT: f32 = 100.0;

/// Lane divider x positions (world) and dash layout
const MARKER_XS: [f32; 2] = [-0.5 * LANE_WIDTH, 0.5 * LANE_WIDTH];
const MARKER_DASH: f32 = 100.0;
const MARKER_PERIOD: f32 = 200.0;
const MARKER_DASHES: usize = 10;

/// World sizes
const ARTIFACT_SIZE: f32 = 80.0;
const COIN_SIZE: f32 = 80.0;
const OBSTACLE_SIZE: f32 = 100.0;
const CAR_SIZE: f32 = 120.0;
/// Tyre inset from the car centre, one ribbon per side
const TYRE_OFFSET: f32 = CAR_SIZE * 0.35;
/// Icosahedron scale for the shield cage (circumradius ~150)
const SHIELD_CAGE_SIZE: f32 = 80.0;

/// Build the vertex list for one frame.
///
/// `t` is the animation clock in seconds; it only drives cosmetic motion
/// (spin, pulse, glitch, blink) and never feeds back into the simulation.
pub fn build_frame(
    state: &GameState,
    projector: &Projector,
    t: f32,
    settings: &Settings,
) -> Vec<Vertex> {
    let segments = settings.quality.segments();
    let mut out = Vec::with_capacity(8192);

    draw_sun(&mut out, projector, segments);
    if settings.scenery {
        draw_scenery(&mut out, state, projector);
    }
    if settings.particles {
        draw_particles(&mut out, state, projector, segments);
    }
    draw_lane_markers(&mut out, state, projector);
    draw_powerups(&mut out, state, projector, t);
    draw_coins(&mut out, state, projector, t, segments);
    draw_obstacles(&mut out, state, projector, t);
    if settings.trails {
        draw_trail(&mut out, state, projector);
    }
    if player_visible(state.invulnerable, t) {
        draw_player(&mut out, state, projector);
    }
    if state.effects.shield {
        draw_shield_cage(&mut out, state, projector, t);
    }
    if settings.screen_flashes() {
        draw_flashes(&mut out, state, projector);
    }

    out
}

/// The car blinks at 10 Hz while invulnerable
pub fn player_visible(invulnerable: f32, t: f32) -> bool {
    invulnerable <= 0.0 || ((t * 20.0).floor() as i64).rem_euclid(2) == 0
}

/// Horizontal glitch jitter for obstacles: active 100 ms out of every 600 ms
pub fn glitch_offset(t: f32, z: f32) -> f32 {
    let ms = (t * 1000.0).max(0.0) as u64;
    if ms % 600 > 500 {
        (ms as f32 * 0.37 + z).sin() * 10.0
    } else {
        0.0
    }
}

fn draw_sun(out: &mut Vec<Vertex>, projector: &Projector, segments: u32) {
    let center = projector.center() - Vec2::new(0.0, SUN_LIFT);
    out.extend(shapes::gradient_disc(
        center,
        SUN_RADIUS,
        colors::SUN_TOP,
        colors::SUN_MID,
        colors::SUN_BOTTOM,
        segments * 3,
    ));

    // Cut bands through the lower half, thickening toward the horizon
    for i in 0..10 {
        let band_y = center.y + SUN_RADIUS * 0.2 + i as f32 * 20.0;
        if band_y >= center.y + SUN_RADIUS {
            break;
        }
        let h = (5.0 + i as f32 * 2.0) * 0.5;
        out.extend(shapes::rect(
            center.x - SUN_RADIUS,
            band_y,
            SUN_RADIUS * 2.0,
            h,
            colors::BACKGROUND,
        ));
    }
}

fn draw_scenery(out: &mut Vec<Vertex>, state: &GameState, projector: &Projector) {
    for b in &state.scenery {
        let base = projector.project(Vec3::new(b.x, 0.0, b.z));
        if !base.is_visible() {
            continue;
        }
        let sw = b.width * base.scale;
        let sh = b.height * base.scale;
        let left = base.pos.x - sw / 2.0;
        let top = base.pos.y - sh;

        // Buildings light up as they approach
        let near = 1.0 - (b.z / SCENERY_SPAWN_Z).min(1.0);
        let edge = with_alpha(colors::BUILDING_EDGE, 0.1 + near * 0.5);
        let grid = with_alpha(colors::BUILDING_GRID, 0.1 + near * 0.2);

        out.extend(shapes::rect(left, top, sw, sh, colors::BUILDING_FILL));
        out.extend(shapes::rect_outline(left, top, sw, sh, 2.0, edge));
        out.extend(shapes::line(
            Vec2::new(left, top + sh / 2.0),
            Vec2::new(left + sw, top + sh / 2.0),
            1.0,
            grid,
        ));
        out.extend(shapes::line(
            Vec2::new(base.pos.x, top),
            Vec2::new(base.pos.x, base.pos.y),
            1.0,
            grid,
        ));
    }
}

fn draw_particles(out: &mut Vec<Vertex>, state: &GameState, projector: &Projector, segments: u32) {
    for p in &state.particles {
        let proj = projector.project(p.pos);
        if !proj.is_visible() {
            continue;
        }
        let scale = proj.scale;
        match p.kind {
            ParticleKind::Flash => {
                let color = with_alpha(p.color, p.life * 10.0);
                out.extend(shapes::circle(proj.pos, 50.0 * scale, color, segments));
            }
            ParticleKind::Square => {
                let size = 15.0 * scale;
                let color = with_alpha(p.color, p.life * 2.0);
                out.extend(shapes::rect(
                    proj.pos.x - size / 2.0,
                    proj.pos.y - size / 2.0,
                    size,
                    size,
                    color,
                ));
            }
            ParticleKind::Spark => {
                let color = with_alpha(p.color, p.life);
                out.extend(shapes::circle(proj.pos, 10.0 * scale, color, 6));
            }
            ParticleKind::Dust => {
                let color = with_alpha(p.color, scale.min(1.0));
                out.extend(shapes::circle(proj.pos, (2.0 * scale).max(0.5), color, 4));
            }
        }
    }
}

fn draw_lane_markers(out: &mut Vec<Vertex>, state: &GameState, projector: &Projector) {
    let phase = state.distance.rem_euclid(MARKER_PERIOD);
    for x in MARKER_XS {
        for i in 0..MARKER_DASHES {
            let z_start = i as f32 * MARKER_PERIOD - phase;
            if z_start < 0.0 {
                continue;
            }
            let a = projector.project(Vec3::new(x, 0.0, z_start));
            let b = projector.project(Vec3::new(x, 0.0, z_start + MARKER_DASH));
            if a.is_visible() && b.is_visible() {
                out.extend(shapes::line(a.pos, b.pos, 4.0, colors::LANE_MARKER));
            }
        }
    }
}

fn draw_powerups(out: &mut Vec<Vertex>, state: &GameState, projector: &Projector, t: f32) {
    // Newest (farthest) first so nearer artifacts paint over them
    for p in state.powerups.iter().rev() {
        if !p.is_active() || p.z <= NEAR_PLANE {
            continue;
        }
        let bob = match p.kind {
            PowerUpKind::Multiplier => (t * 5.0).sin() * 20.0,
            PowerUpKind::Shield | PowerUpKind::SlowMotion => 0.0,
        };
        let center = Vec3::new(p.lane.world_x(), bob, p.z);
        out.extend(wireframe::artifact(
            projector,
            wireframe::solid_for(p.kind),
            center,
            ARTIFACT_SIZE,
            t,
            p.kind.color(),
        ));
    }
}

fn draw_coins(
    out: &mut Vec<Vertex>,
    state: &GameState,
    projector: &Projector,
    t: f32,
    segments: u32,
) {
    let spin = (t * 5.0).cos().abs();
    for c in state.coins.iter().rev().filter(|c| c.is_active()) {
        let proj = projector.project(c.world_pos());
        if !proj.is_visible() {
            continue;
        }
        let s = COIN_SIZE * proj.scale;
        let width = s * spin;
        let center = Vec2::new(proj.pos.x, proj.pos.y - s);
        out.extend(shapes::ellipse(center, width / 2.0, s / 2.0, colors::COIN, segments));
        out.extend(shapes::ellipse_outline(
            center,
            width / 3.0,
            s / 3.0,
            3.0 * proj.scale,
            colors::COIN_RIM,
            segments,
        ));
    }
}

fn draw_obstacles(out: &mut Vec<Vertex>, state: &GameState, projector: &Projector, t: f32) {
    let pulse = (t * 5.0).sin() * 2.0 + 3.0;
    for o in state.obstacles.iter().rev().filter(|o| o.is_active()) {
        let proj = projector.project(o.world_pos());
        if !proj.is_visible() {
            continue;
        }
        let s = OBSTACLE_SIZE * proj.scale;
        let x = proj.pos.x - s / 2.0 + glitch_offset(t, o.z);
        let y = proj.pos.y - s;

        out.extend(shapes::rect(x, y, s, s, colors::OBSTACLE_FILL));
        out.extend(shapes::rect_outline(x, y, s, s, pulse * proj.scale, colors::OBSTACLE));

        let cross = proj.scale.max(1.0);
        out.extend(shapes::line(
            Vec2::new(x, y),
            Vec2::new(x + s, y + s),
            cross,
            colors::OBSTACLE,
        ));
        out.extend(shapes::line(
            Vec2::new(x + s, y),
            Vec2::new(x, y + s),
            cross,
            colors::OBSTACLE,
        ));
    }
}

fn draw_trail(out: &mut Vec<Vertex>, state: &GameState, projector: &Projector) {
    if state.trail.len() < 2 {
        return;
    }
    let width = 4.0 + 2.0 * state.speed_ratio();
    for offset in [-TYRE_OFFSET, TYRE_OFFSET] {
        // Oldest first, fading with age
        for pair in state.trail.windows(2) {
            let a = projector.project(Vec3::new(pair[0].x + offset, 0.0, pair[0].z));
            let b = projector.project(Vec3::new(pair[1].x + offset, 0.0, pair[1].z));
            if a.is_visible() && b.is_visible() {
                let color = with_alpha(colors::TRAIL, pair[0].life);
                out.extend(shapes::line(a.pos, b.pos, width, color));
            }
        }
    }
}

fn draw_player(out: &mut Vec<Vertex>, state: &GameState, projector: &Projector) {
    let proj = projector.project(Vec3::new(state.player.world_x(), 0.0, PLAYER_Z));
    if !proj.is_visible() {
        return;
    }
    let (px, py) = (proj.pos.x, proj.pos.y);
    let ps = CAR_SIZE * proj.scale;
    let pivot = Vec2::new(px, py - ps / 2.0);
    let angle = state.player.tilt.to_radians();

    let mut part = |x: f32, y: f32, w: f32, h: f32, color: [f32; 4]| {
        out.extend(shapes::rotated_rect(x, y, w, h, pivot, angle, color));
    };
    // Body, cockpit, tail lights
    part(px - ps / 2.0, py - ps / 2.0, ps, ps / 2.0, colors::CAR_BODY);
    part(px - ps / 4.0, py - ps * 0.75, ps / 2.0, ps / 4.0, colors::CAR_COCKPIT);
    part(px - ps / 2.0 + 5.0, py - ps / 2.0 + 5.0, 10.0, 10.0, colors::CAR_LIGHTS);
    part(px + ps / 2.0 - 15.0, py - ps / 2.0 + 5.0, 10.0, 10.0, colors::CAR_LIGHTS);
}

fn draw_shield_cage(out: &mut Vec<Vertex>, state: &GameState, projector: &Projector, t: f32) {
    let center = Vec3::new(state.player.world_x(), 0.0, PLAYER_Z);
    let points = wireframe::transform(
        &wireframe::ICOSAHEDRON_VERTICES,
        SHIELD_CAGE_SIZE,
        Quat::from_rotation_y(t),
        center,
    );
    out.extend(wireframe::stroke_edges(
        projector,
        &points,
        &wireframe::icosahedron_edges(),
        2.0,
        colors::SHIELD,
    ));
}

fn draw_flashes(out: &mut Vec<Vertex>, state: &GameState, projector: &Projector) {
    let Vec2 { x: w, y: h } = projector.viewport;
    if state.damage_flash > 0.0 {
        let fade = state.damage_flash / DAMAGE_FLASH_SECS;
        out.extend(shapes::rect(0.0, 0.0, w, h, with_alpha(colors::DAMAGE_OVERLAY, fade)));
    }
    if state.shield_flash > 0.0 {
        let fade = state.shield_flash / SHIELD_FLASH_SECS;
        out.extend(shapes::rect(0.0, 0.0, w, h, with_alpha(colors::SHIELD_OVERLAY, fade)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Coin, Lane, Obstacle, PowerUp, SessionPhase};

    fn projector() -> Projector {
        Projector::new(1280.0, 720.0)
    }

    fn playing() -> GameState {
        let mut state = GameState::new(42);
        state.phase = SessionPhase::Playing;
        state
    }

    fn frame(state: &GameState, settings: &Settings) -> Vec<Vertex> {
        build_frame(state, &projector(), 0.25, settings)
    }

    #[test]
    fn test_all_vertices_finite() {
        let mut state = playing();
        state.obstacles.push(Obstacle::new(Lane::Left, 800.0));
        state.obstacles.push(Obstacle::new(Lane::Right, -150.0));
        state.coins.push(Coin::new(Lane::Center, 2000.0));
        state.powerups.push(PowerUp::new(Lane::Right, 1200.0, PowerUpKind::Multiplier));
        state.effects.shield = true;
        state.damage_flash = DAMAGE_FLASH_SECS;

        let v = frame(&state, &Settings::default());
        assert!(!v.is_empty());
        for vert in v {
            assert!(vert.position.iter().all(|c| c.is_finite()));
            assert!(vert.color.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn test_inactive_entities_not_drawn() {
        let settings = Settings::default();
        let base = frame(&playing(), &settings).len();

        let mut state = playing();
        let mut coin = Coin::new(Lane::Left, 900.0);
        coin.deactivate();
        state.coins.push(coin);
        let mut obstacle = Obstacle::new(Lane::Left, 900.0);
        obstacle.deactivate();
        state.obstacles.push(obstacle);
        assert_eq!(frame(&state, &settings).len(), base);

        state.coins.push(Coin::new(Lane::Left, 900.0));
        assert!(frame(&state, &settings).len() > base);
    }

    #[test]
    fn test_powerup_at_camera_plane_skipped() {
        let settings = Settings::default();
        let base = frame(&playing(), &settings).len();
        let mut state = playing();
        state.powerups.push(PowerUp::new(Lane::Center, 5.0, PowerUpKind::Shield));
        assert_eq!(frame(&state, &settings).len(), base);
    }

    #[test]
    fn test_behind_camera_skipped() {
        let settings = Settings::default();
        let base = frame(&playing(), &settings).len();
        let mut state = playing();
        state.obstacles.push(Obstacle::new(Lane::Center, CAMERA_Z - 100.0));
        assert_eq!(frame(&state, &settings).len(), base);
    }

    #[test]
    fn test_reduced_motion_hides_flashes() {
        let mut state = playing();
        state.damage_flash = 0.3;
        state.shield_flash = 0.1;

        let normal = frame(&state, &Settings::default()).len();
        let calm = frame(
            &state,
            &Settings {
                reduced_motion: true,
                ..Default::default()
            },
        )
        .len();
        assert_eq!(normal, calm + 12);
    }

    #[test]
    fn test_shield_cage_drawn_when_active() {
        let settings = Settings::default();
        let mut state = playing();
        let base = frame(&state, &settings).len();
        state.effects.shield = true;
        assert!(frame(&state, &settings).len() > base);
    }

    #[test]
    fn test_player_blinks_only_while_invulnerable() {
        assert!(player_visible(0.0, 0.07));
        assert!(player_visible(1.0, 0.01));
        assert!(!player_visible(1.0, 0.07));
        assert!(player_visible(1.0, 0.12));
    }

    #[test]
    fn test_glitch_window() {
        assert_eq!(glitch_offset(0.2, 300.0), 0.0);
        assert_eq!(glitch_offset(1.0, 300.0), 0.0);
        let g = glitch_offset(0.55, 300.0);
        assert!(g.abs() <= 10.0);
        assert_eq!(g, glitch_offset(0.55, 300.0));
    }

    #[test]
    fn test_trail_needs_two_segments() {
        let settings = Settings::default();
        let mut state = playing();
        state.trail.push(crate::sim::TrailSegment {
            x: 0.0,
            z: PLAYER_Z,
            life: TRAIL_LIFE,
        });
        let one = frame(&state, &settings).len();
        state.trail.push(crate::sim::TrailSegment {
            x: 0.0,
            z: PLAYER_Z - 10.0,
            life: TRAIL_LIFE,
        });
        // Two ribbons, one quad each
        assert_eq!(frame(&state, &settings).len(), one + 12);

        let no_trails = Settings {
            trails: false,
            ..Default::default()
        };
        assert_eq!(frame(&state, &no_trails).len(), one);
    }
}
