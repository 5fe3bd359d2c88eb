//! Frame driver
//!
//! Owns the session and routes its outbound events to the audio, HUD and
//! persistence collaborators. Platform code feeds it input and timestamps;
//! nothing in here touches the DOM or Web Audio directly.

use crate::consts::*;
use crate::highscores::HighScore;
use crate::input::{AcquireOutcome, InputAcquisition, InputMode, InputSource};
use crate::settings::Settings;
use crate::sim::{
    self, GameEvent, GameState, ImpactKind, Lane, PowerUpKind, SessionPhase, TickInput,
};

/// One-shot sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    Coin,
    PowerUp(PowerUpKind),
    Crash,
    ShieldBreak,
    Warning,
    UiClick,
}

/// Audio collaborator
pub trait AudioSink {
    /// Continuous engine drone for the duration of a run
    fn start_engine(&mut self);
    fn stop_engine(&mut self);
    /// Engine pitch/volume follow the speed ratio (0..1)
    fn update_engine(&mut self, speed_ratio: f32);
    /// Menu drone
    fn start_ambience(&mut self);
    fn stop_ambience(&mut self);
    /// Background bassline; muffled outside of a run
    fn start_music(&mut self);
    fn set_music_muffled(&mut self, muffled: bool);
    fn set_muted(&mut self, muted: bool);
    fn play(&mut self, effect: SoundEffect);
}

/// UI collaborator
pub trait HudSink {
    /// Switch the visible screen (title, in-run HUD, game over)
    fn show_phase(&mut self, phase: SessionPhase, high_score: u64);
    /// Per-frame readout
    fn update(&mut self, hud: &HudSnapshot);
    /// Final score screen
    fn show_game_over(&mut self, score: u64, high_score: u64, new_record: bool);
    /// Input source decided (tracker or keyboard); the start button may unlock
    fn input_ready(&mut self, _mode: InputMode) {}
    /// Health lost; a good moment to shake the screen
    fn damaged(&mut self, _health: u8) {}
}

/// Everything the HUD shows, copied out of the state once per frame
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    pub phase: SessionPhase,
    pub score: u64,
    pub speed: f32,
    pub speed_ratio: f32,
    pub health: u8,
    pub max_health: u8,
    pub coins: u32,
    pub lane: Lane,
    pub shield: bool,
    /// Remaining seconds, 0 when inactive
    pub slow_motion: f32,
    pub multiplier: f32,
    pub high_score: u64,
}

impl HudSnapshot {
    pub fn from_state(state: &GameState, high_score: u64) -> Self {
        Self {
            phase: state.phase,
            score: state.score,
            speed: state.speed,
            speed_ratio: state.speed_ratio(),
            health: state.health,
            max_health: MAX_HEALTH,
            coins: state.coins_collected,
            lane: state.player.target,
            shield: state.effects.shield,
            slow_motion: state.effects.slow_motion,
            multiplier: state.effects.multiplier,
            high_score,
        }
    }

    /// Speed readout: raw world units per second, floored
    pub fn display_speed(&self) -> u32 {
        self.speed.max(0.0).floor() as u32
    }

    /// Fill of the speed bar, 0..=100
    pub fn speed_bar_percent(&self) -> f32 {
        self.speed_ratio * 100.0
    }

    /// Score readout, tagged while the multiplier runs
    pub fn score_text(&self) -> String {
        if self.multiplier > 0.0 {
            format!("{} (2X)", self.score)
        } else {
            self.score.to_string()
        }
    }

    pub fn score_color(&self) -> &'static str {
        if self.multiplier > 0.0 {
            MULTIPLIER_COLOR
        } else {
            "#fff"
        }
    }

    /// Active power-up indicators with their CSS colours, top to bottom
    pub fn status_labels(&self) -> Vec<(&'static str, &'static str)> {
        let mut labels = Vec::new();
        if self.multiplier > 0.0 {
            labels.push(("MULT ONLINE", MULTIPLIER_COLOR));
        }
        if self.slow_motion > 0.0 {
            labels.push(("SLOWMO ONLINE", "#00FFFF"));
        }
        if self.shield {
            labels.push(("SHIELD ONLINE", "#00FF00"));
        }
        labels
    }
}

const MULTIPLIER_COLOR: &str = "#9900FF";

/// The running game: session state plus everything around it
pub struct Game {
    pub state: GameState,
    pub settings: Settings,
    pub high_score: HighScore,
    pub acquisition: InputAcquisition,
    /// Commands gathered since the last frame
    pending: TickInput,
    /// Previous frame timestamp (ms)
    last_time: Option<f64>,
    /// Cosmetic animation clock (real seconds)
    clock: f64,
}

impl Game {
    pub fn new(seed: u64, settings: Settings, high_score: HighScore) -> Self {
        let mut game = Self {
            state: GameState::new(seed),
            settings: Settings::default(),
            high_score,
            acquisition: InputAcquisition::new(),
            pending: TickInput::default(),
            last_time: None,
            clock: 0.0,
        };
        game.apply_settings(settings);
        game
    }

    /// Replace the settings and push the quality knobs into the simulation
    pub fn apply_settings(&mut self, settings: Settings) {
        self.state.max_particles = settings.max_particles();
        self.state.ambient_effects = settings.ambient_effects();
        self.settings = settings;
    }

    /// Animation clock for the renderer
    pub fn animation_time(&self) -> f32 {
        self.clock as f32
    }

    pub fn hud_snapshot(&self) -> HudSnapshot {
        HudSnapshot::from_state(&self.state, self.high_score.best)
    }

    /// Settle the input race. The first outcome wins and unlocks the menu.
    pub fn resolve_input(
        &mut self,
        outcome: AcquireOutcome,
        audio: &mut dyn AudioSink,
        hud: &mut dyn HudSink,
    ) -> Option<InputMode> {
        let mode = self.acquisition.resolve(outcome)?;
        audio.start_ambience();
        audio.start_music();
        audio.set_music_muffled(true);
        hud.input_ready(mode);
        Some(mode)
    }

    /// A lane signal from the tracker or keyboard
    pub fn request_lane(&mut self, source: InputSource, lane: Lane) {
        if !self.acquisition.accepts(source) {
            log::trace!("Dropping {:?} lane from inactive source {:?}", lane, source);
            return;
        }
        self.pending.lane = Some(lane);
    }

    /// Start / retry button
    pub fn press_start(&mut self, audio: &mut dyn AudioSink) {
        audio.play(SoundEffect::UiClick);
        if !self.acquisition.is_settled() {
            log::debug!("Start pressed before input is ready");
            return;
        }
        if self.state.phase != SessionPhase::Playing {
            self.pending.start = true;
        }
    }

    /// Back-to-menu button
    pub fn press_menu(&mut self, audio: &mut dyn AudioSink) {
        audio.play(SoundEffect::UiClick);
        if self.state.phase == SessionPhase::GameOver {
            self.pending.menu = true;
        }
    }

    /// Flip mute, persist it, and return the new value
    pub fn toggle_mute(&mut self, audio: &mut dyn AudioSink) -> bool {
        self.settings.muted = !self.settings.muted;
        audio.set_muted(self.settings.muted);
        self.settings.save();
        log::info!("Audio {}", if self.settings.muted { "muted" } else { "unmuted" });
        self.settings.muted
    }

    /// Drive one display refresh from a host timestamp (ms)
    pub fn frame(&mut self, timestamp_ms: f64, audio: &mut dyn AudioSink, hud: &mut dyn HudSink) {
        let dt = match self.last_time {
            Some(last) => ((timestamp_ms - last) / 1000.0).clamp(0.0, MAX_FRAME_DT as f64) as f32,
            None => 0.0,
        };
        self.last_time = Some(timestamp_ms);
        self.step(dt, audio, hud);
    }

    /// Advance by `dt` real seconds and notify collaborators
    pub fn step(&mut self, dt: f32, audio: &mut dyn AudioSink, hud: &mut dyn HudSink) {
        let input = std::mem::take(&mut self.pending);
        sim::tick(&mut self.state, &input, dt);
        self.clock += dt.clamp(0.0, MAX_FRAME_DT) as f64;

        for event in self.state.drain_events() {
            self.dispatch(event, audio, hud);
        }

        if self.state.is_playing() {
            audio.update_engine(self.state.speed_ratio());
        }
        hud.update(&self.hud_snapshot());
    }

    fn dispatch(&mut self, event: GameEvent, audio: &mut dyn AudioSink, hud: &mut dyn HudSink) {
        match event {
            GameEvent::RunStarted => {
                audio.stop_ambience();
                audio.start_engine();
                audio.start_music();
                audio.set_music_muffled(false);
                hud.show_phase(SessionPhase::Playing, self.high_score.best);
            }
            GameEvent::ReturnedToMenu => {
                audio.set_music_muffled(true);
                audio.start_ambience();
                hud.show_phase(SessionPhase::Menu, self.high_score.best);
            }
            GameEvent::RunEnded { score } => {
                let new_record = self.high_score.submit(score);
                if new_record {
                    self.high_score.save();
                }
                audio.stop_engine();
                audio.set_music_muffled(true);
                hud.show_phase(SessionPhase::GameOver, self.high_score.best);
                hud.show_game_over(score, self.high_score.best, new_record);
            }
            GameEvent::LaneChanged(lane) => log::trace!("Lane -> {:?}", lane),
            GameEvent::Impact(ImpactKind::Crash) => audio.play(SoundEffect::Crash),
            GameEvent::Impact(ImpactKind::ShieldBreak) => audio.play(SoundEffect::ShieldBreak),
            GameEvent::Damaged { health } => hud.damaged(health),
            GameEvent::PowerUpCollected(kind) => audio.play(SoundEffect::PowerUp(kind)),
            GameEvent::EffectExpired(kind) => log::debug!("{} ended", kind.label()),
            GameEvent::CoinCollected { .. } => audio.play(SoundEffect::Coin),
            GameEvent::ProximityWarning => audio.play(SoundEffect::Warning),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Coin, Obstacle, PowerUp};

    #[derive(Default)]
    struct RecordingAudio {
        calls: Vec<String>,
        sounds: Vec<SoundEffect>,
        engine_updates: usize,
    }

    impl AudioSink for RecordingAudio {
        fn start_engine(&mut self) {
            self.calls.push("start_engine".into());
        }
        fn stop_engine(&mut self) {
            self.calls.push("stop_engine".into());
        }
        fn update_engine(&mut self, speed_ratio: f32) {
            assert!((0.0..=1.0).contains(&speed_ratio));
            self.engine_updates += 1;
        }
        fn start_ambience(&mut self) {
            self.calls.push("start_ambience".into());
        }
        fn stop_ambience(&mut self) {
            self.calls.push("stop_ambience".into());
        }
        fn start_music(&mut self) {
            self.calls.push("start_music".into());
        }
        fn set_music_muffled(&mut self, muffled: bool) {
            self.calls.push(format!("muffled:{}", muffled));
        }
        fn set_muted(&mut self, muted: bool) {
            self.calls.push(format!("muted:{}", muted));
        }
        fn play(&mut self, effect: SoundEffect) {
            self.sounds.push(effect);
        }
    }

    #[derive(Default)]
    struct RecordingHud {
        phases: Vec<SessionPhase>,
        last: Option<HudSnapshot>,
        game_over: Option<(u64, u64, bool)>,
        ready: Option<InputMode>,
        damage: Vec<u8>,
    }

    impl HudSink for RecordingHud {
        fn show_phase(&mut self, phase: SessionPhase, _high_score: u64) {
            self.phases.push(phase);
        }
        fn update(&mut self, hud: &HudSnapshot) {
            self.last = Some(hud.clone());
        }
        fn show_game_over(&mut self, score: u64, high_score: u64, new_record: bool) {
            self.game_over = Some((score, high_score, new_record));
        }
        fn input_ready(&mut self, mode: InputMode) {
            self.ready = Some(mode);
        }
        fn damaged(&mut self, health: u8) {
            self.damage.push(health);
        }
    }

    const DT: f32 = 1.0 / 60.0;

    fn ready_game() -> (Game, RecordingAudio, RecordingHud) {
        let mut game = Game::new(7, Settings::default(), HighScore::default());
        let mut audio = RecordingAudio::default();
        let mut hud = RecordingHud::default();
        game.resolve_input(AcquireOutcome::TimedOut, &mut audio, &mut hud);
        (game, audio, hud)
    }

    fn started() -> (Game, RecordingAudio, RecordingHud) {
        let (mut game, mut audio, mut hud) = ready_game();
        game.press_start(&mut audio);
        game.step(DT, &mut audio, &mut hud);
        game.state.ambient_effects = false;
        (game, audio, hud)
    }

    #[test]
    fn test_start_blocked_until_input_ready() {
        let mut game = Game::new(1, Settings::default(), HighScore::default());
        let mut audio = RecordingAudio::default();
        let mut hud = RecordingHud::default();

        game.press_start(&mut audio);
        game.step(DT, &mut audio, &mut hud);
        assert_eq!(game.state.phase, SessionPhase::Menu);
        assert_eq!(audio.sounds, vec![SoundEffect::UiClick]);

        game.resolve_input(AcquireOutcome::Ready, &mut audio, &mut hud);
        assert_eq!(hud.ready, Some(InputMode::Tracker));
        game.press_start(&mut audio);
        game.step(DT, &mut audio, &mut hud);
        assert_eq!(game.state.phase, SessionPhase::Playing);
    }

    #[test]
    fn test_input_race_settles_once() {
        let (mut game, mut audio, mut hud) = ready_game();
        let calls = audio.calls.len();
        assert_eq!(game.resolve_input(AcquireOutcome::Ready, &mut audio, &mut hud), None);
        assert_eq!(audio.calls.len(), calls);
        assert_eq!(game.acquisition.mode(), InputMode::Keyboard);
    }

    #[test]
    fn test_run_start_drives_audio_and_hud() {
        let (_game, audio, hud) = started();
        assert!(audio.calls.contains(&"start_engine".to_string()));
        assert!(audio.calls.contains(&"muffled:false".to_string()));
        assert_eq!(hud.phases, vec![SessionPhase::Playing]);
        assert!(audio.engine_updates > 0);
        assert_eq!(hud.last.as_ref().map(|h| h.phase), Some(SessionPhase::Playing));
    }

    #[test]
    fn test_lane_from_inactive_source_dropped() {
        let (mut game, mut audio, mut hud) = started();
        game.request_lane(InputSource::Tracker, Lane::Left);
        game.step(DT, &mut audio, &mut hud);
        assert_eq!(game.state.player.target, Lane::Center);

        game.request_lane(InputSource::Keyboard, Lane::Left);
        game.step(DT, &mut audio, &mut hud);
        assert_eq!(game.state.player.target, Lane::Left);
        assert_eq!(hud.last.map(|h| h.lane), Some(Lane::Left));
    }

    #[test]
    fn test_coin_plays_sound() {
        let (mut game, mut audio, mut hud) = started();
        game.state.powerups.clear();
        game.state.coins.push(Coin::new(Lane::Center, 10.0));
        game.step(DT, &mut audio, &mut hud);
        assert!(audio.sounds.contains(&SoundEffect::Coin));
        assert_eq!(hud.last.map(|h| h.coins), Some(1));
    }

    #[test]
    fn test_pickups_reach_hud_status() {
        let (mut game, mut audio, mut hud) = started();
        game.state.powerups.clear();
        game.state
            .powerups
            .push(PowerUp::new(Lane::Center, 10.0, PowerUpKind::Shield));
        game.state
            .powerups
            .push(PowerUp::new(Lane::Center, 10.0, PowerUpKind::Multiplier));
        game.step(DT, &mut audio, &mut hud);

        let last = hud.last.clone().expect("hud updated");
        assert!(last.shield);
        assert!(last.multiplier > 0.0);
        assert_eq!(last.slow_motion, 0.0);
        let labels: Vec<_> = last.status_labels().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["MULT ONLINE", "SHIELD ONLINE"]);
        assert!(last.score_text().ends_with(" (2X)"));
        assert_eq!(last.score_color(), "#9900FF");
    }

    #[test]
    fn test_hud_readouts_without_effects() {
        let (mut game, mut audio, mut hud) = started();
        game.state.powerups.clear();
        game.step(DT, &mut audio, &mut hud);

        let last = hud.last.clone().expect("hud updated");
        assert!(last.status_labels().is_empty());
        assert_eq!(last.score_text(), last.score.to_string());
        assert_eq!(last.display_speed(), last.speed.floor() as u32);
        assert!(last.display_speed() >= SPEED_INITIAL as u32);
        let expected = last.speed / SPEED_MAX * 100.0;
        assert!((last.speed_bar_percent() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_run_end_records_high_score() {
        let (mut game, mut audio, mut hud) = started();
        game.state.powerups.clear();
        game.state.health = 1;
        game.state.score = 500;
        game.state.obstacles.push(Obstacle::new(Lane::Center, 10.0));
        game.step(DT, &mut audio, &mut hud);

        assert_eq!(game.state.phase, SessionPhase::GameOver);
        assert!(audio.sounds.contains(&SoundEffect::Crash));
        assert!(audio.calls.contains(&"stop_engine".to_string()));
        assert_eq!(hud.damage, vec![0]);
        let (score, best, record) = hud.game_over.expect("game over shown");
        assert!(score >= 500);
        assert_eq!(best, score);
        assert!(record);
        assert_eq!(game.high_score.best, score);
    }

    #[test]
    fn test_menu_after_game_over() {
        let (mut game, mut audio, mut hud) = started();
        sim::end_run(&mut game.state);
        game.step(DT, &mut audio, &mut hud);
        game.press_menu(&mut audio);
        game.step(DT, &mut audio, &mut hud);
        assert_eq!(game.state.phase, SessionPhase::Menu);
        assert_eq!(hud.phases.last(), Some(&SessionPhase::Menu));
    }

    #[test]
    fn test_frame_clamps_delta() {
        let (mut game, mut audio, mut hud) = started();
        game.frame(1000.0, &mut audio, &mut hud);
        let before = game.state.distance;
        // A 10 s stall only advances one clamped frame
        game.frame(11_000.0, &mut audio, &mut hud);
        let moved = game.state.distance - before;
        assert!(moved <= SPEED_MAX * MAX_FRAME_DT + 1e-3);
        assert!(moved > 0.0);
    }

    #[test]
    fn test_toggle_mute() {
        let (mut game, mut audio, _) = ready_game();
        assert!(game.toggle_mute(&mut audio));
        assert!(!game.toggle_mute(&mut audio));
        assert!(audio.calls.contains(&"muted:true".to_string()));
    }

    #[test]
    fn test_settings_reach_simulation() {
        let mut game = Game::new(3, Settings::default(), HighScore::default());
        game.apply_settings(Settings::from_preset(crate::QualityPreset::Low));
        assert!(!game.state.ambient_effects);
        assert_eq!(game.state.max_particles, 120);
    }
}
