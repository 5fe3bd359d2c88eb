//! Audio system using Web Audio API
//!
//! Everything is synthesized: an engine drone that follows speed, a menu
//! drone, a synthwave bassline behind a low-pass filter, and one-shot effects.

use web_sys::{
    AudioContext, AudioContextState, BiquadFilterNode, BiquadFilterType, GainNode,
    OscillatorNode, OscillatorType,
};

use crate::app::{AudioSink, SoundEffect};
use crate::settings::Settings;
use crate::sim::PowerUpKind;

/// Overall output level before the user's master volume
const MASTER_LEVEL: f32 = 0.5;

/// Music filter cutoff when muffled / open (Hz)
const MUFFLED_CUTOFF: f32 = 400.0;
const OPEN_CUTOFF: f32 = 20_000.0;

/// 110 BPM, eighth notes
const STEP_SECS: f64 = 60.0 / 110.0 * 0.5;
/// Schedule this far ahead of the audio clock
const LOOKAHEAD_SECS: f64 = 0.1;

/// 16-step bassline (Hz, 0 = rest): C C _ C, Eb Eb _ Eb, Bb Bb _ Bb, G _ F _
const BASSLINE: [f32; 16] = [
    65.41, 65.41, 0.0, 65.41, 77.78, 77.78, 0.0, 77.78, 58.27, 58.27, 0.0, 58.27, 98.0, 0.0,
    87.31, 0.0,
];

/// Sawtooth through a low-pass, pitched by speed
struct Engine {
    osc: OscillatorNode,
    filter: BiquadFilterNode,
    gain: GainNode,
}

/// Detuned triangle cluster with a slow filter wobble
struct Ambience {
    oscs: Vec<OscillatorNode>,
    gain: GainNode,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master: Option<GainNode>,
    music_filter: Option<BiquadFilterNode>,
    engine: Option<Engine>,
    ambience: Option<Ambience>,
    music_playing: bool,
    next_note_time: f64,
    beat: usize,
    /// Volume and mute come from the player's settings
    settings: Settings,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }

        let master = ctx.as_ref().and_then(|ctx| {
            let gain = ctx.create_gain().ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some(gain)
        });
        let music_filter = ctx.as_ref().zip(master.as_ref()).and_then(|(ctx, master)| {
            let filter = ctx.create_biquad_filter().ok()?;
            filter.set_type(BiquadFilterType::Lowpass);
            filter.frequency().set_value(MUFFLED_CUTOFF);
            filter.connect_with_audio_node(master).ok()?;
            Some(filter)
        });

        let mut audio = Self {
            ctx,
            master,
            music_filter,
            engine: None,
            ambience: None,
            music_playing: false,
            next_note_time: 0.0,
            beat: 0,
            settings: settings.clone(),
        };
        audio.apply_volume();
        audio
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }
    }

    fn effective_volume(&self) -> f32 {
        self.settings.effective_volume() * MASTER_LEVEL
    }

    fn apply_volume(&self) {
        if let Some(master) = &self.master {
            master.gain().set_value(self.effective_volume());
        }
    }

    /// Schedule upcoming bassline steps; call once per frame
    pub fn pump(&mut self) {
        if !self.music_playing {
            return;
        }
        let Some(ctx) = self.ctx.clone() else { return };
        let horizon = ctx.current_time() + LOOKAHEAD_SECS;
        // After a long stall, skip ahead instead of bursting notes
        if self.next_note_time < ctx.current_time() - 1.0 {
            self.next_note_time = ctx.current_time();
        }
        while self.next_note_time < horizon {
            self.play_beat(&ctx, self.next_note_time, self.beat);
            self.next_note_time += STEP_SECS;
            self.beat = (self.beat + 1) % BASSLINE.len();
        }
    }

    fn play_beat(&self, ctx: &AudioContext, time: f64, step: usize) {
        let Some(filter) = &self.music_filter else { return };

        let freq = BASSLINE[step];
        if freq > 0.0 {
            if let Some((osc, gain)) = create_osc(ctx, freq, OscillatorType::Sawtooth, filter) {
                gain.gain().set_value_at_time(0.2, time).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, time + 0.2)
                    .ok();
                osc.start_with_when(time).ok();
                osc.stop_with_when(time + 0.2).ok();
            }
        }

        // Kick on every quarter
        if step % 4 == 0 {
            if let Some((osc, gain)) = create_osc(ctx, 150.0, OscillatorType::Sine, filter) {
                osc.frequency().set_value_at_time(150.0, time).ok();
                osc.frequency()
                    .exponential_ramp_to_value_at_time(0.01, time + 0.5)
                    .ok();
                gain.gain().set_value_at_time(1.0, time).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, time + 0.5)
                    .ok();
                osc.start_with_when(time).ok();
                osc.stop_with_when(time + 0.5).ok();
            }
        }
    }

    // === Sound generators ===

    /// UI click - short high blip
    fn play_ui_click(&self, ctx: &AudioContext, out: &GainNode) {
        let Some((osc, gain)) = create_osc(ctx, 1200.0, OscillatorType::Sine, out) else {
            return;
        };
        let t = ctx.current_time();
        osc.frequency()
            .exponential_ramp_to_value_at_time(800.0, t + 0.05)
            .ok();
        gain.gain().set_value_at_time(0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.05)
            .ok();
        osc.start().ok();
        osc.stop_with_when(t + 0.1).ok();
    }

    /// Coin - rising chime
    fn play_coin(&self, ctx: &AudioContext, out: &GainNode) {
        let Some((osc, gain)) = create_osc(ctx, 1200.0, OscillatorType::Sine, out) else {
            return;
        };
        let t = ctx.current_time();
        osc.frequency()
            .exponential_ramp_to_value_at_time(2000.0, t + 0.1)
            .ok();
        gain.gain().set_value_at_time(0.5, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.3)
            .ok();
        osc.start().ok();
        osc.stop_with_when(t + 0.3).ok();
    }

    /// Power-up - two-octave sweep, base pitch per kind
    fn play_powerup(&self, ctx: &AudioContext, out: &GainNode, kind: PowerUpKind) {
        let base = match kind {
            PowerUpKind::Shield => 440.0,
            PowerUpKind::SlowMotion => 330.0,
            PowerUpKind::Multiplier => 550.0,
        };
        let Some((osc, gain)) = create_osc(ctx, base, OscillatorType::Triangle, out) else {
            return;
        };
        let t = ctx.current_time();
        osc.frequency()
            .linear_ramp_to_value_at_time(base * 2.0, t + 0.2)
            .ok();
        osc.frequency()
            .linear_ramp_to_value_at_time(base * 4.0, t + 0.4)
            .ok();
        gain.gain().set_value_at_time(0.3, t).ok();
        gain.gain().linear_ramp_to_value_at_time(0.0, t + 0.5).ok();
        osc.start().ok();
        osc.stop_with_when(t + 0.5).ok();
    }

    /// Crash - half a second of decaying white noise
    fn play_crash(&self, ctx: &AudioContext, out: &GainNode) {
        let rate = ctx.sample_rate();
        let len = (rate * 0.5) as u32;
        let Ok(buffer) = ctx.create_buffer(1, len, rate) else {
            return;
        };
        let mut data: Vec<f32> = (0..len).map(|_| rand::random::<f32>() * 2.0 - 1.0).collect();
        if buffer.copy_to_channel(&mut data, 0).is_err() {
            return;
        }

        let Ok(noise) = ctx.create_buffer_source() else {
            return;
        };
        let Ok(gain) = ctx.create_gain() else { return };
        noise.set_buffer(Some(&buffer));
        if noise.connect_with_audio_node(&gain).is_err()
            || gain.connect_with_audio_node(out).is_err()
        {
            return;
        }

        let t = ctx.current_time();
        gain.gain().set_value_at_time(0.8, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.5)
            .ok();
        noise.start().ok();
    }

    /// Shield break - falling sawtooth
    fn play_shield_break(&self, ctx: &AudioContext, out: &GainNode) {
        let Some((osc, gain)) = create_osc(ctx, 200.0, OscillatorType::Sawtooth, out) else {
            return;
        };
        let t = ctx.current_time();
        osc.frequency()
            .exponential_ramp_to_value_at_time(50.0, t + 0.3)
            .ok();
        gain.gain().set_value_at_time(0.5, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.3)
            .ok();
        osc.start().ok();
        osc.stop_with_when(t + 0.3).ok();
    }

    /// Proximity warning - short low buzz
    fn play_warning(&self, ctx: &AudioContext, out: &GainNode) {
        let Some((osc, gain)) = create_osc(ctx, 100.0, OscillatorType::Sawtooth, out) else {
            return;
        };
        let t = ctx.current_time();
        osc.frequency()
            .linear_ramp_to_value_at_time(50.0, t + 0.1)
            .ok();
        gain.gain().set_value_at_time(0.2, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.1)
            .ok();
        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    fn build_engine(ctx: &AudioContext, out: &GainNode) -> Option<Engine> {
        let osc = ctx.create_oscillator().ok()?;
        let filter = ctx.create_biquad_filter().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(OscillatorType::Sawtooth);
        osc.frequency().set_value(100.0);
        filter.set_type(BiquadFilterType::Lowpass);
        filter.frequency().set_value(400.0);
        gain.gain().set_value(0.1);

        osc.connect_with_audio_node(&filter).ok()?;
        filter.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(out).ok()?;
        osc.start().ok()?;
        Some(Engine { osc, filter, gain })
    }

    fn build_ambience(ctx: &AudioContext, out: &GainNode) -> Option<Ambience> {
        let gain = ctx.create_gain().ok()?;
        gain.gain().set_value(0.15);

        let filter = ctx.create_biquad_filter().ok()?;
        filter.set_type(BiquadFilterType::Lowpass);
        filter.frequency().set_value(600.0);
        gain.connect_with_audio_node(&filter).ok()?;
        filter.connect_with_audio_node(out).ok()?;

        // A2, slightly detuned A2, E3, A3
        let mut oscs = Vec::with_capacity(5);
        for freq in [110.0, 112.0, 164.0, 220.0] {
            let osc = ctx.create_oscillator().ok()?;
            osc.set_type(OscillatorType::Triangle);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            osc.start().ok()?;
            oscs.push(osc);
        }

        // Slow wobble on the cutoff
        let lfo = ctx.create_oscillator().ok()?;
        let depth = ctx.create_gain().ok()?;
        lfo.frequency().set_value(0.2);
        depth.gain().set_value(50.0);
        lfo.connect_with_audio_node(&depth).ok()?;
        depth.connect_with_audio_param(&filter.frequency()).ok()?;
        lfo.start().ok()?;
        oscs.push(lfo);

        Some(Ambience { oscs, gain })
    }
}

impl AudioSink for AudioManager {
    fn start_engine(&mut self) {
        if self.engine.is_some() {
            return;
        }
        self.resume();
        let (Some(ctx), Some(master)) = (&self.ctx, &self.master) else {
            return;
        };
        self.engine = Self::build_engine(ctx, master);
    }

    fn stop_engine(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.osc.stop().ok();
            engine.gain.disconnect().ok();
        }
    }

    fn update_engine(&mut self, speed_ratio: f32) {
        let (Some(ctx), Some(engine)) = (&self.ctx, &self.engine) else {
            return;
        };
        let t = ctx.current_time();
        // 80 Hz idle -> 200 Hz flat out, louder and brighter with speed
        engine
            .osc
            .frequency()
            .set_target_at_time(80.0 + speed_ratio * 120.0, t, 0.1)
            .ok();
        engine
            .gain
            .gain()
            .set_target_at_time(0.05 + speed_ratio * 0.15, t, 0.1)
            .ok();
        engine
            .filter
            .frequency()
            .set_target_at_time(200.0 + speed_ratio * 600.0, t, 0.1)
            .ok();
    }

    fn start_ambience(&mut self) {
        if self.ambience.is_some() || self.settings.muted {
            return;
        }
        self.resume();
        let (Some(ctx), Some(master)) = (&self.ctx, &self.master) else {
            return;
        };
        self.ambience = Self::build_ambience(ctx, master);
    }

    fn stop_ambience(&mut self) {
        let Some(ambience) = self.ambience.take() else {
            return;
        };
        let Some(ctx) = &self.ctx else { return };
        // Two second fade, then stop the voices
        let t = ctx.current_time();
        ambience
            .gain
            .gain()
            .exponential_ramp_to_value_at_time(0.001, t + 2.0)
            .ok();
        for osc in &ambience.oscs {
            osc.stop_with_when(t + 2.0).ok();
        }
    }

    fn start_music(&mut self) {
        if self.music_playing {
            return;
        }
        self.resume();
        self.music_playing = true;
        self.next_note_time = self.ctx.as_ref().map_or(0.0, |ctx| ctx.current_time());
    }

    fn set_music_muffled(&mut self, muffled: bool) {
        let (Some(ctx), Some(filter)) = (&self.ctx, &self.music_filter) else {
            return;
        };
        let target = if muffled { MUFFLED_CUTOFF } else { OPEN_CUTOFF };
        filter
            .frequency()
            .set_target_at_time(target, ctx.current_time(), 0.5)
            .ok();
    }

    fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
        self.apply_volume();
    }

    fn play(&mut self, effect: SoundEffect) {
        if self.effective_volume() <= 0.0 {
            return;
        }
        self.resume();
        let (Some(ctx), Some(out)) = (&self.ctx, &self.master) else {
            return;
        };

        match effect {
            SoundEffect::Coin => self.play_coin(ctx, out),
            SoundEffect::PowerUp(kind) => self.play_powerup(ctx, out, kind),
            SoundEffect::Crash => self.play_crash(ctx, out),
            SoundEffect::ShieldBreak => self.play_shield_break(ctx, out),
            SoundEffect::Warning => self.play_warning(ctx, out),
            SoundEffect::UiClick => self.play_ui_click(ctx, out),
        }
    }
}

/// Create an oscillator feeding a fresh gain node connected to `out`
fn create_osc(
    ctx: &AudioContext,
    freq: f32,
    osc_type: OscillatorType,
    out: &web_sys::AudioNode,
) -> Option<(OscillatorNode, GainNode)> {
    let osc = ctx.create_oscillator().ok()?;
    let gain = ctx.create_gain().ok()?;

    osc.set_type(osc_type);
    osc.frequency().set_value(freq);
    osc.connect_with_audio_node(&gain).ok()?;
    gain.connect_with_audio_node(out).ok()?;

    Some((osc, gain))
}
