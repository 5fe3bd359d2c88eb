//! Timed power-up effects
//!
//! Countdowns run in real (unscaled) seconds so slow motion does not stretch
//! its own duration. Collecting an effect that is already running restarts its
//! countdown; the magnitude never stacks.

use super::state::PowerUpKind;
use crate::consts::*;

/// Active power-up effects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveEffects {
    /// Absorbs one obstacle hit; no countdown
    pub shield: bool,
    /// Remaining slow-motion time (real seconds)
    pub slow_motion: f32,
    /// Remaining score multiplier time (real seconds)
    pub multiplier: f32,
}

impl ActiveEffects {
    /// Apply a collected power-up
    pub fn activate(&mut self, kind: PowerUpKind) {
        match kind {
            PowerUpKind::Shield => self.shield = true,
            PowerUpKind::SlowMotion => self.slow_motion = SLOW_MOTION_SECS,
            PowerUpKind::Multiplier => self.multiplier = MULTIPLIER_SECS,
        }
    }

    /// Count down timed effects, returning the ones that expired this call
    pub fn advance(&mut self, real_dt: f32) -> Vec<PowerUpKind> {
        let mut expired = Vec::new();
        if self.slow_motion > 0.0 {
            self.slow_motion -= real_dt;
            if self.slow_motion <= 0.0 {
                self.slow_motion = 0.0;
                expired.push(PowerUpKind::SlowMotion);
            }
        }
        if self.multiplier > 0.0 {
            self.multiplier -= real_dt;
            if self.multiplier <= 0.0 {
                self.multiplier = 0.0;
                expired.push(PowerUpKind::Multiplier);
            }
        }
        expired
    }

    /// Consume the shield; returns whether one was up
    pub fn absorb_hit(&mut self) -> bool {
        std::mem::replace(&mut self.shield, false)
    }

    /// Multiplier applied to world advancement
    pub fn time_scale(&self) -> f32 {
        if self.slow_motion > 0.0 {
            SLOW_MOTION_SCALE
        } else {
            1.0
        }
    }

    /// Multiplier applied to score gains
    pub fn score_multiplier(&self) -> u32 {
        if self.multiplier > 0.0 { MULTIPLIER } else { 1 }
    }

    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        match kind {
            PowerUpKind::Shield => self.shield,
            PowerUpKind::SlowMotion => self.slow_motion > 0.0,
            PowerUpKind::Multiplier => self.multiplier > 0.0,
        }
    }
}
