//! Lane input boundary
//!
//! Steering arrives as a discrete lane from one of two sources: the head
//! tracker (nose position from the webcam) or the keyboard. Which source is
//! live is decided once at startup by racing tracker acquisition against a
//! timeout; whichever resolves first wins and later results are ignored.

use crate::sim::Lane;

/// How long tracker acquisition may take before falling back to the keyboard
pub const ACQUIRE_TIMEOUT_MS: i32 = 5000;

/// Nose x above this (camera space, mirrored) steers left
pub const LEAN_LEFT_THRESHOLD: f32 = 0.6;
/// Nose x below this steers right
pub const LEAN_RIGHT_THRESHOLD: f32 = 0.4;

/// Map the tracked nose x (0..1 in the unmirrored camera image) to a lane.
///
/// The preview is mirrored, so leaning to the player's left moves the nose
/// toward larger x.
pub fn lane_from_nose_x(nose_x: f32) -> Lane {
    if nose_x > LEAN_LEFT_THRESHOLD {
        Lane::Left
    } else if nose_x < LEAN_RIGHT_THRESHOLD {
        Lane::Right
    } else {
        Lane::Center
    }
}

/// Map an external lane signal (0, 1, 2) to a lane; anything else is ignored
pub fn lane_from_signal(signal: i32) -> Option<Lane> {
    u8::try_from(signal).ok().and_then(Lane::from_index)
}

/// Arrow-key steering: hold an arrow to sit in that lane, release to recentre
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardSteering {
    left: bool,
    right: bool,
}

impl KeyboardSteering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key press; returns the lane to steer to, if the key steers
    pub fn key_down(&mut self, key: &str) -> Option<Lane> {
        match key {
            "ArrowLeft" => {
                self.left = true;
                Some(Lane::Left)
            }
            "ArrowRight" => {
                self.right = true;
                Some(Lane::Right)
            }
            _ => None,
        }
    }

    /// Handle a key release. Falls back to the other held arrow, else centre.
    pub fn key_up(&mut self, key: &str) -> Option<Lane> {
        match key {
            "ArrowLeft" => self.left = false,
            "ArrowRight" => self.right = false,
            _ => return None,
        }
        Some(match (self.left, self.right) {
            (true, false) => Lane::Left,
            (false, true) => Lane::Right,
            _ => Lane::Center,
        })
    }
}

/// Result of trying to bring up the head tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Camera and face tracking are running
    Ready,
    /// The timeout fired first
    TimedOut,
    /// Acquisition failed outright (permissions, missing library, skipped)
    Failed(String),
}

/// Which source drives the lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Acquisition still racing; nothing steers yet
    #[default]
    Pending,
    Tracker,
    Keyboard,
}

/// Where a lane signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Tracker,
    Keyboard,
}

/// First-wins guard over the acquisition race.
///
/// Both the tracker callback and the timeout call [`resolve`]; only the
/// first call changes the mode, so the input path is initialised once.
///
/// [`resolve`]: InputAcquisition::resolve
#[derive(Debug, Clone, Default)]
pub struct InputAcquisition {
    mode: InputMode,
}

impl InputAcquisition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn is_settled(&self) -> bool {
        self.mode != InputMode::Pending
    }

    /// Settle the race. Returns the chosen mode the first time, `None` after.
    pub fn resolve(&mut self, outcome: AcquireOutcome) -> Option<InputMode> {
        if self.is_settled() {
            log::debug!("Ignoring late acquisition outcome {:?}", outcome);
            return None;
        }

        self.mode = match outcome {
            AcquireOutcome::Ready => {
                log::info!("Head tracking ready");
                InputMode::Tracker
            }
            AcquireOutcome::TimedOut => {
                log::warn!(
                    "Head tracking did not start within {} ms, using keyboard",
                    ACQUIRE_TIMEOUT_MS
                );
                InputMode::Keyboard
            }
            AcquireOutcome::Failed(reason) => {
                log::error!("Head tracking unavailable ({}), using keyboard", reason);
                InputMode::Keyboard
            }
        };
        Some(self.mode)
    }

    /// Whether a lane signal from `source` should reach the simulation
    pub fn accepts(&self, source: InputSource) -> bool {
        matches!(
            (self.mode, source),
            (InputMode::Tracker, InputSource::Tracker) | (InputMode::Keyboard, InputSource::Keyboard)
        )
    }
}

/// Holds an acquisition outcome that arrives before the game is up.
///
/// The tracker glue can report in while the GPU device is still being
/// requested. Only the first outcome is kept, matching [`InputAcquisition`].
#[derive(Debug, Clone, Default)]
pub struct PendingOutcome {
    first: Option<AcquireOutcome>,
}

impl PendingOutcome {
    pub fn offer(&mut self, outcome: AcquireOutcome) {
        if self.first.is_some() {
            log::debug!("Dropping later early outcome {:?}", outcome);
            return;
        }
        self.first = Some(outcome);
    }

    /// Hand the buffered outcome over for replay, leaving the buffer empty
    pub fn take(&mut self) -> Option<AcquireOutcome> {
        self.first.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nose_mapping() {
        assert_eq!(lane_from_nose_x(0.9), Lane::Left);
        assert_eq!(lane_from_nose_x(0.6), Lane::Center);
        assert_eq!(lane_from_nose_x(0.5), Lane::Center);
        assert_eq!(lane_from_nose_x(0.4), Lane::Center);
        assert_eq!(lane_from_nose_x(0.1), Lane::Right);
        assert_eq!(lane_from_nose_x(f32::NAN), Lane::Center);
    }

    #[test]
    fn test_signal_mapping() {
        assert_eq!(lane_from_signal(0), Some(Lane::Left));
        assert_eq!(lane_from_signal(1), Some(Lane::Center));
        assert_eq!(lane_from_signal(2), Some(Lane::Right));
        assert_eq!(lane_from_signal(3), None);
        assert_eq!(lane_from_signal(-1), None);
    }

    #[test]
    fn test_keyboard_hold_and_release() {
        let mut kb = KeyboardSteering::new();
        assert_eq!(kb.key_down("ArrowLeft"), Some(Lane::Left));
        assert_eq!(kb.key_up("ArrowLeft"), Some(Lane::Center));
        assert_eq!(kb.key_down("Space"), None);
        assert_eq!(kb.key_up("Space"), None);
    }

    #[test]
    fn test_keyboard_overlapping_arrows() {
        let mut kb = KeyboardSteering::new();
        kb.key_down("ArrowLeft");
        assert_eq!(kb.key_down("ArrowRight"), Some(Lane::Right));
        // Releasing right while left is still held goes back left
        assert_eq!(kb.key_up("ArrowRight"), Some(Lane::Left));
        assert_eq!(kb.key_up("ArrowLeft"), Some(Lane::Center));
    }

    #[test]
    fn test_timeout_then_late_ready() {
        let mut acq = InputAcquisition::new();
        assert!(!acq.accepts(InputSource::Keyboard));
        assert!(!acq.accepts(InputSource::Tracker));

        assert_eq!(acq.resolve(AcquireOutcome::TimedOut), Some(InputMode::Keyboard));
        assert_eq!(acq.resolve(AcquireOutcome::Ready), None);
        assert_eq!(acq.mode(), InputMode::Keyboard);
        assert!(acq.accepts(InputSource::Keyboard));
        assert!(!acq.accepts(InputSource::Tracker));
    }

    #[test]
    fn test_ready_then_timeout() {
        let mut acq = InputAcquisition::new();
        assert_eq!(acq.resolve(AcquireOutcome::Ready), Some(InputMode::Tracker));
        assert_eq!(acq.resolve(AcquireOutcome::TimedOut), None);
        assert!(acq.accepts(InputSource::Tracker));
        assert!(!acq.accepts(InputSource::Keyboard));
    }

    #[test]
    fn test_failure_falls_back() {
        let mut acq = InputAcquisition::new();
        let mode = acq.resolve(AcquireOutcome::Failed("permission denied".into()));
        assert_eq!(mode, Some(InputMode::Keyboard));
        assert!(acq.is_settled());
    }

    #[test]
    fn test_early_ready_replayed_before_timeout() {
        let mut pending = PendingOutcome::default();
        pending.offer(AcquireOutcome::Ready);
        pending.offer(AcquireOutcome::Failed("late".into()));

        let mut acq = InputAcquisition::new();
        if let Some(outcome) = pending.take() {
            acq.resolve(outcome);
        }
        // The timeout armed after startup loses to the replayed outcome
        assert_eq!(acq.resolve(AcquireOutcome::TimedOut), None);
        assert_eq!(acq.mode(), InputMode::Tracker);
        assert!(pending.take().is_none());
    }

    #[test]
    fn test_empty_buffer_leaves_race_open() {
        let mut pending = PendingOutcome::default();
        assert!(pending.take().is_none());
        let mut acq = InputAcquisition::new();
        assert_eq!(acq.resolve(AcquireOutcome::TimedOut), Some(InputMode::Keyboard));
    }

    fn outcome() -> impl Strategy<Value = AcquireOutcome> {
        prop_oneof![
            Just(AcquireOutcome::Ready),
            Just(AcquireOutcome::TimedOut),
            "[a-z]{0,8}".prop_map(AcquireOutcome::Failed),
        ]
    }

    proptest! {
        #[test]
        fn first_outcome_wins(outcomes in prop::collection::vec(outcome(), 1..6)) {
            let mut acq = InputAcquisition::new();
            let expected = match outcomes[0] {
                AcquireOutcome::Ready => InputMode::Tracker,
                _ => InputMode::Keyboard,
            };
            let settled: Vec<_> = outcomes
                .into_iter()
                .filter_map(|o| acq.resolve(o))
                .collect();
            prop_assert_eq!(settled, vec![expected]);
            prop_assert_eq!(acq.mode(), expected);
        }
    }
}
