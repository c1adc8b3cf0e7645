// Audio feedback for UI and system events.
//
// `FeedbackEmitter` maps a `FeedbackKind` to a `Cue` and hands it to a
// `CuePlayer` backend when sound is enabled. Backend failures are logged and
// swallowed so they never reach the caller or touch vitals/alert state.

pub mod player;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::AudioError;

pub use player::{NullPlayer, RodioPlayer};

/// Discrete events that produce an audible cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackKind {
    Click,
    Success,
    Alert,
}

const ALERT_REPEATS: u32 = 5;
const ALERT_SPACING: Duration = Duration::from_millis(300);

impl FeedbackKind {
    /// Click and Success are single tones; Alert repeats.
    pub fn cue(&self) -> Cue {
        let tones = match self {
            Self::Click => vec![Tone::new(800.0, Duration::ZERO, Duration::from_millis(100), 0.1)],
            Self::Success => vec![Tone::new(1000.0, Duration::ZERO, Duration::from_millis(200), 0.05)],
            Self::Alert => (0..ALERT_REPEATS)
                .map(|i| Tone::new(800.0, ALERT_SPACING * i, Duration::from_millis(200), 0.2))
                .collect(),
        };
        Cue { kind: *self, tones }
    }
}

/// One beep within a cue
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    /// Start relative to the beginning of the cue
    pub offset: Duration,
    pub duration: Duration,
    pub gain: f32,
}

impl Tone {
    pub fn new(frequency_hz: f32, offset: Duration, duration: Duration, gain: f32) -> Self {
        Self {
            frequency_hz,
            offset,
            duration,
            gain,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub kind: FeedbackKind,
    pub tones: Vec<Tone>,
}

impl Cue {
    pub fn is_repeated(&self) -> bool {
        self.tones.len() > 1
    }

    pub fn total_duration(&self) -> Duration {
        self.tones
            .iter()
            .map(|t| t.offset + t.duration)
            .max()
            .unwrap_or_default()
    }
}

/// Audio backend. `play` must return quickly; synthesis happens elsewhere.
pub trait CuePlayer: Send + Sync {
    fn play(&self, cue: &Cue) -> Result<(), AudioError>;
}

pub struct FeedbackEmitter {
    player: Box<dyn CuePlayer>,
    enabled: AtomicBool,
}

impl FeedbackEmitter {
    pub fn new(player: Box<dyn CuePlayer>, enabled: bool) -> Self {
        Self {
            player,
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flip the sound setting; switching on confirms with the Success cue.
    /// Returns the new setting.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::Relaxed);
        log::info!("Sound feedback {}", if enabled { "enabled" } else { "disabled" });
        if enabled {
            self.emit(FeedbackKind::Success);
        }
        enabled
    }

    /// Play the cue for `kind` if enabled. Returns true when the backend accepted it.
    pub fn emit(&self, kind: FeedbackKind) -> bool {
        if !self.is_enabled() {
            return false;
        }
        match self.player.play(&kind.cue()) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Audio feedback failed for {:?}: {}", kind, e);
                false
            }
        }
    }
}
