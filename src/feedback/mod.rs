//! Sensory feedback: synthesized audio cues and haptic pulses.
//!
//! Cues are built from [`cue::Voice`]s, rendered to mono PCM by [`synth`],
//! and handed to an [`output::AudioOutput`]. Everything here is best effort:
//! a missing or blocked output never surfaces as an error to game logic.

pub mod cue;
pub mod emitter;
pub mod noise;
pub mod output;
pub mod recording;
#[cfg(feature = "speaker")]
pub mod speaker;
pub mod synth;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use self::emitter::FeedbackEmitter;
pub use self::recording::{RecordedFeedback, RecordingFeedback};

/// Named feedback events raised by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackEvent {
    Point,
    /// Point scored within one of the target.
    PointEmergency,
    /// Rejected action, undo or reset.
    Error,
    Win,
    /// Win on a one-point margin.
    WinEmergency,
    /// Once per second during the final ten seconds of the shot clock.
    CountdownBeep,
    TimerExpired,
    TimerStarted,
}

impl FeedbackEvent {
    pub fn is_point(self) -> bool {
        matches!(self, FeedbackEvent::Point | FeedbackEvent::PointEmergency)
    }

    pub fn is_win(self) -> bool {
        matches!(self, FeedbackEvent::Win | FeedbackEvent::WinEmergency)
    }
}

/// Preset family used to voice the event vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SoundScheme {
    #[default]
    #[serde(alias = "moderno")]
    Modern,
    #[serde(alias = "classico")]
    Classic,
    #[serde(alias = "intenso")]
    Intense,
}

/// User feedback preferences, read on every emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct FeedbackProfile {
    pub audio_enabled: bool,
    pub haptic_enabled: bool,
    pub scheme: SoundScheme,
}

impl Default for FeedbackProfile {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            haptic_enabled: true,
            scheme: SoundScheme::Modern,
        }
    }
}

/// Named on/off vibration sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticPattern {
    Victory,
    TimerExpired,
    Reset,
}

impl HapticPattern {
    /// Alternating on/off durations in milliseconds, starting with "on".
    pub fn durations(self) -> &'static [u32] {
        match self {
            HapticPattern::Victory => &[200, 100, 200],
            HapticPattern::TimerExpired => &[150, 50, 150],
            HapticPattern::Reset => &[100, 50, 100],
        }
    }
}

/// A single vibration or a named pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticPulse {
    Single(u32),
    Pattern(HapticPattern),
}

impl HapticPulse {
    /// Short tap used for points and side switches.
    pub const TAP: HapticPulse = HapticPulse::Single(50);
    /// Buzz for a rejected action.
    pub const REJECT: HapticPulse = HapticPulse::Single(100);

    pub fn durations(self) -> Vec<u32> {
        match self {
            HapticPulse::Single(ms) => vec![ms],
            HapticPulse::Pattern(pattern) => pattern.durations().to_vec(),
        }
    }
}

/// Fire-and-forget feedback sink used by the session controller.
pub trait FeedbackPort: Send + Sync {
    /// Play the audio cue for `event`.
    fn play(&self, event: FeedbackEvent);
    /// Issue a haptic pulse.
    fn pulse(&self, pulse: HapticPulse);
    /// Replace the preferences consulted by subsequent emissions.
    fn set_profile(&self, profile: FeedbackProfile);
}

impl<T: FeedbackPort + ?Sized> FeedbackPort for Arc<T> {
    fn play(&self, event: FeedbackEvent) {
        (**self).play(event)
    }

    fn pulse(&self, pulse: HapticPulse) {
        (**self).pulse(pulse)
    }

    fn set_profile(&self, profile: FeedbackProfile) {
        (**self).set_profile(profile)
    }
}
