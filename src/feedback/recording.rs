use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::feedback::{FeedbackEvent, FeedbackPort, FeedbackProfile, HapticPulse};

/// One emission captured by [`RecordingFeedback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedFeedback {
    Sound(FeedbackEvent),
    Haptic(HapticPulse),
}

/// Feedback port that records every request in order, regardless of the
/// profile. Lets callers assert on what the session asked for.
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    log: Mutex<Vec<RecordedFeedback>>,
    profile: Mutex<FeedbackProfile>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, Vec<RecordedFeedback>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn entries(&self) -> Vec<RecordedFeedback> {
        self.log().clone()
    }

    /// Drain the log, returning what was recorded so far.
    pub fn take(&self) -> Vec<RecordedFeedback> {
        std::mem::take(&mut *self.log())
    }

    pub fn sounds(&self) -> Vec<FeedbackEvent> {
        self.log()
            .iter()
            .filter_map(|entry| match entry {
                RecordedFeedback::Sound(event) => Some(*event),
                RecordedFeedback::Haptic(_) => None,
            })
            .collect()
    }

    pub fn pulses(&self) -> Vec<HapticPulse> {
        self.log()
            .iter()
            .filter_map(|entry| match entry {
                RecordedFeedback::Haptic(pulse) => Some(*pulse),
                RecordedFeedback::Sound(_) => None,
            })
            .collect()
    }

    pub fn count(&self, event: FeedbackEvent) -> usize {
        self.log()
            .iter()
            .filter(|entry| **entry == RecordedFeedback::Sound(event))
            .count()
    }

    /// Last profile pushed by the session.
    pub fn profile(&self) -> FeedbackProfile {
        *self.profile.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FeedbackPort for RecordingFeedback {
    fn play(&self, event: FeedbackEvent) {
        self.log().push(RecordedFeedback::Sound(event));
    }

    fn pulse(&self, pulse: HapticPulse) {
        self.log().push(RecordedFeedback::Haptic(pulse));
    }

    fn set_profile(&self, profile: FeedbackProfile) {
        *self.profile.lock().unwrap_or_else(PoisonError::into_inner) = profile;
    }
}
