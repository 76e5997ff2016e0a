use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use crate::feedback::{
    FeedbackEvent, FeedbackPort, FeedbackProfile, HapticPulse, SoundScheme,
    cue::cue_for,
    noise::NoiseBank,
    output::{AudioOutput, EngineState, HapticOutput, NullAudio, TracingHaptics},
    synth::{PcmBuffer, render},
};

const WARM_UP_MS: u32 = 20;

/// Renders feedback events and hands them to the audio and haptic outputs.
///
/// Preferences are read on every call. Cues are rendered once per
/// `(scheme, event)` and reused afterwards.
pub struct FeedbackEmitter {
    profile: watch::Sender<FeedbackProfile>,
    audio: Arc<dyn AudioOutput>,
    haptics: Arc<dyn HapticOutput>,
    noise: Arc<NoiseBank>,
    warmed: AtomicBool,
    rendered: DashMap<(SoundScheme, FeedbackEvent), PcmBuffer>,
}

impl FeedbackEmitter {
    pub fn new(
        profile: FeedbackProfile,
        audio: Arc<dyn AudioOutput>,
        haptics: Arc<dyn HapticOutput>,
    ) -> Self {
        Self {
            profile: watch::Sender::new(profile),
            audio,
            haptics,
            noise: NoiseBank::shared(),
            warmed: AtomicBool::new(false),
            rendered: DashMap::new(),
        }
    }

    /// Emitter without a sound device; haptic pulses are only traced.
    pub fn silent(profile: FeedbackProfile) -> Self {
        Self::new(profile, Arc::new(NullAudio), Arc::new(TracingHaptics))
    }

    /// Use a private noise bank instead of the process-wide one.
    pub fn with_noise_bank(mut self, noise: Arc<NoiseBank>) -> Self {
        self.noise = noise;
        self.rendered.clear();
        self
    }

    pub fn profile(&self) -> FeedbackProfile {
        *self.profile.borrow()
    }

    /// Observe preference changes.
    pub fn subscribe_profile(&self) -> watch::Receiver<FeedbackProfile> {
        self.profile.subscribe()
    }

    fn engine_ready(&self, event: FeedbackEvent) -> bool {
        match self.audio.state() {
            EngineState::Running => true,
            EngineState::Suspended => {
                if self.audio.resume() == EngineState::Running {
                    true
                } else {
                    debug!(?event, "audio engine still suspended, cue dropped");
                    false
                }
            }
            EngineState::Unavailable => {
                debug!(?event, "no audio engine, cue dropped");
                false
            }
        }
    }

    fn warm_up(&self) {
        if self.warmed.swap(true, Ordering::AcqRel) {
            return;
        }
        let buffer = PcmBuffer::near_silent(self.noise.sample_rate(), WARM_UP_MS);
        if let Err(err) = self.audio.play(buffer) {
            debug!(%err, "audio warm-up failed");
        }
    }

    fn cue_buffer(&self, event: FeedbackEvent, scheme: SoundScheme) -> PcmBuffer {
        let key = (scheme, event);
        if let Some(buffer) = self.rendered.get(&key) {
            return buffer.value().clone();
        }

        self.rendered
            .entry(key)
            .or_insert_with(|| {
                render(
                    &cue_for(event, scheme),
                    &self.noise,
                    self.noise.sample_rate(),
                )
            })
            .value()
            .clone()
    }
}

impl FeedbackPort for FeedbackEmitter {
    fn play(&self, event: FeedbackEvent) {
        let profile = self.profile();
        if !profile.audio_enabled || !self.engine_ready(event) {
            return;
        }

        self.warm_up();
        let buffer = self.cue_buffer(event, profile.scheme);
        match self.audio.play(buffer) {
            Ok(()) => debug!(?event, scheme = ?profile.scheme, "cue played"),
            Err(err) => debug!(%err, ?event, "cue dropped"),
        }
    }

    fn pulse(&self, pulse: HapticPulse) {
        if !self.profile().haptic_enabled {
            return;
        }
        if let Err(err) = self.haptics.vibrate(&pulse.durations()) {
            debug!(%err, ?pulse, "haptic pulse dropped");
        }
    }

    fn set_profile(&self, profile: FeedbackProfile) {
        self.profile.send_replace(profile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{
        HapticPattern,
        output::{CaptureAudio, CaptureHaptics},
    };

    const RATE: u32 = 8_000;

    fn emitter(
        profile: FeedbackProfile,
        audio: Arc<CaptureAudio>,
        haptics: Arc<CaptureHaptics>,
    ) -> FeedbackEmitter {
        FeedbackEmitter::new(profile, audio, haptics)
            .with_noise_bank(Arc::new(NoiseBank::new(RATE)))
    }

    #[test]
    fn first_cue_is_preceded_by_a_single_warm_up() {
        let audio = Arc::new(CaptureAudio::running());
        let emitter = emitter(
            FeedbackProfile::default(),
            audio.clone(),
            Arc::new(CaptureHaptics::default()),
        );

        emitter.play(FeedbackEvent::Point);
        emitter.play(FeedbackEvent::Point);

        let played = audio.played();
        assert_eq!(played.len(), 3);
        assert!(played[0].peak() < 0.001);
        assert!(played[1].peak() > 0.1);
        assert!(Arc::ptr_eq(&played[1].samples, &played[2].samples));
    }

    #[test]
    fn disabled_audio_plays_nothing() {
        let audio = Arc::new(CaptureAudio::running());
        let profile = FeedbackProfile {
            audio_enabled: false,
            ..FeedbackProfile::default()
        };
        let emitter = emitter(profile, audio.clone(), Arc::new(CaptureHaptics::default()));

        emitter.play(FeedbackEvent::Win);
        assert!(audio.played().is_empty());
    }

    #[test]
    fn suspended_engine_gets_one_resume_attempt_per_cue() {
        let audio = Arc::new(CaptureAudio::with_state(EngineState::Suspended, false));
        let emitter = emitter(
            FeedbackProfile::default(),
            audio.clone(),
            Arc::new(CaptureHaptics::default()),
        );

        emitter.play(FeedbackEvent::Point);
        emitter.play(FeedbackEvent::Error);

        assert_eq!(audio.resume_attempts(), 2);
        assert!(audio.played().is_empty());
    }

    #[test]
    fn resumed_engine_plays_the_cue() {
        let audio = Arc::new(CaptureAudio::with_state(EngineState::Suspended, true));
        let emitter = emitter(
            FeedbackProfile::default(),
            audio.clone(),
            Arc::new(CaptureHaptics::default()),
        );

        emitter.play(FeedbackEvent::TimerStarted);

        assert_eq!(audio.resume_attempts(), 1);
        assert_eq!(audio.played().len(), 2);
    }

    #[test]
    fn unavailable_engine_drops_cues_silently() {
        let emitter = FeedbackEmitter::silent(FeedbackProfile::default());
        emitter.play(FeedbackEvent::TimerExpired);
        emitter.pulse(HapticPulse::TAP);
    }

    #[test]
    fn profile_subscribers_see_every_change() {
        let emitter = FeedbackEmitter::silent(FeedbackProfile::default());
        let mut profile = emitter.subscribe_profile();
        assert!(!profile.has_changed().unwrap());

        let muted = FeedbackProfile {
            audio_enabled: false,
            ..FeedbackProfile::default()
        };
        emitter.set_profile(muted);

        assert!(profile.has_changed().unwrap());
        assert_eq!(*profile.borrow_and_update(), muted);
        assert_eq!(emitter.profile(), muted);
    }

    #[test]
    fn profile_changes_apply_to_the_next_call() {
        let audio = Arc::new(CaptureAudio::running());
        let haptics = Arc::new(CaptureHaptics::default());
        let emitter = emitter(FeedbackProfile::default(), audio.clone(), haptics.clone());

        emitter.pulse(HapticPulse::Pattern(HapticPattern::Victory));
        emitter.set_profile(FeedbackProfile {
            haptic_enabled: false,
            scheme: SoundScheme::Intense,
            ..FeedbackProfile::default()
        });
        emitter.pulse(HapticPulse::TAP);
        emitter.play(FeedbackEvent::Point);

        assert_eq!(haptics.pulses(), vec![vec![200, 100, 200]]);
        let expected = render(
            &cue_for(FeedbackEvent::Point, SoundScheme::Intense),
            &NoiseBank::new(RATE),
            RATE,
        );
        assert_eq!(audio.played()[1], expected);
    }
}
