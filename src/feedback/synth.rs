//! Additive rendering of [`Cue`]s into mono PCM.

use std::{f32::consts::TAU, sync::Arc};

use crate::feedback::{
    cue::{Cue, Voice, Waveform},
    noise::NoiseBank,
};

/// Output sample rate of every rendered cue.
pub const SAMPLE_RATE: u32 = 44_100;
/// Linear attack applied to every tone before its exponential decay.
const ATTACK_MS: u32 = 10;
/// Level the exponential decay reaches at the end of a tone.
const DECAY_FLOOR: f32 = 0.00001;

/// Rendered mono samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub sample_rate: u32,
    pub samples: Arc<[f32]>,
}

impl PcmBuffer {
    /// A buffer of `duration_ms` held at a constant, inaudible level.
    pub fn near_silent(sample_rate: u32, duration_ms: u32) -> Self {
        let len = samples_for(duration_ms, sample_rate);
        Self {
            sample_rate,
            samples: vec![DECAY_FLOOR; len].into(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

fn samples_for(ms: u32, sample_rate: u32) -> usize {
    (ms as u64 * sample_rate as u64 / 1000) as usize
}

/// Value of `waveform` at `phase` in `[0, 1)`.
pub fn oscillate(waveform: Waveform, phase: f32) -> f32 {
    match waveform {
        Waveform::Sine => (TAU * phase).sin(),
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => {
            if phase < 0.25 {
                4.0 * phase
            } else if phase < 0.75 {
                2.0 - 4.0 * phase
            } else {
                4.0 * phase - 4.0
            }
        }
        Waveform::Sawtooth => {
            let shifted = phase + 0.5;
            2.0 * (shifted - shifted.floor()) - 1.0
        }
    }
}

/// Gain at `t` seconds into a tone of `duration` seconds: linear ramp to
/// `peak`, then exponential decay towards [`DECAY_FLOOR`].
pub fn envelope(t: f32, duration: f32, peak: f32) -> f32 {
    let attack = (ATTACK_MS as f32 / 1000.0).min(duration);
    if t < attack {
        return peak * t / attack;
    }

    let decay = duration - attack;
    if decay <= 0.0 || peak <= DECAY_FLOOR {
        return peak;
    }

    let progress = ((t - attack) / decay).clamp(0.0, 1.0);
    peak * (DECAY_FLOOR / peak).powf(progress)
}

/// Mix every voice of `cue` into a single buffer.
pub fn render(cue: &Cue, noise: &NoiseBank, sample_rate: u32) -> PcmBuffer {
    let mut mix = vec![0.0f32; samples_for(cue.duration_ms(), sample_rate)];

    for voice in &cue.voices {
        match *voice {
            Voice::Tone {
                freq_hz,
                waveform,
                offset_ms,
                duration_ms,
                peak,
            } => {
                let start = samples_for(offset_ms, sample_rate);
                let len = samples_for(duration_ms, sample_rate);
                let duration = duration_ms as f32 / 1000.0;
                let step = freq_hz / sample_rate as f32;

                let mut phase = 0.0f32;
                for (i, slot) in mix.iter_mut().skip(start).take(len).enumerate() {
                    let t = i as f32 / sample_rate as f32;
                    *slot += oscillate(waveform, phase) * envelope(t, duration, peak);
                    phase += step;
                    phase -= phase.floor();
                }
            }
            Voice::Noise {
                offset_ms,
                duration_ms,
                cutoff_hz,
                peak,
            } => {
                let start = samples_for(offset_ms, sample_rate);
                let burst = noise.burst(duration_ms, cutoff_hz);
                for (slot, sample) in mix.iter_mut().skip(start).zip(burst.iter()) {
                    *slot += sample * peak;
                }
            }
        }
    }

    for sample in mix.iter_mut() {
        *sample = sample.clamp(-1.0, 1.0);
    }

    PcmBuffer {
        sample_rate,
        samples: mix.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{FeedbackEvent, SoundScheme, cue::cue_for};

    const RATE: u32 = 8_000;

    fn tone_cue(offset_ms: u32, duration_ms: u32) -> Cue {
        Cue {
            voices: vec![Voice::Tone {
                freq_hz: 440.0,
                waveform: Waveform::Sine,
                offset_ms,
                duration_ms,
                peak: 0.5,
            }],
        }
    }

    #[test]
    fn waveforms_stay_in_unit_range() {
        for waveform in [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Triangle,
            Waveform::Sawtooth,
        ] {
            for step in 0..100 {
                let value = oscillate(waveform, step as f32 / 100.0);
                assert!((-1.0..=1.0).contains(&value), "{waveform:?} {value}");
            }
        }
    }

    #[test]
    fn triangle_and_saw_start_at_zero() {
        assert_eq!(oscillate(Waveform::Triangle, 0.0), 0.0);
        assert_eq!(oscillate(Waveform::Sawtooth, 0.0), 0.0);
        assert_eq!(oscillate(Waveform::Triangle, 0.25), 1.0);
    }

    #[test]
    fn envelope_ramps_up_then_decays() {
        assert_eq!(envelope(0.0, 0.15, 0.5), 0.0);
        assert!((envelope(0.01, 0.15, 0.5) - 0.5).abs() < 1e-4);
        assert!(envelope(0.08, 0.15, 0.5) < 0.5);
        assert!(envelope(0.15, 0.15, 0.5) <= 0.0001);
    }

    #[test]
    fn render_length_covers_the_latest_voice() {
        let bank = NoiseBank::new(RATE);
        let buffer = render(&tone_cue(100, 150), &bank, RATE);
        assert_eq!(buffer.len(), 2_000);
        assert!(buffer.samples[..800].iter().all(|s| *s == 0.0));
        assert!(buffer.samples[800..].iter().any(|s| *s != 0.0));
    }

    #[test]
    fn voices_mix_additively_without_clipping_past_unity() {
        let bank = NoiseBank::new(RATE);
        let cue = cue_for(FeedbackEvent::WinEmergency, SoundScheme::Intense);
        let buffer = render(&cue, &bank, RATE);
        assert!(buffer.peak() <= 1.0);
        assert!(buffer.peak() > 0.1);
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn near_silent_buffer_is_inaudible() {
        let buffer = PcmBuffer::near_silent(RATE, 20);
        assert_eq!(buffer.len(), 160);
        assert!(buffer.peak() < 0.001);
    }
}
