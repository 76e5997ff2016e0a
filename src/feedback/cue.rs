//! Cue presets for every event in each sound scheme.

use crate::feedback::{FeedbackEvent, SoundScheme};

/// Oscillator shape of a tone voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

/// One additive component of a cue. Times are in milliseconds from the
/// start of the cue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Voice {
    Tone {
        freq_hz: f32,
        waveform: Waveform,
        offset_ms: u32,
        duration_ms: u32,
        peak: f32,
    },
    /// Low-pass filtered white noise, used for impact-like accents.
    Noise {
        offset_ms: u32,
        duration_ms: u32,
        cutoff_hz: u32,
        peak: f32,
    },
}

impl Voice {
    fn tone(freq_hz: f32, waveform: Waveform, offset_ms: u32, duration_ms: u32, peak: f32) -> Self {
        Voice::Tone {
            freq_hz,
            waveform,
            offset_ms,
            duration_ms,
            peak,
        }
    }

    fn noise(offset_ms: u32, duration_ms: u32, cutoff_hz: u32, peak: f32) -> Self {
        Voice::Noise {
            offset_ms,
            duration_ms,
            cutoff_hz,
            peak,
        }
    }

    /// End of the voice relative to the cue start.
    pub fn end_ms(&self) -> u32 {
        match *self {
            Voice::Tone {
                offset_ms,
                duration_ms,
                ..
            }
            | Voice::Noise {
                offset_ms,
                duration_ms,
                ..
            } => offset_ms + duration_ms,
        }
    }
}

/// A set of voices mixed together into one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub voices: Vec<Voice>,
}

impl Cue {
    pub fn duration_ms(&self) -> u32 {
        self.voices.iter().map(Voice::end_ms).max().unwrap_or(0)
    }
}

const TONE_PEAK: f32 = 0.5;
const FANFARE_PEAK: f32 = 0.6;

/// Single-tone parameters of one scheme.
struct Beep {
    freq_hz: f32,
    waveform: Waveform,
    duration_ms: u32,
}

struct SchemePreset {
    point: Beep,
    error: Beep,
    countdown: Beep,
    timer_start: Beep,
}

static MODERN: SchemePreset = SchemePreset {
    point: Beep {
        freq_hz: 880.0,
        waveform: Waveform::Sine,
        duration_ms: 150,
    },
    error: Beep {
        freq_hz: 220.0,
        waveform: Waveform::Square,
        duration_ms: 150,
    },
    countdown: Beep {
        freq_hz: 1200.0,
        waveform: Waveform::Sine,
        duration_ms: 100,
    },
    timer_start: Beep {
        freq_hz: 660.0,
        waveform: Waveform::Sine,
        duration_ms: 100,
    },
};

static CLASSIC: SchemePreset = SchemePreset {
    point: Beep {
        freq_hz: 1046.50,
        waveform: Waveform::Square,
        duration_ms: 100,
    },
    error: Beep {
        freq_hz: 130.81,
        waveform: Waveform::Square,
        duration_ms: 200,
    },
    countdown: Beep {
        freq_hz: 1396.91,
        waveform: Waveform::Square,
        duration_ms: 80,
    },
    timer_start: Beep {
        freq_hz: 880.0,
        waveform: Waveform::Square,
        duration_ms: 80,
    },
};

static INTENSE: SchemePreset = SchemePreset {
    point: Beep {
        freq_hz: 330.0,
        waveform: Waveform::Square,
        duration_ms: 100,
    },
    error: Beep {
        freq_hz: 90.0,
        waveform: Waveform::Square,
        duration_ms: 300,
    },
    countdown: Beep {
        freq_hz: 1600.0,
        waveform: Waveform::Sawtooth,
        duration_ms: 80,
    },
    timer_start: Beep {
        freq_hz: 800.0,
        waveform: Waveform::Triangle,
        duration_ms: 100,
    },
};

// C5 E5 G5 C6: (frequency, offset, duration)
const FANFARE: [(f32, u32, u32); 4] = [
    (523.25, 0, 150),
    (659.25, 150, 150),
    (783.99, 300, 150),
    (1046.50, 450, 400),
];

fn preset(scheme: SoundScheme) -> &'static SchemePreset {
    match scheme {
        SoundScheme::Modern => &MODERN,
        SoundScheme::Classic => &CLASSIC,
        SoundScheme::Intense => &INTENSE,
    }
}

fn single(beep: &Beep) -> Voice {
    Voice::tone(beep.freq_hz, beep.waveform, 0, beep.duration_ms, TONE_PEAK)
}

fn fanfare_waveform(scheme: SoundScheme) -> Waveform {
    match scheme {
        SoundScheme::Modern => Waveform::Triangle,
        SoundScheme::Classic => Waveform::Square,
        SoundScheme::Intense => Waveform::Sawtooth,
    }
}

fn fanfare(scheme: SoundScheme) -> Vec<Voice> {
    let waveform = fanfare_waveform(scheme);
    let peak = match scheme {
        SoundScheme::Classic => 0.4,
        _ => FANFARE_PEAK,
    };

    FANFARE
        .iter()
        .map(|&(freq, offset, duration)| Voice::tone(freq, waveform, offset, duration, peak))
        .collect()
}

fn expiry_alarm(scheme: SoundScheme) -> Vec<Voice> {
    let (freq, waveform, count, interval_ms, duration_ms, peak) = match scheme {
        SoundScheme::Intense => (1800.0, Waveform::Sawtooth, 8, 120, 80, 0.6),
        SoundScheme::Modern | SoundScheme::Classic => (1500.0, Waveform::Sine, 5, 180, 150, 0.5),
    };

    (0..count)
        .map(|i| Voice::tone(freq, waveform, i * interval_ms, duration_ms, peak))
        .collect()
}

/// Build the cue for `event` in `scheme`.
pub fn cue_for(event: FeedbackEvent, scheme: SoundScheme) -> Cue {
    let preset = preset(scheme);

    let voices = match event {
        FeedbackEvent::Point => {
            let mut voices = vec![single(&preset.point)];
            if scheme == SoundScheme::Intense {
                voices.push(Voice::noise(0, 40, 3000, 0.25));
            }
            voices
        }
        FeedbackEvent::PointEmergency => {
            let point = &preset.point;
            vec![
                Voice::tone(point.freq_hz, point.waveform, 0, point.duration_ms, TONE_PEAK),
                Voice::tone(
                    point.freq_hz * 2.0,
                    point.waveform,
                    point.duration_ms * 3 / 5,
                    point.duration_ms,
                    TONE_PEAK,
                ),
                Voice::noise(0, 60, 2000, 0.3),
            ]
        }
        FeedbackEvent::Error => vec![single(&preset.error)],
        FeedbackEvent::Win => fanfare(scheme),
        FeedbackEvent::WinEmergency => {
            let waveform = fanfare_waveform(scheme);
            let mut voices = vec![Voice::noise(0, 120, 1200, 0.4)];
            voices.extend(fanfare(scheme));
            // Final chord stacked over the last fanfare note.
            voices.push(Voice::tone(1318.51, waveform, 450, 500, 0.3));
            voices.push(Voice::tone(1567.98, waveform, 450, 500, 0.3));
            voices.push(Voice::noise(450, 200, 800, 0.3));
            voices
        }
        FeedbackEvent::CountdownBeep => vec![single(&preset.countdown)],
        FeedbackEvent::TimerExpired => expiry_alarm(scheme),
        FeedbackEvent::TimerStarted => vec![single(&preset.timer_start)],
    };

    Cue { voices }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: [FeedbackEvent; 8] = [
        FeedbackEvent::Point,
        FeedbackEvent::PointEmergency,
        FeedbackEvent::Error,
        FeedbackEvent::Win,
        FeedbackEvent::WinEmergency,
        FeedbackEvent::CountdownBeep,
        FeedbackEvent::TimerExpired,
        FeedbackEvent::TimerStarted,
    ];

    #[test]
    fn every_event_has_voices_in_every_scheme() {
        for scheme in [SoundScheme::Modern, SoundScheme::Classic, SoundScheme::Intense] {
            for event in EVENTS {
                let cue = cue_for(event, scheme);
                assert!(!cue.voices.is_empty(), "{event:?} in {scheme:?}");
                assert!(cue.duration_ms() > 0);
            }
        }
    }

    #[test]
    fn schemes_voice_the_same_event_differently() {
        let modern = cue_for(FeedbackEvent::Point, SoundScheme::Modern);
        let classic = cue_for(FeedbackEvent::Point, SoundScheme::Classic);
        let intense = cue_for(FeedbackEvent::Point, SoundScheme::Intense);
        assert_ne!(modern, classic);
        assert_ne!(classic, intense);
        assert_ne!(modern, intense);
    }

    #[test]
    fn win_fanfare_notes_have_staggered_offsets() {
        let cue = cue_for(FeedbackEvent::Win, SoundScheme::Modern);
        let offsets: Vec<u32> = cue
            .voices
            .iter()
            .map(|voice| match voice {
                Voice::Tone { offset_ms, .. } | Voice::Noise { offset_ms, .. } => *offset_ms,
            })
            .collect();
        assert_eq!(offsets, vec![0, 150, 300, 450]);
        assert_eq!(cue.duration_ms(), 850);
    }

    #[test]
    fn expiry_alarm_is_longer_in_intense_scheme() {
        let modern = cue_for(FeedbackEvent::TimerExpired, SoundScheme::Modern);
        let intense = cue_for(FeedbackEvent::TimerExpired, SoundScheme::Intense);
        assert_eq!(modern.voices.len(), 5);
        assert_eq!(intense.voices.len(), 8);
        assert_eq!(modern.duration_ms(), 4 * 180 + 150);
    }

    #[test]
    fn emergency_variants_add_an_impact_burst() {
        for event in [FeedbackEvent::PointEmergency, FeedbackEvent::WinEmergency] {
            let cue = cue_for(event, SoundScheme::Classic);
            assert!(
                cue.voices
                    .iter()
                    .any(|voice| matches!(voice, Voice::Noise { .. }))
            );
        }
    }
}
