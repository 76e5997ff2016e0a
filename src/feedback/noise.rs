//! Filtered noise bursts with a process-wide cache.

use std::{
    f32::consts::TAU,
    sync::{Arc, OnceLock},
};

use dashmap::DashMap;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::feedback::synth::SAMPLE_RATE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NoiseKey {
    duration_ms: u32,
    cutoff_hz: u32,
}

/// Cache of rendered noise bursts keyed by `(duration, cutoff)`.
///
/// Entries live as long as the bank; the key space is the handful of
/// bursts referenced by the cue presets.
#[derive(Debug)]
pub struct NoiseBank {
    sample_rate: u32,
    bursts: DashMap<NoiseKey, Arc<[f32]>>,
}

static SHARED: OnceLock<Arc<NoiseBank>> = OnceLock::new();

impl NoiseBank {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            bursts: DashMap::new(),
        }
    }

    /// Process-wide bank, created on first use.
    pub fn shared() -> Arc<NoiseBank> {
        SHARED
            .get_or_init(|| Arc::new(NoiseBank::new(SAMPLE_RATE)))
            .clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Return the burst for these parameters, generating it at most once.
    pub fn burst(&self, duration_ms: u32, cutoff_hz: u32) -> Arc<[f32]> {
        let key = NoiseKey {
            duration_ms,
            cutoff_hz,
        };

        if let Some(existing) = self.bursts.get(&key) {
            return Arc::clone(existing.value());
        }

        let entry = self
            .bursts
            .entry(key)
            .or_insert_with(|| generate(key, self.sample_rate).into());
        Arc::clone(entry.value())
    }

    /// Number of cached bursts.
    pub fn len(&self) -> usize {
        self.bursts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty()
    }
}

/// White noise through a one-pole low-pass, shaped by a linear fade-out.
fn generate(key: NoiseKey, sample_rate: u32) -> Vec<f32> {
    let len = (key.duration_ms as u64 * sample_rate as u64 / 1000) as usize;
    let seed = ((key.duration_ms as u64) << 32) | key.cutoff_hz as u64;
    let mut rng = StdRng::seed_from_u64(seed);

    let dt = 1.0 / sample_rate as f32;
    let rc = 1.0 / (TAU * key.cutoff_hz.max(1) as f32);
    let alpha = dt / (rc + dt);

    let mut filtered = 0.0f32;
    let mut samples = Vec::with_capacity(len);
    for i in 0..len {
        let white: f32 = rng.random_range(-1.0..=1.0);
        filtered += alpha * (white - filtered);
        let fade = 1.0 - i as f32 / len as f32;
        samples.push(filtered * fade);
    }

    normalize(&mut samples);
    samples
}

fn normalize(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        for sample in samples.iter_mut() {
            *sample /= peak;
        }
    }
}
