//! Output seams for rendered audio and haptic pulses.

use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

use crate::feedback::synth::PcmBuffer;

/// Availability of the underlying audio engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    /// Present but not producing sound until resumed.
    Suspended,
    Unavailable,
}

/// Failures reported by an output device. Logged, never propagated.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("audio engine unavailable")]
    Unavailable,
    #[error("output device error: {0}")]
    Device(String),
}

/// Destination of rendered cues. `play` must not block on playback.
pub trait AudioOutput: Send + Sync {
    fn state(&self) -> EngineState;
    /// Try to bring a suspended engine back; returns the resulting state.
    fn resume(&self) -> EngineState;
    fn play(&self, buffer: PcmBuffer) -> Result<(), OutputError>;
}

/// Destination of vibration patterns (alternating on/off milliseconds).
pub trait HapticOutput: Send + Sync {
    fn vibrate(&self, durations: &[u32]) -> Result<(), OutputError>;
}

/// Audio output for hosts without a sound device.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioOutput for NullAudio {
    fn state(&self) -> EngineState {
        EngineState::Unavailable
    }

    fn resume(&self) -> EngineState {
        EngineState::Unavailable
    }

    fn play(&self, _buffer: PcmBuffer) -> Result<(), OutputError> {
        Err(OutputError::Unavailable)
    }
}

/// Haptic output for hosts without a vibration motor; traces each pattern.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHaptics;

impl HapticOutput for TracingHaptics {
    fn vibrate(&self, durations: &[u32]) -> Result<(), OutputError> {
        debug!(?durations, "haptic pulse");
        Ok(())
    }
}

/// In-memory audio output capturing every buffer, with a scriptable engine
/// state. Useful to observe emission without a device.
#[derive(Debug)]
pub struct CaptureAudio {
    inner: Mutex<CaptureState>,
}

#[derive(Debug)]
struct CaptureState {
    state: EngineState,
    resumable: bool,
    resume_attempts: usize,
    played: Vec<PcmBuffer>,
}

impl CaptureAudio {
    /// A running engine.
    pub fn running() -> Self {
        Self::with_state(EngineState::Running, true)
    }

    /// An engine in `state`; `resumable` decides whether `resume` succeeds.
    pub fn with_state(state: EngineState, resumable: bool) -> Self {
        Self {
            inner: Mutex::new(CaptureState {
                state,
                resumable,
                resume_attempts: 0,
                played: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CaptureState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn played(&self) -> Vec<PcmBuffer> {
        self.lock().played.clone()
    }

    pub fn resume_attempts(&self) -> usize {
        self.lock().resume_attempts
    }
}

impl AudioOutput for CaptureAudio {
    fn state(&self) -> EngineState {
        self.lock().state
    }

    fn resume(&self) -> EngineState {
        let mut inner = self.lock();
        inner.resume_attempts += 1;
        if inner.state == EngineState::Suspended && inner.resumable {
            inner.state = EngineState::Running;
        }
        inner.state
    }

    fn play(&self, buffer: PcmBuffer) -> Result<(), OutputError> {
        let mut inner = self.lock();
        match inner.state {
            EngineState::Running => {
                inner.played.push(buffer);
                Ok(())
            }
            _ => Err(OutputError::Unavailable),
        }
    }
}

/// Haptic output capturing every pattern.
#[derive(Debug, Default)]
pub struct CaptureHaptics {
    pulses: Mutex<Vec<Vec<u32>>>,
}

impl CaptureHaptics {
    pub fn pulses(&self) -> Vec<Vec<u32>> {
        self.pulses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HapticOutput for CaptureHaptics {
    fn vibrate(&self, durations: &[u32]) -> Result<(), OutputError> {
        self.pulses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(durations.to_vec());
        Ok(())
    }
}
