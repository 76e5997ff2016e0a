//! Default sound device output through `rodio`.
//!
//! The device stream is not `Send`, so it lives on a dedicated thread that is
//! started by the first `resume` and receives rendered buffers over a channel.
//! Opening never blocks the caller: until the thread reports back, the
//! output stays suspended and cues are dropped.

use std::{
    sync::{
        Mutex, MutexGuard, PoisonError,
        mpsc::{self, TryRecvError},
    },
    thread,
};

use rodio::{OutputStream, buffer::SamplesBuffer};
use tracing::{info, warn};

use crate::feedback::{
    output::{AudioOutput, EngineState, OutputError},
    synth::PcmBuffer,
};

type Ready = mpsc::Receiver<Result<(), String>>;

enum Device {
    Suspended,
    Opening {
        ready: Ready,
        buffers: mpsc::Sender<PcmBuffer>,
    },
    Running(mpsc::Sender<PcmBuffer>),
    Unavailable,
}

impl Device {
    /// Promote an opening device once its thread has answered.
    fn settle(&mut self) {
        let Device::Opening { ready, buffers } = self else {
            return;
        };
        let next = match ready.try_recv() {
            Err(TryRecvError::Empty) => return,
            Ok(Ok(())) => {
                info!("audio device opened");
                Device::Running(buffers.clone())
            }
            Ok(Err(reason)) => {
                warn!(%reason, "audio device unavailable");
                Device::Unavailable
            }
            Err(TryRecvError::Disconnected) => {
                warn!("audio thread exited before opening the device");
                Device::Unavailable
            }
        };
        *self = next;
    }

    fn engine_state(&self) -> EngineState {
        match self {
            Device::Suspended | Device::Opening { .. } => EngineState::Suspended,
            Device::Running(_) => EngineState::Running,
            Device::Unavailable => EngineState::Unavailable,
        }
    }
}

/// Audio output playing on the host's default device.
pub struct SpeakerOutput {
    device: Mutex<Device>,
}

impl Default for SpeakerOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeakerOutput {
    /// Create a suspended output; the device is opened on first resume.
    pub fn new() -> Self {
        Self::with_device(Device::Suspended)
    }

    fn with_device(device: Device) -> Self {
        Self {
            device: Mutex::new(device),
        }
    }

    fn device(&self) -> MutexGuard<'_, Device> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn open_device() -> Result<Device, OutputError> {
    let (buffers_tx, buffers_rx) = mpsc::channel::<PcmBuffer>();
    let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

    thread::Builder::new()
        .name("courtside-audio".into())
        .spawn(move || {
            let (_stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(err) => {
                    let _ = ready_tx.send(Err(err.to_string()));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));

            while let Ok(buffer) = buffers_rx.recv() {
                let source = SamplesBuffer::new(1, buffer.sample_rate, buffer.samples.to_vec());
                if let Err(err) = handle.play_raw(source) {
                    warn!(%err, "audio playback failed");
                }
            }
        })
        .map_err(|err| OutputError::Device(err.to_string()))?;

    Ok(Device::Opening {
        ready: ready_rx,
        buffers: buffers_tx,
    })
}

impl AudioOutput for SpeakerOutput {
    fn state(&self) -> EngineState {
        let mut device = self.device();
        device.settle();
        device.engine_state()
    }

    fn resume(&self) -> EngineState {
        let mut device = self.device();
        if matches!(*device, Device::Suspended) {
            *device = open_device().unwrap_or_else(|err| {
                warn!(%err, "audio thread could not be started");
                Device::Unavailable
            });
        }
        device.settle();
        device.engine_state()
    }

    fn play(&self, buffer: PcmBuffer) -> Result<(), OutputError> {
        let mut device = self.device();
        device.settle();
        let Device::Running(sender) = &*device else {
            return Err(OutputError::Unavailable);
        };
        if sender.send(buffer).is_err() {
            *device = Device::Unavailable;
            return Err(OutputError::Device("audio thread stopped".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opening() -> (
        SpeakerOutput,
        mpsc::Sender<Result<(), String>>,
        mpsc::Receiver<PcmBuffer>,
    ) {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (buffers_tx, buffers_rx) = mpsc::channel();
        let output = SpeakerOutput::with_device(Device::Opening {
            ready: ready_rx,
            buffers: buffers_tx,
        });
        (output, ready_tx, buffers_rx)
    }

    #[test]
    fn opening_device_reports_suspended_without_blocking() {
        let (output, _ready, _buffers) = opening();
        assert_eq!(output.resume(), EngineState::Suspended);
        assert!(output.play(PcmBuffer::near_silent(8_000, 5)).is_err());
    }

    #[test]
    fn device_runs_once_the_thread_is_ready() {
        let (output, ready, buffers) = opening();
        ready.send(Ok(())).unwrap();

        assert_eq!(output.state(), EngineState::Running);
        output.play(PcmBuffer::near_silent(8_000, 5)).unwrap();
        assert!(buffers.try_recv().is_ok());
    }

    #[test]
    fn failed_open_marks_the_device_unavailable() {
        let (output, ready, _buffers) = opening();
        ready.send(Err("no device".into())).unwrap();
        assert_eq!(output.resume(), EngineState::Unavailable);

        let (output, ready, _buffers) = opening();
        drop(ready);
        assert_eq!(output.state(), EngineState::Unavailable);
    }
}
