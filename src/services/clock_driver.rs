//! Background task turning shot clock deadlines into `poll_clock` calls.

use tokio::{task::JoinHandle, time::Instant};
use tracing::debug;

use crate::state::SharedState;

/// Spawn the driver. It sleeps until the next tick is due, or until a
/// command signals that the deadline may have moved.
pub fn spawn_clock_driver(state: SharedState) -> JoinHandle<()> {
    tokio::spawn(run_clock_driver(state))
}

async fn run_clock_driver(state: SharedState) {
    loop {
        let deadline = {
            let session = state.session().lock().await;
            session
                .next_deadline()
                .map(|at| Instant::from_std(session.clock().instant_at(at)))
        };

        let Some(deadline) = deadline else {
            state.clock_wake().notified().await;
            continue;
        };

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                let mut session = state.session().lock().await;
                let events = session.poll_clock();
                if !events.is_empty() {
                    debug!(remaining = session.seconds_remaining(), "shot clock advanced");
                }
            }
            _ = state.clock_wake().notified() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::AppConfig,
        feedback::{FeedbackEvent, RecordingFeedback},
        state::AppState,
    };

    #[tokio::test]
    async fn driver_ticks_a_running_clock() {
        let feedback = Arc::new(RecordingFeedback::new());
        let state = AppState::new(AppConfig::default(), feedback.clone());
        let driver = spawn_clock_driver(state.clone());

        state.session().lock().await.toggle_clock();
        state.wake_clock();

        tokio::time::sleep(Duration::from_millis(1_300)).await;
        let remaining = state.session().lock().await.seconds_remaining();
        assert!(remaining < 24, "remaining {remaining}");
        assert_eq!(feedback.count(FeedbackEvent::TimerStarted), 1);
        driver.abort();
    }
}
