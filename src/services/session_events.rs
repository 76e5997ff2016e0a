use serde::Serialize;
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        watch,
    },
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{
    dto::{
        matches::ArchivedMatch,
        sse::{ServerEvent, ThresholdExtendedEvent, ValidationEvent},
    },
    state::{
        SharedState,
        session::{SessionNotice, SessionView},
    },
};

const EVENT_SESSION_UPDATED: &str = "session.updated";
const EVENT_MATCH_FINISHED: &str = "match.finished";
const EVENT_THRESHOLD_EXTENDED: &str = "threshold.extended";
const EVENT_VALIDATION: &str = "validation";

/// Broadcast the latest session view.
pub fn broadcast_session_updated(state: &SharedState, view: &SessionView) {
    send_public_event(state, EVENT_SESSION_UPDATED, view);
}

/// Broadcast a match that the archive just received.
pub fn broadcast_match_finished(state: &SharedState, entry: &ArchivedMatch) {
    send_public_event(state, EVENT_MATCH_FINISHED, entry);
}

/// Broadcast the raised target after a tie-extension.
pub fn broadcast_threshold_extended(state: &SharedState, new_threshold: u32) {
    let payload = ThresholdExtendedEvent { new_threshold };
    send_public_event(state, EVENT_THRESHOLD_EXTENDED, &payload);
}

/// Broadcast a user-facing refusal message.
pub fn broadcast_validation(state: &SharedState, message: &str) {
    let payload = ValidationEvent {
        message: message.to_string(),
    };
    send_public_event(state, EVENT_VALIDATION, &payload);
}

/// Serialise a session view as the event a new subscriber starts from.
pub fn session_snapshot_event(view: &SessionView) -> Option<ServerEvent> {
    match ServerEvent::json(Some(EVENT_SESSION_UPDATED.to_string()), view) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize session snapshot");
            None
        }
    }
}

/// Translate one session notice into its SSE event.
pub fn relay_notice(state: &SharedState, notice: SessionNotice) {
    match notice {
        SessionNotice::ThresholdExtended { new_threshold } => {
            broadcast_threshold_extended(state, new_threshold)
        }
        SessionNotice::Validation { message } => broadcast_validation(state, &message),
        // Broadcast by the save service once the archive has stamped it.
        SessionNotice::MatchFinished(_) => debug!("match finished notice relayed by save"),
    }
}

/// Forward session views and notices to the public SSE hub until the
/// session goes away.
pub async fn spawn_session_relay(state: SharedState) -> JoinHandle<()> {
    let (views, notices) = {
        let session = state.session().lock().await;
        (session.subscribe(), session.notices())
    };
    tokio::spawn(run_session_relay(state, views, notices))
}

async fn run_session_relay(
    state: SharedState,
    mut views: watch::Receiver<SessionView>,
    mut notices: broadcast::Receiver<SessionNotice>,
) {
    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                broadcast_session_updated(&state, &view);
            }
            notice = notices.recv() => match notice {
                Ok(notice) => relay_notice(&state, notice),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session relay lagged behind notices");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    debug!("session relay stopped");
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
