use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    services::{session_events, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse",
    tag = "sse",
    responses((status = 200, description = "Live session stream", content_type = "text/event-stream", body = String))
)]
/// Stream session updates, starting with the current snapshot.
pub async fn session_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_public(&state);
    let snapshot = {
        let session = state.session().lock().await;
        session_events::session_snapshot_event(&session.view())
    };
    info!("New session SSE connection");
    sse_service::to_sse_stream(receiver, snapshot)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse", get(session_stream))
}
