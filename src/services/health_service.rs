use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload plus a few liveness counters.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let archived = state.archive().len().await;
    debug!(
        archived,
        subscribers = state.public_sse().subscribers(),
        "healthcheck"
    );
    HealthResponse::ok(archived)
}
