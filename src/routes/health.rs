use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::health::HealthResponse, services::health_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
/// Liveness plus the number of matches archived since startup.
pub async fn healthcheck(State(state): State<SharedState>) -> Json<HealthResponse> {
    let status = health_service::health_status(&state).await;
    Json(status)
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/healthcheck", get(healthcheck))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, feedback::RecordingFeedback, state::AppState};

    #[tokio::test]
    async fn healthcheck_reports_the_archive_size() {
        let state = AppState::new(AppConfig::default(), Arc::new(RecordingFeedback::new()));
        let Json(body) = healthcheck(State(state)).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.archived_matches, 0);
    }
}
