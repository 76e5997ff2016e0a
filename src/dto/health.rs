use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status; "ok" while the process serves requests.
    pub status: String,
    /// Completed matches received by the archive since startup.
    pub archived_matches: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(archived_matches: usize) -> Self {
        Self {
            status: "ok".to_string(),
            archived_matches,
        }
    }
}
