use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::matches::ArchivedMatch,
    services::public_service,
    state::{SharedState, match_state::Player},
};

/// Read-only collaborator data.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/roster", get(list_roster))
        .route("/matches", get(list_matches))
}

/// Players selectable for the team slots.
#[utoipa::path(
    get,
    path = "/roster",
    tag = "public",
    responses((status = 200, description = "Roster in display order", body = [Player]))
)]
pub async fn list_roster(State(state): State<SharedState>) -> Json<Vec<Player>> {
    Json(public_service::list_players(&state))
}

/// Matches received by the archive since startup.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "public",
    responses((status = 200, description = "Archived matches, oldest first", body = [ArchivedMatch]))
)]
pub async fn list_matches(State(state): State<SharedState>) -> Json<Vec<ArchivedMatch>> {
    Json(public_service::list_matches(&state).await)
}
