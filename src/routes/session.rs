use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};

use crate::{
    dto::{
        matches::ArchivedMatch,
        session::{AssignPlayerRequest, ResetRequest, ScoreRequest, UpdateParametersRequest},
    },
    error::AppError,
    services::session_service,
    state::{SharedState, session::SessionView},
};

/// Court-side command surface of the running session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/score", post(update_score))
        .route("/session/players", post(assign_player))
        .route("/session/serve/toggle", post(toggle_serve))
        .route("/session/sides/switch", post(switch_sides))
        .route("/session/clock/toggle", post(toggle_clock))
        .route("/session/clock/reset", post(reset_clock))
        .route("/session/undo", post(undo))
        .route("/session/reset", post(reset))
        .route("/session/save", post(save))
        .route("/session/parameters", put(update_parameters))
}

/// Current state of the session.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses((status = 200, description = "Session snapshot", body = SessionView))
)]
pub async fn get_session(State(state): State<SharedState>) -> Json<SessionView> {
    Json(session_service::current_view(&state).await)
}

/// Step or set a team's score.
#[utoipa::path(
    post,
    path = "/session/score",
    tag = "session",
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Score updated", body = SessionView),
        (status = 409, description = "Match already decided"),
        (status = 422, description = "Malformed score command")
    )
)]
pub async fn update_score(
    State(state): State<SharedState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::update_score(&state, request).await?))
}

/// Fill or clear a player slot.
#[utoipa::path(
    post,
    path = "/session/players",
    tag = "session",
    request_body = AssignPlayerRequest,
    responses(
        (status = 200, description = "Slot updated", body = SessionView),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "Player already on court"),
        (status = 422, description = "Invalid slot")
    )
)]
pub async fn assign_player(
    State(state): State<SharedState>,
    Json(request): Json<AssignPlayerRequest>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::assign_player(&state, request).await?))
}

/// Hand the serve to the other team.
#[utoipa::path(
    post,
    path = "/session/serve/toggle",
    tag = "session",
    responses((status = 200, description = "Serve toggled", body = SessionView))
)]
pub async fn toggle_serve(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::toggle_serve(&state).await?))
}

/// Swap the displayed sides.
#[utoipa::path(
    post,
    path = "/session/sides/switch",
    tag = "session",
    responses((status = 200, description = "Sides swapped", body = SessionView))
)]
pub async fn switch_sides(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::switch_sides(&state).await?))
}

/// Start, pause or resume the shot clock.
#[utoipa::path(
    post,
    path = "/session/clock/toggle",
    tag = "session",
    responses(
        (status = 200, description = "Clock toggled", body = SessionView),
        (status = 409, description = "Match already decided")
    )
)]
pub async fn toggle_clock(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::toggle_clock(&state).await?))
}

/// Reload the shot clock.
#[utoipa::path(
    post,
    path = "/session/clock/reset",
    tag = "session",
    responses((status = 200, description = "Clock reset", body = SessionView))
)]
pub async fn reset_clock(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::reset_clock(&state).await?))
}

/// Revert the latest score change.
#[utoipa::path(
    post,
    path = "/session/undo",
    tag = "session",
    responses((status = 200, description = "Latest change reverted, if any", body = SessionView))
)]
pub async fn undo(State(state): State<SharedState>) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::undo(&state).await?))
}

/// Start a new match.
#[utoipa::path(
    post,
    path = "/session/reset",
    tag = "session",
    request_body = ResetRequest,
    responses((status = 200, description = "Match reset", body = SessionView))
)]
pub async fn reset(
    State(state): State<SharedState>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session_service::reset(&state, request).await?))
}

/// Finalize the won match and archive it.
#[utoipa::path(
    post,
    path = "/session/save",
    tag = "session",
    responses(
        (status = 200, description = "Match archived", body = ArchivedMatch),
        (status = 422, description = "Match unfinished or line-up incomplete")
    )
)]
pub async fn save(State(state): State<SharedState>) -> Result<Json<ArchivedMatch>, AppError> {
    Ok(Json(session_service::save(&state).await?))
}

/// Replace the match parameters.
#[utoipa::path(
    put,
    path = "/session/parameters",
    tag = "session",
    request_body = UpdateParametersRequest,
    responses(
        (status = 200, description = "Parameters applied", body = SessionView),
        (status = 422, description = "Parameters out of range")
    )
)]
pub async fn update_parameters(
    State(state): State<SharedState>,
    Json(request): Json<UpdateParametersRequest>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(
        session_service::update_parameters(&state, request).await?,
    ))
}
