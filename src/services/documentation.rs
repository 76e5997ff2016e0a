use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the court-side session server.
#[openapi(
    info(
        title = "Courtside session API",
        description = "Court-side scorekeeping: score, serve, shot clock and match archive"
    ),
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::session_stream,
        crate::routes::session::get_session,
        crate::routes::session::update_score,
        crate::routes::session::assign_player,
        crate::routes::session::toggle_serve,
        crate::routes::session::switch_sides,
        crate::routes::session::toggle_clock,
        crate::routes::session::reset_clock,
        crate::routes::session::undo,
        crate::routes::session::reset,
        crate::routes::session::save,
        crate::routes::session::update_parameters,
        crate::routes::public::list_roster,
        crate::routes::public::list_matches,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::matches::ArchivedMatch,
            crate::dto::session::ScoreAction,
            crate::dto::session::ScoreRequest,
            crate::dto::session::AssignPlayerRequest,
            crate::dto::session::ResetRequest,
            crate::dto::session::UpdateParametersRequest,
            crate::dto::sse::ThresholdExtendedEvent,
            crate::dto::sse::ValidationEvent,
            crate::feedback::FeedbackProfile,
            crate::feedback::SoundScheme,
            crate::state::match_state::MatchResult,
            crate::state::match_state::MatchRules,
            crate::state::match_state::Player,
            crate::state::match_state::TeamId,
            crate::state::match_state::TeamResult,
            crate::state::session::MatchParameters,
            crate::state::session::SessionView,
            crate::state::session::TeamView,
            crate::state::shot_clock::ShotClockState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "session", description = "Court-side match session commands"),
        (name = "public", description = "Roster and finished matches"),
    )
)]
pub struct ApiDoc;
