use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Where the raw session API document is served.
pub const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Swagger UI for the court-side session API, mounted at `/docs`.
pub fn router() -> Router<SharedState> {
    SwaggerUi::new("/docs")
        .url(OPENAPI_PATH, ApiDoc::openapi())
        .into()
}
