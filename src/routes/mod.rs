use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod public;
pub mod session;
pub mod sse;

/// Compose the session, public, SSE and documentation trees over the shared state.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(session::router())
        .merge(public::router())
        .merge(docs::router());

    api_router.with_state(state)
}
