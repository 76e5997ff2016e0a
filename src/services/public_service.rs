//! Read-only views over the collaborators: the roster and the match archive.

use crate::{
    dto::matches::ArchivedMatch,
    state::{SharedState, match_state::Player},
};

/// Selectable players in roster order.
pub fn list_players(state: &SharedState) -> Vec<Player> {
    state.roster().values().cloned().collect()
}

/// Finished matches, oldest first.
pub async fn list_matches(state: &SharedState) -> Vec<ArchivedMatch> {
    state.archive().list().await
}
