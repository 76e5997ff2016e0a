//! Business logic behind the session REST routes. Every command runs under the
//! session lock as one synchronous step and wakes the clock driver afterwards.

use tracing::{debug, info};
use validator::Validate;

use crate::{
    dto::{
        matches::ArchivedMatch,
        session::{
            AssignPlayerRequest, ResetRequest, ScoreAction, ScoreRequest, UpdateParametersRequest,
        },
    },
    error::ServiceError,
    services::session_events,
    state::{
        HostedSession, SharedState,
        match_state::TeamId,
        session::{MatchParameters, SessionView},
    },
};

async fn command<T>(
    state: &SharedState,
    work: impl FnOnce(&mut HostedSession) -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    let output = {
        let mut session = state.session().lock().await;
        work(&mut session)?
    };
    state.wake_clock();
    Ok(output)
}

fn ensure_in_progress(session: &HostedSession) -> Result<(), ServiceError> {
    if session.is_won() {
        return Err(ServiceError::InvalidState(
            "match already decided; undo, reset or save it first".into(),
        ));
    }
    Ok(())
}

/// Snapshot of the whole session.
pub async fn current_view(state: &SharedState) -> SessionView {
    state.session().lock().await.view()
}

/// Step or set a team's score.
pub async fn update_score(
    state: &SharedState,
    request: ScoreRequest,
) -> Result<SessionView, ServiceError> {
    request.validate()?;

    command(state, |session| {
        ensure_in_progress(session)?;
        let team = request.team;
        match (request.action, request.score) {
            (Some(ScoreAction::Increment), _) => session.increment(team),
            (Some(ScoreAction::Decrement), _) => session.decrement(team),
            (None, Some(score)) => session.set_score(team, score),
            (None, None) => {
                return Err(ServiceError::InvalidInput(
                    "missing score command".into(),
                ));
            }
        };
        Ok(session.view())
    })
    .await
}

/// Fill or clear a player slot from the roster.
pub async fn assign_player(
    state: &SharedState,
    request: AssignPlayerRequest,
) -> Result<SessionView, ServiceError> {
    request.validate()?;

    let player = match &request.player_id {
        Some(id) => Some(
            state
                .roster()
                .get(id)
                .cloned()
                .ok_or_else(|| ServiceError::NotFound(format!("player `{id}` not found")))?,
        ),
        None => None,
    };

    command(state, |session| {
        if let Some(player) = &player {
            for team in [TeamId::A, TeamId::B] {
                let slots = session.machine().team(team).players.iter().enumerate();
                for (slot, seated) in slots {
                    let occupied = seated.as_ref().is_some_and(|p| p.id == player.id);
                    if occupied && (team, slot) != (request.team, request.slot) {
                        return Err(ServiceError::InvalidState(format!(
                            "player `{}` already plays for team {team}",
                            player.id
                        )));
                    }
                }
            }
        }

        debug!(team = %request.team, slot = request.slot, player = ?request.player_id, "assigning slot");
        session.assign_player(request.team, request.slot, player);
        Ok(session.view())
    })
    .await
}

/// Hand the serve to the other team.
pub async fn toggle_serve(state: &SharedState) -> Result<SessionView, ServiceError> {
    command(state, |session| {
        session.toggle_serve();
        Ok(session.view())
    })
    .await
}

/// Swap the displayed sides.
pub async fn switch_sides(state: &SharedState) -> Result<SessionView, ServiceError> {
    command(state, |session| {
        session.switch_sides();
        Ok(session.view())
    })
    .await
}

/// Start, pause or resume the shot clock.
pub async fn toggle_clock(state: &SharedState) -> Result<SessionView, ServiceError> {
    command(state, |session| {
        ensure_in_progress(session)?;
        session.toggle_clock();
        Ok(session.view())
    })
    .await
}

/// Reload the shot clock and leave it idle.
pub async fn reset_clock(state: &SharedState) -> Result<SessionView, ServiceError> {
    command(state, |session| {
        session.reset_clock();
        Ok(session.view())
    })
    .await
}

/// Revert the latest score change. Empty history is a silent no-op.
pub async fn undo(state: &SharedState) -> Result<SessionView, ServiceError> {
    command(state, |session| {
        session.undo();
        Ok(session.view())
    })
    .await
}

/// Start a new match, optionally clearing the line-ups.
pub async fn reset(state: &SharedState, request: ResetRequest) -> Result<SessionView, ServiceError> {
    command(state, |session| {
        session.reset_match(request.full);
        Ok(session.view())
    })
    .await
}

/// Finalize the won match and hand it to the archive.
pub async fn save(state: &SharedState) -> Result<ArchivedMatch, ServiceError> {
    let result = command(state, |session| session.save().map_err(ServiceError::from)).await?;

    let entry = state.archive().record(result).await;
    info!(id = %entry.id, "match archived");
    session_events::broadcast_match_finished(state, &entry);
    Ok(entry)
}

/// Install validated match parameters.
pub async fn update_parameters(
    state: &SharedState,
    request: UpdateParametersRequest,
) -> Result<SessionView, ServiceError> {
    request.validate()?;
    let parameters = MatchParameters::from(request);

    command(state, |session| {
        session.update_parameters(parameters);
        Ok(session.view())
    })
    .await
}
