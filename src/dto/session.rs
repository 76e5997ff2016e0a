use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    feedback::FeedbackProfile,
    state::{
        match_state::{MAX_SCORE, TeamId},
        session::MatchParameters,
    },
};

/// One-point step applied to a team's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScoreAction {
    Increment,
    Decrement,
}

/// Score change for one team: either a step (`action`) or an explicit `score`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScoreRequest {
    pub team: TeamId,
    #[serde(default)]
    pub action: Option<ScoreAction>,
    #[serde(default)]
    pub score: Option<u32>,
}

impl Validate for ScoreRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.action.is_some() == self.score.is_some() {
            let mut err = ValidationError::new("score_command");
            err.message = Some("Provide exactly one of `action` or `score`".into());
            errors.add("action", err);
        }

        if self.score.is_some_and(|score| score > MAX_SCORE) {
            let mut err = ValidationError::new("range");
            err.message = Some(format!("Score must be at most {MAX_SCORE}").into());
            errors.add("score", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Fill (`player_id`) or clear (`null`) one player slot.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AssignPlayerRequest {
    pub team: TeamId,
    /// Slot index, 0 or 1.
    #[validate(range(max = 1))]
    pub slot: usize,
    #[serde(default)]
    pub player_id: Option<String>,
}

/// Start a new match; `full` also clears the line-ups.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ResetRequest {
    #[serde(default)]
    pub full: bool,
}

/// New match parameters pushed by the settings screen.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateParametersRequest {
    #[validate(range(min = 1, max = 99))]
    pub win_threshold: u32,
    #[validate(range(min = 5, max = 600))]
    pub attack_seconds: u32,
    #[serde(default)]
    pub feedback: FeedbackProfile,
}

impl From<UpdateParametersRequest> for MatchParameters {
    fn from(value: UpdateParametersRequest) -> Self {
        Self {
            win_threshold: value.win_threshold,
            attack_seconds: value.attack_seconds,
            feedback: value.feedback,
        }
    }
}
