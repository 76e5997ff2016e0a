use std::time::SystemTime;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::format_system_time, state::match_state::MatchResult};

/// Finished match as stored by the archive, stamped on receipt.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ArchivedMatch {
    pub id: Uuid,
    /// RFC 3339 wall-clock time at which the archive received the result.
    pub received_at: String,
    pub result: MatchResult,
}

impl ArchivedMatch {
    /// Assign a fresh identifier and stamp `received`.
    pub fn new(result: MatchResult, received: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            received_at: format_system_time(received),
            result,
        }
    }
}
