use std::time::SystemTime;

use tokio::sync::RwLock;

use crate::{dto::matches::ArchivedMatch, state::match_state::MatchResult};

/// In-memory stand-in for the persistence collaborator: keeps every finished
/// match for the lifetime of the process, newest last.
#[derive(Default)]
pub struct MatchArchive {
    matches: RwLock<Vec<ArchivedMatch>>,
}

impl MatchArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp and store a result, returning the stored entry.
    pub async fn record(&self, result: MatchResult) -> ArchivedMatch {
        let entry = ArchivedMatch::new(result, SystemTime::now());
        self.matches.write().await.push(entry.clone());
        entry
    }

    pub async fn list(&self) -> Vec<ArchivedMatch> {
        self.matches.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.matches.read().await.len()
    }
}
