mod archive;
pub mod clock;
pub mod match_state;
pub mod session;
pub mod shot_clock;
mod sse;

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, Notify};

use crate::{
    config::AppConfig,
    feedback::FeedbackPort,
    state::{clock::MonotonicClock, match_state::Player, session::SessionController},
};

pub use self::archive::MatchArchive;
pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;
/// The session as hosted by the server: type-erased feedback on wall time.
pub type HostedSession = SessionController<Arc<dyn FeedbackPort>, MonotonicClock>;

const SSE_CAPACITY: usize = 32;

/// Central application state: the single court-side session and its collaborators.
pub struct AppState {
    session: Mutex<HostedSession>,
    clock_wake: Notify,
    sse: SseHub,
    roster: IndexMap<String, Player>,
    archive: MatchArchive,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, feedback: Arc<dyn FeedbackPort>) -> SharedState {
        let session = SessionController::new(
            config.parameters,
            config.rules,
            feedback,
            MonotonicClock::new(),
        );
        let roster = config
            .roster
            .into_iter()
            .map(|player| (player.id.clone(), player))
            .collect();

        Arc::new(Self {
            session: Mutex::new(session),
            clock_wake: Notify::new(),
            sse: SseHub::new(SSE_CAPACITY),
            roster,
            archive: MatchArchive::new(),
        })
    }

    /// The session. Commands and clock ticks hold the lock for their whole body.
    pub fn session(&self) -> &Mutex<HostedSession> {
        &self.session
    }

    /// Tell the clock driver that the next deadline may have moved.
    pub fn wake_clock(&self) {
        self.clock_wake.notify_one();
    }

    pub fn clock_wake(&self) -> &Notify {
        &self.clock_wake
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Players selectable for the team slots, keyed by id in roster order.
    pub fn roster(&self) -> &IndexMap<String, Player> {
        &self.roster
    }

    pub fn archive(&self) -> &MatchArchive {
        &self.archive
    }
}
