use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    feedback::{FeedbackEvent, FeedbackPort, FeedbackProfile, HapticPattern, HapticPulse},
    state::{
        clock::Clock,
        match_state::{
            MatchEffect, MatchPhase, MatchResult, MatchRules, MatchStateMachine, Player,
            SaveRejected, Team, TeamId,
        },
        shot_clock::{ShotClock, ShotClockEvent, ShotClockState},
    },
};

/// Countdown beeps sound while the remaining time is at or below this.
pub const COUNTDOWN_WINDOW: u32 = 10;
const NOTICE_CAPACITY: usize = 32;

/// Settings supplied by the settings collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct MatchParameters {
    /// Default target score of a new match.
    pub win_threshold: u32,
    /// Shot clock duration in seconds.
    pub attack_seconds: u32,
    pub feedback: FeedbackProfile,
}

impl Default for MatchParameters {
    fn default() -> Self {
        Self {
            win_threshold: 15,
            attack_seconds: 24,
            feedback: FeedbackProfile::default(),
        }
    }
}

/// Line-up and score of one side as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TeamView {
    pub players: Vec<Option<Player>>,
    pub score: u32,
}

impl From<&Team> for TeamView {
    fn from(team: &Team) -> Self {
        Self {
            players: team.players.to_vec(),
            score: team.score,
        }
    }
}

/// Read model of the whole session, republished after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SessionView {
    pub team_a: TeamView,
    pub team_b: TeamView,
    pub serve: TeamId,
    pub won: bool,
    pub winner: Option<TeamId>,
    pub skunk: bool,
    pub effective_threshold: u32,
    pub extended: bool,
    pub can_undo: bool,
    pub clock: ShotClockState,
    /// Purely visual: the teams are displayed on swapped sides.
    pub sides_swapped: bool,
    pub parameters: MatchParameters,
}

/// Out-of-band notifications for the presentation layer and collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// A match was saved; the archive collaborator takes it from here.
    MatchFinished(MatchResult),
    ThresholdExtended { new_threshold: u32 },
    /// User-visible message for a refused command.
    Validation { message: String },
}

/// Single owner of the match, the shot clock and the feedback wiring.
///
/// Every command applies its effects in a fixed order (state change, clock
/// reset, feedback) before returning, then republishes the [`SessionView`].
pub struct SessionController<F, C> {
    machine: MatchStateMachine,
    shot_clock: ShotClock,
    parameters: MatchParameters,
    sides_swapped: bool,
    feedback: F,
    clock: C,
    view: watch::Sender<SessionView>,
    notices: broadcast::Sender<SessionNotice>,
}

impl<F: FeedbackPort, C: Clock> SessionController<F, C> {
    /// Build a session. `rules.win_threshold` is taken from `parameters`.
    pub fn new(parameters: MatchParameters, rules: MatchRules, feedback: F, clock: C) -> Self {
        let rules = MatchRules {
            win_threshold: parameters.win_threshold,
            ..rules
        };
        feedback.set_profile(parameters.feedback);

        let machine = MatchStateMachine::new(rules);
        let shot_clock = ShotClock::new(parameters.attack_seconds);
        let view = build_view(&machine, &shot_clock, &parameters, false);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        Self {
            machine,
            shot_clock,
            parameters,
            sides_swapped: false,
            feedback,
            clock,
            view: watch::Sender::new(view),
            notices,
        }
    }

    pub fn machine(&self) -> &MatchStateMachine {
        &self.machine
    }

    pub fn shot_clock(&self) -> &ShotClock {
        &self.shot_clock
    }

    pub fn parameters(&self) -> MatchParameters {
        self.parameters
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_won(&self) -> bool {
        self.machine.is_won()
    }

    pub fn can_undo(&self) -> bool {
        self.machine.can_undo()
    }

    pub fn serving(&self) -> TeamId {
        self.machine.serve()
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.shot_clock.seconds_remaining()
    }

    pub fn sides_swapped(&self) -> bool {
        self.sides_swapped
    }

    /// Logical time at which [`SessionController::poll_clock`] has work to do.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.shot_clock.next_deadline()
    }

    pub fn view(&self) -> SessionView {
        build_view(
            &self.machine,
            &self.shot_clock,
            &self.parameters,
            self.sides_swapped,
        )
    }

    /// Observe the session; the receiver always holds the latest view.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    pub fn increment(&mut self, team: TeamId) -> Vec<MatchEffect> {
        let effects = self.machine.increment(team, self.clock.now());
        self.dispatch(&effects);
        self.publish();
        effects
    }

    pub fn decrement(&mut self, team: TeamId) -> Vec<MatchEffect> {
        let effects = self.machine.decrement(team, self.clock.now());
        self.dispatch(&effects);
        self.publish();
        effects
    }

    pub fn set_score(&mut self, team: TeamId, score: u32) -> Vec<MatchEffect> {
        let effects = self.machine.set_score(team, score, self.clock.now());
        self.dispatch(&effects);
        self.publish();
        effects
    }

    pub fn assign_player(
        &mut self,
        team: TeamId,
        slot: usize,
        player: Option<Player>,
    ) -> Vec<MatchEffect> {
        let effects = self.machine.assign_player(team, slot, player);
        self.publish();
        effects
    }

    /// Swap the displayed sides. Scores and serve are untouched.
    pub fn switch_sides(&mut self) {
        self.sides_swapped = !self.sides_swapped;
        self.feedback.pulse(HapticPulse::TAP);
        self.publish();
    }

    pub fn toggle_serve(&mut self) -> Vec<MatchEffect> {
        let effects = self.machine.switch_serve();
        self.publish();
        effects
    }

    /// Start, pause or resume the shot clock. Ignored once the match is won.
    pub fn toggle_clock(&mut self) {
        if self.machine.is_won() {
            return;
        }

        let now = self.clock.now();
        if self.shot_clock.is_running() {
            self.shot_clock.pause();
        } else if self.shot_clock.is_paused() {
            self.shot_clock.resume(now);
        } else {
            self.shot_clock.start(self.parameters.attack_seconds, now);
            self.feedback.play(FeedbackEvent::TimerStarted);
        }
        debug!(clock = ?self.shot_clock.state(), "shot clock toggled");
        self.publish();
    }

    pub fn reset_clock(&mut self) {
        self.shot_clock.reset(self.parameters.attack_seconds);
        self.publish();
    }

    pub fn undo(&mut self) -> Vec<MatchEffect> {
        let effects = self.machine.undo();
        self.dispatch(&effects);
        self.publish();
        effects
    }

    pub fn reset_match(&mut self, full: bool) -> Vec<MatchEffect> {
        let effects = self.machine.reset_match(full);
        self.dispatch(&effects);
        self.publish();
        effects
    }

    /// Finalize a won match. A refusal is voiced and broadcast as a
    /// validation notice; the session is left untouched.
    pub fn save(&mut self) -> Result<MatchResult, SaveRejected> {
        match self.machine.finalize_and_save(self.clock.now()) {
            Ok(result) => {
                self.shot_clock.reset(self.parameters.attack_seconds);
                info!(
                    winner = %result.winner,
                    score_a = result.team_a.score,
                    score_b = result.team_b.score,
                    duration_minutes = result.duration_minutes,
                    "match saved"
                );
                self.notify(SessionNotice::MatchFinished(result.clone()));
                self.publish();
                Ok(result)
            }
            Err(rejection) => {
                info!(reason = %rejection, "save rejected");
                self.feedback.play(FeedbackEvent::Error);
                self.feedback.pulse(HapticPulse::REJECT);
                self.notify(SessionNotice::Validation {
                    message: rejection.to_string(),
                });
                Err(rejection)
            }
        }
    }

    /// Apply elapsed clock time: countdown beeps and the expiry cue.
    pub fn poll_clock(&mut self) -> Vec<ShotClockEvent> {
        let events = self.shot_clock.advance(self.clock.now());
        for event in &events {
            match *event {
                ShotClockEvent::Tick { remaining } => {
                    if remaining > 0 && remaining <= COUNTDOWN_WINDOW {
                        self.feedback.play(FeedbackEvent::CountdownBeep);
                    }
                }
                ShotClockEvent::Expired => {
                    info!("shot clock expired");
                    self.feedback.play(FeedbackEvent::TimerExpired);
                    self.feedback
                        .pulse(HapticPulse::Pattern(HapticPattern::TimerExpired));
                }
            }
        }

        if !events.is_empty() {
            self.publish();
        }
        events
    }

    /// Install new settings. The target of an unextended match in progress
    /// follows the new default; an idle clock is reloaded with the new
    /// duration, a running one keeps counting.
    pub fn update_parameters(&mut self, parameters: MatchParameters) -> Vec<MatchEffect> {
        self.parameters = parameters;
        self.feedback.set_profile(parameters.feedback);

        let rules = MatchRules {
            win_threshold: parameters.win_threshold,
            ..self.machine.rules()
        };
        let effects = self.machine.update_rules(rules);

        if !self.shot_clock.is_running() && !self.shot_clock.is_paused() {
            self.shot_clock.reset(parameters.attack_seconds);
        }

        info!(
            win_threshold = parameters.win_threshold,
            attack_seconds = parameters.attack_seconds,
            "match parameters updated"
        );
        self.dispatch(&effects);
        self.publish();
        effects
    }

    fn dispatch(&mut self, effects: &[MatchEffect]) {
        for effect in effects {
            match *effect {
                MatchEffect::ScoreChanged {
                    team,
                    score,
                    urgent,
                } => {
                    debug!(team = %team, score, urgent, "score changed");
                    self.shot_clock.reset(self.parameters.attack_seconds);
                    self.feedback.play(if urgent {
                        FeedbackEvent::PointEmergency
                    } else {
                        FeedbackEvent::Point
                    });
                    self.feedback.pulse(HapticPulse::TAP);
                }
                MatchEffect::Won {
                    winner,
                    skunk,
                    tight,
                } => {
                    info!(winner = %winner, skunk, "match won");
                    self.shot_clock.reset(self.parameters.attack_seconds);
                    self.feedback.play(if tight {
                        FeedbackEvent::WinEmergency
                    } else {
                        FeedbackEvent::Win
                    });
                    self.feedback
                        .pulse(HapticPulse::Pattern(HapticPattern::Victory));
                }
                MatchEffect::ThresholdExtended { new_threshold } => {
                    info!(new_threshold, "win threshold extended");
                    self.notify(SessionNotice::ThresholdExtended { new_threshold });
                }
                MatchEffect::Undone => {
                    debug!("score change undone");
                    self.feedback.play(FeedbackEvent::Error);
                }
                MatchEffect::Reset { full } => {
                    info!(full, "match reset");
                    self.shot_clock.reset(self.parameters.attack_seconds);
                    self.feedback.play(FeedbackEvent::Error);
                    self.feedback
                        .pulse(HapticPulse::Pattern(HapticPattern::Reset));
                }
                MatchEffect::ServeSwitched { .. } | MatchEffect::PlayerAssigned { .. } => {}
            }
        }
    }

    fn notify(&self, notice: SessionNotice) {
        // No subscriber is not an error.
        let _ = self.notices.send(notice);
    }

    fn publish(&self) {
        let view = self.view();
        self.view.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}

fn build_view(
    machine: &MatchStateMachine,
    shot_clock: &ShotClock,
    parameters: &MatchParameters,
    sides_swapped: bool,
) -> SessionView {
    let (winner, skunk) = match machine.phase() {
        MatchPhase::Won { winner, skunk } => (Some(winner), skunk),
        MatchPhase::InProgress => (None, false),
    };

    SessionView {
        team_a: machine.team(TeamId::A).into(),
        team_b: machine.team(TeamId::B).into(),
        serve: machine.serve(),
        won: machine.is_won(),
        winner,
        skunk,
        effective_threshold: machine.effective_threshold(),
        extended: machine.is_extended(),
        can_undo: machine.can_undo(),
        clock: shot_clock.state(),
        sides_swapped,
        parameters: *parameters,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        feedback::{RecordedFeedback, RecordingFeedback},
        state::clock::ManualClock,
    };

    type TestSession = SessionController<Arc<RecordingFeedback>, ManualClock>;

    fn session() -> (TestSession, Arc<RecordingFeedback>, ManualClock) {
        let feedback = Arc::new(RecordingFeedback::new());
        let clock = ManualClock::new();
        let session = SessionController::new(
            MatchParameters::default(),
            MatchRules::default(),
            feedback.clone(),
            clock.clone(),
        );
        (session, feedback, clock)
    }

    fn player(id: &str) -> Option<Player> {
        Some(Player {
            id: id.into(),
            name: id.to_uppercase(),
        })
    }

    fn fill_slots(session: &mut TestSession) {
        session.assign_player(TeamId::A, 0, player("ana"));
        session.assign_player(TeamId::A, 1, player("bia"));
        session.assign_player(TeamId::B, 0, player("caio"));
        session.assign_player(TeamId::B, 1, player("davi"));
    }

    #[test]
    fn point_resets_a_running_clock_and_taps() {
        let (mut session, feedback, clock) = session();
        session.toggle_clock();
        clock.advance(Duration::from_secs(5));
        session.poll_clock();
        assert_eq!(session.seconds_remaining(), 19);

        feedback.take();
        session.increment(TeamId::B);

        assert_eq!(session.seconds_remaining(), 24);
        assert!(!session.shot_clock().is_running());
        assert_eq!(
            feedback.entries(),
            vec![
                RecordedFeedback::Sound(FeedbackEvent::Point),
                RecordedFeedback::Haptic(HapticPulse::TAP),
            ]
        );
        assert_eq!(session.serving(), TeamId::B);
    }

    #[test]
    fn point_within_one_of_target_is_urgent() {
        let (mut session, feedback, _) = session();
        session.set_score(TeamId::A, 13);
        feedback.take();
        session.increment(TeamId::A);
        assert_eq!(feedback.sounds(), vec![FeedbackEvent::PointEmergency]);
    }

    #[test]
    fn one_point_win_uses_the_emergency_fanfare() {
        let (mut session, feedback, _) = session();
        session.set_score(TeamId::B, 14);
        session.set_score(TeamId::A, 13);
        feedback.take();
        session.set_score(TeamId::A, 15);

        assert!(session.is_won());
        assert_eq!(
            feedback.entries(),
            vec![
                RecordedFeedback::Sound(FeedbackEvent::PointEmergency),
                RecordedFeedback::Haptic(HapticPulse::TAP),
                RecordedFeedback::Sound(FeedbackEvent::WinEmergency),
                RecordedFeedback::Haptic(HapticPulse::Pattern(HapticPattern::Victory)),
            ]
        );
    }

    #[test]
    fn extension_is_broadcast_once() {
        let (mut session, _, _) = session();
        let mut notices = session.notices();
        session.set_score(TeamId::A, 14);
        session.set_score(TeamId::B, 14);

        assert_eq!(
            notices.try_recv().ok(),
            Some(SessionNotice::ThresholdExtended { new_threshold: 17 })
        );
        session.increment(TeamId::A);
        session.increment(TeamId::B);
        assert!(notices.try_recv().is_err());
        assert!(!session.is_won());
    }

    #[test]
    fn countdown_beeps_only_in_the_final_seconds() {
        let (mut session, feedback, clock) = session();
        session.toggle_clock();
        assert_eq!(feedback.sounds(), vec![FeedbackEvent::TimerStarted]);
        feedback.take();

        clock.advance(Duration::from_secs(13));
        session.poll_clock();
        assert_eq!(session.seconds_remaining(), 11);
        assert!(feedback.sounds().is_empty());

        clock.advance(Duration::from_secs(1));
        session.poll_clock();
        assert_eq!(feedback.sounds(), vec![FeedbackEvent::CountdownBeep]);
    }

    #[test]
    fn expiry_fires_cue_and_pattern_once() {
        let (mut session, feedback, clock) = session();
        session.toggle_clock();
        feedback.take();

        clock.advance(Duration::from_secs(30));
        let events = session.poll_clock();
        assert_eq!(events.last(), Some(&ShotClockEvent::Expired));
        assert_eq!(feedback.count(FeedbackEvent::CountdownBeep), 10);
        assert_eq!(feedback.count(FeedbackEvent::TimerExpired), 1);
        assert_eq!(
            feedback.pulses(),
            vec![HapticPulse::Pattern(HapticPattern::TimerExpired)]
        );

        clock.advance(Duration::from_secs(5));
        assert!(session.poll_clock().is_empty());
        assert!(session.next_deadline().is_none());
    }

    #[test]
    fn toggle_cycles_start_pause_resume() {
        let (mut session, feedback, clock) = session();
        session.toggle_clock();
        assert!(session.shot_clock().is_running());

        session.toggle_clock();
        assert!(session.shot_clock().is_paused());
        assert!(session.next_deadline().is_none());

        clock.advance(Duration::from_secs(3));
        session.toggle_clock();
        assert!(session.shot_clock().is_running());
        assert_eq!(session.next_deadline(), Some(Duration::from_secs(4)));
        assert_eq!(feedback.count(FeedbackEvent::TimerStarted), 1);
    }

    #[test]
    fn clock_cannot_start_after_a_win() {
        let (mut session, _, _) = session();
        session.set_score(TeamId::A, 15);
        session.toggle_clock();
        assert!(!session.shot_clock().is_running());
    }

    #[test]
    fn undo_plays_the_error_cue() {
        let (mut session, feedback, _) = session();
        session.increment(TeamId::A);
        feedback.take();
        session.undo();
        assert_eq!(feedback.sounds(), vec![FeedbackEvent::Error]);
        assert!(!session.can_undo());
    }

    #[test]
    fn reset_plays_error_and_reset_pattern() {
        let (mut session, feedback, _) = session();
        session.increment(TeamId::A);
        feedback.take();
        session.reset_match(false);
        assert_eq!(
            feedback.entries(),
            vec![
                RecordedFeedback::Sound(FeedbackEvent::Error),
                RecordedFeedback::Haptic(HapticPulse::Pattern(HapticPattern::Reset)),
            ]
        );
    }

    #[test]
    fn rejected_save_is_voiced_and_leaves_state_alone() {
        let (mut session, feedback, _) = session();
        let mut notices = session.notices();
        session.set_score(TeamId::A, 15);
        feedback.take();

        assert_eq!(session.save(), Err(SaveRejected::MissingPlayers));
        assert!(session.is_won());
        assert_eq!(
            feedback.entries(),
            vec![
                RecordedFeedback::Sound(FeedbackEvent::Error),
                RecordedFeedback::Haptic(HapticPulse::REJECT),
            ]
        );
        assert!(matches!(
            notices.try_recv(),
            Ok(SessionNotice::Validation { .. })
        ));
    }

    #[test]
    fn successful_save_emits_result_and_starts_over() {
        let (mut session, _, clock) = session();
        let mut notices = session.notices();
        fill_slots(&mut session);
        session.increment(TeamId::B);
        clock.advance(Duration::from_secs(600));
        session.set_score(TeamId::B, 15);

        let result = session.save().unwrap();
        assert_eq!(result.winner, TeamId::B);
        assert_eq!(result.duration_minutes, 10);
        assert_eq!(
            notices.try_recv().ok(),
            Some(SessionNotice::MatchFinished(result))
        );

        let view = session.view();
        assert_eq!(view.team_a.score, 0);
        assert_eq!(view.team_a.players, vec![None, None]);
        assert!(!view.won);
    }

    #[test]
    fn switching_sides_is_visual_only() {
        let (mut session, feedback, _) = session();
        session.increment(TeamId::A);
        feedback.take();
        session.switch_sides();

        let view = session.view();
        assert!(view.sides_swapped);
        assert_eq!(view.team_a.score, 1);
        assert_eq!(view.serve, TeamId::A);
        assert_eq!(feedback.pulses(), vec![HapticPulse::TAP]);
    }

    #[test]
    fn parameters_update_profile_and_idle_clock() {
        let (mut session, feedback, _) = session();
        let parameters = MatchParameters {
            win_threshold: 21,
            attack_seconds: 30,
            feedback: FeedbackProfile {
                audio_enabled: false,
                ..FeedbackProfile::default()
            },
        };
        session.update_parameters(parameters);

        assert_eq!(feedback.profile(), parameters.feedback);
        assert_eq!(session.seconds_remaining(), 30);
        assert_eq!(session.machine().effective_threshold(), 21);
    }

    #[test]
    fn extended_threshold_survives_a_parameter_update() {
        let (mut session, _, _) = session();
        session.set_score(TeamId::A, 14);
        session.set_score(TeamId::B, 14);
        session.update_parameters(MatchParameters {
            win_threshold: 11,
            ..MatchParameters::default()
        });
        assert_eq!(session.machine().effective_threshold(), 17);
    }

    #[test]
    fn watchers_see_changes_but_not_no_ops() {
        let (mut session, _, _) = session();
        let mut view = session.subscribe();

        session.decrement(TeamId::A);
        assert!(!view.has_changed().unwrap());

        session.increment(TeamId::A);
        assert!(view.has_changed().unwrap());
        assert_eq!(view.borrow_and_update().team_a.score, 1);
    }
}
