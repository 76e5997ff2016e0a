use std::{collections::VecDeque, fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Number of undo steps retained; older snapshots are evicted silently.
pub const HISTORY_CAPACITY: usize = 10;
/// Player slots per team.
pub const SLOTS_PER_TEAM: usize = 2;
/// Highest score a team can hold; larger values are refused.
pub const MAX_SCORE: u32 = 999;

/// Identifies one of the two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TeamId {
    A,
    B,
}

impl TeamId {
    /// The opposing team.
    pub fn other(self) -> Self {
        match self {
            TeamId::A => TeamId::B,
            TeamId::B => TeamId::A,
        }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamId::A => f.write_str("A"),
            TeamId::B => f.write_str("B"),
        }
    }
}

/// Selectable athlete supplied by the roster collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Player {
    pub id: String,
    pub name: String,
}

/// Two player slots and the running score of one side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Team {
    pub players: [Option<Player>; SLOTS_PER_TEAM],
    pub score: u32,
}

impl Team {
    /// True when every slot holds a player.
    pub fn is_complete(&self) -> bool {
        self.players.iter().all(Option::is_some)
    }
}

/// Scoring rules of a match. The extension increment and skunk bound are
/// plain settings rather than fixed constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct MatchRules {
    /// Configured target score.
    pub win_threshold: u32,
    /// Raise the target once when both teams sit one point from it.
    pub extension_enabled: bool,
    /// Points added to the target by the extension.
    pub extension_increment: u32,
    /// A win is flagged as a skunk when the loser's score is at or below this.
    pub skunk_bound: u32,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            win_threshold: 15,
            extension_enabled: true,
            extension_increment: 2,
            skunk_bound: 0,
        }
    }
}

/// Lifecycle of a single match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    InProgress,
    Won { winner: TeamId, skunk: bool },
}

/// Side effects raised by a transition, interpreted by the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEffect {
    /// A score changed; `urgent` when the new score is within one of the target.
    ScoreChanged { team: TeamId, score: u32, urgent: bool },
    /// The match was decided. `tight` marks a one-point margin.
    Won {
        winner: TeamId,
        skunk: bool,
        tight: bool,
    },
    /// Both teams tied one point from the target; the target was raised.
    ThresholdExtended { new_threshold: u32 },
    /// The most recent score change was reverted.
    Undone,
    ServeSwitched { serving: TeamId },
    PlayerAssigned { team: TeamId, slot: usize },
    Reset { full: bool },
}

/// Why a save request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SaveRejected {
    #[error("the match must be finished before it can be saved")]
    NotFinished,
    #[error("all four player slots must be filled before saving")]
    MissingPlayers,
}

/// Final line-up and score of one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TeamResult {
    pub players: Vec<Player>,
    pub score: u32,
}

/// Outcome handed to the persistence collaborator after a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MatchResult {
    pub team_a: TeamResult,
    pub team_b: TeamResult,
    pub winner: TeamId,
    /// Minutes between the first scoring event and the save.
    pub duration_minutes: u32,
    pub skunk: bool,
    pub effective_threshold: u32,
}

#[derive(Debug, Clone)]
struct HistorySnapshot {
    team_a: Team,
    team_b: Team,
    serve: TeamId,
    threshold: u32,
    extended: bool,
}

/// Score, serve and win bookkeeping for one match.
///
/// Every mutating operation returns the [`MatchEffect`]s it produced and
/// performs no I/O. Illegal transitions return an empty list.
#[derive(Debug, Clone)]
pub struct MatchStateMachine {
    rules: MatchRules,
    team_a: Team,
    team_b: Team,
    serve: TeamId,
    phase: MatchPhase,
    threshold: u32,
    extended: bool,
    history: VecDeque<HistorySnapshot>,
    started_at: Option<Duration>,
}

impl MatchStateMachine {
    pub fn new(rules: MatchRules) -> Self {
        Self {
            rules,
            team_a: Team::default(),
            team_b: Team::default(),
            serve: TeamId::A,
            phase: MatchPhase::InProgress,
            threshold: rules.win_threshold,
            extended: false,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            started_at: None,
        }
    }

    pub fn team(&self, id: TeamId) -> &Team {
        match id {
            TeamId::A => &self.team_a,
            TeamId::B => &self.team_b,
        }
    }

    fn team_mut(&mut self, id: TeamId) -> &mut Team {
        match id {
            TeamId::A => &mut self.team_a,
            TeamId::B => &mut self.team_b,
        }
    }

    pub fn serve(&self) -> TeamId {
        self.serve
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn is_won(&self) -> bool {
        matches!(self.phase, MatchPhase::Won { .. })
    }

    pub fn effective_threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn rules(&self) -> MatchRules {
        self.rules
    }

    /// Logical time of the first scoring event, if any.
    pub fn started_at(&self) -> Option<Duration> {
        self.started_at
    }

    /// Set a team's score. Rejected once the match is won or above [`MAX_SCORE`].
    pub fn set_score(&mut self, team: TeamId, score: u32, now: Duration) -> Vec<MatchEffect> {
        if self.is_won() || score > MAX_SCORE {
            return Vec::new();
        }

        let previous = self.team(team).score;
        if previous == score {
            return Vec::new();
        }

        self.push_history();

        if self.started_at.is_none() && score > 0 {
            self.started_at = Some(now);
        }

        self.team_mut(team).score = score;
        if score > previous {
            self.serve = team;
        }

        let mut effects = vec![MatchEffect::ScoreChanged {
            team,
            score,
            urgent: score >= self.threshold.saturating_sub(1),
        }];
        self.evaluate(&mut effects);
        effects
    }

    pub fn increment(&mut self, team: TeamId, now: Duration) -> Vec<MatchEffect> {
        let score = self.team(team).score.saturating_add(1);
        self.set_score(team, score, now)
    }

    /// Remove one point; a zero score stays untouched.
    pub fn decrement(&mut self, team: TeamId, now: Duration) -> Vec<MatchEffect> {
        match self.team(team).score.checked_sub(1) {
            Some(score) => self.set_score(team, score, now),
            None => Vec::new(),
        }
    }

    /// Restore the state preceding the latest score change.
    pub fn undo(&mut self) -> Vec<MatchEffect> {
        let Some(snapshot) = self.history.pop_back() else {
            return Vec::new();
        };

        self.team_a = snapshot.team_a;
        self.team_b = snapshot.team_b;
        self.serve = snapshot.serve;
        self.threshold = snapshot.threshold;
        self.extended = snapshot.extended;
        // Snapshots are only taken in progress.
        self.phase = MatchPhase::InProgress;

        vec![MatchEffect::Undone]
    }

    pub fn switch_serve(&mut self) -> Vec<MatchEffect> {
        if self.is_won() {
            return Vec::new();
        }

        self.serve = self.serve.other();
        vec![MatchEffect::ServeSwitched {
            serving: self.serve,
        }]
    }

    /// Fill or clear a player slot. Allowed in any phase.
    pub fn assign_player(
        &mut self,
        team: TeamId,
        slot: usize,
        player: Option<Player>,
    ) -> Vec<MatchEffect> {
        let Some(target) = self.team_mut(team).players.get_mut(slot) else {
            return Vec::new();
        };

        *target = player;
        vec![MatchEffect::PlayerAssigned { team, slot }]
    }

    /// Zero the scores and history. `full` also empties the player slots.
    pub fn reset_match(&mut self, full: bool) -> Vec<MatchEffect> {
        self.team_a.score = 0;
        self.team_b.score = 0;
        if full {
            self.team_a.players = Default::default();
            self.team_b.players = Default::default();
        }
        self.serve = TeamId::A;
        self.phase = MatchPhase::InProgress;
        self.threshold = self.rules.win_threshold;
        self.extended = false;
        self.history.clear();
        self.started_at = None;

        vec![MatchEffect::Reset { full }]
    }

    /// Produce the result of a won, fully staffed match and start over.
    pub fn finalize_and_save(&mut self, now: Duration) -> Result<MatchResult, SaveRejected> {
        let MatchPhase::Won { winner, skunk } = self.phase else {
            return Err(SaveRejected::NotFinished);
        };

        if !self.team_a.is_complete() || !self.team_b.is_complete() {
            return Err(SaveRejected::MissingPlayers);
        }

        let duration_minutes = self
            .started_at
            .map(|started| {
                let elapsed = now.saturating_sub(started);
                (elapsed.as_secs_f64() / 60.0).round() as u32
            })
            .unwrap_or(0);

        let result = MatchResult {
            team_a: team_result(&self.team_a),
            team_b: team_result(&self.team_b),
            winner,
            duration_minutes,
            skunk,
            effective_threshold: self.threshold,
        };

        self.reset_match(true);
        Ok(result)
    }

    /// Install new rules. An unextended match in progress adopts the new
    /// target right away; otherwise it applies from the next reset.
    pub fn update_rules(&mut self, rules: MatchRules) -> Vec<MatchEffect> {
        self.rules = rules;

        let mut effects = Vec::new();
        if !self.is_won() && !self.extended && self.threshold != rules.win_threshold {
            self.threshold = rules.win_threshold;
            self.evaluate(&mut effects);
        }
        effects
    }

    fn push_history(&mut self) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }

        self.history.push_back(HistorySnapshot {
            team_a: self.team_a.clone(),
            team_b: self.team_b.clone(),
            serve: self.serve,
            threshold: self.threshold,
            extended: self.extended,
        });
    }

    fn evaluate(&mut self, effects: &mut Vec<MatchEffect>) {
        let a = self.team_a.score;
        let b = self.team_b.score;

        if self.rules.extension_enabled
            && !self.extended
            && a == b
            && self.threshold > 0
            && a == self.threshold - 1
        {
            self.threshold = self.threshold.saturating_add(self.rules.extension_increment);
            self.extended = true;
            effects.push(MatchEffect::ThresholdExtended {
                new_threshold: self.threshold,
            });
            return;
        }

        if a.max(b) < self.threshold || a == b {
            return;
        }

        let (winner, loser_score) = if a > b { (TeamId::A, b) } else { (TeamId::B, a) };
        let skunk = loser_score <= self.rules.skunk_bound;
        let tight = a.abs_diff(b) == 1;

        self.phase = MatchPhase::Won { winner, skunk };
        effects.push(MatchEffect::Won {
            winner,
            skunk,
            tight,
        });
    }
}

impl Default for MatchStateMachine {
    fn default() -> Self {
        Self::new(MatchRules::default())
    }
}

fn team_result(team: &Team) -> TeamResult {
    TeamResult {
        players: team.players.iter().flatten().cloned().collect(),
        score: team.score,
    }
}
