//! Round and game state driven by explicit commands.
//!
//! A [`CaseRound`] owns one case, its flags, and its timer. Both the player's decision and the
//! timer's expiry funnel into a single resolve step that refuses to run twice, so a late tick can
//! never score a case that already has a result.

use std::collections::HashSet;
use std::fmt;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cases::{CaseCatalog, CaseId, CatalogError, PropertyCase, RedFlag};
use super::challenge::{ChallengeId, DailyChallenge};
use super::evaluator::{evaluate, Decision, GroundTruth, ScoreResult};
use super::flags::{self, FlagAnswer, FlagClick, QuizSettlement};
use super::persistence::SessionSnapshot;
use super::score::GameScore;
use super::timer::{SessionTimer, TimerTick};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameMode {
    Regular,
    DailyChallenge { challenge_id: ChallengeId },
}

/// What gets recorded for a finished case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseCompletion {
    pub decision: Decision,
    pub points_earned: i32,
    pub time_taken: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseResolution {
    pub case_id: CaseId,
    pub result: ScoreResult,
    pub quiz: QuizSettlement,
    pub completion: CaseCompletion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundCommand {
    ClickFlag { flag_id: String },
    AnswerFlag { flag_id: String, choice: usize },
    SubmitDecision { decision: Decision, time_taken: u32 },
    Tick,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    Flag(FlagClick),
    Answer(FlagAnswer),
    Ticked { remaining: u32 },
    Resolved(Box<CaseResolution>),
    AlreadyResolved,
    Idle,
}

#[derive(Debug, Clone)]
pub struct CaseRound {
    case: PropertyCase,
    timer: SessionTimer,
    reveal_points: i32,
    resolution: Option<CaseResolution>,
}

impl CaseRound {
    pub fn new(mut case: PropertyCase, timer_seconds: u32) -> Self {
        case.reset_flags();
        Self {
            case,
            timer: SessionTimer::new(timer_seconds),
            reveal_points: 0,
            resolution: None,
        }
    }

    pub fn case(&self) -> &PropertyCase {
        &self.case
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn resolution(&self) -> Option<&CaseResolution> {
        self.resolution.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    pub fn apply(&mut self, command: RoundCommand, score: &mut GameScore) -> RoundEvent {
        match command {
            RoundCommand::ClickFlag { flag_id } => RoundEvent::Flag(self.click_flag(&flag_id, score)),
            RoundCommand::AnswerFlag { flag_id, choice } => {
                RoundEvent::Answer(self.answer_flag(&flag_id, choice))
            }
            RoundCommand::SubmitDecision {
                decision,
                time_taken,
            } => self.submit_decision(decision, time_taken, score),
            RoundCommand::Tick => self.tick(score),
            RoundCommand::Timeout => self.on_timeout(score),
        }
    }

    pub fn click_flag(&mut self, flag_id: &str, score: &mut GameScore) -> FlagClick {
        if self.is_resolved() {
            return FlagClick::RoundClosed;
        }
        let outcome = flags::click_flag(&mut self.case.red_flags, flag_id, score);
        if let FlagClick::Revealed { points, .. } = &outcome {
            self.reveal_points += *points;
        }
        outcome
    }

    pub fn answer_flag(&mut self, flag_id: &str, choice: usize) -> FlagAnswer {
        if self.is_resolved() {
            return FlagAnswer::RoundClosed;
        }
        flags::answer_flag(&mut self.case.red_flags, flag_id, choice)
    }

    /// Player-driven resolution. `time_taken` is clamped to the timer budget.
    pub fn submit_decision(
        &mut self,
        decision: Decision,
        time_taken: u32,
        score: &mut GameScore,
    ) -> RoundEvent {
        let time_taken = time_taken.min(self.timer.budget());
        self.resolve(decision, time_taken, false, score)
    }

    /// Clock-driven resolution: always a WALK_AWAY that used the whole budget.
    pub fn on_timeout(&mut self, score: &mut GameScore) -> RoundEvent {
        if self.is_resolved() {
            return RoundEvent::AlreadyResolved;
        }
        match self.timer.force_expire() {
            TimerTick::Expired(forced) => {
                self.resolve(forced.decision, forced.time_taken, true, score)
            }
            _ => RoundEvent::AlreadyResolved,
        }
    }

    pub fn tick(&mut self, score: &mut GameScore) -> RoundEvent {
        if self.is_resolved() {
            return RoundEvent::Idle;
        }
        let tick = self.timer.tick();
        self.handle_tick(tick, score)
    }

    /// Advance the clock by several seconds; used to catch up with wall-clock time.
    pub fn advance(&mut self, seconds: u32, score: &mut GameScore) -> RoundEvent {
        if self.is_resolved() || seconds == 0 {
            return RoundEvent::Idle;
        }
        let tick = self.timer.advance(seconds);
        self.handle_tick(tick, score)
    }

    fn handle_tick(&mut self, tick: TimerTick, score: &mut GameScore) -> RoundEvent {
        match tick {
            TimerTick::Running { remaining } => RoundEvent::Ticked { remaining },
            TimerTick::Expired(forced) => {
                debug!(case_id = %self.case.id, "case timer expired");
                self.resolve(forced.decision, forced.time_taken, true, score)
            }
            TimerTick::Idle => RoundEvent::Idle,
        }
    }

    fn resolve(
        &mut self,
        decision: Decision,
        time_taken: u32,
        forced: bool,
        score: &mut GameScore,
    ) -> RoundEvent {
        if self.resolution.is_some() {
            return RoundEvent::AlreadyResolved;
        }
        self.timer.stop();

        let quiz = flags::settle_quizzes(&self.case.red_flags, score);
        let undiscovered: Vec<&RedFlag> = self.case.undiscovered_flags().collect();
        let mut result = evaluate(decision, GroundTruth::from_case(&self.case), &undiscovered);
        result.forced = forced;

        score.record_decision(decision, self.case.is_good_deal, result.points);

        let resolution = CaseResolution {
            case_id: self.case.id.clone(),
            completion: CaseCompletion {
                decision,
                points_earned: result.points + quiz.points + self.reveal_points,
                time_taken,
            },
            result,
            quiz,
        };

        info!(
            case_id = %resolution.case_id,
            decision = decision.label(),
            points = resolution.completion.points_earned,
            forced,
            "case resolved"
        );

        self.resolution = Some(resolution.clone());
        RoundEvent::Resolved(Box::new(resolution))
    }
}

/// One player's run through a sequence of cases.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: GameId,
    user_id: String,
    mode: GameMode,
    score: GameScore,
    seen: HashSet<CaseId>,
    round: CaseRound,
    timer_seconds: u32,
}

impl GameSession {
    pub fn start_regular<R>(
        id: GameId,
        user_id: impl Into<String>,
        catalog: &CaseCatalog,
        rng: &mut R,
        timer_seconds: u32,
    ) -> Result<Self, GameError>
    where
        R: Rng + ?Sized,
    {
        let case = catalog.random_case(&HashSet::new(), rng)?;
        Ok(Self::with_case(
            id,
            user_id.into(),
            GameMode::Regular,
            case,
            timer_seconds,
        ))
    }

    pub fn start_challenge(
        id: GameId,
        user_id: impl Into<String>,
        challenge: &DailyChallenge,
        catalog: &CaseCatalog,
        timer_seconds: u32,
    ) -> Result<Self, GameError> {
        let case = catalog
            .get(&challenge.case_id)
            .ok_or_else(|| GameError::UnknownCase(challenge.case_id.clone()))?;
        Ok(Self::with_case(
            id,
            user_id.into(),
            GameMode::DailyChallenge {
                challenge_id: challenge.id.clone(),
            },
            case,
            timer_seconds,
        ))
    }

    fn with_case(
        id: GameId,
        user_id: String,
        mode: GameMode,
        case: PropertyCase,
        timer_seconds: u32,
    ) -> Self {
        let mut seen = HashSet::new();
        seen.insert(case.id.clone());
        Self {
            id,
            user_id,
            mode,
            score: GameScore::default(),
            seen,
            round: CaseRound::new(case, timer_seconds),
            timer_seconds,
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn mode(&self) -> &GameMode {
        &self.mode
    }

    pub fn score(&self) -> &GameScore {
        &self.score
    }

    pub fn round(&self) -> &CaseRound {
        &self.round
    }

    pub fn seen(&self) -> &HashSet<CaseId> {
        &self.seen
    }

    pub fn apply(&mut self, command: RoundCommand) -> RoundEvent {
        self.round.apply(command, &mut self.score)
    }

    pub fn advance_clock(&mut self, seconds: u32) -> RoundEvent {
        self.round.advance(seconds, &mut self.score)
    }

    /// Deal the next unseen case. Regular games cycle back once every case has been played.
    pub fn next_case<R>(&mut self, catalog: &CaseCatalog, rng: &mut R) -> Result<&CaseRound, GameError>
    where
        R: Rng + ?Sized,
    {
        if !matches!(self.mode, GameMode::Regular) {
            return Err(GameError::NotRegularMode);
        }
        if !self.round.is_resolved() {
            return Err(GameError::RoundInProgress);
        }

        let case = catalog.random_case_cycling(&self.seen, rng)?;
        if !self.seen.insert(case.id.clone()) {
            debug!(game_id = %self.id, "every case seen; starting a new cycle");
            self.seen.clear();
            self.seen.insert(case.id.clone());
        }
        self.round = CaseRound::new(case, self.timer_seconds);
        Ok(&self.round)
    }

    /// Start over with a zeroed score.
    pub fn restart<R>(&mut self, catalog: &CaseCatalog, rng: &mut R) -> Result<(), GameError>
    where
        R: Rng + ?Sized,
    {
        if !matches!(self.mode, GameMode::Regular) {
            return Err(GameError::NotRegularMode);
        }
        let case = catalog.random_case(&HashSet::new(), rng)?;
        self.score.reset();
        self.seen.clear();
        self.seen.insert(case.id.clone());
        self.round = CaseRound::new(case, self.timer_seconds);
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            game_id: self.id.clone(),
            user_id: self.user_id.clone(),
            score: self.score,
            recorded_at: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("case '{0}' is not in the catalog")]
    UnknownCase(CaseId),
    #[error("daily challenges are a single case")]
    NotRegularMode,
    #[error("the current case has not been decided yet")]
    RoundInProgress,
}
