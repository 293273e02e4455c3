//! Foreclosure-auction gameplay: case selection, red-flag discovery, decision scoring, and the
//! per-case countdown, plus the service and HTTP router that host games.

pub mod cases;
pub mod challenge;
pub mod evaluator;
pub mod flags;
pub mod persistence;
pub mod router;
pub mod score;
pub mod service;
pub mod session;
pub mod timer;
pub mod views;

#[cfg(test)]
mod tests;

pub use cases::{CaseCatalog, CaseId, CatalogError, PropertyCase, RedFlag, Severity};
pub use challenge::{ChallengeId, DailyChallenge};
pub use evaluator::{evaluate, format_currency, Decision, GroundTruth, ScoreResult};
pub use flags::{FlagAnswer, FlagClick, QuizSettlement};
pub use persistence::{
    ChallengeRepository, CompletionRecord, InMemoryChallengeRepository,
    InMemorySessionRepository, PersistOutcome, RepositoryError, RetryPolicy, ScoreRecorder,
    SessionRepository, SessionSnapshot,
};
pub use router::game_router;
pub use score::GameScore;
pub use service::{DecisionView, GameService, GameServiceError, GameSettings, ModeRequest};
pub use session::{
    CaseCompletion, CaseResolution, CaseRound, GameError, GameId, GameMode, GameSession,
    RoundCommand, RoundEvent,
};
pub use timer::{SessionTimer, TimerState, TimerTick, DEFAULT_CASE_SECONDS};
pub use views::{CaseView, FlagView, GameView};
