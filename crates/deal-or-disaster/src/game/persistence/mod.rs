//! Storage boundary for score snapshots and daily-challenge completions.

mod memory;
mod recorder;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::challenge::{ChallengeId, DailyChallenge};
use super::score::GameScore;
use super::session::{CaseCompletion, GameId};

pub use memory::{InMemoryChallengeRepository, InMemorySessionRepository};
pub use recorder::{PersistOutcome, RetryPolicy, ScoreRecorder};

/// Score as of the last finished case in a regular game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub game_id: GameId,
    pub user_id: String,
    pub score: GameScore,
    pub recorded_at: DateTime<Utc>,
}

/// One user's finished daily challenge. At most one exists per (user, challenge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub user_id: String,
    pub challenge_id: ChallengeId,
    #[serde(flatten)]
    pub completion: CaseCompletion,
    pub completed_at: DateTime<Utc>,
}

pub trait SessionRepository: Send + Sync {
    fn save_snapshot(&self, snapshot: SessionSnapshot) -> Result<(), RepositoryError>;
}

pub trait ChallengeRepository: Send + Sync {
    /// Challenge for a date, created on first request.
    fn challenge_for(&self, date: NaiveDate) -> Result<DailyChallenge, RepositoryError>;
    fn get(&self, id: &ChallengeId) -> Result<Option<DailyChallenge>, RepositoryError>;
    /// Must fail with [`RepositoryError::Conflict`] when the user already completed it.
    fn record_completion(
        &self,
        record: CompletionRecord,
    ) -> Result<CompletionRecord, RepositoryError>;
    fn has_completed(&self, user_id: &str, id: &ChallengeId) -> Result<bool, RepositoryError>;
    fn completions(&self, id: &ChallengeId) -> Result<Vec<CompletionRecord>, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}
