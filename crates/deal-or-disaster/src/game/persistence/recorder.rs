use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::{
    ChallengeRepository, CompletionRecord, RepositoryError, SessionRepository, SessionSnapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub backoff: Duration,
}

impl RetryPolicy {
    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved { attempts: u32 },
    /// The store refused the write; retrying would not help.
    Rejected(RepositoryError),
    /// Every attempt failed; the write is lost and gameplay continues.
    Dropped { attempts: u32, reason: String },
}

impl PersistOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistOutcome::Saved { .. })
    }
}

/// Writes scores on behalf of gameplay. Failures are retried and logged, never returned.
pub struct ScoreRecorder<S, C> {
    sessions: Arc<S>,
    challenges: Arc<C>,
    policy: RetryPolicy,
}

impl<S, C> ScoreRecorder<S, C>
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    pub fn new(sessions: Arc<S>, challenges: Arc<C>, policy: RetryPolicy) -> Self {
        Self {
            sessions,
            challenges,
            policy,
        }
    }

    pub fn record_snapshot(&self, snapshot: SessionSnapshot) -> PersistOutcome {
        let game_id = snapshot.game_id.clone();
        let outcome = self.with_retry(|| self.sessions.save_snapshot(snapshot.clone()));
        log_outcome("session snapshot", &game_id.0, &outcome);
        outcome
    }

    pub fn record_completion(&self, record: CompletionRecord) -> PersistOutcome {
        let key = format!("{}/{}", record.user_id, record.challenge_id);
        let outcome = self.with_retry(|| {
            self.challenges
                .record_completion(record.clone())
                .map(|_| ())
        });
        log_outcome("challenge completion", &key, &outcome);
        outcome
    }

    fn with_retry<F>(&self, mut operation: F) -> PersistOutcome
    where
        F: FnMut() -> Result<(), RepositoryError>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation() {
                Ok(()) => return PersistOutcome::Saved { attempts: attempt },
                Err(err) if !err.is_transient() => return PersistOutcome::Rejected(err),
                Err(err) if attempt >= max_attempts => {
                    return PersistOutcome::Dropped {
                        attempts: attempt,
                        reason: err.to_string(),
                    }
                }
                Err(err) => {
                    let delay = self.policy.delay_after(attempt);
                    debug!(attempt, ?delay, error = %err, "retrying score write");
                    thread::sleep(delay);
                }
            }
        }
    }
}

fn log_outcome(kind: &str, key: &str, outcome: &PersistOutcome) {
    match outcome {
        PersistOutcome::Saved { attempts } => debug!(kind, key, attempts, "score persisted"),
        PersistOutcome::Rejected(err) => warn!(kind, key, error = %err, "score write rejected"),
        PersistOutcome::Dropped { attempts, reason } => {
            warn!(kind, key, attempts, reason = %reason, "score write dropped after retries")
        }
    }
}
