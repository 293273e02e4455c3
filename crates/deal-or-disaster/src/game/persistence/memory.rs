use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use super::{
    ChallengeRepository, CompletionRecord, RepositoryError, SessionRepository, SessionSnapshot,
};
use crate::game::cases::CaseCatalog;
use crate::game::challenge::{ChallengeId, DailyChallenge};
use crate::game::session::GameId;

#[derive(Default, Clone)]
pub struct InMemorySessionRepository {
    snapshots: Arc<Mutex<HashMap<GameId, Vec<SessionSnapshot>>>>,
}

impl InMemorySessionRepository {
    pub fn history(&self, game_id: &GameId) -> Vec<SessionSnapshot> {
        self.snapshots
            .lock()
            .expect("session mutex poisoned")
            .get(game_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn save_snapshot(&self, snapshot: SessionSnapshot) -> Result<(), RepositoryError> {
        let mut guard = self.snapshots.lock().expect("session mutex poisoned");
        guard
            .entry(snapshot.game_id.clone())
            .or_default()
            .push(snapshot);
        Ok(())
    }
}

type CompletionKey = (String, ChallengeId);

/// Challenge store deriving each day's case from the catalog. Completion uniqueness is
/// checked and written under one lock, so concurrent duplicates cannot both land.
#[derive(Clone)]
pub struct InMemoryChallengeRepository {
    catalog: Arc<CaseCatalog>,
    challenges: Arc<Mutex<HashMap<ChallengeId, DailyChallenge>>>,
    completions: Arc<Mutex<HashMap<CompletionKey, CompletionRecord>>>,
}

impl InMemoryChallengeRepository {
    pub fn new(catalog: Arc<CaseCatalog>) -> Self {
        Self {
            catalog,
            challenges: Arc::default(),
            completions: Arc::default(),
        }
    }
}

impl ChallengeRepository for InMemoryChallengeRepository {
    fn challenge_for(&self, date: NaiveDate) -> Result<DailyChallenge, RepositoryError> {
        let id = DailyChallenge::id_for(date);
        let mut guard = self.challenges.lock().expect("challenge mutex poisoned");
        if let Some(existing) = guard.get(&id) {
            return Ok(existing.clone());
        }

        let challenge = DailyChallenge::for_date(date, &self.catalog)
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        guard.insert(id, challenge.clone());
        Ok(challenge)
    }

    fn get(&self, id: &ChallengeId) -> Result<Option<DailyChallenge>, RepositoryError> {
        let guard = self.challenges.lock().expect("challenge mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn record_completion(
        &self,
        record: CompletionRecord,
    ) -> Result<CompletionRecord, RepositoryError> {
        if self.get(&record.challenge_id)?.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let key = (record.user_id.clone(), record.challenge_id.clone());
        let mut guard = self.completions.lock().expect("completion mutex poisoned");
        if guard.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(key, record.clone());
        Ok(record)
    }

    fn has_completed(&self, user_id: &str, id: &ChallengeId) -> Result<bool, RepositoryError> {
        let guard = self.completions.lock().expect("completion mutex poisoned");
        Ok(guard.contains_key(&(user_id.to_string(), id.clone())))
    }

    fn completions(&self, id: &ChallengeId) -> Result<Vec<CompletionRecord>, RepositoryError> {
        let guard = self.completions.lock().expect("completion mutex poisoned");
        let mut records: Vec<CompletionRecord> = guard
            .values()
            .filter(|record| &record.challenge_id == id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.completion
                .points_earned
                .cmp(&a.completion.points_earned)
                .then(a.completed_at.cmp(&b.completed_at))
        });
        Ok(records)
    }
}
