use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cases::{CaseCatalog, CatalogError};
use super::challenge::{ChallengeId, DailyChallenge};
use super::evaluator::Decision;
use super::flags::{FlagAnswer, FlagClick};
use super::persistence::{
    ChallengeRepository, CompletionRecord, RepositoryError, RetryPolicy, ScoreRecorder,
    SessionRepository, SessionSnapshot,
};
use super::score::GameScore;
use super::session::{
    CaseCompletion, CaseResolution, GameError, GameId, GameMode, GameSession, RoundCommand,
    RoundEvent,
};
use super::timer::DEFAULT_CASE_SECONDS;
use super::views::GameView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    pub timer_seconds: u32,
    pub retry: RetryPolicy,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            timer_seconds: DEFAULT_CASE_SECONDS,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeRequest {
    #[default]
    Regular,
    Daily,
}

/// Result of a decision request.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionView {
    pub game_id: GameId,
    /// False when the case was already resolved, by an earlier decision or by the clock.
    pub applied: bool,
    pub resolution: CaseResolution,
    pub score: GameScore,
}

struct HostedGame {
    session: GameSession,
    round_started: Instant,
    seconds_applied: u32,
    last_touched: Instant,
}

impl HostedGame {
    fn new(session: GameSession, now: Instant) -> Self {
        Self {
            session,
            round_started: now,
            seconds_applied: 0,
            last_touched: now,
        }
    }

    /// A daily game ends with its only case; nothing more can be asked of it.
    fn is_finished(&self) -> bool {
        matches!(self.session.mode(), GameMode::DailyChallenge { .. })
            && self.session.round().is_resolved()
    }

    /// Catch the round timer up with wall-clock time. Returns the resolution if the clock ran out.
    fn sync_clock(&mut self, now: Instant) -> Option<CaseResolution> {
        let elapsed = now.saturating_duration_since(self.round_started).as_secs();
        let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
        let pending = elapsed.saturating_sub(self.seconds_applied);
        self.seconds_applied = self.seconds_applied.max(elapsed);

        match self.session.advance_clock(pending) {
            RoundEvent::Resolved(resolution) => Some(*resolution),
            _ => None,
        }
    }
}

enum PersistJob {
    Snapshot(SessionSnapshot),
    Completion(CompletionRecord),
}

/// Untouched games are dropped after this many case timers have elapsed.
const IDLE_TIMER_SPANS: u32 = 3;

static GAME_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_game_id() -> GameId {
    let id = GAME_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    GameId(format!("game-{id:06}"))
}

/// Hosts in-flight games and forwards finished cases to storage.
pub struct GameService<S, C> {
    catalog: Arc<CaseCatalog>,
    sessions: Arc<S>,
    challenges: Arc<C>,
    recorder: Arc<ScoreRecorder<S, C>>,
    games: Mutex<HashMap<GameId, HostedGame>>,
    rng: Mutex<StdRng>,
    settings: GameSettings,
}

impl<S, C> GameService<S, C>
where
    S: SessionRepository + 'static,
    C: ChallengeRepository + 'static,
{
    pub fn new(
        catalog: Arc<CaseCatalog>,
        sessions: Arc<S>,
        challenges: Arc<C>,
        settings: GameSettings,
    ) -> Self {
        let recorder = Arc::new(ScoreRecorder::new(
            sessions.clone(),
            challenges.clone(),
            settings.retry,
        ));
        Self {
            catalog,
            sessions,
            challenges,
            recorder,
            games: Mutex::new(HashMap::new()),
            rng: Mutex::new(StdRng::from_entropy()),
            settings,
        }
    }

    /// Deterministic case selection for demos and tests.
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.lock().expect("rng mutex poisoned") = StdRng::seed_from_u64(seed);
        self
    }

    pub fn catalog(&self) -> &CaseCatalog {
        &self.catalog
    }

    pub fn start_game(
        &self,
        user_id: &str,
        mode: ModeRequest,
    ) -> Result<GameView, GameServiceError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(GameServiceError::MissingUser);
        }

        let game_id = next_game_id();
        let session = match mode {
            ModeRequest::Regular => {
                let mut rng = self.rng.lock().expect("rng mutex poisoned");
                GameSession::start_regular(
                    game_id.clone(),
                    user_id,
                    &self.catalog,
                    &mut *rng,
                    self.settings.timer_seconds,
                )?
            }
            ModeRequest::Daily => {
                let challenge = self.today_challenge()?;
                if self.challenges.has_completed(user_id, &challenge.id)? {
                    return Err(GameServiceError::ChallengeAlreadyCompleted(challenge.id));
                }
                GameSession::start_challenge(
                    game_id.clone(),
                    user_id,
                    &challenge,
                    &self.catalog,
                    self.settings.timer_seconds,
                )?
            }
        };

        let now = Instant::now();
        self.evict_idle(now);

        info!(%game_id, user_id, ?mode, case_id = %session.round().case().id, "game started");
        let view = GameView::of(&session);
        self.games
            .lock()
            .expect("game mutex poisoned")
            .insert(game_id, HostedGame::new(session, now));
        Ok(view)
    }

    /// Drop games nobody has touched for `IDLE_TIMER_SPANS` case timers. A round still open
    /// when its game is dropped is closed by the clock first, so its result is still stored.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let idle_limit = Duration::from_secs(
            u64::from(self.settings.timer_seconds) * u64::from(IDLE_TIMER_SPANS),
        );
        let (evicted, jobs) = {
            let mut games = self.games.lock().expect("game mutex poisoned");
            let stale: Vec<GameId> = games
                .iter()
                .filter(|(_, game)| now.saturating_duration_since(game.last_touched) >= idle_limit)
                .map(|(game_id, _)| game_id.clone())
                .collect();
            let jobs: Vec<PersistJob> = stale
                .iter()
                .filter_map(|game_id| games.remove(game_id))
                .filter_map(|mut game| {
                    game.sync_clock(now)
                        .map(|resolution| persist_job(&game.session, &resolution))
                })
                .collect();
            if !stale.is_empty() {
                debug!(evicted = stale.len(), remaining = games.len(), "idle games evicted");
            }
            (stale.len(), jobs)
        };

        for job in jobs {
            self.persist(job);
        }
        evicted
    }

    /// Number of games currently held in memory.
    pub fn active_games(&self) -> usize {
        self.games.lock().expect("game mutex poisoned").len()
    }

    pub fn game(&self, game_id: &GameId) -> Result<GameView, GameServiceError> {
        self.with_game(game_id, Instant::now(), |game| GameView::of(&game.session))
    }

    pub fn click_flag(
        &self,
        game_id: &GameId,
        flag_id: &str,
    ) -> Result<FlagClick, GameServiceError> {
        self.with_game(game_id, Instant::now(), |game| {
            match game.session.apply(RoundCommand::ClickFlag {
                flag_id: flag_id.to_string(),
            }) {
                RoundEvent::Flag(outcome) => outcome,
                _ => FlagClick::RoundClosed,
            }
        })
    }

    pub fn answer_flag(
        &self,
        game_id: &GameId,
        flag_id: &str,
        choice: usize,
    ) -> Result<FlagAnswer, GameServiceError> {
        self.with_game(game_id, Instant::now(), |game| {
            match game.session.apply(RoundCommand::AnswerFlag {
                flag_id: flag_id.to_string(),
                choice,
            }) {
                RoundEvent::Answer(outcome) => outcome,
                _ => FlagAnswer::RoundClosed,
            }
        })
    }

    pub fn decide(
        &self,
        game_id: &GameId,
        decision: Decision,
    ) -> Result<DecisionView, GameServiceError> {
        self.decide_at(game_id, decision, Instant::now())
    }

    /// Decide as of `now`. If the clock already ran out the forced WALK_AWAY stands.
    pub fn decide_at(
        &self,
        game_id: &GameId,
        decision: Decision,
        now: Instant,
    ) -> Result<DecisionView, GameServiceError> {
        let (view, job) = {
            let mut games = self.games.lock().expect("game mutex poisoned");
            let game = games
                .get_mut(game_id)
                .ok_or_else(|| GameServiceError::UnknownGame(game_id.clone()))?;

            let mut job = game
                .sync_clock(now)
                .map(|resolution| persist_job(&game.session, &resolution));

            let time_taken = game.session.round().timer().elapsed();
            let applied = match game.session.apply(RoundCommand::SubmitDecision {
                decision,
                time_taken,
            }) {
                RoundEvent::Resolved(resolution) => {
                    job = Some(persist_job(&game.session, &resolution));
                    true
                }
                _ => false,
            };

            let resolution = game
                .session
                .round()
                .resolution()
                .cloned()
                .ok_or(GameError::RoundInProgress)?;
            let view = DecisionView {
                game_id: game_id.clone(),
                applied,
                resolution,
                score: *game.session.score(),
            };
            game.last_touched = now;
            release_if_finished(&mut games, game_id);
            (view, job)
        };

        if let Some(job) = job {
            self.persist(job);
        }
        Ok(view)
    }

    pub fn next_case(&self, game_id: &GameId) -> Result<GameView, GameServiceError> {
        let now = Instant::now();
        self.with_game(game_id, now, |game| -> Result<GameView, GameServiceError> {
            let mut rng = self.rng.lock().expect("rng mutex poisoned");
            game.session.next_case(&self.catalog, &mut *rng)?;
            game.round_started = now;
            game.seconds_applied = 0;
            Ok(GameView::of(&game.session))
        })?
    }

    /// Store a score snapshot sent by a client.
    pub fn save_session(&self, snapshot: SessionSnapshot) -> Result<(), GameServiceError> {
        if snapshot.user_id.trim().is_empty() {
            return Err(GameServiceError::MissingUser);
        }
        self.sessions.save_snapshot(snapshot)?;
        Ok(())
    }

    pub fn today_challenge(&self) -> Result<DailyChallenge, GameServiceError> {
        Ok(self.challenges.challenge_for(Utc::now().date_naive())?)
    }

    pub fn complete_challenge(
        &self,
        challenge_id: &ChallengeId,
        user_id: &str,
        completion: CaseCompletion,
    ) -> Result<CompletionRecord, GameServiceError> {
        if user_id.trim().is_empty() {
            return Err(GameServiceError::MissingUser);
        }
        let record = CompletionRecord {
            user_id: user_id.trim().to_string(),
            challenge_id: challenge_id.clone(),
            completion,
            completed_at: Utc::now(),
        };
        match self.challenges.record_completion(record) {
            Ok(record) => Ok(record),
            Err(RepositoryError::Conflict) => Err(GameServiceError::ChallengeAlreadyCompleted(
                challenge_id.clone(),
            )),
            Err(other) => Err(other.into()),
        }
    }

    pub fn challenge_completions(
        &self,
        challenge_id: &ChallengeId,
    ) -> Result<Vec<CompletionRecord>, GameServiceError> {
        if self.challenges.get(challenge_id)?.is_none() {
            return Err(RepositoryError::NotFound.into());
        }
        Ok(self.challenges.completions(challenge_id)?)
    }

    fn with_game<T>(
        &self,
        game_id: &GameId,
        now: Instant,
        action: impl FnOnce(&mut HostedGame) -> T,
    ) -> Result<T, GameServiceError> {
        let (value, job) = {
            let mut games = self.games.lock().expect("game mutex poisoned");
            let game = games
                .get_mut(game_id)
                .ok_or_else(|| GameServiceError::UnknownGame(game_id.clone()))?;
            let job = game
                .sync_clock(now)
                .map(|resolution| persist_job(&game.session, &resolution));
            let value = action(game);
            game.last_touched = now;
            release_if_finished(&mut games, game_id);
            (value, job)
        };

        if let Some(job) = job {
            self.persist(job);
        }
        Ok(value)
    }

    /// Fire-and-forget: on a runtime the write moves to the blocking pool, otherwise it runs inline.
    fn persist(&self, job: PersistJob) {
        let recorder = self.recorder.clone();
        let write = move || match job {
            PersistJob::Snapshot(snapshot) => recorder.record_snapshot(snapshot),
            PersistJob::Completion(record) => recorder.record_completion(record),
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(write);
            }
            Err(_) => {
                write();
            }
        }
    }
}

fn release_if_finished(games: &mut HashMap<GameId, HostedGame>, game_id: &GameId) {
    if games.get(game_id).is_some_and(HostedGame::is_finished) {
        games.remove(game_id);
        debug!(%game_id, "daily game released");
    }
}

fn persist_job(session: &GameSession, resolution: &CaseResolution) -> PersistJob {
    match session.mode() {
        GameMode::Regular => PersistJob::Snapshot(session.snapshot()),
        GameMode::DailyChallenge { challenge_id } => PersistJob::Completion(CompletionRecord {
            user_id: session.user_id().to_string(),
            challenge_id: challenge_id.clone(),
            completion: resolution.completion,
            completed_at: Utc::now(),
        }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameServiceError {
    #[error("game '{0}' not found")]
    UnknownGame(GameId),
    #[error("user_id is required")]
    MissingUser,
    #[error("challenge '{0}' already completed")]
    ChallengeAlreadyCompleted(ChallengeId),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
