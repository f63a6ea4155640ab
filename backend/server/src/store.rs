//! # Storage
//!
//! Everything the service persists goes through [`Store`]. Production runs on Redis
//! ([`crate::database::RedisStore`]); [`MemoryStore`] backs tests and local runs.
//!
//! Per day we keep:
//! - the scheduled riddle
//! - each user's attempt (start time, hints, chat)
//! - each user's single submission
//! - the score set used for ranking
//!
//! plus one calibration rubric per riddle per day.
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bank::Riddle;
use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{Attempt, RankCounts, Submission};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored date: {0}")]
    InvalidDate(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn riddle(&self, date: NaiveDate) -> Result<Option<Riddle>, StoreError>;

    async fn put_riddle(&self, date: NaiveDate, riddle: &Riddle) -> Result<(), StoreError>;

    /// Every scheduled day, in date order.
    async fn schedule(&self) -> Result<BTreeMap<NaiveDate, Riddle>, StoreError>;

    async fn attempt(&self, date: NaiveDate, user: &str) -> Result<Option<Attempt>, StoreError>;

    async fn save_attempt(
        &self,
        date: NaiveDate,
        user: &str,
        attempt: &Attempt,
    ) -> Result<(), StoreError>;

    async fn submission(
        &self,
        date: NaiveDate,
        user: &str,
    ) -> Result<Option<Submission>, StoreError>;

    /// Stores the submission and its score unless the user already has one for the
    /// day. Returns whether it was stored.
    async fn record_submission(
        &self,
        date: NaiveDate,
        user: &str,
        submission: &Submission,
    ) -> Result<bool, StoreError>;

    async fn cached_rubric(
        &self,
        riddle_id: &str,
        date: NaiveDate,
    ) -> Result<Option<String>, StoreError>;

    async fn cache_rubric(
        &self,
        riddle_id: &str,
        date: NaiveDate,
        rubric: &str,
    ) -> Result<(), StoreError>;

    async fn rank_counts(&self, date: NaiveDate, score: u32) -> Result<RankCounts, StoreError>;

    /// Highest scores first; equal scores in descending user id order, as `ZREVRANGE` returns them.
    async fn top_scores(
        &self,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<(String, u32)>, StoreError>;
}

#[derive(Default)]
struct Inner {
    riddles: BTreeMap<NaiveDate, Riddle>,
    attempts: HashMap<(NaiveDate, String), Attempt>,
    submissions: HashMap<(NaiveDate, String), Submission>,
    scores: HashMap<NaiveDate, HashMap<String, u32>>,
    rubrics: HashMap<(String, NaiveDate), String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn riddle(&self, date: NaiveDate) -> Result<Option<Riddle>, StoreError> {
        Ok(self.inner.read().await.riddles.get(&date).cloned())
    }

    async fn put_riddle(&self, date: NaiveDate, riddle: &Riddle) -> Result<(), StoreError> {
        self.inner.write().await.riddles.insert(date, riddle.clone());
        Ok(())
    }

    async fn schedule(&self) -> Result<BTreeMap<NaiveDate, Riddle>, StoreError> {
        Ok(self.inner.read().await.riddles.clone())
    }

    async fn attempt(&self, date: NaiveDate, user: &str) -> Result<Option<Attempt>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.attempts.get(&(date, user.to_string())).cloned())
    }

    async fn save_attempt(
        &self,
        date: NaiveDate,
        user: &str,
        attempt: &Attempt,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .attempts
            .insert((date, user.to_string()), attempt.clone());
        Ok(())
    }

    async fn submission(
        &self,
        date: NaiveDate,
        user: &str,
    ) -> Result<Option<Submission>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.submissions.get(&(date, user.to_string())).cloned())
    }

    async fn record_submission(
        &self,
        date: NaiveDate,
        user: &str,
        submission: &Submission,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let key = (date, user.to_string());

        if inner.submissions.contains_key(&key) {
            return Ok(false);
        }

        inner.submissions.insert(key, submission.clone());
        inner
            .scores
            .entry(date)
            .or_default()
            .insert(user.to_string(), submission.score);

        Ok(true)
    }

    async fn cached_rubric(
        &self,
        riddle_id: &str,
        date: NaiveDate,
    ) -> Result<Option<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.rubrics.get(&(riddle_id.to_string(), date)).cloned())
    }

    async fn cache_rubric(
        &self,
        riddle_id: &str,
        date: NaiveDate,
        rubric: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .rubrics
            .insert((riddle_id.to_string(), date), rubric.to_string());
        Ok(())
    }

    async fn rank_counts(&self, date: NaiveDate, score: u32) -> Result<RankCounts, StoreError> {
        let inner = self.inner.read().await;
        let Some(scores) = inner.scores.get(&date) else {
            return Ok(RankCounts::default());
        };

        Ok(RankCounts {
            total: scores.len() as u64,
            lower: scores.values().filter(|&&s| s < score).count() as u64,
            tied: scores.values().filter(|&&s| s == score).count() as u64,
        })
    }

    async fn top_scores(
        &self,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<(String, u32)>, StoreError> {
        let inner = self.inner.read().await;
        let mut scores: Vec<(String, u32)> = inner
            .scores
            .get(&date)
            .map(|scores| scores.iter().map(|(u, s)| (u.clone(), *s)).collect())
            .unwrap_or_default();

        scores.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        scores.truncate(limit);

        Ok(scores)
    }
}
