//! # Redis
//!
//! RAM database holding the daily riddles, player progress, and scores.
//!
//! ## Requirements
//!
//! - Fast lookups for the current user's attempt on every request
//! - Atomic "first submission wins" per user per day
//! - The three ranking counts (total, strictly lower, tied) without scanning
//!
//! ## Implementation
//!
//! - `riddles`: 1 big hash, date (`YYYY-MM-DD`) -> riddle JSON
//! - `attempts:{date}`: hash, user id -> attempt JSON
//! - `submissions:{date}`: hash, user id -> submission JSON, written with `HSETNX`
//! - `scores:{date}`: sorted set, user id scored by points; `ZCARD` and `ZCOUNT` in one
//!   `MULTI` give the rank counts
//! - `rubric:{riddle}:{date}`: string with a 24 hour TTL
//! - The submission hash and score set are written by one Lua script so a player is never
//!   ranked without a submission, or the reverse
use std::{
    collections::{BTreeMap, HashMap},
    sync::LazyLock,
    time::Duration,
};

use async_trait::async_trait;
use bank::Riddle;
use chrono::NaiveDate;
use redis::{
    AsyncCommands, Client, RedisError, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use crate::{
    models::{Attempt, RankCounts, Submission},
    store::{Store, StoreError},
};

pub const RIDDLES_KEY: &str = "riddles";
pub const RUBRIC_TTL: Duration = Duration::from_secs(24 * 60 * 60);

static RECORD_SUBMISSION: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
if redis.call('HSETNX', KEYS[1], ARGV[1], ARGV[2]) == 1 then
    redis.call('ZADD', KEYS[2], ARGV[3], ARGV[1])
    return 1
end
return 0
"#,
    )
});

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;

    client.get_connection_manager_with_config(config).await
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn attempts_key(date: NaiveDate) -> String {
    format!("attempts:{}", date_key(date))
}

fn submissions_key(date: NaiveDate) -> String {
    format!("submissions:{}", date_key(date))
}

fn scores_key(date: NaiveDate) -> String {
    format!("scores:{}", date_key(date))
}

fn rubric_key(riddle_id: &str, date: NaiveDate) -> String {
    format!("rubric:{riddle_id}:{}", date_key(date))
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<T>, StoreError> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn.hget(key, field).await?;

        Ok(raw.map(|s| serde_json::from_str(&s)).transpose()?)
    }

    async fn put_json<T: serde::Serialize + Sync>(
        &self,
        key: &str,
        field: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: () = conn.hset(key, field, serde_json::to_string(value)?).await?;

        Ok(())
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn riddle(&self, date: NaiveDate) -> Result<Option<Riddle>, StoreError> {
        self.get_json(RIDDLES_KEY, &date_key(date)).await
    }

    async fn put_riddle(&self, date: NaiveDate, riddle: &Riddle) -> Result<(), StoreError> {
        self.put_json(RIDDLES_KEY, &date_key(date), riddle).await
    }

    async fn schedule(&self) -> Result<BTreeMap<NaiveDate, Riddle>, StoreError> {
        let mut conn = self.connection.clone();
        let raw: HashMap<String, String> = conn.hgetall(RIDDLES_KEY).await?;

        raw.into_iter()
            .map(|(date, riddle)| -> Result<(NaiveDate, Riddle), StoreError> {
                let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .map_err(|_| StoreError::InvalidDate(date))?;
                Ok((date, serde_json::from_str(&riddle)?))
            })
            .collect()
    }

    async fn attempt(&self, date: NaiveDate, user: &str) -> Result<Option<Attempt>, StoreError> {
        self.get_json(&attempts_key(date), user).await
    }

    async fn save_attempt(
        &self,
        date: NaiveDate,
        user: &str,
        attempt: &Attempt,
    ) -> Result<(), StoreError> {
        self.put_json(&attempts_key(date), user, attempt).await
    }

    async fn submission(
        &self,
        date: NaiveDate,
        user: &str,
    ) -> Result<Option<Submission>, StoreError> {
        self.get_json(&submissions_key(date), user).await
    }

    async fn record_submission(
        &self,
        date: NaiveDate,
        user: &str,
        submission: &Submission,
    ) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        let stored: i32 = RECORD_SUBMISSION
            .key(submissions_key(date))
            .key(scores_key(date))
            .arg(user)
            .arg(serde_json::to_string(submission)?)
            .arg(submission.score)
            .invoke_async(&mut conn)
            .await?;

        Ok(stored == 1)
    }

    async fn cached_rubric(
        &self,
        riddle_id: &str,
        date: NaiveDate,
    ) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection.clone();
        let rubric: Option<String> = conn.get(rubric_key(riddle_id, date)).await?;

        Ok(rubric)
    }

    async fn cache_rubric(
        &self,
        riddle_id: &str,
        date: NaiveDate,
        rubric: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .set_ex(rubric_key(riddle_id, date), rubric, RUBRIC_TTL.as_secs())
            .await?;

        Ok(())
    }

    async fn rank_counts(&self, date: NaiveDate, score: u32) -> Result<RankCounts, StoreError> {
        let mut conn = self.connection.clone();
        let key = scores_key(date);

        let (total, lower, tied): (u64, u64, u64) = redis::pipe()
            .atomic()
            .zcard(&key)
            .zcount(&key, "-inf", format!("({score}"))
            .zcount(&key, score, score)
            .query_async(&mut conn)
            .await?;

        Ok(RankCounts { total, lower, tied })
    }

    async fn top_scores(
        &self,
        date: NaiveDate,
        limit: usize,
    ) -> Result<Vec<(String, u32)>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.connection.clone();
        let top: Vec<(String, f64)> = conn
            .zrevrange_withscores(scores_key(date), 0, limit as isize - 1)
            .await?;

        Ok(top
            .into_iter()
            .map(|(user, score)| (user, score as u32))
            .collect())
    }
}
