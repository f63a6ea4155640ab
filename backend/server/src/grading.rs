//! # Grading
//!
//! 1. Normalize the submitted answer
//! 2. Exact match against the canonical answer and its alternates, no LLM involved
//! 3. Otherwise fetch today's calibration rubric for the riddle, generating and caching it on a miss
//! 4. Ask the judge
//!
//! A failing judge fails the whole grading so the player can retry; a failing rubric
//! cache only costs an extra calibration call.
use bank::{Riddle, answers_match, normalize};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{error::AppError, judge::Judge, models::MatchMethod, store::Store};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grading {
    pub correct: bool,
    pub method: MatchMethod,
    pub reason: Option<String>,
}

pub async fn grade(
    store: &dyn Store,
    judge: &dyn Judge,
    date: NaiveDate,
    riddle: &Riddle,
    answer: &str,
) -> Result<Grading, AppError> {
    if normalize(answer).is_empty() {
        return Err(AppError::MalformedPayload);
    }

    if riddle
        .accepted_answers()
        .any(|accepted| answers_match(answer, accepted))
    {
        return Ok(Grading {
            correct: true,
            method: MatchMethod::Exact,
            reason: None,
        });
    }

    let rubric = rubric(store, judge, date, riddle).await?;
    let verdict = judge.judge(riddle, &rubric, answer.trim()).await?;

    Ok(Grading {
        correct: verdict.correct,
        method: MatchMethod::Judge,
        reason: (!verdict.reason.is_empty()).then_some(verdict.reason),
    })
}

async fn rubric(
    store: &dyn Store,
    judge: &dyn Judge,
    date: NaiveDate,
    riddle: &Riddle,
) -> Result<String, AppError> {
    match store.cached_rubric(&riddle.id, date).await {
        Ok(Some(rubric)) => return Ok(rubric),
        Ok(None) => {}
        Err(e) => warn!("Rubric cache read failed for {}: {e}", riddle.id),
    }

    info!("Calibrating rubric for {} on {date}", riddle.id);
    let rubric = judge.calibrate(riddle).await?;

    if let Err(e) = store.cache_rubric(&riddle.id, date, &rubric).await {
        warn!("Rubric cache write failed for {}: {e}", riddle.id);
    }

    Ok(rubric)
}
