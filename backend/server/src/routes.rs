use std::sync::Arc;

use axum::{
    Json,
    extract::{self, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use bank::Riddle;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    auth::AuthUser,
    error::AppError,
    grading::grade,
    models::{Attempt, ChatTurn, MatchMethod, Speaker, Submission},
    ranking::{Ranking, competition_ranks, percentile},
    scoring::{ScoreInputs, compute_score},
    state::State,
    utils::{clean_text, today},
};

pub const MAX_ANSWER_CHARS: usize = 200;
pub const MAX_MESSAGE_CHARS: usize = 500;

#[derive(Deserialize)]
pub struct AnswerPayload {
    answer: String,
}

#[derive(Deserialize)]
pub struct ChatPayload {
    message: String,
}

#[derive(Deserialize)]
pub struct ScoreboardQuery {
    date: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct SubmissionView {
    pub answer: String,
    pub correct: bool,
    pub method: MatchMethod,
    pub reason: Option<String>,
    pub score: u32,
    pub solution: String,
    pub ranking: Ranking,
}

#[derive(Serialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub id: String,
    pub question: String,
    pub hint_count: usize,
    pub hints: Vec<String>,
    pub chat: Vec<ChatTurn>,
    pub messages_left: u32,
    pub started_at: DateTime<Utc>,
    pub submission: Option<SubmissionView>,
}

#[derive(Serialize)]
pub struct HintResponse {
    pub hint: String,
    pub hints_used: u32,
    pub hints_left: usize,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub messages_left: u32,
}

#[derive(Serialize)]
pub struct ScoreboardEntry {
    pub rank: u64,
    pub name: String,
    pub score: u32,
}

#[derive(Serialize)]
pub struct ScoreboardResponse {
    pub date: NaiveDate,
    pub total: u64,
    pub entries: Vec<ScoreboardEntry>,
    pub me: Option<Ranking>,
}

#[derive(Serialize)]
pub struct ArchiveResponse {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub riddle: Riddle,
}

async fn todays_riddle(state: &State) -> Result<(NaiveDate, Riddle), AppError> {
    let date = today();
    let riddle = state
        .store
        .riddle(date)
        .await?
        .ok_or(AppError::RiddleNotFound)?;

    Ok((date, riddle))
}

async fn load_or_start(state: &State, date: NaiveDate, user: &AuthUser) -> Result<Attempt, AppError> {
    if let Some(attempt) = state.store.attempt(date, &user.id).await? {
        return Ok(attempt);
    }

    let attempt = Attempt::new(Utc::now());
    state.store.save_attempt(date, &user.id, &attempt).await?;
    info!("{} started the {date} riddle", user.id);

    Ok(attempt)
}

async fn ensure_open(state: &State, date: NaiveDate, user: &AuthUser) -> Result<(), AppError> {
    match state.store.submission(date, &user.id).await? {
        Some(_) => Err(AppError::AlreadySubmitted),
        None => Ok(()),
    }
}

async fn submission_view(
    state: &State,
    date: NaiveDate,
    riddle: &Riddle,
    submission: Submission,
) -> Result<SubmissionView, AppError> {
    let counts = state.store.rank_counts(date, submission.score).await?;

    Ok(SubmissionView {
        answer: submission.answer,
        correct: submission.correct,
        method: submission.method,
        reason: submission.reason,
        score: submission.score,
        solution: riddle.answer.clone(),
        ranking: percentile(counts),
    })
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok").into_response()
}

pub async fn today_handler(
    extract::State(state): extract::State<Arc<State>>,
    user: AuthUser,
) -> Result<Json<TodayResponse>, AppError> {
    let (date, riddle) = todays_riddle(&state).await?;
    let attempt = load_or_start(&state, date, &user).await?;

    let submission = match state.store.submission(date, &user.id).await? {
        Some(submission) => Some(submission_view(&state, date, &riddle, submission).await?),
        None => None,
    };

    let revealed = (attempt.hints_used as usize).min(riddle.hints.len());

    Ok(Json(TodayResponse {
        date,
        hint_count: riddle.hints.len(),
        hints: riddle.hints[..revealed].to_vec(),
        messages_left: attempt.messages_left(),
        started_at: attempt.started_at,
        chat: attempt.chat,
        id: riddle.id,
        question: riddle.question,
        submission,
    }))
}

pub async fn hint_handler(
    extract::State(state): extract::State<Arc<State>>,
    user: AuthUser,
) -> Result<Json<HintResponse>, AppError> {
    let (date, riddle) = todays_riddle(&state).await?;
    ensure_open(&state, date, &user).await?;

    let mut attempt = load_or_start(&state, date, &user).await?;
    let Some(hint) = riddle.hints.get(attempt.hints_used as usize).cloned() else {
        return Err(AppError::NoHintsLeft);
    };

    attempt.hints_used += 1;
    state.store.save_attempt(date, &user.id, &attempt).await?;

    Ok(Json(HintResponse {
        hint,
        hints_used: attempt.hints_used,
        hints_left: riddle.hints.len() - attempt.hints_used as usize,
    }))
}

pub async fn chat_handler(
    extract::State(state): extract::State<Arc<State>>,
    user: AuthUser,
    Json(payload): Json<ChatPayload>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = clean_text(&payload.message, MAX_MESSAGE_CHARS)?;
    let (date, riddle) = todays_riddle(&state).await?;
    ensure_open(&state, date, &user).await?;

    let mut attempt = load_or_start(&state, date, &user).await?;
    if attempt.messages_left() == 0 {
        return Err(AppError::MessageLimit);
    }

    let reply = state.judge.chat(&riddle, &attempt.chat, message).await?;

    attempt.chat.push(ChatTurn {
        speaker: Speaker::Player,
        content: message.to_string(),
    });
    attempt.chat.push(ChatTurn {
        speaker: Speaker::Master,
        content: reply.clone(),
    });
    state.store.save_attempt(date, &user.id, &attempt).await?;

    Ok(Json(ChatResponse {
        reply,
        messages_left: attempt.messages_left(),
    }))
}

pub async fn submit_handler(
    extract::State(state): extract::State<Arc<State>>,
    user: AuthUser,
    Json(payload): Json<AnswerPayload>,
) -> Result<Json<SubmissionView>, AppError> {
    let answer = clean_text(&payload.answer, MAX_ANSWER_CHARS)?;
    let (date, riddle) = todays_riddle(&state).await?;
    ensure_open(&state, date, &user).await?;

    let attempt = load_or_start(&state, date, &user).await?;
    let grading = grade(
        state.store.as_ref(),
        state.judge.as_ref(),
        date,
        &riddle,
        answer,
    )
    .await?;

    let submitted_at = Utc::now();
    let score = compute_score(ScoreInputs {
        correct: grading.correct,
        elapsed: submitted_at - attempt.started_at,
        hints_used: attempt.hints_used,
        messages_sent: attempt.messages_sent(),
    });

    let submission = Submission {
        name: user.name.clone(),
        answer: answer.to_string(),
        correct: grading.correct,
        method: grading.method,
        reason: grading.reason,
        score,
        submitted_at,
    };

    if !state
        .store
        .record_submission(date, &user.id, &submission)
        .await?
    {
        return Err(AppError::AlreadySubmitted);
    }

    info!(
        "{} answered the {date} riddle: correct={} method={:?} score={score}",
        user.id, submission.correct, submission.method
    );

    Ok(Json(
        submission_view(&state, date, &riddle, submission).await?,
    ))
}

pub async fn scoreboard_handler(
    extract::State(state): extract::State<Arc<State>>,
    user: AuthUser,
    Query(query): Query<ScoreboardQuery>,
) -> Result<Json<ScoreboardResponse>, AppError> {
    let date = query.date.unwrap_or_else(today);

    let top = state
        .store
        .top_scores(date, state.config.scoreboard_size)
        .await?;
    let scores: Vec<u32> = top.iter().map(|(_, score)| *score).collect();
    let ranks = competition_ranks(&scores);

    let mut entries = Vec::with_capacity(top.len());
    for ((user_id, score), rank) in top.into_iter().zip(ranks) {
        let name = state
            .store
            .submission(date, &user_id)
            .await?
            .map(|submission| submission.name)
            .unwrap_or_else(|| "anonymous".to_string());

        entries.push(ScoreboardEntry { rank, name, score });
    }

    let me = match state.store.submission(date, &user.id).await? {
        Some(submission) => Some(percentile(
            state.store.rank_counts(date, submission.score).await?,
        )),
        None => None,
    };

    let total = match me {
        Some(ranking) => ranking.total,
        None => state.store.rank_counts(date, 0).await?.total,
    };

    Ok(Json(ScoreboardResponse {
        date,
        total,
        entries,
        me,
    }))
}

pub async fn archive_handler(
    extract::State(state): extract::State<Arc<State>>,
    _user: AuthUser,
    Path(date): Path<NaiveDate>,
) -> Result<Json<ArchiveResponse>, AppError> {
    if date >= today() {
        return Err(AppError::RiddleNotFound);
    }

    let riddle = state
        .store
        .riddle(date)
        .await?
        .ok_or(AppError::RiddleNotFound)?;

    Ok(Json(ArchiveResponse { date, riddle }))
}
