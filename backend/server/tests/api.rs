use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use bank::Riddle;
use http_body_util::BodyExt;
use riddle_server::{
    app,
    auth::StaticAuth,
    config::Config,
    judge::{Judge, JudgeError, Verdict},
    models::{ChatTurn, MAX_MESSAGES},
    state::State,
    store::{MemoryStore, Store},
    utils::today,
};
use serde_json::{Value, json};
use tower::ServiceExt;

const ALICE: &str = "alice-token";
const BOB: &str = "bob-token";

#[derive(Default)]
struct ScriptedJudge {
    fail: bool,
    calibrations: AtomicUsize,
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn calibrate(&self, _riddle: &Riddle) -> Result<String, JudgeError> {
        self.calibrations.fetch_add(1, Ordering::SeqCst);
        Ok("accept reverberation".to_string())
    }

    async fn judge(
        &self,
        _riddle: &Riddle,
        _rubric: &str,
        answer: &str,
    ) -> Result<Verdict, JudgeError> {
        if self.fail {
            return Err(JudgeError::Status {
                status: 503,
                body: "overloaded".to_string(),
            });
        }

        Ok(Verdict {
            correct: answer.contains("reverberation"),
            reason: "judged".to_string(),
        })
    }

    async fn chat(
        &self,
        _riddle: &Riddle,
        history: &[ChatTurn],
        _message: &str,
    ) -> Result<String, JudgeError> {
        Ok(format!("Reply {}", history.len() / 2 + 1))
    }
}

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
    judge: Arc<ScriptedJudge>,
}

fn config() -> Config {
    Config {
        port: 0,
        redis_url: String::new(),
        openai_base_url: String::new(),
        openai_model: "test".to_string(),
        openai_key: String::new(),
        supabase_url: String::new(),
        supabase_anon_key: String::new(),
        cors_origin: "http://localhost:5173".to_string(),
        scoreboard_size: 10,
    }
}

fn echo() -> Riddle {
    Riddle {
        id: "echo".to_string(),
        question: "I speak without a mouth and hear without ears. What am I?".to_string(),
        answer: "An echo".to_string(),
        alternates: vec!["echoes".to_string()],
        hints: vec![
            "Mountains are full of me.".to_string(),
            "I repeat you.".to_string(),
        ],
    }
}

async fn harness_with(judge: ScriptedJudge) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let judge = Arc::new(judge);
    let auth = StaticAuth::new()
        .with_user(ALICE, "u-alice", "Alice")
        .with_user(BOB, "u-bob", "Bob");

    store.put_riddle(today(), &echo()).await.unwrap();

    let state = State::with_parts(config(), store.clone(), judge.clone(), Arc::new(auth));

    Harness {
        app: app(state),
        store,
        judge,
    }
}

async fn harness() -> Harness {
    harness_with(ScriptedJudge::default()).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();

    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn submit(app: &Router, token: &str, answer: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/riddle/submit",
        Some(token),
        Some(json!({ "answer": answer })),
    )
    .await
}

#[tokio::test]
async fn test_health() {
    let h = harness().await;
    let (status, _) = send(&h.app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_requires_auth() {
    let h = harness().await;

    let (status, _) = send(&h.app, "GET", "/api/riddle/today", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&h.app, "GET", "/api/riddle/today", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_no_riddle_scheduled() {
    let store = Arc::new(MemoryStore::new());
    let state = State::with_parts(
        config(),
        store,
        Arc::new(ScriptedJudge::default()),
        Arc::new(StaticAuth::new().with_user(ALICE, "u-alice", "Alice")),
    );
    let app = app(state);

    let (status, _) = send(&app, "GET", "/api/riddle/today", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_today_hides_answer_and_starts_clock() {
    let h = harness().await;

    let (status, body) = send(&h.app, "GET", "/api/riddle/today", Some(ALICE), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "echo");
    assert_eq!(body["hint_count"], 2);
    assert_eq!(body["hints"], json!([]));
    assert_eq!(body["messages_left"], MAX_MESSAGES);
    assert!(body["submission"].is_null());
    assert!(!body.to_string().contains("An echo"));

    let attempt = h.store.attempt(today(), "u-alice").await.unwrap();
    assert!(attempt.is_some());

    let (_, again) = send(&h.app, "GET", "/api/riddle/today", Some(ALICE), None).await;
    assert_eq!(again["started_at"], body["started_at"]);
}

#[tokio::test]
async fn test_hints_run_out() {
    let h = harness().await;

    let (status, first) = send(&h.app, "POST", "/api/riddle/hint", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["hint"], "Mountains are full of me.");
    assert_eq!(first["hints_left"], 1);

    let (_, second) = send(&h.app, "POST", "/api/riddle/hint", Some(ALICE), None).await;
    assert_eq!(second["hint"], "I repeat you.");
    assert_eq!(second["hints_used"], 2);

    let (status, _) = send(&h.app, "POST", "/api/riddle/hint", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, today) = send(&h.app, "GET", "/api/riddle/today", Some(ALICE), None).await;
    assert_eq!(today["hints"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_chat_limit() {
    let h = harness().await;
    let ask = |message: &'static str| {
        let app = h.app.clone();
        async move {
            send(
                &app,
                "POST",
                "/api/riddle/chat",
                Some(ALICE),
                Some(json!({ "message": message })),
            )
            .await
        }
    };

    let (status, _) = ask("   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ask("Is it alive?").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Reply 1");
    assert_eq!(body["messages_left"], MAX_MESSAGES - 1);

    for _ in 1..MAX_MESSAGES {
        let (status, _) = ask("Another question?").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = ask("One more?").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (_, today) = send(&h.app, "GET", "/api/riddle/today", Some(ALICE), None).await;
    assert_eq!(
        today["chat"].as_array().unwrap().len(),
        2 * MAX_MESSAGES as usize
    );
    assert_eq!(today["messages_left"], 0);
}

#[tokio::test]
async fn test_exact_submission() {
    let h = harness().await;
    send(&h.app, "GET", "/api/riddle/today", Some(ALICE), None).await;

    let (status, body) = submit(&h.app, ALICE, "  an ECHO! ").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["correct"], true);
    assert_eq!(body["method"], "exact");
    assert_eq!(body["solution"], "An echo");
    assert_eq!(body["answer"], "an ECHO!");
    let score = body["score"].as_u64().unwrap();
    assert!((190..=200).contains(&score), "score was {score}");
    assert_eq!(body["ranking"], json!({ "rank": 1, "percentile": 100, "total": 1 }));

    assert_eq!(h.judge.calibrations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_one_submission_per_day() {
    let h = harness().await;

    let (status, _) = submit(&h.app, ALICE, "a shadow").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = submit(&h.app, ALICE, "an echo").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&h.app, "POST", "/api/riddle/hint", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let stored = h.store.submission(today(), "u-alice").await.unwrap().unwrap();
    assert!(!stored.correct);
}

#[tokio::test]
async fn test_judged_submission_and_ranking() {
    let h = harness().await;

    let (_, alice) = submit(&h.app, ALICE, "reverberation of sound").await;
    assert_eq!(alice["correct"], true);
    assert_eq!(alice["method"], "judge");
    assert_eq!(alice["reason"], "judged");

    let (_, bob) = submit(&h.app, BOB, "a shadow").await;
    assert_eq!(bob["correct"], false);
    assert_eq!(bob["score"], 0);
    assert_eq!(bob["ranking"], json!({ "rank": 2, "percentile": 50, "total": 2 }));

    assert_eq!(h.judge.calibrations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_hint_penalty_applied() {
    let h = harness().await;
    send(&h.app, "POST", "/api/riddle/hint", Some(ALICE), None).await;

    let (_, body) = submit(&h.app, ALICE, "echoes").await;
    let score = body["score"].as_u64().unwrap();

    assert!((175..=185).contains(&score), "score was {score}");
}

#[tokio::test]
async fn test_judge_outage_allows_retry() {
    let h = harness_with(ScriptedJudge {
        fail: true,
        ..Default::default()
    })
    .await;

    let (status, _) = submit(&h.app, ALICE, "reverberation").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(h.store.submission(today(), "u-alice").await.unwrap().is_none());

    let (status, body) = submit(&h.app, ALICE, "An echo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["correct"], true);
}

#[tokio::test]
async fn test_blank_answer_rejected() {
    let h = harness().await;

    let (status, _) = submit(&h.app, ALICE, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = submit(&h.app, ALICE, "?!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(h.store.submission(today(), "u-alice").await.unwrap().is_none());
}

#[tokio::test]
async fn test_scoreboard() {
    let h = harness().await;
    submit(&h.app, BOB, "a shadow").await;
    submit(&h.app, ALICE, "an echo").await;

    let (status, board) = send(&h.app, "GET", "/api/scoreboard", Some(BOB), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["total"], 2);
    assert_eq!(board["entries"][0]["name"], "Alice");
    assert_eq!(board["entries"][0]["rank"], 1);
    assert_eq!(board["entries"][1]["name"], "Bob");
    assert_eq!(board["entries"][1]["score"], 0);
    assert_eq!(board["me"]["rank"], 2);

    let uri = format!("/api/scoreboard?date={}", today().pred_opt().unwrap());
    let (status, empty) = send(&h.app, "GET", &uri, Some(BOB), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["total"], 0);
    assert!(empty["me"].is_null());

    let (status, _) = send(&h.app, "GET", "/api/scoreboard?date=yesterday", Some(BOB), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_archive() {
    let h = harness().await;
    let yesterday = today().pred_opt().unwrap();
    let mut old = echo();
    old.id = "map".to_string();
    old.answer = "A map".to_string();
    h.store.put_riddle(yesterday, &old).await.unwrap();

    let (status, body) = send(
        &h.app,
        "GET",
        &format!("/api/riddle/archive/{yesterday}"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "A map");
    assert_eq!(body["id"], "map");

    let (status, _) = send(
        &h.app,
        "GET",
        &format!("/api/riddle/archive/{}", today()),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
