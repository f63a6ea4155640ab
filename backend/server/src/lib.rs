//! Documentation of a daily riddle platform.
//!
//!
//!
//! # General Infrastructure
//! - Frontend signs users in with Supabase and calls this server with the Supabase access token
//! - Server verifies the token with Supabase on every request, no sessions of its own
//! - Redis holds riddles, attempts, submissions, and the daily score sets
//! - An OpenAI compatible endpoint judges answers and plays the riddle master
//!
//!
//!
//! # Answer Pipeline
//!
//! **Goal**: Only pay for an LLM call when a string comparison cannot decide.
//!
//! - Normalize the answer: lowercase, strip diacritics, collapse punctuation and whitespace
//! - Exact match against the official answer and its alternates
//! - Otherwise judge with the LLM, guided by a rubric generated once per riddle per day
//! - Score: base points plus a time bonus that fades over 10 minutes, minus hint and message penalties
//! - Percentile from three counts over the day's scores: total, strictly lower, tied
//!
//! Each user gets exactly one submission per day. Redis writes the submission and the score
//! in a single script, so concurrent submits cannot both land.
//!
//!
//!
//! # Endpoints
//!
//! | Method | Path | |
//! |---|---|---|
//! | GET | `/health` | liveness |
//! | GET | `/api/riddle/today` | riddle, own progress; starts the clock |
//! | POST | `/api/riddle/hint` | reveal next hint |
//! | POST | `/api/riddle/chat` | ask the riddle master |
//! | POST | `/api/riddle/submit` | grade, score, rank |
//! | GET | `/api/riddle/archive/{date}` | past riddle with answer |
//! | GET | `/api/scoreboard?date=` | top scores and own percentile |
//!
//!
//!
//! # Setup
//!
//! Secrets are read from `/run/secrets/` and fall back to environment variables.
//! ```sh
//! export OPENAI_API_KEY=...
//! export SUPABASE_ANON_KEY=...
//! REDIS_URL=redis://localhost:6379 RUST_LOG=info cargo run -p riddle
//! ```
//!
//! Seed riddles.
//! ```sh
//! cargo run -p tester
//! cargo run -p process -- ../bank.json --days 30
//! ```
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Error;
use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod grading;
pub mod judge;
pub mod models;
pub mod ranking;
pub mod routes;
pub mod scoring;
pub mod state;
pub mod store;
pub mod utils;

use routes::{
    archive_handler, chat_handler, health_handler, hint_handler, scoreboard_handler,
    submit_handler, today_handler,
};
use state::State;

pub async fn start_server() -> Result<(), Error> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    let app = app(state);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

pub fn app(state: Arc<State>) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    match state.config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => warn!("Invalid CORS_ORIGIN {}: {e}", state.config.cors_origin),
    }

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/riddle/today", get(today_handler))
        .route("/api/riddle/hint", post(hint_handler))
        .route("/api/riddle/chat", post(chat_handler))
        .route("/api/riddle/submit", post(submit_handler))
        .route("/api/riddle/archive/{date}", get(archive_handler))
        .route("/api/scoreboard", get(scoreboard_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
