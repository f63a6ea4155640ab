//! # Auth
//!
//! Sign-in itself happens between the frontend and Supabase. Every API call carries
//! the Supabase access token as `Authorization: Bearer <token>`, which we hand back to
//! Supabase's `/auth/v1/user` to learn who is calling.
use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::{config::Config, error::AppError, state::State, utils::bearer_token};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {0}")]
    Status(u16),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError>;
}

#[derive(Deserialize)]
struct SupabaseUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: HashMap<String, serde_json::Value>,
}

impl SupabaseUser {
    fn display_name(&self) -> String {
        ["name", "full_name", "user_name"]
            .iter()
            .filter_map(|key| self.user_metadata.get(*key))
            .filter_map(|value| value.as_str())
            .map(str::trim)
            .find(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "anonymous".to_string())
    }
}

pub struct SupabaseAuth {
    client: Client,
    url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(url: &str, anon_key: &str) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AuthError> {
        Self::new(&config.supabase_url, &config.supabase_anon_key)
    }
}

#[async_trait]
impl Authenticator for SupabaseAuth {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.url))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(AuthError::InvalidToken),
            status => return Err(AuthError::Status(status.as_u16())),
        }

        let user: SupabaseUser = response.json().await?;

        Ok(AuthUser {
            name: user.display_name(),
            id: user.id,
        })
    }
}

/// Fixed token table, for tests and running without Supabase.
#[derive(Default)]
pub struct StaticAuth {
    users: HashMap<String, AuthUser>,
}

impl StaticAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, id: &str, name: &str) -> Self {
        self.users.insert(
            token.to_string(),
            AuthUser {
                id: id.to_string(),
                name: name.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl Authenticator for StaticAuth {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        self.users.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}

impl FromRequestParts<Arc<State>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<State>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;

        Ok(state.auth.verify(token).await?)
    }
}
