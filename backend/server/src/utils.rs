use axum::http::{HeaderMap, header::AUTHORIZATION};
use chrono::{NaiveDate, Utc};

use crate::error::AppError;

/// Riddle days roll over at midnight UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Trimmed, non-empty, and at most `max_chars` long.
pub fn clean_text(input: &str, max_chars: usize) -> Result<&str, AppError> {
    let text = input.trim();

    if text.is_empty() || text.chars().count() > max_chars {
        return Err(AppError::MalformedPayload);
    }

    Ok(text)
}
