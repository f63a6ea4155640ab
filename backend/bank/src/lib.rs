//! # Riddle Bank
//!
//! Pool of riddles the scheduler draws from. Stored as a single JSON file so it can
//! be edited by hand and versioned next to the code.
//!
//! ## Format
//! ```json
//! {
//!   "riddles": [
//!     {
//!       "id": "echo",
//!       "question": "I speak without a mouth and hear without ears. What am I?",
//!       "answer": "An echo",
//!       "alternates": ["echoes"],
//!       "hints": ["You will find me in the mountains.", "I repeat you."]
//!     }
//!   ]
//! }
//! ```
//!
//! `alternates` and `hints` may be omitted.
use std::{fs, path::Path};

use anyhow::{Context, Error};
use serde::{Deserialize, Serialize};

pub mod normalize;
pub mod remote;

pub use normalize::{answers_match, normalize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Riddle {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub alternates: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
}

impl Riddle {
    /// Canonical answer first, then the alternates.
    pub fn accepted_answers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.answer.as_str()).chain(self.alternates.iter().map(String::as_str))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub riddles: Vec<Riddle>,
}

pub fn get_bank(path: impl AsRef<Path>) -> Result<Bank, Error> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading bank at {}", path.display()))?;

    decode_bank(&data)
}

pub fn write_bank(path: impl AsRef<Path>, bank: &Bank) -> Result<(), Error> {
    let path = path.as_ref();
    let data = serde_json::to_vec_pretty(bank)?;

    fs::write(path, data).with_context(|| format!("writing bank to {}", path.display()))
}

pub fn decode_bank(data: &[u8]) -> Result<Bank, Error> {
    Ok(serde_json::from_slice(data)?)
}
