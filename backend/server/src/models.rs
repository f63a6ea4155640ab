use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_MESSAGES: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Player,
    Master,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub content: String,
}

/// A user's progress on one day's riddle, before the answer is in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub hints_used: u32,
    #[serde(default)]
    pub chat: Vec<ChatTurn>,
}

impl Attempt {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            hints_used: 0,
            chat: Vec::new(),
        }
    }

    pub fn messages_sent(&self) -> u32 {
        self.chat
            .iter()
            .filter(|turn| turn.speaker == Speaker::Player)
            .count() as u32
    }

    pub fn messages_left(&self) -> u32 {
        MAX_MESSAGES.saturating_sub(self.messages_sent())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Exact,
    Judge,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub name: String,
    pub answer: String,
    pub correct: bool,
    pub method: MatchMethod,
    pub reason: Option<String>,
    pub score: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Total scored, strictly lower, and tied player counts for one score on one day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RankCounts {
    pub total: u64,
    pub lower: u64,
    pub tied: u64,
}
