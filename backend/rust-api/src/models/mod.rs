use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod game;

/// A trivia question. Answers live in their own collection, keyed by
/// `question_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
}

/// One ranked answer of a question. `normalized_player` is the comparison
/// key for guesses; `(question_id, rank)` and `(question_id, normalized_player)`
/// carry unique indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "_id")]
    pub id: String,
    pub question_id: String,
    pub player: String,
    pub normalized_player: String,
    pub rank: i32,
}

/// One row per session token: the question the session is playing and the
/// lives it has left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    #[serde(rename = "_id")]
    pub session_id: String,
    pub question_id: String,
    pub lives: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ledger entry for an evaluated guess, wrong or correct. `(session_id,
/// question_id, normalized_player)` carries a unique index, so a guess can be
/// recorded at most once per session and question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGuess {
    #[serde(rename = "_id")]
    pub id: String,
    pub session_id: String,
    pub question_id: String,
    pub normalized_player: String,
    pub created_at: DateTime<Utc>,
}

/// Canonical comparison form for guesses and answer names: surrounding
/// whitespace stripped, lowercased.
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}
