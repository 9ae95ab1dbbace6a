use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Question;

/// Player-visible session status. `won`/`lost` are absorbing until a reset or
/// a question reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Active,
    Won,
    Lost,
}

impl GameStatus {
    /// Single source of truth for the session state machine: winning is
    /// judged against the question's own answer count, losing against lives.
    pub fn derive(found: usize, total_answers: u64, lives: i32) -> Self {
        if found as u64 >= total_answers {
            GameStatus::Won
        } else if lives <= 0 {
            GameStatus::Lost
        } else {
            GameStatus::Active
        }
    }
}

/// Question as exposed over the API (the ranked answers stay hidden).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: String,
    pub text: String,
}

impl From<Question> for QuestionView {
    fn from(question: Question) -> Self {
        Self {
            id: question.id,
            text: question.text,
        }
    }
}

/// A revealed answer: canonical display name plus its rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerView {
    pub player: String,
    pub rank: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub lives: i32,
    pub found: usize,
    pub correct_guesses: Vec<AnswerView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessResult {
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GuessResult {
    pub fn correct(player: String, rank: i32) -> Self {
        Self {
            correct: true,
            player: Some(player),
            rank: Some(rank),
            message: Some("Correct".to_string()),
        }
    }

    pub fn wrong() -> Self {
        Self {
            correct: false,
            player: None,
            rank: None,
            message: Some("Wrong guess".to_string()),
        }
    }

    pub fn already_guessed() -> Self {
        Self {
            correct: false,
            player: None,
            rank: None,
            message: Some("Already guessed".to_string()),
        }
    }

    pub fn game_over() -> Self {
        Self {
            correct: false,
            player: None,
            rank: None,
            message: Some("Game over".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessResponse {
    pub result: GuessResult,
    pub state: GameState,
    pub status: GameStatus,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GuessRequest {
    #[validate(length(min = 1, message = "Question ID is required"))]
    pub question_id: String,

    #[validate(length(
        min = 1,
        max = 50,
        message = "Guess must be between 1 and 50 characters"
    ))]
    pub guess: String,
}

/// Query params for `GET /question`: an explicit pick, a forced fresh pick,
/// or neither for "current question or a random one".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionQuery {
    pub question_id: Option<String>,
    #[serde(default)]
    pub new: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswersQuery {
    pub question_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(
        min = 1,
        max = 300,
        message = "Question text must be between 1 and 300 characters"
    ))]
    pub question: String,

    #[validate(length(min = 1, message = "Answers required"))]
    pub answers: Vec<CreateAnswerRequest>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateAnswerRequest {
    pub player: String,
    pub rank: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derivation_covers_the_state_machine() {
        assert_eq!(GameStatus::derive(0, 10, 3), GameStatus::Active);
        assert_eq!(GameStatus::derive(9, 10, 1), GameStatus::Active);
        assert_eq!(GameStatus::derive(10, 10, 1), GameStatus::Won);
        // winning takes precedence even at zero lives
        assert_eq!(GameStatus::derive(10, 10, 0), GameStatus::Won);
        assert_eq!(GameStatus::derive(3, 10, 0), GameStatus::Lost);
        assert_eq!(GameStatus::derive(3, 10, -1), GameStatus::Lost);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(GameStatus::Active).unwrap(),
            serde_json::json!("active")
        );
        assert_eq!(
            serde_json::to_value(GameStatus::Won).unwrap(),
            serde_json::json!("won")
        );
        assert_eq!(
            serde_json::to_value(GameStatus::Lost).unwrap(),
            serde_json::json!("lost")
        );
    }

    #[test]
    fn guess_result_omits_absent_fields() {
        let wrong = serde_json::to_value(GuessResult::wrong()).unwrap();
        assert_eq!(wrong["correct"], false);
        assert_eq!(wrong["message"], "Wrong guess");
        assert!(wrong.get("player").is_none());
        assert!(wrong.get("rank").is_none());

        let correct =
            serde_json::to_value(GuessResult::correct("Sachin Tendulkar".to_string(), 1)).unwrap();
        assert_eq!(correct["correct"], true);
        assert_eq!(correct["player"], "Sachin Tendulkar");
        assert_eq!(correct["rank"], 1);
    }

    #[test]
    fn game_state_uses_camel_case_on_the_wire() {
        let state = GameState {
            lives: 3,
            found: 1,
            correct_guesses: vec![AnswerView {
                player: "Sachin Tendulkar".to_string(),
                rank: 1,
            }],
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["lives"], 3);
        assert_eq!(json["found"], 1);
        assert_eq!(json["correctGuesses"][0]["player"], "Sachin Tendulkar");
        assert_eq!(json["correctGuesses"][0]["rank"], 1);
    }

    #[test]
    fn guess_request_validates_length() {
        let ok = GuessRequest {
            question_id: "q1".to_string(),
            guess: "Sachin Tendulkar".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty = GuessRequest {
            question_id: "q1".to_string(),
            guess: String::new(),
        };
        assert!(empty.validate().is_err());

        let oversized = GuessRequest {
            question_id: "q1".to_string(),
            guess: "x".repeat(51),
        };
        assert!(oversized.validate().is_err());
    }
}
