use mongodb::bson::doc;
use mongodb::Database;

use crate::models::game::{AnswerView, GameState};
use crate::models::{Answer, GameSession};
use crate::services::error::GameResult;
use crate::services::guess_ledger::GuessLedger;

/// Joins the guess ledger against the answer catalog to produce the
/// player-visible state. Read-only; invoked after every state-changing
/// operation and directly by the state endpoint.
pub struct StateProjector {
    mongo: Database,
    initial_lives: i32,
}

impl StateProjector {
    pub fn new(mongo: Database, initial_lives: i32) -> Self {
        Self {
            mongo,
            initial_lives,
        }
    }

    /// A token that has never played projects as a fresh session without one
    /// being materialized.
    pub async fn project(&self, session_id: &str) -> GameResult<GameState> {
        let sessions = self.mongo.collection::<GameSession>("sessions");
        let Some(session) = sessions.find_one(doc! { "_id": session_id }).await? else {
            return Ok(GameState {
                lives: self.initial_lives,
                found: 0,
                correct_guesses: Vec::new(),
            });
        };

        let guessed = GuessLedger::new(self.mongo.clone())
            .guessed_names(session_id, &session.question_id)
            .await?;

        // Answers come back rank-ascending; keeping only the guessed ones
        // preserves that order for the projection. Wrong guesses in the
        // ledger match no answer and fall out of the join.
        let answers = self.mongo.collection::<Answer>("answers");
        let mut cursor = answers
            .find(doc! { "question_id": &session.question_id })
            .sort(doc! { "rank": 1 })
            .await?;

        let mut correct_guesses = Vec::new();
        while cursor.advance().await? {
            let answer = cursor.deserialize_current()?;
            if guessed.contains(&answer.normalized_player) {
                correct_guesses.push(AnswerView {
                    player: answer.player,
                    rank: answer.rank,
                });
            }
        }

        Ok(GameState {
            lives: session.lives,
            found: correct_guesses.len(),
            correct_guesses,
        })
    }
}
