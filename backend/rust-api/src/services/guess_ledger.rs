use std::collections::HashSet;

use chrono::Utc;
use mongodb::bson::doc;
use mongodb::{ClientSession, Database};
use uuid::Uuid;

use crate::models::SessionGuess;
use crate::services::error::GameResult;

/// Append-only record of evaluated guesses per (session, question), wrong
/// guesses included: recording them is what makes a resubmitted wrong guess
/// a duplicate instead of a second life decrement. The unique index on
/// `(session_id, question_id, normalized_player)` is the authoritative
/// duplicate guard; [`Self::record_tx`] lets its violation bubble up so the
/// evaluator can fold the race into "Already guessed".
pub struct GuessLedger {
    mongo: Database,
}

impl GuessLedger {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn contains_tx(
        &self,
        tx: &mut ClientSession,
        session_id: &str,
        question_id: &str,
        normalized_player: &str,
    ) -> GameResult<bool> {
        let guesses = self.mongo.collection::<SessionGuess>("guesses");
        Ok(guesses
            .find_one(doc! {
                "session_id": session_id,
                "question_id": question_id,
                "normalized_player": normalized_player,
            })
            .session(&mut *tx)
            .await?
            .is_some())
    }

    pub async fn record_tx(
        &self,
        tx: &mut ClientSession,
        session_id: &str,
        question_id: &str,
        normalized_player: &str,
    ) -> GameResult<()> {
        let guesses = self.mongo.collection::<SessionGuess>("guesses");
        let entry = SessionGuess {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            question_id: question_id.to_string(),
            normalized_player: normalized_player.to_string(),
            created_at: Utc::now(),
        };
        guesses.insert_one(&entry).session(&mut *tx).await?;
        Ok(())
    }

    /// Every normalized name the session has had evaluated for this question.
    pub async fn guessed_names(
        &self,
        session_id: &str,
        question_id: &str,
    ) -> GameResult<HashSet<String>> {
        let guesses = self.mongo.collection::<SessionGuess>("guesses");
        let mut cursor = guesses
            .find(doc! { "session_id": session_id, "question_id": question_id })
            .await?;

        let mut names = HashSet::new();
        while cursor.advance().await? {
            names.insert(cursor.deserialize_current()?.normalized_player);
        }
        Ok(names)
    }

    /// Delete every guess the session has recorded, across all questions.
    /// Sessions own their ledger entries; reassignment and reset both clear
    /// the whole ledger for the token.
    pub async fn clear_session_tx(
        &self,
        tx: &mut ClientSession,
        session_id: &str,
    ) -> GameResult<()> {
        let guesses = self.mongo.collection::<SessionGuess>("guesses");
        guesses
            .delete_many(doc! { "session_id": session_id })
            .session(&mut *tx)
            .await?;
        Ok(())
    }
}
