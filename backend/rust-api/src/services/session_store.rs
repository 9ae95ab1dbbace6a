use chrono::Utc;
use mongodb::bson::doc;
use mongodb::{Client, ClientSession, Database};

use crate::metrics::GAME_SESSIONS_TOTAL;
use crate::models::GameSession;
use crate::services::error::GameResult;
use crate::services::guess_ledger::GuessLedger;

/// One row per session token. Creation is an upsert keyed on the token, so
/// two first-contact requests for the same token converge on a single row
/// instead of racing an insert.
pub struct SessionStore {
    client: Client,
    mongo: Database,
    initial_lives: i32,
}

impl SessionStore {
    pub fn new(client: Client, mongo: Database, initial_lives: i32) -> Self {
        Self {
            client,
            mongo,
            initial_lives,
        }
    }

    pub async fn get(&self, session_id: &str) -> GameResult<Option<GameSession>> {
        let sessions = self.mongo.collection::<GameSession>("sessions");
        Ok(sessions.find_one(doc! { "_id": session_id }).await?)
    }

    /// Get-or-create inside its own transaction. Used by the question
    /// resolution flow; the guess flow calls [`Self::resolve_or_create_tx`]
    /// inside the evaluator's transaction instead.
    pub async fn resolve_or_create(
        &self,
        session_id: &str,
        question_id: &str,
    ) -> GameResult<GameSession> {
        let mut tx = self.client.start_session().await?;
        tx.start_transaction().await?;

        match self.resolve_or_create_tx(&mut tx, session_id, question_id).await {
            Ok(session) => {
                tx.commit_transaction().await?;
                Ok(session)
            }
            Err(e) => {
                let _ = tx.abort_transaction().await;
                Err(e)
            }
        }
    }

    /// Get-or-create the row for this token. A differing question id is a
    /// reassignment: lives reset to the initial value and every guess the
    /// session has recorded is deleted, atomically with the session update.
    pub async fn resolve_or_create_tx(
        &self,
        tx: &mut ClientSession,
        session_id: &str,
        question_id: &str,
    ) -> GameResult<GameSession> {
        let sessions = self.mongo.collection::<GameSession>("sessions");
        let now = Utc::now();

        let upsert = sessions
            .update_one(
                doc! { "_id": session_id },
                doc! { "$setOnInsert": {
                    "question_id": question_id,
                    "lives": self.initial_lives,
                    "created_at": now.to_rfc3339(),
                    "updated_at": now.to_rfc3339(),
                } },
            )
            .upsert(true)
            .session(&mut *tx)
            .await?;

        if upsert.upserted_id.is_some() {
            GAME_SESSIONS_TOTAL.with_label_values(&["created"]).inc();
            tracing::info!("Session {} created for question {}", session_id, question_id);
            return Ok(GameSession {
                session_id: session_id.to_string(),
                question_id: question_id.to_string(),
                lives: self.initial_lives,
                created_at: now,
                updated_at: now,
            });
        }

        let mut session = sessions
            .find_one(doc! { "_id": session_id })
            .session(&mut *tx)
            .await?
            .ok_or_else(|| mongodb::error::Error::custom("session vanished after upsert"))?;

        if session.question_id != question_id {
            sessions
                .update_one(
                    doc! { "_id": session_id },
                    doc! { "$set": {
                        "question_id": question_id,
                        "lives": self.initial_lives,
                        "updated_at": now.to_rfc3339(),
                    } },
                )
                .session(&mut *tx)
                .await?;

            GuessLedger::new(self.mongo.clone())
                .clear_session_tx(tx, session_id)
                .await?;

            GAME_SESSIONS_TOTAL.with_label_values(&["reassigned"]).inc();
            tracing::info!(
                "Session {} reassigned from question {} to {}",
                session_id,
                session.question_id,
                question_id
            );

            session.question_id = question_id.to_string();
            session.lives = self.initial_lives;
            session.updated_at = now;
        }

        Ok(session)
    }

    /// Restore lives and clear the ledger without changing the token.
    /// A no-op when the session does not exist.
    pub async fn reset(&self, session_id: &str) -> GameResult<()> {
        let mut tx = self.client.start_session().await?;
        tx.start_transaction().await?;

        match self.reset_tx(&mut tx, session_id).await {
            Ok(()) => {
                tx.commit_transaction().await?;
                Ok(())
            }
            Err(e) => {
                let _ = tx.abort_transaction().await;
                Err(e)
            }
        }
    }

    async fn reset_tx(&self, tx: &mut ClientSession, session_id: &str) -> GameResult<()> {
        let sessions = self.mongo.collection::<GameSession>("sessions");

        let updated = sessions
            .update_one(
                doc! { "_id": session_id },
                doc! { "$set": {
                    "lives": self.initial_lives,
                    "updated_at": Utc::now().to_rfc3339(),
                } },
            )
            .session(&mut *tx)
            .await?;

        if updated.matched_count == 0 {
            return Ok(());
        }

        GuessLedger::new(self.mongo.clone())
            .clear_session_tx(tx, session_id)
            .await?;

        GAME_SESSIONS_TOTAL.with_label_values(&["reset"]).inc();
        tracing::info!("Session {} reset", session_id);

        Ok(())
    }

    /// Guarded decrement: lives never drop below zero, even when concurrent
    /// wrong guesses race past the evaluator's short-circuit.
    pub async fn decrement_lives_tx(
        &self,
        tx: &mut ClientSession,
        session_id: &str,
    ) -> GameResult<()> {
        let sessions = self.mongo.collection::<GameSession>("sessions");
        sessions
            .update_one(
                doc! { "_id": session_id, "lives": { "$gt": 0 } },
                doc! {
                    "$inc": { "lives": -1 },
                    "$set": { "updated_at": Utc::now().to_rfc3339() },
                },
            )
            .session(&mut *tx)
            .await?;
        Ok(())
    }
}
