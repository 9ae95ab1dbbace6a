use mongodb::error::{TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT};
use mongodb::{Client, ClientSession, Database};

use crate::metrics::{GAMES_FINISHED_TOTAL, GUESSES_TOTAL};
use crate::models::game::{GameStatus, GuessResponse, GuessResult};
use crate::models::{normalize, Answer};
use crate::services::error::{is_duplicate_key, GameError, GameResult};
use crate::services::guess_ledger::GuessLedger;
use crate::services::question_catalog::QuestionCatalog;
use crate::services::session_store::SessionStore;
use crate::services::state_projector::StateProjector;

/// Transient transaction errors (e.g. write conflicts between two guesses
/// touching the same session) are retried this many times before the request
/// fails and the caller retries.
const MAX_TX_ATTEMPTS: u32 = 3;

/// What a single evaluation decided, before the projected state is attached.
enum Outcome {
    GameOver,
    Duplicate,
    Correct(Answer),
    Wrong,
}

/// Outcome of the transactional phase. `Duplicate` covers the lost insert
/// race: the unique ledger index rejected our row, so some other request
/// already recorded this exact guess.
enum TxAbort {
    Duplicate,
    Error(GameError),
}

/// Orchestrates one guess: validation, session resolution, duplicate
/// detection, correctness lookup and the life decrement, all inside one
/// MongoDB transaction so a guess is either fully applied or not at all.
pub struct GuessEvaluator {
    client: Client,
    mongo: Database,
    initial_lives: i32,
    max_guess_length: usize,
}

impl GuessEvaluator {
    pub fn new(client: Client, mongo: Database, initial_lives: i32, max_guess_length: usize) -> Self {
        Self {
            client,
            mongo,
            initial_lives,
            max_guess_length,
        }
    }

    pub async fn evaluate(
        &self,
        session_id: &str,
        question_id: &str,
        raw_guess: &str,
    ) -> GameResult<GuessResponse> {
        let trimmed = raw_guess.trim();
        if trimmed.is_empty() {
            return Err(GameError::Validation("Guess cannot be empty".to_string()));
        }
        if trimmed.chars().count() > self.max_guess_length {
            return Err(GameError::Validation(format!(
                "Guess must be {} characters or less",
                self.max_guess_length
            )));
        }

        let catalog = QuestionCatalog::new(self.mongo.clone());
        if !catalog.exists(question_id).await? {
            return Err(GameError::QuestionNotFound);
        }

        let normalized = normalize(raw_guess);

        let mut tx = self.client.start_session().await?;
        let mut attempts = 0;

        let outcome = loop {
            attempts += 1;
            tx.start_transaction().await?;

            match self
                .evaluate_tx(&mut tx, session_id, question_id, &normalized)
                .await
            {
                Ok(outcome) => match Self::commit(&mut tx).await {
                    Ok(()) => break outcome,
                    Err(e)
                        if e.contains_label(TRANSIENT_TRANSACTION_ERROR)
                            && attempts < MAX_TX_ATTEMPTS =>
                    {
                        tracing::debug!("Retrying guess transaction after transient error: {}", e);
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                },
                Err(TxAbort::Duplicate) => {
                    let _ = tx.abort_transaction().await;
                    break Outcome::Duplicate;
                }
                Err(TxAbort::Error(GameError::Storage(e)))
                    if e.contains_label(TRANSIENT_TRANSACTION_ERROR)
                        && attempts < MAX_TX_ATTEMPTS =>
                {
                    let _ = tx.abort_transaction().await;
                    tracing::debug!("Retrying guess transaction after transient error: {}", e);
                    continue;
                }
                Err(TxAbort::Error(e)) => {
                    let _ = tx.abort_transaction().await;
                    return Err(e);
                }
            }
        };

        self.respond(session_id, question_id, outcome).await
    }

    async fn commit(tx: &mut ClientSession) -> Result<(), mongodb::error::Error> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match tx.commit_transaction().await {
                Ok(()) => return Ok(()),
                Err(e)
                    if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
                        && attempts < MAX_TX_ATTEMPTS =>
                {
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// The transactional phase: session resolution, duplicate check,
    /// correctness lookup, and the ledger/life writes.
    async fn evaluate_tx(
        &self,
        tx: &mut ClientSession,
        session_id: &str,
        question_id: &str,
        normalized: &str,
    ) -> Result<Outcome, TxAbort> {
        let store = SessionStore::new(self.client.clone(), self.mongo.clone(), self.initial_lives);
        let session = store
            .resolve_or_create_tx(tx, session_id, question_id)
            .await
            .map_err(TxAbort::Error)?;

        // A session with no lives left accepts no further guesses; the ledger
        // and catalog are not consulted.
        if session.lives <= 0 {
            return Ok(Outcome::GameOver);
        }

        let ledger = GuessLedger::new(self.mongo.clone());
        if ledger
            .contains_tx(tx, session_id, question_id, normalized)
            .await
            .map_err(TxAbort::Error)?
        {
            return Ok(Outcome::Duplicate);
        }

        let catalog = QuestionCatalog::new(self.mongo.clone());
        let answer = catalog
            .find_answer_tx(tx, question_id, normalized)
            .await
            .map_err(TxAbort::Error)?;

        // Every evaluated guess is recorded, wrong ones included, so a
        // resubmission is a duplicate instead of a second life decrement. A
        // concurrent identical guess makes this insert violate the ledger's
        // unique index; that is the duplicate outcome, not a failure.
        match ledger.record_tx(tx, session_id, question_id, normalized).await {
            Ok(()) => {}
            Err(GameError::Storage(ref e)) if is_duplicate_key(e) => {
                return Err(TxAbort::Duplicate);
            }
            Err(e) => return Err(TxAbort::Error(e)),
        }

        match answer {
            Some(answer) => Ok(Outcome::Correct(answer)),
            None => {
                store
                    .decrement_lives_tx(tx, session_id)
                    .await
                    .map_err(TxAbort::Error)?;
                Ok(Outcome::Wrong)
            }
        }
    }

    /// Recomputes the projected state and derives the status for the response.
    async fn respond(
        &self,
        session_id: &str,
        question_id: &str,
        outcome: Outcome,
    ) -> GameResult<GuessResponse> {
        let projector = StateProjector::new(self.mongo.clone(), self.initial_lives);
        let state = projector.project(session_id).await?;

        let catalog = QuestionCatalog::new(self.mongo.clone());
        let total_answers = catalog.answer_count(question_id).await?;
        let status = GameStatus::derive(state.found, total_answers, state.lives);

        let result = match outcome {
            Outcome::GameOver => {
                GUESSES_TOTAL.with_label_values(&["game_over"]).inc();
                return Ok(GuessResponse {
                    result: GuessResult::game_over(),
                    state,
                    status: GameStatus::Lost,
                });
            }
            Outcome::Duplicate => {
                GUESSES_TOTAL.with_label_values(&["duplicate"]).inc();
                GuessResult::already_guessed()
            }
            Outcome::Correct(answer) => {
                GUESSES_TOTAL.with_label_values(&["correct"]).inc();
                if status == GameStatus::Won {
                    GAMES_FINISHED_TOTAL.with_label_values(&["won"]).inc();
                }
                GuessResult::correct(answer.player, answer.rank)
            }
            Outcome::Wrong => {
                GUESSES_TOTAL.with_label_values(&["wrong"]).inc();
                if status == GameStatus::Lost {
                    GAMES_FINISHED_TOTAL.with_label_values(&["lost"]).inc();
                }
                GuessResult::wrong()
            }
        };

        tracing::info!(
            "Guess evaluated: session={}, question={}, correct={}, status={:?}",
            session_id,
            question_id,
            result.correct,
            status
        );

        Ok(GuessResponse {
            result,
            state,
            status,
        })
    }
}
