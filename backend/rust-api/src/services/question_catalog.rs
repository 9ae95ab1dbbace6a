use mongodb::bson::doc;
use mongodb::Database;
use rand::seq::IndexedRandom;
use uuid::Uuid;

use crate::models::game::{AnswerView, CreateQuestionRequest};
use crate::models::{normalize, Answer, Question};
use crate::services::error::{GameError, GameResult};

/// Read-mostly question/answer store. Questions and their ranked answer sets
/// are authored once and never mutated afterwards.
pub struct QuestionCatalog {
    mongo: Database,
}

impl QuestionCatalog {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn get(&self, question_id: &str) -> GameResult<Question> {
        let questions = self.mongo.collection::<Question>("questions");
        questions
            .find_one(doc! { "_id": question_id })
            .await?
            .ok_or(GameError::QuestionNotFound)
    }

    pub async fn exists(&self, question_id: &str) -> GameResult<bool> {
        let questions = self.mongo.collection::<Question>("questions");
        Ok(questions
            .find_one(doc! { "_id": question_id })
            .await?
            .is_some())
    }

    /// All questions in a stable, human-meaningful order.
    pub async fn list(&self) -> GameResult<Vec<Question>> {
        let questions = self.mongo.collection::<Question>("questions");
        let mut cursor = questions.find(doc! {}).sort(doc! { "text": 1 }).await?;

        let mut out = Vec::new();
        while cursor.advance().await? {
            out.push(cursor.deserialize_current()?);
        }
        Ok(out)
    }

    /// Uniform pick over the catalog. When more than one question exists,
    /// `excluding` skips one id so a "new question" request does not re-serve
    /// the session's current question.
    pub async fn random(&self, excluding: Option<&str>) -> GameResult<Question> {
        let questions = self.mongo.collection::<Question>("questions");

        let ids = questions.distinct("_id", doc! {}).await?;
        let mut ids: Vec<String> = ids
            .into_iter()
            .filter_map(|id| id.as_str().map(str::to_string))
            .collect();

        if ids.is_empty() {
            return Err(GameError::NoQuestionsAvailable);
        }

        if let Some(skip) = excluding {
            if ids.len() > 1 {
                ids.retain(|id| id != skip);
            }
        }

        let picked = ids
            .choose(&mut rand::rng())
            .cloned()
            .ok_or(GameError::NoQuestionsAvailable)?;

        self.get(&picked).await
    }

    /// Full ordered reveal of a question's answer set.
    pub async fn answers(&self, question_id: &str) -> GameResult<Vec<AnswerView>> {
        if !self.exists(question_id).await? {
            return Err(GameError::QuestionNotFound);
        }

        let answers = self.mongo.collection::<Answer>("answers");
        let mut cursor = answers
            .find(doc! { "question_id": question_id })
            .sort(doc! { "rank": 1 })
            .await?;

        let mut out = Vec::new();
        while cursor.advance().await? {
            let answer = cursor.deserialize_current()?;
            out.push(AnswerView {
                player: answer.player,
                rank: answer.rank,
            });
        }
        Ok(out)
    }

    pub async fn answer_count(&self, question_id: &str) -> GameResult<u64> {
        let answers = self.mongo.collection::<Answer>("answers");
        Ok(answers
            .count_documents(doc! { "question_id": question_id })
            .await?)
    }

    /// Correctness lookup for the evaluator, read under its transaction.
    pub async fn find_answer_tx(
        &self,
        tx: &mut mongodb::ClientSession,
        question_id: &str,
        normalized_player: &str,
    ) -> GameResult<Option<Answer>> {
        let answers = self.mongo.collection::<Answer>("answers");
        Ok(answers
            .find_one(doc! { "question_id": question_id, "normalized_player": normalized_player })
            .session(&mut *tx)
            .await?)
    }

    /// Author a new question with its ranked answers. Ranks must be the
    /// unique integers 1..=N and names must be unique after normalization;
    /// the unique indexes back these checks up under concurrent authoring.
    pub async fn create(&self, req: CreateQuestionRequest) -> GameResult<Question> {
        let count = req.answers.len() as i32;
        let mut seen_ranks = std::collections::HashSet::new();
        let mut seen_names = std::collections::HashSet::new();

        for answer in &req.answers {
            if answer.rank < 1 || answer.rank > count {
                return Err(GameError::Validation(format!(
                    "Answer ranks must be between 1 and {}",
                    count
                )));
            }
            if !seen_ranks.insert(answer.rank) {
                return Err(GameError::Validation(format!(
                    "Duplicate answer rank {}",
                    answer.rank
                )));
            }
            let normalized = normalize(&answer.player);
            if normalized.is_empty() {
                return Err(GameError::Validation(
                    "Answer name cannot be empty".to_string(),
                ));
            }
            if !seen_names.insert(normalized) {
                return Err(GameError::Validation(format!(
                    "Duplicate answer name \"{}\"",
                    answer.player.trim()
                )));
            }
        }

        let question = Question {
            id: Uuid::new_v4().to_string(),
            text: req.question.trim().to_string(),
        };

        let answers: Vec<Answer> = req
            .answers
            .iter()
            .map(|a| Answer {
                id: Uuid::new_v4().to_string(),
                question_id: question.id.clone(),
                player: a.player.trim().to_string(),
                normalized_player: normalize(&a.player),
                rank: a.rank,
            })
            .collect();

        let questions = self.mongo.collection::<Question>("questions");
        questions.insert_one(&question).await?;

        let answers_collection = self.mongo.collection::<Answer>("answers");
        if let Err(e) = answers_collection.insert_many(&answers).await {
            // Roll the half-authored question back before reporting.
            let _ = questions.delete_one(doc! { "_id": &question.id }).await;
            let _ = answers_collection
                .delete_many(doc! { "question_id": &question.id })
                .await;
            return Err(e.into());
        }

        tracing::info!("Created question {} with {} answers", question.id, count);

        Ok(question)
    }
}
