use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::models::game::CreateQuestionRequest;
use crate::services::{question_catalog::QuestionCatalog, AppState, GameError};

/// Author a question with its ranked answer set. Answers are normalized at
/// write time so guesses compare against a stable key.
pub async fn create_question(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    req.validate().map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    let catalog = QuestionCatalog::new(state.mongo.clone());
    let question = catalog.create(req).await.map_err(|e| {
        let status = match &e {
            GameError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => {
                tracing::error!("Failed to create question: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": e.to_string() })))
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "questionId": question.id })),
    ))
}
