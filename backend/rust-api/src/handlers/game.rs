use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::models::game::{AnswersQuery, GuessRequest, QuestionQuery, QuestionView};
use crate::services::{
    guess_evaluator::GuessEvaluator, question_catalog::QuestionCatalog,
    session_store::SessionStore, state_projector::StateProjector, AppState, GameError,
};

pub const SESSION_ID_HEADER: &str = "x-session-id";

/// The session token is an opaque string in the `x-session-id` header. One is
/// generated when the caller supplies none; the effective token is echoed on
/// every game response so callers can persist and reuse it.
fn resolve_session_token(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn with_session_header(token: &str, body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    if let Ok(value) = HeaderValue::from_str(token) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(SESSION_ID_HEADER), value);
    }
    response
}

fn error_response(err: GameError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        GameError::Validation(_) => StatusCode::BAD_REQUEST,
        GameError::QuestionNotFound => StatusCode::NOT_FOUND,
        GameError::NoQuestionsAvailable => StatusCode::SERVICE_UNAVAILABLE,
        GameError::Storage(e) => {
            tracing::error!("Storage failure: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() })))
}

fn session_store(state: &AppState) -> SessionStore {
    SessionStore::new(
        state.mongo_client.clone(),
        state.mongo.clone(),
        state.config.initial_lives,
    )
}

/// Resolve the session's current question, or assign one. An explicit
/// `?questionId=` switches the session to that question; `?new=true` forces a
/// random pick that skips the session's current question when possible.
pub async fn get_question(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<QuestionQuery>,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let token = resolve_session_token(&headers);
    let catalog = QuestionCatalog::new(state.mongo.clone());
    let store = session_store(&state);

    if let Some(question_id) = query.question_id.as_deref().filter(|id| !id.is_empty()) {
        let question = catalog.get(question_id).await.map_err(error_response)?;
        store
            .resolve_or_create(&token, &question.id)
            .await
            .map_err(error_response)?;
        return Ok(with_session_header(
            &token,
            Json(QuestionView::from(question)),
        ));
    }

    let previous = store.get(&token).await.map_err(error_response)?;

    if !query.new {
        if let Some(session) = &previous {
            // The assigned question may have been deleted since; fall through
            // to a fresh pick when it is gone.
            match catalog.get(&session.question_id).await {
                Ok(question) => {
                    return Ok(with_session_header(
                        &token,
                        Json(QuestionView::from(question)),
                    ));
                }
                Err(GameError::QuestionNotFound) => {}
                Err(e) => return Err(error_response(e)),
            }
        }
    }

    let excluding = previous.as_ref().map(|s| s.question_id.as_str());
    let question = catalog.random(excluding).await.map_err(error_response)?;
    store
        .resolve_or_create(&token, &question.id)
        .await
        .map_err(error_response)?;

    Ok(with_session_header(
        &token,
        Json(QuestionView::from(question)),
    ))
}

pub async fn list_questions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let catalog = QuestionCatalog::new(state.mongo.clone());
    let questions = catalog.list().await.map_err(error_response)?;
    let views: Vec<QuestionView> = questions.into_iter().map(QuestionView::from).collect();
    Ok(Json(views))
}

pub async fn get_state(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let token = resolve_session_token(&headers);
    let projector = StateProjector::new(state.mongo.clone(), state.config.initial_lives);
    let game_state = projector.project(&token).await.map_err(error_response)?;
    Ok(with_session_header(&token, Json(game_state)))
}

pub async fn submit_guess(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<GuessRequest>,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    req.validate()
        .map_err(|e| error_response(GameError::Validation(e.to_string())))?;

    let token = resolve_session_token(&headers);
    tracing::info!(
        "Evaluating guess for session={}, question={}",
        token,
        req.question_id
    );

    let evaluator = GuessEvaluator::new(
        state.mongo_client.clone(),
        state.mongo.clone(),
        state.config.initial_lives,
        state.config.max_guess_length,
    );

    let response = evaluator
        .evaluate(&token, &req.question_id, &req.guess)
        .await
        .map_err(error_response)?;

    Ok(with_session_header(&token, Json(response)))
}

pub async fn reset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    let token = resolve_session_token(&headers);
    let store = session_store(&state);
    store.reset(&token).await.map_err(error_response)?;
    Ok(with_session_header(&token, StatusCode::NO_CONTENT))
}

/// Full reveal of a question's ranked answers; the adapter calls this after a
/// won/lost transition.
pub async fn get_answers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnswersQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let catalog = QuestionCatalog::new(state.mongo.clone());
    let answers = catalog
        .answers(&query.question_id)
        .await
        .map_err(error_response)?;
    Ok(Json(answers))
}
