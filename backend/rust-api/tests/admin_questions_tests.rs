// Question authoring endpoint. Needs the same MongoDB replica set as the
// game flow tests; run with:
//   cargo test -- --ignored

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

mod common;

async fn post_question(app: &axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/questions")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
#[ignore = "requires a running MongoDB replica set"]
async fn authored_question_is_playable() {
    let app = common::create_test_app().await;

    let (status, body) = post_question(
        &app,
        json!({
            "question": format!("Top 2 Test wicket takers {}", Uuid::new_v4()),
            "answers": [
                { "player": " Muttiah Muralitharan ", "rank": 1 },
                { "player": "Shane Warne", "rank": 2 },
            ],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let question_id = body["questionId"].as_str().unwrap().to_string();

    // Names are normalized at write time: a guess with different case and
    // padding still matches the canonical display name.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/guess")
                .header("content-type", "application/json")
                .header("x-session-id", Uuid::new_v4().to_string())
                .body(Body::from(
                    json!({ "questionId": question_id, "guess": "muttiah MURALITHARAN" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["result"]["correct"], true);
    assert_eq!(body["result"]["player"], "Muttiah Muralitharan");
    assert_eq!(body["result"]["rank"], 1);
}

#[tokio::test]
#[ignore = "requires a running MongoDB replica set"]
async fn malformed_answer_sets_are_rejected() {
    let app = common::create_test_app().await;

    for answers in [
        json!([]),                                                             // empty
        json!([{ "player": "A", "rank": 1 }, { "player": "B", "rank": 1 }]),   // duplicate rank
        json!([{ "player": "A", "rank": 1 }, { "player": " a ", "rank": 2 }]), // duplicate name
        json!([{ "player": "A", "rank": 3 }]),                                 // rank out of range
        json!([{ "player": "   ", "rank": 1 }]),                               // blank name
    ] {
        let (status, _) = post_question(
            &app,
            json!({
                "question": format!("Malformed {}", Uuid::new_v4()),
                "answers": answers,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
