use anyhow::{Context, Result};
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};
use uuid::Uuid;

use crate::models::{normalize, Answer, Question};

const DEFAULT_QUESTION_TEXT: &str = "Top 10 ODI run scorers (all time)";

const DEFAULT_ANSWERS: [(&str, i32); 10] = [
    ("Sachin Tendulkar", 1),
    ("Virat Kohli", 2),
    ("Ricky Ponting", 3),
    ("Jacques Kallis", 4),
    ("Kumar Sangakkara", 5),
    ("Mahela Jayawardene", 6),
    ("Rahul Dravid", 7),
    ("Brian Lara", 8),
    ("AB de Villiers", 9),
    ("MS Dhoni", 10),
];

/// Startup bootstrap: create the unique indexes the game relies on, then seed
/// a default question when the catalog is empty.
pub async fn bootstrap(mongo: &Database) -> Result<()> {
    ensure_indexes(mongo).await?;
    seed_default_question_if_empty(mongo).await?;
    Ok(())
}

/// The unique index on the guess ledger is the authoritative duplicate guard
/// for concurrent guesses; the answer indexes enforce the per-question rank
/// and name invariants.
async fn ensure_indexes(mongo: &Database) -> Result<()> {
    let unique = IndexOptions::builder().unique(true).build();

    let answers = mongo.collection::<Answer>("answers");
    answers
        .create_indexes(vec![
            IndexModel::builder()
                .keys(doc! { "question_id": 1, "rank": 1 })
                .options(unique.clone())
                .build(),
            IndexModel::builder()
                .keys(doc! { "question_id": 1, "normalized_player": 1 })
                .options(unique.clone())
                .build(),
        ])
        .await
        .context("Failed to create answer indexes")?;

    let guesses = mongo.collection::<crate::models::SessionGuess>("guesses");
    guesses
        .create_index(
            IndexModel::builder()
                .keys(doc! { "session_id": 1, "question_id": 1, "normalized_player": 1 })
                .options(unique)
                .build(),
        )
        .await
        .context("Failed to create guess ledger index")?;

    tracing::debug!("MongoDB indexes ensured");
    Ok(())
}

async fn seed_default_question_if_empty(mongo: &Database) -> Result<()> {
    let questions = mongo.collection::<Question>("questions");

    let existing = questions
        .count_documents(doc! {})
        .await
        .context("Failed to count questions")?;
    if existing > 0 {
        return Ok(());
    }

    let question = Question {
        id: Uuid::new_v4().to_string(),
        text: DEFAULT_QUESTION_TEXT.to_string(),
    };

    let answers: Vec<Answer> = DEFAULT_ANSWERS
        .iter()
        .map(|(player, rank)| Answer {
            id: Uuid::new_v4().to_string(),
            question_id: question.id.clone(),
            player: (*player).to_string(),
            normalized_player: normalize(player),
            rank: *rank,
        })
        .collect();

    questions
        .insert_one(&question)
        .await
        .context("Failed to seed default question")?;
    mongo
        .collection::<Answer>("answers")
        .insert_many(&answers)
        .await
        .context("Failed to seed default answers")?;

    tracing::warn!("Seeded default question because the questions collection was empty");
    Ok(())
}
