use crate::config::Config;
use mongodb::bson::doc;
use mongodb::{Client as MongoClient, Database};

pub struct AppState {
    pub config: Config,
    pub mongo_client: MongoClient,
    pub mongo: Database,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);

        tracing::info!("Testing MongoDB connection with ping...");

        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            mongo.run_command(doc! { "ping": 1 }),
        )
        .await
        .map_err(|_| anyhow::anyhow!("MongoDB ping timeout after 5s"))??;

        tracing::info!("MongoDB connection established successfully");

        Ok(Self {
            config,
            mongo_client,
            mongo,
        })
    }
}

pub mod error;
pub mod guess_evaluator;
pub mod guess_ledger;
pub mod question_catalog;
pub mod seeder;
pub mod session_store;
pub mod state_projector;

pub use error::{GameError, GameResult};
