use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub bind_addr: String,
    pub initial_lives: i32,
    pub max_guess_length: usize,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", app_env)).required(false), // Allow missing config file, fallback to ENV
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "cricket_top10".to_string());

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:5150".to_string());

        let initial_lives = settings
            .get_int("game.initial_lives")
            .ok()
            .or_else(|| {
                env::var("INITIAL_LIVES")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(3) as i32;

        let max_guess_length = settings
            .get_int("game.max_guess_length")
            .ok()
            .or_else(|| {
                env::var("MAX_GUESS_LENGTH")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(50) as usize;

        Ok(Config {
            mongo_uri,
            mongo_database,
            bind_addr,
            initial_lives,
            max_guess_length,
        })
    }
}
