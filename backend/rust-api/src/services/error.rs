use thiserror::Error;

/// Error taxonomy of the game core. Validation and catalog conditions are the
/// caller-visible failures; everything the store throws is `Storage` and fatal
/// to the request (the caller retries).
#[derive(Debug, Error)]
pub enum GameError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid question ID")]
    QuestionNotFound,

    #[error("No questions available")]
    NoQuestionsAvailable,

    #[error(transparent)]
    Storage(#[from] mongodb::error::Error),
}

pub type GameResult<T> = Result<T, GameError>;

/// MongoDB signals a violated unique index with code 11000, either as a write
/// error or, inside a transaction, as a command error.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match *err.kind {
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref we)) => {
            we.code == 11000
        }
        mongodb::error::ErrorKind::Command(ref ce) => ce.code == 11000,
        _ => false,
    }
}
