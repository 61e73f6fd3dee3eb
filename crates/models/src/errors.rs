use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ModelError {
    /// Classify a database error string; unique-constraint violations become
    /// `Conflict` so callers can surface them without string matching.
    pub fn from_db(message: String) -> Self {
        if message.contains("duplicate key value violates unique constraint")
            || message.contains("UNIQUE constraint failed")
        {
            ModelError::Conflict(message)
        } else {
            ModelError::Db(message)
        }
    }
}
