use thiserror::Error;

/// Business errors for identity workflows.
///
/// Client-facing rejections (`Validation` through `Conflict`) are never
/// retried; `Upstream` and `Transient` mark failures a caller may retry.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid credentials")]
    Unauthorized,
    #[error("invalid token")]
    InvalidToken,
    #[error("forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(String),
    #[error("email already registered")]
    Conflict,
    #[error("upstream call failed: {0}")]
    Upstream(String),
    #[error("transient infrastructure error: {0}")]
    Transient(String),
}

impl IdentityError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            IdentityError::Validation(_) => 1001,
            IdentityError::Unauthorized => 1002,
            IdentityError::InvalidToken => 1003,
            IdentityError::Forbidden => 1004,
            IdentityError::NotFound(_) => 1005,
            IdentityError::Conflict => 1006,
            IdentityError::Upstream(_) => 1101,
            IdentityError::Transient(_) => 1102,
        }
    }

    /// Whether a caller may retry the operation without a code change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IdentityError::Upstream(_) | IdentityError::Transient(_))
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        IdentityError::NotFound(entity.into())
    }
}

impl From<models::errors::ModelError> for IdentityError {
    fn from(err: models::errors::ModelError) -> Self {
        match err {
            models::errors::ModelError::Validation(msg) => IdentityError::Validation(msg),
            models::errors::ModelError::Conflict(_) => IdentityError::Conflict,
            models::errors::ModelError::Db(msg) => IdentityError::Transient(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_split_follows_the_taxonomy() {
        assert!(!IdentityError::Conflict.is_retryable());
        assert!(!IdentityError::InvalidToken.is_retryable());
        assert!(!IdentityError::Forbidden.is_retryable());
        assert!(IdentityError::Upstream("boom".into()).is_retryable());
        assert!(IdentityError::Transient("redis down".into()).is_retryable());
    }

    #[test]
    fn model_conflicts_map_to_conflict() {
        let err: IdentityError =
            models::errors::ModelError::Conflict("duplicate key".into()).into();
        assert!(matches!(err, IdentityError::Conflict));
    }
}
