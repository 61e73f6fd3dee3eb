use serde::{Deserialize, Serialize};

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Public projection of a credentials record: what peers may see, what gets
/// cached under `user_credentials:{ulid}`, and the payload source for the
/// credentials-created event. Never carries hash material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialsView {
    pub user_ulid: String,
    pub email: String,
}

/// Full credentials row as handed between repository and service.
#[derive(Debug, Clone)]
pub struct CredentialsRecord {
    pub user_ulid: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub is_admin: bool,
}

impl From<&CredentialsRecord> for CredentialsView {
    fn from(record: &CredentialsRecord) -> Self {
        Self { user_ulid: record.user_ulid.clone(), email: record.email.clone() }
    }
}

/// Principal resolved from a bearer token, decoded once per request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub ulid: String,
    pub admin: bool,
}

/// Login result (session)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub credentials: CredentialsView,
    pub token: String,
}
