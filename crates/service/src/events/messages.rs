use serde::{Deserialize, Serialize};

use super::DomainEvent;

/// One topic exchange per domain area.
pub const USERS_EXCHANGE: &str = "users";
pub const USER_CREDENTIALS_EXCHANGE: &str = "user_credentials";

pub const TOPIC_USER_CREATED: &str = "user.created";
pub const TOPIC_USER_CREDENTIALS_CREATED: &str = "user.credentials.created";

/// A profile record was committed by the users service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCreated {
    pub user_ulid: String,
}

impl DomainEvent for UserCreated {
    const EXCHANGE: &'static str = USERS_EXCHANGE;
    const TOPIC: &'static str = TOPIC_USER_CREATED;
}

/// A credentials record was committed by the auth service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCredentialsCreated {
    pub user_ulid: String,
    pub email: String,
}

impl DomainEvent for UserCredentialsCreated {
    const EXCHANGE: &'static str = USER_CREDENTIALS_EXCHANGE;
    const TOPIC: &'static str = TOPIC_USER_CREDENTIALS_CREATED;
}
