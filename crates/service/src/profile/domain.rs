use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::domain::CredentialsView;

/// Cached/public projection of a profile, stored under `user:{ulid}`.
///
/// `created_at` is absent when the snapshot was projected from a
/// `user.created` event, which carries only the ULID; a write-through from
/// the owning service fills it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub ulid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Full profile row as handed between repository and service.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub ulid: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ProfileRecord> for UserView {
    fn from(record: &ProfileRecord) -> Self {
        Self { ulid: record.ulid.clone(), created_at: Some(record.created_at) }
    }
}

/// Owner-facing profile enriched with the credentials view from the peer.
#[derive(Debug, Clone, Serialize)]
pub struct UserDetails {
    pub user: UserView,
    pub credentials: Option<CredentialsView>,
}
