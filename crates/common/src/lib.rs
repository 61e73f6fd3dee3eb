pub mod types;
pub mod ulid;
pub mod utils;

/// Header carrying the shared secret for service-to-service calls.
pub const INTERNAL_API_KEY_HEADER: &str = "x-internal-api-key";
