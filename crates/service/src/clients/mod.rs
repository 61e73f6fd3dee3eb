//! Typed, internal-key-authenticated HTTP clients for the peer services.
//!
//! Consumed through traits so the saga and the read paths can be exercised
//! against in-memory fakes; the `Http*` implementations speak the
//! `{status_code, message, content}` envelope of the real endpoints.

pub mod credentials;
pub mod profiles;

pub use credentials::CredentialsClient;
pub use profiles::ProfileClient;

use crate::errors::IdentityError;

pub(crate) fn upstream(err: reqwest::Error) -> IdentityError {
    IdentityError::Upstream(err.to_string())
}

/// Map a peer's HTTP rejection onto the shared taxonomy; success statuses
/// pass through for envelope decoding.
pub(crate) fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    match status.as_u16() {
        403 => Err(IdentityError::Forbidden),
        404 => Err(IdentityError::not_found("upstream resource")),
        _ => Err(IdentityError::Upstream(format!("peer responded with {status}"))),
    }
}
