//! Permission predicates applied before every mutating or sensitive read.
//! There is no resource-level ACL beyond "owner of record or admin"; the
//! internal-network gate is a shared key compared verbatim.

use crate::errors::IdentityError;

/// Succeeds only when the token subject owns the target record.
pub fn ensure_owner(token_subject_ulid: &str, target_ulid: &str) -> Result<(), IdentityError> {
    if token_subject_ulid != target_ulid {
        return Err(IdentityError::Forbidden);
    }
    Ok(())
}

/// Succeeds only when the token carries the admin claim.
pub fn ensure_admin(admin_claim: bool) -> Result<(), IdentityError> {
    if !admin_claim {
        return Err(IdentityError::Forbidden);
    }
    Ok(())
}

/// Gate for service-to-service calls: the provided header value must equal
/// the configured secret exactly. Independent of the token-based path.
pub fn ensure_internal_key(provided: Option<&str>, expected: &str) -> Result<(), IdentityError> {
    match provided {
        Some(value) if value == expected && !expected.is_empty() => Ok(()),
        _ => Err(IdentityError::Forbidden),
    }
}
