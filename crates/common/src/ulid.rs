//! ULID string validation shared by every path/param that names an identity.

use thiserror::Error;
use ulid::Ulid;

/// Canonical textual length of a ULID (Crockford base32).
pub const ULID_LEN: usize = 26;

#[derive(Debug, Error, PartialEq)]
#[error("invalid ulid: {0}")]
pub struct InvalidUlid(pub String);

/// Validate a caller-supplied ULID string before it reaches any store.
pub fn validate_ulid(value: &str) -> Result<&str, InvalidUlid> {
    if value.len() != ULID_LEN {
        return Err(InvalidUlid(value.to_string()));
    }
    Ulid::from_string(value).map_err(|_| InvalidUlid(value.to_string()))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_generated_ulids() {
        let id = Ulid::new().to_string();
        assert_eq!(validate_ulid(&id), Ok(id.as_str()));
    }

    #[test]
    fn rejects_wrong_length_and_alphabet() {
        assert!(validate_ulid("").is_err());
        assert!(validate_ulid("01ARZ3NDEKTSV4RRFFQ69G5FA").is_err()); // 25 chars
        assert!(validate_ulid("01ARZ3NDEKTSV4RRFFQ69G5FAVX").is_err()); // 27 chars
        // 'U' is not part of the Crockford alphabet
        assert!(validate_ulid("01ARZ3NDEKTSV4RRFFQ69G5FUU").is_err());
    }
}
