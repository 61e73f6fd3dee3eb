use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::IdentityError;

/// Claim set carried by every issued token. Immutable once signed; there is
/// no server-side revocation, expiry is the only lifetime control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256-signed identity tokens.
///
/// Pure function of secret + clock: no storage, no side effects.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    default_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, default_ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            default_ttl: Duration::minutes(default_ttl_minutes),
        }
    }

    /// Issue a token for `subject` using the configured default TTL.
    pub fn issue(&self, subject: &str, admin: bool) -> Result<String, IdentityError> {
        self.issue_with_ttl(subject, admin, self.default_ttl)
    }

    /// Issue a token with an explicit TTL. A zero or negative TTL produces a
    /// token that `verify` rejects immediately.
    pub fn issue_with_ttl(
        &self,
        subject: &str,
        admin: bool,
        ttl: Duration,
    ) -> Result<String, IdentityError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: subject.to_string(),
            admin,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| IdentityError::Transient(format!("token encoding failed: {e}")))
    }

    /// Verify signature and expiry; returns the embedded claims.
    ///
    /// Expiry is inclusive: a token is invalid from the exact `exp` second
    /// onward, with no leeway. The library's own exp check is disabled in
    /// favor of the explicit comparison below.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        let data = decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|_| IdentityError::InvalidToken)?;
        if Utc::now().timestamp() >= data.claims.exp {
            return Err(IdentityError::InvalidToken);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 30)
    }

    #[test]
    fn issue_then_verify_roundtrips_claims() {
        let svc = service();
        let token = svc.issue("01ARZ3NDEKTSV4RRFFQ69G5FAV", true).unwrap();
        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.sub, "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert!(claims.admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn admin_claim_is_preserved_when_false() {
        let svc = service();
        let token = svc.issue("subject", false).unwrap();
        assert!(!svc.verify(&token).unwrap().admin);
    }

    #[test]
    fn negative_ttl_is_rejected_immediately() {
        let svc = service();
        let token = svc
            .issue_with_ttl("subject", false, Duration::minutes(-1))
            .unwrap();
        assert!(matches!(svc.verify(&token), Err(IdentityError::InvalidToken)));
    }

    #[test]
    fn zero_ttl_is_rejected_immediately() {
        let svc = service();
        let token = svc.issue_with_ttl("subject", false, Duration::zero()).unwrap();
        assert!(matches!(svc.verify(&token), Err(IdentityError::InvalidToken)));
    }

    #[test]
    fn foreign_secret_fails_verification() {
        let token = service().issue("subject", false).unwrap();
        let other = TokenService::new("another-secret", 30);
        assert!(matches!(other.verify(&token), Err(IdentityError::InvalidToken)));
    }

    #[test]
    fn malformed_tokens_fail_verification() {
        let svc = service();
        assert!(matches!(svc.verify("not-a-jwt"), Err(IdentityError::InvalidToken)));
        assert!(matches!(svc.verify(""), Err(IdentityError::InvalidToken)));

        let token = svc.issue("subject", false).unwrap();
        let mut tampered = token.clone();
        tampered.truncate(token.len() - 2);
        assert!(matches!(svc.verify(&tampered), Err(IdentityError::InvalidToken)));
    }
}
