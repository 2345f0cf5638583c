//! Identity primitives: password hashing and signed bearer tokens.
//!
//! Only verified tokens establish an identity. There is no path that trusts a
//! caller-supplied user id.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::User;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// The authenticated caller, resolved from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("token signing failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Identity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            Error::Unauthenticated("Invalid or expired token")
        })?;
        Ok(Identity {
            user_id: data.claims.sub,
            username: data.claims.username,
        })
    }

    /// Verifies the raw value of an `Authorization` header.
    pub fn verify_header(&self, header: Option<&str>) -> Result<Identity> {
        let token = bearer_token(header)?;
        self.verify(token)
    }
}

/// Extracts the credential segment from `Bearer <token>`.
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    let header = header.ok_or(Error::Unauthenticated("Authorization header required"))?;
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(Error::Unauthenticated("Malformed authorization header"))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(Error::Unauthenticated("Malformed authorization header"));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn user() -> User {
        User {
            id: "3f2c9a4e-0000-4000-8000-000000000001".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_is_not_plaintext_and_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(!hash.contains("correct horse"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn verify_password_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let signer = TokenSigner::new(b"secret", Duration::hours(1));
        let token = signer.issue(&user()).unwrap();
        let identity = signer
            .verify_header(Some(&format!("Bearer {token}")))
            .unwrap();
        assert_eq!(identity.user_id, user().id);
        assert_eq!(identity.username, "ada");
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = TokenSigner::new(b"one", Duration::hours(1))
            .issue(&user())
            .unwrap();
        let result = TokenSigner::new(b"two", Duration::hours(1)).verify(&token);
        assert!(matches!(result, Err(Error::Unauthenticated(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = TokenSigner::new(b"secret", Duration::hours(-1));
        let token = signer.issue(&user()).unwrap();
        assert!(matches!(signer.verify(&token), Err(Error::Unauthenticated(_))));
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Bearer"))]
    #[case(Some("Bearer   "))]
    #[case(Some("Basic abc"))]
    #[case(Some("token-without-scheme"))]
    fn malformed_headers_are_unauthenticated(#[case] header: Option<&str>) {
        assert!(matches!(
            bearer_token(header),
            Err(Error::Unauthenticated(_))
        ));
    }
}
