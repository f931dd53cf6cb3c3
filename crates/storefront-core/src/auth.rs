//! Signed-credential identity: token issue/verify and password hashing.
//!
//! Verification is deliberately infallible from the caller's perspective —
//! a bad signature, expired token, or garbage input all resolve to "no
//! identity", never an error the request handler has to branch on.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A verified caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    name: String,
    email: String,
    is_admin: bool,
    exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Sign a token for `identity`, valid for `ttl` from now.
///
/// # Errors
///
/// Returns [`AuthError::Signing`] if HMAC signing fails.
pub fn issue_token(secret: &str, identity: &Identity, ttl: Duration) -> Result<String, AuthError> {
    let claims = Claims {
        sub: identity.id,
        name: identity.name.clone(),
        email: identity.email.clone(),
        is_admin: identity.is_admin,
        exp: (Utc::now() + ttl).timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verify a token and return the identity it carries.
///
/// Returns `None` for any failure: bad signature, expiry, or a token that
/// does not decode. Callers treat `None` as an anonymous request.
#[must_use]
pub fn verify_token(secret: &str, token: &str) -> Option<Identity> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;

    Some(Identity {
        id: data.claims.sub,
        name: data.claims.name,
        email: data.claims.email,
        is_admin: data.claims.is_admin,
    })
}

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns [`AuthError::Hashing`] if the hasher fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a password against a stored Argon2 hash.
///
/// Unparseable hashes verify as false rather than erroring, the same
/// "bad credential is just absent" posture as [`verify_token`].
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: 42,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            is_admin: true,
        }
    }

    #[test]
    fn token_round_trips() {
        let token = issue_token("secret", &identity(), Duration::days(7)).expect("issue");
        let verified = verify_token("secret", &token).expect("verify");
        assert_eq!(verified, identity());
    }

    #[test]
    fn wrong_secret_yields_no_identity() {
        let token = issue_token("secret", &identity(), Duration::days(7)).expect("issue");
        assert!(verify_token("other-secret", &token).is_none());
    }

    #[test]
    fn expired_token_yields_no_identity() {
        let token = issue_token("secret", &identity(), Duration::days(-1)).expect("issue");
        assert!(verify_token("secret", &token).is_none());
    }

    #[test]
    fn garbage_token_yields_no_identity() {
        assert!(verify_token("secret", "not.a.token").is_none());
        assert!(verify_token("secret", "").is_none());
    }

    #[test]
    fn tampered_token_yields_no_identity() {
        let token = issue_token("secret", &identity(), Duration::days(7)).expect("issue");
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('A');
        assert!(verify_token("secret", &tampered).is_none());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2").expect("hash");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn unparseable_hash_verifies_false() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("hunter2").expect("hash");
        let b = hash_password("hunter2").expect("hash");
        assert_ne!(a, b);
    }
}
