// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed token issuance and verification.
//!
//! Access and refresh tokens share one payload format. Verification is purely
//! cryptographic plus an expiry check, so access tokens can be checked on every
//! request without touching storage.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum accepted length of the symmetric signing key, in bytes.
pub const MIN_SECRET_KEY_SIZE: usize = 32;

/// Claims carried inside every signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Fresh per issuance; doubles as the session ID for refresh tokens
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenPayload {
    /// Build a payload valid for `duration` starting now.
    pub fn new(user_id: Uuid, username: &str, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            username: username.to_string(),
            issued_at: now,
            expires_at: now + duration,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Token codec errors.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid key size: must be at least {MIN_SECRET_KEY_SIZE} bytes")]
    WeakKey,

    #[error("token is invalid")]
    InvalidToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token duration must be positive")]
    InvalidDuration,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for crate::error::AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => Self::InvalidToken,
            TokenError::ExpiredToken => Self::ExpiredToken,
            TokenError::WeakKey | TokenError::InvalidDuration | TokenError::Signing(_) => {
                Self::Internal(err.into())
            }
        }
    }
}

/// Issues and verifies signed identity tokens.
pub trait TokenCodec: Send + Sync {
    /// Create a token for `username` that expires after `duration`.
    ///
    /// `duration` must be positive. Returns the signed string together with the payload it carries.
    fn generate(
        &self,
        user_id: Uuid,
        username: &str,
        duration: Duration,
    ) -> Result<(String, TokenPayload), TokenError>;

    /// Authenticate `token` and check it has not expired.
    fn verify(&self, token: &str) -> Result<TokenPayload, TokenError>;
}

/// HMAC-SHA256 JSON Web Token codec.
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    /// Create a codec from a symmetric secret of at least 32 bytes.
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_KEY_SIZE {
            return Err(TokenError::WeakKey);
        }

        // Expiry lives in our own payload and is checked after the signature.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Sign an already-built payload.
    pub fn sign(&self, payload: &TokenPayload) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), payload, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

impl TokenCodec for JwtCodec {
    fn generate(
        &self,
        user_id: Uuid,
        username: &str,
        duration: Duration,
    ) -> Result<(String, TokenPayload), TokenError> {
        if duration <= Duration::zero() {
            return Err(TokenError::InvalidDuration);
        }

        let payload = TokenPayload::new(user_id, username, duration);
        let token = self.sign(&payload)?;
        Ok((token, payload))
    }

    fn verify(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let token_data = decode::<TokenPayload>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token verification failed");
                TokenError::InvalidToken
            })?;

        let payload = token_data.claims;
        if payload.is_expired_at(Utc::now()) {
            return Err(TokenError::ExpiredToken);
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_signing_key_32_bytes_long!!";
    const OTHER_KEY: &[u8] = b"another_signing_key_32_bytes_ok!";

    #[test]
    fn test_generate_and_verify() {
        let codec = JwtCodec::new(KEY).unwrap();
        let user_id = Uuid::new_v4();

        let (token, payload) = codec
            .generate(user_id, "alice", Duration::minutes(1))
            .unwrap();
        assert!(payload.expires_at > payload.issued_at);

        let verified = codec.verify(&token).unwrap();
        assert_eq!(verified, payload);
        assert_eq!(verified.user_id, user_id);
        assert_eq!(verified.username, "alice");
    }

    #[test]
    fn test_each_token_gets_fresh_id() {
        let codec = JwtCodec::new(KEY).unwrap();
        let user_id = Uuid::new_v4();

        let (_, first) = codec.generate(user_id, "alice", Duration::minutes(1)).unwrap();
        let (_, second) = codec.generate(user_id, "alice", Duration::minutes(1)).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_weak_key_rejected() {
        assert!(matches!(
            JwtCodec::new(b"too_short"),
            Err(TokenError::WeakKey)
        ));
        assert!(JwtCodec::new(&[7u8; MIN_SECRET_KEY_SIZE]).is_ok());
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let signer = JwtCodec::new(KEY).unwrap();
        let verifier = JwtCodec::new(OTHER_KEY).unwrap();

        let (token, _) = signer
            .generate(Uuid::new_v4(), "alice", Duration::minutes(1))
            .unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_payload_is_expired_not_invalid() {
        let codec = JwtCodec::new(KEY).unwrap();
        let now = Utc::now();
        let payload = TokenPayload {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            issued_at: now - Duration::minutes(10),
            expires_at: now - Duration::minutes(5),
        };

        let token = codec.sign(&payload).unwrap();
        assert!(matches!(codec.verify(&token), Err(TokenError::ExpiredToken)));
    }

    #[test]
    fn test_expired_payload_with_wrong_key_is_invalid() {
        let signer = JwtCodec::new(KEY).unwrap();
        let verifier = JwtCodec::new(OTHER_KEY).unwrap();
        let now = Utc::now();
        let payload = TokenPayload {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            issued_at: now - Duration::minutes(10),
            expires_at: now - Duration::minutes(5),
        };

        let token = signer.sign(&payload).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_tampered_and_malformed_tokens() {
        let codec = JwtCodec::new(KEY).unwrap();
        let (token, _) = codec
            .generate(Uuid::new_v4(), "alice", Duration::minutes(1))
            .unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let (forged, _) = codec
            .generate(Uuid::new_v4(), "mallory", Duration::minutes(1))
            .unwrap();
        let forged_body = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_body;
        let spliced = parts.join(".");

        assert!(matches!(codec.verify(&spliced), Err(TokenError::InvalidToken)));
        assert!(matches!(codec.verify(""), Err(TokenError::InvalidToken)));
        assert!(matches!(
            codec.verify("invalid.token.here"),
            Err(TokenError::InvalidToken)
        ));
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let codec = JwtCodec::new(KEY).unwrap();

        assert!(matches!(
            codec.generate(Uuid::new_v4(), "alice", Duration::zero()),
            Err(TokenError::InvalidDuration)
        ));
        assert!(matches!(
            codec.generate(Uuid::new_v4(), "alice", Duration::seconds(-1)),
            Err(TokenError::InvalidDuration)
        ));
    }

    #[test]
    fn test_unexpected_algorithm_is_invalid() {
        let codec = JwtCodec::new(KEY).unwrap();
        let payload = TokenPayload::new(Uuid::new_v4(), "alice", Duration::minutes(1));
        let token = encode(
            &Header::new(Algorithm::HS512),
            &payload,
            &EncodingKey::from_secret(KEY),
        )
        .unwrap();

        assert!(matches!(codec.verify(&token), Err(TokenError::InvalidToken)));
    }
}
