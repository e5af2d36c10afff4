use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Session lifetime enforced at verification time.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Claims carried by a session token. Signed, not encrypted: nothing
/// sensitive goes in here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub uid: i64,
    /// Issuance time in milliseconds since the Unix epoch.
    pub issued_at_ms: i64,
}

/// Issues and verifies HS256 session tokens with a single injected key.
///
/// Issuance takes no expiry. The `max_age` handed to [`SessionTokens::verify`]
/// is the only place session lifetime is decided.
#[derive(Clone)]
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionTokens {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Age is checked against `issued_at_ms` below, not via `exp`.
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, uid: i64) -> Result<String> {
        self.issue_at(uid, Utc::now())
    }

    pub fn issue_at(&self, uid: i64, now: DateTime<Utc>) -> Result<String> {
        let claims = SessionClaims {
            uid,
            issued_at_ms: now.timestamp_millis(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Returns the claims, or `None` for a bad signature, a malformed token,
    /// or one older than `max_age`. The reasons are not distinguished.
    pub fn verify(&self, token: &str, max_age: Duration) -> Option<SessionClaims> {
        self.verify_at(token, max_age, Utc::now())
    }

    pub fn verify_at(
        &self,
        token: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Option<SessionClaims> {
        let claims = decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .ok()?
            .claims;

        let age_ms = now.timestamp_millis().checked_sub(claims.issued_at_ms)?;
        let max_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        if age_ms < 0 || age_ms > max_ms {
            return None;
        }
        Some(claims)
    }
}
