//! Opt-out tokens
//!
//! A token authenticates an opt-out request for one (email, campaign) pair
//! without a round-trip to any server-side session. It is a keyed hash —
//! SHA-256 over a per-installation secret plus the payload — so forging one
//! requires the secret, not just knowledge of the encoding. Tokens expire;
//! verification of a well-formed token past its expiry reports it invalid.

use std::path::Path;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use herald_common::EmailAddress;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Days a token stays valid.
pub const DEFAULT_TTL_DAYS: i64 = 90;

/// Why a token failed verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Not decodable as a token at all.
    #[error("malformed token")]
    Malformed,

    /// Well-formed, but past its expiry.
    #[error("token expired")]
    Expired,

    /// Well-formed and in date, but the signature does not match.
    #[error("token signature mismatch")]
    Forged,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    /// Recipient email.
    e: String,
    /// Campaign ID, or `all` for a global opt-out.
    c: String,
    /// Expiry.
    exp: DateTime<Utc>,
    /// Keyed hash over (secret, e, c, exp).
    mac: String,
}

/// Mints and verifies opt-out tokens with a per-installation secret.
#[derive(Clone)]
pub struct TokenMinter {
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenMinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The secret must never end up in logs.
        f.debug_struct("TokenMinter")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenMinter {
    #[must_use]
    pub fn new(secret: impl Into<String>, ttl_days: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Mint a token for an (email, campaign) pair, expiring `ttl` from
    /// `now`.
    #[must_use]
    pub fn mint(&self, email: &EmailAddress, campaign: &str, now: DateTime<Utc>) -> String {
        let exp = now + self.ttl;
        let payload = Payload {
            mac: self.mac(email.as_str(), campaign, exp),
            e: email.as_str().to_string(),
            c: campaign.to_string(),
            exp,
        };

        // Payload is a struct we just built; serialization cannot fail.
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Invert [`TokenMinter::mint`].
    ///
    /// # Errors
    ///
    /// [`TokenError::Malformed`] when the token does not decode,
    /// [`TokenError::Expired`] when past expiry, [`TokenError::Forged`]
    /// when the keyed hash does not match.
    pub fn verify(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(EmailAddress, String), TokenError> {
        let json = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| TokenError::Malformed)?;
        let payload: Payload =
            serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if now > payload.exp {
            return Err(TokenError::Expired);
        }

        if payload.mac != self.mac(&payload.e, &payload.c, payload.exp) {
            return Err(TokenError::Forged);
        }

        let email = EmailAddress::parse(&payload.e).map_err(|_| TokenError::Malformed)?;
        Ok((email, payload.c))
    }

    fn mac(&self, email: &str, campaign: &str, exp: DateTime<Utc>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"\n");
        hasher.update(email.as_bytes());
        hasher.update(b":");
        hasher.update(campaign.as_bytes());
        hasher.update(b":");
        hasher.update(exp.to_rfc3339().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Load the per-installation secret, creating one on first use.
///
/// The secret file holds 32 random bytes hex-encoded and is created with
/// owner-only permissions on Unix.
///
/// # Errors
///
/// Returns an error if the secret file cannot be read or written.
pub fn load_or_create_secret(path: &Path) -> std::io::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(existing) => Ok(existing.trim().to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            use rand::RngCore;

            let mut bytes = [0_u8; 32];
            rand::rng().fill_bytes(&mut bytes);
            let secret = hex::encode(bytes);

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &secret)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
            }

            Ok(secret)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn minter() -> TokenMinter {
        TokenMinter::new("test-secret", DEFAULT_TTL_DAYS)
    }

    #[test]
    fn test_round_trip() {
        let minter = minter();
        let email = EmailAddress::parse("user@example.org").unwrap();
        let now = at("2026-08-06T09:00:00Z");

        let token = minter.mint(&email, "CAMP_1", now);
        let (back_email, back_campaign) = minter.verify(&token, now).unwrap();

        assert_eq!(back_email, email);
        assert_eq!(back_campaign, "CAMP_1");
    }

    #[test]
    fn test_valid_until_expiry_then_invalid() {
        let minter = minter();
        let email = EmailAddress::parse("user@example.org").unwrap();
        let minted_at = at("2026-08-06T09:00:00Z");
        let token = minter.mint(&email, "CAMP_1", minted_at);

        // Still valid one day before expiry.
        assert!(minter.verify(&token, at("2026-11-03T09:00:00Z")).is_ok());

        // Forcing the clock past expiry invalidates a well-formed token.
        assert_eq!(
            minter.verify(&token, at("2026-11-05T09:00:01Z")),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_wrong_secret_is_forged() {
        let email = EmailAddress::parse("user@example.org").unwrap();
        let now = at("2026-08-06T09:00:00Z");

        let token = TokenMinter::new("secret-a", 90).mint(&email, "CAMP_1", now);
        assert_eq!(
            TokenMinter::new("secret-b", 90).verify(&token, now),
            Err(TokenError::Forged)
        );
    }

    #[test]
    fn test_tampered_payload_is_forged() {
        let minter = minter();
        let email = EmailAddress::parse("user@example.org").unwrap();
        let now = at("2026-08-06T09:00:00Z");

        let token = minter.mint(&email, "CAMP_1", now);
        let mut payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&token).unwrap()).unwrap();
        payload["e"] = serde_json::Value::String("other@example.org".to_string());
        let tampered = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());

        assert_eq!(minter.verify(&tampered, now), Err(TokenError::Forged));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert_eq!(
            minter().verify("definitely not a token!!", at("2026-08-06T09:00:00Z")),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_secret_created_once_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join(".secret");

        let first = load_or_create_secret(&path).unwrap();
        let second = load_or_create_secret(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }
}
