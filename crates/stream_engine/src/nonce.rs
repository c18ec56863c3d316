use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Nonces stay valid for two ticks, so between 12 and 24 hours.
pub const NONCE_TICK_SECS: i64 = 12 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NonceError {
    #[error("nonce is invalid or expired")]
    Invalid,
    #[error("nonce key is unusable")]
    Key,
}

/// Issues and checks request nonces bound to an action and a viewer session.
#[derive(Clone)]
pub struct NonceIssuer {
    secret: Vec<u8>,
    session: String,
}

impl fmt::Debug for NonceIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonceIssuer")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl NonceIssuer {
    pub fn new(secret: impl Into<Vec<u8>>, session: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            session: session.into(),
        }
    }

    pub fn create(&self, action: &str) -> Result<String, NonceError> {
        self.create_at(action, Utc::now())
    }

    pub fn create_at(&self, action: &str, now: DateTime<Utc>) -> Result<String, NonceError> {
        let digest = self.mac(action, tick(now))?.finalize().into_bytes();
        Ok(URL_SAFE_NO_PAD.encode(digest))
    }

    pub fn verify(&self, action: &str, nonce: &str) -> Result<(), NonceError> {
        self.verify_at(action, nonce, Utc::now())
    }

    /// Accepts nonces from the current and the previous tick.
    pub fn verify_at(
        &self,
        action: &str,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<(), NonceError> {
        let provided = URL_SAFE_NO_PAD
            .decode(nonce.trim())
            .map_err(|_| NonceError::Invalid)?;
        let current = tick(now);
        for candidate in [current, current - 1] {
            if self.mac(action, candidate)?.verify_slice(&provided).is_ok() {
                return Ok(());
            }
        }
        Err(NonceError::Invalid)
    }

    fn mac(&self, action: &str, tick: i64) -> Result<HmacSha256, NonceError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|_| NonceError::Key)?;
        mac.update(format!("{tick}|{action}|{}", self.session).as_bytes());
        Ok(mac)
    }
}

fn tick(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(NONCE_TICK_SECS)
}
