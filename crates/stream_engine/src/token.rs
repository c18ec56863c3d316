use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::JobHandle;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("job token is not well formed")]
    Format,
    #[error("job token signature does not match")]
    Signature,
    #[error("job token payload is invalid: {0}")]
    Payload(String),
    #[error("job token key is unusable")]
    Key,
}

/// 32 random bytes, for deployments that configure no signing secret.
pub fn random_secret() -> Vec<u8> {
    rand::random::<[u8; 32]>().to_vec()
}

/// Signs job handles into opaque tokens the viewer hands back on every call.
///
/// Token layout: `base64url(json(handle)) "." base64url(hmac_sha256(payload))`.
#[derive(Clone)]
pub struct JobTokenCodec {
    secret: Vec<u8>,
}

impl fmt::Debug for JobTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobTokenCodec").finish_non_exhaustive()
    }
}

impl JobTokenCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Codec with a random per-process key.
    pub fn random() -> Self {
        Self::new(random_secret())
    }

    pub fn encode(&self, job: &JobHandle) -> Result<String, TokenError> {
        let json = serde_json::to_vec(job).map_err(|err| TokenError::Payload(err.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Verifies the signature, then the shape: a non-empty `id` and a
    /// `cookies` mapping of strings.
    pub fn decode(&self, token: &str) -> Result<JobHandle, TokenError> {
        let (payload, signature) = token.trim().split_once('.').ok_or(TokenError::Format)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Format)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Signature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Format)?;
        let job: JobHandle =
            serde_json::from_slice(&json).map_err(|err| TokenError::Payload(err.to_string()))?;
        if !job.is_valid() {
            return Err(TokenError::Payload("empty job id".to_string()));
        }
        Ok(job)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| TokenError::Key)
    }
}
