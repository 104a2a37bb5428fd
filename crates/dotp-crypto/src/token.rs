//! Symmetric response tokens.
//!
//! Wire format: `nonce (24) || secretbox(json)`, text encoded. The JSON is the
//! compact form of [`ResponsePayload`] with keys in declaration order, which
//! matches what a JavaScript peer produces with `JSON.stringify`.

use crypto_secretbox::aead::generic_array::GenericArray;
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::XSalsa20Poly1305;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::encoding::TextEncoding;
use crate::error::CryptoError;
use crate::{KEY_LEN, MAC_LEN, NONCE_LEN};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl ResponsePayload {
    pub fn new(otp: impl Into<String>, expires_at: u64) -> Self {
        Self {
            otp: Some(otp.into()),
            expires_at: Some(expires_at),
        }
    }

    pub fn is_expired(&self, now_unix: u64) -> bool {
        self.expires_at.is_some_and(|t| now_unix >= t)
    }

    pub fn to_canonical_json(&self) -> Result<Vec<u8>, CryptoError> {
        serde_json::to_vec(self).map_err(|e| CryptoError::MalformedPayload(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseToken {
    pub payload: ResponsePayload,
    pub nonce: [u8; NONCE_LEN],
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseTokenCodec {
    encoding: TextEncoding,
}

impl ResponseTokenCodec {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }

    /// Encrypt `payload` under `key`. The nonce must be unique per key.
    pub fn encode(
        &self,
        payload: &ResponsePayload,
        nonce: &[u8; NONCE_LEN],
        key: &[u8; KEY_LEN],
    ) -> Result<String, CryptoError> {
        let json = Zeroizing::new(payload.to_canonical_json()?);
        let ciphertext = cipher(key)
            .encrypt(GenericArray::from_slice(nonce), json.as_slice())
            .map_err(|_| CryptoError::EncryptFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(nonce);
        out.extend_from_slice(&ciphertext);
        debug!(len = out.len(), "encoded response token");
        Ok(self.encoding.encode(&out))
    }

    pub fn decode(&self, text: &str, key: &[u8; KEY_LEN]) -> Result<ResponseToken, CryptoError> {
        let raw = self.encoding.decode(text)?;
        if raw.len() < NONCE_LEN + MAC_LEN {
            return Err(CryptoError::MalformedEnvelope {
                expected: NONCE_LEN + MAC_LEN,
                got: raw.len(),
            });
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let json = cipher(key)
            .decrypt(GenericArray::from_slice(nonce_bytes), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::AuthFailure)?;

        let payload: ResponsePayload = serde_json::from_slice(&json)
            .map_err(|e| CryptoError::MalformedPayload(e.to_string()))?;

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);
        Ok(ResponseToken { payload, nonce })
    }
}

fn cipher(key: &[u8; KEY_LEN]) -> XSalsa20Poly1305 {
    XSalsa20Poly1305::new(GenericArray::from_slice(key))
}

/// Fresh 24-byte nonce from the OS RNG.
pub fn random_nonce() -> Result<[u8; NONCE_LEN], CryptoError> {
    let mut nonce = [0u8; NONCE_LEN];
    getrandom::getrandom(&mut nonce).map_err(|_| CryptoError::EncryptFailed)?;
    Ok(nonce)
}
