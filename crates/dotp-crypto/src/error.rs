//! Error type shared by every codec in this crate.
//!
//! Validation failures (identity, version, framing) carry precise detail and
//! are safe to show to a user. Cryptographic failures collapse into a single
//! [`CryptoError::AuthFailure`] so that a wrong key and a tampered ciphertext
//! look the same to the caller.

use crate::encoding::TextEncoding;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("malformed identity: expected {expected} bytes, got {got}")]
    MalformedIdentity { expected: usize, got: usize },

    #[error("identity checksum mismatch")]
    ChecksumMismatch,

    #[error("unsupported envelope version {found} (highest supported: {supported})")]
    UnsupportedVersion { found: u8, supported: u8 },

    #[error("malformed envelope: need at least {expected} bytes, got {got}")]
    MalformedEnvelope { expected: usize, got: usize },

    #[error("input is not valid {encoding} text")]
    InvalidEncoding { encoding: TextEncoding },

    #[error("invalid envelope field: {0}")]
    InvalidField(&'static str),

    #[error("failed to open")]
    AuthFailure,

    #[error("encryption failed")]
    EncryptFailed,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("key derivation failed: {0}")]
    Kdf(String),
}

impl CryptoError {
    /// True for input that was rejected before any decryption was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MalformedIdentity { .. }
                | Self::ChecksumMismatch
                | Self::UnsupportedVersion { .. }
                | Self::MalformedEnvelope { .. }
                | Self::InvalidEncoding { .. }
                | Self::InvalidField(_)
        )
    }
}
