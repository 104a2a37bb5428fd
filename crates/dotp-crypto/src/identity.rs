//! Public identity strings.
//!
//! An identity is `public_key || checksum(public_key)` (33 bytes) rendered as
//! text. The checksum byte only catches transcription mistakes; a wrong key
//! that slips through is still rejected when its box fails to open.

use serde::{Deserialize, Serialize};

use crate::encoding::TextEncoding;
use crate::error::CryptoError;
use crate::hash::{blake2s_byte, sha512};
use crate::KEY_LEN;

/// Raw length of a decoded identity string.
pub const ADDRESS_LEN: usize = KEY_LEN + 1;

/// Hash used to compute the check byte. The two schemes are not compatible
/// on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumScheme {
    /// First byte of SHA-512(public_key).
    #[default]
    Sha512,
    /// BLAKE2s with a one byte output.
    Blake2s,
}

impl ChecksumScheme {
    pub fn checksum(self, public_key: &[u8; KEY_LEN]) -> u8 {
        match self {
            Self::Sha512 => sha512(public_key)[0],
            Self::Blake2s => blake2s_byte(public_key),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityCodec {
    pub checksum: ChecksumScheme,
    pub encoding: TextEncoding,
}

impl IdentityCodec {
    pub fn new(checksum: ChecksumScheme, encoding: TextEncoding) -> Self {
        Self { checksum, encoding }
    }

    pub fn derive_address(&self, public_key: &[u8; KEY_LEN]) -> String {
        let mut address = [0u8; ADDRESS_LEN];
        address[..KEY_LEN].copy_from_slice(public_key);
        address[KEY_LEN] = self.checksum.checksum(public_key);
        self.encoding.encode(&address)
    }

    /// Decode an identity string back into the public key it names.
    pub fn resolve_address(&self, identity: &str) -> Result<[u8; KEY_LEN], CryptoError> {
        let raw = self.encoding.decode(identity)?;
        if raw.len() != ADDRESS_LEN {
            return Err(CryptoError::MalformedIdentity {
                expected: ADDRESS_LEN,
                got: raw.len(),
            });
        }

        let mut public_key = [0u8; KEY_LEN];
        public_key.copy_from_slice(&raw[..KEY_LEN]);
        if self.checksum.checksum(&public_key) != raw[KEY_LEN] {
            return Err(CryptoError::ChecksumMismatch);
        }
        Ok(public_key)
    }
}

/// Identity string under the default codec (SHA-512 check byte, Base58).
pub fn derive_address(public_key: &[u8; KEY_LEN]) -> String {
    IdentityCodec::default().derive_address(public_key)
}

/// Resolve an identity string under the default codec.
pub fn resolve_address(identity: &str) -> Result<[u8; KEY_LEN], CryptoError> {
    IdentityCodec::default().resolve_address(identity)
}
