//! dotp: OTP delivery to a public identity.
//!
//! A challenger resolves the recipient's identity string to a Curve25519
//! public key, seals an OTP to it and ships the resulting challenge as text.
//! Only the holder of the matching secret key can open it. Response tokens
//! carry a small payload back under a shared secretbox key.

#![forbid(unsafe_code)]

pub mod challenge;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod identity;
pub mod kdf;
pub mod keys;
pub mod sealed;
pub mod token;

#[cfg(test)]
mod proptests;

/// Curve25519 public and secret key length.
pub const KEY_LEN: usize = 32;
/// XSalsa20 nonce length.
pub const NONCE_LEN: usize = 24;
/// Poly1305 tag length.
pub const MAC_LEN: usize = 16;

pub use challenge::{
    build_challenge, ChallengeCodec, ChallengeEnvelope, CodecConfig, OpenedChallenge,
    ProtocolVersion, SenderBinding, CURRENT_VERSION,
};
pub use encoding::TextEncoding;
pub use error::CryptoError;
pub use identity::{derive_address, resolve_address, ChecksumScheme, IdentityCodec};
pub use kdf::KdfParams;
pub use keys::KeyPair;
pub use token::{ResponsePayload, ResponseToken, ResponseTokenCodec};
