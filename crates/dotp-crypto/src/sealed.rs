//! Anonymous sealed boxes.
//!
//! Wire format: `ephemeral_pub (32) || crypto_box(plaintext)`. The 24-byte
//! nonce is not transmitted; both sides compute it as
//! `BLAKE2b-24(ephemeral_pub || recipient_pub)`. This is the libsodium
//! `crypto_box_seal` construction, so boxes interoperate with it in both
//! directions.
//!
//! The derived nonce is only unique because the ephemeral key is single use:
//! an ephemeral secret must never seal two different plaintexts.

use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::Aead;
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand_core::OsRng;
use x25519_dalek::StaticSecret;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::hash::sealed_box_nonce;
use crate::keys::KeyPair;
use crate::{KEY_LEN, MAC_LEN, NONCE_LEN};

/// Bytes a sealed box adds on top of its plaintext.
pub const SEAL_OVERHEAD: usize = KEY_LEN + MAC_LEN;

/// Seal `plaintext` to `recipient_pub` using a caller-supplied ephemeral secret.
pub fn seal(
    plaintext: &[u8],
    recipient_pub: &[u8; KEY_LEN],
    ephemeral_secret: &[u8; KEY_LEN],
) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = SecretKey::from(*ephemeral_secret);
    let ephemeral_pub = *ephemeral.public_key().as_bytes();
    let nonce = sealed_box_nonce(&ephemeral_pub, recipient_pub);

    let boxed = box_encrypt(plaintext, &nonce, recipient_pub, &ephemeral)?;

    let mut out = Vec::with_capacity(KEY_LEN + boxed.len());
    out.extend_from_slice(&ephemeral_pub);
    out.extend_from_slice(&boxed);
    Ok(out)
}

/// Seal with a fresh ephemeral secret drawn from the OS RNG.
pub fn seal_random(plaintext: &[u8], recipient_pub: &[u8; KEY_LEN]) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = Zeroizing::new(StaticSecret::random_from_rng(OsRng).to_bytes());
    seal(plaintext, recipient_pub, &ephemeral)
}

/// Open a sealed box addressed to `recipient`.
///
/// Short input, a wrong key and a modified box all yield `AuthFailure`.
pub fn open(sealed: &[u8], recipient: &KeyPair) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < SEAL_OVERHEAD {
        return Err(CryptoError::AuthFailure);
    }
    let mut ephemeral_pub = [0u8; KEY_LEN];
    ephemeral_pub.copy_from_slice(&sealed[..KEY_LEN]);
    let nonce = sealed_box_nonce(&ephemeral_pub, &recipient.public_key());

    box_decrypt(&sealed[KEY_LEN..], &nonce, &ephemeral_pub, &recipient.box_secret())
}

/// crypto_box: X25519 + XSalsa20-Poly1305 between `our_secret` and `their_pub`.
pub(crate) fn box_encrypt(
    plaintext: &[u8],
    nonce: &[u8; NONCE_LEN],
    their_pub: &[u8; KEY_LEN],
    our_secret: &SecretKey,
) -> Result<Vec<u8>, CryptoError> {
    let salsa_box = SalsaBox::new(&PublicKey::from(*their_pub), our_secret);
    salsa_box
        .encrypt(GenericArray::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::EncryptFailed)
}

pub(crate) fn box_decrypt(
    ciphertext: &[u8],
    nonce: &[u8; NONCE_LEN],
    their_pub: &[u8; KEY_LEN],
    our_secret: &SecretKey,
) -> Result<Vec<u8>, CryptoError> {
    let salsa_box = SalsaBox::new(&PublicKey::from(*their_pub), our_secret);
    salsa_box
        .decrypt(GenericArray::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthFailure)
}
