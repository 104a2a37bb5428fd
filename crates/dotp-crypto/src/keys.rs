//! Curve25519 box key pairs.
//!
//! A key pair is either random (one per session), derived from a seed string
//! with SHA-512, or derived from a passphrase through [`crate::kdf`]. The
//! secret is a `StaticSecret`, which zeroizes itself on drop, and `Debug`
//! never prints it.

use std::fmt;

use rand_core::OsRng;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, Zeroizing};

use crate::hash::sha512;
use crate::identity::IdentityCodec;
use crate::KEY_LEN;

pub struct KeyPair {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair from the OS RNG.
    pub fn generate() -> Self {
        Self::from_static(StaticSecret::random_from_rng(OsRng))
    }

    /// Rebuild a key pair from its 32 secret bytes.
    pub fn from_secret_key(secret_key: [u8; KEY_LEN]) -> Self {
        let mut secret_key = secret_key;
        let pair = Self::from_static(StaticSecret::from(secret_key));
        secret_key.zeroize();
        pair
    }

    /// Deterministic key pair: secret = first 32 bytes of SHA-512(seed).
    ///
    /// Only as strong as the seed; use [`crate::kdf`] for human passphrases.
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut digest = sha512(seed);
        let mut secret = [0u8; KEY_LEN];
        secret.copy_from_slice(&digest[..KEY_LEN]);
        digest.zeroize();
        Self::from_secret_key(secret)
    }

    fn from_static(secret: StaticSecret) -> Self {
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_key(&self) -> [u8; KEY_LEN] {
        *self.public.as_bytes()
    }

    pub fn secret_key(&self) -> Zeroizing<[u8; KEY_LEN]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    /// Identity string for this pair under the default identity codec.
    pub fn address(&self) -> String {
        IdentityCodec::default().derive_address(&self.public_key())
    }

    /// Whether this pair could be the target of a challenge carrying `hint`.
    pub fn matches_hint(&self, hint: u8) -> bool {
        self.public.as_bytes()[0] == hint
    }

    pub(crate) fn box_secret(&self) -> crypto_box::SecretKey {
        crypto_box::SecretKey::from(self.secret.to_bytes())
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self::from_secret_key(self.secret.to_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public.as_bytes())
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Pick the pairs a challenge may be addressed to, preserving order.
pub fn candidates_for_hint(key_pairs: &[KeyPair], hint: u8) -> impl Iterator<Item = &KeyPair> {
    key_pairs.iter().filter(move |kp| kp.matches_hint(hint))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PUBLIC_KEY: [u8; 32] = [
        178, 52, 221, 72, 147, 67, 27, 234, 88, 14, 14, 203, 48, 76, 47, 15, 133, 234, 195, 29,
        127, 154, 198, 193, 116, 245, 201, 225, 223, 167, 217, 119,
    ];

    #[test]
    fn test_seed_regression_vector() {
        let kp = KeyPair::from_seed(b"TEST");
        assert_eq!(kp.public_key(), TEST_PUBLIC_KEY);
    }

    #[test]
    fn test_seed_secret_is_sha512_prefix() {
        let kp = KeyPair::from_seed(b"TEST");
        assert_eq!(
            hex::encode(*kp.secret_key()),
            "7bfa95a688924c47c7d22381f20cc926f524beacb13f84e203d4bd8cb6ba2fce"
        );
    }

    #[test]
    fn test_from_secret_key_round_trip() {
        let kp = KeyPair::generate();
        let rebuilt = KeyPair::from_secret_key(*kp.secret_key());
        assert_eq!(kp.public_key(), rebuilt.public_key());
    }

    #[test]
    fn test_generate_is_random() {
        assert_ne!(KeyPair::generate().public_key(), KeyPair::generate().public_key());
    }

    #[test]
    fn test_public_key_matches_crypto_box() {
        let kp = KeyPair::from_seed(b"ClientSecret");
        assert_eq!(kp.box_secret().public_key().as_bytes(), &kp.public_key());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let kp = KeyPair::from_seed(b"TEST");
        let printed = format!("{kp:?}");
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("123, 250"));
    }

    #[test]
    fn test_candidates_for_hint() {
        let pairs = vec![
            KeyPair::from_seed(b"TEST"),
            KeyPair::from_seed(b"ClientSecret"),
            KeyPair::from_seed(b"ServerSecret"),
        ];
        let found: Vec<_> = candidates_for_hint(&pairs, 178).map(|kp| kp.public_key()).collect();
        assert_eq!(found, vec![TEST_PUBLIC_KEY]);
        assert_eq!(candidates_for_hint(&pairs, 1).count(), 0);
    }
}
