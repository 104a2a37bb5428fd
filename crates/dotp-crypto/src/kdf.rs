//! Passphrase key derivation.
//!
//! secret = scrypt(BLAKE2s-256(passphrase), salt, N = 2^log_n, r, p, 32)
//!
//! The salt is normally the user's e-mail address or another public string,
//! taken as UTF-8. Only [`KdfParams::INTEROP`] produces keys that other dotp
//! implementations can reproduce.

use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::hash::blake2s_256;
use crate::keys::KeyPair;
use crate::KEY_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
}

impl KdfParams {
    pub const INTEROP: KdfParams = KdfParams { log_n: 17, r: 8, p: 1 };

    fn to_scrypt(self) -> Result<scrypt::Params, CryptoError> {
        scrypt::Params::new(self.log_n, self.r, self.p, KEY_LEN)
            .map_err(|e| CryptoError::Kdf(format!("invalid scrypt parameters: {e}")))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::INTEROP
    }
}

pub fn derive_secret_key(
    passphrase: &str,
    salt: &str,
    params: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    let scrypt_params = params.to_scrypt()?;
    let password = Zeroizing::new(blake2s_256(passphrase.as_bytes()));
    let mut secret = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(password.as_slice(), salt.as_bytes(), &scrypt_params, secret.as_mut_slice())
        .map_err(|e| CryptoError::Kdf(e.to_string()))?;
    Ok(secret)
}

/// Blocking; takes around a second at [`KdfParams::INTEROP`].
pub fn derive_key_pair(passphrase: &str, salt: &str, params: KdfParams) -> Result<KeyPair, CryptoError> {
    debug!(log_n = params.log_n, r = params.r, p = params.p, "deriving key pair from passphrase");
    let secret = derive_secret_key(passphrase, salt, params)?;
    Ok(KeyPair::from_secret_key(*secret))
}

/// [`derive_key_pair`] on the tokio blocking pool.
pub async fn derive_key_pair_async(
    passphrase: String,
    salt: String,
    params: KdfParams,
) -> Result<KeyPair, CryptoError> {
    let passphrase = Zeroizing::new(passphrase);
    tokio::task::spawn_blocking(move || derive_key_pair(&passphrase, &salt, params))
        .await
        .map_err(|e| CryptoError::Kdf(format!("worker failed: {e}")))?
}
