use blake2::digest::consts::{U1, U24};
use blake2::{Blake2b, Blake2s, Blake2s256};
use sha2::{Digest, Sha512};

use crate::{KEY_LEN, NONCE_LEN};

pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut h = Sha512::new();
    Digest::update(&mut h, data);
    let out = h.finalize();
    let mut arr = [0u8; 64];
    arr.copy_from_slice(&out);
    arr
}

pub fn blake2s_256(data: &[u8]) -> [u8; 32] {
    let mut h = Blake2s256::new();
    Digest::update(&mut h, data);
    let out = h.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}

/// BLAKE2s with a one byte output, used by the earliest identity checksum.
pub fn blake2s_byte(data: &[u8]) -> u8 {
    let mut h = Blake2s::<U1>::new();
    Digest::update(&mut h, data);
    h.finalize()[0]
}

/// nonce = BLAKE2b-24(ephemeral_pub || recipient_pub), as in libsodium's sealed boxes.
pub fn sealed_box_nonce(ephemeral_pub: &[u8; KEY_LEN], recipient_pub: &[u8; KEY_LEN]) -> [u8; NONCE_LEN] {
    let mut h = Blake2b::<U24>::new();
    Digest::update(&mut h, ephemeral_pub);
    Digest::update(&mut h, recipient_pub);
    let out = h.finalize();
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&out);
    nonce
}
