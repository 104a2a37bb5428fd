//! Printable text encodings for identities, challenges and tokens.
//!
//! Base58 uses the Bitcoin alphabet. Base32 uses the RFC 4648 alphabet with
//! every `=` pad rendered as `-` so the result survives URLs and QR codes.

use std::fmt;
use std::str::FromStr;

use data_encoding::BASE32;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

const PAD: char = '=';
const URL_SAFE_PAD: char = '-';

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    Base58,
    Base32,
}

impl TextEncoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Self::Base58 => bs58::encode(bytes).into_string(),
            Self::Base32 => BASE32.encode(bytes).replace(PAD, &URL_SAFE_PAD.to_string()),
        }
    }

    pub fn decode(self, text: &str) -> Result<Vec<u8>, CryptoError> {
        let text = text.trim();
        let decoded = match self {
            Self::Base58 => bs58::decode(text).into_vec().ok(),
            Self::Base32 => {
                let padded = text.replace(URL_SAFE_PAD, &PAD.to_string());
                BASE32.decode(padded.as_bytes()).ok()
            }
        };
        decoded.ok_or(CryptoError::InvalidEncoding { encoding: self })
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base58 => write!(f, "base58"),
            Self::Base32 => write!(f, "base32"),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base58" | "b58" => Ok(Self::Base58),
            "base32" | "b32" => Ok(Self::Base32),
            _ => Err(format!("Unknown text encoding: {s}")),
        }
    }
}
