//! Versioned OTP challenge envelopes.
//!
//! The first byte of every envelope is a version tag that selects the field
//! layout:
//!
//! ```text
//! v0  Sealed    0x00 || hint || sealed_box
//! v1  Expiring  0x01 || expires_at (5, BE) || hint || nonce (24) || sender_pub (32) || box
//! ```
//!
//! `hint` is the first byte of the recipient public key. It lets a recipient
//! holding several key pairs pick the right one and is never checked against
//! the identity.
//!
//! A codec only understands versions up to its configured maximum; anything
//! newer is rejected rather than parsed on a best-effort basis.
//!
//! Only the box is authenticated. In v1 the expiry, nonce and sender key sit
//! in the clear header: a changed nonce or sender key fails to open, but a
//! changed expiry opens to the same OTP with the altered value.

use tracing::{debug, trace};

use crate::encoding::TextEncoding;
use crate::error::CryptoError;
use crate::identity::IdentityCodec;
use crate::keys::{candidates_for_hint, KeyPair};
use crate::sealed::{box_decrypt, box_encrypt};
use crate::{sealed, KEY_LEN, NONCE_LEN};

/// Envelope version produced by default codecs.
pub const CURRENT_VERSION: ProtocolVersion = ProtocolVersion::Sealed;

/// Separates the OTP from an optional context string inside the plaintext.
/// An OTP must therefore never contain this byte.
pub const CONTEXT_DELIMITER: u8 = 0x00;

/// Width of the big-endian expiry field.
pub const EXPIRY_LEN: usize = 5;

/// Largest expiry that fits the 40-bit field.
pub const MAX_EXPIRES_AT: u64 = (1 << (8 * EXPIRY_LEN)) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ProtocolVersion {
    /// Anonymous sealed box, nonce derived from the public keys.
    Sealed = 0,
    /// Box from a long-term challenger key, explicit nonce and expiry.
    Expiring = 1,
}

/// How the box nonce reaches the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceStrategy {
    /// Recomputed from `ephemeral_pub || recipient_pub`; not on the wire.
    DerivedFromKeys,
    /// Carried in the envelope together with the sender public key.
    Transmitted,
}

/// Fixed-width fields of one protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub has_expiry: bool,
    pub nonce: NonceStrategy,
}

impl Layout {
    /// Bytes before the variable-length payload, version byte included.
    pub const fn header_len(&self) -> usize {
        let mut len = 1 + 1;
        if self.has_expiry {
            len += EXPIRY_LEN;
        }
        if matches!(self.nonce, NonceStrategy::Transmitted) {
            len += NONCE_LEN + KEY_LEN;
        }
        len
    }
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 2] = [ProtocolVersion::Sealed, ProtocolVersion::Expiring];

    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.tag() == tag)
    }

    pub const fn layout(self) -> Layout {
        match self {
            Self::Sealed => Layout {
                has_expiry: false,
                nonce: NonceStrategy::DerivedFromKeys,
            },
            Self::Expiring => Layout {
                has_expiry: true,
                nonce: NonceStrategy::Transmitted,
            },
        }
    }
}

/// Sender key and nonce carried by layouts with a transmitted nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderBinding {
    pub nonce: [u8; NONCE_LEN],
    pub public_key: [u8; KEY_LEN],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeEnvelope {
    pub version: ProtocolVersion,
    pub expires_at: Option<u64>,
    pub recipient_hint: u8,
    pub sender: Option<SenderBinding>,
    pub payload: Vec<u8>,
}

impl ChallengeEnvelope {
    /// A current-version envelope around an already sealed box.
    pub fn sealed(recipient_hint: u8, payload: Vec<u8>) -> Self {
        Self {
            version: ProtocolVersion::Sealed,
            expires_at: None,
            recipient_hint,
            sender: None,
            payload,
        }
    }

    pub fn expiring(
        expires_at: u64,
        recipient_hint: u8,
        sender: SenderBinding,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            version: ProtocolVersion::Expiring,
            expires_at: Some(expires_at),
            recipient_hint,
            sender: Some(sender),
            payload,
        }
    }

    /// Lay the envelope out in its version's field order.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        let layout = self.version.layout();
        let mut out = Vec::with_capacity(layout.header_len() + self.payload.len());
        out.push(self.version.tag());

        if layout.has_expiry {
            let expires_at = self.expires_at.ok_or(CryptoError::InvalidField("expires_at missing"))?;
            if expires_at > MAX_EXPIRES_AT {
                return Err(CryptoError::InvalidField("expires_at exceeds 40 bits"));
            }
            out.extend_from_slice(&expires_at.to_be_bytes()[8 - EXPIRY_LEN..]);
        }

        out.push(self.recipient_hint);

        if layout.nonce == NonceStrategy::Transmitted {
            let sender = self.sender.as_ref().ok_or(CryptoError::InvalidField("sender missing"))?;
            out.extend_from_slice(&sender.nonce);
            out.extend_from_slice(&sender.public_key);
        }

        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Slice raw envelope bytes, accepting versions up to `max_version`.
    pub fn from_bytes(bytes: &[u8], max_version: ProtocolVersion) -> Result<Self, CryptoError> {
        let (&tag, _) = bytes.split_first().ok_or(CryptoError::MalformedEnvelope {
            expected: 1,
            got: 0,
        })?;

        let version = ProtocolVersion::from_tag(tag)
            .filter(|v| *v <= max_version)
            .ok_or(CryptoError::UnsupportedVersion {
                found: tag,
                supported: max_version.tag(),
            })?;

        let layout = version.layout();
        let header_len = layout.header_len();
        if bytes.len() < header_len {
            return Err(CryptoError::MalformedEnvelope {
                expected: header_len,
                got: bytes.len(),
            });
        }

        let mut off = 1;
        let expires_at = if layout.has_expiry {
            let mut be = [0u8; 8];
            be[8 - EXPIRY_LEN..].copy_from_slice(&bytes[off..off + EXPIRY_LEN]);
            off += EXPIRY_LEN;
            Some(u64::from_be_bytes(be))
        } else {
            None
        };

        let recipient_hint = bytes[off];
        off += 1;

        let sender = if layout.nonce == NonceStrategy::Transmitted {
            let mut nonce = [0u8; NONCE_LEN];
            nonce.copy_from_slice(&bytes[off..off + NONCE_LEN]);
            off += NONCE_LEN;
            let mut public_key = [0u8; KEY_LEN];
            public_key.copy_from_slice(&bytes[off..off + KEY_LEN]);
            off += KEY_LEN;
            Some(SenderBinding { nonce, public_key })
        } else {
            None
        };

        Ok(Self {
            version,
            expires_at,
            recipient_hint,
            sender,
            payload: bytes[off..].to_vec(),
        })
    }
}

/// Current-version envelope bytes for a sealed payload: `0x00 || hint || payload`.
pub fn build_challenge(recipient_hint: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + payload.len());
    out.push(CURRENT_VERSION.tag());
    out.push(recipient_hint);
    out.extend_from_slice(payload);
    out
}

/// What a recipient recovers from a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedChallenge {
    pub otp: Vec<u8>,
    pub context: Option<String>,
    /// Expiry copied from the v1 header. It is outside the box and not
    /// authenticated, so the challenger has to enforce it when the OTP comes back.
    pub expires_at: Option<u64>,
}

impl OpenedChallenge {
    /// Compare the header expiry with `now_unix`.
    ///
    /// False for envelopes without an expiry field. The answer is advisory:
    /// anyone relaying the challenge can rewrite the expiry without breaking the box.
    pub fn is_expired(&self, now_unix: u64) -> bool {
        self.expires_at.is_some_and(|t| now_unix >= t)
    }

    pub fn otp_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.otp).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Highest version this codec will parse or produce.
    pub max_version: ProtocolVersion,
    pub encoding: TextEncoding,
    pub identity: IdentityCodec,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_version: CURRENT_VERSION,
            encoding: TextEncoding::Base58,
            identity: IdentityCodec::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChallengeCodec {
    config: CodecConfig,
}

impl ChallengeCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn check_version(&self, version: ProtocolVersion) -> Result<(), CryptoError> {
        if version > self.config.max_version {
            return Err(CryptoError::UnsupportedVersion {
                found: version.tag(),
                supported: self.config.max_version.tag(),
            });
        }
        Ok(())
    }

    pub fn build(&self, envelope: &ChallengeEnvelope) -> Result<Vec<u8>, CryptoError> {
        self.check_version(envelope.version)?;
        envelope.to_bytes()
    }

    pub fn serialize(&self, envelope: &ChallengeEnvelope) -> Result<String, CryptoError> {
        let bytes = self.build(envelope)?;
        Ok(self.config.encoding.encode(&bytes))
    }

    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<ChallengeEnvelope, CryptoError> {
        ChallengeEnvelope::from_bytes(bytes, self.config.max_version)
    }

    pub fn parse(&self, text: &str) -> Result<ChallengeEnvelope, CryptoError> {
        let bytes = self.config.encoding.decode(text)?;
        self.parse_bytes(&bytes)
    }

    /// Seal `otp` (and optional context) to the owner of `recipient_id`.
    ///
    /// `ephemeral_secret` must be fresh random bytes for every call.
    pub fn create_challenge(
        &self,
        otp: &[u8],
        recipient_id: &str,
        ephemeral_secret: &[u8; KEY_LEN],
        context: Option<&str>,
    ) -> Result<String, CryptoError> {
        let recipient_pub = self.config.identity.resolve_address(recipient_id)?;
        let plaintext = join_context(otp, context);
        let sealed_box = sealed::seal(&plaintext, &recipient_pub, ephemeral_secret)?;

        debug!(
            hint = recipient_pub[0],
            payload_len = sealed_box.len(),
            has_context = context.is_some(),
            "created sealed challenge"
        );
        self.serialize(&ChallengeEnvelope::sealed(recipient_pub[0], sealed_box))
    }

    /// Box `otp` from a long-term challenger key with an explicit nonce and expiry.
    ///
    /// Requires a codec whose maximum version admits [`ProtocolVersion::Expiring`].
    /// The nonce must never repeat for the same challenger and recipient.
    pub fn create_expiring_challenge(
        &self,
        otp: &[u8],
        recipient_id: &str,
        challenger: &KeyPair,
        nonce: &[u8; NONCE_LEN],
        expires_at: u64,
        context: Option<&str>,
    ) -> Result<String, CryptoError> {
        self.check_version(ProtocolVersion::Expiring)?;
        let recipient_pub = self.config.identity.resolve_address(recipient_id)?;
        let plaintext = join_context(otp, context);
        let boxed = box_encrypt(&plaintext, nonce, &recipient_pub, &challenger.box_secret())?;

        let sender = SenderBinding {
            nonce: *nonce,
            public_key: challenger.public_key(),
        };
        debug!(hint = recipient_pub[0], expires_at, "created expiring challenge");
        self.serialize(&ChallengeEnvelope::expiring(expires_at, recipient_pub[0], sender, boxed))
    }

    /// Recover the OTP from a challenge addressed to `own`.
    pub fn open_challenge(&self, text: &str, own: &KeyPair) -> Result<OpenedChallenge, CryptoError> {
        let envelope = self.parse(text)?;
        open_envelope(&envelope, own)
    }

    /// Open with whichever of `key_pairs` the routing hint points at.
    pub fn open_challenge_with_any(
        &self,
        text: &str,
        key_pairs: &[KeyPair],
    ) -> Result<OpenedChallenge, CryptoError> {
        let envelope = self.parse(text)?;
        for kp in candidates_for_hint(key_pairs, envelope.recipient_hint) {
            match open_envelope(&envelope, kp) {
                Ok(opened) => return Ok(opened),
                Err(CryptoError::AuthFailure) => {
                    trace!(hint = envelope.recipient_hint, "candidate key did not open challenge");
                }
                Err(e) => return Err(e),
            }
        }
        Err(CryptoError::AuthFailure)
    }
}

fn open_envelope(envelope: &ChallengeEnvelope, own: &KeyPair) -> Result<OpenedChallenge, CryptoError> {
    let plaintext = match envelope.version.layout().nonce {
        NonceStrategy::DerivedFromKeys => sealed::open(&envelope.payload, own)?,
        NonceStrategy::Transmitted => {
            let sender = envelope
                .sender
                .as_ref()
                .ok_or(CryptoError::InvalidField("sender missing"))?;
            box_decrypt(&envelope.payload, &sender.nonce, &sender.public_key, &own.box_secret())?
        }
    };

    let (otp, context) = split_context(&plaintext)?;
    Ok(OpenedChallenge {
        otp,
        context,
        expires_at: envelope.expires_at,
    })
}

fn join_context(otp: &[u8], context: Option<&str>) -> Vec<u8> {
    let mut plaintext = otp.to_vec();
    if let Some(context) = context {
        plaintext.push(CONTEXT_DELIMITER);
        plaintext.extend_from_slice(context.as_bytes());
    }
    plaintext
}

fn split_context(plaintext: &[u8]) -> Result<(Vec<u8>, Option<String>), CryptoError> {
    match plaintext.iter().position(|b| *b == CONTEXT_DELIMITER) {
        None => Ok((plaintext.to_vec(), None)),
        Some(i) => {
            let context = std::str::from_utf8(&plaintext[i + 1..])
                .map_err(|_| CryptoError::MalformedPayload("context is not UTF-8".into()))?;
            Ok((plaintext[..i].to_vec(), Some(context.to_string())))
        }
    }
}
