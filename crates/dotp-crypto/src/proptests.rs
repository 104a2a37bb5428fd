
#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::challenge::{ChallengeCodec, ChallengeEnvelope, CodecConfig, ProtocolVersion, SenderBinding, MAX_EXPIRES_AT};
    use crate::encoding::TextEncoding;
    use crate::error::CryptoError;
    use crate::identity::{ChecksumScheme, IdentityCodec};
    use crate::keys::KeyPair;
    use crate::sealed::{open, seal};
    use crate::token::{ResponsePayload, ResponseTokenCodec};

    fn any_encoding() -> impl Strategy<Value = TextEncoding> {
        prop_oneof![Just(TextEncoding::Base58), Just(TextEncoding::Base32)]
    }

    fn any_checksum() -> impl Strategy<Value = ChecksumScheme> {
        prop_oneof![Just(ChecksumScheme::Sha512), Just(ChecksumScheme::Blake2s)]
    }

    proptest! {
        #[test]
        fn test_identity_round_trip(
            key in any::<[u8; 32]>(),
            checksum in any_checksum(),
            encoding in any_encoding(),
        ) {
            let codec = IdentityCodec::new(checksum, encoding);
            let id = codec.derive_address(&key);
            prop_assert_eq!(codec.resolve_address(&id), Ok(key));
        }

        #[test]
        fn test_identity_bad_checksum(key in any::<[u8; 32]>(), delta in 1u8..=255) {
            let codec = IdentityCodec::default();
            let mut raw = key.to_vec();
            raw.push(codec.checksum.checksum(&key).wrapping_add(delta));
            let id = TextEncoding::Base58.encode(&raw);
            prop_assert_eq!(codec.resolve_address(&id), Err(CryptoError::ChecksumMismatch));
        }

        #[test]
        fn test_identity_wrong_length(raw in proptest::collection::vec(any::<u8>(), 1..80)) {
            prop_assume!(raw.len() != 33);
            let id = TextEncoding::Base58.encode(&raw);
            let is_malformed = matches!(
                IdentityCodec::default().resolve_address(&id),
                Err(CryptoError::MalformedIdentity { .. })
            );
            prop_assert!(is_malformed);
        }

        #[test]
        fn test_seal_open_round_trip(
            recipient_secret in any::<[u8; 32]>(),
            ephemeral in any::<[u8; 32]>(),
            plaintext in any::<Vec<u8>>(),
        ) {
            let recipient = KeyPair::from_secret_key(recipient_secret);
            let sealed = seal(&plaintext, &recipient.public_key(), &ephemeral).unwrap();
            prop_assert_eq!(open(&sealed, &recipient).unwrap(), plaintext);
        }

        #[test]
        fn test_sealed_envelope_round_trip(
            hint in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..2048),
            encoding in any_encoding(),
        ) {
            let codec = ChallengeCodec::new(CodecConfig { encoding, ..CodecConfig::default() });
            let env = ChallengeEnvelope::sealed(hint, payload);
            let text = codec.serialize(&env).unwrap();
            prop_assert_eq!(codec.parse(&text).unwrap(), env);
        }

        #[test]
        fn test_expiring_envelope_round_trip(
            expires_at in 0..=MAX_EXPIRES_AT,
            hint in any::<u8>(),
            nonce in any::<[u8; 24]>(),
            public_key in any::<[u8; 32]>(),
            payload in proptest::collection::vec(any::<u8>(), 0..512),
        ) {
            let codec = ChallengeCodec::new(CodecConfig {
                max_version: ProtocolVersion::Expiring,
                ..CodecConfig::default()
            });
            let env = ChallengeEnvelope::expiring(expires_at, hint, SenderBinding { nonce, public_key }, payload);
            let text = codec.serialize(&env).unwrap();
            prop_assert_eq!(codec.parse(&text).unwrap(), env);
        }

        #[test]
        fn test_challenge_otp_round_trip(
            otp in "[0-9A-Za-z]{1,32}",
            context in proptest::option::of("[ -~]{0,64}"),
            ephemeral in any::<[u8; 32]>(),
        ) {
            let recipient = KeyPair::generate();
            let codec = ChallengeCodec::default();
            let challenge = codec
                .create_challenge(otp.as_bytes(), &recipient.address(), &ephemeral, context.as_deref())
                .unwrap();
            let opened = codec.open_challenge(&challenge, &recipient).unwrap();
            prop_assert_eq!(opened.otp, otp.into_bytes());
            prop_assert_eq!(opened.context, context);
        }

        #[test]
        fn test_token_round_trip(
            otp in proptest::option::of(".{0,40}"),
            expires_at in proptest::option::of(any::<u64>()),
            nonce in any::<[u8; 24]>(),
            key in any::<[u8; 32]>(),
        ) {
            let codec = ResponseTokenCodec::default();
            let payload = ResponsePayload { otp, expires_at };
            let text = codec.encode(&payload, &nonce, &key).unwrap();
            let token = codec.decode(&text, &key).unwrap();
            prop_assert_eq!(token.payload, payload);
            prop_assert_eq!(token.nonce, nonce);
        }
    }
}
