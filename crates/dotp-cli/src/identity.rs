//! The `id` command: identity strings to public keys and back

use clap::{Args, Subcommand};
use dotp_crypto::{ChecksumScheme, IdentityCodec};

use crate::cli::CommandContext;
use crate::output::IdentityOutput;
use crate::{parse_hex_array, ExitCode};

#[derive(Args, Debug)]
pub struct IdArgs {
    #[command(subcommand)]
    pub command: IdCommands,
}

#[derive(Subcommand, Debug)]
pub enum IdCommands {
    /// Validate an identity string and print its public key
    Resolve {
        /// Identity string
        identity: String,
    },
    /// Derive the identity string for a hex public key
    FromKey {
        /// Public key as 64 hex characters
        public_key: String,
    },
}

impl IdArgs {
    pub fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        let codec = ctx.config.identity_codec()?;
        let (public_key, command) = match self.command {
            IdCommands::Resolve { identity } => (codec.resolve_address(&identity)?, "id resolve"),
            IdCommands::FromKey { public_key } => (parse_hex_array(&public_key, "public key")?, "id from-key"),
        };

        ctx.emit(ctx.formatter.render(&identity_output(&codec, &public_key), command));
        Ok(ExitCode::Success)
    }
}

pub fn identity_output(codec: &IdentityCodec, public_key: &[u8; 32]) -> IdentityOutput {
    IdentityOutput {
        identity: codec.derive_address(public_key),
        public_key: hex::encode(public_key),
        hint: public_key[0],
        checksum: match codec.checksum {
            ChecksumScheme::Sha512 => "sha512",
            ChecksumScheme::Blake2s => "blake2s",
        }
        .to_string(),
        encoding: codec.encoding.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::output::OutputFormat;

    fn quiet_ctx() -> CommandContext {
        let mut config = Config::default();
        config.output.format = OutputFormat::Quiet.to_string();
        CommandContext::new(config)
    }

    #[test]
    fn test_identity_output() {
        let pk: [u8; 32] =
            parse_hex_array("b234dd4893431bea580e0ecb304c2f0f85eac31d7f9ac6c174f5c9e1dfa7d977", "pk").unwrap();
        let out = identity_output(&IdentityCodec::default(), &pk);
        assert_eq!(out.identity, "uwRjspFVUtLh9AFNBGS7ehDoy7gNadefHPQ5WTowSygW6");
        assert_eq!(out.hint, 0xb2);
        assert_eq!(out.checksum, "sha512");
        assert_eq!(out.encoding, "base58");
    }

    #[test]
    fn test_resolve_bad_checksum_is_invalid_input() {
        let args = IdArgs {
            command: IdCommands::Resolve {
                identity: "uwRjspFVUtLh9AFNBGS7ehDoy7gNadefHPQ5WTowSygW7".into(),
            },
        };
        let err = args.execute(&quiet_ctx()).unwrap_err();
        assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidInput);
    }

    #[test]
    fn test_from_key_succeeds() {
        let args = IdArgs {
            command: IdCommands::FromKey {
                public_key: "b234dd4893431bea580e0ecb304c2f0f85eac31d7f9ac6c174f5c9e1dfa7d977".into(),
            },
        };
        assert_eq!(args.execute(&quiet_ctx()).unwrap(), ExitCode::Success);
    }
}
