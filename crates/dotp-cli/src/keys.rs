//! Key pair sources and the `keys` command

use clap::{Args, Subcommand};
use dotp_crypto::kdf::derive_key_pair_async;
use dotp_crypto::{IdentityCodec, KdfParams, KeyPair};
use tracing::info;

use crate::cli::CommandContext;
use crate::output::KeyOutput;
use crate::{parse_hex_array, ExitCode, InvalidInput};

/// Where a long-term key pair comes from. Exactly one source must be given.
#[derive(Args, Debug, Clone, Default)]
pub struct KeySourceArgs {
    /// Seed string; secret = SHA-512(seed)[..32]
    #[arg(long)]
    pub seed: Option<String>,

    /// Secret key as 64 hex characters
    #[arg(long, env = "DOTP_SECRET_KEY", hide_env_values = true)]
    pub secret: Option<String>,

    /// Passphrase, hardened with scrypt (requires --salt)
    #[arg(long, env = "DOTP_PASSPHRASE", hide_env_values = true, requires = "salt")]
    pub passphrase: Option<String>,

    /// Public salt for --passphrase, usually an e-mail address
    #[arg(long)]
    pub salt: Option<String>,
}

impl KeySourceArgs {
    fn source_count(&self) -> usize {
        [self.seed.is_some(), self.secret.is_some(), self.passphrase.is_some()]
            .into_iter()
            .filter(|set| *set)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.source_count() == 0
    }

    pub async fn resolve(&self, kdf: KdfParams) -> anyhow::Result<KeyPair> {
        match self.source_count() {
            0 => return Err(InvalidInput("one of --seed, --secret or --passphrase is required".into()).into()),
            1 => {}
            _ => return Err(InvalidInput("--seed, --secret and --passphrase are mutually exclusive".into()).into()),
        }

        if let Some(seed) = &self.seed {
            return Ok(KeyPair::from_seed(seed.as_bytes()));
        }
        if let Some(secret) = &self.secret {
            return Ok(KeyPair::from_secret_key(parse_hex_array(secret, "secret key")?));
        }

        let passphrase = self.passphrase.clone().unwrap_or_default();
        let salt = self
            .salt
            .clone()
            .ok_or_else(|| InvalidInput("--passphrase requires --salt".into()))?;
        if kdf != KdfParams::INTEROP {
            info!(log_n = kdf.log_n, r = kdf.r, p = kdf.p, "using non-default scrypt parameters");
        }
        Ok(derive_key_pair_async(passphrase, salt, kdf).await?)
    }
}

#[derive(Args, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommands,
}

#[derive(Subcommand, Debug)]
pub enum KeysCommands {
    /// Derive a key pair and print its identity
    Derive(DeriveArgs),
}

#[derive(Args, Debug)]
pub struct DeriveArgs {
    #[command(flatten)]
    pub source: KeySourceArgs,

    /// Generate a fresh random key pair instead
    #[arg(long)]
    pub generate: bool,

    /// Include the secret key in the output
    #[arg(long)]
    pub show_secret: bool,
}

impl KeysArgs {
    pub async fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        match self.command {
            KeysCommands::Derive(args) => args.execute(ctx).await,
        }
    }
}

impl DeriveArgs {
    pub async fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        let kp = if self.generate {
            if !self.source.is_empty() {
                return Err(InvalidInput("--generate cannot be combined with a key source".into()).into());
            }
            KeyPair::generate()
        } else {
            ctx.formatter.progress("deriving key pair");
            self.source.resolve(ctx.config.kdf_params()).await?
        };

        let output = key_output(&kp, &ctx.config.identity_codec()?, self.show_secret);
        ctx.emit(ctx.formatter.render(&output, "keys derive"));
        Ok(ExitCode::Success)
    }
}

pub fn key_output(kp: &KeyPair, codec: &IdentityCodec, show_secret: bool) -> KeyOutput {
    let public_key = kp.public_key();
    KeyOutput {
        identity: codec.derive_address(&public_key),
        public_key: hex::encode(public_key),
        hint: public_key[0],
        secret_key: show_secret.then(|| hex::encode(*kp.secret_key())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ID: &str = "uwRjspFVUtLh9AFNBGS7ehDoy7gNadefHPQ5WTowSygW6";

    #[tokio::test]
    async fn test_seed_source() {
        let source = KeySourceArgs { seed: Some("TEST".into()), ..Default::default() };
        let kp = source.resolve(KdfParams::INTEROP).await.unwrap();
        assert_eq!(kp.address(), TEST_ID);
    }

    #[tokio::test]
    async fn test_secret_source() {
        let source = KeySourceArgs {
            secret: Some("7bfa95a688924c47c7d22381f20cc926f524beacb13f84e203d4bd8cb6ba2fce".into()),
            ..Default::default()
        };
        let kp = source.resolve(KdfParams::INTEROP).await.unwrap();
        assert_eq!(kp.address(), TEST_ID);
    }

    #[tokio::test]
    async fn test_passphrase_source() {
        let source = KeySourceArgs {
            passphrase: Some("correct horse battery staple".into()),
            salt: Some("alice@example.com".into()),
            ..Default::default()
        };
        let kp = source.resolve(KdfParams { log_n: 10, r: 8, p: 1 }).await.unwrap();
        assert_eq!(kp.address(), "2GTabddoKNKsYZQizcn6FVpTSfWaUBoYxoB7M6sE3hL1EX");
    }

    #[tokio::test]
    async fn test_source_required_and_exclusive() {
        let err = KeySourceArgs::default().resolve(KdfParams::INTEROP).await.unwrap_err();
        assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidInput);

        let both = KeySourceArgs {
            seed: Some("a".into()),
            secret: Some("00".into()),
            ..Default::default()
        };
        let err = both.resolve(KdfParams::INTEROP).await.unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[tokio::test]
    async fn test_bad_secret_hex() {
        let source = KeySourceArgs { secret: Some("abcd".into()), ..Default::default() };
        let err = source.resolve(KdfParams::INTEROP).await.unwrap_err();
        assert_eq!(ExitCode::for_error(&err), ExitCode::InvalidInput);
    }

    #[test]
    fn test_key_output() {
        let kp = KeyPair::from_seed(b"TEST");
        let out = key_output(&kp, &IdentityCodec::default(), false);
        assert_eq!(out.identity, TEST_ID);
        assert_eq!(out.hint, 178);
        assert!(out.secret_key.is_none());

        let out = key_output(&kp, &IdentityCodec::default(), true);
        assert_eq!(
            out.secret_key.as_deref(),
            Some("7bfa95a688924c47c7d22381f20cc926f524beacb13f84e203d4bd8cb6ba2fce")
        );
    }
}
