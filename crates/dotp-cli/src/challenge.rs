//! The `challenge` command

use anyhow::Context;
use clap::{Args, Subcommand};
use dotp_crypto::token::random_nonce;
use dotp_crypto::{ChallengeCodec, KeyPair, OpenedChallenge, ProtocolVersion};
use tracing::debug;

use crate::cli::CommandContext;
use crate::keys::KeySourceArgs;
use crate::output::{ChallengeOutput, EnvelopeOutput, OpenedOutput};
use crate::{parse_hex_array, unix_now, ExitCode, InvalidInput};

#[derive(Args, Debug)]
pub struct ChallengeArgs {
    #[command(subcommand)]
    pub command: ChallengeCommands,
}

#[derive(Subcommand, Debug)]
pub enum ChallengeCommands {
    /// Seal an OTP to a recipient identity
    Create(CreateArgs),
    /// Box an OTP from a long-term key with an expiry (version 1)
    CreateExpiring(CreateExpiringArgs),
    /// Open a challenge with your key pair
    Open(OpenArgs),
    /// Show the envelope fields of a challenge without opening it
    Inspect {
        /// Challenge text
        challenge: String,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// One-time password; must not contain NUL
    #[arg(long)]
    pub otp: String,

    /// Recipient identity string
    #[arg(long)]
    pub to: String,

    /// Context string delivered alongside the OTP
    #[arg(long)]
    pub context: Option<String>,

    /// Ephemeral secret key as hex (random if omitted). Never reuse one.
    #[arg(long)]
    pub ephemeral: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateExpiringArgs {
    #[arg(long)]
    pub otp: String,

    #[arg(long)]
    pub to: String,

    /// Expiry as Unix seconds
    #[arg(long, conflicts_with = "ttl", required_unless_present = "ttl")]
    pub expires_at: Option<u64>,

    /// Expiry as seconds from now
    #[arg(long)]
    pub ttl: Option<u64>,

    #[arg(long)]
    pub context: Option<String>,

    /// Nonce as 48 hex characters (random if omitted)
    #[arg(long)]
    pub nonce: Option<String>,

    /// Challenger key pair
    #[command(flatten)]
    pub key: KeySourceArgs,
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    pub challenge: String,

    #[command(flatten)]
    pub key: KeySourceArgs,
}

impl ChallengeArgs {
    pub async fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        let codec = ctx.config.challenge_codec()?;
        match self.command {
            ChallengeCommands::Create(args) => args.execute(ctx, &codec),
            ChallengeCommands::CreateExpiring(args) => args.execute(ctx, &codec).await,
            ChallengeCommands::Open(args) => args.execute(ctx, &codec).await,
            ChallengeCommands::Inspect { challenge } => inspect(ctx, &codec, &challenge),
        }
    }
}

fn check_otp(otp: &str) -> Result<(), InvalidInput> {
    if otp.as_bytes().contains(&dotp_crypto::challenge::CONTEXT_DELIMITER) {
        return Err(InvalidInput("OTP must not contain a NUL byte".into()));
    }
    Ok(())
}

impl CreateArgs {
    pub fn execute(self, ctx: &CommandContext, codec: &ChallengeCodec) -> anyhow::Result<ExitCode> {
        check_otp(&self.otp)?;
        let ephemeral = match &self.ephemeral {
            Some(hex) => parse_hex_array(hex, "ephemeral secret")?,
            None => *KeyPair::generate().secret_key(),
        };

        let challenge = codec
            .create_challenge(self.otp.as_bytes(), &self.to, &ephemeral, self.context.as_deref())
            .context("creating challenge")?;

        let output = ChallengeOutput::new(challenge, ProtocolVersion::Sealed.tag(), &self.to, None);
        ctx.emit(ctx.formatter.render(&output, "challenge create"));
        Ok(ExitCode::Success)
    }
}

impl CreateExpiringArgs {
    pub async fn execute(self, ctx: &CommandContext, codec: &ChallengeCodec) -> anyhow::Result<ExitCode> {
        check_otp(&self.otp)?;
        if codec.config().max_version < ProtocolVersion::Expiring {
            return Err(InvalidInput(
                "expiring challenges need max_version >= 1 (set [protocol] max_version or pass --max-version 1)".into(),
            )
            .into());
        }

        let expires_at = match (self.expires_at, self.ttl) {
            (Some(t), _) => t,
            (None, Some(ttl)) => unix_now().saturating_add(ttl),
            (None, None) => return Err(InvalidInput("--expires-at or --ttl is required".into()).into()),
        };
        let nonce = match &self.nonce {
            Some(hex) => parse_hex_array(hex, "nonce")?,
            None => random_nonce()?,
        };
        let challenger = self.key.resolve(ctx.config.kdf_params()).await?;

        let challenge = codec
            .create_expiring_challenge(
                self.otp.as_bytes(),
                &self.to,
                &challenger,
                &nonce,
                expires_at,
                self.context.as_deref(),
            )
            .context("creating expiring challenge")?;

        let output = ChallengeOutput::new(challenge, ProtocolVersion::Expiring.tag(), &self.to, Some(expires_at));
        ctx.emit(ctx.formatter.render(&output, "challenge create-expiring"));
        Ok(ExitCode::Success)
    }
}

impl OpenArgs {
    pub async fn execute(self, ctx: &CommandContext, codec: &ChallengeCodec) -> anyhow::Result<ExitCode> {
        let own = self.key.resolve(ctx.config.kdf_params()).await?;
        let opened = codec.open_challenge(&self.challenge, &own)?;
        let output = opened_output(&opened, unix_now());
        debug!(expired = output.expired, has_context = output.context.is_some(), "opened challenge");

        ctx.emit(ctx.formatter.render(&output, "challenge open"));
        if let Some(notice) = expiry_notice(&opened) {
            ctx.formatter.warning(notice);
        }
        if output.expired {
            ctx.formatter.warning("challenge claims to have expired");
            return Ok(ExitCode::AuthenticationFailed);
        }
        Ok(ExitCode::Success)
    }
}

fn inspect(ctx: &CommandContext, codec: &ChallengeCodec, challenge: &str) -> anyhow::Result<ExitCode> {
    let envelope = codec.parse(challenge)?;
    let output = EnvelopeOutput {
        version: envelope.version.tag(),
        recipient_hint: envelope.recipient_hint,
        expires_at: envelope.expires_at,
        sender_public_key: envelope.sender.as_ref().map(|s| hex::encode(s.public_key)),
        nonce: envelope.sender.as_ref().map(|s| hex::encode(s.nonce)),
        payload_len: envelope.payload.len(),
        payload: hex::encode(&envelope.payload),
    };
    ctx.emit(ctx.formatter.render(&output, "challenge inspect"));
    Ok(ExitCode::Success)
}

/// The v1 expiry is read from the clear header, so it can only be a hint here.
pub fn expiry_notice(opened: &OpenedChallenge) -> Option<&'static str> {
    opened.expires_at.map(|_| {
        "expiry is not authenticated and may have been altered in transit; the challenger must enforce it"
    })
}

pub fn opened_output(opened: &OpenedChallenge, now: u64) -> OpenedOutput {
    OpenedOutput {
        otp: String::from_utf8_lossy(&opened.otp).into_owned(),
        context: opened.context.clone(),
        expires_at: opened.expires_at,
        expiry_authenticated: false,
        expired: opened.is_expired(now),
    }
}
