//! The `token` command

use clap::{Args, Subcommand};
use dotp_crypto::token::random_nonce;
use dotp_crypto::{ResponsePayload, ResponseTokenCodec};

use crate::cli::CommandContext;
use crate::output::{DecodedTokenOutput, TokenOutput};
use crate::{parse_hex_array, unix_now, ExitCode};

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommands,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommands {
    /// Encrypt a response payload under a shared key
    Encode {
        /// Shared key as 64 hex characters
        #[arg(long, env = "DOTP_TOKEN_KEY", hide_env_values = true)]
        key: String,
        #[arg(long)]
        otp: Option<String>,
        /// Expiry as Unix seconds
        #[arg(long)]
        expires_at: Option<u64>,
        /// Nonce as 48 hex characters (random if omitted)
        #[arg(long)]
        nonce: Option<String>,
    },
    /// Decrypt and validate a response token
    Decode {
        token: String,
        #[arg(long, env = "DOTP_TOKEN_KEY", hide_env_values = true)]
        key: String,
    },
}

impl TokenArgs {
    pub fn execute(self, ctx: &CommandContext) -> anyhow::Result<ExitCode> {
        let codec = ResponseTokenCodec::new(ctx.config.encoding()?);
        match self.command {
            TokenCommands::Encode { key, otp, expires_at, nonce } => {
                let key = parse_hex_array(&key, "token key")?;
                let nonce = match nonce {
                    Some(hex) => parse_hex_array(&hex, "nonce")?,
                    None => random_nonce()?,
                };
                let payload = ResponsePayload { otp, expires_at };
                let token = codec.encode(&payload, &nonce, &key)?;

                let output = TokenOutput { token, nonce: hex::encode(nonce) };
                ctx.emit(ctx.formatter.render(&output, "token encode"));
                Ok(ExitCode::Success)
            }
            TokenCommands::Decode { token, key } => {
                let key = parse_hex_array(&key, "token key")?;
                let decoded = codec.decode(&token, &key)?;
                let expired = decoded.payload.is_expired(unix_now());

                let output = DecodedTokenOutput {
                    otp: decoded.payload.otp,
                    expires_at: decoded.payload.expires_at,
                    nonce: hex::encode(decoded.nonce),
                    expired,
                };
                ctx.emit(ctx.formatter.render(&output, "token decode"));
                if expired {
                    ctx.formatter.warning("token has expired");
                    return Ok(ExitCode::AuthenticationFailed);
                }
                Ok(ExitCode::Success)
            }
        }
    }
}
