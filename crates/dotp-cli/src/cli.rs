//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dotp_crypto::TextEncoding;

use crate::challenge::ChallengeArgs;
use crate::config::Config;
use crate::identity::IdArgs;
use crate::keys::KeysArgs;
use crate::output::{OutputFormat, OutputFormatter};
use crate::token::TokenArgs;
use crate::ExitCode;

/// dotp - deliver one-time passwords to public identities
#[derive(Parser, Debug)]
#[command(name = "dotp")]
#[command(version, about = "dotp - deliver one-time passwords to public identities")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: table, json, quiet
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true, env = "DOTP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Text encoding for identities, challenges and tokens: base58, base32
    #[arg(long, global = true)]
    pub encoding: Option<TextEncoding>,

    /// Highest envelope version to accept or produce
    #[arg(long, global = true)]
    pub max_version: Option<u8>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive key pairs
    Keys(KeysArgs),
    /// Resolve and derive identity strings
    Id(IdArgs),
    /// Create, open and inspect OTP challenges
    Challenge(ChallengeArgs),
    /// Encode and decode response tokens
    Token(TokenArgs),
}

/// Resolved configuration and output settings passed to every command.
pub struct CommandContext {
    pub config: Config,
    pub formatter: OutputFormatter,
}

impl CommandContext {
    pub fn new(config: Config) -> Self {
        let format = config.output.format.parse().unwrap_or_default();
        let formatter = OutputFormatter::new(format, config.output.verbose);
        Self { config, formatter }
    }

    /// Print a rendered result unless it is empty.
    pub fn emit(&self, rendered: String) {
        if !rendered.is_empty() {
            println!("{rendered}");
        }
    }
}

impl Cli {
    /// Execute the CLI command with a pre-loaded configuration
    pub async fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let ctx = CommandContext::new(config);
        match self.command {
            Commands::Keys(args) => args.execute(&ctx).await,
            Commands::Id(args) => args.execute(&ctx),
            Commands::Challenge(args) => args.execute(&ctx).await,
            Commands::Token(args) => args.execute(&ctx),
        }
    }
}
