//! dotp command-line tool
//!
//! Thin shell over `dotp-crypto` for:
//! - Deriving key pairs and identity strings
//! - Creating, opening and inspecting OTP challenges
//! - Encoding and decoding response tokens

pub mod challenge;
pub mod cli;
pub mod config;
pub mod identity;
pub mod keys;
pub mod output;
pub mod token;

#[cfg(test)]
mod proptests;

use dotp_crypto::CryptoError;

pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use output::{JsonResponse, OutputFormat, OutputFormatter};

/// Exit codes for CLI operations
///
/// - 0: Success
/// - 1: General error
/// - 2: Authentication failed (a challenge or token did not open, or has expired)
/// - 5: Invalid input (bad identity, hex, encoding or envelope)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    AuthenticationFailed = 2,
    InvalidInput = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::AuthenticationFailed => "AUTH_FAILED",
            ExitCode::InvalidInput => "INVALID_INPUT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::AuthenticationFailed => "Challenge or token could not be opened",
            ExitCode::InvalidInput => "Invalid arguments or data provided",
        }
    }

    /// Classify a command failure.
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<InvalidInput>().is_some() {
            return ExitCode::InvalidInput;
        }
        match err.downcast_ref::<CryptoError>() {
            Some(CryptoError::AuthFailure) => ExitCode::AuthenticationFailed,
            Some(e) if e.is_validation() => ExitCode::InvalidInput,
            Some(CryptoError::MalformedPayload(_)) => ExitCode::InvalidInput,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Bad command-line input that clap cannot catch on its own.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct InvalidInput(pub String);

/// Parse a hex string into a fixed-size array.
pub fn parse_hex_array<const N: usize>(value: &str, what: &str) -> Result<[u8; N], InvalidInput> {
    let bytes = hex::decode(value.trim())
        .map_err(|e| InvalidInput(format!("{what} is not valid hex: {e}")))?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
        InvalidInput(format!("{what} must be {N} bytes ({} hex chars), got {}", N * 2, bytes.len()))
    })
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
