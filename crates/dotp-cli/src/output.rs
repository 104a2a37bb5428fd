//! Output formatting for CLI results
//!
//! Three output formats are supported:
//! - Table: Human-readable property tables (default)
//! - JSON: Structured JSON for scripting and automation
//! - Quiet: Only the primary value (the challenge, the OTP, the token, ...)

use std::str::FromStr;

use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::ExitCode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper for consistent schema
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn success_with_command(data: T, command: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: Some(command.to_string()),
        }
    }
}

impl JsonResponse<()> {
    pub fn error(message: &str) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: None,
        }
    }
}

/// A command result that can be shown in every output format.
pub trait Report: Serialize {
    /// Property/value pairs for the table view.
    fn rows(&self) -> Vec<(&'static str, String)>;

    /// The single value printed in quiet mode.
    fn primary(&self) -> String;
}

pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    pub fn render<T: Report>(&self, report: &T, command: &str) -> String {
        match self.format {
            OutputFormat::Table => property_table(&report.rows()),
            OutputFormat::Json => self.to_json_response(report, command),
            OutputFormat::Quiet => report.primary(),
        }
    }

    /// Format error with exit code context
    pub fn format_error_with_code(&self, error: &anyhow::Error, code: ExitCode) -> String {
        match self.format {
            OutputFormat::Table => format!("Error: {error:#}"),
            OutputFormat::Json => {
                let response = JsonResponse::<()>::error(&format!("{error:#}"));
                let mut output = serde_json::to_value(&response).unwrap_or_default();
                output["exit_code"] = serde_json::json!(code as i32);
                output["exit_code_name"] = serde_json::json!(code.name());
                self.to_json(&output)
            }
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Progress message, shown only in verbose table mode
    pub fn progress(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            eprintln!("... {message}");
        }
    }

    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Table => eprintln!("⚠ {message}"),
            OutputFormat::Json => eprintln!(
                "{}",
                self.to_json(&WarningOutput {
                    warning: message.to_string(),
                    timestamp: chrono::Utc::now().to_rfc3339(),
                })
            ),
            OutputFormat::Quiet => {}
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    fn to_json_response<T: Serialize>(&self, value: &T, command: &str) -> String {
        let response = JsonResponse::success_with_command(value, command);
        serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
            self.to_json(&JsonResponse::<()>::error(&format!("Serialization error: {e}")))
        })
    }
}

fn property_table(rows: &[(&'static str, String)]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Property", "Value"]);
    for (name, value) in rows {
        table.add_row(vec![*name, value.as_str()]);
    }
    table.to_string()
}

fn format_unix(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::<chrono::Utc>::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn format_unix_iso(secs: u64) -> Option<String> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::<chrono::Utc>::from_timestamp(s, 0))
        .map(|dt| dt.to_rfc3339())
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[derive(Serialize)]
struct WarningOutput {
    warning: String,
    timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct KeyOutput {
    pub identity: String,
    pub public_key: String,
    pub hint: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

impl Report for KeyOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Identity", self.identity.clone()),
            ("Public Key", self.public_key.clone()),
            ("Routing Hint", self.hint.to_string()),
        ];
        if let Some(secret) = &self.secret_key {
            rows.push(("Secret Key", secret.clone()));
        }
        rows
    }

    fn primary(&self) -> String {
        self.identity.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct IdentityOutput {
    pub identity: String,
    pub public_key: String,
    pub hint: u8,
    pub checksum: String,
    pub encoding: String,
}

impl Report for IdentityOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Identity", self.identity.clone()),
            ("Public Key", self.public_key.clone()),
            ("Routing Hint", self.hint.to_string()),
            ("Checksum", self.checksum.clone()),
            ("Encoding", self.encoding.clone()),
        ]
    }

    fn primary(&self) -> String {
        self.public_key.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct ChallengeOutput {
    pub challenge: String,
    pub version: u8,
    pub recipient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at_iso: Option<String>,
}

impl ChallengeOutput {
    pub fn new(challenge: String, version: u8, recipient: &str, expires_at: Option<u64>) -> Self {
        Self {
            challenge,
            version,
            recipient: recipient.to_string(),
            expires_at,
            expires_at_iso: expires_at.and_then(format_unix_iso),
        }
    }
}

impl Report for ChallengeOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("Challenge", self.challenge.clone()),
            ("Version", self.version.to_string()),
            ("Recipient", self.recipient.clone()),
        ];
        if let Some(t) = self.expires_at {
            rows.push(("Expires At", format_unix(t)));
        }
        rows
    }

    fn primary(&self) -> String {
        self.challenge.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct OpenedOutput {
    pub otp: String,
    pub context: Option<String>,
    pub expires_at: Option<u64>,
    /// Always false today: no envelope version authenticates its expiry.
    pub expiry_authenticated: bool,
    pub expired: bool,
}

impl Report for OpenedOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("OTP", self.otp.clone()),
            ("Context", or_dash(self.context.as_deref())),
            ("Expires At", self.expires_at.map(format_unix).unwrap_or_else(|| "Never".to_string())),
            ("Expiry Authenticated", self.expiry_authenticated.to_string()),
            ("Expired", self.expired.to_string()),
        ]
    }

    fn primary(&self) -> String {
        self.otp.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct EnvelopeOutput {
    pub version: u8,
    pub recipient_hint: u8,
    pub expires_at: Option<u64>,
    pub sender_public_key: Option<String>,
    pub nonce: Option<String>,
    pub payload_len: usize,
    pub payload: String,
}

impl Report for EnvelopeOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Version", self.version.to_string()),
            ("Recipient Hint", self.recipient_hint.to_string()),
            ("Expires At", self.expires_at.map(format_unix).unwrap_or_else(|| "-".to_string())),
            ("Sender Key", or_dash(self.sender_public_key.as_deref())),
            ("Nonce", or_dash(self.nonce.as_deref())),
            ("Payload Length", self.payload_len.to_string()),
        ]
    }

    fn primary(&self) -> String {
        self.version.to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct TokenOutput {
    pub token: String,
    pub nonce: String,
}

impl Report for TokenOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![("Token", self.token.clone()), ("Nonce", self.nonce.clone())]
    }

    fn primary(&self) -> String {
        self.token.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct DecodedTokenOutput {
    pub otp: Option<String>,
    pub expires_at: Option<u64>,
    pub nonce: String,
    pub expired: bool,
}

impl Report for DecodedTokenOutput {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("OTP", or_dash(self.otp.as_deref())),
            ("Expires At", self.expires_at.map(format_unix).unwrap_or_else(|| "Never".to_string())),
            ("Expired", self.expired.to_string()),
            ("Nonce", self.nonce.clone()),
        ]
    }

    fn primary(&self) -> String {
        self.otp.clone().unwrap_or_default()
    }
}
