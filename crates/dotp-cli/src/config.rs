//! Configuration management for the dotp CLI
//!
//! Configuration is stored in TOML format.
//!
//! # Configuration File Locations
//!
//! - Linux: `~/.config/dotp/config.toml`
//! - macOS: `~/Library/Application Support/org.dotp.dotp/config.toml`
//! - Windows: `%APPDATA%\dotp\dotp\config\config.toml`
//!
//! Values are resolved in order: built-in defaults, config file, CLI flags.

use std::path::{Path, PathBuf};

use dotp_crypto::{ChallengeCodec, ChecksumScheme, CodecConfig, IdentityCodec, KdfParams, ProtocolVersion, TextEncoding};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const VALID_ENCODINGS: [&str; 2] = ["base58", "base32"];
const VALID_CHECKSUMS: [&str; 2] = ["sha512", "blake2s"];
const VALID_FORMATS: [&str; 3] = ["table", "json", "quiet"];
const VALID_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// CLI configuration
///
/// # Example TOML
///
/// ```toml
/// [protocol]
/// max_version = 0       # highest envelope version accepted/produced
/// encoding = "base58"   # "base58" | "base32"
/// checksum = "sha512"   # "sha512" | "blake2s"
///
/// [kdf]
/// log_n = 17
/// r = 8
/// p = 1
///
/// [output]
/// format = "table"      # "table" | "json" | "quiet"
///
/// [logging]
/// level = "warn"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub protocol: ProtocolConfig,

    #[serde(default)]
    pub kdf: KdfConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Wire format settings shared by challenges, identities and tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Highest envelope version this tool will parse or produce
    #[serde(default)]
    pub max_version: u8,

    /// Text encoding: "base58" or "base32"
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Identity checksum: "sha512" or "blake2s"
    #[serde(default = "default_checksum")]
    pub checksum: String,
}

fn default_encoding() -> String {
    "base58".to_string()
}

fn default_checksum() -> String {
    "sha512".to_string()
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_version: 0,
            encoding: default_encoding(),
            checksum: default_checksum(),
        }
    }
}

/// scrypt work factor for passphrase-derived keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfConfig {
    #[serde(default = "default_log_n")]
    pub log_n: u8,
    #[serde(default = "default_r")]
    pub r: u32,
    #[serde(default = "default_p")]
    pub p: u32,
}

fn default_log_n() -> u8 {
    KdfParams::INTEROP.log_n
}

fn default_r() -> u32 {
    KdfParams::INTEROP.r
}

fn default_p() -> u32 {
    KdfParams::INTEROP.p
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            log_n: default_log_n(),
            r: default_r(),
            p: default_p(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "table", "json", "quiet"
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub verbose: bool,
}

fn default_format() -> String {
    "table".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from custom path or default
    pub fn load_from(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = custom_path {
            Self::load(path)
        } else {
            Self::load_default()
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "dotp", "dotp")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Write the default configuration on first run. Returns true if a file was created.
    pub fn create_default_if_missing() -> Result<bool, ConfigError> {
        if let Some(path) = Self::default_path() {
            if !path.exists() {
                std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))?;
                std::fs::write(&path, Self::sample_toml())?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let highest = ProtocolVersion::ALL[ProtocolVersion::ALL.len() - 1].tag();
        if self.protocol.max_version > highest {
            return Err(ConfigError::ValidationError(format!(
                "Invalid max_version {}. Highest known version: {}",
                self.protocol.max_version, highest
            )));
        }

        if !VALID_ENCODINGS.contains(&self.protocol.encoding.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid encoding '{}'. Valid values: {:?}",
                self.protocol.encoding, VALID_ENCODINGS
            )));
        }

        if !VALID_CHECKSUMS.contains(&self.protocol.checksum.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid checksum '{}'. Valid values: {:?}",
                self.protocol.checksum, VALID_CHECKSUMS
            )));
        }

        if !VALID_FORMATS.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid output format '{}'. Valid values: {:?}",
                self.output.format, VALID_FORMATS
            )));
        }

        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}'. Valid values: {:?}",
                self.logging.level, VALID_LEVELS
            )));
        }

        if self.kdf.log_n == 0 || self.kdf.log_n > 30 {
            return Err(ConfigError::ValidationError(format!(
                "Invalid kdf log_n {}: must be between 1 and 30",
                self.kdf.log_n
            )));
        }
        if self.kdf.r == 0 || self.kdf.p == 0 {
            return Err(ConfigError::ValidationError(
                "kdf r and p must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn encoding(&self) -> Result<TextEncoding, ConfigError> {
        self.protocol.encoding.parse().map_err(ConfigError::ValidationError)
    }

    pub fn checksum(&self) -> Result<ChecksumScheme, ConfigError> {
        match self.protocol.checksum.as_str() {
            "sha512" => Ok(ChecksumScheme::Sha512),
            "blake2s" => Ok(ChecksumScheme::Blake2s),
            other => Err(ConfigError::ValidationError(format!("Invalid checksum '{other}'"))),
        }
    }

    pub fn max_version(&self) -> Result<ProtocolVersion, ConfigError> {
        ProtocolVersion::from_tag(self.protocol.max_version).ok_or_else(|| {
            ConfigError::ValidationError(format!("Invalid max_version {}", self.protocol.max_version))
        })
    }

    pub fn identity_codec(&self) -> Result<IdentityCodec, ConfigError> {
        Ok(IdentityCodec::new(self.checksum()?, self.encoding()?))
    }

    pub fn challenge_codec(&self) -> Result<ChallengeCodec, ConfigError> {
        Ok(ChallengeCodec::new(CodecConfig {
            max_version: self.max_version()?,
            encoding: self.encoding()?,
            identity: self.identity_codec()?,
        }))
    }

    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            log_n: self.kdf.log_n,
            r: self.kdf.r,
            p: self.kdf.p,
        }
    }

    pub fn sample_toml() -> &'static str {
        r#"# dotp configuration

[protocol]
# Highest envelope version accepted and produced.
# 0 = sealed challenges only, 1 = also allow expiring challenges
max_version = 0
# Text encoding for identities, challenges and tokens: "base58" or "base32"
encoding = "base58"
# Identity checksum: "sha512" or "blake2s" (earliest generation)
checksum = "sha512"

[kdf]
# scrypt work factor for passphrase keys. Other values derive different keys.
log_n = 17
r = 8
p = 1

[output]
# Output format: "table", "json", "quiet"
format = "table"
verbose = false

[logging]
# Log level: "error", "warn", "info", "debug", "trace"
level = "warn"
"#
    }
}

/// CLI flags that take precedence over config file values
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_format: Option<String>,
    pub verbose: Option<bool>,
    pub debug: Option<bool>,
    pub encoding: Option<String>,
    pub max_version: Option<u8>,
}

impl Config {
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Self {
        if let Some(ref format) = overrides.output_format {
            self.output.format = format.clone();
        }
        if let Some(verbose) = overrides.verbose {
            self.output.verbose = verbose;
        }
        if let Some(true) = overrides.debug {
            self.logging.level = "debug".to_string();
        }
        if let Some(ref encoding) = overrides.encoding {
            self.protocol.encoding = encoding.clone();
        }
        if let Some(max_version) = overrides.max_version {
            self.protocol.max_version = max_version;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.protocol.max_version, 0);
        assert_eq!(config.protocol.encoding, "base58");
        assert_eq!(config.protocol.checksum, "sha512");
        assert_eq!(config.kdf_params(), KdfParams::INTEROP);
        assert_eq!(config.output.format, "table");
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sample_toml_matches_defaults() {
        let config: Config = toml::from_str(Config::sample_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.protocol.encoding, Config::default().protocol.encoding);
        assert_eq!(config.kdf_params(), Config::default().kdf_params());
    }

    #[test]
    fn test_validate_max_version() {
        let mut config = Config::default();
        config.protocol.max_version = 1;
        assert!(config.validate().is_ok());
        config.protocol.max_version = 2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid max_version"));
    }

    #[test]
    fn test_validate_invalid_encoding() {
        let mut config = Config::default();
        config.protocol.encoding = "base64".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("Invalid encoding"));
    }

    #[test]
    fn test_validate_invalid_checksum() {
        let mut config = Config::default();
        config.protocol.checksum = "md5".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("Invalid checksum"));
    }

    #[test]
    fn test_validate_invalid_output_format() {
        let mut config = Config::default();
        config.output.format = "xml".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("Invalid output format"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_validate_kdf() {
        let mut config = Config::default();
        config.kdf.log_n = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.kdf.r = 0;
        assert!(config.validate().unwrap_err().to_string().contains("kdf r and p"));
    }

    #[test]
    fn test_codec_from_config() {
        let mut config = Config::default();
        config.protocol.max_version = 1;
        config.protocol.encoding = "base32".to_string();
        config.protocol.checksum = "blake2s".to_string();

        let codec = config.challenge_codec().unwrap();
        assert_eq!(codec.config().max_version, ProtocolVersion::Expiring);
        assert_eq!(codec.config().encoding, TextEncoding::Base32);
        assert_eq!(codec.config().identity.checksum, ChecksumScheme::Blake2s);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.protocol.encoding = "base32".to_string();
        config.kdf.log_n = 12;
        config.save(&config_path).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.protocol.encoding, "base32");
        assert_eq!(loaded.kdf.log_n, 12);
        assert_eq!(loaded.logging.level, config.logging.level);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[protocol]\nencoding = \"hex\"\n").unwrap();
        assert!(matches!(Config::load(&config_path), Err(ConfigError::ValidationError(_))));

        std::fs::write(&config_path, "[protocol\n").unwrap();
        assert!(matches!(Config::load(&config_path), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_from_missing_custom_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.toml");
        assert!(matches!(Config::load_from(Some(&missing)), Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_cli_overrides() {
        let overrides = CliOverrides {
            output_format: Some("json".to_string()),
            verbose: Some(true),
            debug: Some(true),
            encoding: Some("base32".to_string()),
            max_version: Some(1),
        };
        let config = Config::default().with_overrides(&overrides);

        assert_eq!(config.output.format, "json");
        assert!(config.output.verbose);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.protocol.encoding, "base32");
        assert_eq!(config.protocol.max_version, 1);
    }

    #[test]
    fn test_empty_overrides_keep_file_values() {
        let mut config = Config::default();
        config.logging.level = "info".to_string();
        let config = config.with_overrides(&CliOverrides {
            debug: Some(false),
            ..Default::default()
        });
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.protocol.encoding, "base58");
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str("[kdf]\nlog_n = 14\n").unwrap();
        assert_eq!(config.kdf.log_n, 14);
        assert_eq!(config.kdf.r, 8);
        assert_eq!(config.protocol.checksum, "sha512");
        assert_eq!(config.output.format, "table");
    }
}
