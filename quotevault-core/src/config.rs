//! Job configuration.
//!
//! Built once at process start from three layers: built-in defaults, an
//! optional TOML file, then environment variables. The resulting
//! [`JobConfig`] is passed by reference into every component; nothing below
//! the binary reads the process environment.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://finnhub.io/api/v1/quote";
pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const DEFAULT_BUCKET: &str = "python-in-de";
pub const DEFAULT_KEY_PREFIX: &str = "stock-data/";
pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("bucket name must not be empty")]
    EmptyBucket,
}

/// Quote API token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Where encoded files are persisted: bucket, key prefix and region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    pub bucket: String,
    pub prefix: String,
    pub region: String,
}

impl Default for StorageLocation {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

/// Complete job configuration.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Quote endpoint.
    pub api_url: String,
    /// Quote API token; `None` sends the request unauthenticated.
    pub api_key: Option<ApiKey>,
    /// The single symbol snapshotted per run.
    pub symbol: String,
    /// Leading part of generated file names.
    pub file_label: String,
    /// Local directory encoded files are written to before upload.
    pub scratch_dir: PathBuf,
    pub destination: StorageLocation,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            symbol: DEFAULT_SYMBOL.to_string(),
            file_label: default_label(DEFAULT_SYMBOL),
            scratch_dir: std::env::temp_dir(),
            destination: StorageLocation::default(),
        }
    }
}

/// Label derived from a symbol when none is configured: `aapl_stock`.
pub fn default_label(symbol: &str) -> String {
    format!("{}_stock", symbol.to_lowercase())
}

// ── TOML file shape ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    quote: QuoteSection,
    output: OutputSection,
    storage: StorageSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct QuoteSection {
    api_url: Option<String>,
    api_key: Option<String>,
    symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OutputSection {
    file_label: Option<String>,
    scratch_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StorageSection {
    bucket: Option<String>,
    prefix: Option<String>,
    region: Option<String>,
}

impl JobConfig {
    /// Load from an optional TOML file, then the process environment.
    pub fn from_env(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_lookup(file, |name| std::env::var(name).ok())
    }

    /// Load from an optional TOML file, then variables resolved by `lookup`.
    pub fn from_lookup<F>(file: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_cfg = match file {
            Some(path) => read_file(path)?,
            None => FileConfig::default(),
        };
        let defaults = Self::default();

        // Empty variables count as unset.
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let symbol = var("QUOTE_SYMBOL")
            .or(file_cfg.quote.symbol)
            .unwrap_or(defaults.symbol);
        let file_label = var("QUOTE_FILE_LABEL")
            .or(file_cfg.output.file_label)
            .unwrap_or_else(|| default_label(&symbol));

        let config = Self {
            api_url: var("FINNHUB_API_URL")
                .or(file_cfg.quote.api_url)
                .unwrap_or(defaults.api_url),
            api_key: var("FINNHUB_API_KEY")
                .or(file_cfg.quote.api_key)
                .map(ApiKey::new),
            symbol,
            file_label,
            scratch_dir: var("QUOTE_SCRATCH_DIR")
                .map(PathBuf::from)
                .or(file_cfg.output.scratch_dir)
                .unwrap_or(defaults.scratch_dir),
            destination: StorageLocation {
                bucket: var("S3_BUCKET_NAME")
                    .or(file_cfg.storage.bucket)
                    .unwrap_or(defaults.destination.bucket),
                prefix: var("S3_KEY_PREFIX")
                    .or(file_cfg.storage.prefix)
                    .unwrap_or(defaults.destination.prefix),
                region: var("S3_REGION")
                    .or(file_cfg.storage.region)
                    .unwrap_or(defaults.destination.region),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.destination.bucket.trim().is_empty() {
            return Err(ConfigError::EmptyBucket);
        }
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
