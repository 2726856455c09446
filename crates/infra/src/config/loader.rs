//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `PAYX_URL_ENDPOINT`: Base URL of the API
//! - `PAYX_API_KEY`: OAuth client id
//! - `PAYX_CLIENT_SECRET`: OAuth client secret
//! - `PAYX_TIMEOUT_SECS`: Per-call timeout in seconds (optional, default 30)
//! - `PAYX_CONFIG_PATH`: Explicit config file, checked first when probing
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `$PAYX_CONFIG_PATH`
//! 2. `./payx.toml` or `./payx.json` (current working directory)
//! 3. `./config/payx.toml` or `./config/payx.json`
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::time::Duration;

use payx_domain::constants::DEFAULT_TIMEOUT_SECS;
use payx_domain::{ClientConfig, PayxError, Result};
use url::Url;

const ENV_URL_ENDPOINT: &str = "PAYX_URL_ENDPOINT";
const ENV_API_KEY: &str = "PAYX_API_KEY";
const ENV_CLIENT_SECRET: &str = "PAYX_CLIENT_SECRET";
const ENV_TIMEOUT_SECS: &str = "PAYX_TIMEOUT_SECS";
const ENV_CONFIG_PATH: &str = "PAYX_CONFIG_PATH";

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `PayxError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing or empty
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `PayxError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<ClientConfig> {
    let url_endpoint = env_var(ENV_URL_ENDPOINT)?;
    let api_key = env_var(ENV_API_KEY)?;
    let client_secret = env_var(ENV_CLIENT_SECRET)?;
    let timeout_secs = match std::env::var(ENV_TIMEOUT_SECS) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| PayxError::Config(format!("Invalid timeout: {e}")))?,
        Err(_) => DEFAULT_TIMEOUT_SECS,
    };

    let config = ClientConfig::new(url_endpoint, api_key, client_secret)
        .with_timeout(Duration::from_secs(timeout_secs));
    finish(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PayxError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PayxError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PayxError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PayxError::Config(format!("Failed to read config file: {e}")))?;

    finish(parse_config(&contents, &config_path)?)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PayxError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PayxError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(PayxError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Validate and normalise a freshly loaded configuration.
fn finish(mut config: ClientConfig) -> Result<ClientConfig> {
    config.validate()?;
    config.url_endpoint = normalize_base_url(&config.url_endpoint)?;
    Ok(config)
}

/// Ensure the base URL is absolute http(s) and ends with `/`.
///
/// Resources are joined as sub-paths, so a missing trailing slash would
/// otherwise drop the last path segment of the base.
///
/// # Errors
/// Returns `PayxError::Config` for relative or non-http URLs.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw.trim())
        .map_err(|e| PayxError::Config(format!("Invalid url_endpoint '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PayxError::Config(format!(
            "url_endpoint must use http or https, got '{}'",
            url.scheme()
        )));
    }

    let mut normalized = url.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(normalized)
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(explicit) = std::env::var(ENV_CONFIG_PATH) {
        candidates.push(PathBuf::from(explicit));
    }

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(file_candidates(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(file_candidates(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn file_candidates(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("payx.toml"),
        dir.join("payx.json"),
        dir.join("config").join("payx.toml"),
        dir.join("config").join("payx.json"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `PayxError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| PayxError::Config(format!("Missing required environment variable: {key}")))
}
