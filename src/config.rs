use crate::error::{AppError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, one event per line.
    Pretty,
    /// Newline-delimited JSON events.
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var("TOOLAUDIT_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" | "structured" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the MCP server source holding the tool registry and dispatch switch.
    pub source_path: PathBuf,
    /// Path to the package manifest rewritten by `bump-manifest`.
    pub manifest_path: PathBuf,
    /// Base URL of the hosted API probed by the smoke test.
    pub api_base: String,
    /// Bearer token for the hosted API. Probes run unauthenticated when unset.
    pub api_key: Option<String>,
    /// Wall-clock timeout applied to every probe request.
    pub request_timeout: Duration,
    /// Fixed pause between consecutive probe requests.
    pub request_delay: Duration,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("src/index.ts"),
            manifest_path: PathBuf::from("package.json"),
            api_base: "https://astrovisor.io".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(10),
            request_delay: Duration::from_millis(500),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// - `TOOLAUDIT_SOURCE_PATH`: server source file (default `src/index.ts`)
    /// - `TOOLAUDIT_MANIFEST_PATH`: package manifest (default `package.json`)
    /// - `TOOLAUDIT_API_BASE`: API base URL (default `https://astrovisor.io`)
    /// - `TOOLAUDIT_API_KEY`: bearer token (optional)
    /// - `TOOLAUDIT_TIMEOUT_SECS`: per-request timeout (default 10)
    /// - `TOOLAUDIT_DELAY_MS`: delay between requests (default 500)
    /// - `TOOLAUDIT_LOG_FORMAT`: `pretty` or `json`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let timeout_secs: u64 = parse_var("TOOLAUDIT_TIMEOUT_SECS", 10)?;
        let delay_ms: u64 = parse_var("TOOLAUDIT_DELAY_MS", 500)?;

        if timeout_secs == 0 {
            return Err(AppError::Config(
                "TOOLAUDIT_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            source_path: env::var("TOOLAUDIT_SOURCE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.source_path),
            manifest_path: env::var("TOOLAUDIT_MANIFEST_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.manifest_path),
            api_base: env::var("TOOLAUDIT_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            api_key: env::var("TOOLAUDIT_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            request_timeout: Duration::from_secs(timeout_secs),
            request_delay: Duration::from_millis(delay_ms),
            log_format: LogFormat::from_env(),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} is not a valid number: {:?}", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_probe_contract() {
        let config = Config::default();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.request_delay, Duration::from_millis(500));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_parse_var_missing_uses_default() {
        let value: u64 = parse_var("TOOLAUDIT_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
