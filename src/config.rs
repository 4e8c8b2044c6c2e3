//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default model order for the generation fallback chain.
///
/// Cheaper/faster models first; later entries are only tried when an earlier
/// one fails with a transient error.
pub const DEFAULT_MODELS: &[&str] = &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-2.0-flash"];

/// Default per-call deadline for provider requests.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Provider API key. May be empty — generation then degrades to the
    /// deterministic fallback analysis instead of failing submissions.
    pub api_key: SecretString,
    /// Ordered model identifiers for the fallback chain.
    pub models: Vec<String>,
    /// Per-call deadline for provider requests.
    pub call_timeout: Duration,
    /// Path of the local database file.
    pub db_path: PathBuf,
}

impl AppConfig {
    /// Build configuration from environment variables.
    ///
    /// - `GEMINI_API_KEY` — provider key (optional, see `api_key`)
    /// - `LEADFLOW_MODELS` — comma-separated model ids (optional)
    /// - `LEADFLOW_CALL_TIMEOUT_SECS` — per-call deadline in seconds (optional)
    /// - `LEADFLOW_DB_PATH` — database file path (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map(SecretString::from)
            .unwrap_or_else(|_| {
                tracing::warn!("GEMINI_API_KEY not set — submissions will use the fallback analysis");
                SecretString::from("")
            });

        let models = match std::env::var("LEADFLOW_MODELS") {
            Ok(raw) => {
                let models: Vec<String> = raw
                    .split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect();
                if models.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: "LEADFLOW_MODELS".into(),
                        message: "expected a comma-separated list of model ids".into(),
                    });
                }
                models
            }
            Err(_) => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        };

        let call_timeout = match std::env::var("LEADFLOW_CALL_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "LEADFLOW_CALL_TIMEOUT_SECS".into(),
                    message: format!("'{raw}' is not a valid number of seconds"),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_CALL_TIMEOUT,
        };

        let db_path = std::env::var("LEADFLOW_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/leadflow.db"));

        Ok(Self {
            api_key,
            models,
            call_timeout,
            db_path,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::from(""),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            db_path: PathBuf::from("./data/leadflow.db"),
        }
    }
}
