//! Error types for leadflow.

/// Top-level error type for the form runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Per-answer validation failures.
///
/// Local and recoverable: blocks a single step advance, never propagates
/// beyond the runner.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("This field is required")]
    Required,

    #[error("Invalid e-mail address")]
    BadEmail,

    #[error("Invalid phone number")]
    BadPhone,

    #[error("'{value}' is not one of the offered options")]
    NotAnOption { value: String },
}

/// A single failed model attempt, kept for diagnostics and fallback decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAttempt {
    pub model_id: String,
    pub error: String,
}

/// Failure from one provider call for one model.
#[derive(Debug, Clone)]
pub struct ProviderError {
    /// HTTP status when the provider surfaced one.
    pub status_hint: Option<u16>,
    pub message: String,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_hint {
            Some(status) => write!(f, "provider request failed (HTTP {status}): {}", self.message),
            None => write!(f, "provider request failed: {}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Transport-level failure with no HTTP status.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status_hint: None,
            message: message.into(),
        }
    }

    /// Failure with an HTTP status from the provider.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status_hint: Some(status),
            message: message.into(),
        }
    }

    /// Whether this failure is account-level (quota or credentials).
    ///
    /// Every model shares the same quota and API key, so a 429 or 403 dooms
    /// the remaining models identically — the fallback loop stops on these.
    pub fn is_account_level(&self) -> bool {
        match self.status_hint {
            Some(429) | Some(403) => true,
            Some(_) => false,
            None => self.message.contains("429") || self.message.contains("403"),
        }
    }
}

/// Errors from the multi-model generation client.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("all models exhausted after {} attempt(s)", attempts.len())]
    Exhausted { attempts: Vec<GenerationAttempt> },
}

/// Errors from prompt composition and structured-output parsing.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// The provider returned text with no parseable JSON in it.
    ///
    /// Propagated to the authoring flow as a user-visible failure — there is
    /// no safe default question set to fall back to.
    #[error("model returned malformed output: {raw}")]
    MalformedOutput { raw: String },
}

/// Storage-related errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for the form runtime.
pub type Result<T> = std::result::Result<T, Error>;
