//! Engine error taxonomy.
//!
//! Load-time problems (bad definitions, unreadable files) abort the whole
//! registry load; runtime problems terminate a single session and nothing
//! else. The engine never exits the process.

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors produced by the scenario engine
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("scenario '{scenario}': {field}: {message}")]
    Validation {
        scenario: String,
        field: String,
        message: String,
    },

    #[error("scenario not found: '{0}' (check list-scenarios)")]
    NotFound(String),

    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("session runtime error: {0}")]
    Runtime(String),
}

impl EngineError {
    pub fn validation(
        scenario: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        EngineError::Validation {
            scenario: scenario.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for any load-time definition problem (bad data, unreadable or
    /// unparseable file).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::Validation { .. } | EngineError::Read { .. } | EngineError::Parse { .. }
        )
    }
}
