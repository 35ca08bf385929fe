use crate::engine::EngineError;
use crate::resolve::Side;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DesignError {
    /// A value does not match the declared type of its parameter.
    #[error("Parameter {name}: {message}")]
    Validation { name: String, message: String },

    #[error("{0} not in params")]
    UnknownParameter(String),

    #[error("The following keys are missing: {}", .0.join(" "))]
    MissingCatalogKeys(Vec<String>),

    #[error("No annealing found for {side} sequence.")]
    AnnealingNotFound { side: Side },

    #[error("More than one annealing found for {side} sequence ({count} sites).")]
    AmbiguousAnnealing { side: Side, count: usize },

    /// Engine failure, with the parameters named by the engine appended to
    /// the message.
    #[error("{message}")]
    EngineRuntime {
        message: String,
        #[source]
        source: EngineError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DesignError {
    pub fn validation(name: &str, message: impl Into<String>) -> Self {
        DesignError::Validation {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DesignError>;
