use thiserror::Error;

/// A single input row that could not be turned into a `CustomerRecord`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("record has no customer_id")]
    MissingCustomerId,

    #[error("field '{field}' is not a number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field '{field}' has unrecognised value '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("customer_id '{id}' already appears earlier in the batch")]
    DuplicateCustomerId { id: String },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Malformed record: {0}")]
    MalformedRecord(#[from] RecordError),

    #[error("Invalid engine configuration: {reason}")]
    Configuration { reason: String },

    #[error("Cannot read {path}: {source}")]
    Io {
        path:   String,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Configuration { reason: reason.into() }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
