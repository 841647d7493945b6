use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinanceError {
    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Invalid lookahead window {0}: must be between 0 and 366 days")]
    InvalidLookahead(i64),

    #[error("Invalid day bucket hour {0}: must be between 0 and 23")]
    InvalidDaySlot(u32),

    #[error("Validation failed for {record}: {details}")]
    ValidationError { record: String, details: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FinanceError>;
