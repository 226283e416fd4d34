use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PaperworkError {
    #[error("Record not found: {0}")]
    RecordNotFound(Uuid),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
}

pub type Result<T> = std::result::Result<T, PaperworkError>;
