#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Bad upload: {0}")]
    BadUpload(String),

    #[error("No CSV entry found in archive")]
    NoTabularEntry,

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    #[error("Invalid format on line {line}: {reason}")]
    InvalidFormat { line: u64, reason: String },

    #[error("Invalid price on line {line}: {value:?}")]
    InvalidPrice { line: u64, value: String },

    #[error("Storage write failed: {0}")]
    StorageWriteFailed(#[source] duckdb::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] duckdb::Error),

    #[error("Encode failed: {0}")]
    EncodeFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<zip::result::ZipError> for LedgerError {
    fn from(e: zip::result::ZipError) -> Self {
        LedgerError::MalformedTable(format!("unreadable zip archive: {e}"))
    }
}

impl From<csv::Error> for LedgerError {
    fn from(e: csv::Error) -> Self {
        LedgerError::MalformedTable(e.to_string())
    }
}

impl LedgerError {
    /// Whether the failure was caused by the caller's input rather than by
    /// the store or the encoder.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LedgerError::BadUpload(_)
                | LedgerError::NoTabularEntry
                | LedgerError::MalformedTable(_)
                | LedgerError::InvalidFormat { .. }
                | LedgerError::InvalidPrice { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
