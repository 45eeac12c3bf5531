use std::path::PathBuf;

/// Errors surfaced by the observability core
///
/// Gated `log` calls never produce an error; they are a silent no-op.
/// Malformed JSON found while reading rows back is not an error either, it
/// degrades to an empty mapping on the read path.
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    /// Invalid severity/category value or configuration entry
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database file does not exist and auto-creation was disabled
    #[error("Database not found: {}. Ensure the AI logger has been initialized.", .0.display())]
    NotFound(PathBuf),

    /// Underlying SQLite operation failed (write, read, or schema creation)
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Preparing the database location failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata could not be encoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ObservabilityError {
    /// Short machine-readable name, used by the CLI's JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage_error",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

pub type Result<T, E = ObservabilityError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ObservabilityError::Config("unknown severity: LOUD".to_string());
        assert_eq!(error.to_string(), "Configuration error: unknown severity: LOUD");
    }

    #[test]
    fn test_not_found_mentions_path() {
        let error = ObservabilityError::NotFound(PathBuf::from("/tmp/missing.db"));
        assert!(error.to_string().contains("/tmp/missing.db"));
        assert_eq!(error.kind(), "not_found");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(ObservabilityError::Config("x".to_string()).kind(), "config_error");
        assert_eq!(
            ObservabilityError::Storage(sqlx::Error::PoolClosed).kind(),
            "storage_error"
        );
    }
}
