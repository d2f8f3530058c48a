use thiserror::Error;

/// Failures raised by a storage collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Backend(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unsupported dataset format: {path}")]
    UnsupportedFormat { path: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: StoreError,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl LocatorError {
    pub fn storage(context: impl Into<String>, source: StoreError) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Storage { source, .. } => match source {
                StoreError::InvalidPattern { .. } => ErrorSeverity::Medium,
                StoreError::Backend(_) | StoreError::IoError(_) => ErrorSeverity::Critical,
                _ => ErrorSeverity::High,
            },
            Self::IoError(_) => ErrorSeverity::Critical,
            Self::SerializationError(_) => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Storage { context, source } => match source {
                StoreError::UnsupportedFormat { path } => format!(
                    "{}: '{}' is not a .json or .csv dataset",
                    context, path
                ),
                StoreError::InvalidPattern { pattern, .. } => {
                    format!("{}: the search text '{}' could not be used", context, pattern)
                }
                other => format!("{}: {}", context, other),
            },
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Storage { source, .. } => match source {
                StoreError::IoError(_) => "Check that the dataset file exists and is readable",
                StoreError::SerializationError(_) | StoreError::CsvError(_) => {
                    "Check the dataset contents against the expected pharmacy fields"
                }
                StoreError::UnsupportedFormat { .. } => "Use a dataset ending in .json or .csv",
                _ => "Retry the operation; the storage backend reported a failure",
            },
            Self::IoError(_) => "Check file permissions and paths",
            _ => "Review the configuration file and command-line arguments",
        }
    }
}

pub type Result<T> = std::result::Result<T, LocatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_prefixes_context() {
        let err = LocatorError::storage(
            "Failed to fetch pharmacies on guard",
            StoreError::Backend("Database error".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "Failed to fetch pharmacies on guard: Database error"
        );
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = LocatorError::storage(
            "Failed to load dataset",
            StoreError::UnsupportedFormat {
                path: "data.xml".to_string(),
            },
        );
        assert!(err.user_friendly_message().contains("data.xml"));
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}
