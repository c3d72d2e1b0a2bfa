use thiserror::Error;

#[derive(Error, Debug)]
pub enum FloatChatError {
    #[error("Data store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Data store query failed: {message}")]
    StoreQueryError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

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

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Store,
    Io,
    Configuration,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FloatChatError {
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn store_query(message: impl Into<String>) -> Self {
        Self::StoreQueryError {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::StoreUnavailable { .. } | Self::StoreQueryError { .. } => ErrorCategory::Store,
            Self::IoError(_) => ErrorCategory::Io,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::CsvError(_) | Self::SerializationError(_) | Self::ProcessingError { .. } => {
                ErrorCategory::Data
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Store => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// 只有資料存取端的故障可以重試
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Store
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::StoreUnavailable { .. } => "Check that the float data store is reachable and retry the query",
            Self::StoreQueryError { .. } => "Retry the query; if it keeps failing inspect the data store logs",
            Self::CsvError(_) => "Verify the CSV exports (floats.csv, profiles.csv, measurements.csv) are well-formed",
            Self::IoError(_) => "Check file paths and permissions",
            Self::SerializationError(_) => "Check the output format settings",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. } => "Fix the configuration file and try again",
            Self::MissingConfigError { .. } => "Add the missing setting to the configuration file or command line",
            Self::ProcessingError { .. } => "Rephrase the question or use one of the suggested queries",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Store => {
                "The ocean data service is temporarily unavailable. Please try again shortly."
                    .to_string()
            }
            ErrorCategory::Io => format!("Could not access a required file: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Could not process the data: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, FloatChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_faults_are_retryable() {
        let err = FloatChatError::store_unavailable("connection refused");
        assert!(err.is_retryable());
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().contains("connection refused"));

        let err = FloatChatError::store_query("statement timeout");
        assert!(err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Store);
        assert!(err.to_string().contains("statement timeout"));
    }

    #[test]
    fn test_config_errors_are_not_retryable() {
        let err = FloatChatError::MissingConfigError {
            field: "data.directory".to_string(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.user_friendly_message().contains("data.directory"));
    }
}
