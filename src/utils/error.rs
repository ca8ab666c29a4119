use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned HTTP {status} for {url}")]
    HttpStatusError { status: u16, url: String },

    #[error("API returned an empty payload for {id}")]
    EmptyPayloadError { id: String },

    #[error("Course entry has no id (title: {title})")]
    MissingCourseIdError { title: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorCategory::Network,
            EtlError::EmptyPayloadError { .. }
            | EtlError::MissingCourseIdError { .. }
            | EtlError::SerializationError(_)
            | EtlError::CsvError(_) => ErrorCategory::Data,
            EtlError::IoError(_) => ErrorCategory::Storage,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單筆資料缺漏，不影響其他項目
            EtlError::EmptyPayloadError { .. } | EtlError::MissingCourseIdError { .. } => {
                ErrorSeverity::Low
            }
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorSeverity::Medium,
            EtlError::SerializationError(_) | EtlError::CsvError(_) => ErrorSeverity::High,
            EtlError::IoError(_)
            | EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and the configured base URL, then rerun",
            ErrorCategory::Data => "The API response did not have the expected shape; inspect the raw payload",
            ErrorCategory::Storage => "Check that the output/input path exists and is writable",
            ErrorCategory::Configuration => "Fix the configuration value (CLI flag or TOML file) and retry",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ApiError(e) if e.is_timeout() => "The API request timed out".to_string(),
            EtlError::ApiError(_) => "Could not reach the course API".to_string(),
            EtlError::HttpStatusError { status, .. } => {
                format!("The course API answered with HTTP {}", status)
            }
            EtlError::IoError(e) => format!("File operation failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
