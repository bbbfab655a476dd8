use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid business calendar: {reason}")]
    InvalidCalendarConfig { reason: String },

    #[error("Column '{column}' not found in {file}")]
    MissingColumnError { column: String, file: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    InputData,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl AnalyticsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalyticsError::ConfigError { .. }
            | AnalyticsError::InvalidConfigValueError { .. }
            | AnalyticsError::ConfigValidationError { .. }
            | AnalyticsError::InvalidCalendarConfig { .. } => ErrorCategory::Configuration,
            AnalyticsError::CsvError(_) | AnalyticsError::MissingColumnError { .. } => {
                ErrorCategory::InputData
            }
            AnalyticsError::ProcessingError { .. } | AnalyticsError::SerializationError(_) => {
                ErrorCategory::Processing
            }
            AnalyticsError::IoError(_) | AnalyticsError::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::InputData => ErrorSeverity::High,
            ErrorCategory::Processing => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for the binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AnalyticsError::MissingColumnError { column, .. } => format!(
                "Check the CSV header row, or map '{}' to the right header under [source.columns]",
                column
            ),
            AnalyticsError::InvalidCalendarConfig { .. } => {
                "Use HH:MM times with day_start before day_end and list at least one working day"
                    .to_string()
            }
            AnalyticsError::CsvError(_) => {
                "Make sure the file is a comma-separated export with a header row".to_string()
            }
            AnalyticsError::IoError(_) => {
                "Check that the input file exists and the output directory is writable".to_string()
            }
            _ if self.category() == ErrorCategory::Configuration => {
                "Review the command line flags or TOML configuration".to_string()
            }
            _ => "Re-run with --verbose for more details".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::InputData => format!("Could not read lead data: {}", self),
            ErrorCategory::Processing => format!("Analysis failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
