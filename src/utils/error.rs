use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

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

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Sheet backend returned HTTP {status}: {body}")]
    SheetApiError { status: u16, body: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{operation} is not supported by the {transport} transport")]
    UnsupportedError {
        transport: String,
        operation: String,
    },

    #[error("Cannot {action} during the {stage} stage")]
    SessionError { stage: String, action: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Upstream,
    Authentication,
    Configuration,
    Validation,
    Storage,
    Data,
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LeadError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn unsupported(transport: &str, operation: &str) -> Self {
        Self::UnsupportedError {
            transport: transport.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LeadError::HttpError(_) => ErrorCategory::Network,
            LeadError::SheetApiError { .. } | LeadError::UnsupportedError { .. } => {
                ErrorCategory::Upstream
            }
            LeadError::AuthError { .. } => ErrorCategory::Authentication,
            LeadError::ConfigError { .. }
            | LeadError::MissingConfigError { .. }
            | LeadError::InvalidConfigValueError { .. }
            | LeadError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            LeadError::ValidationError { .. } => ErrorCategory::Validation,
            LeadError::IoError(_) => ErrorCategory::Storage,
            LeadError::CsvError(_) | LeadError::SerializationError(_) => ErrorCategory::Data,
            LeadError::SessionError { .. } => ErrorCategory::Session,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Session => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Authentication => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 暫時性錯誤（網路、429、5xx）才值得重試
    pub fn is_retryable(&self) -> bool {
        match self {
            LeadError::HttpError(e) => !e.is_builder() && !e.is_decode(),
            LeadError::SheetApiError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity to the sheet backend and retry",
            ErrorCategory::Upstream => {
                "Check the spreadsheet ID, sheet name and sharing settings of the backend"
            }
            ErrorCategory::Authentication => {
                "Verify GOOGLE_SERVICE_ACCOUNT_EMAIL and GOOGLE_PRIVATE_KEY"
            }
            ErrorCategory::Configuration => "Fix the configuration file or environment variables",
            ErrorCategory::Validation => "Correct the submitted fields and try again",
            ErrorCategory::Storage => "Check that the dead-letter directory is writable",
            ErrorCategory::Data => "Inspect the stored rows for malformed data",
            ErrorCategory::Session => "Restart the campaign flow from the entry page",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Validation => self.to_string(),
            ErrorCategory::Network | ErrorCategory::Upstream => {
                format!("The lead store is unreachable right now ({})", self)
            }
            ErrorCategory::Authentication => {
                "Could not authenticate against Google Sheets".to_string()
            }
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            _ => format!("Unexpected error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, LeadError>;
