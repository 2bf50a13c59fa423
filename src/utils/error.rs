use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegoError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Template rendering error: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("WebDriver error ({code}): {message}")]
    WebDriverError { code: String, message: String },

    #[error("Timed out: {message}")]
    Timeout { message: String },

    #[error("Failed to start WebDriver: {message}")]
    DriverStartError { message: String },

    #[error("Page processing error: {message}")]
    PageError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Browser,
    Data,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RegoError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Short name of the error kind, used in user-facing notes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HttpError(_) => "HttpError",
            Self::CsvError(_) => "CsvError",
            Self::IoError(_) => "IoError",
            Self::SerializationError(_) => "SerializationError",
            Self::TemplateError(_) => "TemplateError",
            Self::ConfigError { .. } => "ConfigError",
            Self::MissingConfigError { .. } => "MissingConfigError",
            Self::InvalidConfigValueError { .. } => "InvalidConfigValueError",
            Self::ValidationError { .. } => "ValidationError",
            Self::WebDriverError { .. } => "WebDriverError",
            Self::Timeout { .. } => "Timeout",
            Self::DriverStartError { .. } => "DriverStartError",
            Self::PageError { .. } => "PageError",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::HttpError(_) => ErrorCategory::Network,
            Self::WebDriverError { .. } | Self::Timeout { .. } | Self::DriverStartError { .. } => {
                ErrorCategory::Browser
            }
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::TemplateError(_)
            | Self::PageError { .. } => ErrorCategory::Data,
            Self::IoError(_) | Self::ValidationError { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Timeout { .. } | Self::PageError { .. } => ErrorSeverity::Medium,
            Self::ValidationError { .. }
            | Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::TemplateError(_)
            | Self::HttpError(_)
            | Self::WebDriverError { .. } => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::IoError(_)
            | Self::DriverStartError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            Self::InvalidConfigValueError {
                field,
                value,
                reason,
            } => format!("Setting '{}' has an invalid value '{}': {}", field, value, reason),
            Self::DriverStartError { .. } => "Could not start the browser driver".to_string(),
            Self::Timeout { .. } => "The registration site took too long to respond".to_string(),
            Self::WebDriverError { code, .. } => format!("Browser automation failed ({})", code),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => "Check the configuration file and command line flags",
            ErrorCategory::Network => "Check network connectivity and that the WebDriver endpoint is reachable",
            ErrorCategory::Browser => {
                "Make sure Chrome and ChromeDriver are installed with matching major versions"
            }
            ErrorCategory::Data => "The registration site layout may have changed; retry later",
            ErrorCategory::Input => "Check the input values and file paths",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegoError>;
