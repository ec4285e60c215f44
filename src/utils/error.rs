use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{service} API returned {status}: {message}")]
    ApiError {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} rate limit still in effect after {attempts} attempts")]
    RateLimited {
        service: &'static str,
        attempts: u32,
    },

    #[error("Slack API error: {code}")]
    SlackError { code: String },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid watermark '{value}': {reason}")]
    InvalidWatermark { value: String, reason: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    RemoteApi,
    State,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::TomlError(_) => ErrorCategory::Configuration,
            SyncError::HttpError(_) | SyncError::RateLimited { .. } => ErrorCategory::Network,
            SyncError::ApiError { .. }
            | SyncError::SlackError { .. }
            | SyncError::AuthError { .. } => ErrorCategory::RemoteApi,
            SyncError::IoError(_)
            | SyncError::StorageError { .. }
            | SyncError::InvalidWatermark { .. } => ErrorCategory::State,
            SyncError::CsvError(_)
            | SyncError::SerializationError(_)
            | SyncError::ProcessingError { .. } => ErrorCategory::Processing,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Transient: the next scheduled run will most likely succeed.
            SyncError::HttpError(_) | SyncError::RateLimited { .. } => ErrorSeverity::Medium,
            SyncError::ApiError { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            SyncError::ApiError { .. }
            | SyncError::SlackError { .. }
            | SyncError::CsvError(_)
            | SyncError::SerializationError(_)
            | SyncError::ProcessingError { .. } => ErrorSeverity::High,
            SyncError::AuthError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::TomlError(_)
            | SyncError::IoError(_)
            | SyncError::StorageError { .. }
            | SyncError::InvalidWatermark { .. } => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for a failed run.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SyncError::HttpError(_) => {
                "Check network connectivity to Slack and Genesys Cloud, then rerun".to_string()
            }
            SyncError::RateLimited { service, .. } => format!(
                "{} is throttling requests; wait a few minutes before the next run",
                service
            ),
            SyncError::ApiError { status: 401, .. } | SyncError::ApiError { status: 403, .. } => {
                "Verify the OAuth client has the required permissions".to_string()
            }
            SyncError::ApiError { status: 404, .. } => {
                "Verify the data table / division / user ids exist in this region".to_string()
            }
            SyncError::ApiError { .. } => "Inspect the API response body above".to_string(),
            SyncError::SlackError { code } if code == "not_in_channel" => {
                "Invite the bot user to the channel".to_string()
            }
            SyncError::SlackError { code } if code == "invalid_auth" || code == "not_authed" => {
                "Check SLACK_BOT_TOKEN".to_string()
            }
            SyncError::SlackError { .. } => {
                "Check the Slack token scopes (channels:history) and channel id".to_string()
            }
            SyncError::AuthError { .. } => {
                "Check GENESYS_CLIENT_ID, GENESYS_CLIENT_SECRET and the region".to_string()
            }
            SyncError::MissingConfigError { field } => {
                format!("Set {} via command line flag or environment variable", field)
            }
            SyncError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of {}", field)
            }
            SyncError::TomlError(_) => "Fix the syntax of the configuration file".to_string(),
            SyncError::InvalidWatermark { .. } => {
                "Fix or delete the watermark file; deleting it rescans the whole channel"
                    .to_string()
            }
            SyncError::IoError(_) | SyncError::StorageError { .. } => {
                "Check that the watermark location is readable and writable".to_string()
            }
            SyncError::CsvError(_) | SyncError::SerializationError(_) => {
                "Check the output file path and remote response format".to_string()
            }
            SyncError::ProcessingError { .. } => "Rerun with --verbose for details".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::RemoteApi => format!("Remote API rejected the request: {}", self),
            ErrorCategory::State => format!("Could not access run state: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
