use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Text suitable for showing to the person using the portal.
    pub fn user_message(&self) -> String {
        match self {
            AppError::AuthError(AuthError::Rejected(message)) => message.clone(),
            AppError::AuthError(AuthError::Network(_)) => {
                "Could not reach the server. Please try again.".to_string()
            }
            AppError::AuthError(e) => e.to_string(),
            AppError::ValidationError(e) => e.to_string(),
            AppError::StorageError(_) | AppError::ConfigError(_) | AppError::InternalError(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StorageError(StorageError::Io(err.to_string()))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::StorageError(StorageError::Serialization(err.to_string()))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::AuthError(AuthError::Network(err.to_string()))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rate limited")]
    RateLimited,

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Network failure: {0}")]
    Network(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Invalid OTP: expected {0} digits")]
    InvalidOtp(usize),

    #[error("Invalid school {field}: {reason}")]
    InvalidSchool { field: &'static str, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("I/O failure: {0}")]
    Io(String),

    #[error("Serialization failure: {0}")]
    Serialization(String),
}
