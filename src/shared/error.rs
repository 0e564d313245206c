use thiserror::Error;

/// Failure taxonomy shared by the store, the repositories and the dispatcher.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("No connectivity")]
    NoConnectivity,

    #[error("Remote rejected request ({code}): {message}")]
    RemoteRejected { code: u16, message: String },

    #[error("Remote request timed out")]
    Timeout,

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Local persistence failure: {0}")]
    LocalPersistenceFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Mutation already pending for entity {0}")]
    MutationPending(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        AppError::RemoteRejected {
            code,
            message: message.into(),
        }
    }

    /// Errors that are worth retrying on a later dispatcher pass.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::NoConnectivity | AppError::Timeout => true,
            AppError::RemoteRejected { code, .. } => {
                matches!(code, 408 | 409 | 423 | 425 | 429 | 500..=599)
            }
            _ => false,
        }
    }

    /// No fallback store exists, so these must reach the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::LocalPersistenceFailure(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::LocalPersistenceFailure(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::LocalPersistenceFailure(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::LocalPersistenceFailure(format!("payload (de)serialization: {err}"))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return AppError::Timeout;
        }
        if err.is_connect() {
            return AppError::NoConnectivity;
        }
        if let Some(status) = err.status() {
            let code = status.as_u16();
            if code == 401 || code == 403 {
                return AppError::Unauthenticated(err.to_string());
            }
            return AppError::rejected(code, err.to_string());
        }
        if err.is_decode() {
            return AppError::rejected(0, format!("malformed response: {err}"));
        }
        AppError::NoConnectivity
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
