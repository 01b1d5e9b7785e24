use thiserror::Error;

use domain::error::DomainError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Store error: {message}")]
    StoreError { message: String },

    #[error("Transaction error: contended")]
    TransactionContended { key: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl AppError {
    #[must_use]
    pub fn is_contended(&self) -> bool {
        matches!(self, Self::TransactionContended { .. })
    }
}

pub type AppResult<T> = Result<T, AppError>;
