use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),

    #[error("Invalid charge amount: {0}")]
    InvalidChargeAmount(String),

    #[error("Invalid charge attempt transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

pub type DomainResult<T> = Result<T, DomainError>;
