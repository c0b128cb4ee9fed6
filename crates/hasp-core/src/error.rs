use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Validation errors
    #[error("Invalid locker address: {message}")]
    InvalidAddress { message: String },

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid timestamp: {message}")]
    InvalidTimestamp { message: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
