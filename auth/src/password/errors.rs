use thiserror::Error;

/// Error type for password operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password does not match")]
    Mismatch,

    #[error("Invalid password hash format: {0}")]
    InvalidHashFormat(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}
