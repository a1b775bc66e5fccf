use thiserror::Error;

/// Error type for token signing and verification.
///
/// `Expired` is only ever returned for tokens whose signature verified, so
/// callers can tell a stale but genuine token from a forged or corrupt one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token is expired")]
    Expired,

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Failed to sign token: {0}")]
    SigningError(String),
}
