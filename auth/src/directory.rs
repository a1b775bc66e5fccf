use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Identity record as seen by the authentication engine.
///
/// Owned by the user directory; the engine only reads it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// Error returned by user directory lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("User directory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only lookup of identities, implemented by the hosting service.
///
/// Lookups return `Ok(None)` when no identity matches. Callers bound a lookup
/// by dropping or timing out the returned future.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Find an identity by its exact, case-sensitive username.
    ///
    /// # Errors
    /// * `Unavailable` - Directory backend could not be reached
    async fn get_by_name(&self, username: &str) -> Result<Option<Identity>, DirectoryError>;

    /// Find an identity by its opaque id.
    ///
    /// # Errors
    /// * `Unavailable` - Directory backend could not be reached
    async fn get_by_id(&self, id: &str) -> Result<Option<Identity>, DirectoryError>;
}
