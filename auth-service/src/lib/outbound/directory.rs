use std::sync::Arc;

use async_trait::async_trait;
use auth::DirectoryError;
use auth::Identity;
use auth::UserDirectory;

use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Exposes a user repository to the auth engine as its identity directory.
pub struct UserDirectoryAdapter<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserDirectoryAdapter<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Identity {
            id: user.id.to_string(),
            username: user.username.as_str().to_string(),
            password_hash: user.password_hash,
            email: user.email.as_str().to_string(),
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

fn unavailable(err: UserError) -> DirectoryError {
    tracing::error!(error = %err, "User directory lookup failed");
    DirectoryError::Unavailable(err.to_string())
}

#[async_trait]
impl<R: UserRepository> UserDirectory for UserDirectoryAdapter<R> {
    async fn get_by_name(&self, username: &str) -> Result<Option<Identity>, DirectoryError> {
        // Names that fail validation were never stored.
        let Ok(username) = Username::new(username.to_string()) else {
            return Ok(None);
        };

        self.repository
            .find_by_username(&username)
            .await
            .map(|user| user.map(Identity::from))
            .map_err(unavailable)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Identity>, DirectoryError> {
        let Ok(id) = UserId::from_string(id) else {
            return Ok(None);
        };

        self.repository
            .find_by_id(&id)
            .await
            .map(|user| user.map(Identity::from))
            .map_err(unavailable)
    }
}
