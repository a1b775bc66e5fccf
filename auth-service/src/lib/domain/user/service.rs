use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    password_hasher: auth::PasswordHasher,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    ///
    /// # Returns
    /// Configured user service instance
    pub fn new(repository: Arc<UR>) -> Self {
        Self {
            repository,
            password_hasher: auth::PasswordHasher::new(),
        }
    }

    pub fn with_password_hasher(mut self, password_hasher: auth::PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self
    }

    fn hash(&self, password: &str) -> Result<String, UserError> {
        if password.is_empty() {
            return Err(UserError::EmptyPassword);
        }

        Ok(self.password_hasher.hash(password)?)
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError> {
        let password_hash = self.hash(&command.password)?;

        let user = User {
            id: UserId::new(),
            username: command.username,
            email: command.email,
            password_hash,
            first_name: command.first_name,
            last_name: command.last_name,
            created_at: Utc::now(),
        };

        let created_user = self.repository.create(user).await?;
        tracing::info!(
            user_id = %created_user.id,
            username = %created_user.username,
            "User created"
        );

        Ok(created_user)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn list_users(&self) -> Result<Vec<User>, UserError> {
        self.repository.list_all().await
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, UserError> {
        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))?;

        if let Some(new_username) = command.username {
            user.username = new_username;
        }

        if let Some(new_email) = command.email {
            user.email = new_email;
        }

        if let Some(first_name) = command.first_name {
            user.first_name = first_name;
        }

        if let Some(last_name) = command.last_name {
            user.last_name = last_name;
        }

        let updated_user = self.repository.update(user).await?;
        tracing::info!(user_id = %updated_user.id, "User updated");

        Ok(updated_user)
    }

    async fn update_password(&self, id: &UserId, new_password: &str) -> Result<(), UserError> {
        let password_hash = self.hash(new_password)?;

        self.repository.update_password(id, &password_hash).await?;
        tracing::info!(user_id = %id, "User password changed");

        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        self.repository.delete(id).await?;
        tracing::info!(user_id = %id, "User deleted");

        Ok(())
    }
}
