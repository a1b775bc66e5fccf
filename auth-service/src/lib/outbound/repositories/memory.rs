use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local user store, optionally seeded from a JSON users file.
///
/// Suited to development and tests; contents are lost on restart.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

/// Error loading a users seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid seed user {username}: {source}")]
    InvalidUser { username: String, source: UserError },

    #[error("Seed user {0} has neither password nor password_hash")]
    MissingPassword(String),

    #[error("Seed user {username} reuses id {id}")]
    DuplicateId { username: String, id: String },
}

/// One entry of the seed file. Plaintext passwords are hashed on load.
#[derive(Debug, Deserialize)]
struct SeedUser {
    id: Option<Uuid>,
    username: String,
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    password: Option<String>,
    password_hash: Option<String>,
}

impl SeedUser {
    fn into_user(self, hasher: &auth::PasswordHasher) -> Result<User, SeedError> {
        let username = self.username.clone();
        let invalid = |source: UserError| SeedError::InvalidUser {
            username: username.clone(),
            source,
        };

        let password_hash = match (self.password_hash, self.password) {
            (Some(hash), _) => {
                hasher
                    .check_format(&hash)
                    .map_err(|e| invalid(UserError::from(e)))?;
                hash
            }
            (None, Some(password)) => hasher
                .hash(&password)
                .map_err(|e| invalid(UserError::from(e)))?,
            (None, None) => return Err(SeedError::MissingPassword(self.username)),
        };

        Ok(User {
            id: self.id.map(UserId).unwrap_or_default(),
            username: Username::new(self.username).map_err(|e| invalid(e.into()))?,
            email: EmailAddress::new(self.email).map_err(|e| invalid(e.into()))?,
            password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: Utc::now(),
        })
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from a JSON array of users.
    ///
    /// # Errors
    /// * `Parse` - Document is not a JSON array of users
    /// * `InvalidUser` - A user fails validation, has an unusable hash or
    ///   reuses a username or email
    /// * `MissingPassword` - A user carries no credential
    /// * `DuplicateId` - Two users share an id
    pub fn from_seed_json(
        json: &str,
        hasher: &auth::PasswordHasher,
    ) -> Result<Self, SeedError> {
        let seeds: Vec<SeedUser> = serde_json::from_str(json)?;

        let mut users: Vec<User> = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let user = seed.into_user(hasher)?;
            if users.iter().any(|u| u.id == user.id) {
                return Err(SeedError::DuplicateId {
                    username: user.username.to_string(),
                    id: user.id.to_string(),
                });
            }
            if let Some(conflict) = find_conflict(&users, &user) {
                return Err(SeedError::InvalidUser {
                    username: user.username.to_string(),
                    source: conflict,
                });
            }
            users.push(user);
        }

        tracing::info!(users = users.len(), "In-memory user directory seeded");

        Ok(Self {
            users: RwLock::new(users),
        })
    }

    /// Build a repository from a JSON users file on disk.
    pub async fn from_seed_file(
        path: impl AsRef<Path>,
        hasher: &auth::PasswordHasher,
    ) -> Result<Self, SeedError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_seed_json(&json, hasher)
    }
}

fn find_conflict(users: &[User], candidate: &User) -> Option<UserError> {
    for existing in users.iter().filter(|u| u.id != candidate.id) {
        if existing.username == candidate.username {
            return Some(UserError::UsernameAlreadyExists(
                candidate.username.to_string(),
            ));
        }
        if existing.email == candidate.email {
            return Some(UserError::EmailAlreadyExists(
                candidate.email.as_str().to_string(),
            ));
        }
    }
    None
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if users.iter().any(|u| u.id == user.id) {
            return Err(UserError::DatabaseError(format!(
                "duplicate user id {}",
                user.id
            )));
        }
        if let Some(conflict) = find_conflict(&users, &user) {
            return Err(conflict);
        }

        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == *username).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let mut users = self.users.read().await.clone();
        users.reverse();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.write().await;

        if let Some(conflict) = find_conflict(&users, &user) {
            return Err(conflict);
        }

        let stored = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| UserError::NotFound(user.id.to_string()))?;

        stored.username = user.username;
        stored.email = user.email;
        stored.first_name = user.first_name;
        stored.last_name = user.last_name;

        Ok(stored.clone())
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), UserError> {
        let mut users = self.users.write().await;

        let stored = users
            .iter_mut()
            .find(|u| u.id == *id)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        stored.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserError> {
        let mut users = self.users.write().await;

        let position = users
            .iter()
            .position(|u| u.id == *id)
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;

        users.remove(position);
        Ok(())
    }
}
