use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

const SELECT_USER: &str = r#"
    SELECT id, username, email, password_hash, first_name, last_name, created_at
    FROM users
"#;

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = UserError;

    fn try_from(r: UserRecord) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(r.id),
            username: Username::new(r.username)?,
            email: EmailAddress::new(r.email)?,
            password_hash: r.password_hash,
            first_name: r.first_name,
            last_name: r.last_name,
            created_at: r.created_at,
        })
    }
}

fn write_error(e: sqlx::Error, user: &User) -> UserError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("users_username_key") {
                return UserError::UsernameAlreadyExists(user.username.as_str().to_string());
            }
            if db_err.constraint() == Some("users_email_key") {
                return UserError::EmailAlreadyExists(user.email.as_str().to_string());
            }
        }
    }
    UserError::DatabaseError(e.to_string())
}

fn read_error(e: sqlx::Error) -> UserError {
    UserError::DatabaseError(e.to_string())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, first_name, last_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.0)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &user))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let query = format!("{} WHERE id = $1", SELECT_USER);

        sqlx::query_as::<_, UserRecord>(&query)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError> {
        let query = format!("{} WHERE username = $1", SELECT_USER);

        sqlx::query_as::<_, UserRecord>(&query)
            .bind(username.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(read_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let query = format!("{} ORDER BY created_at DESC", SELECT_USER);

        sqlx::query_as::<_, UserRecord>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(read_error)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, first_name = $4, last_name = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &user))?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), UserError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(read_error)?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(read_error)?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
