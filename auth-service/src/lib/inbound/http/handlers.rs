use auth::AuthenticationError;
use auth::RefreshError;
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::user::models::User;
use crate::user::errors::UserError;

pub mod create_user;
pub mod current_user;
pub mod delete_user;
pub mod get_user;
pub mod list_users;
pub mod login;
pub mod logout;
pub mod update_password;
pub mod update_user;
pub mod validate;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => ApiError::NotFound(err.to_string()),
            UserError::UsernameAlreadyExists(_) | UserError::EmailAlreadyExists(_) => {
                ApiError::Conflict(err.to_string())
            }
            UserError::InvalidUsername(_)
            | UserError::InvalidEmail(_)
            | UserError::InvalidUserId(_)
            | UserError::EmptyPassword => ApiError::UnprocessableEntity(err.to_string()),
            UserError::Password(_) | UserError::DatabaseError(_) => {
                tracing::error!(error = %err, "User operation failed");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

impl From<AuthenticationError> for ApiError {
    fn from(err: AuthenticationError) -> Self {
        match err {
            AuthenticationError::WrongUnameOrPass => ApiError::Unauthorized(err.to_string()),
            AuthenticationError::DirectoryUnavailable(_) => {
                ApiError::ServiceUnavailable("User directory unavailable".to_string())
            }
            AuthenticationError::Signing(_) => {
                tracing::error!(error = %err, "Token issuance failed");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::RefreshInvalidOrExpired(_)
            | RefreshError::IdentityMismatch
            | RefreshError::UnknownIdentity(_) => ApiError::Forbidden(err.to_string()),
            RefreshError::DirectoryUnavailable(_) => {
                ApiError::ServiceUnavailable("User directory unavailable".to_string())
            }
            RefreshError::Signing(_) => {
                tracing::error!(error = %err, "Token rotation failed");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Optional `?redirect_uri=` accepted by the login and logout endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedirectQuery {
    pub redirect_uri: Option<String>,
}

impl RedirectQuery {
    /// `302 Found` to the requested URI, if one was given.
    pub fn found(&self) -> Option<Response> {
        self.redirect_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .map(|uri| (StatusCode::FOUND, [(LOCATION, uri.to_string())]).into_response())
    }
}

/// Public view of a user; never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponseData {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponseData {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.as_str().to_string(),
            email: user.email.as_str().to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at,
        }
    }
}
