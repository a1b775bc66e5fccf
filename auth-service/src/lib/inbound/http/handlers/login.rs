use auth::TokenPair;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::RedirectQuery;
use crate::inbound::http::cookies;
use crate::inbound::http::router::AppState;

/// Exchange credentials for a token pair delivered as cookies.
pub async fn login(
    State(state): State<AppState>,
    Query(redirect): Query<RedirectQuery>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    body.validate()?;

    let pair = state
        .auth_service
        .authorize(&body.username, &body.password)
        .await
        .map_err(ApiError::from)?;

    let jar = cookies::with_token_pair(jar, &pair);

    Ok(match redirect.found() {
        Some(found) => (jar, found).into_response(),
        None => (jar, ApiSuccess::<TokenPair>::new(StatusCode::OK, pair)).into_response(),
    })
}

/// HTTP request body for logging in (raw JSON)
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "login")]
    username: String,
    password: String,
}

impl LoginRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ApiError::BadRequest(
                "username and password are required".to_string(),
            ));
        }
        Ok(())
    }
}
