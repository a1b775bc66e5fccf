use auth::TokenPair;
use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::cookies;
use crate::inbound::http::cookies::CookieTokens;
use crate::inbound::http::router::AppState;

/// Verify the cookie token pair, re-setting the cookies if it was rotated.
pub async fn validate(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiSuccess<ValidateResponseData>), ApiError> {
    let tokens = CookieTokens::from_jar(&jar)
        .ok_or_else(|| ApiError::Forbidden("Missing refresh token cookie".to_string()))?;

    let verified = state
        .auth_service
        .verify_and_maybe_rotate(tokens.access_token(), &tokens.refresh_token)
        .await
        .map_err(|e| {
            tracing::info!(error = %e, "Token pair rejected");
            ApiError::from(e)
        })?;

    let rotated = verified.is_rotated();
    let pair = verified.into_pair();
    let jar = if rotated {
        cookies::with_token_pair(jar, &pair)
    } else {
        jar
    };

    Ok((
        jar,
        ApiSuccess::new(StatusCode::OK, ValidateResponseData { rotated, pair }),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateResponseData {
    pub rotated: bool,
    #[serde(flatten)]
    pub pair: TokenPair,
}
