use auth::Identity;
use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use crate::domain::user::models::UserId;
use crate::inbound::http::cookies;
use crate::inbound::http::cookies::CookieTokens;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type to store the authenticated identity in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub identity: Identity,
}

impl AuthenticatedUser {
    /// Reject requests acting on an account other than the caller's own.
    pub fn ensure_self(&self, user_id: &UserId) -> Result<(), ApiError> {
        if self.user_id == *user_id {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user_id,
                target_user_id = %user_id,
                "Cross-account modification refused"
            );
            Err(ApiError::Forbidden(
                "Cannot modify another user's account".to_string(),
            ))
        }
    }
}

/// Middleware that verifies the cookie token pair, rotating it when needed,
/// and adds the identity decoded by that verification to request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let tokens = CookieTokens::from_jar(&jar).ok_or_else(|| {
        tracing::debug!("Request without refresh token cookie");
        ApiError::Forbidden("Missing refresh token cookie".to_string())
    })?;

    let verified = state
        .auth_service
        .verify_and_maybe_rotate(tokens.access_token(), &tokens.refresh_token)
        .await
        .map_err(|e| {
            tracing::info!(error = %e, "Token pair rejected");
            ApiError::from(e)
        })?;

    let identity = verified.identity().clone();

    let user_id = UserId::from_string(&identity.id).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse user ID from token");
        ApiError::Forbidden("Invalid access token".to_string())
    })?;

    req.extensions_mut()
        .insert(AuthenticatedUser { user_id, identity });

    let response = next.run(req).await;

    if verified.is_rotated() {
        let jar = cookies::with_token_pair(jar, verified.pair());
        Ok((jar, response).into_response())
    } else {
        Ok(response)
    }
}
