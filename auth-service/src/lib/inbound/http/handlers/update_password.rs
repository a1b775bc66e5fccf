use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

#[derive(Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

/// Replace the caller's password. Existing tokens stay valid until they expire.
pub async fn update_password(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    let user_id = UserId::from_string(&id).map_err(UserError::from)?;
    authenticated.ensure_self(&user_id)?;

    state
        .user_service
        .update_password(&user_id, &req.password)
        .await
        .map_err(ApiError::from)
        .map(|_| ApiSuccess::new(StatusCode::OK, ()))
}
