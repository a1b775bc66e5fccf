use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;
use crate::user::errors::UserError;

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<ApiSuccess<()>, ApiError> {
    let user_id = UserId::from_string(&id).map_err(UserError::from)?;
    authenticated.ensure_self(&user_id)?;

    state
        .user_service
        .delete_user(&user_id)
        .await
        .map_err(ApiError::from)
        .map(|_| ApiSuccess::new(StatusCode::NO_CONTENT, ()))
}
