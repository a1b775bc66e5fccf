use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use super::ApiSuccess;
use super::RedirectQuery;
use crate::inbound::http::cookies;

/// Clear both token cookies. Tokens stay valid until they expire.
pub async fn logout(Query(redirect): Query<RedirectQuery>, jar: CookieJar) -> Response {
    let jar = cookies::cleared(jar);

    match redirect.found() {
        Some(found) => (jar, found).into_response(),
        None => (jar, ApiSuccess::new(StatusCode::OK, ())).into_response(),
    }
}
