use std::sync::Arc;
use std::time::Duration;

use auth::AuthServicePort;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::create_user::create_user;
use super::handlers::current_user::current_user;
use super::handlers::delete_user::delete_user;
use super::handlers::get_user::get_user;
use super::handlers::list_users::list_users;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::update_password::update_password;
use super::handlers::update_user::update_user;
use super::handlers::validate::validate;
use super::middleware::authenticate as auth_middleware;
use crate::domain::user::ports::UserServicePort;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub user_service: Arc<dyn UserServicePort>,
}

pub fn create_router(
    auth_service: Arc<dyn AuthServicePort>,
    user_service: Arc<dyn UserServicePort>,
) -> Router {
    let state = AppState {
        auth_service,
        user_service,
    };

    let public_routes = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/validate", post(validate))
        .route("/api/users", post(create_user));

    let protected_routes = Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/me", get(current_user))
        .route(
            "/api/users/:user_id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/api/users/:user_id/password", put(update_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Headers are left out of the span: they carry the token cookies.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri().path(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                path = %request.uri().path(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use auth::AuthenticationError;
    use auth::Identity;
    use auth::JwtError;
    use auth::RefreshError;
    use auth::TokenPair;
    use auth::Verified;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::header::COOKIE;
    use axum::http::header::LOCATION;
    use axum::http::header::SET_COOKIE;
    use axum::http::StatusCode;
    use chrono::DateTime;
    use chrono::Utc;
    use mockall::mock;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::user::models::CreateUserCommand;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::UpdateUserCommand;
    use crate::domain::user::models::User;
    use crate::domain::user::models::UserId;
    use crate::domain::user::models::Username;
    use crate::user::errors::UserError;

    mock! {
        pub TestAuthService {}

        #[async_trait]
        impl AuthServicePort for TestAuthService {
            async fn authorize(&self, username: &str, password: &str) -> Result<TokenPair, AuthenticationError>;
            async fn verify_and_maybe_rotate(&self, access_token: &str, refresh_token: &str) -> Result<Verified, RefreshError>;
            fn parse_token(&self, access_token: &str) -> Result<Identity, JwtError>;
        }
    }

    mock! {
        pub TestUserService {}

        #[async_trait]
        impl UserServicePort for TestUserService {
            async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError>;
            async fn get_user(&self, id: &UserId) -> Result<User, UserError>;
            async fn list_users(&self) -> Result<Vec<User>, UserError>;
            async fn update_user(&self, id: &UserId, command: UpdateUserCommand) -> Result<User, UserError>;
            async fn update_password(&self, id: &UserId, new_password: &str) -> Result<(), UserError>;
            async fn delete_user(&self, id: &UserId) -> Result<(), UserError>;
        }
    }

    const USER_ID: &str = "6f1c2a7e-3b4d-4c8e-9a0f-1d2e3f4a5b6c";

    fn pair(suffix: &str) -> TokenPair {
        TokenPair {
            access_token: format!("access-{}", suffix),
            refresh_token: format!("refresh-{}", suffix),
            access_expires_at: DateTime::from_timestamp(4_000_000_000, 0).unwrap(),
            refresh_expires_at: DateTime::from_timestamp(4_100_000_000, 0).unwrap(),
        }
    }

    fn identity() -> Identity {
        Identity {
            id: USER_ID.to_string(),
            username: "test123".to_string(),
            ..Identity::default()
        }
    }

    fn user() -> User {
        User {
            id: UserId::from_string(USER_ID).unwrap(),
            username: Username::new("test123".to_string()).unwrap(),
            email: EmailAddress::new("user123@example.com".to_string()).unwrap(),
            password_hash: "$argon2id$test_hash".to_string(),
            first_name: "test".to_string(),
            last_name: "123".to_string(),
            created_at: Utc::now(),
        }
    }

    fn router(auth_service: MockTestAuthService, user_service: MockTestUserService) -> Router {
        create_router(Arc::new(auth_service), Arc::new(user_service))
    }

    fn login_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn with_cookies(method: &str, uri: &str, cookies: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(COOKIE, cookies)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap()
    }

    fn set_cookies(response: &axum::response::Response) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_login_sets_cookies() {
        let mut auth_service = MockTestAuthService::new();
        auth_service
            .expect_authorize()
            .withf(|username, password| username == "test123" && password == "qwerty")
            .times(1)
            .returning(|_, _| Ok(pair("1")));

        let response = router(auth_service, MockTestUserService::new())
            .oneshot(login_request(
                "/api/auth/login",
                r#"{"username": "test123", "password": "qwerty"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=access-1")));
        assert!(cookies
            .iter()
            .any(|c| c.starts_with("refresh_token=refresh-1") && c.contains("HttpOnly")));
    }

    #[tokio::test]
    async fn test_login_accepts_login_alias_and_redirects() {
        let mut auth_service = MockTestAuthService::new();
        auth_service
            .expect_authorize()
            .times(1)
            .returning(|_, _| Ok(pair("1")));

        let response = router(auth_service, MockTestUserService::new())
            .oneshot(login_request(
                "/api/auth/login?redirect_uri=/dashboard",
                r#"{"login": "test123", "password": "qwerty"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/dashboard");
        assert_eq!(set_cookies(&response).len(), 2);
    }

    #[tokio::test]
    async fn test_login_wrong_credentials() {
        let mut auth_service = MockTestAuthService::new();
        auth_service
            .expect_authorize()
            .times(1)
            .returning(|_, _| Err(AuthenticationError::WrongUnameOrPass));

        let response = router(auth_service, MockTestUserService::new())
            .oneshot(login_request(
                "/api/auth/login",
                r#"{"username": "test123", "password": "nope"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let mut auth_service = MockTestAuthService::new();
        auth_service.expect_authorize().times(0);

        let response = router(auth_service, MockTestUserService::new())
            .oneshot(login_request(
                "/api/auth/login",
                r#"{"username": "", "password": "qwerty"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validate_without_cookies_is_forbidden() {
        let mut auth_service = MockTestAuthService::new();
        auth_service.expect_verify_and_maybe_rotate().times(0);

        let response = router(auth_service, MockTestUserService::new())
            .oneshot(with_cookies("POST", "/api/auth/validate", "access_token=a"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_validate_unchanged_pair_sets_no_cookies() {
        let mut auth_service = MockTestAuthService::new();
        auth_service
            .expect_verify_and_maybe_rotate()
            .withf(|access, refresh| access == "a" && refresh == "r")
            .times(1)
            .returning(|_, _| Ok(Verified::Unchanged(pair("1"), identity())));

        let response = router(auth_service, MockTestUserService::new())
            .oneshot(with_cookies(
                "POST",
                "/api/auth/validate",
                "access_token=a; refresh_token=r",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn test_validate_rejection_is_forbidden() {
        let mut auth_service = MockTestAuthService::new();
        auth_service
            .expect_verify_and_maybe_rotate()
            .times(1)
            .returning(|_, _| Err(RefreshError::IdentityMismatch));

        let response = router(auth_service, MockTestUserService::new())
            .oneshot(with_cookies(
                "POST",
                "/api/auth/validate",
                "access_token=a; refresh_token=r",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_protected_route_reemits_rotated_cookies() {
        let mut auth_service = MockTestAuthService::new();
        auth_service
            .expect_verify_and_maybe_rotate()
            .withf(|access, refresh| access.is_empty() && refresh == "r")
            .times(1)
            .returning(|_, _| Ok(Verified::Rotated(pair("2"), identity())));
        auth_service.expect_parse_token().times(0);

        let mut user_service = MockTestUserService::new();
        user_service
            .expect_get_user()
            .withf(|id| id.to_string() == USER_ID)
            .times(1)
            .returning(|_| Ok(user()));

        let response = router(auth_service, user_service)
            .oneshot(with_cookies("GET", "/api/users/me", "refresh_token=r"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(cookies.iter().any(|c| c.starts_with("access_token=access-2")));
        assert!(cookies.iter().any(|c| c.starts_with("refresh_token=refresh-2")));
    }

    #[tokio::test]
    async fn test_protected_route_rejects_expired_refresh() {
        let mut auth_service = MockTestAuthService::new();
        auth_service
            .expect_verify_and_maybe_rotate()
            .times(1)
            .returning(|_, _| Err(RefreshError::RefreshInvalidOrExpired(JwtError::Expired)));

        let mut user_service = MockTestUserService::new();
        user_service.expect_list_users().times(0);

        let response = router(auth_service, user_service)
            .oneshot(with_cookies(
                "GET",
                "/api/users",
                "access_token=a; refresh_token=r",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_cannot_delete_another_user() {
        let mut auth_service = MockTestAuthService::new();
        auth_service
            .expect_verify_and_maybe_rotate()
            .returning(|_, _| Ok(Verified::Unchanged(pair("1"), identity())));

        let mut user_service = MockTestUserService::new();
        user_service.expect_delete_user().times(0);

        let other = UserId::new();
        let response = router(auth_service, user_service)
            .oneshot(with_cookies(
                "DELETE",
                &format!("/api/users/{}", other),
                "access_token=a; refresh_token=r",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_protected_route_trusts_identity_from_verification() {
        let mut auth_service = MockTestAuthService::new();
        auth_service
            .expect_verify_and_maybe_rotate()
            .times(1)
            .returning(|_, _| Ok(Verified::Unchanged(pair("1"), identity())));
        auth_service
            .expect_parse_token()
            .times(0)
            .returning(|_| Err(JwtError::Expired));

        let mut user_service = MockTestUserService::new();
        user_service
            .expect_get_user()
            .withf(|id| id.to_string() == USER_ID)
            .times(1)
            .returning(|_| Ok(user()));

        let response = router(auth_service, user_service)
            .oneshot(with_cookies(
                "GET",
                "/api/users/me",
                "access_token=a; refresh_token=r",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn test_directory_outage_is_service_unavailable() {
        let mut auth_service = MockTestAuthService::new();
        auth_service
            .expect_verify_and_maybe_rotate()
            .times(1)
            .returning(|_, _| Err(RefreshError::DirectoryUnavailable("down".to_string())));

        let response = router(auth_service, MockTestUserService::new())
            .oneshot(with_cookies("GET", "/api/users/me", "refresh_token=r"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
