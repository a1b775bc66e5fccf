#![allow(dead_code)]

use std::sync::Arc;

use auth::AuthService;
use auth::JwtSettings;
use auth::PasswordHasher;
use auth::TokenIssuer;
use auth_service::domain::user::service::UserService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::directory::UserDirectoryAdapter;
use auth_service::outbound::repositories::InMemoryUserRepository;
use reqwest::redirect::Policy;

pub const JWT_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const SEED_USER_ID: &str = "6f1c2a7e-3b4d-4c8e-9a0f-1d2e3f4a5b6c";
pub const SEED_USERNAME: &str = "test123";
pub const SEED_PASSWORD: &str = "qwerty";

const SEED_USERS: &str = r#"[
    {
        "id": "6f1c2a7e-3b4d-4c8e-9a0f-1d2e3f4a5b6c",
        "username": "test123",
        "password": "qwerty",
        "email": "user123@example.com",
        "first_name": "test",
        "last_name": "123"
    }
]"#;

/// Test application that spawns a real server over the in-memory directory
pub struct TestApp {
    pub address: String,
    pub port: u16,
    /// Client with a cookie store, behaving like a browser session.
    pub api_client: reqwest::Client,
    /// Client without cookie store or redirect following, for hand-built requests.
    pub raw_client: reqwest::Client,
    /// Issuer sharing the server's secret, for crafting tokens.
    pub issuer: TokenIssuer,
}

pub fn settings() -> JwtSettings {
    JwtSettings::new(
        JWT_SECRET,
        chrono::Duration::minutes(15),
        chrono::Duration::days(7),
    )
}

fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_params(8, 1, 1).expect("Invalid test hasher params")
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = Arc::new(
            InMemoryUserRepository::from_seed_json(SEED_USERS, &fast_hasher())
                .expect("Failed to seed users"),
        );
        let directory = Arc::new(UserDirectoryAdapter::new(Arc::clone(&repository)));

        let auth_service =
            Arc::new(AuthService::new(directory, settings()).with_password_hasher(fast_hasher()));
        let user_service =
            Arc::new(UserService::new(repository).with_password_hasher(fast_hasher()));

        let router = create_router(auth_service, user_service);

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::builder()
                .cookie_store(true)
                .redirect(Policy::none())
                .build()
                .expect("Failed to create reqwest client"),
            raw_client: reqwest::Client::builder()
                .redirect(Policy::none())
                .build()
                .expect("Failed to create reqwest client"),
            issuer: TokenIssuer::new(settings()),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(self.url(path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(self.url(path))
    }

    /// Helper to make PATCH request
    pub fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.patch(self.url(path))
    }

    /// Helper to make PUT request
    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.put(self.url(path))
    }

    /// Helper to make DELETE request
    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.delete(self.url(path))
    }

    /// POST with explicit token cookies, bypassing the cookie store
    pub fn post_with_tokens(
        &self,
        path: &str,
        access_token: &str,
        refresh_token: &str,
    ) -> reqwest::RequestBuilder {
        self.raw_client.post(self.url(path)).header(
            reqwest::header::COOKIE,
            format!(
                "access_token={}; refresh_token={}",
                access_token, refresh_token
            ),
        )
    }

    /// Log in through the API, storing the token cookies in `api_client`
    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/login")
            .json(&serde_json::json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register a user through the public endpoint
    pub async fn register(&self, username: &str, email: &str, password: &str) -> serde_json::Value {
        let response = self
            .post("/api/users")
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
                "first_name": "Test",
                "last_name": "User",
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }
}

/// Values of the `Set-Cookie` headers on a response
pub fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}
