use auth::TokenPair;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::CookieJar;
use chrono::DateTime;
use chrono::Utc;
use time::OffsetDateTime;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Tokens read from the request cookies.
///
/// A missing access cookie is kept as `None`: browsers drop it once its
/// `Expires` passes, which is exactly when the pair needs rotating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieTokens {
    pub access_token: Option<String>,
    pub refresh_token: String,
}

impl CookieTokens {
    /// Read both token cookies; `None` when the refresh cookie is absent.
    pub fn from_jar(jar: &CookieJar) -> Option<Self> {
        let refresh_token = jar.get(REFRESH_TOKEN_COOKIE)?.value().to_string();
        let access_token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string());

        Some(Self {
            access_token,
            refresh_token,
        })
    }

    pub fn access_token(&self) -> &str {
        self.access_token.as_deref().unwrap_or_default()
    }
}

/// Set both token cookies from a freshly issued or rotated pair.
///
/// The refresh cookie is `HttpOnly`; both live on `/` and expire with their token.
pub fn with_token_pair(jar: CookieJar, pair: &TokenPair) -> CookieJar {
    let access = Cookie::build((ACCESS_TOKEN_COOKIE, pair.access_token.clone()))
        .path("/")
        .expires(expiry(pair.access_expires_at));

    let refresh = Cookie::build((REFRESH_TOKEN_COOKIE, pair.refresh_token.clone()))
        .path("/")
        .http_only(true)
        .expires(expiry(pair.refresh_expires_at));

    jar.add(access).add(refresh)
}

/// Overwrite both token cookies with empty, already-expired values.
pub fn cleared(jar: CookieJar) -> CookieJar {
    let access = Cookie::build((ACCESS_TOKEN_COOKIE, ""))
        .path("/")
        .expires(OffsetDateTime::UNIX_EPOCH);

    let refresh = Cookie::build((REFRESH_TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .expires(OffsetDateTime::UNIX_EPOCH);

    jar.add(access).add(refresh)
}

fn expiry(instant: DateTime<Utc>) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(instant.timestamp()).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}
