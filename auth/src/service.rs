use std::sync::Arc;

use async_trait::async_trait;

use crate::authenticator::AuthenticationError;
use crate::authenticator::Authenticator;
use crate::coordinator::RefreshCoordinator;
use crate::coordinator::RefreshError;
use crate::coordinator::Verified;
use crate::directory::Identity;
use crate::directory::UserDirectory;
use crate::issuer::JwtSettings;
use crate::issuer::TokenIssuer;
use crate::issuer::TokenPair;
use crate::jwt::JwtError;
use crate::jwt::TokenKind;
use crate::password::PasswordHasher;

/// Authentication operations offered to inbound adapters.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Exchange username and password for a fresh token pair.
    ///
    /// # Errors
    /// * `WrongUnameOrPass` - Unknown user or password mismatch
    /// * `DirectoryUnavailable` - Directory lookup failed
    /// * `Signing` - Token generation failed
    async fn authorize(&self, username: &str, password: &str)
        -> Result<TokenPair, AuthenticationError>;

    /// Verify a token pair, rotating it when the access token is no longer usable.
    ///
    /// The returned identity comes from the same verification, so callers do
    /// not need a separate `parse_token` round.
    ///
    /// # Errors
    /// See [`RefreshError`] variants.
    async fn verify_and_maybe_rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Verified, RefreshError>;

    /// Decode the identity carried by a valid access token.
    ///
    /// The returned identity never carries a password hash.
    ///
    /// # Errors
    /// * `Expired` - Token lifetime is over
    /// * `BadSignature` - Token was not signed with the configured secret
    /// * `Malformed` - Token is not a well-formed access token
    fn parse_token(&self, access_token: &str) -> Result<Identity, JwtError>;
}

/// Authentication service built over a user directory and one set of JWT settings.
pub struct AuthService<D: UserDirectory> {
    authenticator: Authenticator<D>,
    coordinator: RefreshCoordinator<D>,
    issuer: Arc<TokenIssuer>,
}

impl<D: UserDirectory> AuthService<D> {
    pub fn new(directory: Arc<D>, settings: JwtSettings) -> Self {
        let issuer = Arc::new(TokenIssuer::new(settings));

        Self {
            authenticator: Authenticator::new(Arc::clone(&directory), Arc::clone(&issuer)),
            coordinator: RefreshCoordinator::new(directory, Arc::clone(&issuer)),
            issuer,
        }
    }

    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.authenticator = self.authenticator.with_password_hasher(password_hasher);
        self
    }

    pub fn settings(&self) -> &JwtSettings {
        self.issuer.settings()
    }
}

#[async_trait]
impl<D: UserDirectory> AuthServicePort for AuthService<D> {
    async fn authorize(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, AuthenticationError> {
        self.authenticator.authorize(username, password).await
    }

    async fn verify_and_maybe_rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Verified, RefreshError> {
        self.coordinator
            .verify_and_maybe_rotate(access_token, refresh_token)
            .await
    }

    fn parse_token(&self, access_token: &str) -> Result<Identity, JwtError> {
        let claims = self.issuer.codec().verify(access_token)?;

        if claims.kind() != TokenKind::Access {
            return Err(JwtError::Malformed("not an access token".to_string()));
        }

        Ok(claims.into_identity())
    }
}
