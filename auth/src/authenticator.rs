use std::sync::Arc;
use std::sync::OnceLock;

use crate::directory::DirectoryError;
use crate::directory::UserDirectory;
use crate::issuer::TokenIssuer;
use crate::issuer::TokenPair;
use crate::jwt::JwtError;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Password the decoy hash is derived from; never matches a real login.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-users";

/// Credential authenticator combining directory lookup, password verification
/// and token issuance.
///
/// Unknown usernames and wrong passwords produce the same error, and both
/// paths run one password verification so they cost comparable time.
pub struct Authenticator<D: UserDirectory> {
    directory: Arc<D>,
    password_hasher: PasswordHasher,
    issuer: Arc<TokenIssuer>,
    decoy_hash: OnceLock<Option<String>>,
}

/// Authentication operation errors.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("Wrong username or password")]
    WrongUnameOrPass,

    #[error("User directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Token issuance failed: {0}")]
    Signing(#[from] JwtError),
}

impl From<DirectoryError> for AuthenticationError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Unavailable(msg) => AuthenticationError::DirectoryUnavailable(msg),
        }
    }
}

impl<D: UserDirectory> Authenticator<D> {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `directory` - Identity lookup
    /// * `issuer` - Token issuer used after a successful password check
    pub fn new(directory: Arc<D>, issuer: Arc<TokenIssuer>) -> Self {
        Self {
            directory,
            password_hasher: PasswordHasher::new(),
            issuer,
            decoy_hash: OnceLock::new(),
        }
    }

    /// Replace the password hasher (e.g. to match the cost of stored hashes).
    pub fn with_password_hasher(mut self, password_hasher: PasswordHasher) -> Self {
        self.password_hasher = password_hasher;
        self.decoy_hash = OnceLock::new();
        self
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `HashingFailed` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and issue a token pair.
    ///
    /// # Arguments
    /// * `username` - Exact, case-sensitive username
    /// * `password` - Plaintext password to verify
    ///
    /// # Returns
    /// Freshly issued TokenPair
    ///
    /// # Errors
    /// * `WrongUnameOrPass` - Unknown user or password mismatch
    /// * `DirectoryUnavailable` - Directory lookup failed
    /// * `Signing` - Token generation failed
    pub async fn authorize(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, AuthenticationError> {
        let Some(identity) = self.directory.get_by_name(username).await? else {
            self.verify_decoy(password);
            tracing::info!(reason = "unknown_user", "Authorization rejected");
            return Err(AuthenticationError::WrongUnameOrPass);
        };

        match self.password_hasher.verify(password, &identity.password_hash) {
            Ok(()) => {}
            Err(PasswordError::Mismatch) => {
                tracing::info!(
                    user_id = %identity.id,
                    reason = "password_mismatch",
                    "Authorization rejected"
                );
                return Err(AuthenticationError::WrongUnameOrPass);
            }
            Err(e) => {
                tracing::error!(
                    user_id = %identity.id,
                    error = %e,
                    "Stored password hash is unusable"
                );
                return Err(AuthenticationError::WrongUnameOrPass);
            }
        }

        let pair = self.issuer.issue(&identity)?;
        tracing::info!(user_id = %identity.id, "Authorization granted");

        Ok(pair)
    }

    fn verify_decoy(&self, password: &str) {
        let decoy = self
            .decoy_hash
            .get_or_init(|| self.password_hasher.hash(DECOY_PASSWORD).ok());

        if let Some(hash) = decoy {
            let _ = self.password_hasher.verify(password, hash);
        }
    }
}

#[cfg(test)]
mod tests {
    use argon2::Params;
    use async_trait::async_trait;
    use chrono::Duration;
    use mockall::mock;

    use super::*;
    use crate::directory::Identity;
    use crate::issuer::JwtSettings;

    mock! {
        pub TestDirectory {}

        #[async_trait]
        impl UserDirectory for TestDirectory {
            async fn get_by_name(&self, username: &str) -> Result<Option<Identity>, DirectoryError>;
            async fn get_by_id(&self, id: &str) -> Result<Option<Identity>, DirectoryError>;
        }
    }

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_params(Params::MIN_M_COST, 1, 1).expect("Invalid test params")
    }

    fn issuer() -> Arc<TokenIssuer> {
        Arc::new(TokenIssuer::new(JwtSettings::new(
            "628f955942efffd7e8e30256",
            Duration::minutes(5),
            Duration::minutes(5),
        )))
    }

    fn user() -> Identity {
        Identity {
            id: "u1".to_string(),
            username: "test123".to_string(),
            password_hash: hasher().hash("qwerty").unwrap(),
            email: "user123@example.com".to_string(),
            first_name: "test".to_string(),
            last_name: "123".to_string(),
        }
    }

    fn authenticator(directory: MockTestDirectory) -> Authenticator<MockTestDirectory> {
        Authenticator::new(Arc::new(directory), issuer()).with_password_hasher(hasher())
    }

    #[tokio::test]
    async fn test_authorize_success() {
        let mut directory = MockTestDirectory::new();
        let identity = user();
        directory
            .expect_get_by_name()
            .withf(|name| name == "test123")
            .times(1)
            .returning(move |_| Ok(Some(identity.clone())));

        let authenticator = authenticator(directory);
        let pair = authenticator
            .authorize("test123", "qwerty")
            .await
            .expect("Authorization failed");

        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());

        let claims = issuer().codec().verify(&pair.access_token).unwrap();
        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.username, "test123");
    }

    #[tokio::test]
    async fn test_authorize_wrong_password() {
        let mut directory = MockTestDirectory::new();
        let identity = user();
        directory
            .expect_get_by_name()
            .times(1)
            .returning(move |_| Ok(Some(identity.clone())));

        let result = authenticator(directory)
            .authorize("test123", "qwertyx")
            .await;

        assert_eq!(result, Err(AuthenticationError::WrongUnameOrPass));
    }

    #[tokio::test]
    async fn test_authorize_unknown_user() {
        let mut directory = MockTestDirectory::new();
        directory
            .expect_get_by_name()
            .withf(|name| name == "ghost")
            .times(1)
            .returning(|_| Ok(None));

        let result = authenticator(directory).authorize("ghost", "x").await;

        assert_eq!(result, Err(AuthenticationError::WrongUnameOrPass));
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_are_indistinguishable() {
        let mut directory = MockTestDirectory::new();
        let identity = user();
        directory
            .expect_get_by_name()
            .returning(move |name| Ok((name == "alice").then(|| identity.clone())));

        let authenticator = authenticator(directory);
        let unknown = authenticator.authorize("ghost", "x").await.unwrap_err();
        let mismatch = authenticator.authorize("alice", "wrong-pw").await.unwrap_err();

        assert_eq!(unknown, mismatch);
        assert_eq!(unknown.to_string(), mismatch.to_string());
    }

    #[tokio::test]
    async fn test_username_is_case_sensitive() {
        let mut directory = MockTestDirectory::new();
        directory
            .expect_get_by_name()
            .withf(|name| name == "TEST123")
            .times(1)
            .returning(|_| Ok(None));

        let result = authenticator(directory).authorize("TEST123", "qwerty").await;

        assert_eq!(result, Err(AuthenticationError::WrongUnameOrPass));
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_is_wrong_credentials() {
        let mut directory = MockTestDirectory::new();
        let mut identity = user();
        identity.password_hash = "not-a-phc-string".to_string();
        directory
            .expect_get_by_name()
            .returning(move |_| Ok(Some(identity.clone())));

        let result = authenticator(directory).authorize("test123", "qwerty").await;

        assert_eq!(result, Err(AuthenticationError::WrongUnameOrPass));
    }

    #[tokio::test]
    async fn test_directory_unavailable_is_propagated() {
        let mut directory = MockTestDirectory::new();
        directory
            .expect_get_by_name()
            .times(1)
            .returning(|_| Err(DirectoryError::Unavailable("connection refused".to_string())));

        let result = authenticator(directory).authorize("test123", "qwerty").await;

        assert_eq!(
            result,
            Err(AuthenticationError::DirectoryUnavailable(
                "connection refused".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_empty_secret_is_signing_error() {
        let mut directory = MockTestDirectory::new();
        let identity = user();
        directory
            .expect_get_by_name()
            .returning(move |_| Ok(Some(identity.clone())));

        let issuer = Arc::new(TokenIssuer::new(JwtSettings::new(
            "",
            Duration::minutes(5),
            Duration::minutes(5),
        )));
        let authenticator =
            Authenticator::new(Arc::new(directory), issuer).with_password_hasher(hasher());

        let result = authenticator.authorize("test123", "qwerty").await;
        assert!(matches!(result, Err(AuthenticationError::Signing(_))));
    }

    #[test]
    fn test_hash_password() {
        let authenticator = authenticator(MockTestDirectory::new());

        let hash = authenticator.hash_password("qwerty").unwrap();
        assert!(hasher().verify("qwerty", &hash).is_ok());
    }
}
