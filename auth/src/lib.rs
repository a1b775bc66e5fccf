//! Authentication engine
//!
//! Turns username/password credentials into a signed access/refresh token pair
//! and keeps sessions alive by silently rotating the pair:
//! - Password hashing (Argon2id, PHC strings)
//! - HS256 token encoding with a versioned claim schema
//! - Credential authentication against a pluggable user directory
//! - Pair verification with transparent refresh
//!
//! The hosting service provides identities through [`UserDirectory`] and
//! talks to the engine through [`AuthServicePort`].
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).is_ok());
//! ```
//!
//! ## Token Pairs
//! ```
//! use auth::{Identity, JwtSettings, TokenIssuer};
//! use chrono::Duration;
//!
//! let issuer = TokenIssuer::new(JwtSettings::new(
//!     "secret_key_at_least_32_bytes_long!",
//!     Duration::minutes(15),
//!     Duration::days(7),
//! ));
//! let identity = Identity {
//!     id: "user123".to_string(),
//!     username: "alice".to_string(),
//!     ..Identity::default()
//! };
//!
//! let pair = issuer.issue(&identity).unwrap();
//! let claims = issuer.codec().verify(&pair.access_token).unwrap();
//! assert_eq!(claims.user_id, "user123");
//! ```

pub mod authenticator;
pub mod coordinator;
pub mod directory;
pub mod issuer;
pub mod jwt;
pub mod password;
pub mod service;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use coordinator::RefreshCoordinator;
pub use coordinator::RefreshError;
pub use coordinator::Verified;
pub use directory::DirectoryError;
pub use directory::Identity;
pub use directory::UserDirectory;
pub use issuer::JwtSettings;
pub use issuer::TokenIssuer;
pub use issuer::TokenPair;
pub use jwt::JwtError;
pub use jwt::TokenClaims;
pub use jwt::TokenCodec;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use service::AuthService;
pub use service::AuthServicePort;
