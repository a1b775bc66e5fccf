use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::directory::Identity;

/// Claims signed into access and refresh tokens.
///
/// Field names are part of the wire format and shared by both token kinds.
/// Refresh tokens populate only `user_id` and `expired`; empty fields are left
/// out when serializing and come back as empty/zero values when parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TokenClaims {
    pub user_id: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub authorized: bool,

    /// Expiration time (Unix timestamp, seconds)
    pub expired: i64,
}

/// Which half of a token pair a set of claims belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenClaims {
    /// Build access token claims carrying the full profile.
    pub fn access(identity: &Identity, expired: i64) -> Self {
        Self {
            user_id: identity.id.clone(),
            username: identity.username.clone(),
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            authorized: true,
            expired,
        }
    }

    /// Build refresh token claims carrying only the identity id.
    pub fn refresh(user_id: impl ToString, expired: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            expired,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> TokenKind {
        if self.authorized {
            TokenKind::Access
        } else {
            TokenKind::Refresh
        }
    }

    /// Check if the token is expired at the given instant.
    ///
    /// A token is valid strictly before its expiry second.
    pub fn is_expired_at(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.expired
    }

    /// Get the expiry as a `DateTime<Utc>`, if it is representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expired, 0)
    }

    /// Reconstruct an identity from the embedded claims.
    ///
    /// The password hash is never part of a token and stays empty.
    pub fn into_identity(self) -> Identity {
        Identity {
            id: self.user_id,
            username: self.username,
            password_hash: String::new(),
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}
