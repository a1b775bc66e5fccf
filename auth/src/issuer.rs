use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Serialize;

use crate::directory::Identity;
use crate::jwt::JwtError;
use crate::jwt::TokenClaims;
use crate::jwt::TokenCodec;

/// Signing secret and token lifetimes.
///
/// Passed explicitly to every issuer so tests can run with distinct secrets.
#[derive(Clone)]
pub struct JwtSettings {
    pub secret_key: String,
    pub access_lifetime: Duration,
    pub refresh_lifetime: Duration,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret_key", &"<redacted>")
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish()
    }
}

impl JwtSettings {
    pub fn new(
        secret_key: impl Into<String>,
        access_lifetime: Duration,
        refresh_lifetime: Duration,
    ) -> Self {
        Self {
            secret_key: secret_key.into(),
            access_lifetime,
            refresh_lifetime,
        }
    }

    /// Check that the settings can produce usable tokens.
    ///
    /// # Errors
    /// * `SigningError` - Secret is empty or a lifetime is shorter than one second
    pub fn validate(&self) -> Result<(), JwtError> {
        if self.secret_key.is_empty() {
            return Err(JwtError::SigningError("secret key is empty".to_string()));
        }
        // Expiries are whole seconds; anything shorter truncates to an instant expiry.
        if self.access_lifetime.num_seconds() < 1 || self.refresh_lifetime.num_seconds() < 1 {
            return Err(JwtError::SigningError(
                "token lifetimes must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Access and refresh tokens minted together, with their expiry instants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

impl TokenPair {
    /// Rebuild a pair from two already-verified tokens and their claims.
    pub(crate) fn from_verified(
        access_token: &str,
        refresh_token: &str,
        access_claims: &TokenClaims,
        refresh_claims: &TokenClaims,
    ) -> Result<Self, JwtError> {
        Ok(Self {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            access_expires_at: expiry_of(access_claims)?,
            refresh_expires_at: expiry_of(refresh_claims)?,
        })
    }
}

fn expiry_of(claims: &TokenClaims) -> Result<DateTime<Utc>, JwtError> {
    claims
        .expires_at()
        .ok_or_else(|| JwtError::Malformed(format!("expiry out of range: {}", claims.expired)))
}

/// Builds signed access/refresh token pairs for an identity.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    settings: JwtSettings,
    codec: TokenCodec,
}

impl TokenIssuer {
    pub fn new(settings: JwtSettings) -> Self {
        let codec = TokenCodec::new(settings.secret_key.as_bytes());
        Self { settings, codec }
    }

    /// Codec keyed with the same secret the issuer signs with.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    /// Issue a new token pair for an identity, starting now.
    ///
    /// # Errors
    /// * `SigningError` - Secret is empty, lifetimes overflow, or signing failed
    pub fn issue(&self, identity: &Identity) -> Result<TokenPair, JwtError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a new token pair whose lifetimes both start at `now`.
    ///
    /// Expiries are truncated to whole seconds so the instants in the pair
    /// match the ones embedded in the tokens.
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<TokenPair, JwtError> {
        let issued_at = now.timestamp();
        let access_expired = expiry_after(issued_at, self.settings.access_lifetime)?;
        let refresh_expired = expiry_after(issued_at, self.settings.refresh_lifetime)?;

        let access_claims = TokenClaims::access(identity, access_expired);
        let refresh_claims = TokenClaims::refresh(&identity.id, refresh_expired);

        let access_token = self.codec.sign(&access_claims)?;
        let refresh_token = self.codec.sign(&refresh_claims)?;

        tracing::debug!(
            user_id = %identity.id,
            access_expired,
            refresh_expired,
            "Token pair issued"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at: expiry_of(&access_claims).map_err(signing)?,
            refresh_expires_at: expiry_of(&refresh_claims).map_err(signing)?,
        })
    }
}

fn expiry_after(issued_at: i64, lifetime: Duration) -> Result<i64, JwtError> {
    issued_at
        .checked_add(lifetime.num_seconds())
        .ok_or_else(|| JwtError::SigningError("token lifetime overflows".to_string()))
}

fn signing(error: JwtError) -> JwtError {
    JwtError::SigningError(error.to_string())
}
