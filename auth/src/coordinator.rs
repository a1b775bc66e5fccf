use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;

use crate::directory::DirectoryError;
use crate::directory::Identity;
use crate::directory::UserDirectory;
use crate::issuer::TokenIssuer;
use crate::issuer::TokenPair;
use crate::jwt::JwtError;
use crate::jwt::TokenClaims;
use crate::jwt::TokenKind;

/// Outcome of a successful pair verification, with the identity the current
/// access token carries. The identity never holds a password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verified {
    /// Both tokens were valid; the presented pair stays in use.
    Unchanged(TokenPair, Identity),
    /// The access token was unusable; a brand-new pair was issued from the refresh token.
    Rotated(TokenPair, Identity),
}

impl Verified {
    pub fn pair(&self) -> &TokenPair {
        match self {
            Verified::Unchanged(pair, _) | Verified::Rotated(pair, _) => pair,
        }
    }

    /// Identity decoded at the same instant the pair was judged valid.
    pub fn identity(&self) -> &Identity {
        match self {
            Verified::Unchanged(_, identity) | Verified::Rotated(_, identity) => identity,
        }
    }

    pub fn into_pair(self) -> TokenPair {
        match self {
            Verified::Unchanged(pair, _) | Verified::Rotated(pair, _) => pair,
        }
    }

    pub fn is_rotated(&self) -> bool {
        matches!(self, Verified::Rotated(..))
    }
}

/// Pair verification errors. All of them require the caller to re-authenticate
/// with credentials, except `DirectoryUnavailable` which may be retried.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RefreshError {
    #[error("Refresh token rejected: {0}")]
    RefreshInvalidOrExpired(JwtError),

    #[error("Access and refresh tokens belong to different identities")]
    IdentityMismatch,

    #[error("Identity no longer exists: {0}")]
    UnknownIdentity(String),

    #[error("User directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Token issuance failed: {0}")]
    Signing(JwtError),
}

impl From<DirectoryError> for RefreshError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Unavailable(msg) => RefreshError::DirectoryUnavailable(msg),
        }
    }
}

/// Validates an access/refresh pair and silently rotates it when the access
/// token is no longer usable but the refresh token is.
///
/// Stateless: every call derives its decision from the two token strings alone.
pub struct RefreshCoordinator<D: UserDirectory> {
    directory: Arc<D>,
    issuer: Arc<TokenIssuer>,
}

impl<D: UserDirectory> RefreshCoordinator<D> {
    pub fn new(directory: Arc<D>, issuer: Arc<TokenIssuer>) -> Self {
        Self { directory, issuer }
    }

    /// Verify a pair against the system clock, rotating it if needed.
    ///
    /// # Errors
    /// * `RefreshInvalidOrExpired` - Refresh token is forged, corrupt, expired or not a refresh token
    /// * `IdentityMismatch` - Authentic access token names a different identity than the refresh token
    /// * `UnknownIdentity` - Refresh token names an identity the directory no longer has
    /// * `DirectoryUnavailable` - Identity lookup failed during rotation
    /// * `Signing` - New pair could not be signed
    pub async fn verify_and_maybe_rotate(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<Verified, RefreshError> {
        self.verify_and_maybe_rotate_at(access_token, refresh_token, Utc::now())
            .await
    }

    /// Verify a pair against an explicit instant, rotating it if needed.
    pub async fn verify_and_maybe_rotate_at(
        &self,
        access_token: &str,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Verified, RefreshError> {
        let codec = self.issuer.codec();

        // Authentic but possibly stale; None when nothing in it can be trusted.
        let access_claims = match codec.verify_signature(access_token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(error = %e, "Access token untrusted, falling back to refresh token");
                None
            }
        };

        let refresh_claims = self.verify_refresh(refresh_token, now)?;

        if let Some(access_claims) = access_claims {
            if access_claims.user_id != refresh_claims.user_id {
                tracing::warn!(
                    access_user_id = %access_claims.user_id,
                    refresh_user_id = %refresh_claims.user_id,
                    "Token pair mixes identities"
                );
                return Err(RefreshError::IdentityMismatch);
            }

            if access_claims.kind() == TokenKind::Access
                && !access_claims.is_expired_at(now.timestamp())
            {
                let pair = TokenPair::from_verified(
                    access_token,
                    refresh_token,
                    &access_claims,
                    &refresh_claims,
                )
                .map_err(RefreshError::RefreshInvalidOrExpired)?;

                return Ok(Verified::Unchanged(pair, access_claims.into_identity()));
            }
        }

        self.rotate(&refresh_claims, now).await
    }

    fn verify_refresh(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, RefreshError> {
        let claims = self.issuer.codec().verify_at(token, now).map_err(|e| {
            tracing::info!(error = %e, "Refresh token rejected");
            RefreshError::RefreshInvalidOrExpired(e)
        })?;

        if claims.kind() != TokenKind::Refresh {
            tracing::warn!(user_id = %claims.user_id, "Access token presented as refresh token");
            return Err(RefreshError::RefreshInvalidOrExpired(JwtError::Malformed(
                "not a refresh token".to_string(),
            )));
        }

        Ok(claims)
    }

    async fn rotate(
        &self,
        refresh_claims: &TokenClaims,
        now: DateTime<Utc>,
    ) -> Result<Verified, RefreshError> {
        let identity = self
            .directory
            .get_by_id(&refresh_claims.user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(user_id = %refresh_claims.user_id, "Refresh token names unknown identity");
                RefreshError::UnknownIdentity(refresh_claims.user_id.clone())
            })?;

        let pair = self
            .issuer
            .issue_at(&identity, now)
            .map_err(RefreshError::Signing)?;

        tracing::info!(user_id = %identity.id, "Token pair rotated");

        Ok(Verified::Rotated(
            pair,
            Identity {
                password_hash: String::new(),
                ..identity
            },
        ))
    }
}
