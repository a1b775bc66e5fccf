use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use jsonwebtoken::errors::Error as JsonWebTokenError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::TokenClaims;
use super::errors::JwtError;

/// Content type stamped into every token header.
///
/// Identifies the claims schema so that a change to the claim layout is
/// detected as a malformed token instead of silently parsing stale fields.
pub const CLAIMS_SCHEMA: &str = "claims.v1";

/// Signs and verifies compact HS256 tokens.
///
/// The only accepted algorithm is HS256: a header naming any other algorithm
/// is rejected before the signature is considered. Expiry is checked against
/// the `expired` claim by the codec itself rather than by `jsonwebtoken`.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    has_secret: bool,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithms", &self.validation.algorithms)
            .field("has_secret", &self.has_secret)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec keyed by a shared secret.
    ///
    /// An empty secret is accepted here but makes every `sign` fail with
    /// `SigningError` and every `verify` fail with `BadSignature`.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256];
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            has_secret: !secret.is_empty(),
        }
    }

    /// Serialize and sign claims into a token string.
    ///
    /// # Errors
    /// * `SigningError` - Secret is empty or encoding failed
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, JwtError> {
        if !self.has_secret {
            return Err(JwtError::SigningError("secret key is empty".to_string()));
        }

        let mut header = Header::new(Algorithm::HS256);
        header.cty = Some(CLAIMS_SCHEMA.to_string());

        jsonwebtoken::encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::SigningError(e.to_string()))
    }

    /// Verify signature and expiry against the system clock.
    ///
    /// # Errors
    /// * `Expired` - Signature is valid but the token is past its expiry
    /// * `BadSignature` - Signature does not match or algorithm is not HS256
    /// * `Malformed` - Token structure, encoding or claims cannot be parsed
    pub fn verify(&self, token: &str) -> Result<TokenClaims, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature and expiry against an explicit instant.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, JwtError> {
        let claims = self.verify_signature(token)?;

        if claims.is_expired_at(now.timestamp()) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }

    /// Verify the signature only, ignoring expiry.
    ///
    /// Claims returned here are authentic but may be stale.
    pub fn verify_signature(&self, token: &str) -> Result<TokenClaims, JwtError> {
        if !self.has_secret {
            return Err(JwtError::BadSignature);
        }

        let token_data =
            jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
                .map_err(classify)?;

        if token_data.header.cty.as_deref() != Some(CLAIMS_SCHEMA) {
            return Err(JwtError::Malformed(format!(
                "unsupported claims schema: {:?}",
                token_data.header.cty
            )));
        }

        Ok(token_data.claims)
    }
}

fn classify(error: JsonWebTokenError) -> JwtError {
    match error.kind() {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => JwtError::BadSignature,
        ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Malformed(error.to_string()),
    }
}
