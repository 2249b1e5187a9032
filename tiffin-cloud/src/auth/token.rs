//! Session tokens minted by a successful login code

use std::sync::Arc;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::OtpPurpose;
use thiserror::Error;

use crate::otp::{OtpError, OtpManager, SubjectKey};

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// JWT claims for a logged-in identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity the login code was sent to
    pub sub: String,
    /// Purpose of the code that minted the token
    pub purpose: OtpPurpose,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Otp(#[from] OtpError),
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub struct SessionIssuer {
    otp: Arc<OtpManager>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_hours: i64,
}

impl SessionIssuer {
    pub fn new(otp: Arc<OtpManager>, secret: &str, ttl_hours: i64) -> Self {
        Self {
            otp,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    /// Verify a login code for `identity` and mint a session token
    pub async fn login(&self, identity: &str, code: &str) -> Result<String, SessionError> {
        let subject = SubjectKey::for_identity(OtpPurpose::Login, identity);
        let receipt = self.otp.verify_code(&subject, code).await?;

        let token = self.create_token(identity, receipt.subject().purpose())?;
        tracing::info!(subject = %subject, "Session issued");
        Ok(token)
    }

    fn create_token(
        &self,
        identity: &str,
        purpose: OtpPurpose,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now();
        let claims = SessionClaims {
            sub: identity.to_string(),
            purpose,
            exp: (now + chrono::Duration::hours(self.ttl_hours)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Validate signature and expiry
    pub fn decode(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let data =
            jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
                .map_err(|e| {
                    tracing::debug!("JWT validation failed: {e}");
                    e
                })?;
        Ok(data.claims)
    }
}
