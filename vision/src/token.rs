use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::api::VisionError;
use crate::credentials::ServiceAccountKey;
use crate::time::TimeSource;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// A short lived bearer token. Lives for a single outbound request.
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    #[serde(rename = "access_token")]
    pub token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenProvider {
    async fn access_token(&self, key: &ServiceAccountKey) -> Result<AccessToken, VisionError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Exchanges a service account key for a bearer token with the OAuth 2.0
/// JWT bearer grant. No caching: every call signs a fresh assertion.
pub struct ServiceAccountTokenProvider {
    client: reqwest::Client,
    timesource: Arc<dyn TimeSource + Send + Sync>,
    scope: String,
}

impl ServiceAccountTokenProvider {
    pub fn new<T: TimeSource + Send + Sync + 'static>(timesource: T) -> ServiceAccountTokenProvider {
        ServiceAccountTokenProvider {
            client: reqwest::Client::new(),
            timesource: Arc::new(timesource),
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
        }
    }

    pub fn assertion(&self, key: &ServiceAccountKey) -> Result<String, VisionError> {
        let iat = self.timesource.current_time().unix_timestamp();
        let claims = AssertionClaims {
            iss: key.client_email.clone(),
            scope: self.scope.clone(),
            aud: key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| VisionError::InvalidCredential(e.to_string()))?;

        encode(&header, &claims, &signing_key)
            .map_err(|e| VisionError::InvalidCredential(e.to_string()))
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    #[instrument(skip_all, fields(client_email = %key.client_email))]
    async fn access_token(&self, key: &ServiceAccountKey) -> Result<AccessToken, VisionError> {
        let assertion = self.assertion(key)?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("token endpoint unreachable: {}", e);
                VisionError::TokenError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "token exchange rejected: {}", body);
            return Err(VisionError::TokenError(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: AccessToken = response
            .json()
            .await
            .map_err(|e| VisionError::TokenError(e.to_string()))?;

        if token.token.is_empty() {
            return Err(VisionError::TokenError(String::from(
                "token endpoint returned an empty token",
            )));
        }

        debug!(expires_in = ?token.expires_in, "obtained access token");
        Ok(token)
    }
}
