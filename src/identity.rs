use crate::config::IdentityConfig;
use crate::error::{AuthFailure, ExtractionError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Stable identifier of an authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves a bearer credential to a caller identity
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: Option<&str>) -> Result<CallerId, ExtractionError>;
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    id: String,
}

/// Verifies credentials against a GoTrue-style `/auth/v1/user` endpoint
#[derive(Debug, Clone)]
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpIdentityVerifier {
    pub fn new(config: &IdentityConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/auth/v1/user", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, credential: Option<&str>) -> Result<CallerId, ExtractionError> {
        let Some(token) = credential.map(str::trim).filter(|t| !t.is_empty()) else {
            ::log::info!("Rejecting request without credential");
            return Err(AuthFailure::MissingCredential.into());
        };

        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                ::log::error!("Identity service request failed: {}", e);
                AuthFailure::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            ::log::info!("Identity service rejected credential ({})", status);
            return Err(AuthFailure::Rejected.into());
        }
        if !status.is_success() {
            ::log::error!("Identity service returned HTTP {}", status);
            return Err(AuthFailure::Unavailable(format!("HTTP {status}")).into());
        }

        let user: UserResponse = response.json().await.map_err(|e| {
            ::log::error!("Identity service sent an unreadable body: {}", e);
            AuthFailure::Unavailable(e.to_string())
        })?;

        if user.id.trim().is_empty() {
            ::log::error!("Identity service response has no user id");
            return Err(AuthFailure::Unavailable("missing user id".into()).into());
        }

        ::log::debug!("Authenticated caller {}", user.id);
        Ok(CallerId::new(user.id))
    }
}

/// Accepts every caller as one fixed identity, for local runs without an identity service
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    id: CallerId,
}

impl StaticIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: CallerId::new(id),
        }
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentity {
    async fn verify(&self, _credential: Option<&str>) -> Result<CallerId, ExtractionError> {
        Ok(self.id.clone())
    }
}
