//! Identity resolution against an OAuth2 / OpenID Connect user-info endpoint.

use std::time::Duration;

use async_trait::async_trait;

use pathguard_auth::{IdentityResolver, ResolveError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Resolves a bearer token by presenting it to the provider's user-info
/// endpoint and returning the response body unchanged.
#[derive(Debug, Clone)]
pub struct OAuthUserInfoResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl OAuthUserInfoResolver {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolveError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IdentityResolver for OAuthUserInfoResolver {
    async fn resolve(&self, bearer_token: &str) -> Result<Vec<u8>, ResolveError> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(|e| ResolveError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ResolveError::Body(e.to_string()))?;
        Ok(body.to_vec())
    }
}
