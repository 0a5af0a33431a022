//! OAuth2 client-credentials token acquisition and caching.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::AzureConfig;
use crate::error::{ClientError, ClientResult};
use crate::secure_string::SecureString;

/// Refresh a token this long before its reported expiry.
const EXPIRY_SKEW: Duration = Duration::from_secs(60);

/// One cached token per audience (Graph and ARM use distinct scopes).
pub(crate) struct TokenCache {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: SecureString,
    tokens: RwLock<HashMap<String, CachedToken>>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: SecureString,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl TokenCache {
    pub(crate) fn new(http: reqwest::Client, config: &AzureConfig) -> Self {
        Self {
            http,
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                config.login_url.trim_end_matches('/'),
                config.tenant_id
            ),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a bearer token for `resource`, fetching a fresh one when the
    /// cached token is missing or close to expiry.
    pub(crate) async fn bearer_token(&self, resource: &str) -> ClientResult<SecureString> {
        {
            let tokens = self.tokens.read().await;
            if let Some(token) = tokens.get(resource) {
                if token.expires_at > Instant::now() + EXPIRY_SKEW {
                    return Ok(token.access_token.clone());
                }
            }
        }

        debug!(resource, "fetching new access token");
        let scope = format!("{}/.default", resource.trim_end_matches('/'));
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ClientError::AuthenticationFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::AuthenticationFailed(format!(
                "token request failed with status {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        let access_token = SecureString::new(token.access_token);
        let cached = CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        };
        self.tokens
            .write()
            .await
            .insert(resource.to_string(), cached);
        Ok(access_token)
    }
}
