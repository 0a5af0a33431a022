//! Authenticated HTTP transport with retry, backoff and rate limiting.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::auth::TokenCache;
use crate::config::AzureConfig;
use crate::error::{ClientError, ClientResult};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared transport underneath every enumerator: one connection pool, one
/// token cache, one optional request rate cap.
pub(crate) struct Transport {
    http: reqwest::Client,
    tokens: TokenCache,
    rate_limiter: Option<DirectRateLimiter>,
    max_retries: u32,
}

impl Transport {
    pub(crate) fn new(config: &AzureConfig) -> ClientResult<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        for (key, value) in &config.headers {
            if let (Ok(name), Ok(value)) = (
                reqwest::header::HeaderName::try_from(key.as_str()),
                reqwest::header::HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, value);
            }
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::ConfigError(e.to_string()))?;

        let rate_limiter = match config.requests_per_second {
            Some(rps) => {
                let rps = NonZeroU32::new(rps).ok_or_else(|| {
                    ClientError::ConfigError("requests_per_second must be nonzero".into())
                })?;
                Some(RateLimiter::direct(Quota::per_second(rps)))
            }
            None => None,
        };

        Ok(Self {
            tokens: TokenCache::new(http.clone(), config),
            http,
            rate_limiter,
            max_retries: config.max_retries,
        })
    }

    /// GET `url` with a bearer token for `resource` and decode the JSON
    /// body. Retries timeouts, connection failures, 429 and 5xx with
    /// exponential backoff; 4xx responses fail immediately.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        url: &str,
    ) -> ClientResult<T> {
        let mut last_error = None;
        let mut delay = Duration::from_millis(100);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt, ?delay, "retrying request");
                sleep(delay).await;
                delay = std::cmp::min(delay * 2 + jitter(), Duration::from_secs(30));
            }

            if let Some(limiter) = &self.rate_limiter {
                limiter.until_ready().await;
            }

            let token = self.tokens.bearer_token(resource).await?;
            let result = self
                .http
                .get(url)
                .bearer_auth(token.expose_secret())
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        warn!(retry_after, url, "throttled by the service");
                        if attempt < self.max_retries {
                            sleep(Duration::from_secs(retry_after)).await;
                            continue;
                        }
                        return Err(ClientError::RateLimited(retry_after));
                    }

                    if status.is_server_error() && attempt < self.max_retries {
                        warn!(%status, url, "server error, retrying");
                        last_error = Some(ClientError::RequestFailed(format!(
                            "server error: {status}"
                        )));
                        continue;
                    }

                    if status.is_client_error() {
                        return Err(match status {
                            StatusCode::UNAUTHORIZED => {
                                ClientError::AuthenticationFailed("unauthorized".into())
                            }
                            StatusCode::FORBIDDEN => {
                                ClientError::AuthorizationDenied("forbidden".into())
                            }
                            StatusCode::NOT_FOUND => ClientError::NotFound(url.to_string()),
                            _ => ClientError::RequestFailed(format!("client error: {status}")),
                        });
                    }

                    if !status.is_success() {
                        return Err(ClientError::RequestFailed(format!(
                            "unexpected status: {status}"
                        )));
                    }

                    let body = response
                        .text()
                        .await
                        .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
                    return serde_json::from_str(&body).map_err(|e| {
                        ClientError::InvalidResponse(format!(
                            "failed to decode response: {e} - body: {}",
                            body.chars().take(500).collect::<String>()
                        ))
                    });
                }
                Err(e) => {
                    last_error = Some(if e.is_timeout() {
                        ClientError::Timeout(e.to_string())
                    } else if e.is_connect() {
                        ClientError::ConnectionFailed(e.to_string())
                    } else {
                        ClientError::RequestFailed(e.to_string())
                    });
                    if attempt >= self.max_retries {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ClientError::Internal("request retries exhausted".into())))
    }
}

/// Small jitter for backoff, derived from the clock.
fn jitter() -> Duration {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::time::Instant::now().hash(&mut hasher);
    Duration::from_millis(hasher.finish() % 100)
}
