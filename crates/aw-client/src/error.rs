//! Client error type.

use thiserror::Error;

/// Errors surfaced by the Azure client.
///
/// Enumerator streams carry `Result<T, ClientError>` items; collectors log
/// these and apply their per-mode policy, they never reach the output.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("rate limited: retry after {0} seconds")]
    RateLimited(u64),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
