//! Azure connection configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::secure_string::SecureString;

/// Connection parameters for one tenant.
///
/// Loaded before the pipeline starts and never read by the collectors;
/// only the client holds on to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Directory (tenant) id or domain name.
    pub tenant_id: String,
    /// Application (client) id used for the client-credentials grant.
    pub client_id: String,
    /// Client secret (zeroized on drop).
    pub client_secret: SecureString,
    /// Microsoft Graph endpoint.
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
    /// Azure Resource Manager endpoint.
    #[serde(default = "default_management_url")]
    pub management_url: String,
    /// Token authority endpoint.
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum retries per request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Optional client-side request rate cap, in requests per second.
    #[serde(default)]
    pub requests_per_second: Option<u32>,
    /// Additional headers for every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_graph_url() -> String {
    "https://graph.microsoft.com".to_string()
}

fn default_management_url() -> String {
    "https://management.azure.com".to_string()
}

fn default_login_url() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl AzureConfig {
    /// Creates a configuration for the public cloud with default tuning.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<SecureString>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            graph_url: default_graph_url(),
            management_url: default_management_url(),
            login_url: default_login_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            requests_per_second: None,
            headers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_public_cloud() {
        let config = AzureConfig::new("tenant", "client", "secret");
        assert_eq!(config.graph_url, "https://graph.microsoft.com");
        assert_eq!(config.management_url, "https://management.azure.com");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: AzureConfig =
            serde_json::from_str(r#"{"tenant_id":"t","client_id":"c","client_secret":"s"}"#)
                .unwrap();
        assert_eq!(config.tenant_id, "t");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.requests_per_second.is_none());
        assert_eq!(config.client_secret.expose_secret(), "s");
    }
}
