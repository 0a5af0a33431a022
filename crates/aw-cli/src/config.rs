//! Configuration loading and merging.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use aw_client::AzureConfig;
use serde::{Deserialize, Serialize};

/// On-disk configuration file (YAML).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Azure connection parameters.
    #[serde(default)]
    pub azure: AzureSection,
    /// Default output file path.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureSection {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

impl AppConfig {
    /// Loads configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }
}

/// Fully resolved run settings. Flags and environment take precedence
/// over the config file.
#[derive(Debug)]
pub struct Settings {
    pub azure: AzureConfig,
    pub output: Option<PathBuf>,
}

pub fn resolve(
    config_path: Option<&Path>,
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    output: Option<PathBuf>,
) -> Result<Settings> {
    let file = match config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let tenant_id = tenant_id.or(file.azure.tenant_id);
    let client_id = client_id.or(file.azure.client_id);
    let client_secret = client_secret.or(file.azure.client_secret);

    let (Some(tenant_id), Some(client_id), Some(client_secret)) =
        (tenant_id, client_id, client_secret)
    else {
        bail!("tenant id, client id and client secret are required (flags, environment or config file)");
    };

    let mut azure = AzureConfig::new(tenant_id, client_id, client_secret);
    azure.requests_per_second = file.azure.requests_per_second;

    Ok(Settings {
        azure,
        output: output.or(file.output),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_alone_are_sufficient() {
        let settings = resolve(
            None,
            Some("t1".into()),
            Some("c1".into()),
            Some("s3cr3t".into()),
            None,
        )
        .unwrap();
        assert_eq!(settings.azure.tenant_id, "t1");
        assert_eq!(settings.azure.client_secret.expose_secret(), "s3cr3t");
        assert!(settings.output.is_none());
    }

    #[test]
    fn missing_credentials_fail_resolution() {
        let result = resolve(None, Some("t1".into()), None, None, None);
        assert!(result.is_err());
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("azure-warden-config-test.yaml");
        std::fs::write(
            &path,
            "azure:\n  tenant_id: file-tenant\n  client_id: file-client\n  client_secret: file-secret\noutput: /tmp/from-file.jsonl\n",
        )
        .unwrap();

        let settings = resolve(
            Some(&path),
            Some("flag-tenant".into()),
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(settings.azure.tenant_id, "flag-tenant");
        assert_eq!(settings.azure.client_id, "file-client");
        assert_eq!(settings.output, Some(PathBuf::from("/tmp/from-file.jsonl")));

        std::fs::remove_file(&path).ok();
    }
}
