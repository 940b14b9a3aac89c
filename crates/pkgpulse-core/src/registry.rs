//! Package registry lookups (PyPI and the npm registry).

use crate::ecosystem::Ecosystem;
use crate::error::ClientError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default PyPI base URL.
pub const DEFAULT_PYPI_REGISTRY: &str = "https://pypi.org/";

/// Default npm registry base URL.
pub const DEFAULT_NPM_REGISTRY: &str = "https://registry.npmjs.org/";

/// What a registry knows about a package.
///
/// The default value (`found = false`, no version) doubles as the degraded
/// result for any lookup failure: "unknown" is a valid, non-fatal state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryInfo {
    /// Latest published version, absent when the lookup failed.
    pub latest_version: Option<String>,
    /// Whether the registry answered for this package.
    pub found: bool,
    /// Whether the latest version carries a deprecation marker.
    pub deprecated: bool,
}

/// Seam for registry lookups so the pipeline can be tested with fakes.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    /// Look up a package, absorbing every failure into a degraded result.
    async fn lookup(&self, name: &str, ecosystem: Ecosystem) -> RegistryInfo;
}

/// HTTP client for PyPI and npm registry metadata.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    pypi_url: Url,
    npm_url: Url,
    http: Client,
}

impl RegistryClient {
    /// Create a client against the given base URLs.
    pub fn new(pypi_url: &str, npm_url: &str) -> Result<Self, ClientError> {
        let pypi_url = Url::parse(pypi_url)
            .map_err(|e| ClientError::Url(format!("Invalid PyPI URL '{pypi_url}': {e}")))?;
        let npm_url = Url::parse(npm_url)
            .map_err(|e| ClientError::Url(format!("Invalid npm registry URL '{npm_url}': {e}")))?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("pkgpulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            pypi_url,
            npm_url,
            http,
        })
    }

    /// Create a client against the public registries.
    pub fn from_defaults() -> Result<Self, ClientError> {
        Self::new(DEFAULT_PYPI_REGISTRY, DEFAULT_NPM_REGISTRY)
    }

    async fn fetch_pypi(&self, name: &str) -> Result<RegistryInfo, ClientError> {
        let url = self
            .pypi_url
            .join(&format!("pypi/{name}/json"))
            .map_err(|e| ClientError::Url(format!("Failed to build URL for '{name}': {e}")))?;

        let response = self.http.get(url.as_str()).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                name: name.to_string(),
            });
        }

        let body: Value = response.json().await?;
        let latest = body
            .get("info")
            .and_then(|info| info.get("version"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClientError::Malformed(format!("PyPI response for '{name}' has no info.version"))
            })?;

        Ok(RegistryInfo {
            latest_version: Some(latest.to_string()),
            found: true,
            deprecated: false,
        })
    }

    async fn fetch_npm(&self, name: &str) -> Result<RegistryInfo, ClientError> {
        // URL-encode the name for scoped packages
        let encoded_name = if name.starts_with('@') {
            name.replace('/', "%2F")
        } else {
            name.to_string()
        };

        let url = self
            .npm_url
            .join(&encoded_name)
            .map_err(|e| ClientError::Url(format!("Failed to build URL for '{name}': {e}")))?;

        let response = self.http.get(url.as_str()).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                name: name.to_string(),
            });
        }

        let packument: Value = response.json().await?;
        let latest = get_latest_version(&packument).ok_or_else(|| {
            ClientError::Malformed(format!("packument for '{name}' has no dist-tags.latest"))
        })?;

        Ok(RegistryInfo {
            deprecated: is_version_deprecated(&packument, latest),
            latest_version: Some(latest.to_string()),
            found: true,
        })
    }
}

#[async_trait]
impl RegistryLookup for RegistryClient {
    async fn lookup(&self, name: &str, ecosystem: Ecosystem) -> RegistryInfo {
        let result = match ecosystem {
            Ecosystem::Python => self.fetch_pypi(name).await,
            Ecosystem::Npm => self.fetch_npm(name).await,
        };

        match result {
            Ok(info) => {
                debug!(package = %name, ecosystem = %ecosystem, latest = ?info.latest_version, "registry lookup");
                info
            }
            Err(e) => {
                warn!(package = %name, ecosystem = %ecosystem, error = %e, "registry lookup failed");
                RegistryInfo::default()
            }
        }
    }
}

/// Extract the latest version from an npm packument.
#[must_use]
pub fn get_latest_version(packument: &Value) -> Option<&str> {
    packument.get("dist-tags")?.get("latest")?.as_str()
}

/// Whether a packument marks the given version as deprecated.
///
/// The marker is usually a message string; `false` and `null` both mean
/// "not deprecated".
#[must_use]
pub fn is_version_deprecated(packument: &Value, version: &str) -> bool {
    packument
        .get("versions")
        .and_then(|versions| versions.get(version))
        .and_then(|entry| entry.get("deprecated"))
        .is_some_and(|marker| !marker.is_null() && marker.as_bool() != Some(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_latest_version() {
        let packument = serde_json::json!({
            "name": "react",
            "dist-tags": {
                "latest": "18.2.0",
                "next": "19.0.0-rc.0"
            }
        });

        assert_eq!(get_latest_version(&packument), Some("18.2.0"));
    }

    #[test]
    fn test_get_latest_version_missing() {
        let packument = serde_json::json!({ "name": "react" });
        assert_eq!(get_latest_version(&packument), None);
    }

    #[test]
    fn test_deprecated_marker_string() {
        let packument = serde_json::json!({
            "dist-tags": { "latest": "1.0.0" },
            "versions": {
                "1.0.0": { "deprecated": "use something else" }
            }
        });

        assert!(is_version_deprecated(&packument, "1.0.0"));
    }

    #[test]
    fn test_deprecated_marker_absent_or_false() {
        let packument = serde_json::json!({
            "versions": {
                "1.0.0": {},
                "1.1.0": { "deprecated": false }
            }
        });

        assert!(!is_version_deprecated(&packument, "1.0.0"));
        assert!(!is_version_deprecated(&packument, "1.1.0"));
        assert!(!is_version_deprecated(&packument, "2.0.0"));
    }

    #[test]
    fn test_client_creation() {
        assert!(RegistryClient::from_defaults().is_ok());
    }

    #[test]
    fn test_client_invalid_url() {
        assert!(RegistryClient::new("not-a-url", DEFAULT_NPM_REGISTRY).is_err());
        assert!(RegistryClient::new(DEFAULT_PYPI_REGISTRY, "not-a-url").is_err());
    }

    #[test]
    fn test_registry_info_default_is_degraded() {
        let info = RegistryInfo::default();
        assert!(!info.found);
        assert!(info.latest_version.is_none());
        assert!(!info.deprecated);
    }
}
