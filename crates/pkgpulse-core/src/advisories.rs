//! Vulnerability lookups against the OSV database.

use crate::ecosystem::Ecosystem;
use crate::error::ClientError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default OSV API base URL.
pub const DEFAULT_OSV_API: &str = "https://api.osv.dev/";

/// Severity reported when OSV gives none.
const UNKNOWN_SEVERITY: &str = "UNKNOWN";

/// Summary reported when OSV gives none.
const NO_SUMMARY: &str = "No summary available";

/// A known vulnerability advisory for a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub id: String,
    pub summary: String,
    pub severity: String,
    pub published: String,
}

/// Seam for advisory lookups so the pipeline can be tested with fakes.
#[async_trait]
pub trait AdvisoryLookup: Send + Sync {
    /// Query advisories for a package; failures yield an empty list.
    async fn query(&self, name: &str, ecosystem: Ecosystem) -> Vec<Advisory>;
}

/// HTTP client for the OSV query API.
#[derive(Debug, Clone)]
pub struct OsvClient {
    base_url: Url,
    http: Client,
}

impl OsvClient {
    /// Create a client against the given base URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Url(format!("Invalid OSV URL '{base_url}': {e}")))?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("pkgpulse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Http(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { base_url, http })
    }

    /// Create a client against the public OSV API.
    pub fn from_defaults() -> Result<Self, ClientError> {
        Self::new(DEFAULT_OSV_API)
    }

    async fn fetch(&self, name: &str, ecosystem: Ecosystem) -> Result<Vec<Advisory>, ClientError> {
        let url = self
            .base_url
            .join("v1/query")
            .map_err(|e| ClientError::Url(format!("Failed to build OSV query URL: {e}")))?;

        let payload = json!({
            "package": {
                "name": name,
                "ecosystem": ecosystem.osv_name(),
            }
        });

        let response = self.http.post(url.as_str()).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                name: name.to_string(),
            });
        }

        let body: Value = response.json().await?;
        Ok(parse_advisories(&body))
    }
}

#[async_trait]
impl AdvisoryLookup for OsvClient {
    async fn query(&self, name: &str, ecosystem: Ecosystem) -> Vec<Advisory> {
        match self.fetch(name, ecosystem).await {
            Ok(advisories) => {
                debug!(package = %name, ecosystem = %ecosystem, count = advisories.len(), "advisory query");
                advisories
            }
            Err(e) => {
                warn!(package = %name, ecosystem = %ecosystem, error = %e, "advisory query failed");
                Vec::new()
            }
        }
    }
}

/// Map an OSV query response body onto advisory records.
///
/// Missing fields degrade per entry instead of dropping the advisory.
#[must_use]
pub fn parse_advisories(body: &Value) -> Vec<Advisory> {
    let Some(vulns) = body.get("vulns").and_then(Value::as_array) else {
        return Vec::new();
    };

    vulns
        .iter()
        .map(|vuln| Advisory {
            id: vuln
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            summary: vuln
                .get("summary")
                .and_then(Value::as_str)
                .unwrap_or(NO_SUMMARY)
                .to_string(),
            severity: first_severity_type(vuln)
                .unwrap_or(UNKNOWN_SEVERITY)
                .to_string(),
            published: vuln
                .get("published")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

fn first_severity_type(vuln: &Value) -> Option<&str> {
    vuln.get("severity")?
        .as_array()?
        .first()?
        .get("type")?
        .as_str()
}
