//! The fan-out analysis pipeline.
//!
//! For each specifier the registry and advisory lookups run together, and
//! across specifiers a bounded ordered stream keeps fan-out against the
//! external services in check. Output order always matches input order,
//! whatever order the lookups complete in.

use crate::advisories::{Advisory, AdvisoryLookup};
use crate::ecosystem::Ecosystem;
use crate::extract::Specifier;
use crate::registry::RegistryLookup;
use crate::score::{health_score, recommendation};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum concurrent per-specifier analyses.
pub const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Health findings for a single package.
///
/// Field names are the caller-facing JSON contract; do not rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageReport {
    pub name: String,
    pub current_version: Option<String>,
    pub latest_version: Option<String>,
    pub is_outdated: bool,
    pub has_vulnerabilities: bool,
    pub vulnerability_count: usize,
    pub is_deprecated: bool,
    pub health_score: u8,
    pub recommendation: String,
    pub vulnerabilities: Vec<Advisory>,
}

/// Health findings across a whole specifier list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub total_packages: usize,
    pub outdated_count: usize,
    pub vulnerable_count: usize,
    pub deprecated_count: usize,
    /// Floor of the mean of per-package scores.
    pub overall_health_score: u8,
    /// One entry per input specifier, in input order.
    pub packages: Vec<PackageReport>,
}

/// Orchestrates registry lookups, advisory queries, and scoring.
pub struct Analyzer {
    registry: Arc<dyn RegistryLookup>,
    advisories: Arc<dyn AdvisoryLookup>,
}

impl Analyzer {
    /// Create an analyzer over the given lookup implementations.
    #[must_use]
    pub fn new(registry: Arc<dyn RegistryLookup>, advisories: Arc<dyn AdvisoryLookup>) -> Self {
        Self {
            registry,
            advisories,
        }
    }

    /// Analyze a list of specifiers for one ecosystem.
    ///
    /// Returns `None` for an empty specifier list (the "no packages"
    /// sentinel); callers must special-case this before rendering.
    pub async fn analyze(
        &self,
        specifiers: &[Specifier],
        ecosystem: Ecosystem,
    ) -> Option<AggregateReport> {
        if specifiers.is_empty() {
            return None;
        }

        let lookups = specifiers
            .iter()
            .cloned()
            .map(|spec| async move { self.analyze_one(&spec, ecosystem).await });
        let packages: Vec<PackageReport> = stream::iter(lookups)
            .buffered(MAX_CONCURRENT_LOOKUPS)
            .collect()
            .await;

        Some(aggregate(packages))
    }

    async fn analyze_one(&self, spec: &Specifier, ecosystem: Ecosystem) -> PackageReport {
        let (info, vulnerabilities) = tokio::join!(
            self.registry.lookup(&spec.name, ecosystem),
            self.advisories.query(&spec.name, ecosystem),
        );

        let current_version = spec.version().map(ToString::to_string);
        let is_outdated = match (current_version.as_deref(), info.latest_version.as_deref()) {
            (Some(current), Some(latest)) => !current.is_empty() && current != latest,
            _ => false,
        };
        let vulnerability_count = vulnerabilities.len();
        let is_deprecated = info.deprecated;

        let score = health_score(is_outdated, vulnerability_count, is_deprecated);

        PackageReport {
            name: spec.name.clone(),
            current_version,
            latest_version: info.latest_version,
            is_outdated,
            has_vulnerabilities: vulnerability_count > 0,
            vulnerability_count,
            is_deprecated,
            health_score: score,
            recommendation: recommendation(score, is_outdated, vulnerability_count, is_deprecated),
            vulnerabilities,
        }
    }
}

/// Fold per-package reports into the aggregate.
///
/// A pure function of the package reports; the overall score is always
/// recomputed, never carried.
fn aggregate(packages: Vec<PackageReport>) -> AggregateReport {
    let total_packages = packages.len();
    let outdated_count = packages.iter().filter(|p| p.is_outdated).count();
    let vulnerable_count = packages.iter().filter(|p| p.has_vulnerabilities).count();
    let deprecated_count = packages.iter().filter(|p| p.is_deprecated).count();

    let overall_health_score = if total_packages == 0 {
        0
    } else {
        let sum: u32 = packages.iter().map(|p| u32::from(p.health_score)).sum();
        (sum / total_packages as u32) as u8
    };

    AggregateReport {
        total_packages,
        outdated_count,
        vulnerable_count,
        deprecated_count,
        overall_health_score,
        packages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::registry::RegistryInfo;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Registry fake returning canned answers per package name.
    struct FakeRegistry(HashMap<&'static str, RegistryInfo>);

    #[async_trait]
    impl RegistryLookup for FakeRegistry {
        async fn lookup(&self, name: &str, _ecosystem: Ecosystem) -> RegistryInfo {
            self.0.get(name).cloned().unwrap_or_default()
        }
    }

    /// Registry fake where earlier inputs take longer, forcing completions
    /// out of input order.
    struct SlowestFirstRegistry;

    #[async_trait]
    impl RegistryLookup for SlowestFirstRegistry {
        async fn lookup(&self, name: &str, _ecosystem: Ecosystem) -> RegistryInfo {
            let delay = match name {
                "alpha" => 50,
                "beta" => 30,
                _ => 5,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            RegistryInfo {
                latest_version: Some("9.9.9".to_string()),
                found: true,
                deprecated: false,
            }
        }
    }

    struct FakeAdvisories(HashMap<&'static str, Vec<Advisory>>);

    #[async_trait]
    impl AdvisoryLookup for FakeAdvisories {
        async fn query(&self, name: &str, _ecosystem: Ecosystem) -> Vec<Advisory> {
            self.0.get(name).cloned().unwrap_or_default()
        }
    }

    struct NoAdvisories;

    #[async_trait]
    impl AdvisoryLookup for NoAdvisories {
        async fn query(&self, _name: &str, _ecosystem: Ecosystem) -> Vec<Advisory> {
            Vec::new()
        }
    }

    fn found(latest: &str) -> RegistryInfo {
        RegistryInfo {
            latest_version: Some(latest.to_string()),
            found: true,
            deprecated: false,
        }
    }

    fn advisory(id: &str) -> Advisory {
        Advisory {
            id: id.to_string(),
            summary: "No summary available".to_string(),
            severity: "UNKNOWN".to_string(),
            published: String::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_input_is_sentinel() {
        let analyzer = Analyzer::new(
            Arc::new(FakeRegistry(HashMap::new())),
            Arc::new(NoAdvisories),
        );
        assert!(analyzer.analyze(&[], Ecosystem::Python).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_preserves_input_order() {
        let analyzer = Analyzer::new(Arc::new(SlowestFirstRegistry), Arc::new(NoAdvisories));
        let specs = extract("alpha==1.0 beta==1.0 gamma==1.0", Ecosystem::Python);
        assert_eq!(specs.len(), 3);

        let report = analyzer.analyze(&specs, Ecosystem::Python).await.unwrap();
        let names: Vec<&str> = report.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_outdated_is_plain_string_inequality() {
        let registry = FakeRegistry(HashMap::from([
            ("flask", found("2.0.1")),
            ("requests", found("2.31.0")),
        ]));
        let analyzer = Analyzer::new(Arc::new(registry), Arc::new(NoAdvisories));

        let specs = extract("flask==2.0.1, requests==2.25.0", Ecosystem::Python);
        let report = analyzer.analyze(&specs, Ecosystem::Python).await.unwrap();

        assert!(!report.packages[0].is_outdated);
        assert_eq!(report.packages[0].health_score, 100);
        assert!(report.packages[1].is_outdated);
        assert_eq!(report.packages[1].health_score, 80);
        assert_eq!(report.outdated_count, 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_degrades_not_fails() {
        // Registry knows nothing: not found, no latest, never outdated.
        let analyzer = Analyzer::new(
            Arc::new(FakeRegistry(HashMap::new())),
            Arc::new(NoAdvisories),
        );

        let specs = extract("ghost==0.0.1", Ecosystem::Python);
        let report = analyzer.analyze(&specs, Ecosystem::Python).await.unwrap();

        let pkg = &report.packages[0];
        assert_eq!(pkg.latest_version, None);
        assert!(!pkg.is_outdated);
        assert_eq!(pkg.health_score, 100);
    }

    #[tokio::test]
    async fn test_vulnerabilities_feed_score_and_counts() {
        let registry = FakeRegistry(HashMap::from([("axios", found("0.21.1"))]));
        let advisories = FakeAdvisories(HashMap::from([(
            "axios",
            vec![advisory("GHSA-1"), advisory("GHSA-2")],
        )]));
        let analyzer = Analyzer::new(Arc::new(registry), Arc::new(advisories));

        let specs = extract("axios@0.21.1", Ecosystem::Npm);
        let report = analyzer.analyze(&specs, Ecosystem::Npm).await.unwrap();

        let pkg = &report.packages[0];
        assert!(pkg.has_vulnerabilities);
        assert_eq!(pkg.vulnerability_count, 2);
        assert_eq!(pkg.health_score, 70);
        assert_eq!(
            pkg.recommendation,
            "Update immediately! 2 security vulnerability/ies found."
        );
        assert_eq!(report.vulnerable_count, 1);
    }

    #[tokio::test]
    async fn test_deprecated_feeds_score_and_recommendation() {
        let registry = FakeRegistry(HashMap::from([(
            "request",
            RegistryInfo {
                latest_version: Some("2.88.2".to_string()),
                found: true,
                deprecated: true,
            },
        )]));
        let analyzer = Analyzer::new(Arc::new(registry), Arc::new(NoAdvisories));

        let specs = extract("request@2.88.2", Ecosystem::Npm);
        let report = analyzer.analyze(&specs, Ecosystem::Npm).await.unwrap();

        let pkg = &report.packages[0];
        assert!(pkg.is_deprecated);
        assert_eq!(pkg.health_score, 70);
        assert_eq!(
            pkg.recommendation,
            "Package is deprecated. Consider finding an alternative."
        );
        assert_eq!(report.deprecated_count, 1);
    }

    #[tokio::test]
    async fn test_overall_score_is_floored_mean() {
        let registry = FakeRegistry(HashMap::from([
            ("a", found("1.0.0")),
            ("b", found("2.0.0")),
            ("c", found("3.0.0")),
        ]));
        let advisories = FakeAdvisories(HashMap::from([("b", vec![advisory("GHSA-b")])]));
        let analyzer = Analyzer::new(Arc::new(registry), Arc::new(advisories));

        // a: current == latest -> 100; b: 1 vuln -> 85; c: outdated -> 80.
        let specs = extract("a==1.0.0 b==2.0.0 c==2.9.9", Ecosystem::Python);
        let report = analyzer.analyze(&specs, Ecosystem::Python).await.unwrap();

        assert_eq!(report.total_packages, 3);
        // (100 + 85 + 80) / 3 = 88.33 -> 88
        assert_eq!(report.overall_health_score, 88);
    }

    #[test]
    fn test_report_json_field_names() {
        let report = aggregate(vec![PackageReport {
            name: "flask".to_string(),
            current_version: Some("2.0.1".to_string()),
            latest_version: Some("3.0.0".to_string()),
            is_outdated: true,
            has_vulnerabilities: false,
            vulnerability_count: 0,
            is_deprecated: false,
            health_score: 80,
            recommendation: "Update to the latest version when possible.".to_string(),
            vulnerabilities: Vec::new(),
        }]);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["total_packages"], 1);
        assert_eq!(value["outdated_count"], 1);
        assert_eq!(value["vulnerable_count"], 0);
        assert_eq!(value["deprecated_count"], 0);
        assert_eq!(value["overall_health_score"], 80);
        assert_eq!(value["packages"][0]["name"], "flask");
        assert_eq!(value["packages"][0]["is_outdated"], true);
        assert_eq!(value["packages"][0]["health_score"], 80);
        assert_eq!(value["packages"][0]["vulnerability_count"], 0);
    }
}
