#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]

//! Core analysis for pkgpulse.
//!
//! Provides:
//! - Extracting package specifiers from free-form text (Python and npm)
//! - Fetching latest-version metadata from PyPI and the npm registry
//! - Querying the OSV database for known advisories
//! - Scoring package health and selecting a recommendation
//! - Fanning the above out over a specifier list into an aggregate report
//! - Rendering the aggregate report as human-readable text

pub mod advisories;
pub mod analyze;
pub mod ecosystem;
pub mod error;
pub mod extract;
pub mod registry;
pub mod report;
pub mod score;

pub use advisories::{Advisory, AdvisoryLookup, OsvClient, DEFAULT_OSV_API};
pub use analyze::{AggregateReport, Analyzer, PackageReport, MAX_CONCURRENT_LOOKUPS};
pub use ecosystem::Ecosystem;
pub use error::ClientError;
pub use extract::{extract, Constraint, Specifier};
pub use registry::{
    RegistryClient, RegistryInfo, RegistryLookup, DEFAULT_NPM_REGISTRY, DEFAULT_PYPI_REGISTRY,
};
pub use report::{format_report, status_glyph, NO_PACKAGES_TEXT};
pub use score::{health_score, recommendation};
