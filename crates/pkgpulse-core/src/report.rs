//! Human-readable rendering of an aggregate report.
//!
//! The markdown template is deliberately boring and deterministic: chat
//! frontends render it directly, and downstream tests pin individual lines.

use crate::analyze::AggregateReport;
use std::fmt::Write as _;

/// Text rendered when there is no aggregate to report on.
pub const NO_PACKAGES_TEXT: &str = "No packages were analyzed.";

/// Status glyph for a health score: good (>= 80), warn (>= 60), bad.
#[must_use]
pub const fn status_glyph(score: u8) -> &'static str {
    if score >= 80 {
        "✅"
    } else if score >= 60 {
        "⚠️"
    } else {
        "❌"
    }
}

/// Render an aggregate report for the given ecosystem label.
///
/// An absent aggregate (the empty-input sentinel) renders the
/// no-packages notice.
#[must_use]
pub fn format_report(report: Option<&AggregateReport>, ecosystem_label: &str) -> String {
    let Some(report) = report else {
        return NO_PACKAGES_TEXT.to_string();
    };

    let mut out = String::new();

    let _ = writeln!(
        out,
        "## {ecosystem_label} Package Health Report {}\n",
        status_glyph(report.overall_health_score)
    );
    let _ = writeln!(
        out,
        "**Overall Health Score:** {}/100",
        report.overall_health_score
    );
    let _ = writeln!(out, "**Total Packages:** {}", report.total_packages);
    let _ = writeln!(out, "**Outdated:** {}", report.outdated_count);
    let _ = writeln!(out, "**With Vulnerabilities:** {}\n", report.vulnerable_count);

    if !report.packages.is_empty() {
        let _ = writeln!(out, "### Package Details:\n");

        for pkg in &report.packages {
            let current = pkg.current_version.as_deref().unwrap_or("N/A");
            let latest = pkg.latest_version.as_deref().unwrap_or("N/A");

            let _ = writeln!(
                out,
                "{} **{}** ({current})",
                status_glyph(pkg.health_score),
                pkg.name
            );
            let _ = writeln!(out, "   - Latest: {latest}");
            let _ = writeln!(out, "   - Health: {}/100", pkg.health_score);

            if pkg.vulnerability_count > 0 {
                let _ = writeln!(
                    out,
                    "   - ⚠️ {} vulnerability/ies found",
                    pkg.vulnerability_count
                );
            }
            if !pkg.recommendation.is_empty() {
                let _ = writeln!(out, "   - 💡 {}", pkg.recommendation);
            }

            out.push('\n');
        }
    }

    out
}
