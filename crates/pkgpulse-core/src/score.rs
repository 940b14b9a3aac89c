//! Package health scoring.
//!
//! A fixed linear penalty model: every deduction is computed against the
//! original flags, not the running score, so deductions are independent and
//! order-insensitive. The recommendation strings are part of the caller
//! contract and must not be reworded.

/// Compute a health score in `[0, 100]`.
///
/// Deductions: 20 when outdated, `min(50, 15 * vulnerability_count)` when
/// vulnerable, 30 when deprecated; the result is clamped at 0.
#[must_use]
pub fn health_score(is_outdated: bool, vulnerability_count: usize, is_deprecated: bool) -> u8 {
    let mut score: i32 = 100;

    if is_outdated {
        score -= 20;
    }
    if vulnerability_count > 0 {
        let vulns = i32::try_from(vulnerability_count).unwrap_or(i32::MAX);
        score -= vulns.saturating_mul(15).min(50);
    }
    if is_deprecated {
        score -= 30;
    }

    score.max(0) as u8
}

/// Select the recommendation text for a scored package.
///
/// First matching rule wins, in this order: healthy (score >= 80),
/// deprecated, vulnerable, outdated, generic.
#[must_use]
pub fn recommendation(
    score: u8,
    is_outdated: bool,
    vulnerability_count: usize,
    is_deprecated: bool,
) -> String {
    if score >= 80 {
        "Package is healthy!".to_string()
    } else if is_deprecated {
        "Package is deprecated. Consider finding an alternative.".to_string()
    } else if vulnerability_count > 0 {
        format!("Update immediately! {vulnerability_count} security vulnerability/ies found.")
    } else if is_outdated {
        "Update to the latest version when possible.".to_string()
    } else {
        "Review package health metrics.".to_string()
    }
}
