//! Specifier extraction from free-form text.
//!
//! Callers paste package lists in chat messages, so this is heuristic
//! scanning, not a grammar:
//! - Python: `flask==2.0.1, requests>=2.25.0`
//! - npm: `express@4.17.1, axios@0.21.1`
//!
//! Extraction never fails; text with no specifier-like tokens yields an
//! empty list, which callers treat as "ask the user to clarify".

use crate::ecosystem::Ecosystem;
use std::fmt;

/// Version operators recognized in Python requirement specifiers.
///
/// Order matters: two-character operators are tried before their
/// one-character prefixes when splitting fallback tokens.
const PYTHON_OPERATORS: [&str; 6] = ["==", ">=", "<=", ">", "<", "~="];

/// A version constraint attached to a specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Operator as written (`==`, `>=`, ...; `@` for npm specifiers).
    pub op: String,
    /// Version string, cleaned of range sigils for npm.
    pub version: String,
}

/// An ecosystem-scoped package reference parsed out of free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub name: String,
    /// `None` means unpinned.
    pub constraint: Option<Constraint>,
}

impl Specifier {
    /// The pinned version, if any.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.constraint.as_ref().map(|c| c.version.as_str())
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(c) => write!(f, "{}{}{}", self.name, c.op, c.version),
            None => f.write_str(&self.name),
        }
    }
}

/// Extract package specifiers for the given ecosystem.
#[must_use]
pub fn extract(text: &str, ecosystem: Ecosystem) -> Vec<Specifier> {
    match ecosystem {
        Ecosystem::Python => extract_python(text),
        Ecosystem::Npm => extract_npm(text),
    }
}

/// Scan for Python requirement specifiers.
///
/// Primary pass: `name` + operator + dotted numeric version. Fallback pass:
/// any whitespace-delimited token containing an operator, to catch forms the
/// primary pattern misses (pre-release suffixes and the like). Tokens with
/// no operator are not treated as package references.
fn extract_python(text: &str) -> Vec<Specifier> {
    let mut specifiers: Vec<Specifier> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    if let Ok(re) = regex_lite::Regex::new(r"\b([a-zA-Z0-9_-]+)\s*([=<>~!]+)\s*([0-9.]+)\b") {
        for caps in re.captures_iter(text) {
            let spec = Specifier {
                name: caps[1].to_string(),
                constraint: Some(Constraint {
                    op: caps[2].to_string(),
                    version: caps[3].to_string(),
                }),
            };
            seen.push(spec.to_string());
            specifiers.push(spec);
        }
    }

    // Fallback net over raw tokens.
    for word in text.split_whitespace() {
        let word = word.trim_matches(',');
        if !PYTHON_OPERATORS.iter().any(|op| word.contains(op)) {
            continue;
        }
        if seen.iter().any(|s| s.as_str() == word) {
            continue;
        }
        seen.push(word.to_string());
        specifiers.push(split_python_token(word));
    }

    specifiers
}

/// Split a raw token on the first recognized operator.
///
/// Operators are tried in `PYTHON_OPERATORS` order so `>=` wins over `>`.
fn split_python_token(token: &str) -> Specifier {
    for op in PYTHON_OPERATORS {
        if let Some(pos) = token.find(op) {
            let name = token[..pos].trim().to_string();
            let version = token[pos + op.len()..].trim().to_string();
            return Specifier {
                name,
                constraint: Some(Constraint {
                    op: op.to_string(),
                    version,
                }),
            };
        }
    }
    Specifier {
        name: token.to_string(),
        constraint: None,
    }
}

/// Scan for npm `name@version` specifiers.
///
/// Map semantics: a repeated name keeps its first position but takes the
/// last version seen. Leading range sigils (`^~>=<`) are stripped from the
/// version.
fn extract_npm(text: &str) -> Vec<Specifier> {
    let mut specifiers: Vec<Specifier> = Vec::new();

    if let Ok(re) = regex_lite::Regex::new(r"\b([a-zA-Z0-9_-]+)@([0-9.^~]+)\b") {
        for caps in re.captures_iter(text) {
            let name = caps[1].to_string();
            let version = caps[2]
                .trim_start_matches(['^', '~', '>', '=', '<'])
                .to_string();
            let constraint = Some(Constraint {
                op: "@".to_string(),
                version,
            });
            match specifiers.iter_mut().find(|s| s.name == name) {
                Some(existing) => existing.constraint = constraint,
                None => specifiers.push(Specifier { name, constraint }),
            }
        }
    }

    specifiers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(specs: &[Specifier]) -> Vec<String> {
        specs.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_python_basic_pair() {
        let specs = extract("flask==2.0.1, requests>=2.25.0", Ecosystem::Python);
        assert_eq!(rendered(&specs), vec!["flask==2.0.1", "requests>=2.25.0"]);
    }

    #[test]
    fn test_python_embedded_in_prose() {
        let specs = extract(
            "Please check these Python packages: numpy==1.19.0 and pandas>=1.2.0 for me",
            Ecosystem::Python,
        );
        assert_eq!(rendered(&specs), vec!["numpy==1.19.0", "pandas>=1.2.0"]);
    }

    #[test]
    fn test_python_all_operators() {
        for op in PYTHON_OPERATORS {
            let text = format!("pkg{op}1.0");
            let specs = extract(&text, Ecosystem::Python);
            assert_eq!(specs.len(), 1, "operator {op}");
            assert_eq!(specs[0].name, "pkg");
            let constraint = specs[0].constraint.as_ref().unwrap();
            assert_eq!(constraint.op, op);
            assert_eq!(constraint.version, "1.0");
        }
    }

    #[test]
    fn test_python_fallback_catches_prerelease() {
        // The primary pattern stops at the numeric core; the fallback net
        // picks up the full token.
        let specs = extract("try celery==5.0.0rc3 please", Ecosystem::Python);
        assert!(rendered(&specs).contains(&"celery==5.0.0rc3".to_string()));
    }

    #[test]
    fn test_python_fallback_does_not_duplicate() {
        let specs = extract("flask==2.0.1", Ecosystem::Python);
        assert_eq!(rendered(&specs), vec!["flask==2.0.1"]);
    }

    #[test]
    fn test_python_bare_names_are_not_specifiers() {
        assert!(extract("please check flask and requests", Ecosystem::Python).is_empty());
    }

    #[test]
    fn test_python_empty_text() {
        assert!(extract("", Ecosystem::Python).is_empty());
    }

    #[test]
    fn test_npm_basic_pair() {
        let specs = extract("express@4.17.1, axios@0.21.1", Ecosystem::Npm);
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "express");
        assert_eq!(specs[0].version(), Some("4.17.1"));
        assert_eq!(specs[1].name, "axios");
        assert_eq!(specs[1].version(), Some("0.21.1"));
    }

    #[test]
    fn test_npm_strips_range_sigils() {
        let specs = extract("lodash@^4.17.20 react@~17.0.0", Ecosystem::Npm);
        assert_eq!(specs[0].version(), Some("4.17.20"));
        assert_eq!(specs[1].version(), Some("17.0.0"));
    }

    #[test]
    fn test_npm_duplicate_last_wins_first_position() {
        let specs = extract("react@16.8.0 lodash@4.17.20 react@17.0.2", Ecosystem::Npm);
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "react");
        assert_eq!(specs[0].version(), Some("17.0.2"));
        assert_eq!(specs[1].name, "lodash");
    }

    #[test]
    fn test_npm_ignores_python_style() {
        assert!(extract("flask==2.0.1", Ecosystem::Npm).is_empty());
    }

    #[test]
    fn test_npm_rendering() {
        let specs = extract("express@4.17.1", Ecosystem::Npm);
        assert_eq!(specs[0].to_string(), "express@4.17.1");
    }

    #[test]
    fn test_split_token_prefers_two_char_operators() {
        let spec = split_python_token("pkg>=1.0");
        let constraint = spec.constraint.unwrap();
        assert_eq!(constraint.op, ">=");
        assert_eq!(constraint.version, "1.0");
    }
}
