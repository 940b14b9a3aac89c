//! Package ecosystems understood by the analyzer.

use std::fmt;

/// A package-hosting universe with its own naming and versioning rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    /// Python packages hosted on PyPI.
    Python,
    /// JavaScript packages hosted on the npm registry.
    Npm,
}

impl Ecosystem {
    /// Human-facing label used in report headers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::Npm => "npm",
        }
    }

    /// Ecosystem name as the OSV database spells it.
    #[must_use]
    pub const fn osv_name(self) -> &'static str {
        match self {
            Self::Python => "PyPI",
            Self::Npm => "npm",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
