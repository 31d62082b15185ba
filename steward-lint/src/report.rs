//! Check results.

use std::path::PathBuf;

/// One violation found by a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub message: String,
    /// Indented detail lines (offending templates, job names).
    pub details: Vec<String>,
}

impl Finding {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.details = details.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Short machine name, e.g. `sorted`.
    pub name: &'static str,
    /// Banner printed before the check's findings.
    pub title: &'static str,
    pub findings: Vec<Finding>,
    /// Conditions that did not fail the check, e.g. a skipped remote lookup.
    pub warnings: Vec<String>,
    /// Advice printed after the findings.
    pub guidance: Vec<String>,
}

impl CheckOutcome {
    pub fn new(name: &'static str, title: &'static str) -> Self {
        Self {
            name,
            title,
            findings: Vec::new(),
            warnings: Vec::new(),
            guidance: Vec::new(),
        }
    }

    pub fn had_errors(&self) -> bool {
        !self.findings.is_empty()
    }
}

/// All check outcomes for one registry file.
#[derive(Debug, Clone)]
pub struct LintReport {
    pub registry: PathBuf,
    pub checks: Vec<CheckOutcome>,
}

impl LintReport {
    /// OR of every check's `had_errors`.
    pub fn had_errors(&self) -> bool {
        self.checks.iter().any(CheckOutcome::had_errors)
    }

    pub fn finding_count(&self) -> usize {
        self.checks.iter().map(|c| c.findings.len()).sum()
    }

    pub fn check(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.name == name)
    }
}
