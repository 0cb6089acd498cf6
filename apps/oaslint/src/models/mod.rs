//! Shared data models for lint results and totals.

pub mod rules;

use serde::Serialize;
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
/// Severity of a reported problem. Errors sort before warnings.
pub enum Severity {
    Error,
    Warn,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warn => "warn",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
/// A single problem found in a document.
pub struct Problem {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    /// JSON pointer into the document, e.g. `#/paths/~1pets/get`.
    pub pointer: String,
    /// Reference of the document the problem belongs to.
    pub source: String,
    #[serde(skip)]
    pub ignored: bool,
}

#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, Serialize)]
/// Problem counts for one document or a whole run.
pub struct Totals {
    pub errors: usize,
    pub warnings: usize,
    pub ignored: usize,
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        self.errors += rhs.errors;
        self.warnings += rhs.warnings;
        self.ignored += rhs.ignored;
    }
}

#[derive(Debug, Clone, Default)]
/// Lint results for a single entry point.
pub struct LintResult {
    pub reference: String,
    /// Raw document text, kept for code frames.
    pub source_text: Option<String>,
    pub problems: Vec<Problem>,
}

impl LintResult {
    /// Count problems by severity; ignored problems count only as ignored.
    pub fn totals(&self) -> Totals {
        let mut t = Totals::default();
        for p in &self.problems {
            if p.ignored {
                t.ignored += 1;
                continue;
            }
            match p.severity {
                Severity::Error => t.errors += 1,
                Severity::Warn => t.warnings += 1,
            }
        }
        t
    }
}
