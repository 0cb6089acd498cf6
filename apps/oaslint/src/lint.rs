//! Built-in linter: loads one document and runs the enabled checks.
//!
//! Produces a `LintResult` whose problems are sorted by pointer then rule id.
//! Checks are independent, so they are evaluated on the rayon pool.

use crate::checks::CHECKS;
use crate::config::{normalize_reference, LintConfig};
use crate::document;
use crate::error::Result;
use crate::models::{LintResult, Problem};
use crate::orchestrator::Linter;
use rayon::prelude::*;
use serde_json::Value as Json;
use std::path::PathBuf;

/// Lints documents referenced relative to `cwd`.
pub struct BuiltinLinter {
    pub cwd: PathBuf,
}

impl BuiltinLinter {
    pub fn new(cwd: PathBuf) -> Self {
        Self { cwd }
    }
}

impl Linter for BuiltinLinter {
    fn lint(&self, reference: &str, config: &LintConfig) -> Result<LintResult> {
        let doc = document::load(&self.cwd, reference)?;
        let ignore_key = normalize_reference(&self.cwd, reference);
        let problems = run_checks(&doc.reference, &ignore_key, &doc.root, config);
        tracing::debug!(reference, problems = problems.len(), "linted document");
        Ok(LintResult {
            reference: doc.reference,
            source_text: Some(doc.text),
            problems,
        })
    }
}

/// Run every enabled check against `root`.
///
/// - Severity comes from the configured rule level; `off` rules are skipped.
/// - Problems listed in the ignore file are kept but flagged `ignored`.
pub fn run_checks(
    reference: &str,
    ignore_key: &str,
    root: &Json,
    config: &LintConfig,
) -> Vec<Problem> {
    let mut problems: Vec<Problem> = CHECKS
        .par_iter()
        .filter_map(|(id, check)| {
            let severity = config.level(id).severity()?;
            let found: Vec<Problem> = check(root)
                .into_iter()
                .map(|f| Problem {
                    rule_id: id.to_string(),
                    severity,
                    ignored: config.ignore.is_ignored(ignore_key, id, &f.pointer),
                    message: f.message,
                    pointer: f.pointer,
                    source: reference.to_string(),
                })
                .collect();
            Some(found)
        })
        .flatten()
        .collect();
    // Deterministic ordering regardless of evaluation order
    problems.sort_by(|a, b| a.pointer.cmp(&b.pointer).then(a.rule_id.cmp(&b.rule_id)));
    problems
}
