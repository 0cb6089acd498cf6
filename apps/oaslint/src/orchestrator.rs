//! Run orchestration: config, entry points, one lint per entry point, totals,
//! summary, verdict.
//!
//! The collaborators are traits so the loop can be driven by stand-ins in
//! tests. Each entry point is linted in its own failure boundary; a failed
//! invocation contributes nothing to the run totals and never stops the loop.

use crate::config::{Effective, LintConfig, LoadErrorPolicy};
use crate::error::Result;
use crate::models::{LintResult, Totals};
use crate::utils;
use std::time::{Duration, Instant};

/// Build identifier passed to the formatter.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const LINT_FAILED: &str = "Lint failed";

pub trait ConfigLoader {
    /// Load from `path`, or from the default lookup when `None`.
    fn load(&self, path: Option<&str>) -> Result<LintConfig>;
}

pub trait EntryPointResolver {
    /// Return `explicit` unchanged when non-empty; otherwise discover entry
    /// points from `config`, failing with `Error::NoEntryPoints` when none
    /// exist.
    fn resolve(&self, explicit: Vec<String>, config: &LintConfig) -> Result<Vec<String>>;
}

pub trait Linter {
    fn lint(&self, reference: &str, config: &LintConfig) -> Result<LintResult>;
}

/// Options handed to the formatter for one document.
pub struct FormatOptions<'a> {
    pub format: Option<&'a str>,
    pub max_problems: usize,
    pub totals: Totals,
    pub version: &'a str,
}

pub trait ProblemFormatter {
    /// Render the problems of one document.
    fn problems(&self, result: &LintResult, opts: &FormatOptions) -> String;
    /// Render the run summary.
    fn summary(&self, totals: &Totals, entrypoints: usize) -> String;
}

/// Logging and failure signaling for the hosting CI system.
pub trait Sink {
    fn info(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
    /// Report `msg` and mark the run as failed.
    fn set_failed(&mut self, msg: &str);
    /// Write rendered diagnostics to the output stream.
    fn output(&mut self, text: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Validated { totals: Totals, elapsed: Duration },
    Failed { message: String },
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub entrypoints: Vec<String>,
    pub outcomes: Vec<(String, EntryOutcome)>,
    pub totals: Totals,
    /// Whether the run was marked failed; maps to a non-zero exit status.
    pub failed: bool,
}

pub struct Orchestrator<'a> {
    pub loader: &'a dyn ConfigLoader,
    pub resolver: &'a dyn EntryPointResolver,
    pub linter: &'a dyn Linter,
    pub formatter: &'a dyn ProblemFormatter,
}

impl Orchestrator<'_> {
    /// Execute one run. Errors before the loop are reported through
    /// `set_failed` and leave the report without entry points.
    pub fn run(&self, inputs: &Effective, sink: &mut dyn Sink) -> RunReport {
        let mut report = RunReport::default();
        if let Err(e) = self.run_entrypoints(inputs, sink, &mut report) {
            fail(&mut report, sink, &e.to_string());
        }
        report
    }

    fn run_entrypoints(
        &self,
        inputs: &Effective,
        sink: &mut dyn Sink,
        report: &mut RunReport,
    ) -> Result<()> {
        let config = self.loader.load(inputs.config.as_deref())?;
        let entrypoints = self
            .resolver
            .resolve(inputs.entrypoints.clone(), &config)?;
        report.entrypoints = entrypoints.clone();

        for ep in &entrypoints {
            let outcome = self.validate(ep, &config, inputs, sink);
            match &outcome {
                EntryOutcome::Validated { totals, .. } => report.totals += *totals,
                EntryOutcome::Failed { message } => match inputs.on_load_error {
                    LoadErrorPolicy::Report => sink.error(message),
                    LoadErrorPolicy::Fail => fail(report, sink, message),
                },
            }
            report.outcomes.push((ep.clone(), outcome));
        }

        sink.output(&self.formatter.summary(&report.totals, entrypoints.len()));
        if report.totals.errors > 0 {
            fail(report, sink, LINT_FAILED);
        }
        Ok(())
    }

    fn validate(
        &self,
        ep: &str,
        config: &LintConfig,
        inputs: &Effective,
        sink: &mut dyn Sink,
    ) -> EntryOutcome {
        let started = Instant::now();
        sink.info(&format!("validating {}...", ep));
        let result = match self.linter.lint(ep, config) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(entrypoint = ep, error = %e, "lint invocation failed");
                return EntryOutcome::Failed {
                    message: e.to_string(),
                };
            }
        };
        let totals = result.totals();
        let opts = FormatOptions {
            format: inputs.format.as_deref(),
            max_problems: inputs.max_problems,
            totals,
            version: VERSION,
        };
        sink.output(&self.formatter.problems(&result, &opts));
        let elapsed = started.elapsed();
        sink.info(&format!(
            "{}: validated in {}",
            ep,
            utils::format_elapsed(elapsed)
        ));
        EntryOutcome::Validated { totals, elapsed }
    }
}

fn fail(report: &mut RunReport, sink: &mut dyn Sink, msg: &str) {
    report.failed = true;
    sink.set_failed(msg);
}
