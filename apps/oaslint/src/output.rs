//! Output rendering for lint problems and the run summary.
//!
//! Supports `codeframe` (default), `stylish`, and `json`. The JSON form
//! carries the per-file totals, the build version, and every shown problem.

use crate::config::is_url;
use crate::models::{LintResult, Problem, Severity, Totals};
use crate::orchestrator::{FormatOptions, ProblemFormatter};
use crate::utils::pluralize;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::{Path, PathBuf};

const CONTEXT_LINES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Codeframe,
    Stylish,
    Json,
}

impl OutputFormat {
    /// `None` selects the default; unknown names fall back to codeframe.
    pub fn select(name: Option<&str>) -> OutputFormat {
        match name {
            None | Some("codeframe") => OutputFormat::Codeframe,
            Some("stylish") => OutputFormat::Stylish,
            Some("json") => OutputFormat::Json,
            Some(other) => {
                tracing::warn!(format = %other, "unknown format; using codeframe");
                OutputFormat::Codeframe
            }
        }
    }
}

/// Renders problems for humans or machines.
pub struct Printer {
    pub color: bool,
    /// File names are shown relative to this directory.
    pub cwd: PathBuf,
}

impl Printer {
    pub fn new(color: bool, cwd: PathBuf) -> Self {
        Self { color, cwd }
    }

    fn display_name(&self, reference: &str) -> String {
        if is_url(reference) {
            return reference.to_string();
        }
        let p = Path::new(reference);
        if p.is_absolute() {
            if let Some(rel) = pathdiff::diff_paths(p, &self.cwd) {
                return rel.to_string_lossy().to_string();
            }
        }
        reference.to_string()
    }

    fn severity_label(&self, sev: Severity) -> String {
        match (sev, self.color) {
            (Severity::Error, true) => "error".red().bold().to_string(),
            (Severity::Warn, true) => "warning".yellow().bold().to_string(),
            (Severity::Error, false) => "error".to_string(),
            (Severity::Warn, false) => "warning".to_string(),
        }
    }

    fn hidden_note(&self, hidden: usize) -> String {
        let note = format!(
            "< ... {} more {} hidden > increase with `max_problems`",
            hidden,
            pluralize("problem", hidden)
        );
        if self.color {
            note.bright_black().to_string()
        } else {
            note
        }
    }

    fn render_codeframe(&self, result: &LintResult, shown: &[&Problem]) -> String {
        let name = self.display_name(&result.reference);
        let mut out = String::new();
        for (i, p) in shown.iter().enumerate() {
            let loc = result
                .source_text
                .as_deref()
                .and_then(|t| locate(t, &p.pointer));
            let (line, col) = loc.unwrap_or((1, 1));
            let header = format!("[{}] {}:{}:{} at {}", i + 1, name, line, col, p.pointer);
            if self.color {
                out.push_str(&header.bold().to_string());
            } else {
                out.push_str(&header);
            }
            out.push_str("\n\n");
            out.push_str(&p.message);
            out.push_str("\n\n");
            if let (Some(text), Some((line, col))) = (result.source_text.as_deref(), loc) {
                out.push_str(&code_frame(text, line, col, &p.pointer, self.color));
                out.push('\n');
            }
            let kind = match p.severity {
                Severity::Error => "Error",
                Severity::Warn => "Warning",
            };
            out.push_str(&format!(
                "{} was generated by the {} rule.\n\n",
                kind, p.rule_id
            ));
        }
        out
    }

    fn render_stylish(&self, result: &LintResult, shown: &[&Problem]) -> String {
        if shown.is_empty() {
            return String::new();
        }
        let name = self.display_name(&result.reference);
        let mut out = if self.color {
            format!("{}:\n", name.bold())
        } else {
            format!("{}:\n", name)
        };
        let rule_width = shown.iter().map(|p| p.rule_id.len()).max().unwrap_or(0);
        for p in shown {
            let (line, col) = result
                .source_text
                .as_deref()
                .and_then(|t| locate(t, &p.pointer))
                .unwrap_or((1, 1));
            let pos = format!("{}:{}", line, col);
            // Pad before coloring so escape codes do not skew the columns
            let sev = format!("{:<7}", match p.severity {
                Severity::Error => "error",
                Severity::Warn => "warning",
            });
            let sev = if self.color {
                match p.severity {
                    Severity::Error => sev.red().to_string(),
                    Severity::Warn => sev.yellow().to_string(),
                }
            } else {
                sev
            };
            out.push_str(&format!(
                "  {:<8} {}  {:<width$}  {}\n",
                pos,
                sev,
                p.rule_id,
                p.message,
                width = rule_width
            ));
        }
        out
    }
}

impl ProblemFormatter for Printer {
    fn problems(&self, result: &LintResult, opts: &FormatOptions) -> String {
        let (shown, hidden) = visible_problems(result, opts.max_problems);
        match OutputFormat::select(opts.format) {
            OutputFormat::Json => {
                let out = compose_problems_json(result, &shown, opts);
                // Serializing a `Value` cannot fail
                format!("{}\n", serde_json::to_string_pretty(&out).unwrap_or_default())
            }
            format => {
                let mut out = match format {
                    OutputFormat::Stylish => self.render_stylish(result, &shown),
                    _ => self.render_codeframe(result, &shown),
                };
                if hidden > 0 {
                    out.push_str(&self.hidden_note(hidden));
                    out.push('\n');
                }
                out
            }
        }
    }

    fn summary(&self, totals: &Totals, entrypoints: usize) -> String {
        let color = self.color;
        let mut out = String::new();
        if totals.errors > 0 {
            let msg = format!(
                "❌ Validation failed with {} {} and {} {}.",
                totals.errors,
                pluralize("error", totals.errors),
                totals.warnings,
                pluralize("warning", totals.warnings)
            );
            out.push_str(&if color { msg.red().to_string() } else { msg });
            out.push('\n');
        } else {
            let verb = if entrypoints == 1 {
                "description is"
            } else {
                "descriptions are"
            };
            let msg = format!("Woohoo! Your API {} valid. 🎉", verb);
            out.push_str(&if color { msg.green().to_string() } else { msg });
            out.push('\n');
            if totals.warnings > 0 {
                let msg = format!(
                    "You have {} {}.",
                    totals.warnings,
                    pluralize("warning", totals.warnings)
                );
                out.push_str(&if color { msg.yellow().to_string() } else { msg });
                out.push('\n');
            }
        }
        if totals.ignored > 0 {
            let verb = if totals.ignored == 1 {
                "problem is"
            } else {
                "problems are"
            };
            let msg = format!("{} {} explicitly ignored.", totals.ignored, verb);
            out.push_str(&if color { msg.yellow().to_string() } else { msg });
            out.push('\n');
        }
        out
    }
}

/// Non-ignored problems, errors first, capped at `max`. Returns the shown
/// problems and how many were hidden.
pub fn visible_problems(result: &LintResult, max: usize) -> (Vec<&Problem>, usize) {
    let mut visible: Vec<&Problem> = result.problems.iter().filter(|p| !p.ignored).collect();
    // Stable sort keeps document order within a severity
    visible.sort_by_key(|p| p.severity);
    let hidden = visible.len().saturating_sub(max);
    visible.truncate(max);
    (visible, hidden)
}

/// Compose the JSON document for one file (pure) for testing purposes.
pub fn compose_problems_json(
    result: &LintResult,
    shown: &[&Problem],
    opts: &FormatOptions,
) -> JsonVal {
    let problems: Vec<_> = shown
        .iter()
        .map(|p| {
            json!({
                "ruleId": p.rule_id,
                "severity": p.severity,
                "message": p.message,
                "location": [{
                    "source": { "ref": result.reference },
                    "pointer": p.pointer,
                }],
            })
        })
        .collect();
    json!({
        "totals": opts.totals,
        "version": opts.version,
        "problems": problems,
    })
}

fn unescape_segment(s: &str) -> String {
    s.replace("~1", "/").replace("~0", "~")
}

fn key_at(line: &str, key: &str) -> Option<usize> {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();
    let body = trimmed.strip_prefix("- ").unwrap_or(trimmed);
    let offset = indent + (trimmed.len() - body.len());
    for candidate in [
        format!("{}:", key),
        format!("'{}':", key),
        format!("\"{}\":", key),
        format!("\"{}\" :", key),
    ] {
        if body.starts_with(&candidate) {
            return Some(offset);
        }
    }
    None
}

/// Best-effort 1-based `(line, column)` of the node a pointer targets.
///
/// Walks the pointer's keys, finding each one on a later line than the
/// previous. Numeric segments not found as keys are treated as array
/// indexes and skipped. Returns the deepest key found.
pub fn locate(text: &str, pointer: &str) -> Option<(usize, usize)> {
    let path = pointer.strip_prefix("#/").unwrap_or(pointer);
    let lines: Vec<&str> = text.lines().collect();
    if path.is_empty() {
        return Some((1, 1));
    }
    let mut found: Option<(usize, usize)> = None;
    let mut from = 0usize;
    for seg in path.split('/') {
        let key = unescape_segment(seg);
        let hit = lines
            .iter()
            .enumerate()
            .skip(from)
            .find_map(|(i, l)| key_at(l, &key).map(|c| (i, c)));
        match hit {
            Some((i, c)) => {
                found = Some((i + 1, c + 1));
                from = i + 1;
            }
            // Array index
            None if key.chars().all(|c| c.is_ascii_digit()) => continue,
            None => break,
        }
    }
    found.or(Some((1, 1)))
}

fn code_frame(text: &str, line: usize, col: usize, pointer: &str, color: bool) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let first = line.saturating_sub(CONTEXT_LINES).max(1);
    let last = (line + CONTEXT_LINES).min(lines.len());
    let width = last.to_string().len();
    let key_len = pointer
        .rsplit('/')
        .next()
        .map(|k| unescape_segment(k).chars().count())
        .unwrap_or(1)
        .max(1);
    let mut out = String::new();
    for n in first..=last {
        let src = lines[n - 1];
        let gutter = format!("{:>width$} |", n, width = width);
        let gutter = if color {
            gutter.bright_black().to_string()
        } else {
            gutter
        };
        out.push_str(&format!("{} {}\n", gutter, src));
        if n == line {
            let marker = format!("{}{}", " ".repeat(col - 1), "^".repeat(key_len));
            let marker = if color { marker.red().to_string() } else { marker };
            out.push_str(&format!("{:>width$} | {}\n", "", marker, width = width));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "openapi: 3.0.0\ninfo:\n  title: t\n  version: '1'\npaths:\n  /pets:\n    get:\n      responses: {}\n";

    fn problem(rule: &str, severity: Severity, pointer: &str, ignored: bool) -> Problem {
        Problem {
            rule_id: rule.into(),
            severity,
            message: format!("{} message", rule),
            pointer: pointer.into(),
            source: "api.yaml".into(),
            ignored,
        }
    }

    fn result() -> LintResult {
        LintResult {
            reference: "api.yaml".into(),
            source_text: Some(DOC.into()),
            problems: vec![
                problem("info-license", Severity::Warn, "#/info", false),
                problem("operation-summary", Severity::Error, "#/paths/~1pets/get", false),
                problem("info-contact", Severity::Warn, "#/info", true),
                problem("no-empty-servers", Severity::Error, "#/", false),
            ],
        }
    }

    fn opts(format: Option<&'static str>, max_problems: usize) -> FormatOptions<'static> {
        FormatOptions {
            format,
            max_problems,
            totals: Totals {
                errors: 2,
                warnings: 1,
                ignored: 1,
            },
            version: "0.1.0",
        }
    }

    fn printer() -> Printer {
        Printer::new(false, PathBuf::from("/work"))
    }

    #[test]
    fn test_locate_walks_keys() {
        assert_eq!(locate(DOC, "#/"), Some((1, 1)));
        assert_eq!(locate(DOC, "#/info"), Some((2, 1)));
        assert_eq!(locate(DOC, "#/paths/~1pets/get"), Some((7, 5)));
        // Missing tail: deepest key found
        assert_eq!(locate(DOC, "#/paths/~1pets/post"), Some((6, 3)));
        let json = "{\n  \"info\": {\n    \"title\": \"t\"\n  }\n}\n";
        assert_eq!(locate(json, "#/info/title"), Some((3, 5)));
    }

    #[test]
    fn test_visible_problems_errors_first_and_capped() {
        let res = result();
        let (shown, hidden) = visible_problems(&res, 2);
        assert_eq!(hidden, 1);
        assert_eq!(shown[0].rule_id, "operation-summary");
        assert_eq!(shown[1].rule_id, "no-empty-servers");
        let (shown, hidden) = visible_problems(&res, 100);
        assert_eq!(shown.len(), 3);
        assert_eq!(hidden, 0);
    }

    #[test]
    fn test_codeframe_output() {
        let out = printer().problems(&result(), &opts(None, 100));
        assert!(out.contains("[1] api.yaml:7:5 at #/paths/~1pets/get"));
        assert!(out.contains("    get:\n"));
        assert!(out.contains("Error was generated by the operation-summary rule."));
        assert!(out.contains("Warning was generated by the info-license rule."));
        assert!(!out.contains("info-contact"));
        assert!(!out.contains("hidden"));
    }

    #[test]
    fn test_stylish_output_and_hidden_note() {
        let out = printer().problems(&result(), &opts(Some("stylish"), 1));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "api.yaml:");
        assert!(lines[1].contains("7:5"));
        assert!(lines[1].contains("error"));
        assert!(lines[1].contains("operation-summary"));
        assert_eq!(
            lines[2],
            "< ... 2 more problems hidden > increase with `max_problems`"
        );
    }

    #[test]
    fn test_unknown_format_falls_back_to_codeframe() {
        let out = printer().problems(&result(), &opts(Some("bogus"), 100));
        assert!(out.contains("was generated by the"));
    }

    #[test]
    fn test_json_output_shape() {
        let out = printer().problems(&result(), &opts(Some("json"), 100));
        let v: JsonVal = serde_json::from_str(&out).unwrap();
        assert_eq!(v["version"], "0.1.0");
        assert_eq!(v["totals"]["errors"], 2);
        assert_eq!(v["totals"]["ignored"], 1);
        assert_eq!(v["problems"].as_array().unwrap().len(), 3);
        assert_eq!(v["problems"][0]["severity"], "error");
        assert_eq!(v["problems"][0]["location"][0]["source"]["ref"], "api.yaml");
    }

    #[test]
    fn test_display_name_relative_to_cwd() {
        let p = printer();
        assert_eq!(p.display_name("/work/specs/a.yaml"), "specs/a.yaml");
        assert_eq!(p.display_name("specs/a.yaml"), "specs/a.yaml");
        assert_eq!(
            p.display_name("https://example.com/a.yaml"),
            "https://example.com/a.yaml"
        );
    }

    #[test]
    fn test_summary_wording() {
        let p = printer();
        let failed = p.summary(
            &Totals {
                errors: 1,
                warnings: 2,
                ignored: 0,
            },
            2,
        );
        assert_eq!(failed, "❌ Validation failed with 1 error and 2 warnings.\n");

        let warned = p.summary(
            &Totals {
                errors: 0,
                warnings: 1,
                ignored: 3,
            },
            1,
        );
        assert!(warned.starts_with("Woohoo! Your API description is valid. 🎉\n"));
        assert!(warned.contains("You have 1 warning.\n"));
        assert!(warned.contains("3 problems are explicitly ignored.\n"));

        let clean = p.summary(&Totals::default(), 3);
        assert_eq!(clean, "Woohoo! Your API descriptions are valid. 🎉\n");
    }
}
