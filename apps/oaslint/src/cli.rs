//! CLI argument parsing via `clap`.
//!
//! Every flag also reads the matching `INPUT_*` variable the CI runner sets
//! for action inputs, so the binary runs unchanged as an action step.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "oaslint",
    version,
    about = "Lint OpenAPI documents in CI",
    long_about = "oaslint — validate one or more OpenAPI documents against a lint ruleset and fail the job when errors are found.\n\nInput precedence: flag > INPUT_* environment > defaults.",
    after_help = "Examples:\n  oaslint --entrypoints \"openapi/petstore.yaml openapi/admin.yaml\"\n  oaslint --config .redocly.yaml --format stylish --max-problems 20\n  INPUT_FORMAT=json oaslint"
)]
/// Action inputs.
pub struct Cli {
    #[arg(long, env = "INPUT_CONFIG", help = "Path to the lint config (default: discover .redocly.yaml)")]
    pub config: Option<String>,
    /// Older name of `--config`
    #[arg(long = "config-file", env = "INPUT_CONFIG_FILE", hide = true)]
    pub config_file: Option<String>,
    #[arg(long, env = "INPUT_ENTRYPOINTS", help = "Space-separated documents to lint (default: apis from config)")]
    pub entrypoints: Option<String>,
    #[arg(long, env = "INPUT_FORMAT", help = "Output format: codeframe|stylish|json (default: codeframe)")]
    pub format: Option<String>,
    #[arg(long, env = "INPUT_MAX_PROBLEMS", help = "Max problems shown per document (default: 100)")]
    pub max_problems: Option<String>,
    #[arg(long, env = "INPUT_ON_LOAD_ERROR", help = "When a document cannot be linted: report|fail (default: report)")]
    pub on_load_error: Option<String>,
    #[arg(short, long, action = clap::ArgAction::SetTrue, help = "Enable debug diagnostics")]
    pub verbose: bool,
    /// Extra documents, appended after `--entrypoints`
    #[arg(help = "Documents to lint")]
    pub refs: Vec<String>,
}

impl Cli {
    /// `--entrypoints` and positional documents as one space-separated list.
    pub fn entrypoints_input(&self) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(e) = self.entrypoints.as_deref() {
            parts.push(e.trim());
        }
        parts.extend(self.refs.iter().map(String::as_str));
        parts.retain(|p| !p.is_empty());
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}
