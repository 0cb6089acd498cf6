//! Logging sink for the hosting CI system.
//!
//! Under GitHub Actions errors are emitted as `::error::` workflow commands
//! on stdout so they surface as annotations. Elsewhere they go to stderr
//! with a colored prefix.

use crate::orchestrator::Sink;
use crate::utils;
use std::io::{self, Write};

/// Escape a workflow command message (`%`, `\r`, `\n`).
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

pub fn workflow_command(command: &str, message: &str) -> String {
    format!("::{}::{}", command, escape_data(message))
}

/// True when running inside a GitHub Actions job.
pub fn in_github_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").map(|v| v == "true").unwrap_or(false)
}

pub struct ActionSink<O: Write, E: Write> {
    out: O,
    err: E,
    github: bool,
    color: bool,
}

impl ActionSink<io::Stdout, io::Stderr> {
    pub fn stdio(github: bool, color: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), github, color)
    }
}

impl<O: Write, E: Write> ActionSink<O, E> {
    pub fn new(out: O, err: E, github: bool, color: bool) -> Self {
        Self {
            out,
            err,
            github,
            color,
        }
    }

    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

// Write failures on stdout/stderr have nowhere else to be reported.
impl<O: Write, E: Write> Sink for ActionSink<O, E> {
    fn info(&mut self, msg: &str) {
        let _ = writeln!(self.out, "{}", msg);
    }

    fn error(&mut self, msg: &str) {
        if self.github {
            let _ = writeln!(self.out, "{}", workflow_command("error", msg));
        } else {
            let _ = writeln!(self.err, "{} {}", utils::error_prefix(self.color), msg);
        }
    }

    fn set_failed(&mut self, msg: &str) {
        // The exit status carries the failure; the message is an error annotation
        self.error(msg);
    }

    fn output(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let _ = write!(self.out, "{}", text);
        let _ = self.out.flush();
    }
}
