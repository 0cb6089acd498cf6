//! oaslint core library.
//!
//! Lints OpenAPI documents for CI: resolves the lint config, picks the entry
//! points, lints each one in isolation, and aggregates problem totals into a
//! pass/fail verdict.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing; every flag has an `INPUT_*` fallback.
//! - `config`: Config discovery, rule levels, ignore file, effective inputs.
//! - `entrypoints`: Explicit entry points or fallback to configured APIs.
//! - `document`: Loading documents from disk or HTTP as JSON/YAML.
//! - `checks`: Built-in rule checks over a parsed document.
//! - `lint`: The built-in linter applying levels and ignores.
//! - `orchestrator`: The run loop and its collaborator traits.
//! - `output`: Codeframe/stylish/JSON renderers and the run summary.
//! - `sink`: CI logging and failure signaling.
//! - `models`: Problems, totals, and the rule catalog.
pub mod checks;
pub mod cli;
pub mod config;
pub mod document;
pub mod entrypoints;
pub mod error;
pub mod lint;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod sink;
pub mod utils;

pub use error::{Error, Result};
