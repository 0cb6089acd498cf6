//! Entry-point resolution with fallback to the config's `apis`.

use crate::config::{is_url, LintConfig};
use crate::error::{Error, Result};
use crate::orchestrator::EntryPointResolver;
use glob::glob;

/// Explicit entry points win; otherwise every API root from config is used.
pub struct FallbackResolver;

impl EntryPointResolver for FallbackResolver {
    fn resolve(&self, explicit: Vec<String>, config: &LintConfig) -> Result<Vec<String>> {
        if !explicit.is_empty() {
            return Ok(explicit);
        }
        let found = discover(config);
        if found.is_empty() {
            return Err(Error::NoEntryPoints);
        }
        tracing::debug!(count = found.len(), "discovered entry points from config");
        Ok(found)
    }
}

fn has_glob_chars(s: &str) -> bool {
    s.contains(|c| matches!(c, '*' | '?' | '['))
}

/// API roots in declaration order. Glob roots expand to their sorted
/// matches; a glob matching nothing contributes nothing.
pub fn discover(config: &LintConfig) -> Vec<String> {
    let mut out = Vec::new();
    for api in &config.apis {
        if is_url(&api.root) || !has_glob_chars(&api.root) {
            out.push(api.root.clone());
            continue;
        }
        match glob(&api.root) {
            Ok(paths) => {
                let mut matched: Vec<String> = paths
                    .flatten()
                    .map(|p| p.to_string_lossy().to_string())
                    .collect();
                matched.sort();
                if matched.is_empty() {
                    tracing::warn!(api = %api.alias, pattern = %api.root, "API root matched no files");
                }
                out.extend(matched);
            }
            Err(e) => {
                tracing::warn!(api = %api.alias, error = %e, "invalid API root pattern");
                out.push(api.root.clone());
            }
        }
    }
    out
}
