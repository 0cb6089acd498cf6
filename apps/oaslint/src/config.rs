//! Lint configuration discovery and effective input resolution.
//!
//! The lint config is read from an explicit path or from the closest
//! `.redocly.yaml|.redocly.yml|redocly.yaml` found walking upward from the
//! working directory (stopping at a `.git` directory). Defaults:
//! - `extends`: `recommended`
//! - `apis`: none
//! - `max_problems`: 100
//! - `on_load_error`: `report`
//!
//! Input precedence: CLI flag > `INPUT_*` environment > defaults.

use crate::error::{Error, Result};
use crate::models::rules::{self, Preset, RuleLevel};
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAMES: [&str; 3] = [".redocly.yaml", ".redocly.yml", "redocly.yaml"];
pub const IGNORE_FILE_NAME: &str = ".redocly.lint-ignore.yaml";
pub const DEFAULT_MAX_PROBLEMS: usize = 100;

#[derive(Debug, Default, Deserialize, Clone)]
/// Raw config file as written by users.
pub struct RawConfig {
    #[serde(default)]
    pub apis: Option<Map<String, Json>>,
    /// Older layout: `apiDefinitions: {alias: path}`.
    #[serde(default, rename = "apiDefinitions")]
    pub api_definitions: Option<Map<String, Json>>,
    #[serde(default)]
    pub extends: Option<Extends>,
    #[serde(default)]
    pub rules: Option<HashMap<String, RuleSetting>>,
    /// Older layout: `lint: {extends, rules}`.
    #[serde(default)]
    pub lint: Option<LintSection>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct LintSection {
    #[serde(default)]
    pub extends: Option<Extends>,
    #[serde(default)]
    pub rules: Option<HashMap<String, RuleSetting>>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum Extends {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
/// `rule: warn` or `rule: {severity: warn}`
pub enum RuleSetting {
    Level(String),
    Detailed { severity: String },
}

impl RuleSetting {
    fn level_str(&self) -> &str {
        match self {
            RuleSetting::Level(s) => s,
            RuleSetting::Detailed { severity } => severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A named API definition whose root document is linted when no entry
/// points are passed explicitly.
pub struct ApiDef {
    pub alias: String,
    pub root: String,
}

#[derive(Debug, Clone, Default)]
/// Problems to report as ignored: document -> rule id -> pointers.
pub struct IgnoreList {
    entries: HashMap<String, HashMap<String, HashSet<String>>>,
}

impl IgnoreList {
    /// Load the ignore file from `dir` if present. Keys are document paths
    /// relative to `dir` (or URLs).
    pub fn load(dir: &Path) -> Result<IgnoreList> {
        let path = dir.join(IGNORE_FILE_NAME);
        if !path.is_file() {
            return Ok(IgnoreList::default());
        }
        let s = fs::read_to_string(&path)?;
        let raw: HashMap<String, HashMap<String, Vec<String>>> = serde_yaml::from_str(&s)
            .map_err(|e| Error::Config {
                path: path.clone(),
                message: e.to_string(),
            })?;
        let entries = raw
            .into_iter()
            .map(|(doc, rules)| {
                let key = normalize_reference(dir, &doc);
                let rules = rules
                    .into_iter()
                    .map(|(rule, ptrs)| (rule, ptrs.into_iter().collect()))
                    .collect();
                (key, rules)
            })
            .collect();
        tracing::debug!(path = %path.display(), "loaded ignore file");
        Ok(IgnoreList { entries })
    }

    pub fn insert(&mut self, reference: &str, rule: &str, pointer: &str) {
        self.entries
            .entry(reference.to_string())
            .or_default()
            .entry(rule.to_string())
            .or_default()
            .insert(pointer.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `reference` must already be normalized with [`normalize_reference`].
    pub fn is_ignored(&self, reference: &str, rule: &str, pointer: &str) -> bool {
        self.entries
            .get(reference)
            .and_then(|rules| rules.get(rule))
            .map(|ptrs| ptrs.contains(pointer))
            .unwrap_or(false)
    }
}

/// Turn a document reference into a stable lookup key: URLs are kept as-is,
/// paths are joined onto `base` and canonicalized when they exist.
pub fn normalize_reference(base: &Path, reference: &str) -> String {
    if is_url(reference) {
        return reference.to_string();
    }
    let p = base.join(reference);
    fs::canonicalize(&p)
        .unwrap_or(p)
        .to_string_lossy()
        .to_string()
}

pub fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

#[derive(Debug, Clone)]
/// Resolved lint configuration, immutable for the duration of a run.
pub struct LintConfig {
    /// Config file the values came from, if any.
    pub path: Option<PathBuf>,
    /// Directory relative references are resolved against.
    pub base_dir: PathBuf,
    pub apis: Vec<ApiDef>,
    pub levels: HashMap<String, RuleLevel>,
    pub ignore: IgnoreList,
}

impl LintConfig {
    /// Config with the `recommended` preset and no APIs.
    pub fn with_base_dir(base_dir: PathBuf) -> LintConfig {
        LintConfig {
            path: None,
            base_dir,
            apis: Vec::new(),
            levels: rules::resolve_levels(Preset::Recommended, &HashMap::new()),
            ignore: IgnoreList::default(),
        }
    }

    pub fn level(&self, rule_id: &str) -> RuleLevel {
        self.levels.get(rule_id).copied().unwrap_or(RuleLevel::Off)
    }

    /// Build from a parsed config file located in `base_dir`.
    pub fn from_raw(raw: RawConfig, path: Option<PathBuf>, base_dir: PathBuf) -> LintConfig {
        let lint = raw.lint.unwrap_or_default();
        let extends = raw.extends.or(lint.extends);
        let preset = match extends {
            None => Preset::Recommended,
            Some(Extends::One(s)) => preset_or_default(&s),
            Some(Extends::Many(v)) => v
                .iter()
                .rev()
                .find_map(|s| Preset::parse(s))
                .unwrap_or(Preset::Recommended),
        };

        let mut overrides: HashMap<String, RuleLevel> = HashMap::new();
        // Top-level `rules` win over the nested `lint.rules` block
        for settings in [lint.rules, raw.rules].into_iter().flatten() {
            for (id, setting) in settings {
                if !rules::is_known(&id) {
                    tracing::warn!(rule = %id, "unknown rule in config; ignoring");
                    continue;
                }
                match RuleLevel::parse(setting.level_str()) {
                    Some(level) => {
                        overrides.insert(id, level);
                    }
                    None => tracing::warn!(
                        rule = %id,
                        severity = setting.level_str(),
                        "unknown severity in config; ignoring"
                    ),
                }
            }
        }

        let apis = raw
            .apis
            .or(raw.api_definitions)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(alias, def)| {
                let root = match def {
                    Json::String(s) => s,
                    Json::Object(obj) => obj.get("root")?.as_str()?.to_string(),
                    _ => return None,
                };
                let root = if is_url(&root) {
                    root
                } else {
                    base_dir.join(&root).to_string_lossy().to_string()
                };
                Some(ApiDef { alias, root })
            })
            .collect();

        LintConfig {
            path,
            base_dir,
            apis,
            levels: rules::resolve_levels(preset, &overrides),
            ignore: IgnoreList::default(),
        }
    }
}

fn preset_or_default(s: &str) -> Preset {
    Preset::parse(s).unwrap_or_else(|| {
        tracing::warn!(extends = %s, "unknown preset; using recommended");
        Preset::Recommended
    })
}

/// Walk upward from `start` looking for a config file.
///
/// Stops at the first directory holding a `.git` directory.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut cur = start;
    loop {
        for name in CONFIG_FILE_NAMES {
            let p = cur.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
        if cur.join(".git").exists() {
            return None;
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return None,
        }
    }
}

/// Load a config from `path` (relative to `cwd`), or discover one from
/// `cwd` when `path` is `None`.
pub fn load_config(cwd: &Path, path: Option<&str>) -> Result<LintConfig> {
    let found = match path {
        Some(p) => {
            let p = cwd.join(p);
            if !p.is_file() {
                return Err(Error::ConfigNotFound(p));
            }
            Some(p)
        }
        None => find_config(cwd),
    };
    let mut cfg = match found {
        Some(p) => {
            let s = fs::read_to_string(&p)?;
            let raw: RawConfig = if s.trim().is_empty() {
                RawConfig::default()
            } else {
                serde_yaml::from_str(&s).map_err(|e| Error::Config {
                    path: p.clone(),
                    message: e.to_string(),
                })?
            };
            let base = p.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf());
            tracing::debug!(path = %p.display(), "using config file");
            LintConfig::from_raw(raw, Some(p), base)
        }
        None => {
            tracing::debug!("no config file found; using defaults");
            LintConfig::with_base_dir(cwd.to_path_buf())
        }
    };
    cfg.ignore = IgnoreList::load(&cfg.base_dir)?;
    Ok(cfg)
}

/// Loads config files relative to the process working directory.
pub struct FsConfigLoader {
    pub cwd: PathBuf,
}

impl crate::orchestrator::ConfigLoader for FsConfigLoader {
    fn load(&self, path: Option<&str>) -> Result<LintConfig> {
        load_config(&self.cwd, path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What to do when a single entry point cannot be linted at all.
pub enum LoadErrorPolicy {
    /// Log the error and let the aggregate error count decide the verdict.
    Report,
    /// Mark the whole run failed, but still lint the remaining entry points.
    Fail,
}

impl LoadErrorPolicy {
    pub fn parse(s: &str) -> Option<LoadErrorPolicy> {
        match s.trim() {
            "report" => Some(LoadErrorPolicy::Report),
            "fail" => Some(LoadErrorPolicy::Fail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
/// Fully-resolved action inputs.
pub struct Effective {
    pub config: Option<String>,
    pub entrypoints: Vec<String>,
    pub format: Option<String>,
    pub max_problems: usize,
    pub on_load_error: LoadErrorPolicy,
}

/// Split the `entrypoints` input on single spaces, dropping empty segments.
pub fn split_entrypoints(input: Option<&str>) -> Vec<String> {
    match input {
        Some(s) if !s.is_empty() => s
            .split(' ')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse `max_problems`; anything that is not a non-negative integer yields
/// the default.
pub fn parse_max_problems(input: Option<&str>) -> usize {
    input
        .and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_PROBLEMS)
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Resolve `Effective` from raw input values (flags already merged with
/// their `INPUT_*` environment fallbacks by the CLI layer).
pub fn resolve_effective(
    config: Option<&str>,
    config_file: Option<&str>,
    entrypoints: Option<&str>,
    format: Option<&str>,
    max_problems: Option<&str>,
    on_load_error: Option<&str>,
) -> Effective {
    let config = non_empty(config)
        .or_else(|| non_empty(config_file))
        .map(str::to_string);
    let on_load_error = match non_empty(on_load_error) {
        None => LoadErrorPolicy::Report,
        Some(s) => LoadErrorPolicy::parse(s).unwrap_or_else(|| {
            tracing::warn!(value = %s, "unknown on_load_error policy; using report");
            LoadErrorPolicy::Report
        }),
    };
    Effective {
        config,
        entrypoints: split_entrypoints(non_empty(entrypoints)),
        format: non_empty(format).map(str::to_string),
        max_problems: parse_max_problems(non_empty(max_problems)),
        on_load_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_split_entrypoints() {
        assert!(split_entrypoints(Some("")).is_empty());
        assert!(split_entrypoints(None).is_empty());
        assert_eq!(
            split_entrypoints(Some("a.yaml b.yaml")),
            vec!["a.yaml".to_string(), "b.yaml".to_string()]
        );
        assert_eq!(split_entrypoints(Some("a.yaml  b.yaml")).len(), 2);
    }

    #[test]
    fn test_parse_max_problems_defaults() {
        assert_eq!(parse_max_problems(Some("abc")), 100);
        assert_eq!(parse_max_problems(Some("5")), 5);
        assert_eq!(parse_max_problems(None), 100);
        assert_eq!(parse_max_problems(Some("-3")), 100);
    }

    #[test]
    fn test_resolve_effective_prefers_config_over_config_file() {
        let eff = resolve_effective(Some(""), Some("legacy.yaml"), None, Some(" "), None, None);
        assert_eq!(eff.config.as_deref(), Some("legacy.yaml"));
        assert_eq!(eff.format, None);
        assert_eq!(eff.max_problems, 100);
        assert_eq!(eff.on_load_error, LoadErrorPolicy::Report);

        let eff = resolve_effective(
            Some("new.yaml"),
            Some("legacy.yaml"),
            Some("a.yaml"),
            Some("json"),
            Some("7"),
            Some("fail"),
        );
        assert_eq!(eff.config.as_deref(), Some("new.yaml"));
        assert_eq!(eff.entrypoints, vec!["a.yaml".to_string()]);
        assert_eq!(eff.format.as_deref(), Some("json"));
        assert_eq!(eff.max_problems, 7);
        assert_eq!(eff.on_load_error, LoadErrorPolicy::Fail);
    }

    #[test]
    fn test_load_config_apis_relative_to_config_dir() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("conf")).unwrap();
        let mut f = fs::File::create(root.join("conf/.redocly.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
apis:
  zeta@v1:
    root: specs/zeta.yaml
  alpha@v1:
    root: https://example.com/alpha.yaml
extends: minimal
rules:
  info-contact: error
  operation-summary:
    severity: off
  not-a-rule: error
"#
        )
        .unwrap();

        let cfg = load_config(root, Some("conf/.redocly.yaml")).unwrap();
        // Declaration order is kept
        assert_eq!(cfg.apis[0].alias, "zeta@v1");
        assert_eq!(
            cfg.apis[0].root,
            root.join("conf").join("specs/zeta.yaml").to_string_lossy()
        );
        assert_eq!(cfg.apis[1].root, "https://example.com/alpha.yaml");
        assert_eq!(cfg.level(rules::INFO_CONTACT), RuleLevel::Error);
        assert_eq!(cfg.level(rules::OPERATION_SUMMARY), RuleLevel::Off);
        // minimal preset leaves license checks off
        assert_eq!(cfg.level(rules::INFO_LICENSE), RuleLevel::Off);
        assert_eq!(cfg.level("not-a-rule"), RuleLevel::Off);
    }

    #[test]
    fn test_legacy_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join(".redocly.yaml"),
            "apiDefinitions:\n  main: openapi.yaml\nlint:\n  extends:\n    - all\n  rules:\n    tag-description: off\n",
        )
        .unwrap();
        let cfg = load_config(root, None).unwrap();
        assert_eq!(cfg.apis.len(), 1);
        assert_eq!(cfg.apis[0].alias, "main");
        assert_eq!(cfg.level(rules::TAG_DESCRIPTION), RuleLevel::Off);
        assert_eq!(cfg.level(rules::INFO_CONTACT), RuleLevel::Error);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = tempdir().unwrap();
        let err = load_config(dir.path(), Some("nope.yaml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".redocly.yaml"), "apis: [unclosed").unwrap();
        let err = load_config(dir.path(), None).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_discovery_stops_at_git_root() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(".redocly.yaml"), "extends: all\n").unwrap();
        let repo = root.join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::create_dir_all(repo.join("sub")).unwrap();
        assert!(find_config(&repo.join("sub")).is_none());
        assert_eq!(find_config(root), Some(root.join(".redocly.yaml")));
        let cfg = load_config(&repo.join("sub"), None).unwrap();
        assert!(cfg.path.is_none());
        assert!(cfg.apis.is_empty());
    }

    #[test]
    fn test_ignore_file_loaded_beside_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(".redocly.yaml"), "extends: recommended\n").unwrap();
        fs::write(root.join("openapi.yaml"), "openapi: 3.0.0\n").unwrap();
        fs::write(
            root.join(IGNORE_FILE_NAME),
            "openapi.yaml:\n  info-license:\n    - '#/info'\n",
        )
        .unwrap();
        let cfg = load_config(root, None).unwrap();
        let key = normalize_reference(root, "openapi.yaml");
        assert!(cfg.ignore.is_ignored(&key, "info-license", "#/info"));
        assert!(!cfg.ignore.is_ignored(&key, "info-contact", "#/info"));
    }
}
