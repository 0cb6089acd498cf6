//! Built-in rule catalog and presets.
//!
//! Each rule has a default level per preset. `extends` selects a preset and
//! `rules` overrides individual levels on top of it.

use super::Severity;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Configured level of a rule; `Off` disables it.
pub enum RuleLevel {
    Off,
    Warn,
    Error,
}

impl RuleLevel {
    /// Parse `off|warn|warning|error`.
    pub fn parse(s: &str) -> Option<RuleLevel> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Some(RuleLevel::Off),
            "warn" | "warning" => Some(RuleLevel::Warn),
            "error" => Some(RuleLevel::Error),
            _ => None,
        }
    }

    pub fn severity(self) -> Option<Severity> {
        match self {
            RuleLevel::Off => None,
            RuleLevel::Warn => Some(Severity::Warn),
            RuleLevel::Error => Some(Severity::Error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Minimal,
    Recommended,
    All,
}

impl Preset {
    pub fn parse(s: &str) -> Option<Preset> {
        match s.trim() {
            "minimal" => Some(Preset::Minimal),
            "recommended" => Some(Preset::Recommended),
            "all" => Some(Preset::All),
            _ => None,
        }
    }
}

pub const SPEC: &str = "spec";
pub const INFO_CONTACT: &str = "info-contact";
pub const INFO_LICENSE: &str = "info-license";
pub const INFO_LICENSE_URL: &str = "info-license-url";
pub const NO_EMPTY_SERVERS: &str = "no-empty-servers";
pub const NO_PATH_TRAILING_SLASH: &str = "no-path-trailing-slash";
pub const OPERATION_OPERATION_ID: &str = "operation-operationId";
pub const OPERATION_OPERATION_ID_UNIQUE: &str = "operation-operationId-unique";
pub const OPERATION_OPERATION_ID_URL_SAFE: &str = "operation-operationId-url-safe";
pub const OPERATION_SUMMARY: &str = "operation-summary";
pub const OPERATION_2XX_RESPONSE: &str = "operation-2xx-response";
pub const OPERATION_4XX_RESPONSE: &str = "operation-4xx-response";
pub const PATH_PARAMETERS_DEFINED: &str = "path-parameters-defined";
pub const OPERATION_TAG_DEFINED: &str = "operation-tag-defined";
pub const TAG_DESCRIPTION: &str = "tag-description";
pub const SECURITY_DEFINED: &str = "security-defined";
pub const NO_UNRESOLVED_REFS: &str = "no-unresolved-refs";
pub const NO_UNUSED_COMPONENTS: &str = "no-unused-components";

use RuleLevel::{Error as E, Off as O, Warn as W};

/// `(id, recommended, minimal)`
const CATALOG: &[(&str, RuleLevel, RuleLevel)] = &[
    (SPEC, E, E),
    (INFO_CONTACT, O, O),
    (INFO_LICENSE, W, O),
    (INFO_LICENSE_URL, W, O),
    (NO_EMPTY_SERVERS, E, W),
    (NO_PATH_TRAILING_SLASH, E, E),
    (OPERATION_OPERATION_ID, W, W),
    (OPERATION_OPERATION_ID_UNIQUE, E, W),
    (OPERATION_OPERATION_ID_URL_SAFE, E, W),
    (OPERATION_SUMMARY, E, E),
    (OPERATION_2XX_RESPONSE, W, W),
    (OPERATION_4XX_RESPONSE, W, O),
    (PATH_PARAMETERS_DEFINED, E, W),
    (OPERATION_TAG_DEFINED, O, O),
    (TAG_DESCRIPTION, W, O),
    (SECURITY_DEFINED, E, O),
    (NO_UNRESOLVED_REFS, E, E),
    (NO_UNUSED_COMPONENTS, W, O),
];

pub fn is_known(id: &str) -> bool {
    CATALOG.iter().any(|(rid, _, _)| *rid == id)
}

/// Levels for every rule: preset defaults, then overrides by id.
pub fn resolve_levels(
    preset: Preset,
    overrides: &HashMap<String, RuleLevel>,
) -> HashMap<String, RuleLevel> {
    CATALOG
        .iter()
        .map(|(id, rec, min)| {
            let base = match preset {
                Preset::Recommended => *rec,
                Preset::Minimal => *min,
                Preset::All => RuleLevel::Error,
            };
            let level = overrides.get(*id).copied().unwrap_or(base);
            (id.to_string(), level)
        })
        .collect()
}
