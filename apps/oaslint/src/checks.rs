//! Rule checks over a parsed OpenAPI document.
//!
//! Every check is a pure function from the document root to findings. The
//! linter decides which checks run and with which severity.

use crate::models::rules;
use regex::Regex;
use serde_json::{Map, Value as Json};
use std::collections::HashSet;
use std::sync::OnceLock;

/// A rule violation before severity and ignore handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub pointer: String,
    pub message: String,
}

pub type CheckFn = fn(&Json) -> Vec<Finding>;

/// Checks by rule id.
pub const CHECKS: &[(&str, CheckFn)] = &[
    (rules::SPEC, check_spec),
    (rules::INFO_CONTACT, check_info_contact),
    (rules::INFO_LICENSE, check_info_license),
    (rules::INFO_LICENSE_URL, check_info_license_url),
    (rules::NO_EMPTY_SERVERS, check_no_empty_servers),
    (rules::NO_PATH_TRAILING_SLASH, check_no_path_trailing_slash),
    (rules::OPERATION_OPERATION_ID, check_operation_id),
    (rules::OPERATION_OPERATION_ID_UNIQUE, check_operation_id_unique),
    (rules::OPERATION_OPERATION_ID_URL_SAFE, check_operation_id_url_safe),
    (rules::OPERATION_SUMMARY, check_operation_summary),
    (rules::OPERATION_2XX_RESPONSE, check_2xx_response),
    (rules::OPERATION_4XX_RESPONSE, check_4xx_response),
    (rules::PATH_PARAMETERS_DEFINED, check_path_parameters_defined),
    (rules::OPERATION_TAG_DEFINED, check_operation_tag_defined),
    (rules::TAG_DESCRIPTION, check_tag_description),
    (rules::SECURITY_DEFINED, check_security_defined),
    (rules::NO_UNRESOLVED_REFS, check_no_unresolved_refs),
    (rules::NO_UNUSED_COMPONENTS, check_no_unused_components),
];

const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

const COMPONENT_KINDS: [&str; 8] = [
    "schemas",
    "parameters",
    "responses",
    "requestBodies",
    "headers",
    "examples",
    "links",
    "callbacks",
];

fn finding(pointer: impl Into<String>, message: impl Into<String>) -> Finding {
    Finding {
        pointer: pointer.into(),
        message: message.into(),
    }
}

/// Escape one JSON pointer segment (`~` -> `~0`, `/` -> `~1`).
pub fn escape_segment(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

/// Append a segment to a `#/...` pointer.
pub fn join_pointer(base: &str, seg: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, escape_segment(seg))
    } else {
        format!("{}/{}", base, escape_segment(seg))
    }
}

struct Operation<'a> {
    path: &'a str,
    path_item: &'a Map<String, Json>,
    op: &'a Map<String, Json>,
    pointer: String,
}

fn operations(root: &Json) -> Vec<Operation<'_>> {
    let mut out = Vec::new();
    let Some(paths) = root.get("paths").and_then(Json::as_object) else {
        return out;
    };
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        let item_ptr = join_pointer("#/paths", path);
        for m in METHODS {
            if let Some(op) = item.get(m).and_then(Json::as_object) {
                out.push(Operation {
                    path,
                    path_item: item,
                    op,
                    pointer: join_pointer(&item_ptr, m),
                });
            }
        }
    }
    out
}

fn non_empty_str(v: Option<&Json>) -> bool {
    v.and_then(Json::as_str).map(|s| !s.trim().is_empty()).unwrap_or(false)
}

fn check_spec(root: &Json) -> Vec<Finding> {
    if root.get("swagger").is_some() {
        return vec![finding(
            "#/swagger",
            "Only OpenAPI 3.x documents are supported; found a Swagger 2.0 document.",
        )];
    }
    let version = match root.get("openapi") {
        None => {
            return vec![finding(
                "#/",
                "The field `openapi` must be present on this level.",
            )]
        }
        Some(Json::String(s)) => s.as_str(),
        Some(_) => return vec![finding("#/openapi", "Expected type `string`.")],
    };
    if !version.starts_with("3.") {
        return vec![finding(
            "#/openapi",
            format!("Unsupported OpenAPI version `{}`.", version),
        )];
    }

    let mut out = Vec::new();
    match root.get("info") {
        Some(Json::Object(info)) => {
            for field in ["title", "version"] {
                if !info.get(field).map(Json::is_string).unwrap_or(false) {
                    out.push(finding(
                        "#/info",
                        format!("The field `{}` must be present on this level.", field),
                    ));
                }
            }
        }
        Some(_) => out.push(finding("#/info", "Expected type `object`.")),
        None => out.push(finding(
            "#/",
            "The field `info` must be present on this level.",
        )),
    }
    if version.starts_with("3.0") {
        if root.get("paths").is_none() {
            out.push(finding(
                "#/",
                "The field `paths` must be present on this level.",
            ));
        }
        // Full structural pass only once the top-level shape is sane
        if out.is_empty() {
            if let Err(e) = serde_json::from_value::<openapiv3::OpenAPI>(root.clone()) {
                out.push(finding("#/", format!("Invalid OpenAPI 3.0 document: {}", e)));
            }
        }
    }
    out
}

fn check_info_contact(root: &Json) -> Vec<Finding> {
    match root.get("info").and_then(Json::as_object) {
        Some(info) if !info.contains_key("contact") => vec![finding(
            "#/info",
            "Info object should contain `contact` field.",
        )],
        _ => Vec::new(),
    }
}

fn check_info_license(root: &Json) -> Vec<Finding> {
    match root.get("info").and_then(Json::as_object) {
        Some(info) if !info.contains_key("license") => vec![finding(
            "#/info",
            "Info object should contain `license` field.",
        )],
        _ => Vec::new(),
    }
}

fn check_info_license_url(root: &Json) -> Vec<Finding> {
    match root.pointer("/info/license").and_then(Json::as_object) {
        Some(lic) if !non_empty_str(lic.get("url")) => vec![finding(
            "#/info/license",
            "License object should contain `url` field.",
        )],
        _ => Vec::new(),
    }
}

fn check_no_empty_servers(root: &Json) -> Vec<Finding> {
    match root.get("servers") {
        None => vec![finding("#/", "Servers must be present.")],
        Some(Json::Array(a)) if a.is_empty() => {
            vec![finding("#/servers", "Servers must be a non-empty array.")]
        }
        _ => Vec::new(),
    }
}

fn check_no_path_trailing_slash(root: &Json) -> Vec<Finding> {
    let Some(paths) = root.get("paths").and_then(Json::as_object) else {
        return Vec::new();
    };
    paths
        .keys()
        .filter(|p| p.len() > 1 && p.ends_with('/'))
        .map(|p| {
            finding(
                join_pointer("#/paths", p),
                format!("`{}` should not have a trailing slash.", p),
            )
        })
        .collect()
}

fn check_operation_id(root: &Json) -> Vec<Finding> {
    operations(root)
        .into_iter()
        .filter(|o| !non_empty_str(o.op.get("operationId")))
        .map(|o| {
            finding(
                o.pointer,
                "Operation object should contain `operationId` field.",
            )
        })
        .collect()
}

fn check_operation_id_unique(root: &Json) -> Vec<Finding> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for o in operations(root) {
        if let Some(id) = o.op.get("operationId").and_then(Json::as_str) {
            if !seen.insert(id) {
                out.push(finding(
                    join_pointer(&o.pointer, "operationId"),
                    "Every operation must have a unique `operationId`.",
                ));
            }
        }
    }
    out
}

fn url_safe_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9\-._~:/?#\[\]@!$&'()*+,;=]*$").expect("static regex")
    })
}

fn check_operation_id_url_safe(root: &Json) -> Vec<Finding> {
    operations(root)
        .into_iter()
        .filter_map(|o| {
            let id = o.op.get("operationId")?.as_str()?;
            if url_safe_re().is_match(id) {
                return None;
            }
            Some(finding(
                join_pointer(&o.pointer, "operationId"),
                "Operation `operationId` should not have URL invalid characters.",
            ))
        })
        .collect()
}

fn check_operation_summary(root: &Json) -> Vec<Finding> {
    operations(root)
        .into_iter()
        .filter(|o| !non_empty_str(o.op.get("summary")))
        .map(|o| finding(o.pointer, "Operation object should contain `summary` field."))
        .collect()
}

fn check_response_class(root: &Json, class: char) -> Vec<Finding> {
    let mut out = Vec::new();
    for o in operations(root) {
        let Some(responses) = o.op.get("responses").and_then(Json::as_object) else {
            out.push(finding(
                o.pointer,
                "Operation object should contain `responses` field.",
            ));
            continue;
        };
        let has = responses.keys().any(|k| k.starts_with(class));
        if !has {
            out.push(finding(
                join_pointer(&o.pointer, "responses"),
                format!("Operation must have at least one `{}XX` response.", class),
            ));
        }
    }
    out
}

fn check_2xx_response(root: &Json) -> Vec<Finding> {
    check_response_class(root, '2')
}

fn check_4xx_response(root: &Json) -> Vec<Finding> {
    // Missing `responses` is already reported by the 2xx rule
    check_response_class(root, '4')
        .into_iter()
        .filter(|f| f.pointer.ends_with("/responses"))
        .collect()
}

fn path_template_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^}/]+)\}").expect("static regex"))
}

/// Follow a local `$ref` once; other values are returned unchanged.
fn deref<'a>(root: &'a Json, v: &'a Json) -> &'a Json {
    match v.get("$ref").and_then(Json::as_str) {
        Some(r) if r.starts_with('#') => root.pointer(&r[1..]).unwrap_or(v),
        _ => v,
    }
}

/// `(name, pointer)` for every `in: path` parameter in `params`.
fn path_params<'a>(root: &'a Json, params: Option<&'a Json>, base: &str) -> Vec<(&'a str, String)> {
    let Some(arr) = params.and_then(Json::as_array) else {
        return Vec::new();
    };
    arr.iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let p = deref(root, p);
            if p.get("in").and_then(Json::as_str) != Some("path") {
                return None;
            }
            let name = p.get("name")?.as_str()?;
            Some((name, join_pointer(&join_pointer(base, "parameters"), &i.to_string())))
        })
        .collect()
}

fn check_path_parameters_defined(root: &Json) -> Vec<Finding> {
    let mut out = Vec::new();
    for o in operations(root) {
        let templated: Vec<&str> = path_template_re()
            .captures_iter(o.path)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        let item_ptr = join_pointer("#/paths", o.path);
        let mut declared = path_params(root, o.path_item.get("parameters"), &item_ptr);
        declared.extend(path_params(root, o.op.get("parameters"), &o.pointer));

        for name in &templated {
            if !declared.iter().any(|(d, _)| d == name) {
                out.push(finding(
                    o.pointer.clone(),
                    format!(
                        "The operation does not define the path parameter `{{{}}}` expected by path `{}`.",
                        name, o.path
                    ),
                ));
            }
        }
        for (name, ptr) in declared {
            if !templated.contains(&name) && ptr.starts_with(&o.pointer) {
                out.push(finding(
                    ptr,
                    format!("Path parameter `{}` is not used in path `{}`.", name, o.path),
                ));
            }
        }
    }
    out
}

fn declared_tags(root: &Json) -> Vec<&Json> {
    root.get("tags")
        .and_then(Json::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default()
}

fn check_operation_tag_defined(root: &Json) -> Vec<Finding> {
    let names: HashSet<&str> = declared_tags(root)
        .into_iter()
        .filter_map(|t| t.get("name").and_then(Json::as_str))
        .collect();
    let mut out = Vec::new();
    for o in operations(root) {
        let Some(tags) = o.op.get("tags").and_then(Json::as_array) else {
            continue;
        };
        for (i, t) in tags.iter().enumerate() {
            if let Some(name) = t.as_str() {
                if !names.contains(name) {
                    out.push(finding(
                        join_pointer(&join_pointer(&o.pointer, "tags"), &i.to_string()),
                        format!("Operation tags should be defined in global tags: `{}`.", name),
                    ));
                }
            }
        }
    }
    out
}

fn check_tag_description(root: &Json) -> Vec<Finding> {
    declared_tags(root)
        .into_iter()
        .enumerate()
        .filter(|(_, t)| !non_empty_str(t.get("description")))
        .map(|(i, _)| {
            finding(
                format!("#/tags/{}", i),
                "Tag object should contain `description` field.",
            )
        })
        .collect()
}

fn check_security_defined(root: &Json) -> Vec<Finding> {
    let schemes: HashSet<&str> = root
        .pointer("/components/securitySchemes")
        .and_then(Json::as_object)
        .map(|m| m.keys().map(String::as_str).collect())
        .unwrap_or_default();
    let mut out = Vec::new();
    let mut check_requirements = |reqs: &Json, base: String| {
        let Some(arr) = reqs.as_array() else {
            return;
        };
        for (i, req) in arr.iter().enumerate() {
            let Some(req) = req.as_object() else {
                continue;
            };
            for name in req.keys() {
                if !schemes.contains(name.as_str()) {
                    out.push(finding(
                        join_pointer(&join_pointer(&base, &i.to_string()), name),
                        format!("There is no `{}` security scheme defined.", name),
                    ));
                }
            }
        }
    };
    let global = root.get("security");
    if let Some(g) = global {
        check_requirements(g, "#/security".to_string());
    }
    let mut missing = Vec::new();
    for o in operations(root) {
        match o.op.get("security") {
            Some(s) => check_requirements(s, join_pointer(&o.pointer, "security")),
            None if global.is_none() => missing.push(finding(
                o.pointer,
                "Every operation should have security defined on it or on the root level.",
            )),
            None => {}
        }
    }
    out.extend(missing);
    out
}

/// Visit every `$ref` string: `(pointer of the $ref field, target)`.
fn walk_refs<'a>(v: &'a Json, ptr: &str, f: &mut dyn FnMut(String, &'a str)) {
    match v {
        Json::Object(m) => {
            for (k, child) in m {
                let child_ptr = join_pointer(ptr, k);
                if k == "$ref" {
                    if let Some(target) = child.as_str() {
                        f(child_ptr, target);
                    }
                    continue;
                }
                walk_refs(child, &child_ptr, f);
            }
        }
        Json::Array(a) => {
            for (i, child) in a.iter().enumerate() {
                walk_refs(child, &join_pointer(ptr, &i.to_string()), f);
            }
        }
        _ => {}
    }
}

fn check_no_unresolved_refs(root: &Json) -> Vec<Finding> {
    let mut out = Vec::new();
    walk_refs(root, "#/", &mut |ptr, target| {
        // External references are not followed
        if !target.starts_with('#') {
            return;
        }
        if root.pointer(&target[1..]).is_none() {
            out.push(finding(ptr, format!("Can't resolve $ref `{}`.", target)));
        }
    });
    out
}

fn check_no_unused_components(root: &Json) -> Vec<Finding> {
    let Some(components) = root.get("components").and_then(Json::as_object) else {
        return Vec::new();
    };
    let mut used: HashSet<&str> = HashSet::new();
    walk_refs(root, "#/", &mut |_, target| {
        used.insert(target);
    });
    let mut out = Vec::new();
    for kind in COMPONENT_KINDS {
        let Some(items) = components.get(kind).and_then(Json::as_object) else {
            continue;
        };
        for name in items.keys() {
            let ptr = join_pointer(&join_pointer("#/components", kind), name);
            if !used.contains(ptr.as_str()) {
                out.push(finding(
                    ptr,
                    format!("Component: \"{}\" is never used.", name),
                ));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Json {
        serde_yaml::from_str(yaml).unwrap()
    }

    const PETSTORE: &str = r#"
openapi: 3.0.3
info:
  title: Petstore
  version: 1.0.0
  license:
    name: MIT
servers:
  - url: https://example.com
tags:
  - name: pets
paths:
  /pets/{petId}/:
    get:
      tags: [pets, cats]
      operationId: get pet
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Pet'
    post:
      operationId: get pet
      summary: Create
      parameters:
        - name: petId
          in: path
          required: true
          schema: { type: string }
        - name: other
          in: path
          required: true
          schema: { type: string }
      responses:
        '404':
          description: nope
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Missing'
components:
  schemas:
    Pet:
      type: object
    Unused:
      type: string
"#;

    fn pointers(fs: &[Finding]) -> Vec<&str> {
        fs.iter().map(|f| f.pointer.as_str()).collect()
    }

    #[test]
    fn test_escape_and_join_pointer() {
        assert_eq!(join_pointer("#/paths", "/a~b"), "#/paths/~1a~0b");
        assert_eq!(join_pointer("#/", "info"), "#/info");
    }

    #[test]
    fn test_spec_accepts_valid_30_document() {
        let root = doc("openapi: 3.0.0\ninfo:\n  title: t\n  version: '1'\npaths: {}\n");
        assert!(check_spec(&root).is_empty());
    }

    #[test]
    fn test_spec_reports_missing_fields_and_versions() {
        let root = doc("info:\n  title: t\n");
        assert_eq!(pointers(&check_spec(&root)), vec!["#/"]);
        let root = doc("openapi: 3.1.0\ninfo:\n  title: t\n");
        let f = check_spec(&root);
        assert_eq!(f.len(), 1);
        assert!(f[0].message.contains("`version`"));
        let root = doc("swagger: '2.0'\n");
        assert!(check_spec(&root)[0].message.contains("Swagger 2.0"));
        let root = doc("openapi: 2.5.0\n");
        assert!(check_spec(&root)[0].message.contains("Unsupported"));
    }

    #[test]
    fn test_info_rules() {
        let root = doc(PETSTORE);
        assert_eq!(pointers(&check_info_contact(&root)), vec!["#/info"]);
        assert!(check_info_license(&root).is_empty());
        assert_eq!(pointers(&check_info_license_url(&root)), vec!["#/info/license"]);
    }

    #[test]
    fn test_servers_rule() {
        assert!(check_no_empty_servers(&doc(PETSTORE)).is_empty());
        assert_eq!(check_no_empty_servers(&doc("servers: []\n")).len(), 1);
        assert_eq!(check_no_empty_servers(&doc("openapi: 3.0.0\n")).len(), 1);
    }

    #[test]
    fn test_operation_rules() {
        let root = doc(PETSTORE);
        assert_eq!(
            pointers(&check_no_path_trailing_slash(&root)),
            vec!["#/paths/~1pets~1{petId}~1"]
        );
        assert!(check_operation_id(&root).is_empty());
        assert_eq!(
            pointers(&check_operation_id_unique(&root)),
            vec!["#/paths/~1pets~1{petId}~1/post/operationId"]
        );
        assert_eq!(check_operation_id_url_safe(&root).len(), 2);
        assert_eq!(
            pointers(&check_operation_summary(&root)),
            vec!["#/paths/~1pets~1{petId}~1/get"]
        );
        assert_eq!(
            pointers(&check_2xx_response(&root)),
            vec!["#/paths/~1pets~1{petId}~1/post/responses"]
        );
        assert_eq!(
            pointers(&check_4xx_response(&root)),
            vec!["#/paths/~1pets~1{petId}~1/get/responses"]
        );
    }

    #[test]
    fn test_path_parameters_defined() {
        let root = doc(PETSTORE);
        let f = check_path_parameters_defined(&root);
        // get lacks petId; post declares an extra `other`
        assert_eq!(f.len(), 2);
        assert_eq!(f[0].pointer, "#/paths/~1pets~1{petId}~1/get");
        assert!(f[0].message.contains("`{petId}`"));
        assert_eq!(f[1].pointer, "#/paths/~1pets~1{petId}~1/post/parameters/1");
    }

    #[test]
    fn test_tag_rules() {
        let root = doc(PETSTORE);
        assert_eq!(
            pointers(&check_operation_tag_defined(&root)),
            vec!["#/paths/~1pets~1{petId}~1/get/tags/1"]
        );
        assert_eq!(pointers(&check_tag_description(&root)), vec!["#/tags/0"]);
    }

    #[test]
    fn test_security_defined() {
        let root = doc(PETSTORE);
        assert_eq!(check_security_defined(&root).len(), 2);
        let root = doc(
            "security:\n  - apiKey: []\n  - oauth: []\ncomponents:\n  securitySchemes:\n    apiKey: {type: apiKey, in: header, name: X}\npaths:\n  /a:\n    get: {}\n",
        );
        assert_eq!(pointers(&check_security_defined(&root)), vec!["#/security/1/oauth"]);
    }

    #[test]
    fn test_refs_rules() {
        let root = doc(PETSTORE);
        let unresolved = check_no_unresolved_refs(&root);
        assert_eq!(unresolved.len(), 1);
        assert!(unresolved[0].pointer.ends_with("/schema/$ref"));
        assert!(unresolved[0].message.contains("#/components/schemas/Missing"));
        assert_eq!(
            pointers(&check_no_unused_components(&root)),
            vec!["#/components/schemas/Unused"]
        );
    }
}
