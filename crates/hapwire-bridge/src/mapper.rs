//! Value mappers: pluggable text-to-text transforms applied to HTTP bodies.
//!
//! A mapper chain turns a raw response body into the characteristic state
//! (read path) or a user value into the wire value (write path). Every
//! mapper is total: input it cannot handle passes through unchanged, so a
//! malformed payload can never abort a resolution.
//!
//! ## Mapper kinds
//!
//! | `type`     | parameters                  | behavior |
//! |------------|-----------------------------|----------|
//! | `static`   | `mapping` (object)          | exact-match table lookup |
//! | `regex`    | `pattern`, `capture`        | capture-group extraction |
//! | `xpath`    | `xpath`, `index`            | XML location-path select |
//! | `jsonPath` | `jsonPath`, `index`         | JSON dot/bracket select |

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Configuration entry for one mapper in a chain.
///
/// Entries with an unknown `type`, or parameters that cannot be compiled
/// (e.g. an invalid regex pattern), are dropped from the chain with a
/// warning rather than failing construction.
#[derive(Debug, Clone, Deserialize)]
pub struct MapperConfig {
    /// Mapper kind tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Kind-specific parameter bag.
    #[serde(default)]
    pub parameters: Value,
}

/// A compiled value mapper.
///
/// The set of kinds is sealed; dispatch is a match, selected once at
/// construction from the `type` tag.
#[derive(Debug, Clone)]
pub enum Mapper {
    /// Exact-match table; unmapped input passes through unchanged.
    Static { mapping: HashMap<String, String> },
    /// Compiled pattern plus capture group; non-match passes through.
    Regex { pattern: regex::Regex, capture: usize },
    /// XML location path plus zero-based result index.
    XPath { xpath: String, index: usize },
    /// JSON path plus zero-based result index.
    JsonPath { path: String, index: usize },
}

impl Mapper {
    /// Build a mapper from a configuration entry.
    ///
    /// Returns `None` for unknown kinds or uncompilable parameters; the
    /// caller drops the entry (lenient-parse policy).
    pub fn from_config(config: &MapperConfig) -> Option<Self> {
        let params = &config.parameters;
        match config.kind.as_str() {
            "static" => {
                let mapping = params
                    .get("mapping")
                    .and_then(Value::as_object)
                    .map(|map| {
                        map.iter()
                            .map(|(k, v)| (k.clone(), value_to_text(v)))
                            .collect()
                    })
                    .unwrap_or_default();
                Some(Self::Static { mapping })
            }
            "regex" | "regexp" => {
                let source = params.get("pattern").and_then(Value::as_str)?;
                let pattern = match regex::Regex::new(source) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Dropping regex mapper with invalid pattern '{}': {}", source, e);
                        return None;
                    }
                };
                let capture = params
                    .get("capture")
                    .and_then(Value::as_u64)
                    .unwrap_or(1) as usize;
                Some(Self::Regex { pattern, capture })
            }
            "xpath" => {
                let xpath = params.get("xpath").and_then(Value::as_str)?.to_string();
                let index = params.get("index").and_then(Value::as_u64).unwrap_or(0) as usize;
                Some(Self::XPath { xpath, index })
            }
            "jsonPath" | "jsonpath" => {
                let path = params
                    .get("jsonPath")
                    .or_else(|| params.get("path"))
                    .and_then(Value::as_str)?
                    .to_string();
                let index = params.get("index").and_then(Value::as_u64).unwrap_or(0) as usize;
                Some(Self::JsonPath { path, index })
            }
            other => {
                warn!("Dropping mapper with unknown type '{}'", other);
                None
            }
        }
    }

    /// Compile a mapper chain from configuration, dropping unusable entries.
    pub fn chain_from_configs(configs: &[MapperConfig]) -> Vec<Self> {
        configs.iter().filter_map(Self::from_config).collect()
    }

    /// Transform a text value.
    ///
    /// Total over all inputs: a non-matching or malformed input is returned
    /// unchanged, never an error.
    pub fn map(&self, input: &str) -> String {
        match self {
            Self::Static { mapping } => mapping
                .get(input)
                .cloned()
                .unwrap_or_else(|| input.to_string()),
            Self::Regex { pattern, capture } => pattern
                .captures(input)
                .and_then(|caps| caps.get(*capture))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| input.to_string()),
            Self::XPath { xpath, index } => xpath_select(input, xpath)
                .into_iter()
                .nth(*index)
                .unwrap_or_else(|| input.to_string()),
            Self::JsonPath { path, index } => json_select(input, path, *index)
                .unwrap_or_else(|| input.to_string()),
        }
    }
}

/// Apply an ordered mapper chain to a value.
pub fn apply_chain(mappers: &[Mapper], input: &str) -> String {
    mappers
        .iter()
        .fold(input.to_string(), |value, mapper| mapper.map(&value))
}

/// Render a JSON value as the text a mapper emits.
///
/// Strings yield their raw content; everything else is its JSON text form
/// (so an object result stays structured JSON rather than a debug dump).
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Evaluate a JSON path against a payload and pick the indexed result.
///
/// Supports the `$.a.b`, `a.b`, `a[0].b`, and `$[1]` shapes. A missing key,
/// bad index, or unparseable payload yields `None` (caller passes the input
/// through). When the selected value is an array, `index` picks an element
/// of it; otherwise only index 0 addresses the value itself.
fn json_select(input: &str, path: &str, index: usize) -> Option<String> {
    let json: Value = serde_json::from_str(input).ok()?;
    let selected = json_path_value(&json, path)?;

    let result = match selected {
        Value::Array(items) => items.get(index)?.clone(),
        other => {
            if index > 0 {
                return None;
            }
            other
        }
    };
    Some(value_to_text(&result))
}

/// Walk a dot/bracket path through a JSON value.
fn json_path_value(data: &Value, path: &str) -> Option<Value> {
    let trimmed = path.trim().trim_start_matches('$').trim_start_matches('.');
    if trimmed.is_empty() {
        return Some(data.clone());
    }

    let mut current = data;
    for part in trimmed.split('.') {
        let part = part.trim();
        if part.is_empty() {
            return None;
        }

        // Handle array notation name[idx] or bare [idx]
        let (key, indices) = split_brackets(part)?;
        if !key.is_empty() {
            current = current.as_object()?.get(key)?;
        }
        for idx in indices {
            current = current.as_array()?.get(idx)?;
        }
    }
    Some(current.clone())
}

/// Split `name[0][1]` into the key and its bracket indices.
fn split_brackets(part: &str) -> Option<(&str, Vec<usize>)> {
    let Some(bracket) = part.find('[') else {
        return Some((part, Vec::new()));
    };
    let key = &part[..bracket];
    let mut indices = Vec::new();
    let mut rest = &part[bracket..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let end = stripped.find(']')?;
        indices.push(stripped[..end].trim().parse().ok()?);
        rest = &stripped[end + 1..];
    }
    if !rest.is_empty() {
        return None;
    }
    Some((key, indices))
}

/// Evaluate a restricted XPath location path against an XML payload.
///
/// Supported: absolute child paths (`/a/b`), `*` wildcards, 1-based
/// positional predicates (`/a/b[2]`), and a final `@attr` or `text()` step.
/// Anything the subset cannot express, a parse failure, or no match yields
/// an empty result set and the input passes through.
fn xpath_select(input: &str, xpath: &str) -> Vec<String> {
    let Ok(doc) = roxmltree::Document::parse(input) else {
        return Vec::new();
    };

    let path = xpath.trim().trim_start_matches('/');
    if path.is_empty() {
        return Vec::new();
    }

    let mut steps: Vec<&str> = path.split('/').collect();
    let mut attr: Option<&str> = None;
    let mut want_text = false;
    if let Some(&last) = steps.last() {
        if let Some(name) = last.strip_prefix('@') {
            attr = Some(name);
            steps.pop();
        } else if last == "text()" {
            want_text = true;
            steps.pop();
        }
    }

    let mut nodes = vec![doc.root()];
    for step in steps {
        let (name, position) = match parse_step(step) {
            Some(parsed) => parsed,
            None => return Vec::new(),
        };
        let mut next = Vec::new();
        for node in nodes {
            let matches = node
                .children()
                .filter(|c| c.is_element() && (name == "*" || c.has_tag_name(name)));
            match position {
                Some(pos) => next.extend(matches.skip(pos - 1).take(1)),
                None => next.extend(matches),
            }
        }
        nodes = next;
        if nodes.is_empty() {
            return Vec::new();
        }
    }

    nodes
        .into_iter()
        .filter_map(|node| {
            if let Some(attr_name) = attr {
                node.attribute(attr_name).map(|v| v.to_string())
            } else if want_text {
                node.text().map(|t| t.trim().to_string())
            } else {
                Some(text_content(node))
            }
        })
        .collect()
}

/// Parse one location step `name` or `name[pos]` (1-based position).
fn parse_step(step: &str) -> Option<(&str, Option<usize>)> {
    match step.find('[') {
        None => Some((step, None)),
        Some(open) => {
            let close = step.find(']')?;
            if close != step.len() - 1 || close < open {
                return None;
            }
            let pos: usize = step[open + 1..close].trim().parse().ok()?;
            if pos == 0 {
                return None;
            }
            Some((&step[..open], Some(pos)))
        }
    }
}

/// Concatenated descendant text of an element, trimmed.
fn text_content(node: roxmltree::Node<'_, '_>) -> String {
    let mut out = String::new();
    for descendant in node.descendants() {
        if let Some(text) = descendant.text() {
            out.push_str(text);
        }
    }
    out.trim().to_string()
}
