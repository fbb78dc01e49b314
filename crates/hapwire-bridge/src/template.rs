//! Restricted placeholder templating for write URLs and bodies.
//!
//! Templates support exactly three placeholder forms against a fixed,
//! enumerable variable set:
//!
//! - `{value}` — case-insensitive, the mapped write value
//! - `{0}`, `{1}`, … — positional arguments
//! - `{name}` — named arguments
//!
//! `{{` and `}}` emit literal braces. An unresolved placeholder or an
//! unterminated brace fails rendering; a write template must never
//! substitute garbage or evaluate configuration-supplied expressions.

use hapwire_core::{Error, Result};
use std::collections::HashMap;

/// Variables available to a template rendering.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    positional: Vec<String>,
    named: HashMap<String, String>,
}

impl RenderContext {
    /// Context for a write resolution: `{value}`/`{0}` is the mapped value,
    /// `{raw}`/`{1}` the original unmapped value.
    pub fn for_write(mapped: &str, raw: &str) -> Self {
        let mut named = HashMap::new();
        named.insert("value".to_string(), mapped.to_string());
        named.insert("raw".to_string(), raw.to_string());
        Self {
            positional: vec![mapped.to_string(), raw.to_string()],
            named,
        }
    }

    /// Add or replace a named variable.
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        if key.eq_ignore_ascii_case("value") {
            return self.named.get("value").map(String::as_str);
        }
        if let Ok(index) = key.parse::<usize>() {
            return self.positional.get(index).map(String::as_str);
        }
        self.named.get(key).map(String::as_str)
    }
}

/// Render a template against a context.
///
/// Fails with `Error::Template` on unresolved placeholders, empty
/// placeholders, or unbalanced braces.
pub fn render(template: &str, context: &RenderContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut key = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    key.push(inner);
                }
                if !closed {
                    return Err(Error::template(format!(
                        "unterminated placeholder in template '{}'",
                        template
                    )));
                }
                if key.is_empty() {
                    return Err(Error::template(format!(
                        "empty placeholder in template '{}'",
                        template
                    )));
                }
                match context.lookup(key.trim()) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(Error::template(format!(
                            "unresolved placeholder '{{{}}}' in template '{}'",
                            key, template
                        )));
                    }
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(Error::template(format!(
                        "unbalanced '}}' in template '{}'",
                        template
                    )));
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RenderContext {
        RenderContext::for_write("1", "true")
    }

    #[test]
    fn test_value_placeholder() {
        assert_eq!(render("state={value}", &ctx()).unwrap(), "state=1");
    }

    #[test]
    fn test_value_placeholder_is_case_insensitive() {
        assert_eq!(render("{VALUE}/{Value}", &ctx()).unwrap(), "1/1");
    }

    #[test]
    fn test_positional_placeholders() {
        assert_eq!(render("{0} from {1}", &ctx()).unwrap(), "1 from true");
    }

    #[test]
    fn test_named_placeholders() {
        let context = ctx().with_named("device", "relay-2");
        assert_eq!(
            render("http://host/{device}?v={raw}", &context).unwrap(),
            "http://host/relay-2?v=true"
        );
    }

    #[test]
    fn test_brace_escapes() {
        assert_eq!(
            render(r#"{{"power": {value}}}"#, &ctx()).unwrap(),
            r#"{"power": 1}"#
        );
    }

    #[test]
    fn test_no_placeholders_is_identity() {
        assert_eq!(render("plain body", &ctx()).unwrap(), "plain body");
    }

    #[test]
    fn test_unresolved_placeholder_fails() {
        let err = render("{nope}", &ctx()).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_out_of_range_positional_fails() {
        assert!(render("{7}", &ctx()).is_err());
    }

    #[test]
    fn test_unterminated_placeholder_fails() {
        assert!(render("{value", &ctx()).is_err());
    }

    #[test]
    fn test_stray_closing_brace_fails() {
        assert!(render("oops}", &ctx()).is_err());
    }

    #[test]
    fn test_empty_placeholder_fails() {
        assert!(render("{}", &ctx()).is_err());
    }
}
