//! Pattern-based recovery for constructs the tokenizer leaves unresolved.
//!
//! Only attribute-shaped text is recovered: legacy quoted keys
//! (`"description" = "..."`) and colon assignments (`type: string`).
//! Everything else stays unresolved and is reported as a warning by the caller.

use super::hcl::{Attribute, Unresolved};
use regex::Regex;
use std::sync::LazyLock;

static RE_LOOSE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^"?([A-Za-z_][A-Za-z0-9_-]*)"?\s*[:=]\s*([^=\s].*?)\s*,?$"#).unwrap()
});

/// Recover an attribute from one unresolved construct.
pub fn recover_attribute(item: &Unresolved) -> Option<Attribute> {
    let caps = RE_LOOSE_ATTRIBUTE.captures(item.text.trim())?;
    Some(Attribute {
        name: caps[1].to_string(),
        expr: caps[2].to_string(),
        line: item.line,
    })
}

/// Split unresolved constructs into recovered attributes and the remainder.
pub fn recover_attributes(items: &[Unresolved]) -> (Vec<Attribute>, Vec<Unresolved>) {
    let mut recovered = Vec::new();
    let mut remaining = Vec::new();
    for item in items {
        match recover_attribute(item) {
            Some(attr) => recovered.push(attr),
            None => remaining.push(item.clone()),
        }
    }
    (recovered, remaining)
}
