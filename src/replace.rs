//! Ordered regex substitutions on extracted cell text.
//!
//! Replacement templates use the familiar backslash syntax: `\1` and
//! `\g<name>` reference capture groups, `{name}` references the rule's
//! `variables`. Variables are resolved once per rule when the rule is
//! compiled, so a variable value is always inserted literally.

use crate::error::{Error, Result};
use crate::model::{Category, Cell, Column};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One configured replacement rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceRule {
    pub pattern: String,
    pub replacement: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    pub category: Category,
    pub column: Column,
}

/// A rule ready to apply.
#[derive(Debug)]
struct Compiled {
    regex: Regex,
    /// Template in `regex` expansion syntax.
    template: String,
    category: Category,
    column: Column,
}

/// Compiled replacement rules, applied in declaration order.
#[derive(Debug, Default)]
pub struct Substitutions {
    rules: Vec<Compiled>,
}

impl Substitutions {
    /// Compile every rule.
    ///
    /// # Errors
    ///
    /// [`Error::Pattern`] (with the 1-based rule index) when a pattern does
    /// not compile; [`Error::Config`] when a rule targets a column its category
    /// does not render, or the Name column.
    pub fn compile(rules: &[ReplaceRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            let index = i + 1;
            if rule.column == Column::Name || !rule.category.columns().contains(&rule.column) {
                return Err(Error::config(
                    format!("replace[{index}].column"),
                    format!(
                        "`{}` is not a replaceable column of `{}`",
                        rule.column, rule.category
                    ),
                ));
            }
            let regex = Regex::new(&rule.pattern).map_err(|source| Error::Pattern {
                index,
                pattern: rule.pattern.clone(),
                source,
            })?;
            compiled.push(Compiled {
                regex,
                template: expand_template(&rule.replacement, &rule.variables),
                category: rule.category,
                column: rule.column,
            });
        }
        Ok(Self { rules: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule targeting `(category, column)` to `text`, in order.
    pub fn apply(&self, category: Category, column: Column, text: &str) -> String {
        let mut out = text.to_owned();
        for rule in self
            .rules
            .iter()
            .filter(|r| r.category == category && r.column == column)
        {
            out = rule.regex.replace_all(&out, rule.template.as_str()).into_owned();
        }
        out
    }

    /// Apply the rules to one cell.
    pub fn apply_cell(&self, category: Category, column: Column, cell: &mut Cell) {
        if self
            .rules
            .iter()
            .any(|r| r.category == category && r.column == column)
        {
            cell.map_text(|text| self.apply(category, column, text));
        }
    }
}

/// Convert a backslash-style template into `regex` expansion syntax,
/// inlining `{name}` variables as literal text.
fn expand_template(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(c) = rest.chars().next() {
        match c {
            '\\' => {
                let after = &rest[1..];
                let digits = after.bytes().take_while(u8::is_ascii_digit).count();
                if digits > 0 {
                    out.push_str(&format!("${{{}}}", &after[..digits]));
                    rest = &after[digits..];
                } else if let Some(name) = after
                    .strip_prefix("g<")
                    .and_then(|s| s.split_once('>'))
                    .map(|(name, _)| name)
                    .filter(|name| !name.is_empty())
                {
                    out.push_str(&format!("${{{name}}}"));
                    rest = &after[name.len() + 3..];
                } else {
                    match after.chars().next() {
                        Some('\\') => out.push('\\'),
                        Some('n') => out.push('\n'),
                        Some('t') => out.push('\t'),
                        Some(other) => {
                            out.push('\\');
                            push_literal(&mut out, &other.to_string());
                        }
                        None => out.push('\\'),
                    }
                    let skip = after.chars().next().map_or(0, char::len_utf8);
                    rest = &after[skip..];
                }
            }
            '{' => {
                let var = rest[1..]
                    .split_once('}')
                    .and_then(|(name, _)| variables.get(name).map(|value| (name, value)));
                match var {
                    Some((name, value)) => {
                        push_literal(&mut out, value);
                        rest = &rest[name.len() + 2..];
                    }
                    None => {
                        out.push('{');
                        rest = &rest[1..];
                    }
                }
            }
            _ => {
                push_literal(&mut out, &c.to_string());
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    out
}

fn push_literal(out: &mut String, text: &str) {
    out.push_str(&text.replace('$', "$$"));
}
