//! Entities extracted from module sources and the cells they render to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Kind of declaration an entity was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Resource,
    Local,
    Variable,
    Output,
}

impl Category {
    /// Rendering order of the category sections.
    pub const ALL: [Category; 4] = [
        Category::Resource,
        Category::Local,
        Category::Variable,
        Category::Output,
    ];

    /// Ordered column declaration for this category's table.
    pub fn columns(self) -> &'static [Column] {
        match self {
            Category::Resource => &[Column::Name, Column::Provider, Column::Documentation],
            Category::Local => &[Column::Name],
            Category::Variable => &[
                Column::Name,
                Column::Type,
                Column::Description,
                Column::Default,
                Column::Validation,
            ],
            Category::Output => &[
                Column::Name,
                Column::Description,
                Column::Value,
                Column::Precondition,
                Column::Postcondition,
            ],
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::Resource => "Resources",
            Category::Local => "Locals",
            Category::Variable => "Variables",
            Category::Output => "Outputs",
        }
    }

    /// Title of the trailing section holding separated validation entities.
    pub fn validation_title(self) -> &'static str {
        match self {
            Category::Variable => "Variable Validations",
            _ => "Output Validations",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Resource => "resource",
            Category::Local => "local",
            Category::Variable => "variable",
            Category::Output => "output",
        };
        f.write_str(name)
    }
}

/// A table column. Which columns a category has is declared by [`Category::columns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Name,
    Provider,
    Documentation,
    Type,
    Description,
    Default,
    Value,
    Validation,
    Precondition,
    Postcondition,
}

impl Column {
    pub fn title(self) -> &'static str {
        match self {
            Column::Name => "Name",
            Column::Provider => "Provider",
            Column::Documentation => "Documentation",
            Column::Type => "Type",
            Column::Description => "Description",
            Column::Default => "Default",
            Column::Value => "Value",
            Column::Validation => "Validation",
            Column::Precondition => "Precondition",
            Column::Postcondition => "Postcondition",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title().to_lowercase())
    }
}

/// A `validation`, `precondition` or `postcondition` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub condition: String,
    pub error_message: String,
}

/// One declared construct in the module.
///
/// Entities are never merged: two declarations with the same category and
/// identifier are reported as an error by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub category: Category,
    /// Declared name; `type.name` for resources.
    pub identifier: String,
    pub type_expression: Option<String>,
    pub default_value: Option<String>,
    pub description: Option<String>,
    /// Output value or local expression, as source text. Never evaluated.
    pub value: Option<String>,
    pub sensitive: bool,
    pub required: bool,
    /// Path relative to the module root.
    pub source_file: PathBuf,
    /// 1-based line of the declaration.
    pub line: usize,
    pub validations: Vec<Condition>,
    pub preconditions: Vec<Condition>,
    pub postconditions: Vec<Condition>,
    /// Category-specific extras (e.g. `resource_type`, `provider`).
    pub attributes: BTreeMap<String, String>,
}

impl Entity {
    pub fn new(category: Category, identifier: impl Into<String>) -> Self {
        Self {
            category,
            identifier: identifier.into(),
            type_expression: None,
            default_value: None,
            description: None,
            value: None,
            sensitive: false,
            required: false,
            source_file: PathBuf::new(),
            line: 0,
            validations: Vec::new(),
            preconditions: Vec::new(),
            postconditions: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Outputs and variables named `validation_*` / `validate_*` only exist to
    /// run checks and are filtered by the validation policy.
    pub fn is_validation(&self) -> bool {
        matches!(self.category, Category::Output | Category::Variable)
            && (self.identifier.starts_with("validation_")
                || self.identifier.starts_with("validate_"))
    }

    /// Resource type (`aws_instance` for `aws_instance.web`).
    pub fn resource_type(&self) -> Option<&str> {
        self.attributes.get("resource_type").map(String::as_str)
    }
}

/// Content of one table cell before Markdown formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    /// Link text and target.
    Link { text: String, href: String },
    /// Source text shown verbatim (types, defaults, values).
    Code(String),
    /// Free text (descriptions).
    Text(String),
    /// One entry per condition block.
    List(Vec<String>),
    /// Already-formatted Markdown.
    Markup(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Optional source text as a code cell.
    pub fn code(value: Option<&str>) -> Self {
        value.map_or(Cell::Empty, |v| Cell::Code(v.to_string()))
    }

    /// Optional free text as a text cell; blank text counts as absent.
    pub fn text(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Cell::Text(v.to_string()),
            _ => Cell::Empty,
        }
    }

    pub fn conditions(conditions: &[Condition]) -> Self {
        if conditions.is_empty() {
            Cell::Empty
        } else {
            Cell::List(conditions.iter().map(|c| c.error_message.clone()).collect())
        }
    }

    /// Apply `f` to every piece of user-facing text the cell holds.
    pub fn map_text(&mut self, mut f: impl FnMut(&str) -> String) {
        match self {
            Cell::Empty | Cell::Link { .. } => {}
            Cell::Code(s) | Cell::Text(s) | Cell::Markup(s) => *s = f(s),
            Cell::List(items) => {
                for item in items.iter_mut() {
                    *item = f(item);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_naming_convention() {
        let mut e = Entity::new(Category::Output, "validate_network");
        assert!(e.is_validation());
        e.identifier = "validation_cidr".to_string();
        assert!(e.is_validation());
        e.identifier = "vpc_id".to_string();
        assert!(!e.is_validation());

        let r = Entity::new(Category::Resource, "validate_x.this");
        assert!(!r.is_validation());
    }

    #[test]
    fn every_category_starts_with_name() {
        for category in Category::ALL {
            assert_eq!(category.columns()[0], Column::Name);
        }
    }

    #[test]
    fn blank_text_is_empty() {
        assert!(Cell::text(Some("  ")).is_empty());
        assert!(Cell::text(None).is_empty());
        assert!(!Cell::text(Some("x")).is_empty());
        assert!(Cell::List(vec![]).is_empty());
    }

    #[test]
    fn map_text_skips_links() {
        let mut link = Cell::Link {
            text: "a".to_string(),
            href: "/a".to_string(),
        };
        link.map_text(|s| s.to_uppercase());
        assert_eq!(
            link,
            Cell::Link {
                text: "a".to_string(),
                href: "/a".to_string()
            }
        );

        let mut list = Cell::List(vec!["a".to_string(), "b".to_string()]);
        list.map_text(|s| s.to_uppercase());
        assert_eq!(list, Cell::List(vec!["A".to_string(), "B".to_string()]));
    }
}
