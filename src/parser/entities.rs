//! Block → entity conversion for the four documented categories.

use super::fallback;
use super::hcl::{self, Attribute, Block, Body};
use super::ExtractionWarning;
use crate::model::{Category, Condition, Entity};
use std::path::Path;

/// Top-level block kinds that are valid but not documented.
const IGNORED_KINDS: &[&str] = &[
    "data",
    "module",
    "provider",
    "terraform",
    "moved",
    "import",
    "removed",
    "check",
];

/// Entities and warnings from one file.
#[derive(Debug, Default)]
pub struct FileEntities {
    pub entities: Vec<Entity>,
    pub warnings: Vec<ExtractionWarning>,
}

impl FileEntities {
    fn warn(&mut self, source_file: &Path, line: usize, message: impl Into<String>) {
        self.warnings.push(ExtractionWarning {
            file: source_file.to_path_buf(),
            line,
            message: message.into(),
        });
    }
}

/// Attribute lookup: tokenizer results first, fallback recoveries second.
struct Attrs<'a> {
    body: &'a Body,
    recovered: Vec<Attribute>,
}

impl<'a> Attrs<'a> {
    fn new(body: &'a Body, source_file: &Path, out: &mut FileEntities) -> Self {
        let (recovered, remaining) = fallback::recover_attributes(&body.unresolved);
        for item in remaining {
            out.warn(
                source_file,
                item.line,
                format!("skipped unrecognized construct `{}`", first_line(&item.text)),
            );
        }
        Self { body, recovered }
    }

    fn get(&self, name: &str) -> Option<&Attribute> {
        self.body
            .attribute(name)
            .or_else(|| self.recovered.iter().find(|a| a.name == name))
    }

    fn expr(&self, name: &str) -> Option<&str> {
        self.get(name).map(|a| a.expr.as_str())
    }

    fn text(&self, name: &str) -> Option<String> {
        self.expr(name).map(hcl::literal_text)
    }

    fn flag(&self, name: &str) -> bool {
        self.expr(name) == Some("true")
    }

    /// Tokenized and recovered attributes together, in source order.
    fn all(&self) -> Vec<&Attribute> {
        let mut all: Vec<&Attribute> = self.body.attributes.iter().chain(&self.recovered).collect();
        all.sort_by_key(|a| a.line);
        all
    }
}

/// Convert the blocks of one tokenized file into entities.
pub fn collect(file: &hcl::File, source_file: &Path) -> FileEntities {
    let mut out = FileEntities::default();

    for item in &file.unresolved {
        out.warn(
            source_file,
            item.line,
            format!("skipped unrecognized construct `{}`", first_line(&item.text)),
        );
    }

    for block in &file.blocks {
        match block.kind.as_str() {
            "variable" => {
                if let Some(name) = single_label(block, 1, source_file, &mut out) {
                    let entity = variable(block, &name[0], source_file, &mut out);
                    out.entities.push(entity);
                }
            }
            "output" => {
                if let Some(name) = single_label(block, 1, source_file, &mut out) {
                    let entity = output(block, &name[0], source_file, &mut out);
                    out.entities.push(entity);
                }
            }
            "resource" => {
                if let Some(labels) = single_label(block, 2, source_file, &mut out) {
                    let entity = resource(block, &labels[0], &labels[1], source_file, &mut out);
                    out.entities.push(entity);
                }
            }
            "locals" => {
                let attrs = Attrs::new(&block.body, source_file, &mut out);
                for attr in attrs.all() {
                    let mut entity = Entity::new(Category::Local, attr.name.clone());
                    entity.value = Some(attr.expr.clone());
                    entity.source_file = source_file.to_path_buf();
                    entity.line = attr.line;
                    out.entities.push(entity);
                }
            }
            kind if IGNORED_KINDS.contains(&kind) => {
                tracing::trace!("ignoring {} block at {}:{}", kind, source_file.display(), block.line);
            }
            kind => out.warn(
                source_file,
                block.line,
                format!("skipped unknown block kind `{kind}`"),
            ),
        }
    }

    out
}

/// Labels of a block that must carry exactly `count` of them.
fn single_label<'b>(
    block: &'b Block,
    count: usize,
    source_file: &Path,
    out: &mut FileEntities,
) -> Option<&'b [String]> {
    if block.labels.len() == count {
        Some(block.labels.as_slice())
    } else {
        out.warn(
            source_file,
            block.line,
            format!(
                "skipped `{}` block with {} label(s), expected {}",
                block.kind,
                block.labels.len(),
                count
            ),
        );
        None
    }
}

fn variable(block: &Block, name: &str, source_file: &Path, out: &mut FileEntities) -> Entity {
    let attrs = Attrs::new(&block.body, source_file, out);
    let mut entity = located(Category::Variable, name, block, source_file);
    entity.type_expression = Some(attrs.expr("type").unwrap_or("any").to_string());
    entity.default_value = attrs.expr("default").map(str::to_string);
    entity.required = entity.default_value.is_none();
    entity.description = attrs.text("description");
    entity.sensitive = attrs.flag("sensitive");
    if let Some(nullable) = attrs.expr("nullable") {
        entity
            .attributes
            .insert("nullable".to_string(), nullable.to_string());
    }
    entity.validations = conditions(&block.body, "validation", source_file, out);
    entity
}

fn output(block: &Block, name: &str, source_file: &Path, out: &mut FileEntities) -> Entity {
    let attrs = Attrs::new(&block.body, source_file, out);
    let mut entity = located(Category::Output, name, block, source_file);
    entity.value = attrs.expr("value").map(str::to_string);
    entity.description = attrs.text("description");
    entity.sensitive = attrs.flag("sensitive");
    if let Some(depends_on) = attrs.expr("depends_on") {
        entity
            .attributes
            .insert("depends_on".to_string(), depends_on.to_string());
    }
    entity.preconditions = conditions(&block.body, "precondition", source_file, out);
    entity.postconditions = conditions(&block.body, "postcondition", source_file, out);
    entity
}

fn resource(
    block: &Block,
    resource_type: &str,
    name: &str,
    source_file: &Path,
    out: &mut FileEntities,
) -> Entity {
    let attrs = Attrs::new(&block.body, source_file, out);
    let identifier = format!("{resource_type}.{name}");
    let mut entity = located(Category::Resource, &identifier, block, source_file);
    entity
        .attributes
        .insert("resource_type".to_string(), resource_type.to_string());
    entity
        .attributes
        .insert("resource_name".to_string(), name.to_string());
    for key in ["provider", "count", "for_each"] {
        if let Some(expr) = attrs.expr(key) {
            entity.attributes.insert(key.to_string(), expr.to_string());
        }
    }
    entity
}

fn located(category: Category, identifier: &str, block: &Block, source_file: &Path) -> Entity {
    let mut entity = Entity::new(category, identifier);
    entity.source_file = source_file.to_path_buf();
    entity.line = block.line;
    entity
}

fn conditions(body: &Body, kind: &str, source_file: &Path, out: &mut FileEntities) -> Vec<Condition> {
    body.blocks_of(kind)
        .map(|block| {
            let attrs = Attrs::new(&block.body, source_file, out);
            Condition {
                condition: attrs.expr("condition").unwrap_or_default().to_string(),
                error_message: attrs.text("error_message").unwrap_or_default(),
            }
        })
        .collect()
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}
