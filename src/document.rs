//! Document model: filtered, ordered, render-ready tables per category.

use crate::config::{FormatSettings, SortOrder};
use crate::links;
use crate::model::{Category, Cell, Column, Entity};
use crate::replace::Substitutions;
use std::cmp::Ordering;
use std::collections::BTreeMap;

static EMPTY_CELL: Cell = Cell::Empty;

/// One entity with its cells, before filtering and ordering.
#[derive(Debug, Clone)]
pub struct Row {
    pub entity: Entity,
    pub cells: BTreeMap<Column, Cell>,
}

impl Row {
    /// Derive the cells of every column declared for the entity's category.
    pub fn new(entity: Entity, format: &FormatSettings) -> Self {
        let mut cells = BTreeMap::new();
        for &column in entity.category.columns() {
            cells.insert(column, cell_for(&entity, column, format));
        }
        Self { entity, cells }
    }

    pub fn cell(&self, column: Column) -> &Cell {
        self.cells.get(&column).unwrap_or(&EMPTY_CELL)
    }

    /// Run the replacement rules over every replaceable cell.
    pub fn substitute(&mut self, substitutions: &Substitutions) {
        for (&column, cell) in &mut self.cells {
            substitutions.apply_cell(self.entity.category, column, cell);
        }
    }
}

fn cell_for(entity: &Entity, column: Column, format: &FormatSettings) -> Cell {
    let resource_type = entity.resource_type().unwrap_or_default();
    match column {
        Column::Name => {
            let text = if entity.category == Category::Resource && !format.add_resource_identifier {
                resource_type.to_owned()
            } else {
                entity.identifier.clone()
            };
            Cell::Link {
                text,
                href: links::source_href(&entity.source_file, entity.line),
            }
        }
        Column::Provider => Cell::text(links::provider_of(resource_type)),
        Column::Documentation => match links::split_resource_type(resource_type) {
            Some((_, name)) => match links::registry_url(resource_type) {
                Some(url) => Cell::Markup(links::markdown_link(name, &url)),
                None => Cell::Empty,
            },
            None => Cell::Empty,
        },
        Column::Type => Cell::code(entity.type_expression.as_deref()),
        Column::Description => Cell::text(entity.description.as_deref()),
        Column::Default if entity.required => Cell::Markup("**required**".to_owned()),
        Column::Default => Cell::code(entity.default_value.as_deref()),
        Column::Value => Cell::code(entity.value.as_deref()),
        Column::Validation => Cell::conditions(&entity.validations),
        Column::Precondition => Cell::conditions(&entity.preconditions),
        Column::Postcondition => Cell::conditions(&entity.postconditions),
    }
}

/// One rendered table.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub category: Category,
    pub title: String,
    pub columns: Vec<Column>,
    /// One entry per row, aligned with `columns`.
    pub rows: Vec<Vec<Cell>>,
}

/// The finalized, render-ready document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentModel {
    pub sections: Vec<Section>,
}

impl DocumentModel {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

fn included(category: Category, format: &FormatSettings) -> bool {
    match category {
        Category::Resource => format.include_resources,
        Category::Local => format.include_locals,
        Category::Variable => format.include_variables,
        Category::Output => format.include_outputs,
    }
}

/// Apply inclusion, validation policy, ordering and column selection.
pub fn build(rows: Vec<Row>, format: &FormatSettings) -> DocumentModel {
    let mut main: BTreeMap<Category, Vec<Row>> = BTreeMap::new();
    let mut validation: BTreeMap<Category, Vec<Row>> = BTreeMap::new();
    let mut removed = 0;

    for row in rows {
        let category = row.entity.category;
        if !included(category, format) {
            continue;
        }
        if row.entity.is_validation() {
            if format.validation_remove {
                removed += 1;
                continue;
            }
            if format.validation_separate {
                validation.entry(category).or_default().push(row);
                continue;
            }
        }
        main.entry(category).or_default().push(row);
    }
    if removed > 0 {
        tracing::warn!("Removed {removed} validation entities");
    }

    let mut sections = Vec::new();
    for category in Category::ALL {
        if let Some(rows) = main.remove(&category) {
            sections.push(section(category, category.title(), rows, format));
        }
    }
    for category in Category::ALL {
        if let Some(rows) = validation.remove(&category) {
            sections.push(section(category, category.validation_title(), rows, format));
        }
    }
    DocumentModel { sections }
}

fn section(category: Category, title: &str, mut rows: Vec<Row>, format: &FormatSettings) -> Section {
    let required_first = category == Category::Variable && format.required_variables_first;
    rows.sort_by(|a, b| {
        let group = if required_first {
            b.entity.required.cmp(&a.entity.required)
        } else {
            Ordering::Equal
        };
        group.then_with(|| compare(&a.entity, &b.entity, format.sort_order))
    });

    let columns: Vec<Column> = category
        .columns()
        .iter()
        .copied()
        .filter(|&c| c != Column::Value || category != Category::Output || format.add_output_value)
        .filter(|&c| !format.remove_empty_columns || rows.iter().any(|r| !r.cell(c).is_empty()))
        .collect();

    let rows = rows
        .iter()
        .map(|row| columns.iter().map(|&c| row.cell(c).clone()).collect())
        .collect();

    Section {
        category,
        title: title.to_owned(),
        columns,
        rows,
    }
}

fn compare(a: &Entity, b: &Entity, order: SortOrder) -> Ordering {
    match order {
        SortOrder::AlphaAsc => a
            .identifier
            .cmp(&b.identifier)
            .then_with(|| a.source_file.cmp(&b.source_file))
            .then_with(|| a.line.cmp(&b.line)),
    }
}
