//! GitHub-flavored markdown renderer.
//!
//! Layout:
//!
//! ```text
//! ## API Documentation
//!
//! <!-- markdownlint-disable -->
//! <details>
//! <summary>Variables</summary>
//!
//! ### Variables
//!
//! |Name|Type|
//! |---|---|
//! ...
//! </details>
//!
//! <!-- markdownlint-enable -->
//! ```

use super::cell::{format_cell, Collapse};
use crate::config::{FormatSettings, Settings};
use crate::document::{DocumentModel, Section};
use crate::model::Column;
use crate::render::Renderer;

pub struct MarkdownRenderer {
    heading_level: usize,
    heading: String,
    format: FormatSettings,
}

impl MarkdownRenderer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            heading_level: usize::from(settings.target_config.heading_level),
            heading: settings.target_config.heading.clone(),
            format: settings.format.clone(),
        }
    }

    fn collapse(&self, column: Column) -> Collapse {
        let enabled = match column {
            Column::Value => self.format.collapsible_long_values,
            Column::Type => self.format.collapsible_long_types,
            Column::Default => self.format.collapsible_long_defaults,
            Column::Description => self.format.collapsible_long_description,
            _ => false,
        };
        Collapse {
            enabled,
            threshold: self.format.collapsible_long_threshold,
        }
    }

    fn render_section(&self, section: &Section) -> String {
        let subheading = "#".repeat((self.heading_level + 1).min(6));
        let mut out = String::new();
        if self.format.collapsible_sections {
            out.push_str("<details>\n");
            out.push_str(&format!("<summary>{}</summary>\n\n", section.title));
        }
        out.push_str(&format!("{} {}\n\n", subheading, section.title));
        out.push_str(&self.render_table(section));
        if self.format.collapsible_sections {
            out.push_str("</details>\n");
        }
        out.push('\n');
        out
    }

    fn render_table(&self, section: &Section) -> String {
        let mut lines = Vec::with_capacity(section.rows.len() + 2);
        let header: Vec<&str> = section.columns.iter().map(|c| c.title()).collect();
        lines.push(format!("|{}|", header.join("|")));
        lines.push(format!("|{}|", vec!["---"; section.columns.len()].join("|")));
        for row in &section.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&section.columns)
                .map(|(cell, &column)| format_cell(cell, self.collapse(column)))
                .collect();
            lines.push(format!("|{}|", cells.join("|")));
        }
        let mut table = lines.join("\n");
        table.push('\n');
        table
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, doc: &DocumentModel) -> String {
        let heading = "#".repeat(self.heading_level);
        let mut output = format!("{} {}\n\n", heading, self.heading);
        output.push_str("<!-- markdownlint-disable -->\n");
        for section in &doc.sections {
            output.push_str(&self.render_section(section));
        }
        output.push_str("<!-- markdownlint-enable -->\n");
        output
    }
}
