//! tofu-docs: keep module reference documentation in sync with the code.
//!
//! The pipeline runs strictly forward:
//!
//! 1. [`parser`] extracts entities from the module's `*.tf` files.
//! 2. [`replace`] applies the configured substitution rules to their cells.
//! 3. [`document`] filters, orders and selects columns.
//! 4. [`render`] turns the document model into Markdown.
//! 5. [`merge`] places the result between the markers of the target file.
//!
//! [`generate`] covers steps 1 to 4, [`run`] adds the merge and write-back.

pub mod config;
pub mod document;
pub mod error;
pub mod links;
pub mod merge;
pub mod model;
pub mod parser;
pub mod render;
pub mod replace;
pub mod target;

pub use config::Settings;
pub use error::{Error, Result};

use document::Row;
use replace::Substitutions;
use std::io::Write;
use std::path::Path;
use target::Target;

/// Result of a full run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub target: Target,
    /// The target content differs from what was there before.
    pub changed: bool,
    /// The target file did not exist before this run.
    pub created: bool,
}

/// Render the documentation section for the module at `module_path`.
///
/// # Errors
///
/// Any extraction or substitution error. Nothing is written.
pub fn generate(module_path: &Path, settings: &Settings) -> Result<String> {
    let substitutions = Substitutions::compile(&settings.replace)?;
    let extraction = parser::extract_module(module_path, settings.format.skip_auto)?;

    let mut rows: Vec<Row> = extraction
        .entities
        .into_iter()
        .map(|entity| Row::new(entity, &settings.format))
        .collect();
    if !substitutions.is_empty() {
        tracing::debug!("Applying {} replace rules", settings.replace.len());
        for row in &mut rows {
            row.substitute(&substitutions);
        }
    }

    let doc = document::build(rows, &settings.format);
    if doc.is_empty() {
        tracing::info!("Nothing to document in {}", module_path.display());
    }
    Ok(render::create_renderer(settings).render(&doc))
}

/// Generate the section and merge it into the configured target.
///
/// The target is read once and written at most once, after every stage has
/// succeeded.
///
/// # Errors
///
/// Any pipeline, merge or I/O error.
pub fn run(module_path: &Path, settings: &Settings) -> Result<RunOutcome> {
    tracing::info!("Documenting module {}", module_path.display());
    let rendered = generate(module_path, settings)?;
    let target = Target::resolve(&settings.target, module_path);

    let (changed, created) = match &target {
        Target::Stdout => {
            tracing::info!("Writing to stdout");
            std::io::stdout()
                .write_all(rendered.as_bytes())
                .map_err(|e| Error::io("stdout", e))?;
            (false, false)
        }
        Target::Stderr => {
            tracing::info!("Writing to stderr");
            std::io::stderr()
                .write_all(rendered.as_bytes())
                .map_err(|e| Error::io("stderr", e))?;
            (false, false)
        }
        Target::File(path) => {
            let existing = target::read(path)?;
            let outcome = merge::merge(
                existing.as_deref(),
                &rendered,
                &settings.target_config,
                &module_name(module_path),
                path,
            )?;
            if outcome.changed {
                target::write(path, &outcome.content)?;
                if outcome.created {
                    tracing::warn!("Created {}", path.display());
                } else {
                    tracing::warn!("Documentation was changed in {}", path.display());
                }
            } else {
                tracing::info!("{} is up to date", path.display());
            }
            (outcome.changed, outcome.created)
        }
    };

    Ok(RunOutcome {
        target,
        changed,
        created,
    })
}

/// Directory name of the module, used for `{module}` in `empty_header`.
fn module_name(module_path: &Path) -> String {
    module_path
        .canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(module_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
