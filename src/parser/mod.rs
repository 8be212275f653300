//! Entity extraction from a module directory.
//!
//! Each `*.tf` file is tokenized by [`hcl`]; constructs the tokenizer leaves
//! unresolved go through [`fallback`], and what is still unrecognized becomes
//! an [`ExtractionWarning`]. Blocks are then turned into entities by
//! [`entities`].

pub mod entities;
pub mod fallback;
pub mod hcl;

use crate::error::{Error, Result};
use crate::model::{Category, Entity};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A construct that was skipped inside an otherwise parseable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionWarning {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

/// Everything extracted from one module.
#[derive(Debug, Default)]
pub struct Extraction {
    pub entities: Vec<Entity>,
    pub warnings: Vec<ExtractionWarning>,
}

/// Whether a file name follows the auto-generated naming convention.
pub fn is_auto_generated(file_name: &str) -> bool {
    file_name.starts_with("auto.") || file_name.contains(".auto.")
}

/// Extract all entities declared in the `*.tf` files of `module_path`.
///
/// Files are read in name order. Any unreadable file, unclosed construct or
/// duplicate declaration aborts the whole extraction.
pub fn extract_module(module_path: &Path, skip_auto: bool) -> Result<Extraction> {
    if !module_path.is_dir() {
        return Err(Error::Extraction {
            path: module_path.to_path_buf(),
            line: 0,
            message: "module path is not a directory".to_string(),
        });
    }

    let pattern = format!(
        "{}/*.tf",
        glob::Pattern::escape(&module_path.to_string_lossy())
    );
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| Error::Extraction {
            path: module_path.to_path_buf(),
            line: 0,
            message: format!("cannot list source files: {e}"),
        })?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let mut extraction = Extraction::default();
    let mut seen: HashMap<(Category, String), PathBuf> = HashMap::new();

    for path in &files {
        let rel = path.strip_prefix(module_path).unwrap_or(path).to_path_buf();
        let file_name = rel.to_string_lossy();
        if skip_auto && is_auto_generated(&file_name) {
            tracing::info!("Skipping auto-generated file {}", rel.display());
            continue;
        }
        tracing::info!("Parsing {}", rel.display());

        let bytes = fs::read(path).map_err(|e| Error::Extraction {
            path: path.clone(),
            line: 0,
            message: format!("cannot read file: {e}"),
        })?;
        let content = String::from_utf8(bytes).map_err(|e| Error::Extraction {
            path: path.clone(),
            line: 0,
            message: format!("not valid UTF-8: {e}"),
        })?;

        let parsed = parse_source(&rel, &content)?;

        for entity in parsed.entities {
            let key = (entity.category, entity.identifier.clone());
            if let Some(first) = seen.get(&key) {
                return Err(Error::Extraction {
                    path: entity.source_file.clone(),
                    line: entity.line,
                    message: format!(
                        "duplicate {} `{}` (first declared in {})",
                        entity.category,
                        entity.identifier,
                        first.display()
                    ),
                });
            }
            seen.insert(key, entity.source_file.clone());
            extraction.entities.push(entity);
        }
        extraction.warnings.extend(parsed.warnings);
    }

    for warning in &extraction.warnings {
        tracing::debug!(
            "{}:{}: {}",
            warning.file.display(),
            warning.line,
            warning.message
        );
    }
    tracing::debug!(
        "Extracted {} entities from {} files",
        extraction.entities.len(),
        files.len()
    );

    Ok(extraction)
}

/// Extract entities from the content of one file. `rel_path` is the path
/// recorded on the entities and used in error messages.
pub fn parse_source(rel_path: &Path, content: &str) -> Result<Extraction> {
    let file = hcl::parse(content).map_err(|e| Error::Extraction {
        path: rel_path.to_path_buf(),
        line: e.line,
        message: e.message,
    })?;
    let collected = entities::collect(&file, rel_path);
    Ok(Extraction {
        entities: collected.entities,
        warnings: collected.warnings,
    })
}
