//! Marker-based merge of the rendered section into the target document.
//!
//! The engine owns everything strictly between the start and end marker
//! lines. Bytes outside that region, the marker lines included, are never
//! rewritten.

use crate::config::{InsertPosition, TargetConfig};
use crate::error::{Error, Result};
use std::path::Path;

/// New target content and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub content: String,
    pub changed: bool,
    /// The target did not exist and was seeded from `empty_header`.
    pub created: bool,
}

/// Byte ranges of the marker lines.
struct Markers {
    /// End of the start marker line, newline included.
    region_start: usize,
    /// Start of the end marker line.
    region_end: usize,
}

/// Merge `rendered` into `existing` (`None` when the target is absent).
///
/// `path` is only used in error messages.
///
/// # Errors
///
/// [`Error::Merge`] when the target holds an unpaired, duplicated or
/// out-of-order marker.
pub fn merge(
    existing: Option<&str>,
    rendered: &str,
    config: &TargetConfig,
    module_name: &str,
    path: &Path,
) -> Result<MergeOutcome> {
    let mut rendered = rendered.to_owned();
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }

    let Some(existing) = existing else {
        let header = config.empty_header.replace("{module}", module_name);
        return Ok(MergeOutcome {
            content: insert(&header, &rendered, config),
            changed: true,
            created: true,
        });
    };

    match find_markers(existing, config, path)? {
        Some(markers) => {
            let current = &existing[markers.region_start..markers.region_end];
            let changed = current != rendered;
            let mut content = String::with_capacity(existing.len() + rendered.len());
            content.push_str(&existing[..markers.region_start]);
            content.push_str(&rendered);
            content.push_str(&existing[markers.region_end..]);
            Ok(MergeOutcome {
                content,
                changed,
                created: false,
            })
        }
        None => Ok(MergeOutcome {
            content: insert(existing, &rendered, config),
            changed: true,
            created: false,
        }),
    }
}

/// Append a new marked section per the insert position.
fn insert(content: &str, rendered: &str, config: &TargetConfig) -> String {
    match config.insert_position {
        InsertPosition::Bottom => {
            let mut out = content.to_owned();
            if !out.is_empty() {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                if !out.ends_with("\n\n") {
                    out.push('\n');
                }
            }
            out.push_str(&config.start_marker());
            out.push('\n');
            out.push_str(rendered);
            out.push_str(&config.end_marker());
            out.push('\n');
            out
        }
    }
}

fn find_markers(content: &str, config: &TargetConfig, path: &Path) -> Result<Option<Markers>> {
    let start_marker = config.start_marker();
    let end_marker = config.end_marker();
    let mut starts = Vec::new();
    let mut ends = Vec::new();

    let mut offset = 0;
    for (index, line) in content.split_inclusive('\n').enumerate() {
        let trimmed = line.trim();
        if trimmed == start_marker {
            starts.push((index + 1, offset + line.len()));
        } else if trimmed == end_marker {
            ends.push((index + 1, offset));
        }
        offset += line.len();
    }

    let error = |message: String| Error::Merge {
        path: path.to_path_buf(),
        message,
    };
    match (starts.as_slice(), ends.as_slice()) {
        ([], []) => Ok(None),
        (&[(start_line, region_start)], &[(end_line, region_end)]) => {
            if end_line < start_line {
                Err(error(format!(
                    "end marker on line {end_line} comes before start marker on line {start_line}"
                )))
            } else {
                Ok(Some(Markers {
                    region_start,
                    region_end,
                }))
            }
        }
        ([], _) => Err(error(format!("`{end_marker}` without `{start_marker}`"))),
        (_, []) => Err(error(format!("`{start_marker}` without `{end_marker}`"))),
        _ => Err(error(format!(
            "expected one marker pair, found {} start and {} end markers",
            starts.len(),
            ends.len()
        ))),
    }
}
