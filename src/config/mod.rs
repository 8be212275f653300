//! Run configuration.
//!
//! One immutable [`Settings`] value is resolved at start-up (see [`load`]) and
//! passed by reference into every pipeline stage.
//!
//! ## Layering
//!
//! Built-in defaults < YAML file < `TOFU_DOCS_*` environment < CLI flags.

pub mod load;

use crate::error::{Error, Result};
use crate::replace::{ReplaceRule, Substitutions};
use serde::{Deserialize, Serialize};

pub use load::{CliSettings, SETTINGS_FILE};

/// Exit code the binary uses for every error.
pub const ERROR_EXIT_CODE: i32 = 2;

/// Default target file, relative to the module directory.
pub const DEFAULT_TARGET: &str = "README.md";

const DEFAULT_EMPTY_HEADER: &str = "# {module}

## Description

[tbd]

## Usage

tbd

## Examples

tbd

## Notes

tbd

";

/// Top-level settings tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Verbose diagnostic output.
    pub debug: bool,
    /// Process exit code when the target content changed.
    pub changed_exit_code: i32,
    /// File to update. Relative to the module unless it starts with `./` or `../`.
    pub target: String,
    pub target_config: TargetConfig,
    pub format: FormatSettings,
    /// Ordered replacement rules.
    pub replace: Vec<ReplaceRule>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            changed_exit_code: 0,
            target: DEFAULT_TARGET.to_owned(),
            target_config: TargetConfig::default(),
            format: FormatSettings::default(),
            replace: Vec::new(),
        }
    }
}

/// Where and how the rendered section lands in the target file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    /// Token embedded in the `<!-- {marker} START -->` / `END` comments.
    pub marker: String,
    pub insert_position: InsertPosition,
    pub format: OutputFormat,
    pub heading_level: u8,
    pub heading: String,
    /// Seed for an absent target file; `{module}` is replaced by the module name.
    pub empty_header: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            marker: "TOFU_DOCS".to_owned(),
            insert_position: InsertPosition::Bottom,
            format: OutputFormat::Markdown,
            heading_level: 2,
            heading: "API Documentation".to_owned(),
            empty_header: DEFAULT_EMPTY_HEADER.to_owned(),
        }
    }
}

impl TargetConfig {
    pub fn start_marker(&self) -> String {
        format!("<!-- {} START -->", self.marker)
    }

    pub fn end_marker(&self) -> String {
        format!("<!-- {} END -->", self.marker)
    }
}

/// Filtering, ordering and formatting toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatSettings {
    pub collapsible_sections: bool,
    pub collapsible_long_values: bool,
    pub collapsible_long_types: bool,
    pub collapsible_long_defaults: bool,
    pub collapsible_long_description: bool,
    pub collapsible_long_threshold: usize,
    pub skip_auto: bool,
    pub sort_order: SortOrder,
    pub validation_remove: bool,
    pub validation_separate: bool,
    pub remove_empty_columns: bool,
    pub required_variables_first: bool,
    pub add_resource_identifier: bool,
    pub add_output_value: bool,
    pub include_resources: bool,
    pub include_locals: bool,
    pub include_variables: bool,
    pub include_outputs: bool,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            collapsible_sections: true,
            collapsible_long_values: true,
            collapsible_long_types: true,
            collapsible_long_defaults: true,
            collapsible_long_description: true,
            collapsible_long_threshold: 25,
            skip_auto: true,
            sort_order: SortOrder::AlphaAsc,
            validation_remove: false,
            validation_separate: true,
            remove_empty_columns: true,
            required_variables_first: true,
            add_resource_identifier: true,
            add_output_value: false,
            include_resources: true,
            include_locals: true,
            include_variables: true,
            include_outputs: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    AlphaAsc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
}

impl Settings {
    /// Check value ranges and cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for out-of-range values and
    /// [`Error::Pattern`] for replacement patterns that do not compile.
    pub fn validate(&self) -> Result<()> {
        let level = self.target_config.heading_level;
        if !(1..=6).contains(&level) {
            return Err(Error::config(
                "target_config.heading_level",
                format!("must be between 1 and 6, got {level}"),
            ));
        }

        let marker = &self.target_config.marker;
        if marker.trim().is_empty() {
            return Err(Error::config("target_config.marker", "cannot be empty"));
        }
        if marker.contains("-->") || marker.contains('\n') {
            return Err(Error::config(
                "target_config.marker",
                "cannot contain `-->` or line breaks",
            ));
        }

        let code = self.changed_exit_code;
        if !(0..=255).contains(&code) {
            return Err(Error::config(
                "changed_exit_code",
                format!("must be between 0 and 255, got {code}"),
            ));
        }
        if code == ERROR_EXIT_CODE {
            return Err(Error::config(
                "changed_exit_code",
                format!("{ERROR_EXIT_CODE} is reserved for errors"),
            ));
        }

        if self.target.trim().is_empty() {
            return Err(Error::config("target", "cannot be empty"));
        }

        Substitutions::compile(&self.replace)?;
        Ok(())
    }

    /// Effective settings as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::config("settings", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Column};
    use std::collections::BTreeMap;

    #[test]
    fn defaults_validate() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let settings: Settings =
            serde_yaml::from_str("format:\n  skip_auto: false\ntarget_config:\n  heading_level: 3\n")
                .unwrap();
        assert!(!settings.format.skip_auto);
        assert!(settings.format.collapsible_sections);
        assert_eq!(settings.target_config.heading_level, 3);
        assert_eq!(settings.target_config.marker, "TOFU_DOCS");
        assert_eq!(settings.target, "README.md");
    }

    #[test]
    fn unsupported_enum_values_are_rejected() {
        assert!(serde_yaml::from_str::<Settings>("format:\n  sort_order: alpha-desc\n").is_err());
        assert!(serde_yaml::from_str::<Settings>("target_config:\n  insert_position: top\n").is_err());
        assert!(serde_yaml::from_str::<Settings>("target_config:\n  format: html\n").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_yaml::from_str::<Settings>("format:\n  colapsible_sections: true\n").is_err());
    }

    #[test]
    fn heading_level_range() {
        let mut settings = Settings::default();
        settings.target_config.heading_level = 7;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().starts_with("target_config.heading_level"));
    }

    #[test]
    fn changed_exit_code_cannot_shadow_errors() {
        let mut settings = Settings::default();
        settings.changed_exit_code = 2;
        assert!(settings.validate().is_err());
        settings.changed_exit_code = 300;
        assert!(settings.validate().is_err());
        settings.changed_exit_code = 1;
        settings.validate().unwrap();
    }

    #[test]
    fn marker_must_be_a_single_comment_token() {
        let mut settings = Settings::default();
        settings.target_config.marker = "A --> B".to_owned();
        assert!(settings.validate().is_err());
        settings.target_config.marker = " ".to_owned();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn broken_replace_pattern_fails_validation() {
        let mut settings = Settings::default();
        settings.replace.push(ReplaceRule {
            pattern: "(".to_owned(),
            replacement: String::new(),
            variables: BTreeMap::new(),
            category: Category::Variable,
            column: Column::Description,
        });
        let err = settings.validate().unwrap_err();
        assert_eq!(err.stage(), "substitution");
    }

    #[test]
    fn yaml_dump_round_trips() {
        let yaml = Settings::default().to_yaml().unwrap();
        assert!(yaml.contains("sort_order: alpha-asc"));
        let back: Settings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, Settings::default());
    }
}
