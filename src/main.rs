//! tofu-docs: generate reference documentation for an OpenTofu/Terraform module
//! and keep it in sync inside the module's README.
//!
//! ```text
//! tofu-docs modules/vpc
//! tofu-docs --target - .
//! tofu-docs --dump-config --dump-overwrite .
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tofu_docs::config::{self, load, CliSettings};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

#[derive(Parser)]
#[command(
    name = "tofu-docs",
    version,
    about = "Generate module documentation from OpenTofu/Terraform sources"
)]
struct Cli {
    /// Path to the module directory
    #[arg(default_value = ".")]
    module_path: PathBuf,

    /// Settings file (default: $TOFU_DOCS_CONFIG or <MODULE_PATH>/.tofu-docs.yml)
    #[arg(short = 'c', long)]
    config_file: Option<PathBuf>,

    /// Write the effective settings to the settings file, then run
    #[arg(long)]
    dump_config: bool,

    /// Allow --dump-config to replace an existing settings file
    #[arg(long, requires = "dump_config")]
    dump_overwrite: bool,

    /// File to update; `-` or `stdout` prints the section instead
    #[arg(short = 't', long)]
    target: Option<String>,

    /// Verbose diagnostic output
    #[arg(short = 'd', long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match try_main(&cli) {
        Ok(code) => code,
        Err(err) => {
            match err.chain().find_map(|e| e.downcast_ref::<tofu_docs::Error>()) {
                Some(e) => {
                    eprintln!("error: {}: {err}", e.stage());
                    // Structural and I/O errors come from the inputs, not the settings.
                    if !e.is_structural() && !matches!(e, tofu_docs::Error::Io { .. }) {
                        eprintln!(
                            "hint: check {} and the TOFU_DOCS_* environment",
                            config::SETTINGS_FILE
                        );
                    }
                }
                None => eprintln!("error: {err}"),
            }
            ExitCode::from(config::ERROR_EXIT_CODE as u8)
        }
    }
}

fn try_main(cli: &Cli) -> Result<ExitCode> {
    let env: Vec<(String, String)> = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();
    let overrides = CliSettings {
        config_file: cli.config_file.clone(),
        target: cli.target.clone(),
        debug: cli.debug,
    };

    let early_debug = cli.debug || env_debug(&env);
    let filter = init_tracing(early_debug);
    let settings = load::load(&cli.module_path, &overrides, env.iter().cloned())?;
    if settings.debug && !early_debug {
        filter.reload(log_filter(true))?;
    }

    if cli.dump_config {
        let path = load::settings_path(&cli.module_path, &overrides, &env);
        load::dump(&settings, &path, cli.dump_overwrite)?;
    }

    let outcome = tofu_docs::run(&cli.module_path, &settings)?;
    if outcome.changed {
        // Validated to 0..=255.
        Ok(ExitCode::from(settings.changed_exit_code as u8))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// `TOFU_DOCS_DEBUG` set to a true value.
fn env_debug(env: &[(String, String)]) -> bool {
    env.iter()
        .any(|(k, v)| k == "TOFU_DOCS_DEBUG" && v.trim().eq_ignore_ascii_case("true"))
}

fn log_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the subscriber before settings are loaded. The returned handle
/// raises the level once a settings file turns `debug` on.
///
/// Logs go to stderr so a stdout target stays clean.
fn init_tracing(debug: bool) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(log_filter(debug));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["tofu-docs"]).unwrap();
        assert_eq!(cli.module_path, PathBuf::from("."));
        assert!(!cli.debug);
        assert!(cli.target.is_none());
    }

    #[test]
    fn debug_from_environment() {
        let env = |v: &str| vec![("TOFU_DOCS_DEBUG".to_owned(), v.to_owned())];
        assert!(env_debug(&env("true")));
        assert!(env_debug(&env("TRUE")));
        assert!(!env_debug(&env("false")));
        assert!(!env_debug(&[]));
    }

    #[test]
    fn dump_overwrite_requires_dump_config() {
        assert!(Cli::try_parse_from(["tofu-docs", "--dump-overwrite"]).is_err());
        assert!(Cli::try_parse_from(["tofu-docs", "--dump-config", "--dump-overwrite"]).is_ok());
    }
}
