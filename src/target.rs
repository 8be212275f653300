//! Target resolution, reading and write-back.

use crate::config::DEFAULT_TARGET;
use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const STDOUT_TARGETS: &[&str] = &["-", "stdout", "/dev/stdout", "/dev/fd/1", "/proc/self/fd/1"];
const STDERR_TARGETS: &[&str] = &["stderr", "/dev/stderr", "/dev/fd/2", "/proc/self/fd/2"];

/// Where the rendered section goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Stdout,
    Stderr,
    File(PathBuf),
}

impl Target {
    /// Resolve the configured `target` against the module directory.
    ///
    /// Absolute paths and paths starting with `./` or `../` are used as given;
    /// anything else lives inside the module.
    pub fn resolve(target: &str, module_path: &Path) -> Self {
        if STDOUT_TARGETS.contains(&target) {
            return Self::Stdout;
        }
        if STDERR_TARGETS.contains(&target) {
            return Self::Stderr;
        }
        let path = Path::new(target);
        if path.is_absolute() || is_explicit_relative(target) {
            return Self::File(path.to_path_buf());
        }
        if target != DEFAULT_TARGET {
            tracing::warn!(
                "Target path {} is not explicitly relative, using {}",
                target,
                module_path.join(path).display()
            );
        }
        Self::File(module_path.join(path))
    }
}

fn is_explicit_relative(target: &str) -> bool {
    ["./", "../", ".\\", "..\\"]
        .iter()
        .any(|prefix| target.starts_with(prefix))
}

/// Current content of the target, `None` when it does not exist yet.
pub fn read(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Write the new content, creating parent directories as needed.
pub fn write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stream_targets() {
        let module = Path::new("mod");
        for t in ["-", "stdout", "/dev/stdout", "/dev/fd/1", "/proc/self/fd/1"] {
            assert_eq!(Target::resolve(t, module), Target::Stdout);
        }
        for t in ["stderr", "/dev/stderr", "/dev/fd/2", "/proc/self/fd/2"] {
            assert_eq!(Target::resolve(t, module), Target::Stderr);
        }
    }

    #[test]
    fn relative_targets_live_in_the_module() {
        let module = Path::new("modules/vpc");
        assert_eq!(
            Target::resolve("README.md", module),
            Target::File(PathBuf::from("modules/vpc/README.md"))
        );
        assert_eq!(
            Target::resolve("docs/API.md", module),
            Target::File(PathBuf::from("modules/vpc/docs/API.md"))
        );
        assert_eq!(
            Target::resolve("./README.md", module),
            Target::File(PathBuf::from("./README.md"))
        );
        assert_eq!(
            Target::resolve("../README.md", module),
            Target::File(PathBuf::from("../README.md"))
        );
    }

    #[test]
    fn absent_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read(&dir.path().join("README.md")).unwrap(), None);
    }

    #[test]
    fn write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("docs/nested/README.md");
        write(&path, "content\n").unwrap();
        assert_eq!(read(&path).unwrap().as_deref(), Some("content\n"));
    }
}
