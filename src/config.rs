//! YAML build configuration.
//!
//! The config is loaded once into an untyped mapping and read lazily: a
//! missing key is not an error until the step that needs it asks for it.
//! That keeps partial configs loadable for tooling that only touches a
//! subset of the pipeline.

use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::process::ToolPolicy;

/// Loaded configuration document.
///
/// Required keys (looked up at point of use):
/// - `working_dir` - scratch directory, wiped every run
/// - `toolchain_repo` - dnf repo definition file copied into the chroot
/// - `toolchain_packages` - JSON file listing baseline packages
///
/// Optional keys:
/// - `strict_tools` - bool; fail fast on non-zero external tool exits
///   instead of warning and continuing (default: false)
#[derive(Debug)]
pub struct Config {
    doc: serde_yaml::Mapping,
    path: PathBuf,
}

impl Config {
    /// Load and parse the config file. No schema validation happens here.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read '{}': {}", path.display(), e)))?;
        let value: Value = serde_yaml::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid YAML in '{}': {}", path.display(), e)))?;
        let doc = match value {
            Value::Mapping(doc) => doc,
            _ => {
                return Err(Error::Config(format!(
                    "config '{}' must be a top-level mapping",
                    path.display()
                )))
            }
        };
        Ok(Self {
            doc,
            path: path.to_path_buf(),
        })
    }

    fn required_str(&self, key: &str) -> Result<&str, Error> {
        let key_value = Value::String(key.to_string());
        let value = self.doc.get(&key_value).ok_or_else(|| {
            Error::Config(format!("missing key '{}' in '{}'", key, self.path.display()))
        })?;
        value.as_str().ok_or_else(|| {
            Error::Config(format!(
                "key '{}' in '{}' must be a string",
                key,
                self.path.display()
            ))
        })
    }

    /// Scratch directory for the run; destroyed and recreated by workspace
    /// preparation.
    pub fn working_dir(&self) -> Result<PathBuf, Error> {
        Ok(PathBuf::from(self.required_str("working_dir")?))
    }

    /// Path to the repository definition file installed into the chroot so
    /// `dnf --installroot` can resolve packages.
    pub fn toolchain_repo(&self) -> Result<PathBuf, Error> {
        Ok(PathBuf::from(self.required_str("toolchain_repo")?))
    }

    /// Path to the JSON package list for the baseline toolchain.
    pub fn toolchain_packages(&self) -> Result<PathBuf, Error> {
        Ok(PathBuf::from(self.required_str("toolchain_packages")?))
    }

    /// External-tool failure policy. Permissive (warn and continue) unless
    /// `strict_tools: true` is set.
    pub fn tool_policy(&self) -> ToolPolicy {
        let key = Value::String("strict_tools".to_string());
        match self.doc.get(&key).and_then(Value::as_bool) {
            Some(true) => ToolPolicy::Strict,
            _ => ToolPolicy::Permissive,
        }
    }
}
