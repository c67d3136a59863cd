//! Toolchain package list parsing.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Error;

#[derive(Debug, Deserialize)]
struct PackageList {
    packages: Vec<String>,
}

/// Parse a JSON package list of the form `{"packages": ["a", "b"]}`.
///
/// Order is preserved; installs happen in list order. An empty path is
/// [`Error::MissingInput`]; an absent file, malformed JSON, or a document
/// without the `packages` key is an error on its own terms.
pub fn parse_package_list(path: &Path) -> Result<Vec<String>, Error> {
    if path.as_os_str().is_empty() {
        return Err(Error::MissingInput(
            "package list path is empty".to_string(),
        ));
    }

    let text = fs::read_to_string(path).map_err(|e| {
        Error::MissingInput(format!("cannot read package list '{}': {}", path.display(), e))
    })?;

    let parsed: PackageList = serde_json::from_str(&text).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(parsed.packages)
}
