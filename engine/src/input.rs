//! Loading identifier lists from newline-delimited text files.

use crate::{error::Result, Error, Msisdn};
use std::path::Path;

/// Read a newline-delimited file of identifiers.
///
/// Lines are trimmed and empty lines dropped. Order is preserved and
/// duplicates are kept.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<Msisdn>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))?;

    let identifiers = parse_identifiers(&contents);
    tracing::debug!(
        path = %path.display(),
        count = identifiers.len(),
        "loaded identifiers"
    );
    Ok(identifiers)
}

/// Split text into trimmed, non-empty lines.
pub fn parse_identifiers(contents: &str) -> Vec<Msisdn> {
    contents
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
