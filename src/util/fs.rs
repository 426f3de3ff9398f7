//! File helpers for model artifacts.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, TiffinError};

/// Write `bytes` to `path` through a uniquely named temporary sibling.
///
/// The temporary file is synced and then renamed over `path`, so readers
/// see either the previous artifact or the complete new one. Concurrent
/// writers never share a temporary file; the last rename wins.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if path.file_name().is_none() {
        return Err(TiffinError::invalid_argument(format!(
            "not a file path: {}",
            path.display()
        )));
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
