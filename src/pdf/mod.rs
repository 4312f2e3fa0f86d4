pub mod pages;
pub mod reader;
pub mod writer;

use std::io::Write;
use std::path::Path;

use crate::error::RedactError;

/// Writes `bytes` to `path` without ever leaving a partial file behind.
///
/// The data is staged in a temporary file in the destination directory and
/// renamed into place. The staging file is removed on every failure path.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> crate::error::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| RedactError::encode(format!("cannot stage output in {}: {e}", dir.display())))?;
    staged
        .write_all(bytes)
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| RedactError::encode(format!("cannot write {}: {e}", path.display())))?;
    staged
        .persist(path)
        .map_err(|e| RedactError::encode(format!("cannot persist {}: {}", path.display(), e.error)))?;
    Ok(())
}
