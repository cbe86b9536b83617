pub mod date_format;
pub mod import;
pub mod table_io;
pub mod workbook;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

/// Stages `content` in a temp file beside `path`, then renames it into place.
pub(crate) fn write_atomically(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(content)?;
    staged.as_file().sync_all()?;

    if let Err(err) = staged.persist(path) {
        // Some platforms refuse to rename over an existing file.
        if err.error.kind() != io::ErrorKind::AlreadyExists {
            return Err(err.error);
        }
        debug!(path = %path.display(), "replacing existing file");
        fs::remove_file(path)?;
        err.file.persist(path).map_err(|e| e.error)?;
    }
    Ok(())
}
