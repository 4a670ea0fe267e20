//! Atomic file operations for load and save.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary file (same path with `.tmp` appended to the extension)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let extension = path
        .extension()
        .map_or_else(|| "tmp".to_string(), |ext| format!("{}.tmp", ext.to_string_lossy()));
    let temp_path = path.with_extension(extension);

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        // Sync to disk before rename
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Read a text file as UTF-8.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid UTF-8.
pub fn read_text(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Geocaches.txt");

        atomic_write(&path, "first\n").unwrap();
        atomic_write(&path, "second\n").unwrap();

        assert_eq!(read_text(&path).unwrap(), "second\n");
        assert!(!dir.path().join("Geocaches.txt.tmp").exists());
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exports").join("map.txt");

        atomic_write(&path, "x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_text(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
