use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write a report file atomically, creating the output directory if needed.
///
/// A reader never observes a half-written report: the content lands in a
/// temporary file that replaces the target on commit.
pub fn write_report(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory at {}", dir.display()))?;
    }

    let path = dir.join(name);
    let mut file = AtomicWriteFile::open(&path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_directory_and_writes() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("reports");
        let path = write_report(&dir, "a.md", "# Title\n").unwrap();
        assert_eq!(path, dir.join("a.md"));
        assert_eq!(fs::read_to_string(path).unwrap(), "# Title\n");
    }

    #[test]
    fn test_overwrites_existing() {
        let tmp = TempDir::new().unwrap();
        write_report(tmp.path(), "a.csv", "old").unwrap();
        let path = write_report(tmp.path(), "a.csv", "new").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "new");
    }

    #[test]
    fn test_unwritable_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "x").unwrap();
        // A regular file where a directory is expected
        assert!(write_report(&blocker.join("sub"), "a.md", "x").is_err());
    }
}
