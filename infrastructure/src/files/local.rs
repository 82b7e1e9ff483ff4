//! Local file system reader
//!
//! Implements the [`FileReader`](conclave_application::FileReader) port by
//! reading request-referenced files from the local file system. A size cap
//! guards against a single huge file swallowing the context window before
//! token budgeting even runs.

use conclave_application::ports::file_reader::{FileInfo, FileReader, language_hint};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Hard cap on a single embedded file.
const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// File reader backed by the local file system.
///
/// `Send + Sync`; safe to share across concurrent tool invocations.
pub struct LocalFileReader;

impl LocalFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FileReader for LocalFileReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        if metadata.len() > MAX_FILE_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::FileTooLarge,
                format!(
                    "{} is {} bytes, over the {} byte embedding cap",
                    path.display(),
                    metadata.len(),
                    MAX_FILE_BYTES
                ),
            ));
        }
        debug!("reading {} ({} bytes)", path.display(), metadata.len());
        fs::read_to_string(path)
    }

    fn info(&self, path: &Path) -> io::Result<FileInfo> {
        let metadata = fs::metadata(path)?;
        Ok(FileInfo {
            size_bytes: metadata.len(),
            language: language_hint(path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.rs");
        fs::write(&path, "fn main() {}").unwrap();

        let reader = LocalFileReader::new();
        assert_eq!(reader.read(&path).unwrap(), "fn main() {}");

        let info = reader.info(&path).unwrap();
        assert_eq!(info.size_bytes, 12);
        assert_eq!(info.language.as_deref(), Some("rust"));
    }

    #[test]
    fn rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let reader = LocalFileReader::new();
        assert!(reader.read(dir.path()).is_err());
    }

    #[test]
    fn missing_files_error() {
        let reader = LocalFileReader::new();
        assert!(reader.read(Path::new("/definitely/not/here.txt")).is_err());
    }
}
