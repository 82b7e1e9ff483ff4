//! Port for reading files referenced by requests.
//!
//! Tool engines embed file bodies and references through this port so the
//! core stays free of filesystem concerns and tests can stub content.

use std::path::Path;

/// Metadata used when a phase embeds references instead of bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub size_bytes: u64,
    /// Language hint derived from the extension, e.g. "rust", "python".
    pub language: Option<String>,
}

/// Read access to request-referenced files.
///
/// Reads are non-suspending (treated as atomic regions); implementations
/// must not perform network I/O.
pub trait FileReader: Send + Sync {
    /// Read the full contents of a file.
    fn read(&self, path: &Path) -> std::io::Result<String>;

    /// Size and language hint for a reference-only embedding.
    fn info(&self, path: &Path) -> std::io::Result<FileInfo>;
}

/// Language hint from a file extension.
pub fn language_hint(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    let language = match ext {
        "rs" => "rust",
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cc" | "cpp" | "hpp" => "cpp",
        "rb" => "ruby",
        "sh" => "shell",
        "md" => "markdown",
        "json" => "json",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        other => other,
    };
    Some(language.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn language_hint_maps_common_extensions() {
        assert_eq!(
            language_hint(&PathBuf::from("/src/main.rs")).as_deref(),
            Some("rust")
        );
        assert_eq!(
            language_hint(&PathBuf::from("/app.py")).as_deref(),
            Some("python")
        );
        assert_eq!(language_hint(&PathBuf::from("/README")), None);
    }
}
