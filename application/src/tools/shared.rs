//! Helpers shared by the simple and workflow engines.

use crate::memory::ConversationStore;
use crate::ports::file_reader::{FileReader, language_hint};
use crate::registry::{ProviderRegistry, Resolution};
use conclave_domain::{
    CompletionRequest, CompletionResponse, ConversationThread, ModelCapabilities,
    OrchestratorError, ThreadId, ToolCategory, ToolRequest, estimate_tokens,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Resolve the model for a request: explicit name or auto-mode by category.
pub fn resolve_model(
    registry: &ProviderRegistry,
    request: &ToolRequest,
    category: ToolCategory,
) -> Result<Resolution, OrchestratorError> {
    if request.wants_auto_model() {
        registry.select_auto(category)
    } else {
        registry.resolve(&request.model)
    }
}

/// Look up the continuation thread, downgrading a missing thread to a fresh
/// start with a metadata warning.
pub fn hydrate_thread(
    store: &ConversationStore,
    continuation: Option<ThreadId>,
    warnings: &mut Vec<String>,
) -> Option<ConversationThread> {
    let id = continuation?;
    match store.get_thread(&id) {
        Some(thread) => Some(thread),
        None => {
            warnings.push(format!(
                "continuation thread {} not found or expired; starting a new conversation",
                id
            ));
            None
        }
    }
}

/// Drop sampling parameters the resolved model cannot honor, with warnings,
/// so explicit requests still reach `generate` unchanged for supported
/// features.
pub fn apply_sampling(
    mut completion: CompletionRequest,
    request: &ToolRequest,
    capabilities: &ModelCapabilities,
    warnings: &mut Vec<String>,
) -> CompletionRequest {
    if let Some(temperature) = request.temperature {
        if capabilities.supports_temperature {
            completion = completion.with_temperature(temperature);
        } else {
            warnings.push(format!(
                "model {} ignores temperature",
                capabilities.model_name
            ));
        }
    }
    if let Some(mode) = request.thinking_mode {
        if capabilities.supports_extended_thinking {
            completion = completion.with_thinking_mode(mode);
        } else {
            warnings.push(format!(
                "model {} does not support extended thinking; thinking_mode ignored",
                capabilities.model_name
            ));
        }
    }
    completion
}

/// Render reference-only lines for a set of files: path, size, language.
pub fn render_file_references(files: &dyn FileReader, paths: &[PathBuf]) -> String {
    let mut block = String::new();
    for path in paths {
        match files.info(path) {
            Ok(info) => {
                let language = info.language.as_deref().unwrap_or("unknown");
                block.push_str(&format!(
                    "- {} ({} bytes, {})\n",
                    path.display(),
                    info.size_bytes,
                    language
                ));
            }
            Err(error) => {
                warn!("cannot stat {}: {}", path.display(), error);
                block.push_str(&format!("- {} (unreadable)\n", path.display()));
            }
        }
    }
    block
}

/// Render full file bodies within a token budget, in the given order.
///
/// Returns the rendered block, the paths actually embedded, and the tokens
/// consumed. Files past the budget are dropped, never truncated mid-body.
pub fn render_file_bodies(
    files: &dyn FileReader,
    paths: &[PathBuf],
    budget: u32,
) -> (String, Vec<PathBuf>, u32) {
    let mut block = String::new();
    let mut embedded = Vec::new();
    let mut remaining = budget;

    for path in paths {
        let content = match files.read(path) {
            Ok(content) => content,
            Err(error) => {
                warn!("skipping unreadable file {}: {}", path.display(), error);
                continue;
            }
        };
        let language = language_hint(path).unwrap_or_default();
        let rendered = format!("--- {} ---\n```{}\n{}\n```\n", path.display(), language, content);
        let cost = estimate_tokens(&rendered);
        if cost > remaining {
            break;
        }
        remaining -= cost;
        block.push_str(&rendered);
        embedded.push(path.clone());
    }

    (block, embedded, budget - remaining)
}

/// Run one provider call under the category timeout with cancellation
/// propagation. Dropping the future cancels the in-flight transport call.
pub async fn generate_with_limits(
    resolution: &Resolution,
    completion: CompletionRequest,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<CompletionResponse, OrchestratorError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OrchestratorError::Cancelled),
        outcome = tokio::time::timeout(timeout, resolution.provider.generate(completion)) => {
            match outcome {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(error)) => Err(error.into()),
                Err(_) => Err(OrchestratorError::Upstream {
                    message: format!(
                        "provider call timed out after {}s",
                        timeout.as_secs()
                    ),
                    retryable: true,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::file_reader::FileInfo;
    use std::collections::HashMap;
    use std::io;
    use std::path::Path;

    struct StubFiles {
        contents: HashMap<PathBuf, String>,
    }

    impl FileReader for StubFiles {
        fn read(&self, path: &Path) -> io::Result<String> {
            self.contents
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }

        fn info(&self, path: &Path) -> io::Result<FileInfo> {
            let content = self.read(path)?;
            Ok(FileInfo {
                size_bytes: content.len() as u64,
                language: language_hint(path),
            })
        }
    }

    fn stub(entries: &[(&str, &str)]) -> StubFiles {
        StubFiles {
            contents: entries
                .iter()
                .map(|(p, c)| (PathBuf::from(p), c.to_string()))
                .collect(),
        }
    }

    #[test]
    fn references_carry_size_and_language() {
        let files = stub(&[("/src/main.rs", "fn main() {}")]);
        let block = render_file_references(&files, &[PathBuf::from("/src/main.rs")]);
        assert!(block.contains("/src/main.rs"));
        assert!(block.contains("12 bytes"));
        assert!(block.contains("rust"));
        // References never include bodies.
        assert!(!block.contains("fn main"));
    }

    #[test]
    fn bodies_respect_budget() {
        let big = "x".repeat(4_000);
        let files = stub(&[("/a.txt", "small"), ("/b.txt", &big)]);

        let (block, embedded, used) = render_file_bodies(
            &files,
            &[PathBuf::from("/a.txt"), PathBuf::from("/b.txt")],
            50,
        );
        assert_eq!(embedded, vec![PathBuf::from("/a.txt")]);
        assert!(block.contains("small"));
        assert!(!block.contains(&big));
        assert!(used > 0 && used <= 50);
    }

    #[test]
    fn unreadable_bodies_are_skipped() {
        let files = stub(&[("/present.txt", "here")]);
        let (block, embedded, _) = render_file_bodies(
            &files,
            &[PathBuf::from("/gone.txt"), PathBuf::from("/present.txt")],
            10_000,
        );
        assert_eq!(embedded.len(), 1);
        assert!(block.contains("here"));
    }
}
