//! Provider adapters.
//!
//! Each adapter declares its static descriptor table, reads its API key from
//! the environment at construction (a provider with no key is simply not
//! registered), and owns one shared `reqwest::Client`. All adapters run the
//! same pre-flight checks via
//! [`check_request`](conclave_application::ports::provider::check_request)
//! and normalize vendor responses into
//! [`CompletionResponse`](conclave_domain::CompletionResponse).

pub mod gemini;
pub mod openai;
pub mod openai_compat;
pub mod xai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use xai::XaiProvider;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use conclave_application::ports::provider::ProviderError;
use std::path::Path;

/// Cap on upstream error bodies carried into error messages.
const ERROR_BODY_LIMIT: usize = 300;

/// Map an HTTP status + body into the provider error taxonomy.
///
/// 429 and 5xx are retryable; other upstream 4xx responses are permanent
/// client errors.
pub(crate) fn classify_status(provider: &str, status: u16, body: &str) -> ProviderError {
    let retryable = status == 429 || status >= 500;
    let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    ProviderError::Upstream {
        message: format!("{} returned HTTP {}: {}", provider, status, snippet),
        retryable,
    }
}

/// Map a reqwest transport failure; timeouts and connection failures are
/// retryable.
pub(crate) fn transport_error(provider: &str, error: reqwest::Error) -> ProviderError {
    ProviderError::Upstream {
        message: format!("{} transport error: {}", provider, error),
        retryable: error.is_timeout() || error.is_connect(),
    }
}

/// Read and base64-encode an image for inline transmission.
///
/// Returns `(mime_type, base64_data)`. Oversized or unreadable files are
/// surfaced against the requesting model.
pub(crate) fn encode_image(
    model: &str,
    path: &Path,
    max_bytes: u64,
) -> Result<(String, String), ProviderError> {
    let bytes = std::fs::read(path).map_err(|e| ProviderError::Upstream {
        message: format!("cannot read image {}: {}", path.display(), e),
        retryable: false,
    })?;
    if bytes.len() as u64 > max_bytes {
        return Err(ProviderError::FeatureUnsupported {
            model: model.to_string(),
            feature: format!(
                "images larger than {} bytes ({} is {} bytes)",
                max_bytes,
                path.display(),
                bytes.len()
            ),
        });
    }
    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    Ok((mime.to_string(), BASE64.encode(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limits_and_server_errors_are_retryable() {
        assert!(classify_status("openai", 429, "slow down").is_retryable());
        assert!(classify_status("openai", 500, "oops").is_retryable());
        assert!(classify_status("openai", 503, "oops").is_retryable());
        assert!(!classify_status("openai", 400, "bad request").is_retryable());
        assert!(!classify_status("openai", 401, "bad key").is_retryable());
    }

    #[test]
    fn error_bodies_are_truncated() {
        let long_body = "x".repeat(10_000);
        let error = classify_status("gemini", 500, &long_body);
        assert!(error.to_string().len() < 500);
    }
}
