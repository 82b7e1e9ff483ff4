//! Provider port
//!
//! Defines the interface every vendor backend implements. Adapters live in
//! the infrastructure layer; the registry and tool engines only see this
//! trait.

use async_trait::async_trait;
use conclave_domain::{
    CompletionRequest, CompletionResponse, ModelCapabilities, OrchestratorError, ProviderKind,
};
use thiserror::Error;

/// Errors a provider backend can produce.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The model is not in this provider's descriptor set.
    #[error("provider {provider} does not serve model '{model}'")]
    ModelNotSupported { provider: ProviderKind, model: String },

    /// The request uses a feature the descriptor disallows.
    #[error("model '{model}' does not support {feature}")]
    FeatureUnsupported { model: String, feature: String },

    /// Transport or HTTP failure. Retryable for 429/5xx/timeouts,
    /// non-retryable for other upstream 4xx responses.
    #[error("upstream failure: {message}")]
    Upstream { message: String, retryable: bool },

    /// The in-flight call was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,
}

impl ProviderError {
    pub fn retryable(message: impl Into<String>) -> Self {
        ProviderError::Upstream {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        ProviderError::Upstream {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Upstream { retryable: true, .. })
    }
}

impl From<ProviderError> for OrchestratorError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::ModelNotSupported { model, .. } => {
                OrchestratorError::UnknownModel(model)
            }
            ProviderError::FeatureUnsupported { model, feature } => {
                OrchestratorError::FeatureUnsupported { model, feature }
            }
            ProviderError::Upstream { message, retryable } => {
                OrchestratorError::Upstream { message, retryable }
            }
            ProviderError::Cancelled => OrchestratorError::Cancelled,
        }
    }
}

/// A vendor backend serving one or more models.
///
/// Implementations hold their credentials and a reusable transport session;
/// `generate` is the sole side-effectful operation and the only suspension
/// point in the core.
#[async_trait]
pub trait ProviderPort: Send + Sync {
    /// Which vendor this backend talks to.
    fn kind(&self) -> ProviderKind;

    /// The immutable descriptor set declared at construction.
    fn capabilities(&self) -> &[ModelCapabilities];

    /// Look up a descriptor by canonical name or alias (case-insensitive).
    fn capability(&self, name: &str) -> Option<&ModelCapabilities> {
        self.capabilities().iter().find(|c| c.matches(name))
    }

    /// Issue one completion call and normalize the result.
    async fn generate(&self, request: CompletionRequest)
    -> Result<CompletionResponse, ProviderError>;
}

/// Pre-flight validation shared by all adapters: the model must be in the
/// descriptor set and the request must not use disabled features.
///
/// Returns the matched descriptor so adapters can read windows and flags
/// without a second lookup.
pub fn check_request<'a>(
    provider: ProviderKind,
    capabilities: &'a [ModelCapabilities],
    request: &CompletionRequest,
) -> Result<&'a ModelCapabilities, ProviderError> {
    let caps = capabilities
        .iter()
        .find(|c| c.is_canonical(&request.model))
        .ok_or_else(|| ProviderError::ModelNotSupported {
            provider,
            model: request.model.clone(),
        })?;

    if !request.images.is_empty() && !caps.supports_images {
        return Err(ProviderError::FeatureUnsupported {
            model: caps.model_name.clone(),
            feature: "image input".to_string(),
        });
    }
    if request.system_prompt.is_some() && !caps.supports_system_prompts {
        return Err(ProviderError::FeatureUnsupported {
            model: caps.model_name.clone(),
            feature: "system prompts".to_string(),
        });
    }
    if request.temperature.is_some() && !caps.supports_temperature {
        return Err(ProviderError::FeatureUnsupported {
            model: caps.model_name.clone(),
            feature: "temperature control".to_string(),
        });
    }
    if request.thinking_mode.is_some() && !caps.supports_extended_thinking {
        return Err(ProviderError::FeatureUnsupported {
            model: caps.model_name.clone(),
            feature: "extended thinking".to_string(),
        });
    }
    Ok(caps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_domain::ChatMessage;
    use std::path::PathBuf;

    fn caps() -> Vec<ModelCapabilities> {
        vec![
            ModelCapabilities::new("text-model", "Text", ProviderKind::Gemini),
            ModelCapabilities::new("vision-model", "Vision", ProviderKind::Gemini)
                .with_images(10_000_000)
                .with_extended_thinking(),
        ]
    }

    fn request(model: &str) -> CompletionRequest {
        CompletionRequest::new(model, vec![ChatMessage::user("hi")])
    }

    #[test]
    fn unknown_model_is_rejected() {
        let descriptors = caps();
        let result = check_request(ProviderKind::Gemini, &descriptors, &request("other-model"));
        assert!(matches!(
            result,
            Err(ProviderError::ModelNotSupported { .. })
        ));
    }

    #[test]
    fn alias_is_not_accepted_at_the_provider_boundary() {
        // Resolution happens in the registry; providers only see canonicals.
        let descriptors = vec![
            ModelCapabilities::new("gemini-2.5-pro", "Pro", ProviderKind::Gemini)
                .with_aliases(&["pro"]),
        ];
        let result = check_request(ProviderKind::Gemini, &descriptors, &request("pro"));
        assert!(result.is_err());
    }

    #[test]
    fn images_require_image_support() {
        let mut req = request("text-model");
        req.images = vec![PathBuf::from("/tmp/shot.png")];
        let descriptors = caps();
        let result = check_request(ProviderKind::Gemini, &descriptors, &req);
        assert!(matches!(
            result,
            Err(ProviderError::FeatureUnsupported { feature, .. }) if feature.contains("image")
        ));

        let mut req = request("vision-model");
        req.images = vec![PathBuf::from("/tmp/shot.png")];
        assert!(check_request(ProviderKind::Gemini, &caps(), &req).is_ok());
    }

    #[test]
    fn thinking_requires_extended_thinking() {
        let req = request("text-model").with_thinking_mode(conclave_domain::ThinkingMode::High);
        assert!(check_request(ProviderKind::Gemini, &caps(), &req).is_err());

        let req = request("vision-model").with_thinking_mode(conclave_domain::ThinkingMode::High);
        assert!(check_request(ProviderKind::Gemini, &caps(), &req).is_ok());
    }

    #[test]
    fn provider_error_maps_to_orchestrator_error() {
        let err: OrchestratorError = ProviderError::retryable("503").into();
        assert!(err.is_retryable());

        let err: OrchestratorError = ProviderError::ModelNotSupported {
            provider: ProviderKind::XAi,
            model: "nope".into(),
        }
        .into();
        assert_eq!(err.kind(), "unknown_model");
    }
}
