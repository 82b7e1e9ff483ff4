//! Single-shot tool execution.
//!
//! The simple engine implements the shared contract of every one-call tool:
//! resolve a model, hydrate history for continuations, compose the provider
//! messages, issue one `generate`, and record the exchange as two turns.
//! Thread state is only mutated after a successful provider call.

use super::response::{ResponseMetadata, ToolResponse};
use super::shared::{
    apply_sampling, generate_with_limits, hydrate_thread, render_file_bodies, resolve_model,
};
use super::{DEFAULT_HISTORY_BUDGET, ToolContext, ToolProfile, check_cancelled};
use conclave_domain::{
    ChatMessage, CompletionRequest, OrchestratorError, ToolRequest, effective_budget,
};
use serde_json::json;
use tracing::debug;

use crate::ports::exchange_logger::ExchangeEvent;

pub struct SimpleToolEngine {
    context: ToolContext,
}

impl SimpleToolEngine {
    pub fn new(context: ToolContext) -> Self {
        Self { context }
    }

    pub async fn run(
        &self,
        profile: &ToolProfile,
        request: ToolRequest,
    ) -> Result<ToolResponse, OrchestratorError> {
        check_cancelled(&self.context.cancel)?;

        let mut warnings = Vec::new();
        let resolution = resolve_model(&self.context.registry, &request, profile.category)?;
        debug!("{}: using model {}", profile.name, resolution.canonical());

        // Continuation hydration; unknown threads downgrade to a fresh start.
        let thread = hydrate_thread(
            &self.context.store,
            request.continuation()?,
            &mut warnings,
        );

        let budget = effective_budget(DEFAULT_HISTORY_BUDGET, &resolution.capabilities);
        let history = thread
            .as_ref()
            .map(|t| {
                self.context
                    .history_builder()
                    .build_from_thread(t, budget)
            })
            .unwrap_or_default();
        let remaining_budget = budget.saturating_sub(history.tokens_used);

        // Compose: [history..., context files, user turn].
        let mut messages: Vec<ChatMessage> = history.messages.clone();
        if !history.embedded_files.is_empty() {
            let mut block = String::from("Files referenced earlier in this conversation:\n");
            for file in &history.embedded_files {
                block.push_str(&format!("--- {} ---\n{}\n", file.path.display(), file.content));
            }
            messages.push(ChatMessage::user(block));
        }

        let mut user_content = request.prompt.clone();
        if !request.absolute_file_paths.is_empty() {
            let (block, embedded, _) = render_file_bodies(
                self.context.files.as_ref(),
                &request.absolute_file_paths,
                remaining_budget,
            );
            if embedded.len() < request.absolute_file_paths.len() {
                warnings.push(format!(
                    "embedded {} of {} requested files within the token budget",
                    embedded.len(),
                    request.absolute_file_paths.len()
                ));
            }
            if !block.is_empty() {
                user_content.push_str("\n\nReferenced files:\n");
                user_content.push_str(&block);
            }
        }
        messages.push(ChatMessage::user(user_content));

        let completion = CompletionRequest::new(resolution.canonical(), messages)
            .with_system_prompt(profile.system_prompt)
            .with_images(request.images.clone());
        let completion = apply_sampling(completion, &request, &resolution.capabilities, &mut warnings);

        let response = generate_with_limits(
            &resolution,
            completion,
            profile.category.default_timeout(),
            &self.context.cancel,
        )
        .await?;

        // Record turns only after a successful generate.
        let thread_id = match thread {
            Some(ref existing) => existing.id,
            None => self
                .context
                .store
                .create_thread(profile.name, &request.prompt, None),
        };
        self.context.store.append_turn(
            &thread_id,
            conclave_domain::Turn::user(profile.name, request.prompt.clone())
                .with_files(request.absolute_file_paths.clone())
                .with_images(request.images.clone()),
        )?;
        self.context.store.append_turn(
            &thread_id,
            conclave_domain::Turn::assistant(profile.name, response.content.clone())
                .with_model(response.model_name.clone()),
        )?;

        self.context.logger.log(ExchangeEvent::new(
            "tool_call",
            json!({
                "tool": profile.name,
                "model": response.model_name,
                "provider": response.provider.as_str(),
                "thread": thread_id.to_string(),
                "input_tokens": response.usage.input_tokens,
                "output_tokens": response.usage.output_tokens,
            }),
        ));

        let metadata = ResponseMetadata {
            model_used: Some(response.model_name.clone()),
            provider: Some(response.provider),
            tokens: Some(response.usage),
            warnings,
            ..Default::default()
        };
        Ok(ToolResponse::success(response.content, thread_id).with_metadata(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ConversationStore;
    use crate::ports::exchange_logger::NoExchangeLogger;
    use crate::ports::file_reader::{FileInfo, FileReader};
    use crate::ports::provider::{ProviderError, ProviderPort};
    use crate::registry::{ProviderRegistry, RestrictionPolicy};
    use async_trait::async_trait;
    use conclave_domain::{
        CompletionResponse, ModelCapabilities, ProviderKind, ThreadId, TokenUsage, ToolCategory,
        TurnRole,
    };
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tokio_util::sync::CancellationToken;

    // Scripted provider: answers from a queue, records incoming requests.
    struct ScriptedProvider {
        models: Vec<ModelCapabilities>,
        replies: Mutex<Vec<Result<String, ProviderError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                models: vec![
                    ModelCapabilities::new("gemini-2.5-pro", "Gemini 2.5 Pro", ProviderKind::Gemini)
                        .with_aliases(&["pro"])
                        .with_context_window(1_048_576)
                        .with_max_output_tokens(65_536)
                        .with_extended_thinking()
                        .with_intelligence_score(18),
                ],
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> CompletionRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ProviderPort for ScriptedProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Gemini
        }

        fn capabilities(&self) -> &[ModelCapabilities] {
            &self.models
        }

        async fn generate(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.seen.lock().unwrap().push(request.clone());
            let reply = self.replies.lock().unwrap().remove(0);
            reply.map(|content| {
                CompletionResponse::new(content, request.model, ProviderKind::Gemini)
                    .with_usage(TokenUsage::new(10, 5))
            })
        }
    }

    struct NoFiles;

    impl FileReader for NoFiles {
        fn read(&self, _path: &Path) -> std::io::Result<String> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "none"))
        }

        fn info(&self, _path: &Path) -> std::io::Result<FileInfo> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "none"))
        }
    }

    const CHAT: ToolProfile = ToolProfile {
        name: "chat",
        description: "General conversation",
        category: ToolCategory::General,
        system_prompt: "You are a helpful collaborator.",
    };

    fn engine_with(provider: Arc<ScriptedProvider>) -> (SimpleToolEngine, Arc<ConversationStore>) {
        let mut registry = ProviderRegistry::new(RestrictionPolicy::allow_all());
        registry.register(provider);
        let store = Arc::new(ConversationStore::new());
        let context = ToolContext {
            registry: Arc::new(registry),
            store: Arc::clone(&store),
            files: Arc::new(NoFiles),
            logger: Arc::new(NoExchangeLogger),
            cancel: CancellationToken::new(),
            expert_model: None,
        };
        (SimpleToolEngine::new(context), store)
    }

    fn request(prompt: &str) -> ToolRequest {
        ToolRequest {
            prompt: prompt.to_string(),
            model: "auto".to_string(),
            absolute_file_paths: vec![],
            images: vec![],
            continuation_id: None,
            working_directory_absolute_path: PathBuf::from("/tmp"),
            temperature: None,
            thinking_mode: None,
        }
    }

    #[tokio::test]
    async fn round_trip_records_two_turns() {
        let provider = ScriptedProvider::new(vec![Ok("4".to_string())]);
        let (engine, store) = engine_with(Arc::clone(&provider));

        let response = engine.run(&CHAT, request("2+2=?")).await.unwrap();
        assert!(response.success);
        assert_eq!(response.content.as_deref(), Some("4"));
        assert_eq!(response.metadata.model_used.as_deref(), Some("gemini-2.5-pro"));

        let thread_id = response.continuation_id.unwrap();
        let thread = store.get_thread(&thread_id).unwrap();
        assert_eq!(thread.turns.len(), 2);
        assert_eq!(thread.turns[0].role, TurnRole::User);
        assert_eq!(thread.turns[1].role, TurnRole::Assistant);
        assert_eq!(
            thread.turns[1].model_name.as_deref(),
            Some("gemini-2.5-pro")
        );
    }

    #[tokio::test]
    async fn continuation_replays_history() {
        let provider = ScriptedProvider::new(vec![
            Ok("Noted: 7".to_string()),
            Ok("You told me 7".to_string()),
        ]);
        let (engine, _store) = engine_with(Arc::clone(&provider));

        let first = engine
            .run(&CHAT, request("Remember the number 7"))
            .await
            .unwrap();
        let cid = first.continuation_id.unwrap();

        let mut follow_up = request("What number did I tell you?");
        follow_up.continuation_id = Some(cid.to_string());
        let second = engine.run(&CHAT, follow_up).await.unwrap();

        assert_eq!(second.continuation_id, Some(cid));
        let sent = provider.last_request();
        // History contains the first exchange before the new user turn.
        assert!(sent.messages.len() >= 3);
        assert!(sent.messages.iter().any(|m| m.content.contains("7")));
    }

    #[tokio::test]
    async fn unknown_continuation_downgrades_with_warning() {
        let provider = ScriptedProvider::new(vec![Ok("fresh".to_string())]);
        let (engine, _store) = engine_with(provider);

        let mut req = request("hello");
        req.continuation_id = Some(ThreadId::new().to_string());
        let response = engine.run(&CHAT, req).await.unwrap();

        assert!(response.success);
        // A new thread was started and the caller is told why.
        assert!(response.continuation_id.is_some());
        assert!(
            response
                .metadata
                .warnings
                .iter()
                .any(|w| w.contains("not found"))
        );
    }

    #[tokio::test]
    async fn failed_generate_leaves_store_unchanged() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::retryable("503"))]);
        let (engine, store) = engine_with(provider);

        let result = engine.run(&CHAT, request("hello")).await;
        assert!(matches!(
            result,
            Err(OrchestratorError::Upstream { retryable: true, .. })
        ));
        assert_eq!(store.thread_count(), 0);
    }

    #[tokio::test]
    async fn explicit_alias_resolution_is_case_insensitive() {
        let provider = ScriptedProvider::new(vec![Ok("hi".to_string()), Ok("hi".to_string())]);
        let (engine, _store) = engine_with(Arc::clone(&provider));

        let mut req = request("hello");
        req.model = "pro".to_string();
        engine.run(&CHAT, req).await.unwrap();
        assert_eq!(provider.last_request().model, "gemini-2.5-pro");

        let mut req = request("hello");
        req.model = "PRO".to_string();
        engine.run(&CHAT, req).await.unwrap();
        assert_eq!(provider.last_request().model, "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let provider = ScriptedProvider::new(vec![Ok("never".to_string())]);
        let (engine, store) = engine_with(provider);
        engine.context.cancel.cancel();

        let result = engine.run(&CHAT, request("hello")).await;
        assert!(matches!(result, Err(OrchestratorError::Cancelled)));
        assert_eq!(store.thread_count(), 0);
    }
}
