//! Line-delimited JSON-RPC server over stdio.
//!
//! One JSON object per line on stdin; responses are written one per line to
//! stdout through a single writer task, so concurrent tool calls never
//! interleave bytes. Each request is handled in its own task, so slow provider
//! calls do not block the read loop.

use super::protocol::{
    INVALID_PARAMS, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR,
    ToolCallParams,
};
use conclave_application::{Dispatcher, ProviderRegistry};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// The stdio protocol server.
pub struct StdioServer {
    dispatcher: Arc<Dispatcher>,
    registry: Arc<ProviderRegistry>,
    cancel: CancellationToken,
}

impl StdioServer {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        registry: Arc<ProviderRegistry>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            dispatcher,
            registry,
            cancel,
        }
    }

    /// Serve until stdin closes or the cancellation token fires.
    pub async fn run(&self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        // Single writer task; handlers send completed lines through it.
        let (tx, mut rx) = mpsc::channel::<String>(64);
        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(line) = rx.recv().await {
                if stdout.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if stdout.write_all(b"\n").await.is_err() {
                    break;
                }
                let _ = stdout.flush().await;
            }
        });

        info!("stdio server ready");
        loop {
            let line = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("shutdown requested");
                    break;
                }
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                debug!("stdin closed");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(request) => request,
                Err(e) => {
                    let response = JsonRpcResponse::error(
                        Value::Null,
                        PARSE_ERROR,
                        format!("unparseable request: {}", e),
                    );
                    send_response(&tx, response).await;
                    continue;
                }
            };

            let dispatcher = Arc::clone(&self.dispatcher);
            let registry = Arc::clone(&self.registry);
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = handle_request(&dispatcher, &registry, request).await {
                    send_response(&tx, response).await;
                }
            });
        }

        drop(tx);
        let _ = writer.await;
        Ok(())
    }
}

async fn send_response(tx: &mpsc::Sender<String>, response: JsonRpcResponse) {
    match serde_json::to_string(&response) {
        Ok(line) => {
            let _ = tx.send(line).await;
        }
        Err(e) => error!("failed to serialize response: {}", e),
    }
}

/// Route one request; `None` for notifications (no id).
async fn handle_request(
    dispatcher: &Dispatcher,
    registry: &ProviderRegistry,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    let id = request.id?;

    let response = match request.method.as_str() {
        "tools/call" => {
            let params: ToolCallParams =
                match serde_json::from_value(request.params.unwrap_or(Value::Null)) {
                    Ok(params) => params,
                    Err(e) => {
                        return Some(JsonRpcResponse::error(
                            id,
                            INVALID_PARAMS,
                            format!("invalid tools/call params: {}", e),
                        ));
                    }
                };
            debug!("tools/call {}", params.name);
            let result = dispatcher.dispatch(&params.name, params.arguments).await;
            match serde_json::to_value(&result) {
                Ok(value) => JsonRpcResponse::result(id, value),
                Err(e) => JsonRpcResponse::error(id, PARSE_ERROR, e.to_string()),
            }
        }
        "tools/list" => {
            let tools = dispatcher.tool_infos();
            JsonRpcResponse::result(id, json!({ "tools": tools }))
        }
        "models/list" => {
            let providers = registry.catalog();
            JsonRpcResponse::result(id, json!({ "providers": providers }))
        }
        other => JsonRpcResponse::error(
            id,
            METHOD_NOT_FOUND,
            format!("unknown method: {}", other),
        ),
    };
    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_application::RestrictionPolicy;
    use serde_json::json;

    fn empty_fixture() -> (Dispatcher, ProviderRegistry) {
        (
            Dispatcher::new(vec![]),
            ProviderRegistry::new(RestrictionPolicy::allow_all()),
        )
    }

    fn request(method: &str, id: Option<Value>, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id,
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let (dispatcher, registry) = empty_fixture();
        let response =
            handle_request(&dispatcher, &registry, request("tools/list", None, None)).await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let (dispatcher, registry) = empty_fixture();
        let response = handle_request(
            &dispatcher,
            &registry,
            request("sessions/create", Some(json!(1)), None),
        )
        .await
        .unwrap();
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn tools_list_returns_registered_tools() {
        let (dispatcher, registry) = empty_fixture();
        let response = handle_request(
            &dispatcher,
            &registry,
            request("tools/list", Some(json!(2)), None),
        )
        .await
        .unwrap();
        let result = response.result.unwrap();
        assert!(result["tools"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn models_list_returns_provider_catalog() {
        let (dispatcher, registry) = empty_fixture();
        let response = handle_request(
            &dispatcher,
            &registry,
            request("models/list", Some(json!(3)), None),
        )
        .await
        .unwrap();
        let result = response.result.unwrap();
        assert!(result["providers"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tool_call_with_bad_params_is_invalid_params() {
        let (dispatcher, registry) = empty_fixture();
        let response = handle_request(
            &dispatcher,
            &registry,
            request("tools/call", Some(json!(4)), Some(json!({ "no_name": true }))),
        )
        .await
        .unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn tool_call_errors_come_back_as_results() {
        // Tool-level failures are results with success=false, not RPC errors.
        let (dispatcher, registry) = empty_fixture();
        let response = handle_request(
            &dispatcher,
            &registry,
            request(
                "tools/call",
                Some(json!(5)),
                Some(json!({ "name": "chat", "arguments": {} })),
            ),
        )
        .await
        .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["success"], false);
        assert_eq!(result["error"]["kind"], "unknown_tool");
    }
}
