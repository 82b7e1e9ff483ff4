//! Port for the exchange transcript.
//!
//! The tool engines narrate what crossed the provider boundary through this
//! port: a `tool_call` event for every simple-tool exchange and a
//! `workflow_step` event for every step a workflow advances, each carrying
//! the model, thread, and token details of that exchange. Where the sink
//! writes (a JSONL file, nothing at all) is an infrastructure decision.

use serde_json::Value;

/// One transcript entry.
pub struct ExchangeEvent {
    /// Which kind of exchange this was ("tool_call", "workflow_step").
    pub event_type: &'static str,
    /// Event-specific fields; engines always pass a JSON object.
    pub payload: Value,
}

impl ExchangeEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Sink for exchange events.
///
/// `log` is synchronous and infallible by design: a tool call must never
/// fail or stall because its transcript could not be written, so sinks
/// swallow their own errors.
pub trait ExchangeLogger: Send + Sync {
    fn log(&self, event: ExchangeEvent);
}

/// Discards every event; used in tests and when transcripts are disabled.
pub struct NoExchangeLogger;

impl ExchangeLogger for NoExchangeLogger {
    fn log(&self, _event: ExchangeEvent) {}
}
