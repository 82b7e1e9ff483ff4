//! JSONL sink for the exchange transcript.
//!
//! The tracing log describes what the server did; the transcript records
//! what the models were asked and answered. The engines emit one event per
//! `tool_call` and `workflow_step`, carrying model, provider, thread id,
//! token counts, and expert-consultation outcomes, and each event becomes
//! one line here. A session can be reconstructed from this file alone.

use chrono::{SecondsFormat, Utc};
use conclave_application::ports::exchange_logger::{ExchangeEvent, ExchangeLogger};
use serde_json::{Map, Value, json};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Appends exchange events to a JSONL file, one object per line.
///
/// Lines are enveloped as `{"ts": ..., "event": ..., <event fields>}`. The
/// file is opened in append mode, so a restarted server pointed at an
/// existing path continues the same transcript.
pub struct JsonlExchangeLogger {
    sink: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlExchangeLogger {
    /// Open (or create) the transcript at `path`, creating parent
    /// directories as needed.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            sink: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wrap an event in the transcript envelope.
    ///
    /// Object payloads are inlined next to `ts`/`event`; anything else lands
    /// under a `payload` key. Engines only emit object payloads, so the
    /// fallback exists for forward compatibility, not for current callers.
    fn envelope(event: ExchangeEvent) -> Value {
        let mut record = Map::new();
        record.insert(
            "ts".to_string(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        record.insert("event".to_string(), json!(event.event_type));
        match event.payload {
            Value::Object(fields) => record.extend(fields),
            other => {
                record.insert("payload".to_string(), other);
            }
        }
        Value::Object(record)
    }
}

impl ExchangeLogger for JsonlExchangeLogger {
    fn log(&self, event: ExchangeEvent) {
        let record = Self::envelope(event);
        let Ok(mut sink) = self.sink.lock() else {
            return;
        };
        // Every line hits disk immediately; a transcript that loses its tail
        // on a crash is useless for replaying the session.
        if serde_json::to_writer(&mut *sink, &record).is_ok() {
            let _ = sink.write_all(b"\n");
            let _ = sink.flush();
        }
    }
}
