//! Infrastructure layer for conclave
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: provider backends, file access, exchange
//! logging, configuration file loading, and the stdio protocol server.

pub mod config;
pub mod files;
pub mod logging;
pub mod providers;
pub mod server;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use files::LocalFileReader;
pub use logging::JsonlExchangeLogger;
pub use providers::{GeminiProvider, OpenAiProvider, XaiProvider};
pub use server::StdioServer;
