//! Stdio JSON-RPC server exposing the tool dispatcher.

pub mod protocol;
pub mod stdio;

pub use protocol::{JsonRpcRequest, JsonRpcResponse, RpcError, ToolCallParams};
pub use stdio::StdioServer;
