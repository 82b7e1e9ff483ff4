//! Tool dispatch.

pub mod dispatcher;

pub use dispatcher::{Dispatcher, ToolInfo};
