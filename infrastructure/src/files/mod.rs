//! Local file system access for request-referenced files.

mod local;

pub use local::LocalFileReader;
