//! Media MCP tools module
//!
//! The tool table and the handlers behind `tools/call`.

pub mod media_tools;
pub mod types;

pub use media_tools::*;
pub use types::*;
