//! Media Docker MCP Server
//!
//! Runs FFmpeg and ImageMagick in throwaway Docker containers for MCP
//! clients, converting Windows drive-letter paths into container paths on
//! the way in.

pub mod config;
pub mod docker_client;
pub mod rewrite;
pub mod server;
pub mod tools;
pub mod translate;

pub use config::{Args, Config};
pub use server::McpServer;
pub use tools::MediaToolHandler;
