//! Type definitions for media-docker MCP tools

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

// ============================================================================
// ffmpeg-win
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FfmpegArgs {
    /// Arguments to pass to ffmpeg. Windows paths (D:/xxx) are auto-converted to container paths (/work/xxx)
    pub args: Vec<String>,
    /// Base directory (e.g. D:/tecx/text). The drive letter will be mapped to /work
    pub basedir: String,
}

// ============================================================================
// imagemagick-win
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImageMagickArgs {
    /// The arguments to pass to imagemagick. Windows paths are auto-converted
    pub args: String,
    /// Base directory for file paths (e.g. D:/tecx/text)
    #[serde(default)]
    pub basedir: Option<String>,
}

// ============================================================================
// file-exists-win
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileExistsArgs {
    /// Full file path (e.g. D:/tecx/text/file.jpg). Auto-converts to container path
    pub path: String,
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of an ffmpeg or imagemagick run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationResult {
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub command: String,
}

/// Outcome of a file existence check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileExistsResult {
    pub exists: bool,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub command: String,
}
