//! FFmpeg, ImageMagick and file-exists tools with Windows path conversion
//!
//! Every tool runs a throwaway container. Drive-letter paths in the
//! arguments are rebased onto the mount point, and the drive they live on is
//! bind-mounted there.

use rmcp::{
    model::{CallToolResult, Content, ErrorCode, JsonObject, Tool},
    ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::info;
use std::sync::Arc;

use super::types::*;
use crate::config::Config;
use crate::docker_client::{self, DockerRun};
use crate::rewrite::{derive_basedir, ArgRewriter};
use crate::translate::PathTranslator;

pub const FFMPEG_TOOL: &str = "ffmpeg-win";
pub const IMAGEMAGICK_TOOL: &str = "imagemagick-win";
pub const FILE_EXISTS_TOOL: &str = "file-exists-win";

pub const TOOL_COUNT: usize = 3;

/// Media tool handler
#[derive(Clone)]
pub struct MediaToolHandler {
    config: Config,
    translator: PathTranslator,
    tools: Arc<Vec<Tool>>,
}

impl MediaToolHandler {
    pub fn new(config: Config) -> Self {
        let translator = PathTranslator::new(config.mount_point.clone());
        Self {
            config,
            translator,
            tools: Arc::new(tool_table()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tool descriptors advertised by `tools/list`
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Dispatch a `tools/call` by tool name
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        match name {
            FFMPEG_TOOL => {
                let args: FfmpegArgs = parse_arguments(name, arguments)?;
                text_result(&self.run_ffmpeg(args).await)
            }
            IMAGEMAGICK_TOOL => {
                let args: ImageMagickArgs = parse_arguments(name, arguments)?;
                text_result(&self.run_imagemagick(args).await)
            }
            FILE_EXISTS_TOOL => {
                let args: FileExistsArgs = parse_arguments(name, arguments)?;
                text_result(&self.file_exists(args).await)
            }
            other => Err(McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("Unknown tool: {}", other),
                None,
            )),
        }
    }

    // =========================================================================
    // ffmpeg
    // =========================================================================

    pub fn ffmpeg_invocation(&self, args: &FfmpegArgs) -> DockerRun {
        let rewriter = ArgRewriter::new(&self.translator, Some(args.basedir.as_str()));
        DockerRun::new(&self.config.ffmpeg_image)
            .mount(rewriter.mapping().map(|m| m.mount.clone()))
            .args(rewriter.rewrite_args(&args.args))
    }

    pub async fn run_ffmpeg(&self, args: FfmpegArgs) -> InvocationResult {
        info!("ffmpeg in {}: {:?}", args.basedir, args.args);

        let invocation = self.ffmpeg_invocation(&args);
        let command = invocation.command_line(&self.config.docker_bin);

        match docker_client::run(&self.config.docker_bin, &invocation, self.config.tool_timeout).await {
            Ok(result) => InvocationResult {
                success: result.success,
                output: result.stdout,
                error: Some(result.stderr),
                command,
            },
            Err(e) => InvocationResult {
                success: false,
                output: String::new(),
                error: Some(e.to_string()),
                command,
            },
        }
    }

    // =========================================================================
    // imagemagick
    // =========================================================================

    /// Explicit `basedir` wins; otherwise the parent of the first
    /// drive-letter path in `args`.
    fn imagemagick_basedir(args: &ImageMagickArgs) -> Option<String> {
        args.basedir
            .clone()
            .filter(|b| !b.trim().is_empty())
            .or_else(|| derive_basedir(&args.args))
    }

    pub fn imagemagick_invocation(&self, args: &ImageMagickArgs) -> DockerRun {
        let basedir = Self::imagemagick_basedir(args);
        let rewriter = ArgRewriter::new(&self.translator, basedir.as_deref());
        DockerRun::new(&self.config.imagemagick_image)
            .mount(rewriter.mapping().map(|m| m.mount.clone()))
            .entrypoint("magick")
            .args(rewriter.rewrite_blob(&args.args))
    }

    pub async fn run_imagemagick(&self, args: ImageMagickArgs) -> InvocationResult {
        info!("imagemagick: {}", args.args);

        let invocation = self.imagemagick_invocation(&args);
        let command = invocation.command_line(&self.config.docker_bin);

        match docker_client::run(&self.config.docker_bin, &invocation, self.config.tool_timeout).await {
            Ok(result) => {
                // ImageMagick reports on either stream depending on the command
                let output = result.combined_output();
                InvocationResult {
                    success: result.success,
                    output: if output.is_empty() { "(no output)".to_string() } else { output },
                    error: None,
                    command,
                }
            }
            Err(e) => InvocationResult {
                success: false,
                output: String::new(),
                error: Some(e.to_string()),
                command,
            },
        }
    }

    // =========================================================================
    // file-exists
    // =========================================================================

    /// Returns the invocation and the path it tests inside the container
    pub fn file_exists_invocation(&self, path: &str) -> (DockerRun, String) {
        let basedir = derive_basedir(path);
        let rewriter = ArgRewriter::new(&self.translator, basedir.as_deref());
        let container_path = rewriter.rewrite_arg(path);

        let invocation = DockerRun::new(&self.config.busybox_image)
            .mount(rewriter.mapping().map(|m| m.mount.clone()))
            .args(["test".to_string(), "-f".to_string(), container_path.clone()]);
        (invocation, container_path)
    }

    pub async fn file_exists(&self, args: FileExistsArgs) -> FileExistsResult {
        let (invocation, container_path) = self.file_exists_invocation(&args.path);
        let command = invocation.command_line(&self.config.docker_bin);

        match docker_client::run(&self.config.docker_bin, &invocation, self.config.exists_timeout).await {
            Ok(result) => {
                info!("{} -> {} exists: {}", args.path, container_path, result.success);
                FileExistsResult {
                    exists: result.success,
                    path: args.path,
                    container_path: Some(container_path),
                    error: None,
                    command,
                }
            }
            Err(e) => FileExistsResult {
                exists: false,
                path: args.path,
                container_path: Some(container_path),
                error: Some(e.to_string()),
                command,
            },
        }
    }
}

impl Default for MediaToolHandler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, McpError> {
    serde_json::from_value(arguments).map_err(|e| {
        McpError::invalid_params(format!("Invalid arguments for {}: {}", tool, e), None)
    })
}

fn text_result<T: Serialize>(result: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(result)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn input_schema<T: JsonSchema>() -> Arc<JsonObject> {
    match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(Value::Object(map)) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

fn tool_table() -> Vec<Tool> {
    vec![
        Tool::new(
            FFMPEG_TOOL,
            "Run FFmpeg command with AUTO Windows path conversion. \
             Paths like D:/path/file.mp4 are automatically converted to /work/path/file.mp4",
            input_schema::<FfmpegArgs>(),
        ),
        Tool::new(
            IMAGEMAGICK_TOOL,
            "Run ImageMagick command with AUTO Windows path conversion. \
             Paths like D:/path/file.jpg are automatically converted",
            input_schema::<ImageMagickArgs>(),
        ),
        Tool::new(
            FILE_EXISTS_TOOL,
            "Check if a file exists with AUTO Windows path conversion",
            input_schema::<FileExistsArgs>(),
        ),
    ]
}
