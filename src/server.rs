//! Line-delimited JSON-RPC 2.0 loop
//!
//! One request per input line, one response line per request. Lines that do
//! not decode are dropped without a reply, and only end of input stops the
//! loop. Requests are handled one at a time, tool runs included.

use rmcp::{
    model::{ErrorCode, ProtocolVersion, ServerCapabilities},
    ErrorData as McpError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::tools::{MediaToolHandler, TOOL_COUNT};

pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    pub fn error(id: Value, error: McpError) -> Self {
        Self { jsonrpc: "2.0", id, result: None, error: Some(error) }
    }
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

pub struct McpServer {
    handler: MediaToolHandler,
}

impl McpServer {
    pub fn new(handler: MediaToolHandler) -> Self {
        Self { handler }
    }

    /// Serve requests from `reader` until end of input.
    ///
    /// Only I/O errors on the transport itself end the loop early.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }

            let Some(response) = self.handle_line(&line).await else {
                continue;
            };

            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }

        info!("Input closed, shutting down");
        Ok(())
    }

    /// Decode and handle one raw input line
    pub async fn handle_line(&self, line: &[u8]) -> Option<RpcResponse> {
        if line.iter().all(u8::is_ascii_whitespace) {
            return None;
        }

        match serde_json::from_slice::<RpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Skipping undecodable line: {}", e);
                None
            }
        }
    }

    pub async fn handle_request(&self, request: RpcRequest) -> Option<RpcResponse> {
        debug!("Request id={} method={}", request.id, request.method);

        if request.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
            debug!("Unexpected jsonrpc version {:?}", request.jsonrpc);
        }

        let id = request.id;
        let outcome = match request.method.as_str() {
            METHOD_INITIALIZE => Ok(self.initialize_result()),
            METHOD_INITIALIZED => {
                info!("Client initialized, {} tools available", TOOL_COUNT);
                return None;
            }
            METHOD_TOOLS_LIST => Ok(json!({ "tools": self.handler.tools() })),
            METHOD_TOOLS_CALL => self.call_tool(request.params).await,
            other if id.is_null() => {
                debug!("Ignoring notification {}", other);
                return None;
            }
            other => Err(McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
                None,
            )),
        };

        Some(match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => {
                warn!("Request {} failed: {}", id, error.message);
                RpcResponse::error(id, error)
            }
        })
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": ProtocolVersion::V_2024_11_05,
            "capabilities": ServerCapabilities::builder().enable_tools().build(),
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
            },
            "instructions": format!(
                "Media MCP Server - FFmpeg, ImageMagick and file checks in Docker. \
                 {} tools available: ffmpeg-win, imagemagick-win, file-exists-win. \
                 Windows paths like D:/dir/file are converted to {}/dir/file automatically.",
                TOOL_COUNT,
                self.handler.config().mount_point,
            ),
        })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, McpError> {
        let params: CallToolParams = serde_json::from_value(params).map_err(|e| {
            McpError::invalid_params(format!("Invalid tools/call params: {}", e), None)
        })?;
        let arguments = params.arguments.unwrap_or_else(|| json!({}));

        info!("Calling tool {}", params.name);
        let result = self.handler.call_tool(&params.name, arguments).await?;

        serde_json::to_value(result)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))
    }
}
