//! Integration tests for media-docker MCP server

use media_docker::{Args, Config, McpServer, MediaToolHandler};
use media_docker::docker_client::{DockerError, DockerRun, ExecResult};
use media_docker::rewrite::ArgRewriter;
use media_docker::tools::{FfmpegArgs, InvocationResult, FileExistsResult};
use media_docker::translate::PathTranslator;
use clap::Parser;
use serde_json::Value;

// --- Handler creation ---

#[test]
fn test_handler_creation() {
    let config = Config::default();
    let handler = MediaToolHandler::new(config);
    assert_eq!(handler.tools().len(), 3);
}

#[test]
fn test_handler_with_full_config() {
    let config = Config {
        docker_bin: "podman".to_string(),
        ffmpeg_image: "ffmpeg:local".to_string(),
        imagemagick_image: "magick:local".to_string(),
        busybox_image: "busybox:1.36".to_string(),
        mount_point: "/mnt/host".to_string(),
        tool_timeout: std::time::Duration::from_secs(10),
        exists_timeout: std::time::Duration::from_secs(2),
    };
    let handler = MediaToolHandler::new(config);
    let invocation = handler.ffmpeg_invocation(&FfmpegArgs {
        args: vec!["-i".to_string(), "E:/clips/a.mov".to_string()],
        basedir: "E:/clips".to_string(),
    });
    assert_eq!(
        invocation.command_line(&handler.config().docker_bin),
        "podman run --rm -v E:/:/mnt/host ffmpeg:local -i /mnt/host/clips/a.mov"
    );
}

// --- Config ---

#[test]
fn test_config_from_args() {
    let args = Args::parse_from([
        "media-docker",
        "--docker-bin", "/usr/local/bin/docker",
        "--imagemagick-image", "dpokidov/imagemagick",
        "--timeout-secs", "120",
    ]);
    let config = Config::from_args(&args);
    assert_eq!(config.docker_bin, "/usr/local/bin/docker");
    assert_eq!(config.imagemagick_image, "dpokidov/imagemagick");
    assert_eq!(config.tool_timeout.as_secs(), 120);
    assert_eq!(config.exists_timeout.as_secs(), 30);
}

// --- Path translation ---

#[test]
fn test_drive_paths_map_whole_drive() {
    let translator = PathTranslator::default();
    for (base, rest) in [("D:/a/b", "a/b"), ("C:/Users/me/", "Users/me"), ("Z:/x", "x")] {
        let mapping = translator.translate(base);
        assert_eq!(mapping.container_root, format!("/work/{}", rest));
        assert_eq!(mapping.mount.host_root, format!("{}/", &base[..2]));
    }
}

#[test]
fn test_posix_paths_self_mount() {
    let translator = PathTranslator::default();
    for base in ["/srv/media", "/Users/me/Movies"] {
        let mapping = translator.translate(base);
        assert_eq!(mapping.mount.host_root, base);
        assert_eq!(mapping.mount.container_root, base);
        assert_eq!(mapping.container_root, base);
    }
}

#[test]
fn test_rewrite_idempotent_over_list() {
    let rewriter = ArgRewriter::new(&PathTranslator::default(), Some("D:/tecx/text"));
    let args: Vec<String> = [
        "-y", "-i", "D:/tecx/text/frame_preview.jpg", "-vf", "hue=s=0",
        "-frames:v", "1", "-update", "1", "D:/tecx/text/test_new_method.jpg",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let once = rewriter.rewrite_args(&args);
    assert_eq!(once[2], "/work/tecx/text/frame_preview.jpg");
    assert_eq!(once[9], "/work/tecx/text/test_new_method.jpg");
    assert_eq!(once[5], "-frames:v");
    assert_eq!(rewriter.rewrite_args(&once), once);
}

// --- Invocation assembly ---

#[test]
fn test_transcode_invocation_end_to_end() {
    let handler = MediaToolHandler::default();
    let invocation = handler.ffmpeg_invocation(&FfmpegArgs {
        args: vec!["-y", "-i", "D:/a/b/in.mp4", "out.mp4"].into_iter().map(String::from).collect(),
        basedir: "D:/a/b".to_string(),
    });
    let args = invocation.to_args();
    let v = args.iter().position(|a| a == "-v").unwrap();
    assert_eq!(args[v + 1], "D:/:/work");
    assert!(args.contains(&"/work/a/b/in.mp4".to_string()));
    assert!(!args.iter().any(|a| a.contains("D:/a/b")));
}

#[test]
fn test_docker_run_without_mount() {
    let run = DockerRun::new("busybox").args(["true"]);
    assert_eq!(run.command_line("docker"), "docker run --rm busybox true");
}

// --- Error types ---

#[test]
fn test_docker_error_display() {
    let err = DockerError::SpawnFailed("docker: not found".to_string());
    assert!(err.to_string().contains("not found"));

    let err = DockerError::Timeout(30);
    assert!(err.to_string().starts_with("Command timeout"));
}

// --- Data types ---

#[test]
fn test_exec_result_failure() {
    let result = ExecResult {
        success: false,
        stdout: String::new(),
        stderr: "magick: unable to open image".to_string(),
        exit_code: 1,
    };
    assert!(!result.success);
    assert_eq!(result.combined_output(), "magick: unable to open image");
}

#[test]
fn test_invocation_result_serialization() {
    let result = InvocationResult {
        success: true,
        output: "(no output)".to_string(),
        error: None,
        command: "docker run --rm img".to_string(),
    };
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["success"], true);
    assert!(value.get("error").is_none());

    let exists = FileExistsResult {
        exists: false,
        path: "D:/x.jpg".to_string(),
        container_path: Some("/work/x.jpg".to_string()),
        error: Some("Command timeout after 30s".to_string()),
        command: "docker run --rm busybox test -f /work/x.jpg".to_string(),
    };
    let value = serde_json::to_value(&exists).unwrap();
    assert_eq!(value["container_path"], "/work/x.jpg");
    assert_eq!(value["exists"], false);
}

// --- Protocol loop ---

#[tokio::test]
async fn test_session_over_stdio_transport() {
    let server = McpServer::new(MediaToolHandler::default());
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#, "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, "\n",
        "{broken\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#, "\n",
        r#"{"jsonrpc":"2.0","id":3,"method":"prompts/list"}"#, "\n",
    );

    let mut out = Vec::new();
    server.serve(input.as_bytes(), &mut out).await.unwrap();

    let responses: Vec<Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(responses[1]["id"], 2);
    assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 3);
    assert_eq!(responses[2]["id"], 3);
    assert_eq!(responses[2]["error"]["code"], -32601);
}

#[cfg(unix)]
#[tokio::test]
async fn test_file_exists_without_drive_letter() {
    let handler = MediaToolHandler::new(Config {
        docker_bin: "true".to_string(),
        ..Config::default()
    });
    let result = handler
        .call_tool("file-exists-win", serde_json::json!({ "path": "relative/file.jpg" }))
        .await
        .unwrap();
    let text = result.content[0].as_text().unwrap().text.clone();
    let parsed: FileExistsResult = serde_json::from_str(&text).unwrap();
    assert!(parsed.exists);
    assert_eq!(parsed.container_path.as_deref(), Some("relative/file.jpg"));
    assert!(!parsed.command.contains(" -v "));
}
