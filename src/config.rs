//! Configuration for the media-docker MCP server

use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;

pub const DEFAULT_FFMPEG_IMAGE: &str = "zuozuoliang999/ffmpeg:7.1-cli";
pub const DEFAULT_IMAGEMAGICK_IMAGE: &str = "zuozuoliang999/imagemagick:latest";
pub const DEFAULT_BUSYBOX_IMAGE: &str = "zuozuoliang999/busybox:latest";
pub const DEFAULT_MOUNT_POINT: &str = "/work";

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "media-docker")]
#[command(about = "MCP server for FFmpeg/ImageMagick in Docker with Windows path conversion")]
#[command(version)]
pub struct Args {
    /// Container runtime binary
    #[arg(long, default_value = "docker")]
    pub docker_bin: String,

    /// Image used by the ffmpeg tool
    #[arg(long, default_value = DEFAULT_FFMPEG_IMAGE)]
    pub ffmpeg_image: String,

    /// Image used by the imagemagick tool
    #[arg(long, default_value = DEFAULT_IMAGEMAGICK_IMAGE)]
    pub imagemagick_image: String,

    /// Image used by the file-exists tool
    #[arg(long, default_value = DEFAULT_BUSYBOX_IMAGE)]
    pub busybox_image: String,

    /// Container directory a host drive is mounted on
    #[arg(long, default_value = DEFAULT_MOUNT_POINT)]
    pub mount_point: String,

    /// Timeout for ffmpeg and imagemagick runs, in seconds
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    /// Timeout for file existence checks, in seconds
    #[arg(long, default_value_t = 30)]
    pub exists_timeout_secs: u64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log file path (defaults to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub docker_bin: String,
    pub ffmpeg_image: String,
    pub imagemagick_image: String,
    pub busybox_image: String,
    pub mount_point: String,
    pub tool_timeout: Duration,
    pub exists_timeout: Duration,
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        Self {
            docker_bin: args.docker_bin.clone(),
            ffmpeg_image: args.ffmpeg_image.clone(),
            imagemagick_image: args.imagemagick_image.clone(),
            busybox_image: args.busybox_image.clone(),
            mount_point: args.mount_point.clone(),
            tool_timeout: Duration::from_secs(args.timeout_secs),
            exists_timeout: Duration::from_secs(args.exists_timeout_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docker_bin: "docker".to_string(),
            ffmpeg_image: DEFAULT_FFMPEG_IMAGE.to_string(),
            imagemagick_image: DEFAULT_IMAGEMAGICK_IMAGE.to_string(),
            busybox_image: DEFAULT_BUSYBOX_IMAGE.to_string(),
            mount_point: DEFAULT_MOUNT_POINT.to_string(),
            tool_timeout: Duration::from_secs(300),
            exists_timeout: Duration::from_secs(30),
        }
    }
}
