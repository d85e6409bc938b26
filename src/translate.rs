//! Host path to container path translation
//!
//! A drive-letter base such as `D:/tecx/text` cannot be bind-mounted onto
//! itself inside a Linux container, so the whole drive is mounted on a fixed
//! mount point instead and paths are rebased onto it:
//!
//! - `D:/tecx/text` -> mount `D:/:/work`, container root `/work/tecx/text`
//! - `/home/me/clips` -> mount `/home/me/clips:/home/me/clips`, root unchanged

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static DRIVE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]):/?(.*)$").expect("drive path regex")
});

/// Bind mount handed to the container runtime as `-v host:container`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    pub host_root: String,
    pub container_root: String,
}

impl fmt::Display for MountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_root, self.container_root)
    }
}

/// Result of translating a base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    pub mount: MountSpec,
    /// The base directory as seen inside the container
    pub container_root: String,
}

/// Replace Windows separators with `/`
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Join a drive-relative remainder onto the mount point.
///
/// An empty remainder maps to the mount point itself; trailing separators
/// are stripped.
pub fn join_mount_point(mount_point: &str, remainder: &str) -> String {
    let remainder = remainder.trim_matches('/');
    if remainder.is_empty() {
        mount_point.to_string()
    } else {
        format!("{}/{}", mount_point.trim_end_matches('/'), remainder)
    }
}

#[derive(Debug, Clone)]
pub struct PathTranslator {
    mount_point: String,
}

impl PathTranslator {
    pub fn new(mount_point: impl Into<String>) -> Self {
        Self { mount_point: mount_point.into() }
    }

    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    /// Translate a base directory into a mount and its in-container root.
    ///
    /// Never fails: anything that is not a drive-letter path is treated as
    /// a POSIX path and mounted onto itself.
    pub fn translate(&self, base: &str) -> PathMapping {
        let base = normalize_separators(base);

        if let Some(caps) = DRIVE_PATH.captures(&base) {
            let drive = &caps[1];
            let remainder = &caps[2];
            return PathMapping {
                mount: MountSpec {
                    host_root: format!("{}:/", drive),
                    container_root: self.mount_point.clone(),
                },
                container_root: join_mount_point(&self.mount_point, remainder),
            };
        }

        PathMapping {
            mount: MountSpec {
                host_root: base.clone(),
                container_root: base.clone(),
            },
            container_root: base,
        }
    }
}

impl Default for PathTranslator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MOUNT_POINT)
    }
}
