//! Rewrites host paths inside tool arguments into container paths

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::translate::{join_mount_point, normalize_separators, PathMapping, PathTranslator};

// A drive letter not glued to a preceding word character, so `http://`
// and `concat:` are left alone. The path runs to whitespace, a quote or a
// list separator.
static EMBEDDED_DRIVE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|[^A-Za-z0-9])([A-Za-z]):[/\\]([^\s"'|;]*)"#).expect("embedded drive path regex")
});

static FIRST_DRIVE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9])([A-Za-z]:[/\\]\S+)").expect("first drive path regex")
});

/// Find the first drive-letter path in `text` and return its parent
/// directory, e.g. `-resize 50% D:/a/b/in.png out.png` -> `D:/a/b`.
pub fn derive_basedir(text: &str) -> Option<String> {
    let caps = FIRST_DRIVE_PATH.captures(text)?;
    let path = caps.get(1)?.as_str();
    let path = path.rsplit_once('/').map_or(path, |(parent, _)| parent);
    let path = path.rsplit_once('\\').map_or(path, |(parent, _)| parent);
    Some(path.to_string())
}

#[derive(Debug, Clone)]
struct Base {
    /// Normalised base used for substring matching; `None` for bare drive
    /// roots, which the drive-path fallback already covers.
    needle: Option<String>,
    mapping: PathMapping,
}

/// Rewrites arguments for one tool call against an optional base directory.
///
/// Precedence per argument: the explicit base directory is substituted
/// first, then any remaining drive-letter path is rebased onto the mount
/// point regardless of its drive letter.
#[derive(Debug, Clone)]
pub struct ArgRewriter {
    mount_point: String,
    base: Option<Base>,
}

impl ArgRewriter {
    pub fn new(translator: &PathTranslator, basedir: Option<&str>) -> Self {
        let base = basedir
            .filter(|b| !b.trim().is_empty())
            .map(|b| {
                let normalized = normalize_separators(b);
                let trimmed = normalized.trim_end_matches('/');
                let bare_drive = trimmed.len() == 2 && trimmed.ends_with(':');
                Base {
                    needle: (!trimmed.is_empty() && !bare_drive).then(|| trimmed.to_string()),
                    mapping: translator.translate(b),
                }
            });

        Self {
            mount_point: translator.mount_point().to_string(),
            base,
        }
    }

    /// The mount implied by the base directory, if one was given
    pub fn mapping(&self) -> Option<&PathMapping> {
        self.base.as_ref().map(|b| &b.mapping)
    }

    pub fn rewrite_arg(&self, arg: &str) -> String {
        let substituted = match &self.base {
            Some(Base { needle: Some(needle), mapping }) if arg.contains(needle.as_str()) => {
                arg.replace(needle.as_str(), &mapping.container_root)
            }
            _ => arg.to_string(),
        };

        let rewritten = self.rewrite_drive_paths(&substituted);
        if rewritten != arg {
            debug!("Rewrote argument '{}' -> '{}'", arg, rewritten);
        }
        rewritten
    }

    pub fn rewrite_args(&self, args: &[String]) -> Vec<String> {
        args.iter().map(|a| self.rewrite_arg(a)).collect()
    }

    /// Rewrite a whitespace-separated argument string and split it
    pub fn rewrite_blob(&self, blob: &str) -> Vec<String> {
        self.rewrite_arg(blob)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Rebase every drive-letter path in `text`.
    ///
    /// A match's remainder can itself hold further drive paths
    /// (`C:/x.png,D:/y.png`), so it is rescanned before joining. The
    /// remainder is strictly shorter than the input, which bounds the
    /// recursion.
    fn rewrite_drive_paths(&self, text: &str) -> String {
        EMBEDDED_DRIVE_PATH
            .replace_all(text, |caps: &Captures| {
                let drive = &caps[2];
                self.check_drive_mounted(drive);
                let remainder = normalize_separators(&self.rewrite_drive_paths(&caps[3]));
                format!("{}{}", &caps[1], join_mount_point(&self.mount_point, &remainder))
            })
            .into_owned()
    }

    fn check_drive_mounted(&self, drive: &str) {
        let mounted = self
            .mapping()
            .and_then(|m| m.mount.host_root.strip_suffix(":/"))
            .is_some_and(|d| d.eq_ignore_ascii_case(drive));
        if !mounted {
            warn!("Drive {}: is not mounted; path rewritten to {} anyway", drive, self.mount_point);
        }
    }
}
