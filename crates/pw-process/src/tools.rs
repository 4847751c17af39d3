//! Backend executable discovery.
//!
//! A configured path wins when it exists; otherwise `PATH` is searched with
//! [`which::which`].

use std::path::{Path, PathBuf};

use pw_core::config::{BackendKind, ToolsConfig};
use serde::{Deserialize, Serialize};

const BACKENDS: [BackendKind; 2] = [BackendKind::MPlayer, BackendKind::Mpv];

/// Availability information for one backend, returned by [`check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendInfo {
    pub backend: BackendKind,
    pub available: bool,
    /// First line of the version banner, if the backend printed one.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Resolve the executable for `backend`, or `None` if it cannot be found.
pub fn resolve(backend: BackendKind, tools: &ToolsConfig) -> Option<PathBuf> {
    match tools.path_for(backend) {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => {
            tracing::debug!(
                "Configured {backend} path {} does not exist; searching PATH",
                p.display()
            );
            which::which(backend.program()).ok()
        }
        None => which::which(backend.program()).ok(),
    }
}

/// Like [`resolve`] but reports a launch error when nothing is found.
pub fn locate(backend: BackendKind, tools: &ToolsConfig) -> pw_core::Result<PathBuf> {
    resolve(backend, tools).ok_or_else(|| {
        pw_core::Error::launch(
            backend.program(),
            format!("{} not found; is it installed and in PATH?", backend.program()),
        )
    })
}

/// Check every supported backend and return availability information.
pub fn check_all(tools: &ToolsConfig) -> Vec<BackendInfo> {
    BACKENDS
        .iter()
        .map(|&backend| match resolve(backend, tools) {
            Some(path) => BackendInfo {
                backend,
                available: true,
                version: detect_version(backend, &path),
                path: Some(path),
            },
            None => BackendInfo {
                backend,
                available: false,
                version: None,
                path: None,
            },
        })
        .collect()
}

/// MPlayer prints its banner on any invocation; MPV wants `--version`.
fn detect_version(backend: BackendKind, path: &Path) -> Option<String> {
    let args: &[&str] = match backend {
        BackendKind::MPlayer => &[],
        BackendKind::Mpv => &["--version"],
    };

    let output = std::process::Command::new(path).args(args).output().ok()?;

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
