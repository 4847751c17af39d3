//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::media::{ASPECT_EPSILON, DEFAULT_ASPECT_PRESETS};
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub player: PlayerConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let player = &self.player;

        if player.start_timeout_ms == 0 {
            warnings.push("player.start_timeout_ms is 0; every launch will time out".into());
        }
        if player.pending_answer_guard == 0 {
            warnings.push(
                "player.pending_answer_guard is 0; pending queries will never hold back loading"
                    .into(),
            );
        }
        if player.osd_level > 3 {
            warnings.push(format!(
                "player.osd_level {} is out of range (0-3)",
                player.osd_level
            ));
        }
        if !(0.0..0.01).contains(&player.aspect_epsilon) {
            warnings.push(format!(
                "player.aspect_epsilon {} is outside the useful range [0, 0.01)",
                player.aspect_epsilon
            ));
        }
        for (i, preset) in player.aspect_presets.iter().enumerate() {
            if *preset <= 0.0 {
                warnings.push(format!("player.aspect_presets[{i}] must be positive"));
            }
        }

        for (name, path) in [
            ("tools.mplayer_path", &self.tools.mplayer_path),
            ("tools.mpv_path", &self.tools.mpv_path),
        ] {
            if let Some(p) = path {
                if !p.exists() {
                    warnings.push(format!(
                        "{name} {} does not exist; PATH will be searched",
                        p.display()
                    ));
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Which backend dialect to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    MPlayer,
    #[default]
    Mpv,
}

impl BackendKind {
    /// Executable name searched for on `PATH`.
    pub fn program(self) -> &'static str {
        match self {
            Self::MPlayer => "mplayer",
            Self::Mpv => "mpv",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.program())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mplayer" => Ok(Self::MPlayer),
            "mpv" => Ok(Self::Mpv),
            other => Err(Error::Validation(format!("unknown backend '{other}'"))),
        }
    }
}

/// Session behaviour shared by both backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub backend: BackendKind,
    /// How long to wait for the OS to confirm the process start.
    pub start_timeout_ms: u64,
    /// Default OSD level applied to every session.
    pub osd_level: u8,
    /// Lines to wait for outstanding query answers before giving up.
    pub pending_answer_guard: u32,
    /// Quit this long before a DVD title ends when a title switch is seen.
    pub title_end_margin_ms: u64,
    /// Lead-in allowed before a delayed CD title switch is committed.
    pub title_switch_lead_in_ms: u64,
    pub aspect_epsilon: f64,
    pub aspect_presets: Vec<f64>,
    pub video_output: Option<String>,
    pub audio_output: Option<String>,
    /// Additional arguments appended verbatim before the media locator.
    pub extra_args: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            start_timeout_ms: 10_000,
            osd_level: 1,
            pending_answer_guard: 100,
            title_end_margin_ms: 400,
            title_switch_lead_in_ms: 1_000,
            aspect_epsilon: ASPECT_EPSILON,
            aspect_presets: DEFAULT_ASPECT_PRESETS.to_vec(),
            video_output: None,
            audio_output: None,
            extra_args: Vec::new(),
        }
    }
}

/// Paths to backend executables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub mplayer_path: Option<PathBuf>,
    pub mpv_path: Option<PathBuf>,
}

impl ToolsConfig {
    pub fn path_for(&self, backend: BackendKind) -> Option<&Path> {
        match backend {
            BackendKind::MPlayer => self.mplayer_path.as_deref(),
            BackendKind::Mpv => self.mpv_path.as_deref(),
        }
    }
}
