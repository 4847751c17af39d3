//! Options that shape a backend command line.

use std::path::PathBuf;

use pw_core::config::PlayerConfig;
use pw_core::{Locator, SubtitleKey, Time};
use serde::{Deserialize, Serialize};

use crate::command::{AudioFilter, VideoFilter};
use crate::style::SubtitleStyle;

/// Everything a dialect needs to render launch arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchOptions {
    pub locator: Locator,
    /// Resume position in GUI time.
    pub start: Option<Time>,
    pub volume: Option<u32>,
    pub mute: bool,
    pub speed: Option<f64>,
    pub osd_level: u8,
    /// Native window to embed the video into.
    pub window_id: Option<u64>,
    pub video_output: Option<String>,
    pub audio_output: Option<String>,
    pub audio_track: Option<u32>,
    pub subtitle: Option<SubtitleKey>,
    pub subtitle_files: Vec<PathBuf>,
    pub angle: Option<u32>,
    pub video_filters: Vec<VideoFilter>,
    pub audio_filters: Vec<AudioFilter>,
    pub subtitle_style: Option<SubtitleStyle>,
    /// Record the input stream to this file while playing.
    pub capture_file: Option<PathBuf>,
    pub screenshot_dir: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

impl LaunchOptions {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            start: None,
            volume: None,
            mute: false,
            speed: None,
            osd_level: 1,
            window_id: None,
            video_output: None,
            audio_output: None,
            audio_track: None,
            subtitle: None,
            subtitle_files: Vec::new(),
            angle: None,
            video_filters: Vec::new(),
            audio_filters: Vec::new(),
            subtitle_style: None,
            capture_file: None,
            screenshot_dir: None,
            extra_args: Vec::new(),
        }
    }

    /// Seed options from the session defaults in `config`.
    pub fn from_config(locator: Locator, config: &PlayerConfig) -> Self {
        Self {
            osd_level: config.osd_level,
            video_output: config.video_output.clone(),
            audio_output: config.audio_output.clone(),
            extra_args: config.extra_args.clone(),
            ..Self::new(locator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_copies_session_defaults() {
        let config = PlayerConfig {
            osd_level: 3,
            video_output: Some("gpu".into()),
            extra_args: vec!["--hwdec=auto".into()],
            ..PlayerConfig::default()
        };
        let opts = LaunchOptions::from_config(Locator::parse("/tmp/a.mkv"), &config);
        assert_eq!(opts.osd_level, 3);
        assert_eq!(opts.video_output.as_deref(), Some("gpu"));
        assert_eq!(opts.extra_args, vec!["--hwdec=auto".to_string()]);
        assert!(opts.audio_output.is_none());
    }
}
