//! Backend-independent command surface.
//!
//! Each [`PlayerCommand`] is translated by the active dialect into zero or
//! more lines of the backend's input protocol. Combinations a backend cannot
//! express translate to nothing.

use std::path::PathBuf;

use pw_core::{SubtitleKey, Time};
use serde::{Deserialize, Serialize};

use crate::style::SubtitleStyle;

/// Where a seek should land.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekTarget {
    /// Offset from the current position.
    Relative(Time),
    /// Percentage of the duration, 0-100.
    Percent(f64),
    /// GUI time; translated to player time before sending.
    Absolute(Time),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PlayerCommand {
    SelectVideo {
        id: u32,
    },
    SelectAudio {
        id: u32,
    },
    /// `None` disables the primary subtitle.
    SelectSubtitle {
        key: Option<SubtitleKey>,
    },
    /// `None` disables the secondary subtitle.
    SelectSecondarySubtitle {
        key: Option<SubtitleKey>,
    },
    SetSubtitleVisible {
        visible: bool,
    },
    Seek {
        target: SeekTarget,
        /// Exact seek instead of snapping to the nearest keyframe.
        precise: bool,
    },
    SetVolume {
        volume: u32,
    },
    SetMute {
        mute: bool,
    },
    TogglePause,
    FrameStep,
    FrameBackStep,
    SetVideoFilter {
        filter: VideoFilter,
        enabled: bool,
    },
    SetAudioFilter {
        filter: AudioFilter,
        enabled: bool,
    },
    SetAngle {
        angle: u32,
    },
    SetSpeed {
        speed: f64,
    },
    Screenshot,
    /// Toggle saving every frame as a screenshot.
    ToggleScreenshots,
    StartCapture {
        path: PathBuf,
    },
    StopCapture,
    SetSubtitleStyle {
        style: SubtitleStyle,
    },
    SetOsdLevel {
        level: u8,
    },
}

impl PlayerCommand {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectVideo { .. } => "select_video",
            Self::SelectAudio { .. } => "select_audio",
            Self::SelectSubtitle { .. } => "select_subtitle",
            Self::SelectSecondarySubtitle { .. } => "select_secondary_subtitle",
            Self::SetSubtitleVisible { .. } => "set_subtitle_visible",
            Self::Seek { .. } => "seek",
            Self::SetVolume { .. } => "set_volume",
            Self::SetMute { .. } => "set_mute",
            Self::TogglePause => "toggle_pause",
            Self::FrameStep => "frame_step",
            Self::FrameBackStep => "frame_back_step",
            Self::SetVideoFilter { .. } => "set_video_filter",
            Self::SetAudioFilter { .. } => "set_audio_filter",
            Self::SetAngle { .. } => "set_angle",
            Self::SetSpeed { .. } => "set_speed",
            Self::Screenshot => "screenshot",
            Self::ToggleScreenshots => "toggle_screenshots",
            Self::StartCapture { .. } => "start_capture",
            Self::StopCapture => "stop_capture",
            Self::SetSubtitleStyle { .. } => "set_subtitle_style",
            Self::SetOsdLevel { .. } => "set_osd_level",
        }
    }
}

// ---------------------------------------------------------------------------
// Video filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deinterlace {
    Yadif,
    /// Yadif outputting one frame per field.
    YadifDouble,
    /// Lowpass5 postprocessing deinterlacer.
    L5,
    /// Linear blend.
    Lb,
    Kerndeint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
    UpsideDown,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Self::Clockwise => 90,
            Self::UpsideDown => 180,
            Self::CounterClockwise => 270,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denoise {
    Normal,
    Soft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum VideoFilter {
    Deinterlace { method: Deinterlace },
    Rotate { rotation: Rotation },
    Flip,
    Mirror,
    Crop { width: u32, height: u32, x: u32, y: u32 },
    Denoise { strength: Denoise },
    Deblock,
    Sharpen,
    Blur,
    /// Stereo 3D remap, e.g. `sbsl` to `arcd`.
    Stereo3d { input: String, output: String },
}

impl VideoFilter {
    /// Stable label used to add and remove the filter at runtime.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Deinterlace { .. } => "deinterlace",
            Self::Rotate { .. } => "rotate",
            Self::Flip => "flip",
            Self::Mirror => "mirror",
            Self::Crop { .. } => "crop",
            Self::Denoise { .. } => "denoise",
            Self::Deblock => "deblock",
            Self::Sharpen => "sharpen",
            Self::Blur => "blur",
            Self::Stereo3d { .. } => "stereo3d",
        }
    }

    /// MPlayer `-vf` filter text.
    pub fn mplayer_filter(&self) -> String {
        match self {
            Self::Deinterlace { method } => match method {
                Deinterlace::Yadif => "yadif".into(),
                Deinterlace::YadifDouble => "yadif=1".into(),
                Deinterlace::L5 => "pp=l5".into(),
                Deinterlace::Lb => "pp=lb".into(),
                Deinterlace::Kerndeint => "kerndeint=5".into(),
            },
            Self::Rotate { rotation } => match rotation {
                Rotation::Clockwise => "rotate=1".into(),
                Rotation::CounterClockwise => "rotate=2".into(),
                Rotation::UpsideDown => "flip,mirror".into(),
            },
            Self::Flip => "flip".into(),
            Self::Mirror => "mirror".into(),
            Self::Crop {
                width,
                height,
                x,
                y,
            } => format!("crop={width}:{height}:{x}:{y}"),
            Self::Denoise { strength } => match strength {
                Denoise::Normal => "hqdn3d".into(),
                Denoise::Soft => "hqdn3d=2:1:2".into(),
            },
            Self::Deblock => "pp=vb/hb".into(),
            Self::Sharpen => "unsharp=lc:0.75:cc:0.75".into(),
            Self::Blur => "unsharp=lc:-0.75:cc:-0.75".into(),
            Self::Stereo3d { input, output } => format!("stereo3d={input}:{output}"),
        }
    }

    /// MPV `--vf` filter text, or `None` when MPV expresses the effect as a
    /// property instead of a filter.
    pub fn mpv_filter(&self) -> Option<String> {
        let body = match self {
            Self::Deinterlace { method } => match method {
                Deinterlace::Yadif => "yadif".to_string(),
                Deinterlace::YadifDouble => "lavfi=[yadif=1]".into(),
                Deinterlace::L5 => "lavfi=[pp=l5]".into(),
                Deinterlace::Lb => "lavfi=[pp=lb]".into(),
                Deinterlace::Kerndeint => "lavfi=[kerndeint=thresh=5]".into(),
            },
            Self::Rotate { .. } => return None,
            Self::Flip => "vflip".into(),
            Self::Mirror => "hflip".into(),
            Self::Crop {
                width,
                height,
                x,
                y,
            } => format!("lavfi=[crop={width}:{height}:{x}:{y}]"),
            Self::Denoise { strength } => match strength {
                Denoise::Normal => "lavfi=[hqdn3d]".into(),
                Denoise::Soft => "lavfi=[hqdn3d=2:1:2]".into(),
            },
            Self::Deblock => "lavfi=[pp=vb/hb]".into(),
            Self::Sharpen => "lavfi=[unsharp=5:5:0.75:5:5:0.75]".into(),
            Self::Blur => "lavfi=[unsharp=5:5:-0.75:5:5:-0.75]".into(),
            Self::Stereo3d { input, output } => format!("lavfi=[stereo3d={input}:{output}]"),
        };
        Some(format!("@{}:{body}", self.label()))
    }
}

// ---------------------------------------------------------------------------
// Audio filters
// ---------------------------------------------------------------------------

/// Stereo channel routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelMode {
    Stereo,
    Left,
    Right,
    Reverse,
    Mono,
}

/// Equalizer band centre frequencies in Hz.
pub const EQUALIZER_BANDS: [u32; 10] = [31, 62, 125, 250, 500, 1000, 2000, 4000, 8000, 16000];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum AudioFilter {
    /// Gain in dB per band of [`EQUALIZER_BANDS`].
    Equalizer { gains: [i32; 10] },
    Channels { mode: ChannelMode },
    Normalize,
    ExtraStereo,
    Karaoke,
}

impl AudioFilter {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Equalizer { .. } => "equalizer",
            Self::Channels { .. } => "channels",
            Self::Normalize => "normalize",
            Self::ExtraStereo => "extrastereo",
            Self::Karaoke => "karaoke",
        }
    }

    /// MPlayer `-af` filter text, `None` when nothing needs to be inserted.
    pub fn mplayer_filter(&self) -> Option<String> {
        let text = match self {
            Self::Equalizer { gains } => format!(
                "equalizer={}",
                gains.iter().map(i32::to_string).collect::<Vec<_>>().join(":")
            ),
            Self::Channels { mode } => match mode {
                ChannelMode::Stereo => return None,
                ChannelMode::Left => "channels=2:2:0:0:0:1".into(),
                ChannelMode::Right => "channels=2:2:1:0:1:1".into(),
                ChannelMode::Reverse => "channels=2:2:0:1:1:0".into(),
                ChannelMode::Mono => "pan=1:0.5:0.5".into(),
            },
            Self::Normalize => "volnorm=2".into(),
            Self::ExtraStereo => "extrastereo".into(),
            Self::Karaoke => "karaoke".into(),
        };
        Some(text)
    }

    /// MPlayer filter name as accepted by `af_del`.
    pub fn mplayer_name(&self) -> Option<&'static str> {
        match self {
            Self::Equalizer { .. } => Some("equalizer"),
            Self::Channels { mode: ChannelMode::Mono } => Some("pan"),
            Self::Channels { mode: ChannelMode::Stereo } => None,
            Self::Channels { .. } => Some("channels"),
            Self::Normalize => Some("volnorm"),
            Self::ExtraStereo => Some("extrastereo"),
            Self::Karaoke => Some("karaoke"),
        }
    }

    /// MPV `--af` filter text, `None` when MPV has no equivalent.
    pub fn mpv_filter(&self) -> Option<String> {
        let body = match self {
            Self::Equalizer { gains } => {
                let entries = EQUALIZER_BANDS
                    .iter()
                    .zip(gains.iter())
                    .map(|(freq, gain)| format!("entry({freq},{gain})"))
                    .collect::<Vec<_>>()
                    .join(";");
                format!("lavfi=[firequalizer=gain_entry='{entries}']")
            }
            Self::Channels { mode } => match mode {
                ChannelMode::Stereo => return None,
                ChannelMode::Left => "lavfi=[pan=stereo|c0=c0|c1=c0]".into(),
                ChannelMode::Right => "lavfi=[pan=stereo|c0=c1|c1=c1]".into(),
                ChannelMode::Reverse => "lavfi=[pan=stereo|c0=c1|c1=c0]".into(),
                ChannelMode::Mono => "lavfi=[pan=mono|c0=.5*c0+.5*c1]".into(),
            },
            Self::Normalize => "lavfi=[dynaudnorm]".into(),
            Self::ExtraStereo => "lavfi=[extrastereo]".into(),
            Self::Karaoke => return None,
        };
        Some(format!("@{}:{body}", self.label()))
    }
}
