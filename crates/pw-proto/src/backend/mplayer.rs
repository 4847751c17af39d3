//! MPlayer slave-mode dialect.

use std::path::PathBuf;
use std::sync::LazyLock;

use pw_core::config::BackendKind;
use pw_core::{ExitReason, MediaData, MediaType, SubtitleKind, Time, TrackKind};
use regex::Captures;

use super::{cap, cap_u32, parse_icy, Dialect, Outgoing, Rule};
use crate::command::{AudioFilter, ChannelMode, PlayerCommand, SeekTarget};
use crate::launch::LaunchOptions;
use crate::line::{ChapterLine, CountKind, Line, Status, TitleLine, TrackLine, TrackSlot};
use crate::style::fmt_num;

#[derive(Debug, Clone, Copy, Default)]
pub struct MPlayerDialect;

/// Properties queried to learn the active tracks.
const SELECTION_PROPERTIES: &[&str] = &[
    "switch_audio",
    "switch_video",
    "sub_demux",
    "sub_file",
    "sub_vob",
];

fn get_property(name: &str) -> Outgoing {
    Outgoing::query(format!("pausing_keep_force get_property {name}"))
}

impl Dialect for MPlayerDialect {
    fn kind(&self) -> BackendKind {
        BackendKind::MPlayer
    }

    fn title_base(&self) -> u32 {
        1
    }

    fn launch_args(&self, opts: &LaunchOptions) -> Vec<String> {
        let mut args: Vec<String> = [
            "-noquiet",
            "-slave",
            "-identify",
            "-nofs",
            "-nomouseinput",
            "-input",
            "nodefault-bindings:conf=/dev/null",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.push("-osdlevel".into());
        args.push(opts.osd_level.to_string());

        if let Some(wid) = opts.window_id {
            args.push("-wid".into());
            args.push(wid.to_string());
        }
        if let Some(vo) = &opts.video_output {
            args.push("-vo".into());
            args.push(vo.clone());
        }
        if let Some(ao) = &opts.audio_output {
            args.push("-ao".into());
            args.push(ao.clone());
        }
        // No mute switch on the command line; start silent instead.
        let volume = if opts.mute { Some(0) } else { opts.volume };
        if let Some(volume) = volume {
            args.push("-volume".into());
            args.push(volume.to_string());
        }
        if let Some(speed) = opts.speed {
            args.push("-speed".into());
            args.push(fmt_num(speed));
        }
        if let Some(start) = opts.start {
            args.push("-ss".into());
            args.push(fmt_num(start.as_secs_f64()));
        }
        if let Some(aid) = opts.audio_track {
            args.push("-aid".into());
            args.push(aid.to_string());
        }
        if let Some(key) = opts.subtitle {
            match key.kind {
                SubtitleKind::Embedded => {
                    args.push("-sid".into());
                    args.push(key.id.to_string());
                }
                SubtitleKind::Vobsub => {
                    args.push("-vobsubid".into());
                    args.push(key.id.to_string());
                }
                SubtitleKind::External => {
                    tracing::debug!("mplayer: external subtitle {key} cannot be preselected");
                }
            }
        }
        if let Some(angle) = opts.angle {
            args.push("-dvdangle".into());
            args.push(angle.to_string());
        }
        if !opts.subtitle_files.is_empty() {
            let files = opts
                .subtitle_files
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(",");
            args.push("-sub".into());
            args.push(files);
        }

        if let Some(device) = opts.locator.device() {
            let flag = match opts.locator.media_type() {
                MediaType::Dvd => Some("-dvd-device"),
                MediaType::Vcd | MediaType::Cdda => Some("-cdrom-device"),
                MediaType::BluRay => Some("-bluray-device"),
                _ => None,
            };
            if let Some(flag) = flag {
                args.push(flag.into());
                args.push(device.to_string());
            }
        }

        for filter in &opts.video_filters {
            args.push("-vf-add".into());
            args.push(filter.mplayer_filter());
        }
        if opts.screenshot_dir.is_some() {
            args.push("-vf-add".into());
            args.push("screenshot".into());
        }
        for filter in &opts.audio_filters {
            if let Some(text) = filter.mplayer_filter() {
                args.push("-af-add".into());
                args.push(text);
            }
        }

        if let Some(style) = &opts.subtitle_style {
            args.push("-ass".into());
            args.push("-ass-force-style".into());
            args.push(style.to_ass_force_style());
        }

        if let Some(path) = &opts.capture_file {
            args.push("-capture".into());
            args.push("-dumpfile".into());
            args.push(path.display().to_string());
        }

        args.extend(opts.extra_args.iter().cloned());
        args.push(self.locator_arg(opts));
        args
    }

    /// Screenshots land in the working directory.
    fn working_dir(&self, opts: &LaunchOptions) -> Option<PathBuf> {
        opts.screenshot_dir.clone()
    }

    fn translate(&self, cmd: &PlayerCommand, md: &MediaData) -> Vec<Outgoing> {
        use PlayerCommand as C;
        let out = match cmd {
            C::SelectVideo { id } => vec![
                Outgoing::command(format!("set_property switch_video {id}")),
                get_property("switch_video"),
            ],
            C::SelectAudio { id } => vec![
                Outgoing::command(format!("switch_audio {id}")),
                get_property("switch_audio"),
            ],
            C::SelectSubtitle { key: Some(key) } => {
                let property = match key.kind {
                    SubtitleKind::Embedded => "sub_demux",
                    SubtitleKind::Vobsub => "sub_vob",
                    SubtitleKind::External => "sub_file",
                };
                vec![
                    Outgoing::command(format!("{property} {}", key.id)),
                    get_property(property),
                ]
            }
            C::SelectSubtitle { key: None } => {
                let mut out = vec![Outgoing::command("sub_select -1")];
                out.extend(["sub_demux", "sub_vob", "sub_file"].map(get_property));
                out
            }
            C::SetSubtitleVisible { visible } => {
                vec![Outgoing::command(format!("sub_visibility {}", *visible as u8))]
            }
            C::Seek { target, .. } => {
                let line = match target {
                    SeekTarget::Relative(t) => format!("seek {} 0", fmt_num(t.as_secs_f64())),
                    SeekTarget::Percent(p) => format!("seek {} 1", fmt_num(*p)),
                    SeekTarget::Absolute(t) => {
                        format!("seek {} 2", fmt_num(md.gui_to_player(*t).as_secs_f64()))
                    }
                };
                vec![Outgoing::command(line)]
            }
            C::SetVolume { volume } => vec![Outgoing::command(format!("volume {volume} 1"))],
            C::SetMute { mute } => vec![Outgoing::command(format!("mute {}", *mute as u8))],
            C::TogglePause => vec![Outgoing::command("pause")],
            C::FrameStep => vec![Outgoing::command("frame_step")],
            C::SetAudioFilter { filter, enabled } => audio_filter(filter, *enabled),
            C::SetAngle { angle } => vec![Outgoing::command(format!("switch_angle {angle}"))],
            C::SetSpeed { speed } => vec![Outgoing::command(format!("speed_set {}", fmt_num(*speed)))],
            C::Screenshot => vec![Outgoing::command("screenshot 0")],
            C::ToggleScreenshots => vec![Outgoing::command("screenshot 1")],
            // The capture target is fixed at launch with -dumpfile.
            C::StartCapture { .. } | C::StopCapture => vec![Outgoing::command("capturing")],
            C::SetOsdLevel { level } => vec![Outgoing::command(format!("osd {level}"))],
            C::FrameBackStep
            | C::SelectSecondarySubtitle { .. }
            | C::SetVideoFilter { .. }
            | C::SetSubtitleStyle { .. } => Vec::new(),
        };
        if out.is_empty() {
            tracing::debug!("mplayer: {} is not supported at runtime; dropped", cmd.name());
        }
        out
    }

    fn patterns(&self) -> &'static [Rule] {
        &RULES
    }

    fn follow_up(&self, _kind: CountKind, _count: u32) -> Vec<Outgoing> {
        // -identify already prints every title and chapter.
        Vec::new()
    }

    fn startup_queries(&self) -> Vec<Outgoing> {
        SELECTION_PROPERTIES.iter().copied().map(get_property).collect()
    }
}

impl MPlayerDialect {
    fn locator_arg(&self, opts: &LaunchOptions) -> String {
        let locator = &opts.locator;
        let scheme = match locator.media_type() {
            MediaType::Dvd if locator.has_menus() => "dvdnav",
            MediaType::Dvd => "dvd",
            MediaType::Vcd => "vcd",
            MediaType::Cdda => "cdda",
            MediaType::BluRay => "br",
            _ => return locator.as_str().to_string(),
        };
        match locator.title() {
            Some(t) => format!("{scheme}://{}", self.native_title(t)),
            None => format!("{scheme}://"),
        }
    }
}

fn audio_filter(filter: &AudioFilter, enabled: bool) -> Vec<Outgoing> {
    if let AudioFilter::Channels {
        mode: ChannelMode::Stereo,
    } = filter
    {
        return vec![Outgoing::command("af_del channels,pan")];
    }
    if enabled {
        filter
            .mplayer_filter()
            .map(|text| vec![Outgoing::command(format!("af_add {text}"))])
            .unwrap_or_default()
    } else {
        filter
            .mplayer_name()
            .map(|name| vec![Outgoing::command(format!("af_del {name}"))])
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Output patterns
// ---------------------------------------------------------------------------

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        // -- status, checked first --------------------------------------------
        Rule::new("status_av", r"^(?:A:\s*(-?[\d.]+)\s+)?V:\s*(-?[\d.]+)", |c| {
            playing_status(cap(c, 2)?, None)
        }),
        Rule::new(
            "status_audio",
            r"^A:\s*(-?[\d.]+)(?:\s+\([^)]*\)\s+of\s+(-?[\d.]+))?",
            |c| playing_status(cap(c, 1)?, cap(c, 2)),
        ),
        Rule::new("cache_fill", r"^Cache fill:", |_| {
            Some(Line::Status(Status {
                buffering: Some(true),
                ..Status::default()
            }))
        }),
        Rule::new("paused", r"^(?:ID_PAUSED|\s*=+\s*PAUSE\s*=+)", |_| {
            Some(Line::Status(Status {
                paused: Some(true),
                ..Status::default()
            }))
        }),
        // -- answers to get_property ------------------------------------------
        Rule::new(
            "answer_selection",
            r"^ANS_(switch_audio|switch_video|sub_demux|sub_file|sub_vob)=(-?\d+)",
            decode_selection_answer,
        ),
        Rule::new("answer_other", r"^ANS_", |_| Some(Line::Answer(None))),
        // -- tracks -----------------------------------------------------------
        Rule::new(
            "track_id",
            r"^ID_(VIDEO|AUDIO|SUBTITLE|VOBSUB|FILE_SUB)_ID=(\d+)$",
            |c| {
                let slot = slot_for(cap(c, 1)?)?;
                Some(Line::Track(TrackLine::declare(slot, cap_u32(c, 2)?)))
            },
        ),
        Rule::new(
            "track_field",
            r"^ID_(AID|VID|SID|VSID)_(\d+)_(LANG|NAME)=(.*)$",
            decode_track_field,
        ),
        Rule::new("file_sub_name", r"^ID_FILE_SUB_FILENAME=(.+)$", |c| {
            let mut line = TrackLine::declare(TrackSlot::Subtitle(SubtitleKind::External), 0);
            line.id = None;
            line.fields.filename = Some(cap(c, 1)?.to_string());
            Some(Line::Track(line))
        }),
        // -- disc navigation --------------------------------------------------
        Rule::new("dvd_titles", r"^ID_DVD_TITLES=(\d+)$", |c| {
            Some(Line::Count {
                kind: CountKind::Titles,
                count: cap_u32(c, 1)?,
            })
        }),
        Rule::new(
            "dvd_title_info",
            r"^ID_DVD_TITLE_(\d+)_(LENGTH|CHAPTERS|ANGLES)=(.*)$",
            decode_dvd_title,
        ),
        Rule::new(
            "cd_track_msf",
            r"^ID_(?:VCD|CDDA)_TRACK_(\d+)_MSF=(.*)$",
            |c| {
                Some(Line::Title(TitleLine {
                    id: cap_u32(c, 1)?,
                    duration: Some(Time::parse_msf(cap(c, 2)?)?),
                    ..TitleLine::default()
                }))
            },
        ),
        Rule::new(
            "current_title",
            r"^ID_(?:DVD_CURRENT_TITLE|VCD_CURRENT_TRACK|CDDA_CURRENT_TRACK)=(\d+)$",
            |c| {
                Some(Line::TitleSwitch {
                    native: cap_u32(c, 1)?,
                })
            },
        ),
        Rule::new(
            "title_not_found",
            r"(?i)^(?:Invalid DVD title number|.*couldn't select title)",
            |_| Some(Line::TitleNotFound),
        ),
        // -- chapters and metadata --------------------------------------------
        Rule::new("chapter_count", r"^ID_CHAPTERS=(\d+)$", |c| {
            Some(Line::Count {
                kind: CountKind::Chapters,
                count: cap_u32(c, 1)?,
            })
        }),
        Rule::new(
            "chapter_info",
            r"^ID_CHAPTER_(\d+)_(START|NAME)=(.*)$",
            decode_chapter,
        ),
        Rule::new("clip_info_name", r"^ID_CLIP_INFO_NAME(\d+)=(.*)$", |c| {
            Some(Line::MetadataKey {
                index: cap_u32(c, 1)?,
                key: cap(c, 2)?.to_string(),
            })
        }),
        Rule::new("clip_info_value", r"^ID_CLIP_INFO_VALUE(\d+)=(.*)$", |c| {
            Some(Line::MetadataValue {
                index: cap_u32(c, 1)?,
                value: cap(c, 2)?.to_string(),
            })
        }),
        Rule::new("icy_info", r"^ICY Info: (.*)$", |c| {
            let entries = parse_icy(cap(c, 1)?);
            (!entries.is_empty()).then_some(Line::Metadata(entries))
        }),
        // -- output geometry --------------------------------------------------
        Rule::new(
            "video_output",
            r"^VO: \[[^\]]*\] (\d+)x(\d+) => (\d+)x(\d+)(?:\s+(.+))?$",
            decode_video_output,
        ),
        // -- lifecycle --------------------------------------------------------
        Rule::new("playback_started", r"^Starting playback\.\.\.", |_| {
            Some(Line::PlaybackStarted)
        }),
        Rule::new(
            "end_of_file",
            r"^(?:ID_EXIT=EOF|Exiting\.\.\. \(End of file\))",
            |_| Some(Line::EndOfFile),
        ),
        // -- fatal conditions, no-disc before file-open -----------------------
        Rule::new(
            "no_disc",
            r"(?i)(?:couldn't open DVD device|libdvdread: Could not open|No medium found)",
            |_| Some(Line::Fatal(ExitReason::NoDisc)),
        ),
        Rule::new("file_open", r"^(?:Failed to open|File not found:)", |_| {
            Some(Line::Fatal(ExitReason::FileOpen))
        }),
        Rule::new("unsupported", r"Failed to recognize file format", |_| {
            Some(Line::Fatal(ExitReason::UnsupportedFormat))
        }),
        Rule::new("http_error", r"Server returned (403|404)", |c| {
            Some(Line::Fatal(http_reason(cap(c, 1)?)))
        }),
        // -- generic identification output, last ------------------------------
        Rule::new("property", r"^ID_([A-Z0-9_]+)=(.*)$", |c| {
            Some(Line::Property {
                key: cap(c, 1)?.to_string(),
                value: cap(c, 2)?.to_string(),
            })
        }),
    ]
});

pub(crate) fn http_reason(code: &str) -> ExitReason {
    if code == "403" {
        ExitReason::Http403
    } else {
        ExitReason::Http404
    }
}

fn playing_status(time: &str, duration: Option<&str>) -> Option<Line> {
    Some(Line::Status(Status {
        time: Some(Time::parse_secs(time)?),
        duration: match duration {
            Some(text) => Some(Time::parse_secs(text)?),
            None => None,
        },
        paused: Some(false),
        buffering: Some(false),
    }))
}

fn slot_for(name: &str) -> Option<TrackSlot> {
    Some(match name {
        "VIDEO" | "VID" => TrackSlot::Video,
        "AUDIO" | "AID" => TrackSlot::Audio,
        "SUBTITLE" | "SID" => TrackSlot::Subtitle(SubtitleKind::Embedded),
        "VOBSUB" | "VSID" => TrackSlot::Subtitle(SubtitleKind::Vobsub),
        "FILE_SUB" => TrackSlot::Subtitle(SubtitleKind::External),
        _ => return None,
    })
}

fn decode_track_field(c: &Captures<'_>) -> Option<Line> {
    let mut line = TrackLine::declare(slot_for(cap(c, 1)?)?, cap_u32(c, 2)?);
    let value = cap(c, 4)?.trim().to_string();
    match cap(c, 3)? {
        "LANG" => line.fields.lang = Some(value),
        _ => line.fields.name = Some(value),
    }
    Some(Line::Track(line))
}

fn decode_selection_answer(c: &Captures<'_>) -> Option<Line> {
    let (kind, sub_kind) = match cap(c, 1)? {
        "switch_audio" => (TrackKind::Audio, None),
        "switch_video" => (TrackKind::Video, None),
        "sub_demux" => (TrackKind::Subtitle, Some(SubtitleKind::Embedded)),
        "sub_vob" => (TrackKind::Subtitle, Some(SubtitleKind::Vobsub)),
        _ => (TrackKind::Subtitle, Some(SubtitleKind::External)),
    };
    let raw: i64 = cap(c, 2)?.parse().ok()?;
    let id = u32::try_from(raw).ok();
    Some(Line::Answer(Some(Box::new(Line::Selected {
        kind,
        sub_kind,
        id,
    }))))
}

fn decode_dvd_title(c: &Captures<'_>) -> Option<Line> {
    let mut title = TitleLine {
        id: cap_u32(c, 1)?,
        ..TitleLine::default()
    };
    let value = cap(c, 3)?;
    match cap(c, 2)? {
        "LENGTH" => title.duration = Some(Time::parse_secs(value)?),
        "CHAPTERS" => title.chapters = Some(value.trim().parse().ok()?),
        _ => title.angles = Some(value.trim().parse().ok()?),
    }
    Some(Line::Title(title))
}

fn decode_chapter(c: &Captures<'_>) -> Option<Line> {
    let mut chapter = ChapterLine {
        id: cap_u32(c, 1)?,
        start: None,
        name: None,
    };
    let value = cap(c, 3)?;
    match cap(c, 2)? {
        "START" => {
            chapter.start = Some(Time::checked_from_millis(value.trim().parse().ok()?)?)
        }
        _ => chapter.name = Some(value.trim().to_string()),
    }
    Some(Line::Chapter(chapter))
}

pub(crate) fn decode_video_output(c: &Captures<'_>) -> Option<Line> {
    Some(Line::VideoOutput {
        width: cap_u32(c, 3)?,
        height: cap_u32(c, 4)?,
        colorspace: cap(c, 5).map(|s| s.trim().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::classify_with;
    use crate::command::{Rotation, VideoFilter};
    use crate::line::Classified;
    use pw_core::{Locator, SubtitleKey};

    fn classify(line: &str) -> Classified {
        classify_with(&RULES, line)
    }

    fn line(text: &str) -> Line {
        match classify(text) {
            Classified::Line(l) => l,
            other => panic!("{text:?} classified as {other:?}"),
        }
    }

    #[test]
    fn status_with_audio_and_video() {
        let Line::Status(status) = line("A:  12.3 V:  12.4 A-V: -0.001 ct:  0.010") else {
            panic!("not a status line");
        };
        assert_eq!(status.time, Some(Time::from_millis(12_400)));
        assert_eq!(status.paused, Some(false));
    }

    #[test]
    fn audio_only_status_carries_duration() {
        let Line::Status(status) = line("A:   5.2 (05.1) of 180.0 (03:00.0)  0.4%") else {
            panic!("not a status line");
        };
        assert_eq!(status.time, Some(Time::from_millis(5_200)));
        assert_eq!(status.duration, Some(Time::from_millis(180_000)));
    }

    #[test]
    fn cache_and_pause_lines() {
        assert!(matches!(
            line("Cache fill:  5.00% (131072 bytes)"),
            Line::Status(Status { buffering: Some(true), .. })
        ));
        assert!(matches!(
            line("  =====  PAUSE  ====="),
            Line::Status(Status { paused: Some(true), .. })
        ));
    }

    #[test]
    fn track_lines() {
        assert_eq!(
            line("ID_AUDIO_ID=128"),
            Line::Track(TrackLine::declare(TrackSlot::Audio, 128))
        );
        let Line::Track(t) = line("ID_AID_128_LANG=eng") else {
            panic!("not a track");
        };
        assert_eq!(t.fields.lang.as_deref(), Some("eng"));
        let Line::Track(t) = line("ID_VSID_1_LANG=fr") else {
            panic!("not a track");
        };
        assert_eq!(t.slot, TrackSlot::Subtitle(SubtitleKind::Vobsub));
        let Line::Track(t) = line("ID_FILE_SUB_FILENAME=/subs/a.srt") else {
            panic!("not a track");
        };
        assert_eq!(t.id, None);
        assert_eq!(t.fields.filename.as_deref(), Some("/subs/a.srt"));
    }

    #[test]
    fn selection_answers() {
        assert_eq!(
            line("ANS_sub_vob=-1"),
            Line::Answer(Some(Box::new(Line::Selected {
                kind: TrackKind::Subtitle,
                sub_kind: Some(SubtitleKind::Vobsub),
                id: None,
            })))
        );
        assert_eq!(line("ANS_ERROR=PROPERTY_UNAVAILABLE"), Line::Answer(None));
    }

    #[test]
    fn dvd_title_lines() {
        assert_eq!(
            line("ID_DVD_TITLE_2_LENGTH=1412.480"),
            Line::Title(TitleLine {
                id: 2,
                duration: Some(Time::from_millis(1_412_480)),
                ..TitleLine::default()
            })
        );
        assert_eq!(line("ID_DVD_CURRENT_TITLE=2"), Line::TitleSwitch { native: 2 });
        assert_eq!(
            line("ID_DVD_TITLES=4"),
            Line::Count {
                kind: CountKind::Titles,
                count: 4
            }
        );
    }

    #[test]
    fn cd_tracks_use_msf() {
        let Line::Title(title) = line("ID_CDDA_TRACK_3_MSF=04:10:30") else {
            panic!("not a title");
        };
        assert_eq!(title.id, 3);
        assert_eq!(title.duration, Some(Time::from_millis(250_400)));
    }

    #[test]
    fn chapters_in_milliseconds() {
        assert_eq!(
            line("ID_CHAPTER_1_START=300000"),
            Line::Chapter(ChapterLine {
                id: 1,
                start: Some(Time::from_millis(300_000)),
                name: None
            })
        );
    }

    #[test]
    fn malformed_capture_does_not_fall_through() {
        assert_eq!(
            classify("ID_CHAPTER_1_START=soon"),
            Classified::Malformed("chapter_info")
        );
    }

    #[test]
    fn fatal_lines() {
        assert_eq!(
            line("libdvdread: Could not open /dev/dvd"),
            Line::Fatal(ExitReason::NoDisc)
        );
        assert_eq!(
            line("Failed to open /tmp/missing.avi."),
            Line::Fatal(ExitReason::FileOpen)
        );
        assert_eq!(
            line("Server returned 404: File Not Found"),
            Line::Fatal(ExitReason::Http404)
        );
        assert_eq!(line("ID_EXIT=EOF"), Line::EndOfFile);
    }

    #[test]
    fn icy_and_clip_info() {
        assert_eq!(
            line("ICY Info: StreamTitle='Artist - Track';"),
            Line::Metadata(vec![("StreamTitle".into(), "Artist - Track".into())])
        );
        assert_eq!(
            line("ID_CLIP_INFO_NAME0=Artist"),
            Line::MetadataKey {
                index: 0,
                key: "Artist".into()
            }
        );
    }

    #[test]
    fn video_output_line() {
        assert_eq!(
            line("VO: [xv] 720x576 => 1024x576 Planar YV12"),
            Line::VideoOutput {
                width: 1024,
                height: 576,
                colorspace: Some("Planar YV12".into())
            }
        );
    }

    #[test]
    fn generic_property_is_last() {
        assert_eq!(
            line("ID_VIDEO_WIDTH=720"),
            Line::Property {
                key: "VIDEO_WIDTH".into(),
                value: "720".into()
            }
        );
        assert_eq!(classify("Playing /tmp/a.avi."), Classified::Unhandled);
    }

    #[test]
    fn launch_args_for_dvd() {
        let mut opts = LaunchOptions::new(Locator::parse("dvd://2/dev/sr0"));
        opts.volume = Some(80);
        opts.video_filters.push(VideoFilter::Rotate {
            rotation: Rotation::Clockwise,
        });
        let args = MPlayerDialect.launch_args(&opts);
        assert_eq!(&args[..3], &["-noquiet", "-slave", "-identify"]);
        let joined = args.join(" ");
        assert!(joined.contains("-osdlevel 1"));
        assert!(joined.contains("-volume 80"));
        assert!(joined.contains("-dvd-device /dev/sr0"));
        assert!(joined.contains("-vf-add rotate=1"));
        assert_eq!(args.last().map(String::as_str), Some("dvd://2"));
    }

    #[test]
    fn launch_args_for_file_keep_locator() {
        let mut opts = LaunchOptions::new(Locator::parse("/media/a b.mkv"));
        opts.start = Some(Time::from_millis(90_500));
        let args = MPlayerDialect.launch_args(&opts);
        assert!(args.windows(2).any(|w| w == ["-ss", "90.5"]));
        assert_eq!(args.last().map(String::as_str), Some("/media/a b.mkv"));
    }

    #[test]
    fn subtitle_selection_queries_back() {
        let md = MediaData::new(Locator::parse("/tmp/a.mkv"));
        let out = MPlayerDialect.translate(
            &PlayerCommand::SelectSubtitle {
                key: Some(SubtitleKey::new(SubtitleKind::Vobsub, 1)),
            },
            &md,
        );
        assert_eq!(out[0], Outgoing::command("sub_vob 1"));
        assert!(out[1].answer);
        assert_eq!(out[1].text, "pausing_keep_force get_property sub_vob");
    }

    #[test]
    fn absolute_seek_uses_player_time() {
        let mut md = MediaData::new(Locator::parse("/tmp/a.ts"));
        md.set_start_time(Time::from_millis(2_000));
        let out = MPlayerDialect.translate(
            &PlayerCommand::Seek {
                target: SeekTarget::Absolute(Time::from_millis(10_000)),
                precise: true,
            },
            &md,
        );
        assert_eq!(out, vec![Outgoing::command("seek 12 2")]);
    }

    #[test]
    fn unsupported_commands_drop() {
        let md = MediaData::new(Locator::parse("/tmp/a.mkv"));
        assert!(MPlayerDialect
            .translate(&PlayerCommand::FrameBackStep, &md)
            .is_empty());
        assert!(MPlayerDialect
            .translate(
                &PlayerCommand::SelectSecondarySubtitle { key: None },
                &md
            )
            .is_empty());
    }

    #[test]
    fn stereo_removes_channel_filters() {
        let out = audio_filter(
            &AudioFilter::Channels {
                mode: ChannelMode::Stereo,
            },
            true,
        );
        assert_eq!(out, vec![Outgoing::command("af_del channels,pan")]);
        let out = audio_filter(&AudioFilter::Normalize, false);
        assert_eq!(out, vec![Outgoing::command("af_del volnorm")]);
    }
}
