//! MPV terminal dialect.
//!
//! MPV has no identify mode, so the launch arguments install a playing
//! message and a status message that print the properties we need in a
//! fixed `INFO_KEY=value` and `STATUS:` layout. Queries are answered by
//! `print-text` echoes prefixed with `ANS_`.

use std::sync::LazyLock;

use pw_core::config::BackendKind;
use pw_core::{ExitReason, MediaData, MediaType, SubtitleKind, Time, TrackKind};
use regex::Captures;
use serde::Deserialize;

use super::mplayer::{decode_video_output, http_reason};
use super::{cap, cap_u32, quote, Dialect, Outgoing, Rule};
use crate::command::{AudioFilter, ChannelMode, PlayerCommand, SeekTarget, VideoFilter};
use crate::launch::LaunchOptions;
use crate::line::{ChapterLine, CountKind, Line, Status, TitleLine, TrackLine, TrackSlot};
use crate::style::{fmt_num, yes_no};

#[derive(Debug, Clone, Copy, Default)]
pub struct MpvDialect;

/// Properties printed once playback starts, as `INFO_<key>=<expansion>`.
const PLAYING_MSG: &[(&str, &str)] = &[
    ("VIDEO_WIDTH", "${=width:0}"),
    ("VIDEO_HEIGHT", "${=height:0}"),
    ("VIDEO_ASPECT", "${=video-params/aspect:0}"),
    ("VIDEO_FPS", "${=container-fps:0}"),
    ("VIDEO_FORMAT", "${=video-format:}"),
    ("VIDEO_CODEC", "${=video-codec:}"),
    ("VIDEO_BITRATE", "${=video-bitrate:0}"),
    ("VIDEO_DWIDTH", "${=dwidth:0}"),
    ("VIDEO_DHEIGHT", "${=dheight:0}"),
    ("VIDEO_COLORSPACE", "${=video-params/colormatrix:}"),
    ("VIDEO_OUT_COLORSPACE", "${=video-out-params/colormatrix:}"),
    ("AUDIO_FORMAT", "${=audio-codec-name:}"),
    ("AUDIO_CODEC", "${=audio-codec:}"),
    ("AUDIO_BITRATE", "${=audio-bitrate:0}"),
    ("AUDIO_RATE", "${=audio-params/samplerate:0}"),
    ("AUDIO_NCH", "${=audio-params/channel-count:0}"),
    ("LENGTH", "${=duration:${=length:0}}"),
    ("START_TIME", "${=time-start:}"),
    ("DEMUXER", "${=current-demuxer:}"),
    ("FILE_FORMAT", "${=file-format:}"),
    ("SEEKABLE", "${=seekable:no}"),
    ("MEDIA_TITLE", "${=media-title:}"),
    ("ANGLE", "${=angle:}"),
    ("CURRENT_TITLE", "${=disc-title:}"),
    ("TITLES", "${=disc-titles:0}"),
    ("CHAPTERS", "${=chapters:0}"),
    ("METADATA", "${=metadata}"),
];

const STATUS_MSG: &str = "STATUS: ${=time-pos} / ${=duration:${=length:0}} \
                          P: ${=pause} B: ${=paused-for-cache} I: ${=core-idle}";

fn print_answer(property: &str) -> Outgoing {
    Outgoing::query(format!("print-text \"ANS_{property}=${{={property}}}\""))
}

fn flag(name: &str, value: impl std::fmt::Display) -> String {
    format!("--{name}={value}")
}

impl Dialect for MpvDialect {
    fn kind(&self) -> BackendKind {
        BackendKind::Mpv
    }

    fn title_base(&self) -> u32 {
        0
    }

    fn launch_args(&self, opts: &LaunchOptions) -> Vec<String> {
        let mut args: Vec<String> = [
            "--no-quiet",
            "--terminal",
            "--no-msg-color",
            "--input-file=/dev/stdin",
            "--input-terminal=no",
            "--msg-level=ffmpeg/demuxer=error",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let playing = PLAYING_MSG
            .iter()
            .map(|(key, expansion)| format!("INFO_{key}={expansion}"))
            .collect::<Vec<_>>()
            .join("\\n");
        args.push(flag("term-playing-msg", playing));
        args.push(flag("term-status-msg", STATUS_MSG));
        args.push(flag("osd-level", opts.osd_level));

        if let Some(wid) = opts.window_id {
            args.push(flag("wid", wid));
        }
        if let Some(vo) = &opts.video_output {
            args.push(flag("vo", vo));
        }
        if let Some(ao) = &opts.audio_output {
            args.push(flag("ao", ao));
        }
        if let Some(volume) = opts.volume {
            args.push(flag("volume", volume));
        }
        if opts.mute {
            args.push(flag("mute", "yes"));
        }
        if let Some(speed) = opts.speed {
            args.push(flag("speed", fmt_num(speed)));
        }

        let locator = &opts.locator;
        // CD tracks are chapters of one stream.
        let cd_track = locator.media_type().is_cd().then(|| locator.title()).flatten();
        if let Some(track) = cd_track {
            args.push(flag("start", format!("#{track}")));
        } else if let Some(start) = opts.start {
            args.push(flag("start", fmt_num(start.as_secs_f64())));
        }

        if let Some(aid) = opts.audio_track {
            args.push(flag("aid", aid));
        }
        if let Some(key) = opts.subtitle {
            args.push(flag("sid", key.id));
        }
        for file in &opts.subtitle_files {
            args.push(flag("sub-file", file.display()));
        }

        if let Some(device) = locator.device() {
            let name = match locator.media_type() {
                MediaType::Dvd => Some("dvd-device"),
                MediaType::Vcd | MediaType::Cdda => Some("cdrom-device"),
                MediaType::BluRay => Some("bluray-device"),
                _ => None,
            };
            if let Some(name) = name {
                args.push(flag(name, device));
            }
        }
        if let Some(angle) = opts.angle {
            args.push(flag("dvd-angle", angle));
        }

        for filter in &opts.video_filters {
            match filter {
                VideoFilter::Rotate { rotation } => {
                    args.push(flag("video-rotate", rotation.degrees()));
                }
                other => {
                    if let Some(text) = other.mpv_filter() {
                        args.push(flag("vf-add", text));
                    }
                }
            }
        }
        for filter in &opts.audio_filters {
            if let Some(text) = filter.mpv_filter() {
                args.push(flag("af-add", text));
            }
        }

        if let Some(style) = &opts.subtitle_style {
            for (name, value) in style.mpv_options() {
                args.push(flag(name, value));
            }
        }
        if let Some(path) = &opts.capture_file {
            args.push(flag("stream-record", path.display()));
        }
        if let Some(dir) = &opts.screenshot_dir {
            args.push(flag("screenshot-directory", dir.display()));
        }

        args.extend(opts.extra_args.iter().cloned());
        args.push("--".into());
        args.push(self.locator_arg(opts));
        args
    }

    fn translate(&self, cmd: &PlayerCommand, md: &MediaData) -> Vec<Outgoing> {
        use PlayerCommand as C;
        let command = |text: String| vec![Outgoing::command(text)];
        let out = match cmd {
            C::SelectVideo { id } => select("vid", Some(*id)),
            C::SelectAudio { id } => select("aid", Some(*id)),
            C::SelectSubtitle { key } => select("sid", key.map(|k| k.id)),
            C::SelectSecondarySubtitle { key } => select("secondary-sid", key.map(|k| k.id)),
            C::SetSubtitleVisible { visible } => {
                command(format!("set sub-visibility {}", yes_no(*visible)))
            }
            C::Seek { target, precise } => {
                let mode = if *precise { "exact" } else { "keyframes" };
                let (value, kind) = match target {
                    SeekTarget::Relative(t) => (fmt_num(t.as_secs_f64()), "relative"),
                    SeekTarget::Percent(p) => (fmt_num(*p), "absolute-percent"),
                    SeekTarget::Absolute(t) => {
                        (fmt_num(md.gui_to_player(*t).as_secs_f64()), "absolute")
                    }
                };
                command(format!("seek {value} {kind}+{mode}"))
            }
            C::SetVolume { volume } => command(format!("set volume {volume}")),
            C::SetMute { mute } => command(format!("set mute {}", yes_no(*mute))),
            C::TogglePause => command("cycle pause".into()),
            C::FrameStep => command("frame-step".into()),
            C::FrameBackStep => command("frame-back-step".into()),
            C::SetVideoFilter { filter, enabled } => video_filter(filter, *enabled),
            C::SetAudioFilter { filter, enabled } => audio_filter(filter, *enabled),
            C::SetAngle { angle } => command(format!("set angle {angle}")),
            C::SetSpeed { speed } => command(format!("set speed {}", fmt_num(*speed))),
            C::Screenshot => command("screenshot".into()),
            C::ToggleScreenshots => command("screenshot each-frame".into()),
            C::StartCapture { path } => command(format!(
                "set stream-record {}",
                quote(&path.display().to_string())
            )),
            C::StopCapture => command("set stream-record \"\"".into()),
            C::SetSubtitleStyle { style } => style
                .mpv_options()
                .into_iter()
                .map(|(name, value)| Outgoing::command(format!("set {name} {}", quote(&value))))
                .collect(),
            C::SetOsdLevel { level } => command(format!("set osd-level {level}")),
        };
        if out.is_empty() {
            tracing::debug!("mpv: {} has no equivalent; dropped", cmd.name());
        }
        out
    }

    fn patterns(&self) -> &'static [Rule] {
        &RULES
    }

    fn follow_up(&self, kind: CountKind, count: u32) -> Vec<Outgoing> {
        match kind {
            CountKind::Titles => (0..count)
                .map(|i| {
                    Outgoing::query(format!(
                        "print-text \"ANS_TITLE={i} LENGTH=${{=disc-title-list/{i}/length:0}}\""
                    ))
                })
                .collect(),
            CountKind::Chapters if count > 0 => {
                vec![Outgoing::query(
                    "print-text \"ANS_CHAPTER_LIST=${=chapter-list}\"",
                )]
            }
            CountKind::Chapters => Vec::new(),
        }
    }
}

impl MpvDialect {
    fn locator_arg(&self, opts: &LaunchOptions) -> String {
        let locator = &opts.locator;
        let scheme = match locator.media_type() {
            MediaType::Dvd => "dvd",
            MediaType::BluRay => "bd",
            MediaType::Cdda => return "cdda://".into(),
            _ => return locator.as_str().to_string(),
        };
        match locator.title() {
            Some(t) => format!("{scheme}://{}", self.native_title(t)),
            None => format!("{scheme}://"),
        }
    }
}

fn select(property: &str, id: Option<u32>) -> Vec<Outgoing> {
    let value = id.map_or_else(|| "no".to_string(), |id| id.to_string());
    vec![
        Outgoing::command(format!("set {property} {value}")),
        print_answer(property),
    ]
}

fn video_filter(filter: &VideoFilter, enabled: bool) -> Vec<Outgoing> {
    if let VideoFilter::Rotate { rotation } = filter {
        let degrees = if enabled { rotation.degrees() } else { 0 };
        return vec![Outgoing::command(format!("set video-rotate {degrees}"))];
    }
    filter_change("vf", filter.label(), filter.mpv_filter(), enabled)
}

fn audio_filter(filter: &AudioFilter, enabled: bool) -> Vec<Outgoing> {
    if let AudioFilter::Channels {
        mode: ChannelMode::Stereo,
    } = filter
    {
        return filter_change("af", filter.label(), None, false);
    }
    filter_change("af", filter.label(), filter.mpv_filter(), enabled)
}

fn filter_change(chain: &str, label: &str, text: Option<String>, enabled: bool) -> Vec<Outgoing> {
    if !enabled {
        return vec![Outgoing::command(format!("{chain} remove @{label}"))];
    }
    text.map(|t| vec![Outgoing::command(format!("{chain} add {}", quote(&t)))])
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Output patterns
// ---------------------------------------------------------------------------

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "status",
            r"^STATUS: (\S+) / (\S+) P: (yes|no) B: (yes|no) I: (yes|no)",
            decode_status,
        ),
        // -- answers to print-text queries ------------------------------------
        Rule::new(
            "answer_selection",
            r"^ANS_(aid|vid|sid|secondary-sid)=(.*)$",
            decode_selection_answer,
        ),
        Rule::new("answer_title", r"^ANS_TITLE=(\d+) LENGTH=(\S*)$", |c| {
            let title = TitleLine {
                id: cap_u32(c, 1)?,
                duration: Time::parse_secs(cap(c, 2)?),
                ..TitleLine::default()
            };
            Some(Line::Answer(Some(Box::new(Line::Title(title)))))
        }),
        Rule::new("answer_chapters", r"^ANS_CHAPTER_LIST=(.*)$", |c| {
            let chapters = parse_chapter_list(cap(c, 1)?);
            Some(Line::Answer(chapters.map(|list| Box::new(Line::ChapterList(list)))))
        }),
        Rule::new("answer_other", r"^ANS_", |_| Some(Line::Answer(None))),
        // -- tracks -----------------------------------------------------------
        Rule::new(
            "track",
            r"^(\(\+\)|●|○)?\s*(Video|Audio|Subs)\s+--(?:vid|aid|sid)=(\d+)(.*)$",
            decode_track,
        ),
        // -- counts, titles, metadata -----------------------------------------
        Rule::new("title_count", r"^INFO_TITLES=(\d+)$", |c| {
            Some(Line::Count {
                kind: CountKind::Titles,
                count: cap_u32(c, 1)?,
            })
        }),
        Rule::new("chapter_count", r"^INFO_CHAPTERS=(\d+)$", |c| {
            Some(Line::Count {
                kind: CountKind::Chapters,
                count: cap_u32(c, 1)?,
            })
        }),
        Rule::new(
            "current_title",
            r"(?i)^(?:INFO_CURRENT_TITLE=|.*switched to title:?\s*)(\d+)$",
            |c| {
                Some(Line::TitleSwitch {
                    native: cap_u32(c, 1)?,
                })
            },
        ),
        Rule::new(
            "title_not_found",
            r"(?i)(?:couldn't select title|title \d+ not found)",
            |_| Some(Line::TitleNotFound),
        ),
        Rule::new("metadata", r"^INFO_METADATA=(.*)$", |c| {
            parse_metadata(cap(c, 1)?).map(Line::Metadata)
        }),
        Rule::new(
            "video_output",
            r"^VO: \[[^\]]*\] (\d+)x(\d+) => (\d+)x(\d+)(?:\s+(.+))?$",
            decode_video_output,
        ),
        // -- lifecycle and fatal conditions -----------------------------------
        Rule::new("end_of_file", r"^Exiting\.\.\. \(End of file\)", |_| {
            Some(Line::EndOfFile)
        }),
        Rule::new(
            "no_disc",
            r"(?i)(?:couldn't open (?:dvd|cd|cdrom|blu-?ray|bd) device|no medium found)",
            |_| Some(Line::Fatal(ExitReason::NoDisc)),
        ),
        Rule::new("file_open", r"(?:^Failed to open |Cannot open file )", |_| {
            Some(Line::Fatal(ExitReason::FileOpen))
        }),
        Rule::new("unsupported", r"Failed to recognize file format", |_| {
            Some(Line::Fatal(ExitReason::UnsupportedFormat))
        }),
        Rule::new("http_error", r"HTTP error (403|404)", |c| {
            Some(Line::Fatal(http_reason(cap(c, 1)?)))
        }),
        // -- generic, last ----------------------------------------------------
        Rule::new("property", r"^INFO_([A-Z0-9_]+)=(.*)$", |c| {
            Some(Line::Property {
                key: cap(c, 1)?.to_string(),
                value: cap(c, 2)?.to_string(),
            })
        }),
    ]
});

/// `Some(None)` when the property is unavailable, `None` when malformed.
fn optional_secs(text: &str) -> Option<Option<Time>> {
    if text == "(unavailable)" {
        return Some(None);
    }
    Time::parse_secs(text).map(Some)
}

fn decode_status(c: &Captures<'_>) -> Option<Line> {
    let paused = cap(c, 3)? == "yes";
    let cache = cap(c, 4)? == "yes";
    let idle = cap(c, 5)? == "yes";
    Some(Line::Status(Status {
        time: optional_secs(cap(c, 1)?)?,
        duration: optional_secs(cap(c, 2)?)?,
        paused: Some(paused),
        buffering: Some(cache || (idle && !paused)),
    }))
}

fn decode_selection_answer(c: &Captures<'_>) -> Option<Line> {
    let kind = match cap(c, 1)? {
        "aid" => TrackKind::Audio,
        "vid" => TrackKind::Video,
        "sid" => TrackKind::Subtitle,
        _ => TrackKind::SecondarySubtitle,
    };
    // "no", "auto" and empty all mean nothing is active.
    let id = cap(c, 2)?.trim().parse().ok();
    Some(Line::Answer(Some(Box::new(Line::Selected {
        kind,
        sub_kind: None,
        id,
    }))))
}

fn decode_track(c: &Captures<'_>) -> Option<Line> {
    let selected = matches!(cap(c, 1), Some("(+)") | Some("●"));
    let rest = cap(c, 4).unwrap_or_default();
    let slot = match cap(c, 2)? {
        "Video" => TrackSlot::Video,
        "Audio" => TrackSlot::Audio,
        _ if rest.contains("(external)") => TrackSlot::Subtitle(SubtitleKind::External),
        _ => TrackSlot::Subtitle(SubtitleKind::Embedded),
    };
    let mut line = TrackLine::declare(slot, cap_u32(c, 3)?);
    line.selected = Some(selected);
    line.fields.lang = rest.split_whitespace().find_map(|word| {
        word.strip_prefix("--")
            .and_then(|w| w.get(1..))
            .and_then(|w| w.strip_prefix("lang="))
            .map(str::to_string)
    });
    if let (Some(open), Some(close)) = (rest.find('\''), rest.rfind('\'')) {
        if close > open {
            line.fields.name = Some(rest[open + 1..close].to_string());
        }
    }
    Some(Line::Track(line))
}

#[derive(Deserialize)]
struct ChapterEntry {
    #[serde(default)]
    title: Option<String>,
    time: f64,
}

fn parse_chapter_list(json: &str) -> Option<Vec<ChapterLine>> {
    let entries: Vec<ChapterEntry> = serde_json::from_str(json).ok()?;
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            Some(ChapterLine {
                id: u32::try_from(idx).ok()?,
                start: Some(Time::checked_from_secs_f64(entry.time)?),
                name: entry.title.filter(|t| !t.is_empty()),
            })
        })
        .collect()
}

fn parse_metadata(json: &str) -> Option<Vec<(String, String)>> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json).ok()?;
    Some(
        object
            .into_iter()
            .map(|(key, value)| {
                let text = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, text)
            })
            .collect(),
    )
}
