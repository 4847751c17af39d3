//! Recognized backend output, independent of the dialect that produced it.

use pw_core::{ExitReason, SubtitleKind, Time, TrackFields, TrackKind};

/// Periodic playback status. Fields a backend did not report are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
    pub time: Option<Time>,
    pub duration: Option<Time>,
    pub paused: Option<bool>,
    pub buffering: Option<bool>,
}

/// Which collection a track line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackSlot {
    Video,
    Audio,
    Subtitle(SubtitleKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackLine {
    pub slot: TrackSlot,
    /// `None` refers to the most recently declared track of this slot.
    pub id: Option<u32>,
    pub fields: TrackFields,
    /// Set when the line also reports whether the track is active.
    pub selected: Option<bool>,
}

impl TrackLine {
    pub fn declare(slot: TrackSlot, id: u32) -> Self {
        Self {
            slot,
            id: Some(id),
            fields: TrackFields::default(),
            selected: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountKind {
    Titles,
    Chapters,
}

/// A disc title description. `id` is in the backend's own numbering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleLine {
    pub id: u32,
    pub duration: Option<Time>,
    pub chapters: Option<u32>,
    pub angles: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterLine {
    /// Zero-based chapter index.
    pub id: u32,
    pub start: Option<Time>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Status(Status),
    Track(TrackLine),
    /// `KEY=value` identification output with the dialect prefix removed.
    Property { key: String, value: String },
    Count { kind: CountKind, count: u32 },
    /// The backend reports it is playing this title (backend numbering).
    TitleSwitch { native: u32 },
    TitleNotFound,
    Title(TitleLine),
    Chapter(ChapterLine),
    ChapterList(Vec<ChapterLine>),
    Metadata(Vec<(String, String)>),
    /// Indexed metadata key, paired later with a [`Line::MetadataValue`].
    MetadataKey { index: u32, key: String },
    MetadataValue { index: u32, value: String },
    /// Active track as reported by a query. `id == None` means disabled.
    Selected {
        kind: TrackKind,
        sub_kind: Option<SubtitleKind>,
        id: Option<u32>,
    },
    /// Reply to an outstanding query; the inner line is what it carried.
    Answer(Option<Box<Line>>),
    VideoOutput {
        width: u32,
        height: u32,
        colorspace: Option<String>,
    },
    PlaybackStarted,
    EndOfFile,
    Fatal(ExitReason),
}

/// Result of running one line through a dialect's pattern table.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Line(Line),
    /// A pattern matched but its captures did not decode.
    Malformed(&'static str),
    Unhandled,
}
