//! Per-session media state derived from the backend's output.
//!
//! [`MediaData`] is created fresh for every playback attempt and mutated only
//! on the line-processing path. Collections are ordered maps keyed by the
//! backend's numeric ids; each collection carries its own selection so that
//! at most one entry per slot can be selected at a time.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::locator::{Locator, MediaType};
use crate::timing::{Time, Timing};

/// Predefined aspect ratios that reported values snap to.
pub const DEFAULT_ASPECT_PRESETS: &[f64] = &[
    4.0 / 3.0,
    5.0 / 4.0,
    14.0 / 9.0,
    16.0 / 9.0,
    16.0 / 10.0,
    1.85,
    2.35,
    2.39,
];

/// Tolerance used when snapping a reported aspect ratio.
pub const ASPECT_EPSILON: f64 = 0.0001;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Ordered id → record map with a primary and a secondary selection slot.
///
/// A selection always references an existing entry or is `None`.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "K: Serialize, T: Serialize"))]
pub struct Catalog<K: Ord, T> {
    #[serde(serialize_with = "values_only")]
    items: BTreeMap<K, T>,
    selected: Option<K>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secondary: Option<K>,
}

fn values_only<K, T, S>(items: &BTreeMap<K, T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    serializer.collect_seq(items.values())
}

impl<K: Ord, T> Default for Catalog<K, T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            selected: None,
            secondary: None,
        }
    }
}

impl<K: Ord + Copy, T> Catalog<K, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: K) -> Option<&T> {
        self.items.get(&key)
    }

    pub fn contains(&self, key: K) -> bool {
        self.items.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &T)> {
        self.items.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.items.keys().copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn selected(&self) -> Option<K> {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|k| self.items.get(&k))
    }

    pub fn secondary(&self) -> Option<K> {
        self.secondary
    }

    /// Insert a record built by `make`, or edit the existing one.
    ///
    /// `edit` reports whether it changed anything; insertion always counts
    /// as a change.
    pub fn upsert(
        &mut self,
        key: K,
        make: impl FnOnce() -> T,
        edit: impl FnOnce(&mut T) -> bool,
    ) -> bool {
        match self.items.get_mut(&key) {
            Some(existing) => edit(existing),
            None => {
                let mut item = make();
                edit(&mut item);
                self.items.insert(key, item);
                true
            }
        }
    }

    /// Select `key` in the primary slot. Unknown keys are refused.
    pub fn select(&mut self, key: Option<K>) -> bool {
        Self::set_slot(&self.items, &mut self.selected, key)
    }

    /// Select `key` in the secondary slot. Unknown keys are refused.
    pub fn select_secondary(&mut self, key: Option<K>) -> bool {
        Self::set_slot(&self.items, &mut self.secondary, key)
    }

    fn set_slot(items: &BTreeMap<K, T>, slot: &mut Option<K>, key: Option<K>) -> bool {
        if let Some(k) = key {
            if !items.contains_key(&k) {
                return false;
            }
        }
        if *slot == key {
            return false;
        }
        *slot = key;
        true
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A video or audio track.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Track {
    pub id: u32,
    pub name: Option<String>,
    pub lang: Option<String>,
}

/// Optional fields carried by one track description line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackFields {
    pub name: Option<String>,
    pub lang: Option<String>,
    pub filename: Option<String>,
}

impl Track {
    fn merge(&mut self, fields: &TrackFields) -> bool {
        merge_field(&mut self.name, &fields.name) | merge_field(&mut self.lang, &fields.lang)
    }
}

fn merge_field(slot: &mut Option<String>, value: &Option<String>) -> bool {
    match value {
        Some(v) if slot.as_deref() != Some(v.as_str()) => {
            *slot = Some(v.clone());
            true
        }
        _ => false,
    }
}

/// Where a subtitle stream comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleKind {
    /// Demuxed from the media container.
    Embedded,
    /// DVD bitmap subtitles, numbered separately from demuxed streams.
    Vobsub,
    /// Loaded from an external file.
    External,
}

/// Subtitle ids are unique per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubtitleKey {
    pub kind: SubtitleKind,
    pub id: u32,
}

impl SubtitleKey {
    pub fn new(kind: SubtitleKind, id: u32) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for SubtitleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleTrack {
    pub kind: SubtitleKind,
    pub id: u32,
    pub name: Option<String>,
    pub lang: Option<String>,
    pub filename: Option<String>,
}

impl SubtitleTrack {
    fn merge(&mut self, fields: &TrackFields) -> bool {
        merge_field(&mut self.name, &fields.name)
            | merge_field(&mut self.lang, &fields.lang)
            | merge_field(&mut self.filename, &fields.filename)
    }
}

/// A disc navigation unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Title {
    pub id: u32,
    pub duration: Time,
    /// Start within the disc timeline, when titles share one clock.
    pub start: Option<Time>,
    pub name: Option<String>,
    pub chapters: u32,
    pub angles: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Chapter {
    pub id: u32,
    pub start: Time,
    pub name: Option<String>,
}

/// Which track collection a notification or command is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    SecondarySubtitle,
}

// ---------------------------------------------------------------------------
// Stream info
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub out_width: u32,
    pub out_height: u32,
    /// Aspect ratio reported by the backend, after precision snapping.
    pub aspect: Option<f64>,
    pub fps: Option<f64>,
    pub codec: Option<String>,
    pub format: Option<String>,
    pub colorspace_in: Option<String>,
    pub colorspace_out: Option<String>,
    pub bitrate: u32,
}

impl VideoInfo {
    /// Aspect derived from the source dimensions.
    pub fn source_aspect(&self) -> Option<f64> {
        (self.width > 0 && self.height > 0).then(|| self.width as f64 / self.height as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioInfo {
    pub channels: u32,
    pub rate: u32,
    pub codec: Option<String>,
    pub format: Option<String>,
    pub bitrate: u32,
}

/// Snap a reported aspect ratio to the source aspect or a preset when within
/// `epsilon`; otherwise return it unchanged.
pub fn upgrade_aspect_precision(
    reported: f64,
    source: Option<f64>,
    presets: &[f64],
    epsilon: f64,
) -> f64 {
    if let Some(src) = source {
        if (reported - src).abs() < epsilon {
            return src;
        }
    }
    presets
        .iter()
        .copied()
        .find(|p| (reported - p).abs() < epsilon)
        .unwrap_or(reported)
}

/// Outcome of a duration report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUpdate {
    Unchanged,
    Changed,
    /// A negative value was reported and the duration reset to zero.
    Clamped,
}

// ---------------------------------------------------------------------------
// MediaData
// ---------------------------------------------------------------------------

/// All media state accumulated during one playback session.
#[derive(Debug, Clone, Serialize)]
pub struct MediaData {
    pub locator: Locator,
    pub media_type: MediaType,

    /// Last position reported by the backend.
    position: Time,
    /// `position` run through the timing transform.
    gui_position: Time,
    duration: Time,
    pub timing: Timing,

    pub video: VideoInfo,
    pub audio: AudioInfo,

    pub videos: Catalog<u32, Track>,
    pub audios: Catalog<u32, Track>,
    pub subtitles: Catalog<SubtitleKey, SubtitleTrack>,
    pub titles: Catalog<u32, Title>,
    pub chapters: Catalog<u32, Chapter>,

    pub metadata: BTreeMap<String, String>,

    pub demuxer: Option<String>,
    pub seekable: bool,
    /// Requested 1-based disc title.
    pub requested_title: Option<u32>,
    /// DVD disc serial number.
    pub serial: Option<String>,
    pub angle: u32,
    pub angle_count: u32,
    /// Count of anomalous values clamped during this session.
    anomalies: u32,
}

impl MediaData {
    pub fn new(locator: Locator) -> Self {
        Self {
            media_type: locator.media_type(),
            requested_title: locator.title(),
            locator,
            position: Time::ZERO,
            gui_position: Time::ZERO,
            duration: Time::ZERO,
            timing: Timing::default(),
            video: VideoInfo::default(),
            audio: AudioInfo::default(),
            videos: Catalog::default(),
            audios: Catalog::default(),
            subtitles: Catalog::default(),
            titles: Catalog::default(),
            chapters: Catalog::default(),
            metadata: BTreeMap::new(),
            demuxer: None,
            seekable: true,
            serial: None,
            angle: 1,
            angle_count: 0,
            anomalies: 0,
        }
    }

    // -- timing ---------------------------------------------------------------

    pub fn position(&self) -> Time {
        self.position
    }

    pub fn gui_position(&self) -> Time {
        self.gui_position
    }

    pub fn duration(&self) -> Time {
        self.duration
    }

    pub fn anomalies(&self) -> u32 {
        self.anomalies
    }

    /// Store a reported duration; negative values clamp to zero.
    ///
    /// Every negative report counts as an anomaly, but only one that moves
    /// the stored duration is reported as `Clamped`.
    pub fn set_duration(&mut self, duration: Time) -> DurationUpdate {
        if duration.is_negative() {
            tracing::warn!("Backend reported negative duration {duration}; clamping to 0");
            self.anomalies += 1;
            if self.duration == Time::ZERO {
                return DurationUpdate::Unchanged;
            }
            self.duration = Time::ZERO;
            return DurationUpdate::Clamped;
        }
        if duration == self.duration {
            return DurationUpdate::Unchanged;
        }
        self.duration = duration;
        DurationUpdate::Changed
    }

    /// Record a player position and return the derived GUI position.
    pub fn set_position(&mut self, player_time: Time) -> Time {
        if self.timing.observe(player_time) {
            tracing::debug!("Inferred start offset {player_time} from negative timestamp");
        }
        self.position = player_time;
        self.gui_position = self.timing.player_to_gui(player_time);
        self.gui_position
    }

    /// Apply a start time reported by the backend.
    pub fn set_start_time(&mut self, start: Time) {
        self.timing.set_start(start);
        self.gui_position = self.timing.player_to_gui(self.position);
    }

    pub fn set_mpegts(&mut self, mpegts: bool) {
        self.timing.set_mpegts(mpegts);
        self.gui_position = self.timing.player_to_gui(self.position);
    }

    /// Player time for an absolute GUI position.
    pub fn gui_to_player(&self, gui_time: Time) -> Time {
        self.timing.gui_to_player(gui_time)
    }

    // -- tracks ---------------------------------------------------------------

    /// Add or update a video or audio track. Returns `true` on change.
    pub fn update_track(&mut self, kind: TrackKind, id: u32, fields: &TrackFields) -> bool {
        let catalog = match kind {
            TrackKind::Video => &mut self.videos,
            TrackKind::Audio => &mut self.audios,
            TrackKind::Subtitle | TrackKind::SecondarySubtitle => return false,
        };
        catalog.upsert(
            id,
            || Track {
                id,
                ..Track::default()
            },
            |t| t.merge(fields),
        )
    }

    pub fn update_subtitle(&mut self, key: SubtitleKey, fields: &TrackFields) -> bool {
        self.subtitles.upsert(
            key,
            || SubtitleTrack {
                kind: key.kind,
                id: key.id,
                name: None,
                lang: None,
                filename: None,
            },
            |s| s.merge(fields),
        )
    }

    /// Select a video or audio track by id.
    pub fn select_track(&mut self, kind: TrackKind, id: Option<u32>) -> bool {
        match kind {
            TrackKind::Video => self.videos.select(id),
            TrackKind::Audio => self.audios.select(id),
            TrackKind::Subtitle | TrackKind::SecondarySubtitle => false,
        }
    }

    /// Resolve a subtitle id the way a backend reports it. MPV ids are
    /// unique across kinds; MPlayer numbers each kind separately.
    pub fn find_subtitle(&self, id: u32, kind: Option<SubtitleKind>) -> Option<SubtitleKey> {
        match kind {
            Some(k) => {
                let key = SubtitleKey::new(k, id);
                self.subtitles.contains(key).then_some(key)
            }
            None => self.subtitles.keys().find(|k| k.id == id),
        }
    }

    // -- disc navigation ------------------------------------------------------

    /// Start of a title on the shared disc timeline.
    pub fn title_start(&self, id: u32) -> Option<Time> {
        let title = self.titles.get(id)?;
        if let Some(start) = title.start {
            return Some(start);
        }
        let preceding = self
            .titles
            .iter()
            .take_while(|(k, _)| **k < id)
            .fold(Time::ZERO, |acc, (_, t)| acc + t.duration);
        Some(preceding)
    }

    /// Chapter containing the given GUI position.
    pub fn chapter_at(&self, gui_time: Time) -> Option<u32> {
        self.chapters
            .iter()
            .filter(|(_, c)| c.start <= gui_time)
            .max_by_key(|(_, c)| c.start)
            .map(|(k, _)| *k)
    }

    /// Build one title per chapter when the backend reported chapters but no
    /// titles. Title ids are 1-based; the last title runs to the end of the
    /// media. Returns `true` if titles were created.
    pub fn synthesize_titles_from_chapters(&mut self) -> bool {
        if !self.titles.is_empty() || self.chapters.is_empty() {
            return false;
        }

        let chapters: Vec<Chapter> = self.chapters.values().cloned().collect();
        for (idx, chapter) in chapters.iter().enumerate() {
            let end = chapters
                .get(idx + 1)
                .map(|next| next.start)
                .unwrap_or(self.duration);
            let id = idx as u32 + 1;
            let title = Title {
                id,
                duration: (end - chapter.start).max(Time::ZERO),
                start: Some(chapter.start),
                name: chapter.name.clone(),
                chapters: 0,
                angles: 0,
            };
            self.titles.upsert(id, || title, |_| false);
        }

        let selected = self
            .requested_title
            .filter(|t| self.titles.contains(*t))
            .or(Some(1));
        self.titles.select(selected);
        tracing::debug!("Synthesized {} titles from chapters", self.titles.len());
        true
    }

    // -- metadata -------------------------------------------------------------

    /// Store a metadata entry under an uppercase key. Empty values are
    /// ignored. Returns `true` on change.
    pub fn set_metadata(&mut self, key: &str, value: &str) -> bool {
        let key = key.trim().to_uppercase();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            return false;
        }
        if self.metadata.get(&key).map(String::as_str) == Some(value) {
            return false;
        }
        self.metadata.insert(key, value.to_string());
        true
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(&key.to_uppercase()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(locator: &str) -> MediaData {
        MediaData::new(Locator::parse(locator))
    }

    fn fields(name: &str, lang: &str) -> TrackFields {
        TrackFields {
            name: Some(name.into()),
            lang: Some(lang.into()),
            filename: None,
        }
    }

    #[test]
    fn new_session_from_locator() {
        let md = media("dvd://2");
        assert_eq!(md.media_type, MediaType::Dvd);
        assert_eq!(md.requested_title, Some(2));
        assert_eq!(md.duration(), Time::ZERO);
    }

    #[test]
    fn negative_duration_clamps_then_recovers() {
        let mut md = media("/tmp/a.mkv");
        assert_eq!(md.set_duration(Time::from_millis(-5_000)), DurationUpdate::Unchanged);
        assert_eq!(md.duration(), Time::ZERO);
        assert_eq!(md.anomalies(), 1);

        assert_eq!(md.set_duration(Time::from_millis(90_000)), DurationUpdate::Changed);
        assert_eq!(md.duration(), Time::from_millis(90_000));
        assert_eq!(md.set_duration(Time::from_millis(90_000)), DurationUpdate::Unchanged);

        assert_eq!(md.set_duration(Time::from_millis(-1)), DurationUpdate::Clamped);
        assert_eq!(md.duration(), Time::ZERO);
        assert_eq!(md.anomalies(), 2);
    }

    #[test]
    fn track_update_is_idempotent() {
        let mut md = media("/tmp/a.mkv");
        assert!(md.update_track(TrackKind::Audio, 1, &fields("English", "eng")));
        assert!(!md.update_track(TrackKind::Audio, 1, &fields("English", "eng")));
        assert!(md.update_track(TrackKind::Audio, 1, &fields("Commentary", "eng")));
        assert_eq!(md.audios.len(), 1);
    }

    #[test]
    fn selection_requires_existing_entry() {
        let mut md = media("/tmp/a.mkv");
        assert!(!md.select_track(TrackKind::Audio, Some(3)));
        md.update_track(TrackKind::Audio, 3, &TrackFields::default());
        md.update_track(TrackKind::Audio, 4, &TrackFields::default());
        assert!(md.select_track(TrackKind::Audio, Some(3)));
        assert!(!md.select_track(TrackKind::Audio, Some(3)));
        assert!(md.select_track(TrackKind::Audio, Some(4)));
        assert_eq!(md.audios.selected(), Some(4));
        assert!(md.select_track(TrackKind::Audio, None));
        assert_eq!(md.audios.selected(), None);
    }

    #[test]
    fn subtitle_slots_are_independent() {
        let mut md = media("/tmp/a.mkv");
        let emb = SubtitleKey::new(SubtitleKind::Embedded, 0);
        let ext = SubtitleKey::new(SubtitleKind::External, 0);
        md.update_subtitle(emb, &fields("Full", "eng"));
        md.update_subtitle(
            ext,
            &TrackFields {
                filename: Some("/subs/movie.fr.srt".into()),
                ..TrackFields::default()
            },
        );
        assert_eq!(md.subtitles.len(), 2);
        assert!(md.subtitles.select(Some(emb)));
        assert!(md.subtitles.select_secondary(Some(ext)));
        assert_eq!(md.subtitles.selected(), Some(emb));
        assert_eq!(md.subtitles.secondary(), Some(ext));
        assert_eq!(
            md.subtitles.get(ext).unwrap().filename.as_deref(),
            Some("/subs/movie.fr.srt")
        );
    }

    #[test]
    fn find_subtitle_by_kind_or_id() {
        let mut md = media("/tmp/a.mkv");
        let key = SubtitleKey::new(SubtitleKind::Vobsub, 2);
        md.update_subtitle(key, &TrackFields::default());
        assert_eq!(md.find_subtitle(2, Some(SubtitleKind::Vobsub)), Some(key));
        assert_eq!(md.find_subtitle(2, Some(SubtitleKind::Embedded)), None);
        assert_eq!(md.find_subtitle(2, None), Some(key));
    }

    #[test]
    fn gui_position_follows_start_offset() {
        let mut md = media("/tmp/a.ts");
        md.set_position(Time::from_millis(12_000));
        md.set_start_time(Time::from_millis(2_000));
        assert_eq!(md.gui_position(), Time::from_millis(10_000));
        assert_eq!(md.gui_to_player(Time::from_millis(10_000)), Time::from_millis(12_000));
    }

    fn add_chapter(md: &mut MediaData, id: u32, start_ms: i64) {
        md.chapters.upsert(
            id,
            || Chapter {
                id,
                start: Time::from_millis(start_ms),
                name: None,
            },
            |_| false,
        );
    }

    #[test]
    fn single_chapter_synthesizes_full_title() {
        let mut md = media("cdda://");
        md.set_duration(Time::from_millis(600_000));
        add_chapter(&mut md, 0, 0);
        assert!(md.synthesize_titles_from_chapters());
        assert_eq!(md.titles.len(), 1);
        assert_eq!(md.titles.get(1).unwrap().duration, Time::from_millis(600_000));
        assert_eq!(md.titles.selected(), Some(1));
    }

    #[test]
    fn chapters_synthesize_gap_durations() {
        let mut md = media("vcd://");
        md.set_duration(Time::from_millis(600_000));
        add_chapter(&mut md, 0, 0);
        add_chapter(&mut md, 1, 120_000);
        add_chapter(&mut md, 2, 300_000);
        assert!(md.synthesize_titles_from_chapters());
        let durations: Vec<Time> = md.titles.values().map(|t| t.duration).collect();
        assert_eq!(
            durations,
            vec![
                Time::from_millis(120_000),
                Time::from_millis(180_000),
                Time::from_millis(300_000)
            ]
        );
        assert_eq!(md.title_start(3), Some(Time::from_millis(300_000)));
        // Already has titles now.
        assert!(!md.synthesize_titles_from_chapters());
    }

    #[test]
    fn title_start_accumulates_durations() {
        let mut md = media("dvd://");
        for (id, secs) in [(1u32, 100i64), (2, 50), (3, 30)] {
            md.titles.upsert(
                id,
                || Title {
                    id,
                    duration: Time::from_millis(secs * 1000),
                    ..Title::default()
                },
                |_| false,
            );
        }
        assert_eq!(md.title_start(1), Some(Time::ZERO));
        assert_eq!(md.title_start(3), Some(Time::from_millis(150_000)));
        assert_eq!(md.title_start(9), None);
    }

    #[test]
    fn chapter_at_position() {
        let mut md = media("/tmp/a.mkv");
        add_chapter(&mut md, 0, 0);
        add_chapter(&mut md, 1, 60_000);
        assert_eq!(md.chapter_at(Time::from_millis(59_999)), Some(0));
        assert_eq!(md.chapter_at(Time::from_millis(60_000)), Some(1));
    }

    #[test]
    fn metadata_keys_uppercase_values_trimmed() {
        let mut md = media("http://radio/stream");
        assert!(md.set_metadata("artist", "  Someone "));
        assert_eq!(md.metadata("ARTIST"), Some("Someone"));
        assert!(!md.set_metadata("Artist", "Someone"));
        assert!(!md.set_metadata("album", "   "));
    }

    #[test]
    fn aspect_snaps_to_source_then_presets() {
        let src = Some(1920.0 / 1080.0);
        assert_eq!(
            upgrade_aspect_precision(1.77778, src, DEFAULT_ASPECT_PRESETS, ASPECT_EPSILON),
            1920.0 / 1080.0
        );
        assert_eq!(
            upgrade_aspect_precision(1.33333, None, DEFAULT_ASPECT_PRESETS, ASPECT_EPSILON),
            4.0 / 3.0
        );
        assert_eq!(
            upgrade_aspect_precision(2.2, src, DEFAULT_ASPECT_PRESETS, ASPECT_EPSILON),
            2.2
        );
    }

    #[test]
    fn serializes_catalog_as_list() {
        let mut md = media("/tmp/a.mkv");
        md.update_track(TrackKind::Audio, 2, &fields("English", "eng"));
        md.select_track(TrackKind::Audio, Some(2));
        let json = serde_json::to_value(&md).unwrap();
        assert_eq!(json["audios"]["items"][0]["lang"], "eng");
        assert_eq!(json["audios"]["selected"], 2);
    }
}
