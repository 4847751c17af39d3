//! The line parser: applies classified backend output to [`MediaData`].
//!
//! One [`LineParser`] lives for exactly one session. It is the only writer
//! of the session's `MediaData`; everything it wants the outside world to
//! know or do comes back in an [`Outcome`].

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use pw_core::config::PlayerConfig;
use pw_core::events::PlayerEvent;
use pw_core::{
    upgrade_aspect_precision, Chapter, DurationUpdate, ExitReason, MediaData, MediaType,
    SubtitleKey, SubtitleKind, Time, Title, TrackKind,
};

use crate::backend::{Dialect, Outgoing};
use crate::line::{ChapterLine, Classified, Line, Status, TitleLine, TrackLine, TrackSlot};

/// Tunables that shape parser behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserSettings {
    /// Lines to wait for outstanding answers before giving up on them.
    pub pending_answer_guard: u32,
    /// Forced quit lands this long before the current DVD title ends.
    pub title_end_margin: Time,
    /// A delayed CD title switch commits this long before its start.
    pub title_switch_lead_in: Time,
    pub aspect_epsilon: f64,
    pub aspect_presets: Vec<f64>,
}

impl From<&PlayerConfig> for ParserSettings {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            pending_answer_guard: config.pending_answer_guard,
            title_end_margin: Time::from_millis(config.title_end_margin_ms as i64),
            title_switch_lead_in: Time::from_millis(config.title_switch_lead_in_ms as i64),
            aspect_epsilon: config.aspect_epsilon,
            aspect_presets: config.aspect_presets.clone(),
        }
    }
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self::from(&PlayerConfig::default())
    }
}

/// What one line asks of the driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub events: Vec<PlayerEvent>,
    /// Lines to write back to the backend, in order. The writer registers
    /// the queries it delivers through [`LineParser::expect_answers`].
    pub commands: Vec<Outgoing>,
    /// Send a quit with this reason now.
    pub quit: Option<ExitReason>,
    /// Quit after this delay, treating it as the end of the file.
    pub schedule_quit: Option<Duration>,
    /// The backend reported the end of the file.
    pub end_of_file: bool,
    /// The line matched a pattern.
    pub handled: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingSwitch {
    title: u32,
    start: Time,
}

pub struct LineParser {
    dialect: &'static dyn Dialect,
    settings: ParserSettings,
    fully_loaded: bool,
    pending: u32,
    guard_left: u32,
    buffering: bool,
    paused: bool,
    started: bool,
    title_not_found: bool,
    title_confirmed: bool,
    pending_switch: Option<PendingSwitch>,
    fatal: Option<ExitReason>,
    end_of_file: bool,
    /// Most recently declared id per track slot.
    last_declared: HashMap<TrackSlot, u32>,
    /// Indexed metadata keys waiting for their values.
    metadata_keys: BTreeMap<u32, String>,
}

impl LineParser {
    pub fn new(dialect: &'static dyn Dialect, settings: ParserSettings) -> Self {
        Self {
            dialect,
            settings,
            fully_loaded: false,
            pending: 0,
            guard_left: 0,
            buffering: false,
            paused: false,
            started: false,
            title_not_found: false,
            title_confirmed: false,
            pending_switch: None,
            fatal: None,
            end_of_file: false,
            last_declared: HashMap::new(),
            metadata_keys: BTreeMap::new(),
        }
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    pub fn fully_loaded(&self) -> bool {
        self.fully_loaded
    }

    pub fn pending_answers(&self) -> u32 {
        self.pending
    }

    pub fn end_of_file_seen(&self) -> bool {
        self.end_of_file
    }

    /// The condition that should override the process exit status, if any.
    pub fn latched_fatal(&self) -> Option<ExitReason> {
        self.fatal
            .or(self.title_not_found.then_some(ExitReason::TitleNotFound))
    }

    /// Register `n` queries written to the backend whose answers it will
    /// print.
    ///
    /// Each registration restarts the safety guard.
    pub fn expect_answers(&mut self, n: u32) {
        if n == 0 || self.settings.pending_answer_guard == 0 {
            return;
        }
        self.pending += n;
        self.guard_left = self.settings.pending_answer_guard;
    }

    /// Process one line of backend output.
    pub fn parse_line(&mut self, md: &mut MediaData, raw: &str) -> Outcome {
        let mut out = Outcome::default();
        let text = raw.trim();
        if text.is_empty() {
            return out;
        }
        self.tick_guard();

        match self.dialect.classify(text) {
            Classified::Line(line) => {
                out.handled = true;
                self.apply(md, line, &mut out);
            }
            Classified::Malformed(rule) => {
                tracing::debug!(rule, "Ignoring malformed line: {text}");
            }
            Classified::Unhandled => {
                tracing::trace!("Unhandled line: {text}");
            }
        }
        out
    }

    fn tick_guard(&mut self) {
        if self.pending == 0 {
            return;
        }
        self.guard_left = self.guard_left.saturating_sub(1);
        if self.guard_left == 0 {
            tracing::warn!(
                pending = self.pending,
                "Gave up waiting for backend answers after {} lines",
                self.settings.pending_answer_guard
            );
            self.pending = 0;
        }
    }

    /// Push a notification that is only meaningful once loading finished.
    fn notify(&self, out: &mut Outcome, event: PlayerEvent) {
        if self.fully_loaded {
            out.events.push(event);
        }
    }

    fn apply(&mut self, md: &mut MediaData, line: Line, out: &mut Outcome) {
        match line {
            Line::Status(status) => self.on_status(md, status, out),
            Line::Track(track) => self.on_track(md, track, out),
            Line::Property { key, value } => self.on_property(md, &key, value.trim(), out),
            Line::Count { kind, count } => {
                tracing::debug!(?kind, count, "Backend reported count");
                out.commands.extend(self.dialect.follow_up(kind, count));
            }
            Line::TitleSwitch { native } => self.on_title_switch(md, native, out),
            Line::TitleNotFound => {
                tracing::info!("Backend could not select the requested title");
                self.title_not_found = true;
            }
            Line::Title(title) => self.on_title(md, title, out),
            Line::Chapter(chapter) => {
                if merge_chapter(md, chapter) {
                    self.notify(out, PlayerEvent::ChaptersChanged);
                }
            }
            Line::ChapterList(chapters) => {
                let mut changed = false;
                for chapter in chapters {
                    changed |= merge_chapter(md, chapter);
                }
                if changed {
                    self.notify(out, PlayerEvent::ChaptersChanged);
                }
            }
            Line::Metadata(entries) => {
                let mut changed = false;
                for (key, value) in &entries {
                    changed |= md.set_metadata(key, value);
                }
                if changed {
                    self.notify(out, PlayerEvent::MetadataChanged);
                }
            }
            Line::MetadataKey { index, key } => {
                self.metadata_keys.insert(index, key);
            }
            Line::MetadataValue { index, value } => {
                let changed = self
                    .metadata_keys
                    .get(&index)
                    .is_some_and(|key| md.set_metadata(key, &value));
                if changed {
                    self.notify(out, PlayerEvent::MetadataChanged);
                }
            }
            Line::Selected { kind, sub_kind, id } => self.on_selected(md, kind, sub_kind, id, out),
            Line::Answer(inner) => {
                self.pending = self.pending.saturating_sub(1);
                if let Some(inner) = inner {
                    self.apply(md, *inner, out);
                }
            }
            Line::VideoOutput {
                width,
                height,
                colorspace,
            } => {
                if let Some(cs) = colorspace {
                    md.video.colorspace_out = Some(cs);
                }
                set_output_size(md, Some(width), Some(height), out);
            }
            Line::PlaybackStarted => {
                if !self.started {
                    self.started = true;
                    out.commands.extend(self.dialect.startup_queries());
                }
            }
            Line::EndOfFile => {
                tracing::debug!("Backend reached end of file");
                self.end_of_file = true;
                out.end_of_file = true;
            }
            Line::Fatal(reason) => {
                tracing::warn!(code = reason.code(), "Backend reported: {reason}");
                self.fatal = Some(reason);
                if reason == ExitReason::NoDisc {
                    out.quit = Some(reason);
                }
            }
        }
    }

    // -- status ---------------------------------------------------------------

    fn on_status(&mut self, md: &mut MediaData, status: Status, out: &mut Outcome) {
        if let Some(duration) = status.duration {
            apply_duration(md, duration, out);
        }
        if let Some(time) = status.time {
            let before = md.gui_position();
            let gui = md.set_position(time);
            if gui != before {
                out.events.push(PlayerEvent::PositionChanged { position: gui });
            }
            self.commit_pending_switch(md, gui, out);
            self.track_chapter(md, gui, out);
        }

        if self.pending > 0 {
            return;
        }

        if !self.fully_loaded && status.time.is_some() {
            self.fully_loaded = true;
            if md.media_type.is_cd() && md.synthesize_titles_from_chapters() {
                out.events.push(PlayerEvent::TitlesChanged);
            }
            tracing::info!(
                duration = %md.duration(),
                titles = md.titles.len(),
                "Session fully loaded"
            );
            out.events.push(PlayerEvent::FullyLoaded);
        }

        if let Some(buffering) = status.buffering {
            if buffering != self.buffering {
                self.buffering = buffering;
                out.events.push(if buffering {
                    PlayerEvent::BufferingStarted
                } else {
                    PlayerEvent::BufferingEnded
                });
            }
        }
        if let Some(paused) = status.paused {
            if paused != self.paused {
                self.paused = paused;
                out.events.push(PlayerEvent::PauseChanged { paused });
            }
        }
    }

    fn track_chapter(&mut self, md: &mut MediaData, gui: Time, out: &mut Outcome) {
        if md.chapters.is_empty() {
            return;
        }
        let current = md.chapter_at(gui);
        if md.chapters.select(current) {
            if let Some(chapter) = current {
                self.notify(out, PlayerEvent::ChapterChanged { chapter });
            }
        }
    }

    // -- tracks ---------------------------------------------------------------

    fn on_track(&mut self, md: &mut MediaData, track: TrackLine, out: &mut Outcome) {
        let id = match track.id {
            Some(id) => {
                self.last_declared.insert(track.slot, id);
                id
            }
            None => match self.last_declared.get(&track.slot) {
                Some(id) => *id,
                None => {
                    tracing::debug!(slot = ?track.slot, "Track detail before any declaration");
                    return;
                }
            },
        };

        let (kind, changed, selection_changed) = match track.slot {
            TrackSlot::Video | TrackSlot::Audio => {
                let kind = if track.slot == TrackSlot::Video {
                    TrackKind::Video
                } else {
                    TrackKind::Audio
                };
                let changed = md.update_track(kind, id, &track.fields);
                let catalog = if kind == TrackKind::Video {
                    &md.videos
                } else {
                    &md.audios
                };
                let target = match track.selected {
                    Some(true) => Some(Some(id)),
                    Some(false) if catalog.selected() == Some(id) => Some(None),
                    _ => None,
                };
                let selection_changed = target.is_some_and(|t| md.select_track(kind, t));
                (kind, changed, selection_changed)
            }
            TrackSlot::Subtitle(sub_kind) => {
                let key = SubtitleKey::new(sub_kind, id);
                let changed = md.update_subtitle(key, &track.fields);
                let selection_changed = match track.selected {
                    Some(true) => md.subtitles.select(Some(key)),
                    Some(false) if md.subtitles.selected() == Some(key) => {
                        md.subtitles.select(None)
                    }
                    _ => false,
                };
                (TrackKind::Subtitle, changed, selection_changed)
            }
        };

        if changed {
            self.notify(out, PlayerEvent::TracksChanged { kind });
        }
        if selection_changed {
            let id = selected_id(md, kind);
            self.notify(out, PlayerEvent::TrackSelected { kind, id });
        }
    }

    fn on_selected(
        &mut self,
        md: &mut MediaData,
        kind: TrackKind,
        sub_kind: Option<SubtitleKind>,
        id: Option<u32>,
        out: &mut Outcome,
    ) {
        let changed = match kind {
            TrackKind::Video | TrackKind::Audio => md.select_track(kind, id),
            TrackKind::Subtitle | TrackKind::SecondarySubtitle => {
                let secondary = kind == TrackKind::SecondarySubtitle;
                let current = if secondary {
                    md.subtitles.secondary()
                } else {
                    md.subtitles.selected()
                };
                let target = match id {
                    Some(id) => match md.find_subtitle(id, sub_kind) {
                        Some(key) => Some(key),
                        None => {
                            tracing::debug!(id, "Selected subtitle is not in the track list");
                            return;
                        }
                    },
                    // A kind-specific "none" only clears a selection of that kind.
                    None if sub_kind.is_some_and(|k| current.is_some_and(|c| c.kind != k)) => {
                        return;
                    }
                    None => None,
                };
                if secondary {
                    md.subtitles.select_secondary(target)
                } else {
                    md.subtitles.select(target)
                }
            }
        };
        if changed {
            let id = selected_id(md, kind);
            self.notify(out, PlayerEvent::TrackSelected { kind, id });
        }
    }

    // -- properties -----------------------------------------------------------

    fn on_property(&mut self, md: &mut MediaData, key: &str, value: &str, out: &mut Outcome) {
        if value.is_empty() {
            return;
        }
        match key {
            "LENGTH" => {
                if let Some(duration) = Time::parse_secs(value) {
                    apply_duration(md, duration, out);
                }
            }
            "START_TIME" => {
                if let Some(start) = Time::parse_secs(value) {
                    md.set_start_time(start);
                }
            }
            "DEMUXER" | "FILE_FORMAT" => {
                if value.eq_ignore_ascii_case("mpegts") {
                    md.set_mpegts(true);
                }
                if key == "DEMUXER" {
                    md.demuxer = Some(value.to_string());
                }
            }
            "SEEKABLE" => md.seekable = matches!(value, "1" | "yes"),
            "VIDEO_WIDTH" => md.video.width = parse_num(value).unwrap_or(md.video.width),
            "VIDEO_HEIGHT" => md.video.height = parse_num(value).unwrap_or(md.video.height),
            "VIDEO_ASPECT" => {
                if let Some(aspect) = value.parse::<f64>().ok().filter(|a| *a > 0.0) {
                    md.video.aspect = Some(upgrade_aspect_precision(
                        aspect,
                        md.video.source_aspect(),
                        &self.settings.aspect_presets,
                        self.settings.aspect_epsilon,
                    ));
                }
            }
            "VIDEO_FPS" => {
                md.video.fps = value.parse::<f64>().ok().filter(|f| *f > 0.0).or(md.video.fps);
            }
            "VIDEO_FORMAT" => md.video.format = Some(value.to_string()),
            "VIDEO_CODEC" => md.video.codec = Some(value.to_string()),
            "VIDEO_BITRATE" => md.video.bitrate = parse_num(value).unwrap_or(md.video.bitrate),
            "VIDEO_DWIDTH" => set_output_size(md, parse_num(value), None, out),
            "VIDEO_DHEIGHT" => set_output_size(md, None, parse_num(value), out),
            "VIDEO_COLORSPACE" => md.video.colorspace_in = Some(value.to_string()),
            "VIDEO_OUT_COLORSPACE" => md.video.colorspace_out = Some(value.to_string()),
            "AUDIO_FORMAT" => md.audio.format = Some(value.to_string()),
            "AUDIO_CODEC" => md.audio.codec = Some(value.to_string()),
            "AUDIO_BITRATE" => md.audio.bitrate = parse_num(value).unwrap_or(md.audio.bitrate),
            "AUDIO_RATE" => md.audio.rate = parse_num(value).unwrap_or(md.audio.rate),
            "AUDIO_NCH" => md.audio.channels = parse_num(value).unwrap_or(md.audio.channels),
            "MEDIA_TITLE" => {
                if md.set_metadata("MEDIA_TITLE", value) {
                    self.notify(out, PlayerEvent::MetadataChanged);
                }
            }
            "ANGLE" => md.angle = parse_num(value).unwrap_or(md.angle),
            "DVD_DISC_ID" => md.serial = Some(value.to_string()),
            _ => tracing::trace!(key, "Ignoring property"),
        }
    }

    // -- disc navigation ------------------------------------------------------

    fn on_title(&mut self, md: &mut MediaData, line: TitleLine, out: &mut Outcome) {
        let id = self.dialect.logical_title(line.id);
        let changed = md.titles.upsert(
            id,
            || Title {
                id,
                ..Title::default()
            },
            |title| {
                let mut changed = false;
                if let Some(duration) = line.duration.filter(|d| *d != title.duration) {
                    title.duration = duration.max(Time::ZERO);
                    changed = true;
                }
                if let Some(chapters) = line.chapters.filter(|c| *c != title.chapters) {
                    title.chapters = chapters;
                    changed = true;
                }
                if let Some(angles) = line.angles.filter(|a| *a != title.angles) {
                    title.angles = angles;
                    changed = true;
                }
                changed
            },
        );
        if let Some(angles) = line.angles {
            if md.requested_title.unwrap_or(1) == id {
                md.angle_count = angles;
            }
        }
        if changed {
            self.notify(out, PlayerEvent::TitlesChanged);
        }
    }

    fn on_title_switch(&mut self, md: &mut MediaData, native: u32, out: &mut Outcome) {
        let title = self.dialect.logical_title(native);

        if self.title_not_found {
            self.title_not_found = false;
            if md.titles.len() > 1 {
                tracing::info!(
                    reported = title,
                    "Requested title unavailable; asking for the next item"
                );
                out.events.push(PlayerEvent::PlayNextRequested);
                out.quit = Some(ExitReason::Clean);
            } else {
                self.fatal = Some(ExitReason::TitleNotFound);
                out.quit = Some(ExitReason::TitleNotFound);
            }
            return;
        }

        if !self.title_confirmed {
            self.title_confirmed = true;
            let target = match md.requested_title {
                Some(requested) if requested != title => {
                    tracing::debug!(requested, reported = title, "Keeping the requested title");
                    requested
                }
                Some(requested) => requested,
                None => title,
            };
            self.select_title(md, target, out);
            return;
        }

        if md.titles.selected() == Some(title) {
            return;
        }

        if md.media_type.is_cd() {
            let start = md.title_start(title).unwrap_or_else(|| md.gui_position());
            tracing::debug!(title, start = %start, "Delaying title switch until its start");
            self.pending_switch = Some(PendingSwitch { title, start });
            let gui = md.gui_position();
            self.commit_pending_switch(md, gui, out);
            return;
        }

        if md.media_type == MediaType::Dvd && !md.locator.has_menus() {
            if let Some(current) = md.titles.selected_item() {
                let remaining = current.duration - md.gui_position() - self.settings.title_end_margin;
                let delay = Duration::from_millis(remaining.as_millis().max(0) as u64);
                tracing::info!(
                    next = title,
                    "Title change detected; quitting {}ms before the current title ends",
                    delay.as_millis()
                );
                out.schedule_quit = Some(delay);
                return;
            }
        }

        self.select_title(md, title, out);
    }

    fn commit_pending_switch(&mut self, md: &mut MediaData, gui: Time, out: &mut Outcome) {
        let Some(switch) = self.pending_switch else {
            return;
        };
        if gui + self.settings.title_switch_lead_in >= switch.start {
            self.pending_switch = None;
            self.select_title(md, switch.title, out);
        }
    }

    fn select_title(&mut self, md: &mut MediaData, title: u32, out: &mut Outcome) {
        // Titles may be announced before their details arrive.
        md.titles.upsert(
            title,
            || Title {
                id: title,
                ..Title::default()
            },
            |_| false,
        );
        if md.titles.select(Some(title)) {
            self.notify(out, PlayerEvent::TitleChanged { title });
        }
    }
}

fn apply_duration(md: &mut MediaData, duration: Time, out: &mut Outcome) {
    match md.set_duration(duration) {
        DurationUpdate::Unchanged => {}
        DurationUpdate::Changed | DurationUpdate::Clamped => {
            out.events.push(PlayerEvent::DurationChanged {
                duration: md.duration(),
            });
        }
    }
}

fn set_output_size(md: &mut MediaData, width: Option<u32>, height: Option<u32>, out: &mut Outcome) {
    let before = (md.video.out_width, md.video.out_height);
    if let Some(w) = width {
        md.video.out_width = w;
    }
    if let Some(h) = height {
        md.video.out_height = h;
    }
    let after = (md.video.out_width, md.video.out_height);
    if after != before && after.0 > 0 && after.1 > 0 {
        out.events.push(PlayerEvent::VideoOutputChanged {
            width: after.0,
            height: after.1,
        });
    }
}

fn merge_chapter(md: &mut MediaData, line: ChapterLine) -> bool {
    md.chapters.upsert(
        line.id,
        || Chapter {
            id: line.id,
            ..Chapter::default()
        },
        |chapter| {
            let mut changed = false;
            if let Some(start) = line.start.filter(|s| *s != chapter.start) {
                chapter.start = start;
                changed = true;
            }
            if let Some(name) = line.name.as_ref().filter(|n| chapter.name.as_ref() != Some(*n)) {
                chapter.name = Some(name.clone());
                changed = true;
            }
            changed
        },
    )
}

fn selected_id(md: &MediaData, kind: TrackKind) -> Option<u32> {
    match kind {
        TrackKind::Video => md.videos.selected(),
        TrackKind::Audio => md.audios.selected(),
        TrackKind::Subtitle => md.subtitles.selected().map(|k| k.id),
        TrackKind::SecondarySubtitle => md.subtitles.secondary().map(|k| k.id),
    }
}

/// Integer telemetry; some backends print decimals for integral values.
fn parse_num(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| (0.0..=u32::MAX as f64).contains(v))
            .map(|v| v.round() as u32)
    })
}
