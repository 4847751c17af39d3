//! Media locators: plain paths, network URLs, and disc descriptors.
//!
//! Disc descriptors use the familiar `scheme://[title][/device]` form, for
//! example `dvd://3/dev/sr0` or `cdda://`. Titles in a descriptor are always
//! 1-based; backends that count from zero translate when building their
//! launch arguments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Detected media type of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    File,
    Dvd,
    Vcd,
    Cdda,
    BluRay,
    Stream,
    ImageSequence,
}

impl MediaType {
    /// Optical disc media addressed by title.
    pub fn is_disc(self) -> bool {
        matches!(self, Self::Dvd | Self::Vcd | Self::Cdda | Self::BluRay)
    }

    /// Discs whose titles are reported as chapters by some backends.
    pub fn is_cd(self) -> bool {
        matches!(self, Self::Vcd | Self::Cdda)
    }

    /// Scheme used when rendering a disc descriptor.
    fn scheme(self) -> Option<&'static str> {
        match self {
            Self::Dvd => Some("dvd"),
            Self::Vcd => Some("vcd"),
            Self::Cdda => Some("cdda"),
            Self::BluRay => Some("bd"),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Dvd => write!(f, "dvd"),
            Self::Vcd => write!(f, "vcd"),
            Self::Cdda => write!(f, "cdda"),
            Self::BluRay => write!(f, "bluray"),
            Self::Stream => write!(f, "stream"),
            Self::ImageSequence => write!(f, "image_sequence"),
        }
    }
}

const STREAM_SCHEMES: &[&str] = &[
    "http", "https", "rtsp", "rtmp", "rtp", "udp", "mms", "mmsh", "ftp", "smb",
];

/// A parsed media locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    raw: String,
    media_type: MediaType,
    /// Requested 1-based title for disc descriptors.
    title: Option<u32>,
    /// Device or image path for disc descriptors.
    device: Option<String>,
    /// `dvdnav://` asks for menu support.
    menus: bool,
}

impl Locator {
    /// Parse a locator string. Never fails: anything unrecognised is a file.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut locator = Self {
            raw: raw.clone(),
            media_type: MediaType::File,
            title: None,
            device: None,
            menus: false,
        };

        let Some((scheme, rest)) = raw.split_once("://") else {
            return locator;
        };
        let scheme = scheme.to_ascii_lowercase();

        let disc = match scheme.as_str() {
            "dvd" => Some(MediaType::Dvd),
            "dvdnav" => {
                locator.menus = true;
                Some(MediaType::Dvd)
            }
            "vcd" => Some(MediaType::Vcd),
            "cdda" => Some(MediaType::Cdda),
            "bd" | "br" | "bluray" => Some(MediaType::BluRay),
            _ => None,
        };

        if let Some(media_type) = disc {
            locator.media_type = media_type;
            let (title, device) = match rest.find('/') {
                Some(idx) => (&rest[..idx], Some(&rest[idx..])),
                None => (rest, None),
            };
            locator.title = title.parse::<u32>().ok();
            locator.device = device.filter(|d| d.len() > 1).map(str::to_string);
        } else if scheme == "mf" {
            locator.media_type = MediaType::ImageSequence;
        } else if STREAM_SCHEMES.contains(&scheme.as_str()) {
            locator.media_type = MediaType::Stream;
        }

        locator
    }

    /// Build a disc descriptor from its parts.
    pub fn disc(media_type: MediaType, title: Option<u32>, device: Option<&str>) -> Self {
        let scheme = media_type.scheme().unwrap_or("dvd");
        let mut raw = format!("{scheme}://");
        if let Some(t) = title {
            raw.push_str(&t.to_string());
        }
        if let Some(d) = device {
            if !d.starts_with('/') {
                raw.push('/');
            }
            raw.push_str(d);
        }
        Self::parse(raw)
    }

    /// The locator exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Requested 1-based title, for disc descriptors.
    pub fn title(&self) -> Option<u32> {
        self.title
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn has_menus(&self) -> bool {
        self.menus
    }

    /// Same disc, different title.
    pub fn with_title(&self, title: u32) -> Self {
        let mut next = Self::disc(self.media_type, Some(title), self.device());
        next.menus = self.menus;
        next
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
