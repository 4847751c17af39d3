//! Subtitle styling shared by both backends.
//!
//! MPlayer takes the style as an ASS override string at launch; MPV takes
//! individual `--sub-*` options and can also change them at runtime.

use serde::{Deserialize, Serialize};

/// An RGBA colour; `a == 255` is fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// ASS `&HAABBGGRR`, where alpha 00 is opaque.
    pub fn to_ass(self) -> String {
        format!(
            "&H{:02X}{:02X}{:02X}{:02X}",
            255 - self.a,
            self.b,
            self.g,
            self.r
        )
    }

    /// MPV `#AARRGGBB`.
    pub fn to_mpv(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderStyle {
    #[default]
    Outline,
    OpaqueBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    Center,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    pub font: String,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
    pub outline_color: Color,
    pub back_color: Color,
    pub border_style: BorderStyle,
    pub outline: f64,
    pub shadow: f64,
    pub halign: HAlign,
    pub valign: VAlign,
    pub margin_v: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font: "Arial".into(),
            size: 20.0,
            bold: false,
            italic: false,
            color: Color::WHITE,
            outline_color: Color::BLACK,
            back_color: Color::BLACK,
            border_style: BorderStyle::Outline,
            outline: 1.0,
            shadow: 0.0,
            halign: HAlign::Center,
            valign: VAlign::Bottom,
            margin_v: 22,
        }
    }
}

impl SubtitleStyle {
    /// Numpad-style ASS alignment (1-3 bottom, 4-6 middle, 7-9 top).
    pub fn ass_alignment(&self) -> u8 {
        let column = match self.halign {
            HAlign::Left => 1,
            HAlign::Center => 2,
            HAlign::Right => 3,
        };
        let row = match self.valign {
            VAlign::Bottom => 0,
            VAlign::Center => 3,
            VAlign::Top => 6,
        };
        row + column
    }

    /// Value for MPlayer's `-ass-force-style`.
    pub fn to_ass_force_style(&self) -> String {
        let border = match self.border_style {
            BorderStyle::Outline => 1,
            BorderStyle::OpaqueBox => 3,
        };
        [
            format!("FontName={}", self.font),
            format!("FontSize={}", fmt_num(self.size)),
            format!("Bold={}", self.bold as u8),
            format!("Italic={}", self.italic as u8),
            format!("PrimaryColour={}", self.color.to_ass()),
            format!("OutlineColour={}", self.outline_color.to_ass()),
            format!("BackColour={}", self.back_color.to_ass()),
            format!("BorderStyle={border}"),
            format!("Outline={}", fmt_num(self.outline)),
            format!("Shadow={}", fmt_num(self.shadow)),
            format!("MarginV={}", self.margin_v),
            format!("Alignment={}", self.ass_alignment()),
        ]
        .join(",")
    }

    /// `(option, value)` pairs understood by MPV both as `--option=value`
    /// and as `set option value`.
    pub fn mpv_options(&self) -> Vec<(&'static str, String)> {
        let mut options = vec![
            ("sub-font", self.font.clone()),
            ("sub-font-size", fmt_num(self.size)),
            ("sub-bold", yes_no(self.bold).into()),
            ("sub-italic", yes_no(self.italic).into()),
            ("sub-color", self.color.to_mpv()),
            ("sub-border-color", self.outline_color.to_mpv()),
            ("sub-back-color", self.back_color.to_mpv()),
            ("sub-border-size", fmt_num(self.outline)),
            ("sub-shadow-offset", fmt_num(self.shadow)),
            ("sub-align-x", h_name(self.halign).into()),
            ("sub-align-y", v_name(self.valign).into()),
            ("sub-margin-y", self.margin_v.to_string()),
        ];
        if self.border_style == BorderStyle::OpaqueBox {
            options.push(("sub-border-style", "opaque-box".into()));
        }
        options
    }
}

fn h_name(h: HAlign) -> &'static str {
    match h {
        HAlign::Left => "left",
        HAlign::Center => "center",
        HAlign::Right => "right",
    }
}

fn v_name(v: VAlign) -> &'static str {
    match v {
        VAlign::Top => "top",
        VAlign::Center => "center",
        VAlign::Bottom => "bottom",
    }
}

pub(crate) fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

/// Format a float without a trailing `.0` for whole numbers.
pub(crate) fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
