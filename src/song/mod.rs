// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song data model.
//!
//! This module provides:
//! - Songs: titled, ordered collections of lyric parts with their markdown source
//! - Parts: typed sections (Verse, Chorus, Pre-Chorus, Bridge)
//! - Presentation hints: tempo, gradient theme and animation settings

pub mod parser;

pub use parser::{parse, parse_part_title, parse_with, part_label, HeadingPolicy};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Title used when the source has no `# ` heading
pub const UNTITLED: &str = "Untitled Song";

/// Kind of song part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartType {
    Verse,
    Chorus,
    #[serde(rename = "Pre-Chorus")]
    PreChorus,
    Bridge,
}

impl PartType {
    /// Display name, matching the heading text
    pub fn name(&self) -> &'static str {
        match self {
            PartType::Verse => "Verse",
            PartType::Chorus => "Chorus",
            PartType::PreChorus => "Pre-Chorus",
            PartType::Bridge => "Bridge",
        }
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A titled section of a song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongPart {
    #[serde(rename = "type")]
    pub part_type: PartType,
    /// Verse number; only ever set for verses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    pub lyrics: String,
}

impl SongPart {
    /// Create a verse part
    pub fn verse(number: u64, lyrics: impl Into<String>) -> Self {
        Self {
            part_type: PartType::Verse,
            number: Some(number),
            lyrics: lyrics.into(),
        }
    }

    /// Create an unnumbered part
    pub fn new(part_type: PartType, lyrics: impl Into<String>) -> Self {
        Self {
            part_type,
            number: None,
            lyrics: lyrics.into(),
        }
    }

    /// Display label ("Verse 2", "Chorus", ...)
    pub fn label(&self) -> String {
        part_label(self)
    }
}

/// Visual pacing hint for the live background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tempo {
    #[default]
    Slow,
    Fast,
}

/// Named color palette for the live background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientTheme {
    #[default]
    Blue,
    Purple,
    Green,
    Orange,
    Pink,
    Cyan,
}

impl GradientTheme {
    /// All themes in picker order
    pub const ALL: [GradientTheme; 6] = [
        GradientTheme::Blue,
        GradientTheme::Purple,
        GradientTheme::Green,
        GradientTheme::Orange,
        GradientTheme::Pink,
        GradientTheme::Cyan,
    ];

    /// Lowercase theme name
    pub fn name(&self) -> &'static str {
        match self {
            GradientTheme::Blue => "blue",
            GradientTheme::Purple => "purple",
            GradientTheme::Green => "green",
            GradientTheme::Orange => "orange",
            GradientTheme::Pink => "pink",
            GradientTheme::Cyan => "cyan",
        }
    }

    /// Swatch color shown in the theme picker
    pub fn swatch(&self) -> &'static str {
        match self {
            GradientTheme::Blue => "#1e3a8a",
            GradientTheme::Purple => "#581c87",
            GradientTheme::Green => "#14532d",
            GradientTheme::Orange => "#7c2d12",
            GradientTheme::Pink => "#831843",
            GradientTheme::Cyan => "#164e63",
        }
    }
}

/// Background effect kind. Only particles exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    #[default]
    Particles,
}

/// Per-song override bundle for the animated background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSettings {
    #[serde(default)]
    pub effect: Effect,
    #[serde(default = "default_particle_count")]
    pub particle_count: u32,
    #[serde(default = "default_particle_size")]
    pub particle_size: f64,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default = "default_particle_color")]
    pub particle_color: String,
    #[serde(default = "default_particle_blur")]
    pub particle_blur: f64,
    #[serde(default)]
    pub background_color: GradientTheme,
}

fn default_particle_count() -> u32 {
    60
}
fn default_particle_size() -> f64 {
    3.0
}
fn default_speed() -> u32 {
    5
}
fn default_particle_color() -> String {
    "#ffffff".to_string()
}
fn default_particle_blur() -> f64 {
    2.0
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            effect: Effect::Particles,
            particle_count: default_particle_count(),
            particle_size: default_particle_size(),
            speed: default_speed(),
            particle_color: default_particle_color(),
            particle_blur: default_particle_blur(),
            background_color: GradientTheme::default(),
        }
    }
}

impl AnimationSettings {
    /// Copy with every numeric field pulled into the editor's slider ranges
    pub fn clamped(&self) -> Self {
        Self {
            particle_count: self.particle_count.clamp(10, 150),
            particle_size: self.particle_size.clamp(1.0, 10.0),
            speed: self.speed.clamp(1, 10),
            particle_blur: self.particle_blur.clamp(0.0, 20.0),
            ..self.clone()
        }
    }
}

/// A parsed song
///
/// `title`, `parts` and `raw_markdown` are only ever produced together by the
/// parser; edits replace the markdown and re-parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tempo: Tempo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientTheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_settings: Option<AnimationSettings>,
    #[serde(default)]
    pub parts: Vec<SongPart>,
    #[serde(default)]
    pub raw_markdown: String,
}

impl Song {
    /// Gradient theme, falling back to blue
    pub fn gradient(&self) -> GradientTheme {
        self.gradient.unwrap_or_default()
    }

    /// Animation settings, falling back to the defaults
    pub fn animation_settings(&self) -> AnimationSettings {
        self.animation_settings.clone().unwrap_or_default()
    }

    /// Get a part by index
    pub fn part(&self, index: usize) -> Option<&SongPart> {
        self.parts.get(index)
    }

    /// Number of parts
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_type_serialization() {
        let part = SongPart::new(PartType::PreChorus, "Oh");
        let json = serde_json::to_string(&part).unwrap();
        assert_eq!(json, r#"{"type":"Pre-Chorus","lyrics":"Oh"}"#);

        let verse = SongPart::verse(2, "La");
        let json = serde_json::to_string(&verse).unwrap();
        assert_eq!(json, r#"{"type":"Verse","number":2,"lyrics":"La"}"#);
    }

    #[test]
    fn test_song_wire_names() {
        let song = parse("# Wire\n## Chorus\nHey", "abc");
        let value = serde_json::to_value(&song).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["tempo"], "slow");
        assert_eq!(value["gradient"], "blue");
        assert_eq!(value["rawMarkdown"], "# Wire\n## Chorus\nHey");
        assert!(value.get("animationSettings").is_none());
    }

    #[test]
    fn test_song_missing_optional_fields() {
        let json = r#"{"id":"1","title":"T","parts":[],"rawMarkdown":""}"#;
        let song: Song = serde_json::from_str(json).unwrap();
        assert_eq!(song.tempo, Tempo::Slow);
        assert_eq!(song.gradient, None);
        assert_eq!(song.gradient(), GradientTheme::Blue);
        assert_eq!(song.animation_settings(), AnimationSettings::default());
    }

    #[test]
    fn test_animation_settings_partial() {
        let json = r#"{"effect":"particles","particleCount":120,"backgroundColor":"pink"}"#;
        let settings: AnimationSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.particle_count, 120);
        assert_eq!(settings.speed, 5);
        assert_eq!(settings.particle_color, "#ffffff");
        assert_eq!(settings.background_color, GradientTheme::Pink);
    }

    #[test]
    fn test_animation_settings_clamped() {
        let settings = AnimationSettings {
            particle_count: 500,
            particle_size: 0.2,
            speed: 0,
            particle_blur: 40.0,
            ..AnimationSettings::default()
        };
        let clamped = settings.clamped();
        assert_eq!(clamped.particle_count, 150);
        assert_eq!(clamped.particle_size, 1.0);
        assert_eq!(clamped.speed, 1);
        assert_eq!(clamped.particle_blur, 20.0);
    }

    #[test]
    fn test_gradient_names() {
        let names: Vec<&str> = GradientTheme::ALL.iter().map(|g| g.name()).collect();
        assert_eq!(names, ["blue", "purple", "green", "orange", "pink", "cyan"]);
        assert_eq!(GradientTheme::Cyan.swatch(), "#164e63");
    }
}
