// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Markdown song parser.
//!
//! Songs are written as loosely structured markdown:
//!
//! ```text
//! # Song Title
//!
//! ## Verse 1
//! First line
//! Second line
//!
//! ## Chorus
//! Refrain
//! ```
//!
//! The first `# ` line supplies the title. Each recognized `## ` heading
//! (`Verse <n>`, `Chorus`, `Pre-Chorus`, `Bridge`, case-insensitive) opens a
//! new part. Parsing never fails; unusable input yields an untitled song
//! with no parts.

use serde::{Deserialize, Serialize};

use super::{GradientTheme, PartType, Song, SongPart, Tempo, UNTITLED};

/// What to do with a `## ` heading that names no known part type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeadingPolicy {
    /// Close the open part and discard lines until the next recognized heading
    #[default]
    Drop,
    /// Keep the heading line as lyrics of the open part
    KeepAsText,
}

/// Part being accumulated
struct OpenPart {
    part_type: PartType,
    number: Option<u64>,
    lines: Vec<String>,
}

impl OpenPart {
    fn new((part_type, number): (PartType, Option<u64>)) -> Self {
        Self {
            part_type,
            number,
            lines: Vec::new(),
        }
    }

    /// Finish the part, or `None` when its body is blank
    fn finish(self) -> Option<SongPart> {
        let lyrics = self.lines.join("\n").trim().to_string();
        if lyrics.is_empty() {
            return None;
        }
        Some(SongPart {
            part_type: self.part_type,
            number: self.number,
            lyrics,
        })
    }
}

/// Parse markdown into a song using the default heading policy
pub fn parse(markdown: &str, id: impl Into<String>) -> Song {
    parse_with(markdown, id, HeadingPolicy::default())
}

/// Parse markdown into a song
pub fn parse_with(markdown: &str, id: impl Into<String>, policy: HeadingPolicy) -> Song {
    let mut title: Option<String> = None;
    let mut parts = Vec::new();
    let mut current: Option<OpenPart> = None;

    for raw in markdown.lines() {
        let line = raw.trim();

        if title.is_none() {
            if let Some(text) = line.strip_prefix("# ") {
                title = Some(text.trim().to_string());
                continue;
            }
        }

        if let Some(heading) = line.strip_prefix("## ") {
            match parse_part_title(heading.trim()) {
                Some(kind) => {
                    parts.extend(current.take().and_then(OpenPart::finish));
                    current = Some(OpenPart::new(kind));
                }
                None => match policy {
                    HeadingPolicy::Drop => {
                        parts.extend(current.take().and_then(OpenPart::finish));
                    }
                    HeadingPolicy::KeepAsText => {
                        if let Some(open) = current.as_mut() {
                            open.lines.push(line.to_string());
                        }
                    }
                },
            }
            continue;
        }

        if let Some(open) = current.as_mut() {
            open.lines.push(line.to_string());
        }
    }

    parts.extend(current.and_then(OpenPart::finish));

    Song {
        id: id.into(),
        title: title.unwrap_or_else(|| UNTITLED.to_string()),
        tempo: Tempo::Slow,
        gradient: Some(GradientTheme::Blue),
        animation_settings: None,
        parts,
        raw_markdown: markdown.to_string(),
    }
}

/// Classify a `## ` heading's text
///
/// Returns the part type and, for verses, the verse number.
pub fn parse_part_title(title: &str) -> Option<(PartType, Option<u64>)> {
    let lower = title.to_lowercase();

    if let Some(rest) = lower.strip_prefix("verse") {
        // At least one whitespace character between "Verse" and the number
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let digits = rest.trim_start();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if digits.trim_start_matches('0').is_empty() {
            return None;
        }
        // Any digit run is a verse number; absurdly long ones saturate
        let number = digits.parse::<u64>().unwrap_or(u64::MAX);
        return Some((PartType::Verse, Some(number)));
    }

    match lower.as_str() {
        "chorus" => Some((PartType::Chorus, None)),
        "pre-chorus" => Some((PartType::PreChorus, None)),
        "bridge" => Some((PartType::Bridge, None)),
        _ => None,
    }
}

/// Display label for a part
pub fn part_label(part: &SongPart) -> String {
    match (part.part_type, part.number) {
        (PartType::Verse, Some(number)) => format!("Verse {}", number),
        (part_type, _) => part_type.name().to_string(),
    }
}
