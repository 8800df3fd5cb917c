// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File intake.
//!
//! A batch of files becomes songs: `.json` files are export bundles that
//! may hold many songs, `.md`/`.markdown` files are one song each, and
//! anything else is skipped. A bad file is reported and the rest of the
//! batch still goes through.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{import_bundle, ImportError};
use crate::song::Song;

/// How a file is interpreted, by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Export bundle
    Bundle,
    /// Single song source
    Markdown,
}

impl FileKind {
    /// Classify a file name; `None` for unsupported files
    pub fn from_name(name: &str) -> Option<Self> {
        if name.ends_with(".json") {
            Some(FileKind::Bundle)
        } else if name.ends_with(".md") || name.ends_with(".markdown") {
            Some(FileKind::Markdown)
        } else {
            None
        }
    }
}

/// A file that could not be taken in
#[derive(Error, Debug)]
#[error("Failed to import {file}: {error}")]
pub struct IntakeError {
    pub file: String,
    #[source]
    pub error: ImportError,
}

/// Outcome of one intake batch
#[derive(Debug, Default)]
pub struct IntakeReport {
    /// Songs in file order
    pub songs: Vec<Song>,
    /// Per-file failures
    pub errors: Vec<IntakeError>,
    /// Files ignored because of their extension
    pub skipped: Vec<String>,
}

impl IntakeReport {
    /// Whether every supported file was taken in
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Take in in-memory `(file name, contents)` pairs
///
/// `parse_markdown` turns one markdown source into a song with a fresh id.
pub fn intake_sources<'a, I, F>(sources: I, mut parse_markdown: F) -> IntakeReport
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
    F: FnMut(&str) -> Song,
{
    let mut report = IntakeReport::default();

    for (name, contents) in sources {
        match FileKind::from_name(name) {
            Some(FileKind::Bundle) => match import_bundle(contents) {
                Ok(songs) => {
                    tracing::info!(file = name, count = songs.len(), "Imported song bundle");
                    report.songs.extend(songs);
                }
                Err(error) => {
                    tracing::warn!(file = name, "Failed to import bundle: {}", error);
                    report.errors.push(IntakeError {
                        file: name.to_string(),
                        error,
                    });
                }
            },
            Some(FileKind::Markdown) => {
                let song = parse_markdown(contents);
                tracing::info!(file = name, song_id = %song.id, "Imported markdown song");
                report.songs.push(song);
            }
            None => {
                tracing::debug!(file = name, "Skipping unsupported file");
                report.skipped.push(name.to_string());
            }
        }
    }

    report
}

/// Take in files from disk
pub fn intake_files<P, F>(paths: &[P], parse_markdown: F) -> IntakeReport
where
    P: AsRef<Path>,
    F: FnMut(&str) -> Song,
{
    let mut report = IntakeReport::default();
    let mut loaded: Vec<(String, String)> = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let name = display_name(path);
        if FileKind::from_name(&name).is_none() {
            report.skipped.push(name);
            continue;
        }
        match fs::read_to_string(path) {
            Ok(contents) => loaded.push((name, contents)),
            Err(source) => {
                tracing::warn!(file = %name, "Failed to read file: {}", source);
                report.errors.push(IntakeError {
                    file: name,
                    error: ImportError::Read {
                        path: PathBuf::from(path),
                        source,
                    },
                });
            }
        }
    }

    let parsed = intake_sources(
        loaded.iter().map(|(name, contents)| (name.as_str(), contents.as_str())),
        parse_markdown,
    );
    report.songs = parsed.songs;
    report.errors.extend(parsed.errors);
    report
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
