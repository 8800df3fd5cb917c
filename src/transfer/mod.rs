// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song collection import and export.
//!
//! This module provides:
//! - Export bundles: versioned JSON snapshots of a song collection
//! - Markdown export: a single song's source with a filename derived from its title
//! - Intake: turning a batch of dropped files into songs

pub mod intake;

pub use intake::{intake_files, intake_sources, FileKind, IntakeError, IntakeReport};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::song::Song;

/// Bundle format version written by this crate
pub const BUNDLE_VERSION: &str = "1.0";

/// Import failure
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid JSON file")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Failed to read file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Exported song collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    /// ISO-8601 timestamp
    pub export_date: String,
    pub songs: Vec<Song>,
}

/// Build a bundle stamped with the current time
pub fn export_bundle(songs: &[Song]) -> ExportBundle {
    export_bundle_at(songs, OffsetDateTime::now_utc())
}

/// Build a bundle stamped with `date`
pub fn export_bundle_at(songs: &[Song], date: OffsetDateTime) -> ExportBundle {
    ExportBundle {
        version: BUNDLE_VERSION.to_string(),
        export_date: date
            .format(&Rfc3339)
            .unwrap_or_else(|_| date.unix_timestamp().to_string()),
        songs: songs.to_vec(),
    }
}

impl ExportBundle {
    /// Pretty JSON, two-space indented
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize export bundle")
    }

    /// Suggested download name, e.g. `song-collection-2026-10-18.json`
    pub fn file_name(&self) -> String {
        let day = self.export_date.split('T').next().unwrap_or_default();
        format!("song-collection-{}.json", day)
    }

    /// Write the bundle into `dir`, returning the file path
    pub fn write_to<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name());
        fs::write(&path, self.to_json()?)
            .with_context(|| format!("Failed to write export file: {:?}", path))?;
        tracing::info!(songs = self.songs.len(), ?path, "Exported song collection");
        Ok(path)
    }
}

/// Read the songs out of an export bundle
pub fn import_bundle(json: &str) -> Result<Vec<Song>, ImportError> {
    let bundle: ExportBundle = serde_json::from_str(json).map_err(ImportError::InvalidJson)?;
    Ok(bundle.songs)
}

/// Read an export bundle file
pub fn import_bundle_file<P: AsRef<Path>>(path: P) -> Result<Vec<Song>, ImportError> {
    let json = fs::read_to_string(path.as_ref()).map_err(|source| ImportError::Read {
        path: path.as_ref().to_path_buf(),
        source,
    })?;
    import_bundle(&json)
}

/// Filename stem for a song title
///
/// Lowercased, with every run of non-alphanumeric characters collapsed to
/// a single underscore.
pub fn filename_stem(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    let mut in_run = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
            in_run = false;
        } else if !in_run {
            stem.push('_');
            in_run = true;
        }
    }
    stem
}

/// Download name for a single song's markdown
pub fn markdown_filename(song: &Song) -> String {
    format!("{}.md", filename_stem(&song.title))
}

/// Write a song's markdown source into `dir`, returning the file path
pub fn export_markdown<P: AsRef<Path>>(song: &Song, dir: P) -> Result<PathBuf> {
    let path = dir.as_ref().join(markdown_filename(song));
    fs::write(&path, &song.raw_markdown)
        .with_context(|| format!("Failed to write markdown file: {:?}", path))?;
    tracing::info!(song_id = %song.id, ?path, "Exported song markdown");
    Ok(path)
}
