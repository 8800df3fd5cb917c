// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Director view.
//!
//! The command surface the operator drives: managing the song list,
//! choosing what is live, editing and moving songs in and out of files.
//! Every change goes through the controller, which persists it and
//! broadcasts the full session to the live displays.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::session::{Session, SessionController};
use crate::song::{part_label, AnimationSettings, GradientTheme, Song, Tempo};
use crate::transfer::{self, ImportError, IntakeReport};

/// Lines of lyrics shown per part in the part list
const PREVIEW_LINES: usize = 4;

/// One row of the part list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSummary {
    pub index: usize,
    pub label: String,
    pub preview: String,
    pub live: bool,
}

/// Operator context
pub struct DirectorView {
    controller: SessionController,
}

impl DirectorView {
    /// Create a director over its own controller
    pub fn new(controller: SessionController) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn session(&self) -> &Session {
        self.controller.session()
    }

    /// Song currently live
    pub fn current_song(&self) -> Option<&Song> {
        self.session().current_song()
    }

    /// Parts of the live song, with the live one flagged
    pub fn part_list(&self) -> Vec<PartSummary> {
        let session = self.session();
        let Some(song) = session.current_song() else {
            return Vec::new();
        };
        song.parts
            .iter()
            .enumerate()
            .map(|(index, part)| PartSummary {
                index,
                label: part_label(part),
                preview: part
                    .lyrics
                    .lines()
                    .take(PREVIEW_LINES)
                    .collect::<Vec<_>>()
                    .join("\n"),
                live: index == session.current_part_index,
            })
            .collect()
    }

    pub fn select_song(&mut self, song_id: &str) {
        self.controller.select_song(song_id);
    }

    /// Put a specific part live
    pub fn show_part(&mut self, index: usize) {
        self.controller.set_part_index(index);
    }

    /// Advance to the next part, stopping at the last one
    pub fn next_part(&mut self) {
        let Some(count) = self.current_song().map(Song::part_count) else {
            return;
        };
        let current = self.session().current_part_index;
        if current + 1 < count {
            self.controller.set_part_index(current + 1);
        }
    }

    /// Go back one part, stopping at the first one
    pub fn previous_part(&mut self) {
        if self.current_song().is_none() {
            return;
        }
        let current = self.session().current_part_index;
        if current > 0 {
            self.controller.set_part_index(current - 1);
        }
    }

    /// Save editor contents; `song_id` is set when editing an existing song
    pub fn save_song(&mut self, markdown: &str, song_id: Option<&str>) -> String {
        self.controller.save_song(markdown, song_id)
    }

    pub fn delete_song(&mut self, song_id: &str) {
        self.controller.delete_song(song_id);
    }

    pub fn set_tempo(&mut self, song_id: &str, tempo: Tempo) {
        self.controller.set_tempo(song_id, tempo);
    }

    pub fn set_gradient(&mut self, song_id: &str, gradient: GradientTheme) {
        self.controller.set_gradient(song_id, gradient);
    }

    pub fn set_animation_settings(&mut self, song_id: &str, settings: AnimationSettings) {
        self.controller
            .set_animation_settings(song_id, Some(settings.clamped()));
    }

    /// Take in dropped files and append every song they yield
    pub fn files_selected<P: AsRef<Path>>(&mut self, paths: &[P]) -> IntakeReport {
        let controller = &mut self.controller;
        let report = transfer::intake_files(paths, |markdown| controller.parse_new(markdown));
        tracing::info!(
            added = report.songs.len(),
            failed = report.errors.len(),
            "Processed selected files"
        );
        self.controller.add_songs(report.songs.clone());
        report
    }

    /// Replace the whole collection with an export bundle's songs
    pub fn import_collection<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, ImportError> {
        let songs = transfer::import_bundle_file(path)?;
        let count = songs.len();
        self.controller.replace_songs(songs);
        tracing::info!(count, "Imported song collection");
        Ok(count)
    }

    /// Write the collection as an export bundle into `dir`
    pub fn export_collection<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        transfer::export_bundle(&self.session().songs).write_to(dir)
    }

    /// Write one song's markdown into `dir`
    pub fn export_song<P: AsRef<Path>>(&self, song_id: &str, dir: P) -> Result<PathBuf> {
        let song = self
            .session()
            .song(song_id)
            .ok_or_else(|| anyhow!("No song with id {}", song_id))?;
        transfer::export_markdown(song, dir)
    }

    /// Clear everything; the caller has already confirmed
    pub fn new_session(&mut self) {
        self.controller.reset_session();
    }
}
