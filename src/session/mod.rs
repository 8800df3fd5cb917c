// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Presentation session.
//!
//! This module provides:
//! - Session: the song collection plus which song and part are live
//! - Store: durable persistence of the session as JSON
//! - Controller: the single owner that applies edits, persists and broadcasts

pub mod controller;
pub mod store;

pub use controller::SessionController;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoreError};

use serde::{Deserialize, Serialize};

use crate::song::{Song, SongPart};

/// Song collection and live position
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub songs: Vec<Song>,
    #[serde(default)]
    pub current_song_id: Option<String>,
    #[serde(default)]
    pub current_part_index: usize,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a song by id
    pub fn song(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    /// Position of a song in the collection
    pub fn position(&self, id: &str) -> Option<usize> {
        self.songs.iter().position(|s| s.id == id)
    }

    /// Whether a song with this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// The selected song, if it still exists
    pub fn current_song(&self) -> Option<&Song> {
        self.current_song_id.as_deref().and_then(|id| self.song(id))
    }

    /// The part currently shown live
    pub fn current_part(&self) -> Option<&SongPart> {
        self.current_song()
            .and_then(|song| song.part(self.current_part_index))
    }

    /// Check the session invariants
    ///
    /// Song ids are unique, the selected song exists, and the part index is
    /// in range whenever the selected song has parts.
    pub fn is_consistent(&self) -> bool {
        let unique = self
            .songs
            .iter()
            .enumerate()
            .all(|(i, song)| self.songs[..i].iter().all(|s| s.id != song.id));
        if !unique {
            return false;
        }

        match self.current_song_id.as_deref() {
            None => true,
            Some(id) => match self.song(id) {
                None => false,
                Some(song) => song.parts.is_empty() || self.current_part_index < song.parts.len(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::parse;

    fn session() -> Session {
        Session {
            songs: vec![
                parse("# One\n## Verse 1\na\n## Chorus\nb", "1"),
                parse("# Two\n## Bridge\nc", "2"),
            ],
            current_song_id: Some("1".to_string()),
            current_part_index: 1,
        }
    }

    #[test]
    fn test_empty_session() {
        let session = Session::new();
        assert!(session.songs.is_empty());
        assert!(session.current_song_id.is_none());
        assert_eq!(session.current_part_index, 0);
        assert!(session.is_consistent());
        assert!(session.current_part().is_none());
    }

    #[test]
    fn test_current_part() {
        let session = session();
        assert_eq!(session.current_song().unwrap().title, "One");
        assert_eq!(session.current_part().unwrap().lyrics, "b");
        assert!(session.is_consistent());
    }

    #[test]
    fn test_inconsistent_sessions() {
        let mut dangling = session();
        dangling.current_song_id = Some("missing".to_string());
        assert!(!dangling.is_consistent());

        let mut out_of_range = session();
        out_of_range.current_part_index = 2;
        assert!(!out_of_range.is_consistent());

        let mut duplicate = session();
        duplicate.songs.push(parse("# Dup", "1"));
        assert!(!duplicate.is_consistent());
    }

    #[test]
    fn test_json_format() {
        let json = serde_json::to_value(session()).unwrap();
        assert_eq!(json["currentSongId"], "1");
        assert_eq!(json["currentPartIndex"], 1);
        assert_eq!(json["songs"][1]["title"], "Two");

        let empty = serde_json::to_string(&Session::new()).unwrap();
        assert_eq!(empty, r#"{"songs":[],"currentSongId":null,"currentPartIndex":0}"#);
    }
}
