// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session controller.
//!
//! Each context owns one controller. Every edit builds a new [`Session`]
//! from the previous one, persists it, broadcasts the whole snapshot and
//! only then becomes the controller's state. Messages from other contexts
//! replace local state without being re-broadcast.

use std::collections::HashSet;

use crate::song::{
    parse_with, AnimationSettings, GradientTheme, HeadingPolicy, Song, Tempo,
};
use crate::sync::{SyncChannel, SyncMessage};

use super::store::SessionStore;
use super::Session;

/// Source of fresh song ids
pub type IdSource = Box<dyn FnMut() -> String + Send>;

fn uuid_source() -> IdSource {
    Box::new(|| uuid::Uuid::new_v4().to_string())
}

/// Owner of one context's session
pub struct SessionController {
    session: Session,
    store: Box<dyn SessionStore>,
    channel: Option<SyncChannel>,
    ids: IdSource,
    heading_policy: HeadingPolicy,
}

impl SessionController {
    /// Create a controller, restoring the persisted session if there is one
    ///
    /// An unreadable store is logged and treated as empty.
    pub fn new(store: Box<dyn SessionStore>, channel: Option<SyncChannel>) -> Self {
        let session = match store.load() {
            Ok(Some(session)) => {
                tracing::debug!(songs = session.songs.len(), "Restored persisted session");
                session
            }
            Ok(None) => Session::new(),
            Err(e) => {
                tracing::warn!("Failed to load session: {}", e);
                Session::new()
            }
        };

        Self {
            session,
            store,
            channel,
            ids: uuid_source(),
            heading_policy: HeadingPolicy::default(),
        }
    }

    /// Builder: use a custom id source
    pub fn with_id_source(mut self, ids: IdSource) -> Self {
        self.ids = ids;
        self
    }

    /// Builder: set how the parser treats unknown headings
    pub fn with_heading_policy(mut self, policy: HeadingPolicy) -> Self {
        self.heading_policy = policy;
        self
    }

    /// Current session snapshot
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Sync channel used for broadcasts, if any
    pub fn channel(&self) -> Option<&SyncChannel> {
        self.channel.as_ref()
    }

    /// Heading policy used when parsing
    pub fn heading_policy(&self) -> HeadingPolicy {
        self.heading_policy
    }

    /// Parse markdown with this controller's policy and a fresh id
    pub fn parse_new(&mut self, markdown: &str) -> Song {
        let id = (self.ids)();
        parse_with(markdown, id, self.heading_policy)
    }

    /// Append songs, keeping existing order and ids
    ///
    /// An incoming song whose id is already taken gets a fresh id, so
    /// importing the same bundle twice lists its songs twice.
    pub fn add_songs(&mut self, songs: Vec<Song>) -> &Session {
        if songs.is_empty() {
            return &self.session;
        }
        tracing::debug!(count = songs.len(), "Adding songs");
        let mut next = self.session.clone();
        let mut taken: HashSet<String> = next.songs.iter().map(|s| s.id.clone()).collect();
        for song in songs {
            next.songs.push(self.claim_id(song, &mut taken));
        }
        self.commit(next)
    }

    /// Replace the whole song collection
    ///
    /// The selection is dropped if the selected song is not in `songs`.
    /// Repeated ids within `songs` are re-issued like in [`add_songs`](Self::add_songs).
    pub fn replace_songs(&mut self, songs: Vec<Song>) -> &Session {
        tracing::debug!(count = songs.len(), "Replacing song collection");
        let mut next = self.session.clone();
        let mut taken = HashSet::new();
        next.songs = songs
            .into_iter()
            .map(|song| self.claim_id(song, &mut taken))
            .collect();
        if next.current_song().is_none() {
            next.current_song_id = None;
        } else {
            clamp_part_index(&mut next);
        }
        self.commit(next)
    }

    /// Put a song live, starting from its first part
    ///
    /// Unknown ids are ignored.
    pub fn select_song(&mut self, song_id: &str) -> &Session {
        if !self.session.contains(song_id) {
            tracing::debug!(song_id, "Ignoring selection of unknown song");
            return &self.session;
        }
        tracing::debug!(song_id, "Selecting song");
        let mut next = self.session.clone();
        next.current_song_id = Some(song_id.to_string());
        next.current_part_index = 0;
        self.commit(next)
    }

    /// Remove a song
    ///
    /// Deleting the live song clears the selection but keeps the part index.
    pub fn delete_song(&mut self, song_id: &str) -> &Session {
        let Some(position) = self.session.position(song_id) else {
            return &self.session;
        };
        tracing::debug!(song_id, "Deleting song");
        let mut next = self.session.clone();
        next.songs.remove(position);
        if next.current_song_id.as_deref() == Some(song_id) {
            next.current_song_id = None;
        }
        self.commit(next)
    }

    /// Save edited markdown
    ///
    /// With an id, the song is re-parsed in place: its id, position, tempo,
    /// gradient and animation settings are kept while title and parts are
    /// re-derived. Without one (or with an unknown id) a new song is
    /// appended. Returns the id of the saved song.
    pub fn save_song(&mut self, markdown: &str, song_id: Option<&str>) -> String {
        let mut next = self.session.clone();

        let id = match song_id.and_then(|id| next.position(id)) {
            Some(position) => {
                let existing = &next.songs[position];
                let mut song = parse_with(markdown, existing.id.clone(), self.heading_policy);
                song.tempo = existing.tempo;
                song.gradient = existing.gradient;
                song.animation_settings = existing.animation_settings.clone();
                let id = song.id.clone();
                next.songs[position] = song;
                clamp_part_index(&mut next);
                tracing::debug!(song_id = %id, "Re-parsed edited song");
                id
            }
            None => {
                if let Some(unknown) = song_id {
                    tracing::warn!(song_id = unknown, "Edited song no longer exists, saving as new");
                }
                let song = self.parse_new(markdown);
                let id = song.id.clone();
                next.songs.push(song);
                tracing::debug!(song_id = %id, "Created song");
                id
            }
        };

        self.commit(next);
        id
    }

    /// Move the live part
    ///
    /// Clamped into range while a song with parts is selected.
    pub fn set_part_index(&mut self, index: usize) -> &Session {
        let mut next = self.session.clone();
        next.current_part_index = index;
        clamp_part_index(&mut next);
        if next.current_part_index != index {
            tracing::debug!(index, clamped = next.current_part_index, "Clamped part index");
        }
        self.commit(next)
    }

    /// Replace a song's animation settings
    pub fn set_animation_settings(
        &mut self,
        song_id: &str,
        settings: Option<AnimationSettings>,
    ) -> &Session {
        self.update_song(song_id, |song| song.animation_settings = settings)
    }

    /// Replace a song's tempo
    pub fn set_tempo(&mut self, song_id: &str, tempo: Tempo) -> &Session {
        self.update_song(song_id, |song| song.tempo = tempo)
    }

    /// Replace a song's gradient theme
    pub fn set_gradient(&mut self, song_id: &str, gradient: GradientTheme) -> &Session {
        self.update_song(song_id, |song| song.gradient = Some(gradient))
    }

    /// Clear every song and the selection
    pub fn reset_session(&mut self) -> &Session {
        tracing::info!("Resetting session");
        self.commit(Session::new())
    }

    /// Apply a message received from another context
    ///
    /// The result is persisted locally but never re-broadcast.
    pub fn apply_remote(&mut self, message: SyncMessage) -> &Session {
        tracing::debug!(kind = message.kind(), "Applying remote message");
        let next = match message {
            SyncMessage::SessionUpdated { session } => *session,
            SyncMessage::SongChanged { song_id } => {
                if !self.session.contains(&song_id) {
                    tracing::debug!(song_id = %song_id, "Remote selected unknown song");
                    return &self.session;
                }
                Session {
                    current_song_id: Some(song_id),
                    current_part_index: 0,
                    ..self.session.clone()
                }
            }
            SyncMessage::PartChanged { part_index } => {
                let mut next = self.session.clone();
                next.current_part_index = part_index;
                clamp_part_index(&mut next);
                next
            }
        };
        self.persist(&next);
        self.session = next;
        &self.session
    }

    fn update_song<F>(&mut self, song_id: &str, edit: F) -> &Session
    where
        F: FnOnce(&mut Song),
    {
        let Some(position) = self.session.position(song_id) else {
            tracing::debug!(song_id, "Ignoring edit of unknown song");
            return &self.session;
        };
        let mut next = self.session.clone();
        edit(&mut next.songs[position]);
        self.commit(next)
    }

    /// Persist, broadcast and adopt a new session
    /// Keep the song's id if free, otherwise issue a new one
    fn claim_id(&mut self, mut song: Song, taken: &mut HashSet<String>) -> Song {
        while taken.contains(&song.id) {
            let id = (self.ids)();
            tracing::debug!(old = %song.id, new = %id, "Re-issuing duplicate song id");
            song.id = id;
        }
        taken.insert(song.id.clone());
        song
    }

    fn commit(&mut self, next: Session) -> &Session {
        self.persist(&next);
        if let Some(channel) = &self.channel {
            channel.send(SyncMessage::session_updated(&next));
        }
        self.session = next;
        &self.session
    }

    fn persist(&mut self, session: &Session) {
        if let Err(e) = self.store.save(session) {
            tracing::error!("Failed to save session: {}", e);
        }
    }
}

/// Pull the part index into range for the selected song
fn clamp_part_index(session: &mut Session) {
    let parts = session.current_song().map(|s| s.parts.len()).unwrap_or(0);
    if parts > 0 && session.current_part_index >= parts {
        session.current_part_index = parts - 1;
    }
}
