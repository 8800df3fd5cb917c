// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Live (audience) view.
//!
//! The live view follows the director through sync messages and renders
//! the current part over an animated background. The background's random
//! star field belongs to one song: selecting a different song always
//! re-seeds it, while edits to the same song's style only restyle it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::session::SessionController;
use crate::song::{part_label, AnimationSettings, GradientTheme, Song, SongPart, Tempo};
use crate::sync::SyncMessage;

/// Colors for one gradient theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Top, middle and bottom of the background gradient
    pub background: [&'static str; 3],
    /// Rising light gradient, bottom to top
    pub particles: [&'static str; 2],
    /// Constellation line color
    pub lines: &'static str,
    /// Ambient glow color
    pub glow: &'static str,
}

/// Palette for a theme
pub fn palette(theme: GradientTheme) -> Palette {
    let (middle, particle, lines, glow) = match theme {
        GradientTheme::Blue => ("#1e3a8a", "#60a5fa", "rgba(147, 197, 253, 0.3)", "rgba(59, 130, 246, 0.2)"),
        GradientTheme::Purple => ("#581c87", "#c084fc", "rgba(192, 132, 252, 0.3)", "rgba(168, 85, 247, 0.2)"),
        GradientTheme::Green => ("#14532d", "#4ade80", "rgba(134, 239, 172, 0.3)", "rgba(34, 197, 94, 0.2)"),
        GradientTheme::Orange => ("#7c2d12", "#fb923c", "rgba(251, 146, 60, 0.3)", "rgba(249, 115, 22, 0.2)"),
        GradientTheme::Pink => ("#831843", "#f472b6", "rgba(244, 114, 182, 0.3)", "rgba(236, 72, 153, 0.2)"),
        GradientTheme::Cyan => ("#164e63", "#22d3ee", "rgba(103, 232, 249, 0.3)", "rgba(6, 182, 212, 0.2)"),
    };
    Palette {
        background: ["#111827", middle, "#000000"],
        particles: [particle, "#ffffff"],
        lines,
        glow,
    }
}

/// A twinkling star, positions in percent of the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub left: f64,
    pub top: f64,
    /// Animation delay in seconds
    pub delay: f64,
    /// Diameter in pixels
    pub size: f64,
}

/// A light rising from the bottom edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub left: f64,
    pub delay: f64,
    pub size: f64,
}

/// Number of rising lights for a tempo
pub fn light_count(tempo: Tempo) -> usize {
    match tempo {
        Tempo::Fast => 80,
        Tempo::Slow => 40,
    }
}

/// Evenly spread, deterministic lights
fn lights(tempo: Tempo) -> Vec<Light> {
    (0..light_count(tempo))
        .map(|i| {
            let i = i as f64;
            let size = match tempo {
                Tempo::Fast => 2.5 + (i * 1.7) % 4.0,
                Tempo::Slow => 1.5 + (i * 1.7) % 2.5,
            };
            Light {
                left: (i * 97.0) % 100.0,
                delay: (i * 2.3) % 15.0,
                size,
            }
        })
        .collect()
}

fn random_star(rng: &mut StdRng, max_size: f64) -> Star {
    Star {
        left: rng.gen_range(0.0..100.0),
        top: rng.gen_range(0.0..100.0),
        delay: rng.gen_range(0.0..3.0),
        size: 0.5 + rng.gen_range(0.0..max_size.max(1.0)),
    }
}

/// Animated background state for one song
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    song_id: Option<String>,
    tempo: Tempo,
    settings: AnimationSettings,
    palette: Palette,
    stars: Vec<Star>,
    lights: Vec<Light>,
}

impl Background {
    /// Seed a fresh background for `song` (or the idle screen)
    fn seed(song: Option<&Song>, rng: &mut StdRng) -> Self {
        let (tempo, settings) = style(song);
        let stars = (0..settings.particle_count)
            .map(|_| random_star(rng, settings.particle_size))
            .collect();
        Self {
            song_id: song.map(|s| s.id.clone()),
            tempo,
            palette: palette(settings.background_color),
            lights: lights(tempo),
            settings,
            stars,
        }
    }

    /// Apply a style change of the same song, keeping existing stars
    fn restyle(&mut self, song: Option<&Song>, rng: &mut StdRng) {
        let (tempo, settings) = style(song);
        if settings == self.settings && tempo == self.tempo {
            return;
        }
        let count = settings.particle_count as usize;
        self.stars.truncate(count);
        while self.stars.len() < count {
            self.stars.push(random_star(rng, settings.particle_size));
        }
        self.tempo = tempo;
        self.palette = palette(settings.background_color);
        self.lights = lights(tempo);
        self.settings = settings;
    }

    /// Song the background was seeded for
    pub fn song_id(&self) -> Option<&str> {
        self.song_id.as_deref()
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }
}

/// Effective tempo and settings for a song, merged with defaults
///
/// Without explicit settings the song's gradient picks the background.
fn style(song: Option<&Song>) -> (Tempo, AnimationSettings) {
    match song {
        Some(song) => {
            let settings = match &song.animation_settings {
                Some(settings) => settings.clamped(),
                None => AnimationSettings {
                    background_color: song.gradient(),
                    ..AnimationSettings::default()
                },
            };
            (song.tempo, settings)
        }
        None => (Tempo::Slow, AnimationSettings::default()),
    }
}

/// Everything the live screen shows at one moment
#[derive(Debug)]
pub struct LiveFrame<'a> {
    pub song_title: Option<&'a str>,
    pub part: Option<&'a SongPart>,
    pub background: &'a Background,
}

impl LiveFrame<'_> {
    /// Label of the shown part
    pub fn part_label(&self) -> Option<String> {
        self.part.map(part_label)
    }

    /// Plain-text rendering for terminals
    pub fn render_text(&self) -> String {
        match (self.song_title, self.part) {
            (Some(title), Some(part)) => {
                format!("{}\n[{}]\n\n{}\n", title, part_label(part), part.lyrics)
            }
            (Some(title), None) => format!("{}\n\n(no part selected)\n", title),
            _ => "(waiting for the director)\n".to_string(),
        }
    }
}

/// Audience display context
pub struct LiveView {
    controller: SessionController,
    rng: StdRng,
    background: Option<Background>,
    seeds: u64,
}

impl LiveView {
    /// Create a live view over its own controller
    pub fn new(controller: SessionController) -> Self {
        Self::with_rng(controller, StdRng::from_entropy())
    }

    /// Create a live view with a fixed background seed
    pub fn with_seed(controller: SessionController, seed: u64) -> Self {
        Self::with_rng(controller, StdRng::seed_from_u64(seed))
    }

    fn with_rng(controller: SessionController, rng: StdRng) -> Self {
        Self {
            controller,
            rng,
            background: None,
            seeds: 0,
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Apply a message from the director
    pub fn apply(&mut self, message: SyncMessage) {
        self.controller.apply_remote(message);
    }

    /// How many times the background has been seeded
    pub fn seed_count(&self) -> u64 {
        self.seeds
    }

    /// Resolve what to show now, re-seeding the background on song change
    pub fn frame(&mut self) -> LiveFrame<'_> {
        let session = self.controller.session();
        let song = session.current_song();
        let song_id = song.map(|s| s.id.as_str());

        let background = match self.background.take() {
            Some(mut background) if background.song_id() == song_id => {
                background.restyle(song, &mut self.rng);
                background
            }
            _ => {
                tracing::debug!(song_id = ?song_id, "Seeding live background");
                self.seeds += 1;
                Background::seed(song, &mut self.rng)
            }
        };

        LiveFrame {
            song_title: song.map(|s| s.title.as_str()),
            part: session.current_part(),
            background: self.background.insert(background),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, Session};
    use crate::song::parse;

    fn live() -> LiveView {
        let controller = SessionController::new(Box::new(MemorySessionStore::new()), None);
        LiveView::with_seed(controller, 7)
    }

    fn session(current: &str, index: usize) -> Session {
        Session {
            songs: vec![
                parse("# One\n## Verse 1\na\n## Chorus\nb", "1"),
                parse("# Two\n## Bridge\nc", "2"),
            ],
            current_song_id: Some(current.to_string()),
            current_part_index: index,
        }
    }

    #[test]
    fn test_idle_frame() {
        let mut view = live();
        let frame = view.frame();
        assert!(frame.song_title.is_none());
        assert!(frame.part.is_none());
        assert_eq!(frame.render_text(), "(waiting for the director)\n");
        assert_eq!(frame.background.song_id(), None);
    }

    #[test]
    fn test_frame_follows_session_updates() {
        let mut view = live();
        view.apply(SyncMessage::session_updated(&session("1", 1)));

        let frame = view.frame();
        assert_eq!(frame.song_title, Some("One"));
        assert_eq!(frame.part_label(), Some("Chorus".to_string()));
        assert_eq!(frame.render_text(), "One\n[Chorus]\n\nb\n");
    }

    #[test]
    fn test_song_change_reseeds_background() {
        let mut view = live();
        view.apply(SyncMessage::session_updated(&session("1", 0)));
        let first = view.frame().background.clone();
        assert_eq!(view.seed_count(), 1);

        // Part changes keep the same stars
        view.apply(SyncMessage::PartChanged { part_index: 1 });
        assert_eq!(view.frame().background, &first);
        assert_eq!(view.seed_count(), 1);

        view.apply(SyncMessage::SongChanged {
            song_id: "2".to_string(),
        });
        let second = view.frame().background.clone();
        assert_eq!(view.seed_count(), 2);
        assert_eq!(second.song_id(), Some("2"));
        assert_ne!(second.stars(), first.stars());

        // Coming back to the first song seeds again rather than reusing
        view.apply(SyncMessage::SongChanged {
            song_id: "1".to_string(),
        });
        view.frame();
        assert_eq!(view.seed_count(), 3);
    }

    #[test]
    fn test_restyle_keeps_stars() {
        let mut view = live();
        let mut s = session("1", 0);
        view.apply(SyncMessage::session_updated(&s));
        let before = view.frame().background.clone();

        s.songs[0].tempo = Tempo::Fast;
        view.apply(SyncMessage::session_updated(&s));
        let after = view.frame().background.clone();

        assert_eq!(view.seed_count(), 1);
        assert_eq!(after.stars(), before.stars());
        assert_eq!(after.lights().len(), 80);
        assert_eq!(before.lights().len(), 40);
    }

    #[test]
    fn test_settings_drive_background() {
        let mut view = live();
        let mut s = session("2", 0);
        s.songs[1].gradient = Some(GradientTheme::Pink);
        view.apply(SyncMessage::session_updated(&s));
        assert_eq!(view.frame().background.palette().background[1], "#831843");

        s.songs[1].animation_settings = Some(AnimationSettings {
            particle_count: 500,
            background_color: GradientTheme::Green,
            ..AnimationSettings::default()
        });
        view.apply(SyncMessage::session_updated(&s));
        let frame = view.frame();
        assert_eq!(frame.background.stars().len(), 150);
        assert_eq!(frame.background.palette(), &palette(GradientTheme::Green));
    }

    #[test]
    fn test_deleted_song_shows_idle() {
        let mut view = live();
        let mut s = session("1", 1);
        view.apply(SyncMessage::session_updated(&s));
        view.frame();

        s.songs.remove(0);
        s.current_song_id = None;
        view.apply(SyncMessage::session_updated(&s));
        let frame = view.frame();
        assert!(frame.part.is_none());
        assert_eq!(view.seed_count(), 2);
    }

    #[test]
    fn test_lights_are_deterministic() {
        assert_eq!(lights(Tempo::Slow), lights(Tempo::Slow));
        assert_eq!(light_count(Tempo::Fast), 80);
        let l = lights(Tempo::Slow);
        assert_eq!(l[1].left, 97.0);
        assert!((l[1].delay - 2.3).abs() < 1e-9);
    }
}
