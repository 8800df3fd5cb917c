// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File watcher for the persisted session.
//!
//! Lets a context in another process follow the director: whenever the
//! session file changes on disk it is re-read and surfaced as a
//! [`StoreEvent`], which converts into a [`SyncMessage`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::{SyncChannel, SyncMessage};
use crate::session::{store, Session};

/// Events emitted by the store watcher
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// Session file changed and was successfully reloaded
    Updated(Box<Session>),
    /// Session file was removed
    Cleared,
    /// Session file changed but could not be read
    Error(String),
}

impl StoreEvent {
    /// Message a receiving context should apply, if any
    ///
    /// A cleared store is seen as an empty session.
    pub fn into_message(self) -> Option<SyncMessage> {
        match self {
            StoreEvent::Updated(session) => Some(SyncMessage::SessionUpdated { session }),
            StoreEvent::Cleared => Some(SyncMessage::session_updated(&Session::new())),
            StoreEvent::Error(_) => None,
        }
    }
}

/// Session file watcher with debouncing
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<StoreEvent>,
    watched_path: PathBuf,
}

impl StoreWatcher {
    /// Create a new watcher for the session file at `path`
    ///
    /// The parent directory is watched, since saves replace the file.
    ///
    /// # Arguments
    /// * `path` - Session file to follow (need not exist yet)
    /// * `debounce_ms` - Debounce duration in milliseconds (default: 250)
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: Option<u64>) -> Result<Self> {
        let watched_path = path.as_ref().to_path_buf();
        let debounce_duration = Duration::from_millis(debounce_ms.unwrap_or(250));
        let dir = watched_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)
            .map_err(|e| anyhow!("Failed to create store directory {:?}: {}", dir, e))?;

        let (event_tx, event_rx): (Sender<StoreEvent>, Receiver<StoreEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", dir, e))?;

        let file_name = watched_path.file_name().map(|n| n.to_os_string());
        let session_path = watched_path.clone();

        std::thread::spawn(move || {
            let mut last_event_time: Option<Instant> = None;
            let mut last_seen: Option<String> = None;

            loop {
                match notify_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(event) => {
                        let relevant = event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                        if !relevant {
                            continue;
                        }
                        match event.kind {
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                                last_event_time = Some(Instant::now());
                            }
                            _ => {}
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let settled = last_event_time
                            .map(|t| t.elapsed() >= debounce_duration)
                            .unwrap_or(false);
                        if !settled {
                            continue;
                        }
                        last_event_time = None;

                        let event = match fs::read_to_string(&session_path) {
                            Ok(json) if last_seen.as_deref() == Some(json.as_str()) => continue,
                            Ok(json) => {
                                let event = match store::from_json(&json) {
                                    Ok(session) => StoreEvent::Updated(Box::new(session)),
                                    Err(e) => StoreEvent::Error(format!(
                                        "Failed to load {:?}: {}",
                                        session_path, e
                                    )),
                                };
                                last_seen = Some(json);
                                event
                            }
                            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                                if last_seen.take().is_none() {
                                    continue;
                                }
                                StoreEvent::Cleared
                            }
                            Err(e) => StoreEvent::Error(format!(
                                "Failed to read {:?}: {}",
                                session_path, e
                            )),
                        };

                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        // Watcher was dropped, exit thread
                        break;
                    }
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            event_receiver: event_rx,
            watched_path,
        })
    }

    /// Try to receive the next store event (non-blocking)
    pub fn try_recv(&self) -> Option<StoreEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Receive all pending store events
    pub fn recv_all(&self) -> Vec<StoreEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Block until the next store event, or until `timeout` passes
    pub fn recv_timeout(&self, timeout: Duration) -> Option<StoreEvent> {
        self.event_receiver.recv_timeout(timeout).ok()
    }

    /// Forward pending events onto a sync channel; returns how many were sent
    pub fn forward(&self, channel: &SyncChannel) -> usize {
        let mut sent = 0;
        for event in self.recv_all() {
            match event {
                StoreEvent::Error(e) => tracing::warn!("{}", e),
                event => {
                    if let Some(message) = event.into_message() {
                        channel.send(message);
                        sent += 1;
                    }
                }
            }
        }
        sent
    }

    /// Get the path being watched
    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}
