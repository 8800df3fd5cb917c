// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Cross-context session synchronization.
//!
//! A [`SyncHub`] plays the role of the shared origin: every context that
//! opens a channel with the same name on the same hub sees the messages the
//! others send. Delivery is best effort and at most once; a context never
//! receives its own messages and nothing is queued for contexts that
//! subscribe later.
//!
//! Separate processes sharing a store directory are bridged by
//! [`StoreWatcher`], which turns changes of the persisted session file into
//! [`SyncMessage::SessionUpdated`] messages.

pub mod watcher;

pub use watcher::{StoreEvent, StoreWatcher};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::session::Session;

/// Default channel name shared by director and live contexts
pub const CHANNEL_NAME: &str = "song-presenter-sync";

/// Messages buffered per channel before slow subscribers start lagging
const CHANNEL_CAPACITY: usize = 64;

/// State change broadcast between contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncMessage {
    /// A song was selected; receivers reset to its first part
    #[serde(rename = "SONG_CHANGED", rename_all = "camelCase")]
    SongChanged { song_id: String },
    /// The live part moved
    #[serde(rename = "PART_CHANGED", rename_all = "camelCase")]
    PartChanged { part_index: usize },
    /// Full session snapshot; receivers replace their copy
    #[serde(rename = "SESSION_UPDATED")]
    SessionUpdated { session: Box<Session> },
}

impl SyncMessage {
    /// Snapshot message for a session
    pub fn session_updated(session: &Session) -> Self {
        SyncMessage::SessionUpdated {
            session: Box::new(session.clone()),
        }
    }

    /// Wire tag of the message
    pub fn kind(&self) -> &'static str {
        match self {
            SyncMessage::SongChanged { .. } => "SONG_CHANGED",
            SyncMessage::PartChanged { .. } => "PART_CHANGED",
            SyncMessage::SessionUpdated { .. } => "SESSION_UPDATED",
        }
    }
}

/// Message tagged with the context that sent it
#[derive(Debug, Clone)]
struct Envelope {
    origin: u64,
    message: Arc<SyncMessage>,
}

/// Shared origin for named broadcast channels
#[derive(Debug, Clone, Default)]
pub struct SyncHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<Envelope>>>>,
    next_context: Arc<AtomicU64>,
}

impl SyncHub {
    /// Create a hub with no channels
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a named channel as a new context
    pub fn open(&self, name: &str) -> SyncChannel {
        let sender = {
            let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
            channels
                .entry(name.to_string())
                .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
                .clone()
        };
        let context = self.next_context.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(channel = name, context, "Opened sync channel");

        SyncChannel {
            name: name.to_string(),
            context,
            sender,
        }
    }
}

/// One context's handle on a named channel
#[derive(Debug, Clone)]
pub struct SyncChannel {
    name: String,
    context: u64,
    sender: broadcast::Sender<Envelope>,
}

impl SyncChannel {
    /// Channel name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the context owning this handle
    pub fn context_id(&self) -> u64 {
        self.context
    }

    /// Fire-and-forget send to every other open subscriber
    pub fn send(&self, message: SyncMessage) {
        let kind = message.kind();
        let envelope = Envelope {
            origin: self.context,
            message: Arc::new(message),
        };
        match self.sender.send(envelope) {
            Ok(receivers) => {
                tracing::debug!(channel = %self.name, kind, receivers, "Sent sync message")
            }
            Err(_) => tracing::trace!(channel = %self.name, kind, "No subscribers for sync message"),
        }
    }

    /// Subscribe to messages sent from now on by other contexts
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            context: self.context,
            receiver: self.sender.subscribe(),
        }
    }

    /// Run `handler` for every message from other contexts
    ///
    /// Spawns a task on the current tokio runtime. The returned listener
    /// stops delivery when closed or dropped.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use
    /// [`listen_on`](Self::listen_on) with an explicit handle there.
    pub fn listen<F>(&self, handler: F) -> Listener
    where
        F: FnMut(SyncMessage) + Send + 'static,
    {
        self.listen_on(&Handle::current(), handler)
    }

    /// Like [`listen`](Self::listen), spawning on the given runtime
    pub fn listen_on<F>(&self, runtime: &Handle, mut handler: F) -> Listener
    where
        F: FnMut(SyncMessage) + Send + 'static,
    {
        let mut subscription = self.subscribe();
        let handle = runtime.spawn(async move {
            while let Some(message) = subscription.recv().await {
                handler(message);
            }
        });
        Listener {
            handle: Some(handle),
        }
    }
}

/// Receiving side of a channel for one context
#[derive(Debug)]
pub struct Subscription {
    context: u64,
    receiver: broadcast::Receiver<Envelope>,
}

impl Subscription {
    /// Next pending message, without waiting
    pub fn try_recv(&mut self) -> Option<SyncMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) if envelope.origin == self.context => continue,
                Ok(envelope) => return Some(envelope.message.as_ref().clone()),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Sync subscriber lagged, messages dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain every pending message
    pub fn recv_all(&mut self) -> Vec<SyncMessage> {
        let mut messages = Vec::new();
        while let Some(message) = self.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Wait for the next message; `None` once the channel is gone
    pub async fn recv(&mut self) -> Option<SyncMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) if envelope.origin == self.context => continue,
                Ok(envelope) => return Some(envelope.message.as_ref().clone()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Sync subscriber lagged, messages dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Disposer for a running message handler
#[derive(Debug)]
pub struct Listener {
    handle: Option<JoinHandle<()>>,
}

impl Listener {
    /// Stop delivering messages; safe to call more than once
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether `close` has run
    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::parse;
    use std::time::Duration;

    fn snapshot() -> Session {
        Session {
            songs: vec![parse("# Sync\n## Chorus\nHey", "a")],
            current_song_id: Some("a".to_string()),
            current_part_index: 0,
        }
    }

    #[test]
    fn test_message_wire_format() {
        let msg = SyncMessage::SongChanged {
            song_id: "abc".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"SONG_CHANGED","songId":"abc"}"#
        );

        let msg = SyncMessage::PartChanged { part_index: 3 };
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"PART_CHANGED","partIndex":3}"#
        );

        let msg = SyncMessage::session_updated(&Session::new());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "SESSION_UPDATED");
        assert_eq!(value["session"]["currentPartIndex"], 0);

        let back: SyncMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_other_contexts_receive() {
        let hub = SyncHub::new();
        let director = hub.open(CHANNEL_NAME);
        let live = hub.open(CHANNEL_NAME);
        let mut live_sub = live.subscribe();

        director.send(SyncMessage::session_updated(&snapshot()));

        let received = live_sub.recv_all();
        assert_eq!(received, vec![SyncMessage::session_updated(&snapshot())]);
    }

    #[test]
    fn test_own_messages_are_skipped() {
        let hub = SyncHub::new();
        let director = hub.open(CHANNEL_NAME);
        let mut own = director.subscribe();

        director.send(SyncMessage::PartChanged { part_index: 1 });
        assert!(own.try_recv().is_none());
    }

    #[test]
    fn test_channels_are_isolated_by_name() {
        let hub = SyncHub::new();
        let a = hub.open("a");
        let mut b = hub.open("b").subscribe();

        a.send(SyncMessage::PartChanged { part_index: 1 });
        assert!(b.try_recv().is_none());
    }

    #[test]
    fn test_late_subscribers_miss_earlier_messages() {
        let hub = SyncHub::new();
        let director = hub.open(CHANNEL_NAME);
        director.send(SyncMessage::PartChanged { part_index: 1 });

        let mut late = hub.open(CHANNEL_NAME).subscribe();
        assert!(late.try_recv().is_none());
    }

    #[test]
    fn test_send_without_subscribers() {
        let hub = SyncHub::new();
        let director = hub.open(CHANNEL_NAME);
        // Must not panic or block
        director.send(SyncMessage::PartChanged { part_index: 0 });
    }

    #[test]
    fn test_fifo_order() {
        let hub = SyncHub::new();
        let director = hub.open(CHANNEL_NAME);
        let mut live = hub.open(CHANNEL_NAME).subscribe();

        for i in 0..5 {
            director.send(SyncMessage::PartChanged { part_index: i });
        }
        let indices: Vec<usize> = live
            .recv_all()
            .into_iter()
            .filter_map(|m| match m {
                SyncMessage::PartChanged { part_index } => Some(part_index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_lagging_subscriber_keeps_latest() {
        let hub = SyncHub::new();
        let director = hub.open(CHANNEL_NAME);
        let mut live = hub.open(CHANNEL_NAME).subscribe();

        for i in 0..(CHANNEL_CAPACITY + 10) {
            director.send(SyncMessage::PartChanged { part_index: i });
        }
        let received = live.recv_all();
        assert_eq!(received.len(), CHANNEL_CAPACITY);
        assert_eq!(
            received.last(),
            Some(&SyncMessage::PartChanged {
                part_index: CHANNEL_CAPACITY + 9
            })
        );
    }

    #[tokio::test]
    async fn test_async_recv() {
        let hub = SyncHub::new();
        let director = hub.open(CHANNEL_NAME);
        let mut live = hub.open(CHANNEL_NAME).subscribe();

        director.send(SyncMessage::SongChanged {
            song_id: "a".to_string(),
        });
        let msg = tokio::time::timeout(Duration::from_secs(1), live.recv())
            .await
            .unwrap();
        assert_eq!(
            msg,
            Some(SyncMessage::SongChanged {
                song_id: "a".to_string()
            })
        );
    }

    #[test]
    fn test_listen_on_explicit_runtime() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let hub = SyncHub::new();
        let director = hub.open(CHANNEL_NAME);
        let live = hub.open(CHANNEL_NAME);

        let (tx, rx) = std::sync::mpsc::channel();
        let mut listener = live.listen_on(runtime.handle(), move |msg| {
            let _ = tx.send(msg);
        });

        director.send(SyncMessage::PartChanged { part_index: 1 });
        let got = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(got, SyncMessage::PartChanged { part_index: 1 });
        listener.close();
    }

    #[tokio::test]
    async fn test_listener_delivers_until_closed() {
        let hub = SyncHub::new();
        let director = hub.open(CHANNEL_NAME);
        let live = hub.open(CHANNEL_NAME);

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut listener = live.listen(move |msg| {
            let _ = tx.send(msg);
        });

        director.send(SyncMessage::PartChanged { part_index: 2 });
        let got = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert_eq!(got, Some(SyncMessage::PartChanged { part_index: 2 }));

        listener.close();
        listener.close();
        assert!(listener.is_closed());

        // The aborted task drops its sender, closing the mpsc channel
        let after = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert_eq!(after, None);
    }
}
