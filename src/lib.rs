// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! songcast - lyrics presentation with a director and live displays.
//!
//! Songs are written in a small markdown dialect and parsed into typed
//! parts. A director context edits the session and chooses what is live;
//! every change is persisted and broadcast as a full session snapshot to
//! the live contexts, which simply replace their copy.

pub mod config;
pub mod session;
pub mod song;
pub mod sync;
pub mod transfer;
pub mod views;

pub use config::Config;
pub use session::{Session, SessionController};
pub use song::{parse, part_label, PartType, Song, SongPart};
pub use sync::{SyncChannel, SyncHub, SyncMessage};
