// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Presentation views.
//!
//! This module provides:
//! - Director: the operator's command surface
//! - Live: the audience display following the director

pub mod director;
pub mod live;

pub use director::{DirectorView, PartSummary};
pub use live::{Background, LiveFrame, LiveView, Palette};
