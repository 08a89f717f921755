//! # RustClipPlayer
//!
//! Button-triggered playback of raw 8-bit PCM clips from an SD card.
//!
//! ## Architecture
//!
//! ```text
//! ButtonInputs ──snapshot──▶ Dispatcher ──rising edge──▶ Player
//!                                                        │
//!                         ClipSource ──chunks──▶ Volume ──▶ AudioSink
//! ```
//!
//! - Single task, cooperative: a press plays its clip to the end before
//!   the buttons are sampled again
//! - The core is hardware-agnostic and host-testable; ESP-IDF glue lives
//!   in [`hal`] and only builds for `target_os = "espidf"`
//! - Diagnostics go to a non-blocking ring ([`logging`]) drained between ticks

#![cfg_attr(not(test), no_std)]

#[cfg(target_os = "espidf")]
extern crate std;

pub mod buttons;
pub mod config;
pub mod dispatcher;
pub mod fault;
pub mod log_globals;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod serial_log;
pub mod source;
pub mod volume;

#[cfg(target_os = "espidf")]
pub mod hal;

pub use buttons::{ButtonInputs, ButtonLevels};
pub use config::{PlayerConfig, CHUNK_SIZE, CONFIG};
pub use dispatcher::{AudioChannel, Clock, Dispatcher, DispatcherStats};
pub use fault::{FaultCode, FaultState};
pub use log_globals::DIAG_LOG;
pub use output::{AudioSink, ChannelLayout, OutputConfig, OutputError};
pub use pipeline::{PlaybackError, PlaybackReport, Player};
pub use source::{ClipError, ClipSource, MemoryClip};
pub use volume::Volume;
