//! Button poll loop and clip dispatch.
//!
//! Pure logic, no hardware dependencies. Consumes button snapshots,
//! drives the player. Fully testable on host.
//!
//! # Per-channel state machine
//!
//! ```text
//!          level HIGH / play clip
//!   LOW ───────────────────────────▶ HIGH
//!    ▲                                │
//!    └────────── level LOW ───────────┘
//! ```
//!
//! Only the LOW → HIGH transition does anything. All channels are checked
//! against the same snapshot, in index order; previous levels are updated
//! after the whole snapshot has been handled.
//!
//! Playback blocks the tick. Inputs are not sampled while a clip plays, so
//! a press that starts and ends during another clip is never seen, and
//! nothing is queued.

use crate::buttons::{ButtonInputs, ButtonLevels, MAX_CHANNELS};
use crate::logging::LogStream;
use crate::output::{AudioSink, OutputConfig};
use crate::pipeline::{PlaybackError, Player};
use crate::source::ClipSource;
use crate::{diag_error, diag_info, diag_warn};

/// Microsecond time source for log timestamps.
pub trait Clock {
    fn now_us(&self) -> i64;
}

impl<F: Fn() -> i64> Clock for F {
    #[inline]
    fn now_us(&self) -> i64 {
        self()
    }
}

/// One button and the clip it plays.
#[derive(Debug)]
pub struct AudioChannel<C> {
    /// Name used in log lines
    pub name: &'static str,
    /// GPIO number of the input
    pub pin: i32,
    /// Clip handle, opened at startup
    pub clip: C,
    /// Level seen on the previous tick
    last_level: bool,
}

impl<C: ClipSource> AudioChannel<C> {
    /// Create a channel in the LOW state.
    pub fn new(name: &'static str, pin: i32, clip: C) -> Self {
        Self {
            name,
            pin,
            clip,
            last_level: false,
        }
    }

    /// Level remembered from the previous tick.
    #[inline]
    pub fn last_level(&self) -> bool {
        self.last_level
    }
}

/// Check every clip handle. Returns the index of the first invalid one.
pub fn verify_channels<C: ClipSource>(channels: &[AudioChannel<C>]) -> Result<(), usize> {
    match channels.iter().position(|ch| !ch.clip.is_valid()) {
        Some(idx) => Err(idx),
        None => Ok(()),
    }
}

/// Dispatcher counters since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Input snapshots processed
    pub ticks: u32,
    /// Rising edges serviced
    pub presses: u32,
    /// Clips played to end-of-stream
    pub completed: u32,
    /// Presses on an invalid clip
    pub skipped: u32,
    /// Playbacks aborted by a read/write error
    pub failed: u32,
}

/// Owns the channels and the player; the whole controller state.
pub struct Dispatcher<'a, S, C, K, const N: usize, const CHUNK: usize>
where
    S: AudioSink,
    C: ClipSource,
    K: Clock,
{
    channels: [AudioChannel<C>; N],
    player: Player<S, CHUNK>,
    log: &'a LogStream,
    clock: K,
    output: Option<OutputConfig>,
    stats: DispatcherStats,
}

impl<'a, S, C, K, const N: usize, const CHUNK: usize> Dispatcher<'a, S, C, K, N, CHUNK>
where
    S: AudioSink,
    C: ClipSource,
    K: Clock,
{
    /// Create a dispatcher. All channels start LOW.
    pub fn new(channels: [AudioChannel<C>; N], player: Player<S, CHUNK>, log: &'a LogStream, clock: K) -> Self {
        const { assert!(N <= MAX_CHANNELS, "Too many channels for ButtonLevels") };

        Self {
            channels,
            player,
            log,
            clock,
            output: None,
            stats: DispatcherStats::default(),
        }
    }

    /// Report playback durations using this output format.
    pub fn with_output_config(mut self, output: OutputConfig) -> Self {
        self.output = Some(output);
        self
    }

    /// Check every clip handle. Returns the index of the first invalid one.
    pub fn verify_clips(&self) -> Result<(), usize> {
        verify_channels(&self.channels)
    }

    /// Handle one input snapshot. Returns the number of clips started.
    pub fn tick(&mut self, levels: ButtonLevels) -> usize {
        self.stats.ticks = self.stats.ticks.wrapping_add(1);

        let mut previous = ButtonLevels::ALL_LOW;
        for (idx, ch) in self.channels.iter().enumerate() {
            previous.set(idx, ch.last_level);
        }

        let edges = levels.rising_edges(previous);
        let mut started = 0;
        for idx in 0..N {
            if edges.is_high(idx) {
                self.service(idx);
                started += 1;
            }
        }

        for (idx, ch) in self.channels.iter_mut().enumerate() {
            ch.last_level = levels.is_high(idx);
        }

        started
    }

    /// Sample `inputs` once and handle the snapshot.
    pub fn poll<I: ButtonInputs + ?Sized>(&mut self, inputs: &mut I) -> usize {
        let levels = inputs.sample();
        self.tick(levels)
    }

    /// Poll forever, calling `idle` after every tick (log drain, delay).
    pub fn run<I, F>(&mut self, inputs: &mut I, mut idle: F) -> !
    where
        I: ButtonInputs + ?Sized,
        F: FnMut(&Self),
    {
        loop {
            self.poll(inputs);
            idle(self);
        }
    }

    fn service(&mut self, idx: usize) {
        self.stats.presses = self.stats.presses.wrapping_add(1);

        let ch = &mut self.channels[idx];
        diag_info!(self.log, self.clock.now_us(), "{} pressed, starting", ch.name);

        match self.player.play_clip(&mut ch.clip) {
            Ok(report) => {
                self.stats.completed = self.stats.completed.wrapping_add(1);
                let duration_ms = self.output.map_or(0, |o| o.duration_ms(report.bytes));
                diag_info!(
                    self.log,
                    self.clock.now_us(),
                    "{} completed: {} bytes, {} chunks, {} ms",
                    ch.name,
                    report.bytes,
                    report.chunks,
                    duration_ms
                );
            }
            Err(PlaybackError::InvalidClip) => {
                self.stats.skipped = self.stats.skipped.wrapping_add(1);
                diag_warn!(self.log, self.clock.now_us(), "{}: file invalid", ch.name);
            }
            Err(e) => {
                self.stats.failed = self.stats.failed.wrapping_add(1);
                diag_error!(self.log, self.clock.now_us(), "{}: playback failed: {}", ch.name, e);
            }
        }
    }

    /// Counters since boot.
    #[inline]
    pub fn stats(&self) -> DispatcherStats {
        self.stats
    }

    /// Channel `idx`, if it exists.
    #[inline]
    pub fn channel(&self, idx: usize) -> Option<&AudioChannel<C>> {
        self.channels.get(idx)
    }

    /// The player.
    #[inline]
    pub fn player(&self) -> &Player<S, CHUNK> {
        &self.player
    }

    /// Diagnostic log this dispatcher writes to.
    #[inline]
    pub fn log(&self) -> &'a LogStream {
        self.log
    }

    /// Current time from the dispatcher's clock.
    #[inline]
    pub fn now_us(&self) -> i64 {
        self.clock.now_us()
    }
}
