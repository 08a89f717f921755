//! Clip playback pipeline.
//!
//! Streams a clip from its source to the output sink in fixed-size chunks,
//! scaling the volume of every byte in place on the way.
//!
//! ```text
//! ClipSource ──read──▶ [chunk buffer] ──volume LUT──▶ AudioSink::write
//!                                                        │
//!                      end-of-stream (read == 0) ───▶ AudioSink::clear
//! ```
//!
//! Playback is synchronous: `play_clip` returns only after the last chunk is
//! queued and the output buffer is cleared. The player is reached through
//! `&mut`, so there is never more than one session in flight.

use core::fmt;

use crate::output::{AudioSink, OutputError};
use crate::source::{ClipError, ClipSource};
use crate::volume::Volume;

/// Playback errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError {
    /// Clip handle not open; nothing was sent to the output
    InvalidClip,
    /// Could not rewind the clip
    Rewind(ClipError),
    /// Read failed mid-stream
    Read(ClipError),
    /// Output write failed
    Write(OutputError),
    /// Output buffer could not be cleared after the last chunk
    Clear(OutputError),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidClip => write!(f, "file invalid"),
            Self::Rewind(e) => write!(f, "rewind: {}", e),
            Self::Read(e) => write!(f, "read: {}", e),
            Self::Write(e) => write!(f, "write: {}", e),
            Self::Clear(e) => write!(f, "clear: {}", e),
        }
    }
}

/// Result of one completed playback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Read-and-write cycles performed
    pub chunks: u32,
    /// Clip bytes sent to the output
    pub bytes: u64,
}

/// Playback engine: owns the output sink and the session chunk buffer.
///
/// `CHUNK` is the maximum number of bytes moved per read/write cycle.
pub struct Player<S: AudioSink, const CHUNK: usize> {
    sink: S,
    volume: Volume,
    chunk: [u8; CHUNK],
}

impl<S: AudioSink, const CHUNK: usize> Player<S, CHUNK> {
    /// Create a player over a configured sink.
    pub fn new(sink: S, volume: Volume) -> Self {
        const { assert!(CHUNK > 0, "Chunk size must be non-zero") };

        Self {
            sink,
            volume,
            chunk: [0u8; CHUNK],
        }
    }

    /// Volume applied to every sample.
    #[inline]
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// Output sink.
    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Play `clip` from its first byte to end-of-stream.
    ///
    /// An invalid clip returns [`PlaybackError::InvalidClip`] without
    /// touching the output. Once anything may have been written, the
    /// output buffer is cleared on every exit path, errors included.
    pub fn play_clip<C: ClipSource + ?Sized>(&mut self, clip: &mut C) -> Result<PlaybackReport, PlaybackError> {
        if !clip.is_valid() {
            return Err(PlaybackError::InvalidClip);
        }

        clip.rewind().map_err(PlaybackError::Rewind)?;

        let streamed = self.stream(clip);
        let cleared = self.sink.clear().map_err(PlaybackError::Clear);

        // A streaming error is the more useful one to report
        let report = streamed?;
        cleared?;
        Ok(report)
    }

    fn stream<C: ClipSource + ?Sized>(&mut self, clip: &mut C) -> Result<PlaybackReport, PlaybackError> {
        let mut report = PlaybackReport::default();

        loop {
            let n = clip.read(&mut self.chunk).map_err(PlaybackError::Read)?;
            if n == 0 {
                break;
            }

            let chunk = &mut self.chunk[..n];
            self.volume.apply_in_place(chunk);
            write_all(&mut self.sink, chunk).map_err(PlaybackError::Write)?;

            report.chunks += 1;
            report.bytes += n as u64;
        }

        Ok(report)
    }
}

/// Keep writing until the sink has accepted every byte.
fn write_all<S: AudioSink>(sink: &mut S, mut buf: &[u8]) -> Result<(), OutputError> {
    while !buf.is_empty() {
        let written = sink.write(buf)?;
        if written == 0 {
            return Err(OutputError::Stalled);
        }
        buf = &buf[written.min(buf.len())..];
    }
    Ok(())
}
