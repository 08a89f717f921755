//! Clip sources: seekable byte streams holding raw PCM.
//!
//! A clip is opened once at startup and replayed many times. Opening never
//! aborts; a source that could not be opened stays around as an invalid
//! handle and playback of it becomes a reported no-op.

use core::fmt;

/// Clip stream errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipError {
    /// Handle is not open (missing file, closed, or never opened)
    Invalid,
    /// Could not move the read cursor
    Seek,
    /// Read failed mid-stream
    Read,
}

impl fmt::Display for ClipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "clip invalid"),
            Self::Seek => write!(f, "clip seek failed"),
            Self::Read => write!(f, "clip read failed"),
        }
    }
}

/// An open (or failed-to-open) raw audio stream.
pub trait ClipSource {
    /// True if the handle is open and can be played.
    fn is_valid(&self) -> bool;

    /// Move the read cursor back to byte 0.
    fn rewind(&mut self) -> Result<(), ClipError>;

    /// Read up to `buf.len()` bytes. `Ok(0)` is end-of-stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClipError>;
}

impl<T: ClipSource + ?Sized> ClipSource for &mut T {
    #[inline]
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    #[inline]
    fn rewind(&mut self) -> Result<(), ClipError> {
        (**self).rewind()
    }

    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClipError> {
        (**self).read(buf)
    }
}

/// Clip backed by a byte slice (flash-resident clips, host tests).
#[derive(Debug, Clone)]
pub struct MemoryClip<'a> {
    data: Option<&'a [u8]>,
    pos: usize,
}

impl<'a> MemoryClip<'a> {
    /// Open a clip over `data`. An empty slice is a valid, zero-length clip.
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data: Some(data),
            pos: 0,
        }
    }

    /// A handle that failed to open.
    pub const fn invalid() -> Self {
        Self { data: None, pos: 0 }
    }

    /// Current read cursor.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total clip length (0 if invalid).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.map_or(0, |d| d.len())
    }

    /// True if the clip holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the backing data, as if the file was closed underneath us.
    pub fn close(&mut self) {
        self.data = None;
        self.pos = 0;
    }
}

impl ClipSource for MemoryClip<'_> {
    fn is_valid(&self) -> bool {
        self.data.is_some()
    }

    fn rewind(&mut self) -> Result<(), ClipError> {
        if self.data.is_none() {
            return Err(ClipError::Invalid);
        }
        self.pos = 0;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClipError> {
        let data = self.data.ok_or(ClipError::Invalid)?;
        let remaining = &data[self.pos.min(data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}
