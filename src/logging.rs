//! Non-blocking diagnostic log for RustClipPlayer.
//!
//! ```text
//! startup / dispatcher ──push──▶ LogStream ring ──drain──▶ serial_log ──▶ UART0
//!        (producer)              N entries                (consumer, between ticks)
//! ```
//!
//! The firmware has one task, so the ring is single-producer,
//! single-consumer. A full ring drops the new message and counts it; the
//! producer never waits. Formatting goes into a stack buffer.

use core::cell::UnsafeCell;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length in bytes.
pub const MAX_MSG_LEN: usize = 96;

/// Ring capacity of the global stream.
pub const LOG_BUFFER_SIZE: usize = 32;

/// Severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Upper-case tag used in serial lines.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// One queued message.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Microseconds since boot.
    pub timestamp_us: i64,
    pub level: LogLevel,
    /// Used bytes of `msg`.
    pub len: u8,
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const BLANK: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    fn fill(&mut self, timestamp_us: i64, level: LogLevel, msg: &[u8]) {
        let len = msg.len().min(MAX_MSG_LEN);
        self.timestamp_us = timestamp_us;
        self.level = level;
        self.len = len as u8;
        self.msg[..len].copy_from_slice(&msg[..len]);
    }

    /// Message text. A multi-byte char cut by truncation is left out.
    pub fn message(&self) -> &str {
        let bytes = &self.msg[..self.len as usize];
        core::str::from_utf8(bytes).unwrap_or_else(|e| {
            // valid_up_to() always ends on a char boundary
            core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default()
        })
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::BLANK
    }
}

/// Fixed-size SPSC ring of [`LogEntry`].
///
/// `head` is written only by the producer (`push`), `tail` only by the
/// consumer (`drain`). Both are free-running counters; `N` must be a power
/// of two so they index the ring with a mask.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    slots: UnsafeCell<[LogEntry; N]>,
    head: AtomicU32,
    tail: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: one producer and one consumer; a slot is handed over by the
// Release store of `head` and handed back by the Release store of `tail`.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    /// Empty stream.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "LogStream capacity must be a power of two");

        Self {
            slots: UnsafeCell::new([LogEntry::BLANK; N]),
            head: AtomicU32::new(0),
            tail: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    #[inline]
    fn slot(counter: u32) -> usize {
        counter as usize & (N - 1)
    }

    /// Queue a message. Returns `false` (and counts a drop) if the ring is full.
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head.wrapping_sub(tail) as usize >= N {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // SAFETY: slot `head` is outside [tail, head), the consumer won't read it
        // until the store below publishes it.
        unsafe { (*self.slots.get())[Self::slot(head)].fill(timestamp_us, level, msg) };

        self.head.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Format `args` into a stack buffer and queue it.
    pub fn push_fmt(&self, timestamp_us: i64, level: LogLevel, args: fmt::Arguments<'_>) -> bool {
        let mut buf = [0u8; MAX_MSG_LEN];
        let len = format_to_buffer(&mut buf, args);
        self.push(timestamp_us, level, &buf[..len])
    }

    /// Oldest queued message, if any.
    pub fn drain(&self) -> Option<LogEntry> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: slot `tail` was published by the producer and is not
        // reused until `tail` moves past it.
        let entry = unsafe { (*self.slots.get())[Self::slot(tail)] };

        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Messages lost to a full ring since the last reset.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Messages waiting to be drained.
    pub fn pending(&self) -> u32 {
        self.head
            .load(Ordering::Acquire)
            .wrapping_sub(self.tail.load(Ordering::Relaxed))
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// `fmt::Write` over a byte slice that silently stops when full.
struct Truncating<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.buf.len() - self.len;
        let take = s.len().min(room);
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

/// Render `args` into `buf`, cutting off what doesn't fit. Returns the
/// byte count.
pub fn format_to_buffer(buf: &mut [u8], args: fmt::Arguments<'_>) -> usize {
    let mut out = Truncating { buf, len: 0 };
    // Truncating never reports an error
    let _ = fmt::write(&mut out, args);
    out.len
}

/// Queue a formatted message on a [`LogStream`].
///
/// ```ignore
/// diag_log!(LogLevel::Info, DIAG_LOG, now_us, "{} pressed", name);
/// ```
#[macro_export]
macro_rules! diag_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        $stream.push_fmt($timestamp, $level, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! diag_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! diag_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! diag_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

/// Debug level: startup details nobody needs while playing.
#[macro_export]
macro_rules! diag_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::diag_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}
