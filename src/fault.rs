//! Fatal startup faults.
//!
//! Without all of its clips and an audio output the player has nothing
//! useful to do. Any of these conditions stops startup before the input
//! loop is entered and the task parks forever.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Fault codes indicating why startup stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// SD card could not be mounted.
    /// Data: ESP-IDF error code.
    StorageMount = 1,

    /// A clip file could not be opened.
    /// Data: channel index.
    ClipOpen = 2,

    /// Audio output could not be configured.
    /// Data: ESP-IDF error code (0 if rejected before the driver call).
    OutputInit = 3,

    /// Compile-time configuration failed validation.
    InvalidConfig = 4,

    /// GPIO input setup failed.
    /// Data: ESP-IDF error code.
    InputInit = 5,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::StorageMount,
            2 => FaultCode::ClipOpen,
            3 => FaultCode::OutputInit,
            4 => FaultCode::InvalidConfig,
            5 => FaultCode::InputInit,
            _ => FaultCode::None,
        }
    }

    /// Short description for the serial log.
    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::None => "none",
            FaultCode::StorageMount => "failed to mount SD card",
            FaultCode::ClipOpen => "couldn't open clip file",
            FaultCode::OutputInit => "failed to configure audio output",
            FaultCode::InvalidConfig => "invalid configuration",
            FaultCode::InputInit => "failed to configure button inputs",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fault state shared between startup and the halt loop.
///
/// # Usage
///
/// ```ignore
/// static FAULT: FaultState = FaultState::new();
///
/// if let Err(e) = mount() {
///     FAULT.set(FaultCode::StorageMount, e.code() as u32);
///     halt(&FAULT);
/// }
/// ```
pub struct FaultState {
    /// True if fault is active.
    active: AtomicBool,

    /// Fault code (reason for fault).
    code: AtomicU8,

    /// Additional data (channel index, ESP-IDF error code).
    data: AtomicU32,

    /// Total fault count since boot.
    count: AtomicU32,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Set fault state.
    ///
    /// The first fault wins: later calls only bump the counter, so the
    /// reported cause is the one that stopped startup.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.count.fetch_add(1, Ordering::Relaxed);
        if self.active.load(Ordering::Acquire) {
            return;
        }
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.active.store(true, Ordering::Release);
    }

    /// Check if fault is currently active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Get fault code (only meaningful if `is_active()` is true).
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    /// Get fault data (meaning depends on fault code).
    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    /// Get total fault count since boot.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get a snapshot of the current fault state.
    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}
