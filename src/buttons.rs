//! Module: buttons
//!
//! Purpose: Snapshot of the button input levels for one poll tick.
//!
//! Architecture:
//! - One bit per channel, bit N = channel N, 1 = HIGH (pressed)
//! - Sampled once per tick, between playbacks; never while a clip plays
//! - Edge detection compares two snapshots, no debounce
//!
//! Safety: Safe. No unsafe blocks. Copy types only.

/// Maximum number of channels a snapshot can hold.
pub const MAX_CHANNELS: usize = 8;

/// Input levels of all buttons at one instant.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonLevels(u8);

impl ButtonLevels {
    /// All inputs LOW (initial state).
    pub const ALL_LOW: Self = Self(0);

    /// Create from raw bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Create from per-channel levels, channel 0 first.
    pub fn from_levels(levels: &[bool]) -> Self {
        let mut bits = 0u8;
        for (idx, &high) in levels.iter().take(MAX_CHANNELS).enumerate() {
            if high {
                bits |= 1 << idx;
            }
        }
        Self(bits)
    }

    /// Raw bits.
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Level of channel `idx` (out-of-range channels read LOW).
    #[inline]
    pub const fn is_high(&self, idx: usize) -> bool {
        idx < MAX_CHANNELS && (self.0 >> idx) & 1 != 0
    }

    /// Set the level of channel `idx`. Out-of-range indices are ignored.
    #[inline]
    pub fn set(&mut self, idx: usize, high: bool) {
        if idx >= MAX_CHANNELS {
            return;
        }
        if high {
            self.0 |= 1 << idx;
        } else {
            self.0 &= !(1 << idx);
        }
    }

    /// Channels that are HIGH now and were LOW in `previous`.
    #[inline]
    pub const fn rising_edges(&self, previous: ButtonLevels) -> ButtonLevels {
        ButtonLevels(self.0 & !previous.0)
    }

    /// True if no input is HIGH.
    pub const fn all_low(&self) -> bool {
        self.0 == 0
    }
}

/// Source of button levels, read once per tick.
pub trait ButtonInputs {
    /// Read the instantaneous level of every input.
    fn sample(&mut self) -> ButtonLevels;
}

impl<F: FnMut() -> ButtonLevels> ButtonInputs for F {
    fn sample(&mut self) -> ButtonLevels {
        self()
    }
}
