//! Audio output peripheral contract.
//!
//! The sink is configured once at startup with a fixed rate and format and
//! never reconfigured. Writes block until the whole buffer is queued for
//! DMA; `clear` zeroes whatever is left in the DMA ring so the tail of a
//! clip is not followed by stale samples.
//!
//! The ESP32 implementation lives in `hal::dac`.

use core::fmt;

/// Minimum DMA buffer count accepted by the I2S driver.
pub const DMA_BUFFER_COUNT_MIN: u32 = 2;
/// Maximum DMA buffer count accepted by the I2S driver.
pub const DMA_BUFFER_COUNT_MAX: u32 = 128;
/// Minimum DMA buffer length (frames).
pub const DMA_BUFFER_LEN_MIN: u32 = 8;
/// Maximum DMA buffer length (frames).
pub const DMA_BUFFER_LEN_MAX: u32 = 1024;

/// Channel layout of the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// One sample per frame
    Mono,
    /// Two samples per frame, right then left
    RightLeft,
}

impl ChannelLayout {
    /// Samples per frame.
    #[inline]
    pub fn channels(self) -> u32 {
        match self {
            Self::Mono => 1,
            Self::RightLeft => 2,
        }
    }
}

/// Output peripheral errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputError {
    /// Configuration rejected before touching hardware
    InvalidConfig,
    /// Driver call failed (ESP-IDF error code)
    Driver(i32),
    /// Driver accepted zero bytes on a blocking write
    Stalled,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig => write!(f, "invalid output config"),
            Self::Driver(code) => write!(f, "output driver error {}", code),
            Self::Stalled => write!(f, "output stalled"),
        }
    }
}

/// Output peripheral configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    /// Frame rate in Hz
    pub sample_rate: u32,
    /// Bits per sample (8 for raw u8 PCM)
    pub bits_per_sample: u8,
    /// Frame layout
    pub channel_layout: ChannelLayout,
    /// Number of DMA buffers
    pub dma_buffer_count: u32,
    /// Frames per DMA buffer
    pub dma_buffer_len: u32,
    /// Use the audio PLL (wider range of exact sample rates)
    pub use_apll: bool,
}

impl OutputConfig {
    /// Check ranges the driver would reject.
    pub fn validate(&self) -> Result<(), OutputError> {
        if self.sample_rate == 0 || self.bits_per_sample != 8 {
            return Err(OutputError::InvalidConfig);
        }
        if !(DMA_BUFFER_COUNT_MIN..=DMA_BUFFER_COUNT_MAX).contains(&self.dma_buffer_count) {
            return Err(OutputError::InvalidConfig);
        }
        if !(DMA_BUFFER_LEN_MIN..=DMA_BUFFER_LEN_MAX).contains(&self.dma_buffer_len) {
            return Err(OutputError::InvalidConfig);
        }
        Ok(())
    }

    /// Bytes consumed per output frame.
    #[inline]
    pub fn frame_bytes(&self) -> u32 {
        self.channel_layout.channels() * (self.bits_per_sample as u32 / 8)
    }

    /// Bytes of clip data consumed per second.
    #[inline]
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.frame_bytes()
    }

    /// Playback time of `bytes` of clip data, in milliseconds.
    pub fn duration_ms(&self, bytes: u64) -> u64 {
        let rate = self.byte_rate() as u64;
        if rate == 0 {
            return 0;
        }
        bytes * 1000 / rate
    }

    /// Total DMA ring size in bytes (worst-case write latency).
    #[inline]
    pub fn dma_bytes(&self) -> u32 {
        self.dma_buffer_count * self.dma_buffer_len * self.frame_bytes()
    }
}

/// Blocking streaming audio sink.
pub trait AudioSink {
    /// Queue `buf` for output, blocking until space is available.
    ///
    /// Returns the number of bytes accepted. A blocking implementation
    /// accepts all of them.
    fn write(&mut self, buf: &[u8]) -> Result<usize, OutputError>;

    /// Zero the internal buffer so nothing stale is played after the last write.
    fn clear(&mut self) -> Result<(), OutputError>;
}

impl<T: AudioSink + ?Sized> AudioSink for &mut T {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> Result<usize, OutputError> {
        (**self).write(buf)
    }

    #[inline]
    fn clear(&mut self) -> Result<(), OutputError> {
        (**self).clear()
    }
}
