//! Module: config
//!
//! Purpose: Fixed configuration for RustClipPlayer.
//!
//! Everything here is a compile-time constant: clip format, output DMA
//! sizing, SD card wiring and the button/clip table. Nothing is changed at
//! runtime and nothing is persisted. `validate()` runs once at startup;
//! a failure is fatal.

use core::fmt;

use crate::output::{
    ChannelLayout, OutputConfig, DMA_BUFFER_COUNT_MAX, DMA_BUFFER_COUNT_MIN, DMA_BUFFER_LEN_MAX,
    DMA_BUFFER_LEN_MIN,
};

/// Number of buttons / clips.
pub const CHANNEL_COUNT: usize = 3;

/// Bytes read from the SD card and written to the output per cycle.
pub const CHUNK_SIZE: usize = 1024;

/// One button and the clip it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Name used in log lines
    pub name: &'static str,
    /// GPIO number of the active-high button input
    pub pin: i32,
    /// Clip path relative to the mount point
    pub path: &'static str,
}

/// SD card over SPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdCardSpec {
    pub cs_pin: i32,
    pub sclk_pin: i32,
    pub miso_pin: i32,
    pub mosi_pin: i32,
    /// VFS mount point
    pub mount_point: &'static str,
    /// Maximum simultaneously open files (one per clip plus spare)
    pub max_open_files: usize,
}

/// Player configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerConfig {
    /// Output frame rate in Hz.
    ///
    /// Half of 44.1 kHz: in right-left 8-bit format one frame takes two
    /// clip bytes, so a 44.1 kB/s clip plays at its recorded speed.
    pub sample_rate: u32,
    /// Linear volume factor, nominally 0.0..=1.0
    pub volume: f32,
    /// Input poll interval in milliseconds (also the shortest press seen)
    pub poll_interval_ms: u32,
    /// Output frame layout
    pub channel_layout: ChannelLayout,
    /// Number of I2S DMA buffers
    pub dma_buffer_count: u32,
    /// Frames per I2S DMA buffer
    pub dma_buffer_len: u32,
    /// Clock I2S from the audio PLL
    pub use_apll: bool,
    /// SD card wiring
    pub sd: SdCardSpec,
    /// Buttons and clips, checked in this order every tick
    pub channels: [ChannelSpec; CHANNEL_COUNT],
}

/// Configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Sample rate is zero
    SampleRate,
    /// Volume is NaN, infinite or negative
    Volume,
    /// DMA buffer count or length outside driver limits
    DmaSizing,
    /// Two channels share an input pin (index of the second one)
    DuplicatePin(usize),
    /// Channel path is empty (index)
    EmptyPath(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleRate => write!(f, "sample rate must be non-zero"),
            Self::Volume => write!(f, "volume must be a finite non-negative factor"),
            Self::DmaSizing => write!(f, "DMA buffer count/length out of range"),
            Self::DuplicatePin(idx) => write!(f, "channel {} reuses an input pin", idx),
            Self::EmptyPath(idx) => write!(f, "channel {} has no clip path", idx),
        }
    }
}

impl PlayerConfig {
    /// Check the configuration before any hardware is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::SampleRate);
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(ConfigError::Volume);
        }
        if !(DMA_BUFFER_COUNT_MIN..=DMA_BUFFER_COUNT_MAX).contains(&self.dma_buffer_count)
            || !(DMA_BUFFER_LEN_MIN..=DMA_BUFFER_LEN_MAX).contains(&self.dma_buffer_len)
        {
            return Err(ConfigError::DmaSizing);
        }
        for (idx, channel) in self.channels.iter().enumerate() {
            if channel.path.is_empty() {
                return Err(ConfigError::EmptyPath(idx));
            }
            if self.channels[..idx].iter().any(|c| c.pin == channel.pin) {
                return Err(ConfigError::DuplicatePin(idx));
            }
        }
        Ok(())
    }

    /// Output peripheral settings for this configuration.
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            sample_rate: self.sample_rate,
            bits_per_sample: 8,
            channel_layout: self.channel_layout,
            dma_buffer_count: self.dma_buffer_count,
            dma_buffer_len: self.dma_buffer_len,
            use_apll: self.use_apll,
        }
    }
}

/// The device configuration.
pub const CONFIG: PlayerConfig = PlayerConfig {
    sample_rate: 44_100 / 2,
    volume: 1.0,
    poll_interval_ms: 10,
    channel_layout: ChannelLayout::RightLeft,
    dma_buffer_count: 8,
    dma_buffer_len: 64,
    use_apll: true,
    sd: SdCardSpec {
        cs_pin: 5,
        sclk_pin: 18,
        miso_pin: 19,
        mosi_pin: 23,
        mount_point: "/sdcard",
        max_open_files: 4,
    },
    channels: [
        ChannelSpec { name: "kiritsu", pin: 22, path: "/commands/kiritsu.raw" },
        ChannelSpec { name: "kiwotsuke", pin: 35, path: "/commands/kiwotsuke.raw" },
        ChannelSpec { name: "rei", pin: 32, path: "/commands/rei.raw" },
    ],
};
