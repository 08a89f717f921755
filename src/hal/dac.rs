//! I2S output into the ESP32 built-in DAC.
//!
//! Uses the legacy I2S driver: it is the one that can route I2S0 to the
//! internal 8-bit DAC (GPIO25/GPIO26). The DMA ring auto-clears on
//! underrun, and `clear` zeroes it explicitly after each clip.

use core::ffi::c_void;

use esp_idf_svc::hal::delay::BLOCK;
use esp_idf_svc::sys::{self, esp, EspError};

use crate::output::{AudioSink, ChannelLayout, OutputConfig, OutputError};

impl From<EspError> for OutputError {
    fn from(e: EspError) -> Self {
        OutputError::Driver(e.code())
    }
}

/// Configured I2S0 → DAC output.
pub struct DacOutput {
    port: sys::i2s_port_t,
}

impl DacOutput {
    /// Install the I2S driver and enable both DAC channels.
    ///
    /// Called once at startup. There is no reconfiguration path.
    pub fn configure(config: &OutputConfig) -> Result<Self, OutputError> {
        config.validate()?;

        let port = sys::i2s_port_t_I2S_NUM_0;
        let channel_format = match config.channel_layout {
            ChannelLayout::Mono => sys::i2s_channel_fmt_t_I2S_CHANNEL_FMT_ONLY_RIGHT,
            ChannelLayout::RightLeft => sys::i2s_channel_fmt_t_I2S_CHANNEL_FMT_RIGHT_LEFT,
        };

        let i2s_config = sys::i2s_config_t {
            mode: sys::i2s_mode_t_I2S_MODE_MASTER
                | sys::i2s_mode_t_I2S_MODE_TX
                | sys::i2s_mode_t_I2S_MODE_DAC_BUILT_IN,
            sample_rate: config.sample_rate,
            bits_per_sample: sys::i2s_bits_per_sample_t_I2S_BITS_PER_SAMPLE_8BIT,
            channel_format,
            communication_format: sys::i2s_comm_format_t_I2S_COMM_FORMAT_STAND_MSB,
            intr_alloc_flags: 0,
            __bindgen_anon_1: sys::i2s_driver_config_t__bindgen_ty_1 {
                dma_desc_num: config.dma_buffer_count as i32,
            },
            __bindgen_anon_2: sys::i2s_driver_config_t__bindgen_ty_2 {
                dma_frame_num: config.dma_buffer_len as i32,
            },
            use_apll: config.use_apll,
            tx_desc_auto_clear: true,
            ..Default::default()
        };

        // SAFETY: config outlives the call, no event queue requested
        esp!(unsafe { sys::i2s_driver_install(port, &i2s_config, 0, core::ptr::null_mut()) })?;

        let output = Self { port };

        // Null pin config routes I2S0 to the internal DAC.
        // From here on Drop uninstalls the driver if a later step fails.
        esp!(unsafe { sys::i2s_set_pin(port, core::ptr::null()) })?;
        esp!(unsafe { sys::i2s_set_dac_mode(sys::i2s_dac_mode_t_I2S_DAC_CHANNEL_BOTH_EN) })?;
        esp!(unsafe { sys::i2s_zero_dma_buffer(port) })?;

        Ok(output)
    }
}

impl AudioSink for DacOutput {
    fn write(&mut self, buf: &[u8]) -> Result<usize, OutputError> {
        let mut written: usize = 0;

        // SAFETY: buf is valid for buf.len() bytes for the duration of the call
        esp!(unsafe {
            sys::i2s_write(
                self.port,
                buf.as_ptr() as *const c_void,
                buf.len(),
                &mut written,
                BLOCK,
            )
        })?;

        Ok(written)
    }

    fn clear(&mut self) -> Result<(), OutputError> {
        esp!(unsafe { sys::i2s_zero_dma_buffer(self.port) })?;
        Ok(())
    }
}

impl Drop for DacOutput {
    fn drop(&mut self) {
        // SAFETY: driver was installed in configure()
        unsafe {
            sys::i2s_driver_uninstall(self.port);
        }
    }
}
