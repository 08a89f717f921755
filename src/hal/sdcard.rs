//! SD card (SPI) mount and clip files.
//!
//! The card is mounted as FAT under the configured mount point; clips are
//! then plain `std::fs::File`s through the ESP-IDF VFS.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::string::String;

use esp_idf_svc::fs::fatfs::Fatfs;
use esp_idf_svc::hal::gpio::{AnyIOPin, InputPin, OutputPin};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::sd::{spi::SdSpiHostDriver, SdCardConfiguration, SdCardDriver};
use esp_idf_svc::hal::spi::{config::DriverConfig, Dma, SpiAnyPins, SpiDriver};
use esp_idf_svc::io::vfs::MountedFatfs;
use esp_idf_svc::sys::EspError;

use crate::config::SdCardSpec;
use crate::source::{ClipError, ClipSource};

/// SPI DMA transfer size for the card.
const SPI_DMA_BYTES: usize = 4096;

/// Mount the card. The returned guard unmounts on drop; keep it alive.
pub fn mount<'d>(
    spi: impl Peripheral<P = impl SpiAnyPins> + 'd,
    sclk: impl Peripheral<P = impl OutputPin> + 'd,
    mosi: impl Peripheral<P = impl OutputPin> + 'd,
    miso: impl Peripheral<P = impl InputPin + OutputPin> + 'd,
    cs: impl Peripheral<P = impl OutputPin> + 'd,
    spec: &SdCardSpec,
) -> Result<impl Sized + 'd, EspError> {
    let spi_driver = SpiDriver::new(
        spi,
        sclk,
        mosi,
        Some(miso),
        &DriverConfig::default().dma(Dma::Auto(SPI_DMA_BYTES)),
    )?;

    let host = SdSpiHostDriver::new(
        spi_driver,
        Some(cs),
        AnyIOPin::none(), // card detect
        AnyIOPin::none(), // write protect
        AnyIOPin::none(), // interrupt
        None,
    )?;

    let card = SdCardDriver::new_spi(host, &SdCardConfiguration::new())?;

    MountedFatfs::mount(Fatfs::new_sdcard(0, card)?, spec.mount_point, spec.max_open_files)
}

/// Full VFS path of a clip.
pub fn clip_path(spec: &SdCardSpec, path: &str) -> String {
    let mut full = String::with_capacity(spec.mount_point.len() + path.len());
    full.push_str(spec.mount_point);
    full.push_str(path);
    full
}

/// A clip file on the card. Open failures leave an invalid handle.
#[derive(Debug)]
pub struct FileClip {
    file: Option<File>,
}

impl FileClip {
    /// Open `path`. Never fails; check [`ClipSource::is_valid`].
    pub fn open(path: &str) -> Self {
        Self {
            file: File::open(path).ok(),
        }
    }
}

impl ClipSource for FileClip {
    fn is_valid(&self) -> bool {
        self.file.is_some()
    }

    fn rewind(&mut self) -> Result<(), ClipError> {
        let file = self.file.as_mut().ok_or(ClipError::Invalid)?;
        file.seek(SeekFrom::Start(0)).map_err(|_| ClipError::Seek)?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClipError> {
        let file = self.file.as_mut().ok_or(ClipError::Invalid)?;
        loop {
            match file.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => return Err(ClipError::Read),
            }
        }
    }
}
