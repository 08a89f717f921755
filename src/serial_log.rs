//! Serial log output on UART0.
//!
//! Formats drained [`LogEntry`] values as text lines and writes them to the
//! UART the USB bridge is wired to.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32 GPIO1 (U0TXD) ──────▶ on-board USB-UART
//!                              └─▶ PC Serial Monitor @ 115200
//! ```
//!
//! Draining happens between input ticks, so nothing is written to the UART
//! while a clip is streaming.

use crate::logging::{LogEntry, LogStream};

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::peripheral::Peripheral;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::uart::{self, UartTxDriver};

/// Formatted line buffer size.
pub const LINE_BUF_LEN: usize = 160;

/// Interval between dropped-message reports.
pub const DROPPED_REPORT_INTERVAL_US: i64 = 10_000_000;

/// UART configuration for logging.
pub struct SerialLogConfig {
    pub baud_rate: u32,
}

impl Default for SerialLogConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115200,
        }
    }
}

/// Format log entry to a line.
///
/// Format: `[timestamp_us] LEVEL: message\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    crate::logging::format_to_buffer(
        buf,
        format_args!(
            "[{:10}] {}: {}\n",
            entry.timestamp_us,
            entry.level.as_str(),
            entry.message()
        ),
    )
}

/// Tracks when the dropped-message counter was last reported.
#[derive(Debug, Default)]
pub struct DropReporter {
    last_report_us: i64,
}

impl DropReporter {
    pub const fn new() -> Self {
        Self { last_report_us: 0 }
    }

    /// Produce a report line if the interval elapsed and messages were lost.
    ///
    /// Resets the stream's dropped counter when a report is produced.
    pub fn poll<const N: usize>(&mut self, stream: &LogStream<N>, now_us: i64, buf: &mut [u8]) -> Option<usize> {
        if now_us - self.last_report_us < DROPPED_REPORT_INTERVAL_US {
            return None;
        }
        self.last_report_us = now_us;

        let dropped = stream.dropped();
        if dropped == 0 {
            return None;
        }
        stream.reset_dropped();

        Some(crate::logging::format_to_buffer(
            buf,
            format_args!("[{:10}] WARN: log dropped {} messages\n", now_us, dropped),
        ))
    }
}

/// Initialize UART0 TX-only for logging output.
#[cfg(target_os = "espidf")]
pub fn init_serial_log<'d>(
    uart: impl Peripheral<P = esp_idf_svc::hal::uart::UART0> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    config: &SerialLogConfig,
) -> Result<UartTxDriver<'d>, esp_idf_svc::sys::EspError> {
    let uart_config = uart::config::Config::default()
        .baudrate(esp_idf_svc::hal::units::Hertz(config.baud_rate));

    UartTxDriver::new(
        uart,
        tx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )
}

/// Write everything pending in `stream` through `write`, one line per call,
/// followed by a dropped-message report when one is due.
///
/// Output errors are the writer's business: diagnostics are best-effort.
pub fn drain_lines<const N: usize, F: FnMut(&[u8])>(
    stream: &LogStream<N>,
    reporter: &mut DropReporter,
    now_us: i64,
    mut write: F,
) -> usize {
    let mut line = [0u8; LINE_BUF_LEN];
    let mut lines = 0;

    while let Some(entry) = stream.drain() {
        let len = format_log_entry(&entry, &mut line);
        write(&line[..len]);
        lines += 1;
    }

    if let Some(len) = reporter.poll(stream, now_us, &mut line) {
        write(&line[..len]);
        lines += 1;
    }

    lines
}

/// Drain `stream` to the UART. Write errors are ignored.
#[cfg(target_os = "espidf")]
pub fn drain_to_uart<const N: usize>(
    uart: &mut UartTxDriver<'_>,
    stream: &LogStream<N>,
    reporter: &mut DropReporter,
    now_us: i64,
) {
    drain_lines(stream, reporter, now_us, |line| {
        let _ = uart.write(line);
    });
}
