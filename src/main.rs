//! RustClipPlayer - Main entry point
//!
//! Startup order:
//! 1. Serial log on UART0
//! 2. Validate configuration
//! 3. Button inputs
//! 4. Mount SD card, open the three clips
//! 5. I2S → built-in DAC
//! 6. Enter the poll loop (never returns)
//!
//! Any failure in 2-5 is fatal: the fault is logged and the task parks.

#[cfg(target_os = "espidf")]
fn main() {
    firmware::main()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!(
        "{} targets ESP-IDF (xtensa-esp32-espidf); the core library is testable on the host with `cargo test`",
        env!("VERSION_STRING")
    );
}

#[cfg(target_os = "espidf")]
mod firmware {
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::gpio::AnyIOPin;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::uart::UartTxDriver;
    use esp_idf_svc::sys as esp_idf_sys;

    use rust_clip_player::{
        diag_debug, diag_error, diag_info,
        dispatcher::verify_channels,
        fault::{FaultCode, FaultState},
        hal::{self, sdcard, ButtonBank, DacOutput, FileClip},
        serial_log::{self, DropReporter, SerialLogConfig},
        AudioChannel, ClipSource, Dispatcher, Player, Volume, CHUNK_SIZE, CONFIG, DIAG_LOG,
    };

    static FAULT: FaultState = FaultState::new();

    /// Idle period of the halt loop.
    const HALT_DELAY_MS: u32 = 1000;

    pub fn main() {
        // Initialize ESP-IDF
        esp_idf_sys::link_patches();

        let Ok(peripherals) = Peripherals::take() else {
            // Nothing to log to yet
            park();
        };

        let mut uart = serial_log::init_serial_log(
            peripherals.uart0,
            peripherals.pins.gpio1,
            &SerialLogConfig::default(),
        )
        .ok();
        let mut reporter = DropReporter::new();

        diag_info!(DIAG_LOG, hal::now_us(), "{} ({})", env!("VERSION_STRING"), env!("GIT_HASH"));

        if let Err(e) = CONFIG.validate() {
            diag_error!(DIAG_LOG, hal::now_us(), "config: {}", e);
            halt(FaultCode::InvalidConfig, 0, &mut uart, &mut reporter);
        }

        let gpios = CONFIG.channels.map(|spec| spec.pin);
        // SAFETY: button GPIOs are not used by any other driver
        let mut buttons = match unsafe { ButtonBank::from_gpio_numbers(&gpios) } {
            Ok(buttons) => buttons,
            Err(e) => halt(FaultCode::InputInit, e.code() as u32, &mut uart, &mut reporter),
        };

        let sd = &CONFIG.sd;
        // SAFETY: SD GPIOs are reserved for the card and not used elsewhere
        let (sclk, mosi, miso, cs) = unsafe {
            (
                AnyIOPin::new(sd.sclk_pin),
                AnyIOPin::new(sd.mosi_pin),
                AnyIOPin::new(sd.miso_pin),
                AnyIOPin::new(sd.cs_pin),
            )
        };
        let _mounted = match sdcard::mount(peripherals.spi3, sclk, mosi, miso, cs, sd) {
            Ok(mounted) => mounted,
            Err(e) => {
                diag_error!(DIAG_LOG, hal::now_us(), "SD mount: {}", e);
                halt(FaultCode::StorageMount, e.code() as u32, &mut uart, &mut reporter);
            }
        };

        let channels = CONFIG.channels.map(|spec| {
            let path = sdcard::clip_path(sd, spec.path);
            let clip = FileClip::open(&path);
            if !clip.is_valid() {
                diag_error!(DIAG_LOG, hal::now_us(), "couldn't open {}", path);
            }
            AudioChannel::new(spec.name, spec.pin, clip)
        });
        if let Err(idx) = verify_channels(&channels) {
            halt(FaultCode::ClipOpen, idx as u32, &mut uart, &mut reporter);
        }

        let output_config = CONFIG.output_config();
        let dac = match DacOutput::configure(&output_config) {
            Ok(dac) => dac,
            Err(e) => {
                diag_error!(DIAG_LOG, hal::now_us(), "I2S: {}", e);
                let code = match e {
                    rust_clip_player::OutputError::Driver(code) => code as u32,
                    _ => 0,
                };
                halt(FaultCode::OutputInit, code, &mut uart, &mut reporter);
            }
        };

        diag_debug!(
            DIAG_LOG,
            hal::now_us(),
            "I2S0 -> DAC: {} Hz, {}x{} DMA ({} bytes)",
            output_config.sample_rate,
            output_config.dma_buffer_count,
            output_config.dma_buffer_len,
            output_config.dma_bytes()
        );

        let player: Player<_, CHUNK_SIZE> = Player::new(dac, Volume::from_factor(CONFIG.volume));
        let mut dispatcher = Dispatcher::new(channels, player, &DIAG_LOG, hal::now_us as fn() -> i64)
            .with_output_config(output_config);

        diag_info!(DIAG_LOG, hal::now_us(), "Setup completed. Waiting for button to be pressed...");

        dispatcher.run(&mut buttons, |d| {
            if let Some(uart) = uart.as_mut() {
                serial_log::drain_to_uart(uart, d.log(), &mut reporter, d.now_us());
            }
            FreeRtos::delay_ms(CONFIG.poll_interval_ms);
        })
    }

    /// Record the fault, flush the log and stop here for good.
    fn halt(code: FaultCode, data: u32, uart: &mut Option<UartTxDriver<'_>>, reporter: &mut DropReporter) -> ! {
        FAULT.set(code, data);
        let snap = FAULT.snapshot();
        diag_error!(DIAG_LOG, hal::now_us(), "FAULT: {} (data={})", snap.code, snap.data);

        if let Some(uart) = uart.as_mut() {
            serial_log::drain_to_uart(uart, &DIAG_LOG, reporter, hal::now_us());
        }

        park()
    }

    fn park() -> ! {
        loop {
            FreeRtos::delay_ms(HALT_DELAY_MS);
        }
    }
}
