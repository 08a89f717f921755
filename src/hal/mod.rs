//! Hardware Abstraction Layer for RustClipPlayer.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! Business logic stays in core modules, HAL is just I/O.

pub mod buttons;
pub mod dac;
pub mod sdcard;

pub use buttons::ButtonBank;
pub use dac::DacOutput;
pub use sdcard::FileClip;

/// Microseconds since boot.
#[inline]
pub fn now_us() -> i64 {
    // SAFETY: esp_timer_get_time has no preconditions once the scheduler runs
    unsafe { esp_idf_svc::sys::esp_timer_get_time() }
}
