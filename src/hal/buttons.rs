//! GPIO button inputs.
//!
//! Plain inputs, no internal pulls: the buttons are active-high with
//! external pull-downs (GPIO34..39 have no pull resistors anyway).

use std::vec::Vec;

use esp_idf_svc::hal::gpio::{AnyInputPin, Input, PinDriver};
use esp_idf_svc::sys::EspError;

use crate::buttons::{ButtonInputs, ButtonLevels, MAX_CHANNELS};

/// Button inputs, index N = channel N.
pub struct ButtonBank<'d> {
    pins: Vec<PinDriver<'d, AnyInputPin, Input>>,
}

impl<'d> ButtonBank<'d> {
    /// Configure every pin as an input. Extra pins beyond
    /// [`MAX_CHANNELS`] are ignored.
    pub fn new(pins: impl IntoIterator<Item = AnyInputPin>) -> Result<Self, EspError> {
        let pins = pins
            .into_iter()
            .take(MAX_CHANNELS)
            .map(PinDriver::input)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { pins })
    }

    /// Build from GPIO numbers.
    ///
    /// # Safety
    ///
    /// Each GPIO must be input-capable and not driven by any other driver
    /// for the lifetime of the bank.
    pub unsafe fn from_gpio_numbers(gpios: &[i32]) -> Result<Self, EspError> {
        Self::new(gpios.iter().map(|&gpio| AnyInputPin::new(gpio)))
    }
}

impl ButtonInputs for ButtonBank<'_> {
    fn sample(&mut self) -> ButtonLevels {
        let mut levels = ButtonLevels::ALL_LOW;
        for (idx, pin) in self.pins.iter().enumerate() {
            levels.set(idx, pin.is_high());
        }
        levels
    }
}
