//! Linear volume scaling for unsigned 8-bit PCM.
//!
//! Samples are offset-binary: 128 is silence, 0 and 255 are the rails.
//! Scaling happens around the midpoint and saturates at the rails, so a
//! factor above 1.0 clips instead of wrapping.
//!
//! The 256 possible outputs are computed once into a lookup table; the
//! pipeline then scales a chunk with one table read per byte.

/// Number of entries in the gain table (one per u8 value).
pub const GAIN_LUT_SIZE: usize = 256;

/// Offset-binary midpoint (silence).
pub const PCM_U8_MIDPOINT: i16 = 128;

/// Scale a single sample.
///
/// `clamp(round((b - 128) * factor) + 128, 0, 255)`, rounding half away
/// from zero. Silence stays silence for any factor, infinite included.
#[inline]
pub fn scale_sample(sample: u8, factor: f32) -> u8 {
    let centered = (sample as i16 - PCM_U8_MIDPOINT) as f32;
    let scaled = libm::roundf(centered * factor);
    let out = scaled + PCM_U8_MIDPOINT as f32;

    // 0 * inf
    if out.is_nan() {
        PCM_U8_MIDPOINT as u8
    } else if out <= 0.0 {
        0
    } else if out >= 255.0 {
        255
    } else {
        out as u8
    }
}

/// Volume factor with its precomputed gain table.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    factor: f32,
    lut: [u8; GAIN_LUT_SIZE],
}

impl Volume {
    /// Create a volume from a linear factor.
    ///
    /// Negative and NaN factors mute. An infinite factor is capped at
    /// `f32::MAX`: every non-silent sample saturates, silence stays at 128.
    pub fn from_factor(factor: f32) -> Self {
        let factor = if factor.is_nan() || factor < 0.0 {
            0.0
        } else {
            factor.min(f32::MAX)
        };

        let mut lut = [0u8; GAIN_LUT_SIZE];
        for (value, slot) in lut.iter_mut().enumerate() {
            *slot = scale_sample(value as u8, factor);
        }

        Self { factor, lut }
    }

    /// Pass-through (factor 1.0).
    pub fn unity() -> Self {
        Self::from_factor(1.0)
    }

    /// Silence (factor 0.0).
    pub fn mute() -> Self {
        Self::from_factor(0.0)
    }

    /// Effective linear factor after sanitizing.
    #[inline]
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// True if the table maps every sample to itself.
    pub fn is_unity(&self) -> bool {
        self.lut
            .iter()
            .enumerate()
            .all(|(value, &out)| value as u8 == out)
    }

    /// Scale one sample through the table.
    #[inline]
    pub fn apply(&self, sample: u8) -> u8 {
        self.lut[sample as usize]
    }

    /// Scale a buffer in place.
    #[inline]
    pub fn apply_in_place(&self, samples: &mut [u8]) {
        for sample in samples.iter_mut() {
            *sample = self.lut[*sample as usize];
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::unity()
    }
}
