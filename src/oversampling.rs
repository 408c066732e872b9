use core::sync::atomic::{AtomicU8, Ordering};

/// Pressure oversampling setting.
///
/// Higher settings average more internal samples, which lowers noise and adds
/// resolution to the raw pressure reading at the cost of a longer conversion.
/// Temperature measurements are not affected.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    /// One sample, 16 bit, 4.5 ms conversion.
    UltraLowPower = 0,
    /// Two samples, 17 bit, 7.5 ms conversion.
    Standard = 1,
    /// Four samples, 18 bit, 13.5 ms conversion.
    HighResolution = 2,
    /// Eight samples, 19 bit, 25.5 ms conversion. This is the default.
    #[default]
    UltraHighResolution = 3,
}

/// Returned when converting an integer outside of `0..=3` into [Oversampling].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidOversampling(pub i32);

impl Oversampling {
    /// Control register command that starts a pressure conversion.
    pub const fn command(self) -> u8 {
        0x34 + ((self as u8) << 6)
    }

    /// Time to wait between starting a pressure conversion and reading it back.
    pub const fn conversion_time_ms(self) -> u8 {
        2 + (3 << self as u8)
    }

    /// Right shift that brings the 24 bit data register down to the
    /// resolution of this setting.
    pub const fn raw_pressure_shift(self) -> u8 {
        8 - self as u8
    }

    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::UltraLowPower,
            1 => Self::Standard,
            2 => Self::HighResolution,
            _ => Self::UltraHighResolution,
        }
    }
}

impl TryFrom<i32> for Oversampling {
    type Error = InvalidOversampling;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::UltraLowPower),
            1 => Ok(Self::Standard),
            2 => Ok(Self::HighResolution),
            3 => Ok(Self::UltraHighResolution),
            _ => Err(InvalidOversampling(value)),
        }
    }
}

/// Oversampling setting that can be changed through a shared reference.
///
/// Readers take one snapshot per acquisition, so a change only applies to
/// conversions started after it.
#[derive(Debug)]
pub struct OversamplingConfig(AtomicU8);

impl Default for OversamplingConfig {
    fn default() -> Self {
        Self::new(Oversampling::default())
    }
}

impl OversamplingConfig {
    /// Create a config holding `oversampling`.
    pub const fn new(oversampling: Oversampling) -> Self {
        Self(AtomicU8::new(oversampling as u8))
    }

    /// Current setting.
    pub fn get(&self) -> Oversampling {
        Oversampling::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Replace the setting.
    pub fn set(&self, oversampling: Oversampling) {
        self.0.store(oversampling as u8, Ordering::Relaxed);
    }

    /// Validate `level` and store it. On error the previous value is kept.
    pub fn set_level(&self, level: i32) -> Result<Oversampling, InvalidOversampling> {
        let oversampling = Oversampling::try_from(level)?;
        self.set(oversampling);
        Ok(oversampling)
    }
}
