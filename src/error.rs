use crate::calibration::CalibrationError;

/// Errors returned by the driver.
///
/// `E` is the error type of the underlying I2C bus.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The I2C bus reported an error. Returned as is, the driver never retries.
    I2c(E),
    /// The chip id register did not hold the BMP180 id.
    InvalidChipId(u8),
    /// The calibration coefficients lead to a division by zero during
    /// compensation. The sensor has to be replaced or recalibrated.
    Calibration,
    /// Oversampling level outside of `0..=3`.
    InvalidArgument(i32),
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C bus error: {:?}", e),
            Error::InvalidChipId(id) => write!(f, "unexpected chip id {:#04x}", id),
            Error::Calibration => f.write_str("degenerate calibration coefficients"),
            Error::InvalidArgument(level) => {
                write!(f, "oversampling level {} is outside of 0..=3", level)
            }
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl<E: core::fmt::Debug> std::error::Error for Error<E> {}

impl<E> From<CalibrationError> for Error<E> {
    fn from(_: CalibrationError) -> Self {
        Error::Calibration
    }
}
