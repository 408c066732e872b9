//! I2C driver for the Bosch BMP180 pressure and temperature sensor. The
//! register map is shared with the older BMP085, which should work as well.
//!
//! The sensor lives at I2C address 0x77. Create a [Barometer] with the bus and
//! a delay provider; the calibration coefficients are read once at that point.
//!
//! ```rust, ignore
//! use bmp180::*;
//!
//! let mut barometer = Barometer::new(i2c, delay).expect("Failed to instantiate barometer");
//! let temperature = barometer.temperature().unwrap();
//! let pressure = barometer.pressure(&temperature).unwrap();
//! ```
//!
//! Pressure compensation depends on the temperature, which is why
//! [Barometer::pressure] takes a [Temperature]. [Barometer::measure] samples
//! both in one go:
//!
//! ```rust, ignore
//! let measurement = barometer.measure().unwrap();
//! println!("{} °C, {} hPa", measurement.temperature.celsius(), measurement.hectopascals());
//! ```
//!
//! The pressure oversampling trades conversion time for resolution:
//!
//! ```rust, ignore
//! barometer.set_oversampling(Oversampling::Standard);
//! ```
//!
//! With the `std` feature, [SharedBarometer] allows using one sensor from
//! several threads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate embedded_hal as hal;

mod calibration;
mod error;
mod oversampling;
#[cfg(any(test, feature = "std"))]
mod shared;

pub use calibration::{
    CalibrationData, CalibrationError, Measurement, Temperature, CALIBRATION_LEN,
};
pub use error::Error;
pub use oversampling::{InvalidOversampling, Oversampling, OversamplingConfig};
#[cfg(any(test, feature = "std"))]
pub use shared::SharedBarometer;

use hal::blocking::delay::DelayMs;
use hal::blocking::i2c::{Write, WriteRead};
use log::{debug, trace};

const ADDR: u8 = 0x77;
const CHIP_ID_REG: u8 = 0xD0;
const CALIBRATION_REG: u8 = 0xAA;
const CTRL_MEAS: u8 = 0xF4;
const DATA: u8 = 0xF6;

const CHIP_ID: u8 = 0x55;
const MEASURE_TEMPERATURE: u8 = 0x2E;
const TEMPERATURE_CONVERSION_MS: u8 = 5;

/// The BMP180 barometer.
///
/// This struct is generic over the I2C bus and the delay provider. Every
/// method that touches the bus takes `&mut self`, so a conversion can not be
/// interleaved with another one.
#[derive(Debug)]
pub struct Barometer<I2C, D> {
    i2c: I2C,
    delay: D,
    calibration: CalibrationData,
    oversampling: OversamplingConfig,
}

impl<I2C, D, E> Barometer<I2C, D>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u8>,
{
    /// Create a new instance of the barometer.
    ///
    /// Checks the chip id and reads the calibration coefficients. Pressure
    /// oversampling starts at [Oversampling::UltraHighResolution].
    pub fn new(i2c: I2C, delay: D) -> Result<Self, Error<E>> {
        let mut barometer = Barometer {
            i2c,
            delay,
            calibration: CalibrationData::default(),
            oversampling: OversamplingConfig::default(),
        };
        let id = barometer.chip_id()?;
        if id != CHIP_ID {
            return Err(Error::InvalidChipId(id));
        }
        barometer.calibration = barometer.read_calibration_data()?;
        debug!("BMP180 calibration: {:?}", barometer.calibration);
        Ok(barometer)
    }

    /// Content of the chip id register, `0x55` for a BMP180.
    pub fn chip_id(&mut self) -> Result<u8, Error<E>> {
        self.read8(CHIP_ID_REG)
    }

    /// Calibration coefficients read at construction.
    pub fn calibration(&self) -> &CalibrationData {
        &self.calibration
    }

    /// Current pressure oversampling.
    pub fn oversampling(&self) -> Oversampling {
        self.oversampling.get()
    }

    /// Set the pressure oversampling used by the next pressure conversion.
    pub fn set_oversampling(&self, oversampling: Oversampling) {
        debug!("oversampling set to {:?}", oversampling);
        self.oversampling.set(oversampling);
    }

    /// Set the pressure oversampling from its numeric level `0..=3`.
    ///
    /// Anything else fails with [Error::InvalidArgument] and keeps the
    /// current setting.
    pub fn set_precision(&self, level: i32) -> Result<(), Error<E>> {
        let oversampling = self
            .oversampling
            .set_level(level)
            .map_err(|InvalidOversampling(level)| Error::InvalidArgument(level))?;
        debug!("oversampling set to {:?}", oversampling);
        Ok(())
    }

    /// Start a temperature conversion and read back the raw value.
    pub fn read_raw_temperature(&mut self) -> Result<u16, Error<E>> {
        self.write(&[CTRL_MEAS, MEASURE_TEMPERATURE])?;
        self.delay.delay_ms(TEMPERATURE_CONVERSION_MS);
        let raw = self.read16(DATA)?;
        trace!("raw temperature {}", raw);
        Ok(raw)
    }

    /// Start a pressure conversion with `oversampling` and read back the raw
    /// value, shifted down to the resolution of that setting.
    pub fn read_raw_pressure(&mut self, oversampling: Oversampling) -> Result<u32, Error<E>> {
        self.write(&[CTRL_MEAS, oversampling.command()])?;
        self.delay.delay_ms(oversampling.conversion_time_ms());
        let raw = self.read24(DATA)? >> oversampling.raw_pressure_shift();
        trace!("raw pressure {} ({:?})", raw, oversampling);
        Ok(raw)
    }

    /// Measure the temperature.
    ///
    /// The result also carries the term [Barometer::pressure] needs.
    pub fn temperature(&mut self) -> Result<Temperature, Error<E>> {
        let raw = self.read_raw_temperature()?;
        Ok(self.calibration.compensate_temperature(raw)?)
    }

    /// Measure the pressure in pascals, compensated with `temperature`.
    ///
    /// `temperature` should be recent, the sensor itself does not track it.
    pub fn pressure(&mut self, temperature: &Temperature) -> Result<i32, Error<E>> {
        let oversampling = self.oversampling.get();
        let raw = self.read_raw_pressure(oversampling)?;
        Ok(self
            .calibration
            .compensate_pressure(raw, temperature.p_bias(), oversampling)?)
    }

    /// Measure the temperature, then the pressure compensated with it.
    pub fn measure(&mut self) -> Result<Measurement, Error<E>> {
        let temperature = self.temperature()?;
        let pressure = self.pressure(&temperature)?;
        Ok(Measurement {
            temperature,
            pressure,
        })
    }

    /// Destroy the driver and give back the bus and the delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn read_calibration_data(&mut self) -> Result<CalibrationData, Error<E>> {
        let mut data = [0; CALIBRATION_LEN];
        self.read(CALIBRATION_REG, &mut data)?;
        Ok(CalibrationData::from_bytes(&data))
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Error<E>> {
        self.i2c.write(ADDR, data).map_err(Error::I2c)
    }

    fn read(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Error<E>> {
        self.i2c.write_read(ADDR, &[reg], buffer).map_err(Error::I2c)
    }

    fn read8(&mut self, reg: u8) -> Result<u8, Error<E>> {
        let mut buffer = [0u8];
        self.read(reg, &mut buffer)?;
        Ok(buffer[0])
    }

    fn read16(&mut self, reg: u8) -> Result<u16, Error<E>> {
        let mut buffer = [0u8; 2];
        self.read(reg, &mut buffer)?;
        Ok(u16::from_be_bytes(buffer))
    }

    fn read24(&mut self, reg: u8) -> Result<u32, Error<E>> {
        let mut buffer = [0; 3];
        self.read(reg, &mut buffer)?;
        let [msb, lsb, xlsb] = buffer.map(u32::from);
        Ok((msb << 16) | (lsb << 8) | xlsb)
    }
}
