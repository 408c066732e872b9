use std::sync::{Mutex, MutexGuard, PoisonError};

use hal::blocking::delay::DelayMs;
use hal::blocking::i2c::{Write, WriteRead};
use log::debug;

use crate::{
    Barometer, CalibrationData, Error, InvalidOversampling, Measurement, Oversampling,
    OversamplingConfig, Temperature,
};

/// A [Barometer] that can be used from several threads.
///
/// The bus is held for one conversion at a time by [SharedBarometer::temperature]
/// and [SharedBarometer::pressure], and for both conversions by
/// [SharedBarometer::measure]. Compensation runs after the bus is released.
///
/// ```rust, ignore
/// let barometer = SharedBarometer::new(Barometer::new(i2c, delay)?);
/// std::thread::scope(|s| {
///     s.spawn(|| barometer.measure());
///     s.spawn(|| barometer.measure());
/// });
/// ```
#[derive(Debug)]
pub struct SharedBarometer<I2C, D> {
    barometer: Mutex<Barometer<I2C, D>>,
    calibration: CalibrationData,
    oversampling: OversamplingConfig,
}

impl<I2C, D, E> SharedBarometer<I2C, D>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    D: DelayMs<u8>,
{
    /// Wrap `barometer`, keeping its calibration and oversampling.
    pub fn new(barometer: Barometer<I2C, D>) -> Self {
        SharedBarometer {
            calibration: *barometer.calibration(),
            oversampling: OversamplingConfig::new(barometer.oversampling()),
            barometer: Mutex::new(barometer),
        }
    }

    /// Calibration coefficients of the sensor.
    pub fn calibration(&self) -> &CalibrationData {
        &self.calibration
    }

    /// Current pressure oversampling.
    pub fn oversampling(&self) -> Oversampling {
        self.oversampling.get()
    }

    /// Set the pressure oversampling. Conversions already running keep the
    /// setting they started with.
    pub fn set_oversampling(&self, oversampling: Oversampling) {
        debug!("oversampling set to {:?}", oversampling);
        self.oversampling.set(oversampling);
    }

    /// Set the pressure oversampling from its numeric level `0..=3`.
    pub fn set_precision(&self, level: i32) -> Result<(), Error<E>> {
        let oversampling = self
            .oversampling
            .set_level(level)
            .map_err(|InvalidOversampling(level)| Error::InvalidArgument(level))?;
        debug!("oversampling set to {:?}", oversampling);
        Ok(())
    }

    /// Measure the temperature.
    pub fn temperature(&self) -> Result<Temperature, Error<E>> {
        let raw = self.lock().read_raw_temperature()?;
        Ok(self.calibration.compensate_temperature(raw)?)
    }

    /// Measure the pressure in pascals, compensated with `temperature`.
    ///
    /// Another thread may use the bus between the temperature and this call.
    /// Use [SharedBarometer::measure] when that matters.
    pub fn pressure(&self, temperature: &Temperature) -> Result<i32, Error<E>> {
        let oversampling = self.oversampling.get();
        let raw = self.lock().read_raw_pressure(oversampling)?;
        Ok(self
            .calibration
            .compensate_pressure(raw, temperature.p_bias(), oversampling)?)
    }

    /// Measure the temperature and the pressure without letting another
    /// thread use the bus in between.
    pub fn measure(&self) -> Result<Measurement, Error<E>> {
        let oversampling = self.oversampling.get();
        let (raw_temperature, raw_pressure) = {
            let mut barometer = self.lock();
            let raw_temperature = barometer.read_raw_temperature()?;
            (raw_temperature, barometer.read_raw_pressure(oversampling)?)
        };
        let temperature = self.calibration.compensate_temperature(raw_temperature)?;
        let pressure =
            self.calibration
                .compensate_pressure(raw_pressure, temperature.p_bias(), oversampling)?;
        Ok(Measurement {
            temperature,
            pressure,
        })
    }

    /// Give back the wrapped barometer. The oversampling set through this
    /// wrapper is carried over.
    pub fn into_inner(self) -> Barometer<I2C, D> {
        let barometer = self
            .barometer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        barometer.set_oversampling(self.oversampling.get());
        barometer
    }

    // The barometer holds no state a panicking thread could leave half updated.
    fn lock(&self) -> MutexGuard<'_, Barometer<I2C, D>> {
        self.barometer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
