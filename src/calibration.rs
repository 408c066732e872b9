use crate::oversampling::Oversampling;

/// Size of the calibration block in the sensor's EEPROM.
pub const CALIBRATION_LEN: usize = 22;

/// Factory calibration coefficients.
///
/// Every sensor is trimmed individually and stores the result in its EEPROM.
/// The coefficients are read once when the driver is created and never change
/// afterwards.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub struct CalibrationData {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

/// The calibration coefficients make the compensation divide by zero.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationError;

/// A compensated temperature reading.
///
/// Besides the temperature itself this carries the temperature dependent term
/// needed to compensate a pressure reading. Pass it to the pressure methods
/// of the driver.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature {
    tenths_celsius: i32,
    p_bias: i32,
}

impl Temperature {
    /// Temperature in 0.1 °C steps, e.g. `150` is 15.0 °C.
    pub fn tenths_celsius(&self) -> i32 {
        self.tenths_celsius
    }

    /// Temperature in degrees celsius.
    pub fn celsius(&self) -> f32 {
        self.tenths_celsius as f32 / 10.0
    }

    /// Pressure compensation term derived from this temperature (`B6` in the
    /// datasheet).
    pub fn p_bias(&self) -> i32 {
        self.p_bias
    }
}

/// A temperature and the pressure compensated with it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Temperature sampled right before the pressure.
    pub temperature: Temperature,
    /// Pressure in pascals.
    pub pressure: i32,
}

impl Measurement {
    /// Pressure in hectopascals (millibars).
    pub fn hectopascals(&self) -> f32 {
        self.pressure as f32 / 100.0
    }
}

impl CalibrationData {
    /// Decode the EEPROM block: eleven big endian words starting with AC1.
    pub fn from_bytes(bytes: &[u8; CALIBRATION_LEN]) -> Self {
        let word = |i: usize| u16::from_be_bytes([bytes[2 * i], bytes[2 * i + 1]]);
        CalibrationData {
            ac1: word(0) as i16,
            ac2: word(1) as i16,
            ac3: word(2) as i16,
            ac4: word(3),
            ac5: word(4),
            ac6: word(5),
            b1: word(6) as i16,
            b2: word(7) as i16,
            mb: word(8) as i16,
            mc: word(9) as i16,
            md: word(10) as i16,
        }
    }

    /// Convert a raw temperature reading.
    ///
    /// Integer algorithm from the datasheet. Fails if `X1 + MD` is zero.
    pub fn compensate_temperature(&self, raw: u16) -> Result<Temperature, CalibrationError> {
        let x1 = (i32::from(raw) - i32::from(self.ac6)).wrapping_mul(i32::from(self.ac5)) >> 15;
        let divisor = x1 + i32::from(self.md);
        if divisor == 0 {
            return Err(CalibrationError);
        }
        let x2 = (i32::from(self.mc) << 11) / divisor;
        let b5 = x1 + x2;
        Ok(Temperature {
            tenths_celsius: (b5 + 8) >> 4,
            p_bias: b5 - 4000,
        })
    }

    /// Convert a raw pressure reading to pascals.
    ///
    /// `raw` must have been sampled with `oversampling` and already shifted
    /// down to its resolution. `p_bias` comes from [Temperature::p_bias].
    /// Fails if the coefficients make `B4` zero.
    pub fn compensate_pressure(
        &self,
        raw: u32,
        p_bias: i32,
        oversampling: Oversampling,
    ) -> Result<i32, CalibrationError> {
        let oss = oversampling as u32;
        let b6 = p_bias;
        let b6_sq = b6.wrapping_mul(b6) >> 12;

        let x1 = i32::from(self.b2).wrapping_mul(b6_sq) >> 11;
        let x2 = i32::from(self.ac2).wrapping_mul(b6) >> 11;
        let x3 = x1.wrapping_add(x2);
        let b3 = ((i32::from(self.ac1) * 4).wrapping_add(x3) << oss).wrapping_add(2) / 4;

        let x1 = i32::from(self.ac3).wrapping_mul(b6) >> 13;
        let x2 = i32::from(self.b1).wrapping_mul(b6_sq) >> 16;
        let x3 = x1.wrapping_add(x2).wrapping_add(2) >> 2;
        let b4: u32 = u32::from(self.ac4).wrapping_mul(x3.wrapping_add(32768) as u32) >> 15;
        if b4 == 0 {
            return Err(CalibrationError);
        }
        let b7: u32 = raw.wrapping_sub(b3 as u32).wrapping_mul(50000 >> oss);

        // B7 * 2 would not fit into 32 bits
        let mut p = (if b7 < 0x8000_0000 {
            (b7 * 2) / b4
        } else {
            (b7 / b4).wrapping_mul(2)
        }) as i32;

        let x1 = (p >> 8).wrapping_mul(p >> 8);
        let x1 = x1.wrapping_mul(3038) >> 16;
        let x2 = (-7357i32).wrapping_mul(p) >> 16;
        p = p.wrapping_add(x1.wrapping_add(x2).wrapping_add(3791) >> 4);
        Ok(p)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Example coefficients from the datasheet.
    pub(crate) const DATASHEET: CalibrationData = CalibrationData {
        ac1: 408,
        ac2: -72,
        ac3: -14383,
        ac4: 32741,
        ac5: 32757,
        ac6: 23153,
        b1: 6190,
        b2: 4,
        mb: -32768,
        mc: -8711,
        md: 2868,
    };

    /// [DATASHEET] as stored in the EEPROM.
    pub(crate) const DATASHEET_BYTES: [u8; CALIBRATION_LEN] = [
        0x01, 0x98, // AC1
        0xff, 0xb8, // AC2
        0xc7, 0xd1, // AC3
        0x7f, 0xe5, // AC4
        0x7f, 0xf5, // AC5
        0x5a, 0x71, // AC6
        0x18, 0x2e, // B1
        0x00, 0x04, // B2
        0x80, 0x00, // MB
        0xdd, 0xf9, // MC
        0x0b, 0x34, // MD
    ];

    #[test]
    fn test_from_bytes() {
        assert_eq!(CalibrationData::from_bytes(&DATASHEET_BYTES), DATASHEET);
    }

    #[test]
    fn test_from_bytes_word_order() {
        let mut bytes = [0u8; CALIBRATION_LEN];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let cal = CalibrationData::from_bytes(&bytes);
        assert_eq!(cal.ac1, 0x0001);
        assert_eq!(cal.ac4, 0x0607);
        assert_eq!(cal.b1, 0x0c0d);
        assert_eq!(cal.md, 0x1415);
    }

    #[test]
    fn test_datasheet_temperature() {
        let temperature = DATASHEET.compensate_temperature(27898).unwrap();
        assert_eq!(temperature.tenths_celsius(), 150);
        assert_eq!(temperature.p_bias(), -1600);
        assert_eq!(temperature.celsius(), 15.0);
    }

    #[test]
    fn test_datasheet_pressure() {
        let pressure = DATASHEET
            .compensate_pressure(23843, -1600, Oversampling::UltraLowPower)
            .unwrap();
        assert_eq!(pressure, 69964);
    }

    #[test]
    fn test_pressure_with_oversampling() {
        let cases = [
            (Oversampling::Standard, 47723, 70018),
            (Oversampling::HighResolution, 95520, 70073),
            (Oversampling::UltraHighResolution, 191186, 70129),
        ];
        for (oversampling, raw, expected) in cases {
            let pressure = DATASHEET.compensate_pressure(raw, -1600, oversampling);
            assert_eq!(pressure, Ok(expected), "{:?}", oversampling);
        }
    }

    #[test]
    fn test_temperature_is_deterministic() {
        let first = DATASHEET.compensate_temperature(30000).unwrap();
        assert_eq!(first.tenths_celsius(), 313);
        assert_eq!(first.p_bias(), 1008);
        for _ in 0..3 {
            assert_eq!(DATASHEET.compensate_temperature(30000), Ok(first));
        }
    }

    #[test]
    fn test_temperature_division_by_zero() {
        // X1 is 4743 for this raw value
        let cal = CalibrationData { md: -4743, ..DATASHEET };
        assert_eq!(cal.compensate_temperature(27898), Err(CalibrationError));
    }

    #[test]
    fn test_pressure_raw_below_b3() {
        // B3 is 422 here, so B7 wraps to 0xfebe0a20 and 0xffff3cb0 and takes
        // the divide first path
        let cases = [(0, 252712), (421, 253990)];
        for (raw, expected) in cases {
            let pressure = DATASHEET.compensate_pressure(raw, -1600, Oversampling::UltraLowPower);
            assert_eq!(pressure, Ok(expected), "raw {}", raw);
        }
    }

    #[test]
    fn test_pressure_tiny_b4_wraps() {
        let cal = CalibrationData { ac4: 1, ..DATASHEET };
        let temperature = cal.compensate_temperature(27898).unwrap();
        assert_eq!(
            cal.compensate_pressure(0, temperature.p_bias(), Oversampling::UltraLowPower),
            Ok(-42198916)
        );
    }

    #[test]
    fn test_pressure_division_by_zero() {
        let cal = CalibrationData { ac4: 0, ..DATASHEET };
        assert_eq!(
            cal.compensate_pressure(23843, -1600, Oversampling::UltraLowPower),
            Err(CalibrationError)
        );
    }
}
