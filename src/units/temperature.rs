use serde::{Deserialize, Serialize};

/// Temperature units found on chiller log sheets. The internal pivot is °F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "TempF")]
    Fahrenheit,
    #[serde(rename = "TempC")]
    Celsius,
}

/// Offset of the log-sheet Celsius scale. Loss thresholds are calibrated
/// against it; it is not the textbook `×1.8 + 32` form.
const CELSIUS_OFFSET: f64 = 17.8;
const SCALE: f64 = 1.8;

/// Converts a value to °F.
pub fn to_fahrenheit(value: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Fahrenheit => value,
        TemperatureUnit::Celsius => (value + CELSIUS_OFFSET) * SCALE,
    }
}

/// Converts a °F value to the requested unit.
pub fn from_fahrenheit(value_f: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Fahrenheit => value_f,
        TemperatureUnit::Celsius => value_f / SCALE - CELSIUS_OFFSET,
    }
}

/// Converts an absolute temperature between units.
pub fn convert_temperature(from: TemperatureUnit, to: TemperatureUnit, value: f64) -> f64 {
    from_fahrenheit(to_fahrenheit(value, from), to)
}

/// Scale-only conversion for temperature differences (approach allowances and
/// the like). No offset is applied in either direction.
pub fn convert_degrees(from: TemperatureUnit, to: TemperatureUnit, value: f64) -> f64 {
    match (from, to) {
        (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => value * SCALE,
        (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => value / SCALE,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn celsius_uses_log_sheet_offset() {
        // (29.4 + 17.8) * 1.8
        assert_abs_diff_eq!(
            convert_temperature(TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit, 29.4),
            84.96,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            convert_temperature(TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius, 85.0),
            85.0 / 1.8 - 17.8,
            epsilon = 1e-12
        );
    }

    #[test]
    fn round_trip_is_identity() {
        for t in [-40.0, 0.0, 32.0, 44.0, 85.0, 212.5, 1234.567] {
            let c = convert_temperature(TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius, t);
            let back = convert_temperature(TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit, c);
            assert_abs_diff_eq!(back, t, epsilon = 1e-9);
        }
    }

    #[test]
    fn degrees_are_scale_only() {
        assert_abs_diff_eq!(
            convert_degrees(TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit, 5.0),
            9.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            convert_degrees(TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius, 1.0),
            1.0 / 1.8,
            epsilon = 1e-12
        );
        assert_eq!(
            convert_degrees(TemperatureUnit::Fahrenheit, TemperatureUnit::Fahrenheit, 3.0),
            3.0
        );
    }
}
