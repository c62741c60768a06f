//! Unit definitions and conversions for chiller readings.

pub mod pressure;
pub mod temperature;

pub use pressure::{convert_pressure, from_psig, to_psig, PressureUnit, ALL_PRESSURE_UNITS};
pub use temperature::{
    convert_degrees, convert_temperature, from_fahrenheit, to_fahrenheit, TemperatureUnit,
};
