use crate::error::EngineError;
use crate::units::*;

/// Converts an absolute temperature given log-sheet unit tokens (`TempF`, `TempC`).
pub fn convert_temperature_str(
    unit_in: &str,
    unit_out: &str,
    value: f64,
) -> Result<f64, EngineError> {
    let from = parse_temperature_unit(unit_in)?;
    let to = parse_temperature_unit(unit_out)?;
    Ok(convert_temperature(from, to, value))
}

/// Scale-only temperature conversion given unit tokens.
pub fn convert_degrees_str(
    unit_in: &str,
    unit_out: &str,
    value: f64,
) -> Result<f64, EngineError> {
    let from = parse_temperature_unit(unit_in)?;
    let to = parse_temperature_unit(unit_out)?;
    Ok(convert_degrees(from, to, value))
}

/// Converts a pressure given unit tokens such as `PSIG`, `INHG` or `KPA`.
pub fn convert_pressure_str(
    unit_in: &str,
    unit_out: &str,
    value: f64,
) -> Result<f64, EngineError> {
    let from = parse_pressure_unit(unit_in)?;
    let to = parse_pressure_unit(unit_out)?;
    Ok(convert_pressure(from, to, value))
}

pub fn parse_temperature_unit(s: &str) -> Result<TemperatureUnit, EngineError> {
    match s.trim().to_lowercase().as_str() {
        "tempf" | "f" | "°f" => Ok(TemperatureUnit::Fahrenheit),
        "tempc" | "c" | "°c" => Ok(TemperatureUnit::Celsius),
        _ => Err(EngineError::UnknownUnit(s.to_string())),
    }
}

pub fn parse_pressure_unit(s: &str) -> Result<PressureUnit, EngineError> {
    match s.trim().to_lowercase().as_str() {
        "psig" | "psi" => Ok(PressureUnit::Psig),
        "psia" => Ok(PressureUnit::Psia),
        "inhg" | "in hg" => Ok(PressureUnit::Inhg),
        "feet" | "ft" => Ok(PressureUnit::Feet),
        "kpa" => Ok(PressureUnit::Kpa),
        "bar" => Ok(PressureUnit::Bar),
        _ => Err(EngineError::UnknownUnit(s.to_string())),
    }
}
