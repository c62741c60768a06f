use tracing::warn;

use super::tables::{ReferenceTables, SaturationRecord};
use crate::error::EngineError;
use crate::units::{
    from_fahrenheit, from_psig, to_fahrenheit, to_psig, PressureUnit, TemperatureUnit,
};

/// Greatest saturation record whose pressure does not exceed `pressure_psig`.
/// Never interpolates.
pub fn find_by_pressure(
    tables: &dyn ReferenceTables,
    refrigerant: &str,
    pressure_psig: f64,
) -> Result<SaturationRecord, EngineError> {
    tables
        .saturation_at_or_below_pressure(refrigerant, pressure_psig)
        .ok_or_else(|| {
            warn!(refrigerant, pressure_psig, "no saturation record at or below pressure");
            EngineError::saturation_not_found(refrigerant, format!("{pressure_psig} PSIG"))
        })
}

/// Greatest saturation record whose temperature does not exceed the query.
/// The query is rounded to 0.1°F first to match table granularity.
pub fn find_by_temperature(
    tables: &dyn ReferenceTables,
    refrigerant: &str,
    temperature_f: f64,
) -> Result<SaturationRecord, EngineError> {
    let rounded = round_to_tenth(temperature_f);
    tables
        .saturation_at_or_below_temperature(refrigerant, rounded)
        .ok_or_else(|| {
            warn!(
                refrigerant,
                temperature_f = rounded,
                "no saturation record at or below temperature"
            );
            EngineError::saturation_not_found(refrigerant, format!("{rounded} °F"))
        })
}

fn round_to_tenth(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Saturation temperature for a gauge reading taken at altitude.
///
/// `altitude_correction_psig` is subtracted from the gauge value to bring it
/// onto the sea-level curve. The result is returned in `out_unit`.
pub fn saturation_temperature(
    tables: &dyn ReferenceTables,
    refrigerant: &str,
    pressure: f64,
    unit: PressureUnit,
    altitude_correction_psig: f64,
    out_unit: TemperatureUnit,
) -> Result<f64, EngineError> {
    let psig = to_psig(pressure, unit) - altitude_correction_psig;
    let rec = find_by_pressure(tables, refrigerant, psig)?;
    Ok(from_fahrenheit(rec.temperature_f, out_unit))
}

/// Saturation pressure for a refrigerant temperature, returned in `out_unit`.
pub fn saturation_pressure(
    tables: &dyn ReferenceTables,
    refrigerant: &str,
    temperature: f64,
    unit: TemperatureUnit,
    out_unit: PressureUnit,
) -> Result<f64, EngineError> {
    let rec = find_by_temperature(tables, refrigerant, to_fahrenheit(temperature, unit))?;
    Ok(from_psig(rec.pressure_psig, out_unit))
}
