use serde::{Deserialize, Serialize};

/// Pressure units used by chiller gauges and log sheets.
/// The internal pivot is always PSIG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PressureUnit {
    Psig,
    Psia,
    /// Inches of mercury.
    Inhg,
    /// Feet of water column.
    Feet,
    Kpa,
    Bar,
}

pub const ALL_PRESSURE_UNITS: [PressureUnit; 6] = [
    PressureUnit::Psig,
    PressureUnit::Psia,
    PressureUnit::Inhg,
    PressureUnit::Feet,
    PressureUnit::Kpa,
    PressureUnit::Bar,
];

const ATM_PSI: f64 = 14.7;
const INHG_PER_PSIG: f64 = 2.036;
const FEET_PER_PSIG: f64 = 0.4335;
const KPA_PER_PSIG: f64 = 6.985;
const BAR_PER_PSIG: f64 = 14.503;

impl PressureUnit {
    /// Log-sheet token, e.g. `PSIG` or `KPA`.
    pub fn token(self) -> &'static str {
        match self {
            PressureUnit::Psig => "PSIG",
            PressureUnit::Psia => "PSIA",
            PressureUnit::Inhg => "INHG",
            PressureUnit::Feet => "FEET",
            PressureUnit::Kpa => "KPA",
            PressureUnit::Bar => "BAR",
        }
    }
}

/// Converts a pressure to PSIG.
pub fn to_psig(value: f64, unit: PressureUnit) -> f64 {
    match unit {
        PressureUnit::Psig => value,
        PressureUnit::Psia => value - ATM_PSI,
        PressureUnit::Inhg => value / INHG_PER_PSIG,
        PressureUnit::Feet => value / FEET_PER_PSIG,
        PressureUnit::Kpa => value / KPA_PER_PSIG,
        PressureUnit::Bar => value / BAR_PER_PSIG,
    }
}

/// Converts a PSIG value to the requested unit.
pub fn from_psig(value_psig: f64, unit: PressureUnit) -> f64 {
    match unit {
        PressureUnit::Psig => value_psig,
        PressureUnit::Psia => value_psig + ATM_PSI,
        PressureUnit::Inhg => value_psig * INHG_PER_PSIG,
        PressureUnit::Feet => value_psig * FEET_PER_PSIG,
        PressureUnit::Kpa => value_psig * KPA_PER_PSIG,
        PressureUnit::Bar => value_psig * BAR_PER_PSIG,
    }
}

/// Converts a pressure between units.
pub fn convert_pressure(from: PressureUnit, to: PressureUnit, value: f64) -> f64 {
    from_psig(to_psig(value, from), to)
}
