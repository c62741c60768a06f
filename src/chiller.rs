//! Static per-chiller configuration.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::units::{PressureUnit, TemperatureUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnitSystem {
    #[default]
    Imperial,
    #[serde(rename = "SIMetric")]
    SiMetric,
}

impl UnitSystem {
    /// Temperature scale readings are logged in.
    pub fn temperature_unit(self) -> TemperatureUnit {
        match self {
            UnitSystem::Imperial => TemperatureUnit::Fahrenheit,
            UnitSystem::SiMetric => TemperatureUnit::Celsius,
        }
    }

    pub fn is_si(self) -> bool {
        self == UnitSystem::SiMetric
    }

    /// Units accepted for condenser/evaporator pressure drops.
    pub fn pressure_drop_units(self) -> &'static [PressureUnit] {
        match self {
            UnitSystem::Imperial => &[
                PressureUnit::Psig,
                PressureUnit::Psia,
                PressureUnit::Feet,
                PressureUnit::Inhg,
            ],
            UnitSystem::SiMetric => &[PressureUnit::Kpa, PressureUnit::Bar],
        }
    }

    /// Units accepted for refrigerant and oil pressures.
    pub fn gauge_units(self) -> &'static [PressureUnit] {
        match self {
            UnitSystem::Imperial => &[PressureUnit::Psig, PressureUnit::Psia, PressureUnit::Inhg],
            UnitSystem::SiMetric => &[PressureUnit::Kpa, PressureUnit::Bar],
        }
    }

    fn default_gauge_unit(self) -> PressureUnit {
        match self {
            UnitSystem::Imperial => PressureUnit::Psig,
            UnitSystem::SiMetric => PressureUnit::Kpa,
        }
    }
}

/// How compressor current is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AmpChoice {
    #[default]
    #[serde(rename = "3-Phase")]
    ThreePhase,
    #[serde(rename = "1-Phase")]
    SinglePhase,
    /// `ampsPhase1` carries percent of full load.
    #[serde(rename = "Enter % Load")]
    PercentLoad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VoltageChoice {
    #[default]
    #[serde(rename = "3-Phase")]
    ThreePhase,
    #[serde(rename = "1-Phase")]
    SinglePhase,
    #[serde(rename = "Do Not Log Voltage")]
    DoNotLog,
}

/// Lube oil pressure logging mode (`compOPIndicator`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OilPressureMode {
    #[default]
    #[serde(rename = "Enter Differential Directly")]
    Differential,
    /// Oil pressure is referenced to evaporator pressure.
    #[serde(rename = "Enter High Pressure Only")]
    HighOnly,
    #[serde(rename = "Enter High and Low Pressures")]
    HighAndLow,
    #[serde(rename = "Do Not Log Lube System")]
    DoNotLog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChillerConfig {
    pub id: String,
    pub name: String,
    pub unit_system: UnitSystem,
    pub refrigerant: String,
    pub high_pressure_refrig: bool,
    /// Site elevation used to pick the gauge altitude correction.
    pub elevation_feet: f64,
    pub refrig_pressure_unit: Option<PressureUnit>,

    pub design_cond_approach: Option<f64>,
    pub design_evap_approach: Option<f64>,
    pub design_cond_pressure_drop: Option<f64>,
    pub cond_pressure_drop_unit: Option<PressureUnit>,
    pub design_evap_pressure_drop: Option<f64>,
    pub evap_pressure_drop_unit: Option<PressureUnit>,
    pub design_cond_flow: Option<f64>,
    pub design_evap_delta_t: Option<f64>,

    pub amp_choice: AmpChoice,
    pub voltage_choice: VoltageChoice,
    pub full_load_amps: f64,

    #[serde(rename = "compOPIndicator")]
    pub oil_pressure_mode: OilPressureMode,
    pub oil_pressure_unit: Option<PressureUnit>,

    pub use_evap_refrig_temp: bool,
    pub use_load: bool,
    pub use_run_hours: bool,
    pub have_bearing_temp: bool,
    pub have_purge: bool,

    pub manufactured_year: Option<i32>,

    pub energy_cost: f64,
    pub tons: f64,
    /// kW/ton under Imperial, COP under SI.
    pub efficiency_rating: f64,
    /// Average load profile in percent.
    pub avg_load_profile: f64,
    pub weekly_hours: f64,
    pub weeks_per_year: f64,
}

impl Default for ChillerConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            unit_system: UnitSystem::Imperial,
            refrigerant: String::new(),
            high_pressure_refrig: true,
            elevation_feet: 0.0,
            refrig_pressure_unit: None,
            design_cond_approach: None,
            design_evap_approach: None,
            design_cond_pressure_drop: None,
            cond_pressure_drop_unit: None,
            design_evap_pressure_drop: None,
            evap_pressure_drop_unit: None,
            design_cond_flow: None,
            design_evap_delta_t: None,
            amp_choice: AmpChoice::ThreePhase,
            voltage_choice: VoltageChoice::ThreePhase,
            full_load_amps: 0.0,
            oil_pressure_mode: OilPressureMode::Differential,
            oil_pressure_unit: None,
            use_evap_refrig_temp: false,
            use_load: false,
            use_run_hours: true,
            have_bearing_temp: false,
            have_purge: false,
            manufactured_year: None,
            energy_cost: 0.0,
            tons: 0.0,
            efficiency_rating: 0.0,
            avg_load_profile: 100.0,
            weekly_hours: 0.0,
            weeks_per_year: 52.0,
        }
    }
}

impl ChillerConfig {
    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.unit_system.temperature_unit()
    }

    pub fn refrig_pressure_unit(&self) -> PressureUnit {
        self.refrig_pressure_unit
            .unwrap_or_else(|| self.unit_system.default_gauge_unit())
    }

    pub fn oil_pressure_unit(&self) -> PressureUnit {
        self.oil_pressure_unit
            .unwrap_or_else(|| self.unit_system.default_gauge_unit())
    }

    pub fn cond_pressure_drop_unit(&self) -> PressureUnit {
        self.cond_pressure_drop_unit
            .unwrap_or_else(|| self.unit_system.pressure_drop_units()[0])
    }

    pub fn evap_pressure_drop_unit(&self) -> PressureUnit {
        self.evap_pressure_drop_unit
            .unwrap_or_else(|| self.unit_system.pressure_drop_units()[0])
    }

    /// Checks that every unit-dependent field belongs to the declared unit system.
    pub fn validate(&self) -> Result<(), EngineError> {
        let drop_units = self.unit_system.pressure_drop_units();
        let gauge_units = self.unit_system.gauge_units();
        let checks = [
            ("condPressureDropUnit", self.cond_pressure_drop_unit, drop_units),
            ("evapPressureDropUnit", self.evap_pressure_drop_unit, drop_units),
            ("refrigPressureUnit", self.refrig_pressure_unit, gauge_units),
            ("oilPressureUnit", self.oil_pressure_unit, gauge_units),
        ];
        for (field, unit, allowed) in checks {
            if let Some(unit) = unit {
                if !allowed.contains(&unit) {
                    return Err(EngineError::Validation(format!(
                        "{field} {} is not allowed for {:?}",
                        unit.token(),
                        self.unit_system
                    )));
                }
            }
        }
        if self.refrigerant.trim().is_empty() {
            return Err(EngineError::Validation("refrigerant is required".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_strings_deserialize_into_enums() {
        let cfg: ChillerConfig = serde_json::from_str(
            r#"{
                "refrigerant": "R134a",
                "unitSystem": "SIMetric",
                "ampChoice": "Enter % Load",
                "voltageChoice": "Do Not Log Voltage",
                "compOPIndicator": "Enter High and Low Pressures",
                "oilPressureUnit": "BAR"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.unit_system, UnitSystem::SiMetric);
        assert_eq!(cfg.amp_choice, AmpChoice::PercentLoad);
        assert_eq!(cfg.voltage_choice, VoltageChoice::DoNotLog);
        assert_eq!(cfg.oil_pressure_mode, OilPressureMode::HighAndLow);
        assert_eq!(cfg.oil_pressure_unit(), PressureUnit::Bar);
        assert_eq!(cfg.refrig_pressure_unit(), PressureUnit::Kpa);
    }

    #[test]
    fn unhandled_choice_string_is_rejected() {
        let res: Result<ChillerConfig, _> =
            serde_json::from_str(r#"{"ampChoice": "2-Phase", "refrigerant": "R22"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn unit_fields_must_match_unit_system() {
        let mut cfg = ChillerConfig {
            refrigerant: "R22".into(),
            cond_pressure_drop_unit: Some(PressureUnit::Feet),
            ..ChillerConfig::default()
        };
        assert!(cfg.validate().is_ok());
        cfg.unit_system = UnitSystem::SiMetric;
        assert!(matches!(cfg.validate(), Err(EngineError::Validation(_))));
        cfg.cond_pressure_drop_unit = Some(PressureUnit::Kpa);
        assert!(cfg.validate().is_ok());
    }
}
