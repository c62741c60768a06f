//! Reading records and the catalogue of raw and derived field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::run_hours::RunHoursDirection;

/// One timestamped observation for a chiller. Holds raw measurements only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reading {
    pub id: Option<String>,
    pub chiller_id: String,
    pub reading_date: DateTime<Utc>,

    pub cond_inlet_temp: Option<f64>,
    pub cond_outlet_temp: Option<f64>,
    pub cond_pressure: Option<f64>,
    pub cond_refrig_temp: Option<f64>,
    pub cond_pressure_drop: Option<f64>,

    pub evap_inlet_temp: Option<f64>,
    pub evap_outlet_temp: Option<f64>,
    pub evap_pressure: Option<f64>,
    pub evap_refrig_temp: Option<f64>,
    pub evap_pressure_drop: Option<f64>,

    pub amps_phase1: Option<f64>,
    pub amps_phase2: Option<f64>,
    pub amps_phase3: Option<f64>,
    pub volts_phase1: Option<f64>,
    pub volts_phase2: Option<f64>,
    pub volts_phase3: Option<f64>,

    pub run_hours: Option<f64>,
    /// Hour meter was reset or replaced at this reading.
    pub run_hour_start: bool,

    pub oil_pressure_diff: Option<f64>,
    pub oil_pressure_high: Option<f64>,
    pub oil_pressure_low: Option<f64>,

    pub purge_time: Option<f64>,
    pub bearing_temp: Option<f64>,
}

impl Reading {
    pub fn amps(&self) -> [Option<f64>; 3] {
        [self.amps_phase1, self.amps_phase2, self.amps_phase3]
    }

    pub fn volts(&self) -> [Option<f64>; 3] {
        [self.volts_phase1, self.volts_phase2, self.volts_phase3]
    }

    /// Largest logged phase current, or percent load when amps carry % load.
    pub fn max_phase_amp(&self) -> Option<f64> {
        self.amps().into_iter().flatten().reduce(f64::max)
    }
}

/// Values computed by the loss engine. Never accepted as caller input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DerivedFields {
    pub altitude_correction: Option<f64>,
    pub calculated_cond_refrig_temp: Option<f64>,
    pub calculated_evap_refrig_temp: Option<f64>,

    pub cond_inlet_loss: Option<f64>,
    pub cond_approach: Option<f64>,
    pub cond_app_variance: Option<f64>,
    pub cond_app_loss: Option<f64>,

    pub evap_temp_loss: Option<f64>,
    pub evap_approach: Option<f64>,
    pub evap_app_variance: Option<f64>,
    #[serde(rename = "EFLevapAppLoss")]
    pub efl_evap_app_loss: Option<f64>,

    pub non_condensables: Option<f64>,
    pub non_cond_loss: Option<f64>,

    pub delta_loss: Option<f64>,
    pub cond_flow: Option<f64>,
    pub evap_flow: Option<f64>,

    pub final_oil_diff: Option<f64>,
    pub amp_imbalance: Option<f64>,
    pub volt_imbalance: Option<f64>,

    pub eff_loss: Option<f64>,
    pub target_cost_per_hour: Option<f64>,
    pub annual_target_cost: Option<f64>,
    pub target_cost: Option<f64>,
    pub actual_cost: Option<f64>,
    pub loss_cost: Option<f64>,
    #[serde(rename = "KWHLoss")]
    pub kwh_loss: Option<f64>,
    #[serde(rename = "BTULoss")]
    pub btu_loss: Option<f64>,
    #[serde(rename = "CO2")]
    pub co2: Option<f64>,

    pub valid_run_hours: Option<bool>,
    pub run_hours_direction: Option<RunHoursDirection>,
}

/// A reading together with the fields the engine derived from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichedReading {
    #[serde(flatten)]
    pub reading: Reading,
    #[serde(flatten)]
    pub derived: DerivedFields,
}

/// Names every field of a reading, raw or derived. The loss pipeline declares
/// its step inputs and outputs in these terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ReadingDate,
    CondInletTemp,
    CondOutletTemp,
    CondPressure,
    CondRefrigTemp,
    CondPressureDrop,
    EvapInletTemp,
    EvapOutletTemp,
    EvapPressure,
    EvapRefrigTemp,
    EvapPressureDrop,
    AmpsPhase1,
    AmpsPhase2,
    AmpsPhase3,
    VoltsPhase1,
    VoltsPhase2,
    VoltsPhase3,
    RunHours,
    RunHourStart,
    OilPressureDiff,
    OilPressureHigh,
    OilPressureLow,
    PurgeTime,
    BearingTemp,

    AltitudeCorrection,
    CalculatedCondRefrigTemp,
    CalculatedEvapRefrigTemp,
    CondInletLoss,
    CondApproach,
    CondAppVariance,
    CondAppLoss,
    EvapTempLoss,
    EvapApproach,
    EvapAppVariance,
    EflEvapAppLoss,
    NonCondensables,
    NonCondLoss,
    DeltaLoss,
    CondFlow,
    EvapFlow,
    FinalOilDiff,
    AmpImbalance,
    VoltImbalance,
    EffLoss,
    TargetCostPerHour,
    AnnualTargetCost,
    TargetCost,
    ActualCost,
    LossCost,
    KwhLoss,
    BtuLoss,
    Co2,
    ValidRunHours,
    RunHoursDirection,
}

impl Field {
    /// Fields produced by the engine; always stripped from caller payloads.
    pub const DERIVED: [Field; 30] = [
        Field::AltitudeCorrection,
        Field::CalculatedCondRefrigTemp,
        Field::CalculatedEvapRefrigTemp,
        Field::CondInletLoss,
        Field::CondApproach,
        Field::CondAppVariance,
        Field::CondAppLoss,
        Field::EvapTempLoss,
        Field::EvapApproach,
        Field::EvapAppVariance,
        Field::EflEvapAppLoss,
        Field::NonCondensables,
        Field::NonCondLoss,
        Field::DeltaLoss,
        Field::CondFlow,
        Field::EvapFlow,
        Field::FinalOilDiff,
        Field::AmpImbalance,
        Field::VoltImbalance,
        Field::EffLoss,
        Field::TargetCostPerHour,
        Field::AnnualTargetCost,
        Field::TargetCost,
        Field::ActualCost,
        Field::LossCost,
        Field::KwhLoss,
        Field::BtuLoss,
        Field::Co2,
        Field::ValidRunHours,
        Field::RunHoursDirection,
    ];

    /// Payload key, matching the serde names of `Reading` / `DerivedFields`.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::ReadingDate => "readingDate",
            Field::CondInletTemp => "condInletTemp",
            Field::CondOutletTemp => "condOutletTemp",
            Field::CondPressure => "condPressure",
            Field::CondRefrigTemp => "condRefrigTemp",
            Field::CondPressureDrop => "condPressureDrop",
            Field::EvapInletTemp => "evapInletTemp",
            Field::EvapOutletTemp => "evapOutletTemp",
            Field::EvapPressure => "evapPressure",
            Field::EvapRefrigTemp => "evapRefrigTemp",
            Field::EvapPressureDrop => "evapPressureDrop",
            Field::AmpsPhase1 => "ampsPhase1",
            Field::AmpsPhase2 => "ampsPhase2",
            Field::AmpsPhase3 => "ampsPhase3",
            Field::VoltsPhase1 => "voltsPhase1",
            Field::VoltsPhase2 => "voltsPhase2",
            Field::VoltsPhase3 => "voltsPhase3",
            Field::RunHours => "runHours",
            Field::RunHourStart => "runHourStart",
            Field::OilPressureDiff => "oilPressureDiff",
            Field::OilPressureHigh => "oilPressureHigh",
            Field::OilPressureLow => "oilPressureLow",
            Field::PurgeTime => "purgeTime",
            Field::BearingTemp => "bearingTemp",
            Field::AltitudeCorrection => "altitudeCorrection",
            Field::CalculatedCondRefrigTemp => "calculatedCondRefrigTemp",
            Field::CalculatedEvapRefrigTemp => "calculatedEvapRefrigTemp",
            Field::CondInletLoss => "condInletLoss",
            Field::CondApproach => "condApproach",
            Field::CondAppVariance => "condAppVariance",
            Field::CondAppLoss => "condAppLoss",
            Field::EvapTempLoss => "evapTempLoss",
            Field::EvapApproach => "evapApproach",
            Field::EvapAppVariance => "evapAppVariance",
            Field::EflEvapAppLoss => "EFLevapAppLoss",
            Field::NonCondensables => "nonCondensables",
            Field::NonCondLoss => "nonCondLoss",
            Field::DeltaLoss => "deltaLoss",
            Field::CondFlow => "condFlow",
            Field::EvapFlow => "evapFlow",
            Field::FinalOilDiff => "finalOilDiff",
            Field::AmpImbalance => "ampImbalance",
            Field::VoltImbalance => "voltImbalance",
            Field::EffLoss => "effLoss",
            Field::TargetCostPerHour => "targetCostPerHour",
            Field::AnnualTargetCost => "annualTargetCost",
            Field::TargetCost => "targetCost",
            Field::ActualCost => "actualCost",
            Field::LossCost => "lossCost",
            Field::KwhLoss => "KWHLoss",
            Field::BtuLoss => "BTULoss",
            Field::Co2 => "CO2",
            Field::ValidRunHours => "validRunHours",
            Field::RunHoursDirection => "runHoursDirection",
        }
    }

    pub fn is_derived(self) -> bool {
        Field::DERIVED.contains(&self)
    }
}

impl DerivedFields {
    /// Unsets one derived field. Raw fields are ignored.
    pub fn clear(&mut self, field: Field) {
        match field {
            Field::AltitudeCorrection => self.altitude_correction = None,
            Field::CalculatedCondRefrigTemp => self.calculated_cond_refrig_temp = None,
            Field::CalculatedEvapRefrigTemp => self.calculated_evap_refrig_temp = None,
            Field::CondInletLoss => self.cond_inlet_loss = None,
            Field::CondApproach => self.cond_approach = None,
            Field::CondAppVariance => self.cond_app_variance = None,
            Field::CondAppLoss => self.cond_app_loss = None,
            Field::EvapTempLoss => self.evap_temp_loss = None,
            Field::EvapApproach => self.evap_approach = None,
            Field::EvapAppVariance => self.evap_app_variance = None,
            Field::EflEvapAppLoss => self.efl_evap_app_loss = None,
            Field::NonCondensables => self.non_condensables = None,
            Field::NonCondLoss => self.non_cond_loss = None,
            Field::DeltaLoss => self.delta_loss = None,
            Field::CondFlow => self.cond_flow = None,
            Field::EvapFlow => self.evap_flow = None,
            Field::FinalOilDiff => self.final_oil_diff = None,
            Field::AmpImbalance => self.amp_imbalance = None,
            Field::VoltImbalance => self.volt_imbalance = None,
            Field::EffLoss => self.eff_loss = None,
            Field::TargetCostPerHour => self.target_cost_per_hour = None,
            Field::AnnualTargetCost => self.annual_target_cost = None,
            Field::TargetCost => self.target_cost = None,
            Field::ActualCost => self.actual_cost = None,
            Field::LossCost => self.loss_cost = None,
            Field::KwhLoss => self.kwh_loss = None,
            Field::BtuLoss => self.btu_loss = None,
            Field::Co2 => self.co2 = None,
            Field::ValidRunHours => self.valid_run_hours = None,
            Field::RunHoursDirection => self.run_hours_direction = None,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_names_match_serde_keys() {
        let derived = DerivedFields {
            altitude_correction: Some(0.0),
            calculated_cond_refrig_temp: Some(0.0),
            calculated_evap_refrig_temp: Some(0.0),
            cond_inlet_loss: Some(0.0),
            cond_approach: Some(0.0),
            cond_app_variance: Some(0.0),
            cond_app_loss: Some(0.0),
            evap_temp_loss: Some(0.0),
            evap_approach: Some(0.0),
            evap_app_variance: Some(0.0),
            efl_evap_app_loss: Some(0.0),
            non_condensables: Some(0.0),
            non_cond_loss: Some(0.0),
            delta_loss: Some(0.0),
            cond_flow: Some(0.0),
            evap_flow: Some(0.0),
            final_oil_diff: Some(0.0),
            amp_imbalance: Some(0.0),
            volt_imbalance: Some(0.0),
            eff_loss: Some(0.0),
            target_cost_per_hour: Some(0.0),
            annual_target_cost: Some(0.0),
            target_cost: Some(0.0),
            actual_cost: Some(0.0),
            loss_cost: Some(0.0),
            kwh_loss: Some(0.0),
            btu_loss: Some(0.0),
            co2: Some(0.0),
            valid_run_hours: Some(true),
            run_hours_direction: Some(RunHoursDirection::High),
        };
        let value = serde_json::to_value(&derived).unwrap();
        let keys = value.as_object().unwrap();
        assert_eq!(keys.len(), Field::DERIVED.len());
        for field in Field::DERIVED {
            assert!(keys.contains_key(field.as_str()), "missing {}", field.as_str());
        }
    }

    #[test]
    fn clear_unsets_only_the_named_field() {
        let mut d = DerivedFields {
            cond_flow: Some(3.0),
            evap_flow: Some(4.0),
            ..Default::default()
        };
        d.clear(Field::CondFlow);
        d.clear(Field::CondInletTemp);
        assert_eq!(d.cond_flow, None);
        assert_eq!(d.evap_flow, Some(4.0));
    }

    #[test]
    fn max_phase_amp_ignores_missing_phases() {
        let r = Reading {
            amps_phase1: Some(90.0),
            amps_phase3: Some(110.0),
            ..Default::default()
        };
        assert_eq!(r.max_phase_amp(), Some(110.0));
        assert_eq!(Reading::default().max_phase_amp(), None);
    }
}
