//! Individual derivation steps of the loss pipeline.
//!
//! Temperatures are handled in the chiller's own unit system; pressures are
//! brought to PSIG before any comparison or lookup.

use tracing::{debug, warn};

use super::pipeline::StepContext;
use crate::chiller::{AmpChoice, ChillerConfig, OilPressureMode};
use crate::error::EngineError;
use crate::imbalance;
use crate::refrigerant::{
    find_altitude_correction, find_by_temperature, saturation_temperature,
};
use crate::run_hours::validate_run_hours;
use crate::units::{
    convert_degrees, convert_temperature, from_psig, to_fahrenheit, to_psig, PressureUnit,
    TemperatureUnit,
};

/// Losses below this value are reported as 0.
pub const LOSS_FLOOR: f64 = 2.0;

const COND_INLET_BENCHMARK_F: f64 = 85.0;
const EVAP_OUTLET_BENCHMARK_F: f64 = 44.0;
const LOSS_PER_DEGREE_F: f64 = 2.0;
const LOSS_PER_DEGREE_C: f64 = 3.6;
const NON_COND_THRESHOLD_PSI: f64 = 0.9;
const NON_COND_FIXED_LOSS: f64 = 10.0;
const MAX_PERCENT_LOAD: f64 = 150.0;

const BTU_PER_KWH: f64 = 3412.12;
const CO2_LB_PER_KWH: f64 = 1.1835;
const LB_PER_TON: f64 = 2000.0;

/// Applies the shared floor after any unit scaling.
pub fn clamp_loss(loss: f64) -> f64 {
    if loss < LOSS_FLOOR {
        0.0
    } else {
        loss
    }
}

fn loss_multiplier(chiller: &ChillerConfig) -> f64 {
    if chiller.unit_system.is_si() {
        LOSS_PER_DEGREE_C
    } else {
        LOSS_PER_DEGREE_F
    }
}

fn benchmark(chiller: &ChillerConfig, value_f: f64) -> f64 {
    convert_temperature(TemperatureUnit::Fahrenheit, chiller.temperature_unit(), value_f)
}

/// Age-based approach allowance in the chiller's unit system.
fn default_approach(chiller: &ChillerConfig, modern: f64, eighties: f64, older: f64) -> f64 {
    let allowance_f = match chiller.manufactured_year {
        Some(y) if y >= 1990 => modern,
        Some(y) if y >= 1980 => eighties,
        _ => older,
    };
    convert_degrees(TemperatureUnit::Fahrenheit, chiller.temperature_unit(), allowance_f)
}

/// Compressor load as a fraction of full load.
fn load_factor(ctx: &StepContext<'_>) -> Option<f64> {
    let max_amp = ctx.reading.max_phase_amp()?;
    if ctx.chiller.use_load {
        Some(max_amp / 100.0)
    } else if ctx.chiller.full_load_amps > 0.0 {
        Some(max_amp / ctx.chiller.full_load_amps)
    } else {
        Some(0.0)
    }
}

fn approach(refrig_temp: f64, water_temp: f64, load_factor: f64) -> f64 {
    if load_factor > 0.0 {
        (refrig_temp - water_temp) / load_factor
    } else {
        0.0
    }
}

fn corrected_psig(ctx: &StepContext<'_>, pressure: f64) -> f64 {
    to_psig(pressure, ctx.chiller.refrig_pressure_unit())
        - ctx.derived.altitude_correction.unwrap_or(0.0)
}

fn check_non_negative(name: &str, value: Option<f64>) -> Result<(), EngineError> {
    match value {
        Some(v) if !v.is_finite() => {
            Err(EngineError::Validation(format!("{name} is not a number")))
        }
        Some(v) if v < 0.0 => Err(EngineError::Validation(format!(
            "{name} must not be negative, got {v}"
        ))),
        _ => Ok(()),
    }
}

pub(super) fn validate_ranges(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    let r = ctx.reading;
    let checks = [
        ("ampsPhase1", r.amps_phase1),
        ("ampsPhase2", r.amps_phase2),
        ("ampsPhase3", r.amps_phase3),
        ("voltsPhase1", r.volts_phase1),
        ("voltsPhase2", r.volts_phase2),
        ("voltsPhase3", r.volts_phase3),
        ("runHours", r.run_hours),
        ("purgeTime", r.purge_time),
    ];
    for (name, value) in checks {
        check_non_negative(name, value)?;
    }
    if ctx.chiller.amp_choice == AmpChoice::PercentLoad {
        if let Some(load) = r.amps_phase1.filter(|l| *l > MAX_PERCENT_LOAD) {
            return Err(EngineError::Validation(format!(
                "percent load {load} exceeds {MAX_PERCENT_LOAD}"
            )));
        }
    }
    Ok(())
}

pub(super) fn altitude_correction(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    ctx.derived.altitude_correction =
        Some(find_altitude_correction(ctx.tables, ctx.chiller.elevation_feet));
    Ok(())
}

pub(super) fn cond_refrig_temp(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    if let Some(p) = ctx.reading.cond_pressure {
        let t = saturation_temperature(
            ctx.tables,
            &ctx.chiller.refrigerant,
            p,
            ctx.chiller.refrig_pressure_unit(),
            ctx.derived.altitude_correction.unwrap_or(0.0),
            ctx.chiller.temperature_unit(),
        )?;
        ctx.derived.calculated_cond_refrig_temp = Some(t);
    }
    Ok(())
}

pub(super) fn evap_refrig_temp(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    if let Some(p) = ctx.reading.evap_pressure {
        let t = saturation_temperature(
            ctx.tables,
            &ctx.chiller.refrigerant,
            p,
            ctx.chiller.refrig_pressure_unit(),
            ctx.derived.altitude_correction.unwrap_or(0.0),
            ctx.chiller.temperature_unit(),
        )?;
        ctx.derived.calculated_evap_refrig_temp = Some(t);
    }
    Ok(())
}

pub(super) fn cond_inlet_loss(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    if let Some(inlet) = ctx.reading.cond_inlet_temp {
        let diff = (inlet - benchmark(ctx.chiller, COND_INLET_BENCHMARK_F)).max(0.0);
        ctx.derived.cond_inlet_loss = Some(clamp_loss(diff * loss_multiplier(ctx.chiller)));
    }
    Ok(())
}

pub(super) fn cond_approach(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    let calculated = ctx.derived.calculated_cond_refrig_temp;
    let refrig = if ctx.chiller.high_pressure_refrig {
        calculated
    } else {
        ctx.reading.cond_refrig_temp.or(calculated)
    };
    if let (Some(refrig), Some(outlet), Some(lf)) =
        (refrig, ctx.reading.cond_outlet_temp, load_factor(ctx))
    {
        ctx.derived.cond_approach = Some(approach(refrig, outlet, lf));
    }
    Ok(())
}

pub(super) fn cond_app_loss(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    let Some(approach) = ctx.derived.cond_approach else {
        return Ok(());
    };
    let design = ctx
        .chiller
        .design_cond_approach
        .unwrap_or_else(|| default_approach(ctx.chiller, 1.0, 2.0, 5.0));
    let variance = (approach - design).max(0.0);
    let temp_variance = variance * ctx.chiller.avg_load_profile * 0.01;
    ctx.derived.cond_app_variance = Some(variance);
    ctx.derived.cond_app_loss = Some(clamp_loss(temp_variance * loss_multiplier(ctx.chiller)));
    Ok(())
}

pub(super) fn evap_temp_loss(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    if let Some(outlet) = ctx.reading.evap_outlet_temp {
        let diff = (outlet - benchmark(ctx.chiller, EVAP_OUTLET_BENCHMARK_F)).max(0.0);
        ctx.derived.evap_temp_loss = Some(clamp_loss(diff * loss_multiplier(ctx.chiller)));
    }
    Ok(())
}

pub(super) fn evap_approach(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    let refrig = if ctx.chiller.use_evap_refrig_temp {
        ctx.reading.evap_refrig_temp
    } else {
        ctx.derived.calculated_evap_refrig_temp
    };
    if let (Some(refrig), Some(outlet), Some(lf)) =
        (refrig, ctx.reading.evap_outlet_temp, load_factor(ctx))
    {
        ctx.derived.evap_approach = Some(approach(outlet, refrig, lf));
    }
    Ok(())
}

pub(super) fn evap_app_loss(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    let Some(approach) = ctx.derived.evap_approach else {
        return Ok(());
    };
    let design = ctx
        .chiller
        .design_evap_approach
        .unwrap_or_else(|| default_approach(ctx.chiller, 3.0, 4.0, 6.0));
    let variance = (approach - design).max(0.0);
    let temp_variance = variance * ctx.chiller.avg_load_profile * 0.01;
    ctx.derived.evap_app_variance = Some(variance);
    ctx.derived.efl_evap_app_loss =
        Some(clamp_loss(temp_variance * loss_multiplier(ctx.chiller)));
    Ok(())
}

/// Excess of the corrected condenser pressure over the saturation pressure at
/// the measured condenser refrigerant temperature. Unset without a measured
/// temperature.
pub(super) fn non_condensables(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    let (Some(pressure), Some(measured)) =
        (ctx.reading.cond_pressure, ctx.reading.cond_refrig_temp)
    else {
        return Ok(());
    };
    let corrected = corrected_psig(ctx, pressure);
    let measured_f = to_fahrenheit(measured, ctx.chiller.temperature_unit());
    let saturation = find_by_temperature(ctx.tables, &ctx.chiller.refrigerant, measured_f)?;
    let excess = corrected - saturation.pressure_psig;
    let loss = if excess > NON_COND_THRESHOLD_PSI {
        NON_COND_FIXED_LOSS
    } else {
        0.0
    };
    debug!(corrected, saturation = saturation.pressure_psig, excess, "non-condensables");
    ctx.derived.non_condensables = Some(excess);
    ctx.derived.non_cond_loss = Some(clamp_loss(loss));
    Ok(())
}

/// `(|actual| / |design|)²` when both drops are present and non-zero in PSIG.
fn flow_ratio_squared(
    design: Option<f64>,
    actual: Option<f64>,
    unit: PressureUnit,
) -> Option<f64> {
    let design = to_psig(design?, unit);
    let actual = to_psig(actual?, unit);
    if design == 0.0 || actual == 0.0 {
        return None;
    }
    Some((actual.abs() / design.abs()).powi(2))
}

pub(super) fn cond_flow(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    let Some(ratio2) = flow_ratio_squared(
        ctx.chiller.design_cond_pressure_drop,
        ctx.reading.cond_pressure_drop,
        ctx.chiller.cond_pressure_drop_unit(),
    ) else {
        return Ok(());
    };
    ctx.derived.cond_flow = Some((ratio2 - 1.0) * 100.0);
    if let (Some(inlet), Some(outlet)) = (ctx.reading.cond_inlet_temp, ctx.reading.cond_outlet_temp)
    {
        let unit = ctx.chiller.temperature_unit();
        let rise_f = to_fahrenheit(outlet, unit) - to_fahrenheit(inlet, unit);
        ctx.derived.delta_loss = Some(clamp_loss((1.0 - ratio2) * rise_f * LOSS_PER_DEGREE_F));
    }
    Ok(())
}

pub(super) fn evap_flow(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    if let Some(ratio2) = flow_ratio_squared(
        ctx.chiller.design_evap_pressure_drop,
        ctx.reading.evap_pressure_drop,
        ctx.chiller.evap_pressure_drop_unit(),
    ) {
        ctx.derived.evap_flow = Some((ratio2 - 1.0) * 100.0);
    }
    Ok(())
}

pub(super) fn final_oil_diff(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    let r = ctx.reading;
    let oil_unit = ctx.chiller.oil_pressure_unit();
    let diff_psig = match ctx.chiller.oil_pressure_mode {
        OilPressureMode::Differential => r.oil_pressure_diff.map(|d| to_psig(d, oil_unit)),
        OilPressureMode::HighOnly => match (r.oil_pressure_high, r.evap_pressure) {
            (Some(high), Some(evap)) => Some(
                to_psig(high, oil_unit) - to_psig(evap, ctx.chiller.refrig_pressure_unit()),
            ),
            _ => None,
        },
        OilPressureMode::HighAndLow => match (r.oil_pressure_high, r.oil_pressure_low) {
            (Some(high), Some(low)) => Some(to_psig(high, oil_unit) - to_psig(low, oil_unit)),
            _ => None,
        },
        OilPressureMode::DoNotLog => None,
    };
    ctx.derived.final_oil_diff = diff_psig.map(|d| from_psig(d, oil_unit));
    Ok(())
}

pub(super) fn electrical_imbalance(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    ctx.derived.amp_imbalance = imbalance::amp_imbalance(ctx.chiller, ctx.reading);
    ctx.derived.volt_imbalance = imbalance::volt_imbalance(ctx.chiller, ctx.reading);
    Ok(())
}

pub(super) fn eff_loss(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    let d = &ctx.derived;
    let total = [
        d.cond_inlet_loss,
        d.cond_app_loss,
        d.evap_temp_loss,
        d.efl_evap_app_loss,
        d.non_cond_loss,
        d.delta_loss,
    ]
    .into_iter()
    .flatten()
    .sum::<f64>();
    ctx.derived.eff_loss = Some(total);
    Ok(())
}

pub(super) fn cost(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    let c = ctx.chiller;
    let rating = if c.unit_system.is_si() {
        // COP -> kW per kW of cooling
        if c.efficiency_rating > 0.0 {
            1.0 / c.efficiency_rating
        } else {
            0.0
        }
    } else {
        c.efficiency_rating
    };
    let per_hour = rating * c.energy_cost * c.tons * c.avg_load_profile * 0.01;
    let annual = per_hour * c.weekly_hours * c.weeks_per_year;
    let actual = annual * (1.0 + ctx.derived.eff_loss.unwrap_or(0.0) / 100.0);

    ctx.derived.target_cost_per_hour = Some(per_hour);
    ctx.derived.annual_target_cost = Some(annual);
    ctx.derived.target_cost = Some(annual);
    ctx.derived.actual_cost = Some(actual);
    ctx.derived.loss_cost = Some(actual - annual);
    Ok(())
}

pub(super) fn energy_loss(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    let loss_cost = ctx.derived.loss_cost.unwrap_or(0.0);
    let kwh = if ctx.chiller.energy_cost > 0.0 {
        loss_cost / ctx.chiller.energy_cost
    } else {
        0.0
    };
    ctx.derived.kwh_loss = Some(kwh);
    ctx.derived.btu_loss = Some(kwh * BTU_PER_KWH);
    ctx.derived.co2 = Some(kwh * CO2_LB_PER_KWH / LB_PER_TON);
    Ok(())
}

pub(super) fn run_hours(ctx: &mut StepContext<'_>) -> Result<(), EngineError> {
    if !ctx.chiller.use_run_hours {
        return Ok(());
    }
    let r = ctx.reading;
    let chiller_id = if r.chiller_id.is_empty() {
        ctx.chiller.id.as_str()
    } else {
        r.chiller_id.as_str()
    };
    let previous = ctx.history.previous_run_hours(chiller_id, r.reading_date);
    let next = ctx.history.next_run_hours(chiller_id, r.reading_date);
    let check = validate_run_hours(r.run_hours, r.reading_date, r.run_hour_start, previous, next);
    if !check.is_valid {
        warn!(
            chiller_id,
            run_hours = ?r.run_hours,
            direction = ?check.direction,
            "implausible run hours"
        );
    } else {
        debug!(chiller_id, "run hours plausible");
    }
    ctx.derived.valid_run_hours = Some(check.is_valid);
    ctx.derived.run_hours_direction = check.direction;
    Ok(())
}
