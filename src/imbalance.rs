//! Phase current and voltage imbalance.

use crate::chiller::{AmpChoice, ChillerConfig, VoltageChoice};
use crate::reading::Reading;

/// Largest deviation from the phase average, as a percentage of the average.
/// Returns 0 when the average is 0.
pub fn imbalance_percent(phases: [f64; 3]) -> f64 {
    let avg = phases.iter().sum::<f64>() / 3.0;
    if avg == 0.0 {
        return 0.0;
    }
    let deviation = phases
        .iter()
        .map(|p| (p - avg).abs())
        .fold(0.0_f64, f64::max);
    deviation / avg * 100.0
}

fn all_phases(values: [Option<f64>; 3]) -> Option<[f64; 3]> {
    Some([values[0]?, values[1]?, values[2]?])
}

/// Current imbalance, only when each phase current is logged individually.
pub fn amp_imbalance(chiller: &ChillerConfig, reading: &Reading) -> Option<f64> {
    if chiller.amp_choice != AmpChoice::ThreePhase {
        return None;
    }
    all_phases(reading.amps()).map(imbalance_percent)
}

/// Voltage imbalance, only for three-phase voltage logging.
pub fn volt_imbalance(chiller: &ChillerConfig, reading: &Reading) -> Option<f64> {
    if chiller.voltage_choice != VoltageChoice::ThreePhase {
        return None;
    }
    all_phases(reading.volts()).map(imbalance_percent)
}
