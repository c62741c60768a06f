//! Ordered list of named derivation steps with declared inputs and outputs.

use std::collections::HashSet;

use super::steps;
use crate::chiller::ChillerConfig;
use crate::error::EngineError;
use crate::reading::{DerivedFields, Field, Reading};
use crate::refrigerant::ReferenceTables;
use crate::run_hours::ReadingHistory;

/// State threaded through the steps of one enrichment.
pub struct StepContext<'a> {
    pub reading: &'a Reading,
    pub chiller: &'a ChillerConfig,
    pub tables: &'a dyn ReferenceTables,
    pub history: &'a dyn ReadingHistory,
    pub derived: DerivedFields,
}

pub struct Step {
    pub name: &'static str,
    /// Raw or derived fields the step reads. Chiller configuration is implicit.
    pub inputs: &'static [Field],
    pub outputs: &'static [Field],
    pub run: fn(&mut StepContext<'_>) -> Result<(), EngineError>,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

/// Every step reads only fields produced by earlier steps or the reading itself.
pub const PIPELINE: &[Step] = &[
    Step {
        name: "validate_ranges",
        inputs: &[
            Field::AmpsPhase1,
            Field::AmpsPhase2,
            Field::AmpsPhase3,
            Field::VoltsPhase1,
            Field::VoltsPhase2,
            Field::VoltsPhase3,
            Field::RunHours,
            Field::PurgeTime,
        ],
        outputs: &[],
        run: steps::validate_ranges,
    },
    Step {
        name: "altitude_correction",
        inputs: &[],
        outputs: &[Field::AltitudeCorrection],
        run: steps::altitude_correction,
    },
    Step {
        name: "cond_refrig_temp",
        inputs: &[Field::CondPressure, Field::AltitudeCorrection],
        outputs: &[Field::CalculatedCondRefrigTemp],
        run: steps::cond_refrig_temp,
    },
    Step {
        name: "evap_refrig_temp",
        inputs: &[Field::EvapPressure, Field::AltitudeCorrection],
        outputs: &[Field::CalculatedEvapRefrigTemp],
        run: steps::evap_refrig_temp,
    },
    Step {
        name: "cond_inlet_loss",
        inputs: &[Field::CondInletTemp],
        outputs: &[Field::CondInletLoss],
        run: steps::cond_inlet_loss,
    },
    Step {
        name: "cond_approach",
        inputs: &[
            Field::CalculatedCondRefrigTemp,
            Field::CondRefrigTemp,
            Field::CondOutletTemp,
            Field::AmpsPhase1,
            Field::AmpsPhase2,
            Field::AmpsPhase3,
        ],
        outputs: &[Field::CondApproach],
        run: steps::cond_approach,
    },
    Step {
        name: "cond_app_loss",
        inputs: &[Field::CondApproach],
        outputs: &[Field::CondAppVariance, Field::CondAppLoss],
        run: steps::cond_app_loss,
    },
    Step {
        name: "evap_temp_loss",
        inputs: &[Field::EvapOutletTemp],
        outputs: &[Field::EvapTempLoss],
        run: steps::evap_temp_loss,
    },
    Step {
        name: "evap_approach",
        inputs: &[
            Field::CalculatedEvapRefrigTemp,
            Field::EvapRefrigTemp,
            Field::EvapOutletTemp,
            Field::AmpsPhase1,
            Field::AmpsPhase2,
            Field::AmpsPhase3,
        ],
        outputs: &[Field::EvapApproach],
        run: steps::evap_approach,
    },
    Step {
        name: "evap_app_loss",
        inputs: &[Field::EvapApproach],
        outputs: &[Field::EvapAppVariance, Field::EflEvapAppLoss],
        run: steps::evap_app_loss,
    },
    Step {
        name: "non_condensables",
        inputs: &[Field::CondPressure, Field::CondRefrigTemp, Field::AltitudeCorrection],
        outputs: &[Field::NonCondensables, Field::NonCondLoss],
        run: steps::non_condensables,
    },
    Step {
        name: "cond_flow",
        inputs: &[Field::CondPressureDrop, Field::CondInletTemp, Field::CondOutletTemp],
        outputs: &[Field::CondFlow, Field::DeltaLoss],
        run: steps::cond_flow,
    },
    Step {
        name: "evap_flow",
        inputs: &[Field::EvapPressureDrop],
        outputs: &[Field::EvapFlow],
        run: steps::evap_flow,
    },
    Step {
        name: "final_oil_diff",
        inputs: &[
            Field::OilPressureDiff,
            Field::OilPressureHigh,
            Field::OilPressureLow,
            Field::EvapPressure,
        ],
        outputs: &[Field::FinalOilDiff],
        run: steps::final_oil_diff,
    },
    Step {
        name: "imbalance",
        inputs: &[
            Field::AmpsPhase1,
            Field::AmpsPhase2,
            Field::AmpsPhase3,
            Field::VoltsPhase1,
            Field::VoltsPhase2,
            Field::VoltsPhase3,
        ],
        outputs: &[Field::AmpImbalance, Field::VoltImbalance],
        run: steps::electrical_imbalance,
    },
    Step {
        name: "eff_loss",
        inputs: &[
            Field::CondInletLoss,
            Field::CondAppLoss,
            Field::EvapTempLoss,
            Field::EflEvapAppLoss,
            Field::NonCondLoss,
            Field::DeltaLoss,
        ],
        outputs: &[Field::EffLoss],
        run: steps::eff_loss,
    },
    Step {
        name: "cost",
        inputs: &[Field::EffLoss],
        outputs: &[
            Field::TargetCostPerHour,
            Field::AnnualTargetCost,
            Field::TargetCost,
            Field::ActualCost,
            Field::LossCost,
        ],
        run: steps::cost,
    },
    Step {
        name: "energy_loss",
        inputs: &[Field::LossCost],
        outputs: &[Field::KwhLoss, Field::BtuLoss, Field::Co2],
        run: steps::energy_loss,
    },
    Step {
        name: "run_hours",
        inputs: &[Field::ReadingDate, Field::RunHours, Field::RunHourStart],
        outputs: &[Field::ValidRunHours, Field::RunHoursDirection],
        run: steps::run_hours,
    },
];

/// Steps whose inputs are reached, directly or through earlier outputs, by
/// `changed`. Returned in pipeline order.
pub fn affected_steps(changed: &[Field]) -> Vec<&'static Step> {
    let mut dirty: HashSet<Field> = changed.iter().copied().collect();
    let mut affected = Vec::new();
    for step in PIPELINE {
        if step.inputs.iter().any(|f| dirty.contains(f)) {
            dirty.extend(step.outputs.iter().copied());
            affected.push(step);
        }
    }
    affected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(steps: &[&Step]) -> Vec<&'static str> {
        steps.iter().map(|s| s.name).collect()
    }

    #[test]
    fn pipeline_order_respects_declared_dependencies() {
        let mut produced: HashSet<Field> = HashSet::new();
        for step in PIPELINE {
            for input in step.inputs.iter().filter(|f| f.is_derived()) {
                assert!(
                    produced.contains(input),
                    "{} reads {} before it is produced",
                    step.name,
                    input.as_str()
                );
            }
            produced.extend(step.outputs.iter().copied());
        }
        for field in Field::DERIVED {
            assert!(produced.contains(&field), "{} has no producer", field.as_str());
        }
    }

    #[test]
    fn inlet_change_reaches_totals_only_through_losses() {
        let steps = affected_steps(&[Field::CondInletTemp]);
        assert_eq!(
            names(&steps),
            ["cond_inlet_loss", "cond_flow", "eff_loss", "cost", "energy_loss"]
        );
    }

    #[test]
    fn run_hours_change_is_isolated() {
        let steps = affected_steps(&[Field::RunHours]);
        assert_eq!(names(&steps), ["validate_ranges", "run_hours"]);
    }

    #[test]
    fn oil_change_touches_nothing_else() {
        assert_eq!(names(&affected_steps(&[Field::OilPressureLow])), ["final_oil_diff"]);
        assert!(affected_steps(&[]).is_empty());
    }
}
