//! Performance-loss enrichment of chiller readings.
//!
//! [`LossEngine::enrich`] runs every step of [`PIPELINE`] in order.
//! [`LossEngine::recompute`] reruns only the steps reached by a set of edited
//! raw fields and keeps every other derived value.

mod pipeline;
mod steps;

pub use pipeline::{affected_steps, Step, StepContext, PIPELINE};
pub use steps::{clamp_loss, LOSS_FLOOR};

use tracing::{debug, debug_span};

use crate::chiller::ChillerConfig;
use crate::error::EngineError;
use crate::reading::{DerivedFields, EnrichedReading, Field, Reading};
use crate::refrigerant::ReferenceTables;
use crate::run_hours::ReadingHistory;

/// Binds the read-only collaborators the pipeline consults.
#[derive(Clone, Copy)]
pub struct LossEngine<'a> {
    tables: &'a dyn ReferenceTables,
    history: &'a dyn ReadingHistory,
}

impl<'a> LossEngine<'a> {
    pub fn new(tables: &'a dyn ReferenceTables, history: &'a dyn ReadingHistory) -> Self {
        Self { tables, history }
    }

    pub fn enrich(
        &self,
        reading: &Reading,
        chiller: &ChillerConfig,
    ) -> Result<EnrichedReading, EngineError> {
        let _span = debug_span!("enrich", chiller = %chiller.id).entered();
        chiller.validate()?;
        let steps: Vec<&Step> = PIPELINE.iter().collect();
        let derived = self.run_steps(&steps, reading, chiller, DerivedFields::default())?;
        Ok(EnrichedReading {
            reading: reading.clone(),
            derived,
        })
    }

    /// Reruns the steps affected by `changed` on an already enriched reading.
    ///
    /// Derived names in `changed` are ignored; derived values are never input.
    pub fn recompute(
        &self,
        enriched: &EnrichedReading,
        changed: &[Field],
        chiller: &ChillerConfig,
    ) -> Result<EnrichedReading, EngineError> {
        let _span = debug_span!("recompute", chiller = %chiller.id).entered();
        chiller.validate()?;
        let raw: Vec<Field> = changed.iter().copied().filter(|f| !f.is_derived()).collect();
        let steps = affected_steps(&raw);
        debug!(steps = steps.len(), "recomputing affected steps");

        let mut derived = enriched.derived.clone();
        for step in &steps {
            for field in step.outputs {
                derived.clear(*field);
            }
        }
        let derived = self.run_steps(&steps, &enriched.reading, chiller, derived)?;
        Ok(EnrichedReading {
            reading: enriched.reading.clone(),
            derived,
        })
    }

    fn run_steps(
        &self,
        steps: &[&Step],
        reading: &Reading,
        chiller: &ChillerConfig,
        derived: DerivedFields,
    ) -> Result<DerivedFields, EngineError> {
        let mut ctx = StepContext {
            reading,
            chiller,
            tables: self.tables,
            history: self.history,
            derived,
        };
        for step in steps {
            (step.run)(&mut ctx).inspect_err(|err| {
                debug!(step = step.name, %err, "step failed");
            })?;
            debug!(step = step.name, "step done");
        }
        Ok(ctx.derived)
    }
}

/// One-shot form of [`LossEngine::enrich`].
pub fn enrich(
    reading: &Reading,
    chiller: &ChillerConfig,
    tables: &dyn ReferenceTables,
    history: &dyn ReadingHistory,
) -> Result<EnrichedReading, EngineError> {
    LossEngine::new(tables, history).enrich(reading, chiller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chiller::{AmpChoice, UnitSystem};
    use crate::refrigerant::{AltitudeCorrectionRecord, InMemoryTables, SaturationRecord};
    use crate::run_hours::NoHistory;
    use approx::assert_abs_diff_eq;

    fn tables() -> InMemoryTables {
        let rows = [(45.0, 30.0), (55.0, 35.0), (150.0, 85.0), (180.0, 95.0)];
        InMemoryTables::new(
            rows.iter().map(|&(p, t)| SaturationRecord {
                refrigerant_name: "R22".into(),
                pressure_psig: p,
                temperature_f: t,
            }),
            vec![AltitudeCorrectionRecord {
                feet: 0.0,
                correction_psig: 0.0,
            }],
        )
    }

    fn chiller() -> ChillerConfig {
        ChillerConfig {
            id: "ch-1".into(),
            refrigerant: "R22".into(),
            full_load_amps: 100.0,
            use_run_hours: false,
            ..ChillerConfig::default()
        }
    }

    #[test]
    fn clamp_floor_is_exclusive() {
        assert_eq!(clamp_loss(1.5), 0.0);
        assert_eq!(clamp_loss(2.0), 2.0);
        assert_eq!(clamp_loss(2.5), 2.5);
    }

    #[test]
    fn cond_inlet_loss_against_benchmark() {
        let t = tables();
        let engine = LossEngine::new(&t, &NoHistory);
        let mut reading = Reading {
            cond_inlet_temp: Some(85.0),
            ..Reading::default()
        };
        let at_bench = engine.enrich(&reading, &chiller()).unwrap();
        assert_eq!(at_bench.derived.cond_inlet_loss, Some(0.0));

        reading.cond_inlet_temp = Some(90.0);
        let warm = engine.enrich(&reading, &chiller()).unwrap();
        assert_eq!(warm.derived.cond_inlet_loss, Some(10.0));
        assert_eq!(warm.derived.eff_loss, Some(10.0));
    }

    #[test]
    fn si_uses_celsius_benchmark_and_multiplier() {
        let t = tables();
        let engine = LossEngine::new(&t, &NoHistory);
        let cfg = ChillerConfig {
            unit_system: UnitSystem::SiMetric,
            ..chiller()
        };
        // benchmark 85°F -> 85/1.8 - 17.8 ≈ 29.42°C
        let reading = Reading {
            cond_inlet_temp: Some(32.0),
            ..Reading::default()
        };
        let out = engine.enrich(&reading, &cfg).unwrap();
        let expected = (32.0 - (85.0 / 1.8 - 17.8)) * 3.6;
        assert_abs_diff_eq!(out.derived.cond_inlet_loss.unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn percent_load_above_limit_is_rejected() {
        let t = tables();
        let cfg = ChillerConfig {
            amp_choice: AmpChoice::PercentLoad,
            ..chiller()
        };
        let reading = Reading {
            amps_phase1: Some(151.0),
            ..Reading::default()
        };
        let err = enrich(&reading, &cfg, &t, &NoHistory).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn lookup_failure_aborts_without_partial_result() {
        let t = tables();
        let reading = Reading {
            cond_inlet_temp: Some(95.0),
            cond_pressure: Some(10.0),
            ..Reading::default()
        };
        let err = enrich(&reading, &chiller(), &t, &NoHistory).unwrap_err();
        assert!(matches!(err, EngineError::ConversionNotFound { .. }));
    }

    #[test]
    fn run_hours_left_unset_when_not_tracked() {
        let t = tables();
        let reading = Reading {
            run_hours: Some(10.0),
            ..Reading::default()
        };
        let out = enrich(&reading, &chiller(), &t, &NoHistory).unwrap();
        assert_eq!(out.derived.valid_run_hours, None);

        let tracked = ChillerConfig {
            use_run_hours: true,
            ..chiller()
        };
        let out = enrich(&reading, &tracked, &t, &NoHistory).unwrap();
        assert_eq!(out.derived.valid_run_hours, Some(true));
    }

    #[test]
    fn recompute_matches_full_enrichment() {
        let t = tables();
        let engine = LossEngine::new(&t, &NoHistory);
        let cfg = chiller();
        let mut reading = Reading {
            cond_inlet_temp: Some(88.0),
            cond_outlet_temp: Some(90.0),
            cond_pressure: Some(182.0),
            amps_phase1: Some(80.0),
            amps_phase2: Some(80.0),
            amps_phase3: Some(80.0),
            oil_pressure_diff: Some(20.0),
            ..Reading::default()
        };
        let first = engine.enrich(&reading, &cfg).unwrap();

        reading.cond_pressure = Some(152.0);
        let mut edited = first.clone();
        edited.reading = reading.clone();
        let partial = engine.recompute(&edited, &[Field::CondPressure], &cfg).unwrap();
        let full = engine.enrich(&reading, &cfg).unwrap();
        assert_eq!(partial, full);
        assert_eq!(partial.derived.final_oil_diff, first.derived.final_oil_diff);
        assert_ne!(partial.derived.cond_approach, first.derived.cond_approach);
    }
}
