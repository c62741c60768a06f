//! Plausibility check of the cumulative compressor hour meter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reading::Reading;

/// One shift of slack for meter-reading timing imprecision.
const SLACK_HOURS: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunHoursDirection {
    High,
    Low,
}

/// Run-hours value of a neighbouring reading for the same chiller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunHoursSample {
    pub timestamp: DateTime<Utc>,
    pub run_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunHoursCheck {
    pub is_valid: bool,
    /// Set only when the reading is invalid against a bound.
    pub direction: Option<RunHoursDirection>,
}

impl RunHoursCheck {
    const VALID: RunHoursCheck = RunHoursCheck {
        is_valid: true,
        direction: None,
    };

    fn invalid(direction: Option<RunHoursDirection>) -> Self {
        Self {
            is_valid: false,
            direction,
        }
    }
}

/// Whole hours from `earlier` to `later`, truncated toward zero.
pub fn hours_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
    (later - earlier).num_hours()
}

/// Validates `run_hours` recorded at `timestamp` against its neighbours.
///
/// The low-side violation against the previous reading wins over everything
/// else, then the high-side violation against the previous reading, then the
/// checks against the next reading. `run_hour_start` marks a meter restart and
/// turns any violation into a valid result.
pub fn validate_run_hours(
    run_hours: Option<f64>,
    timestamp: DateTime<Utc>,
    run_hour_start: bool,
    previous: Option<RunHoursSample>,
    next: Option<RunHoursSample>,
) -> RunHoursCheck {
    let current = match run_hours {
        Some(v) if v.is_finite() => v,
        _ => return RunHoursCheck::invalid(None),
    };

    let mut direction = None;

    if let Some(prev) = previous {
        let elapsed = hours_between(timestamp, prev.timestamp) as f64;
        let upper = elapsed + prev.run_hours + SLACK_HOURS;
        if current < prev.run_hours {
            direction = Some(RunHoursDirection::Low);
        } else if current > upper {
            direction = Some(RunHoursDirection::High);
        }
    }

    if direction.is_none() {
        if let Some(next) = next {
            let elapsed = hours_between(next.timestamp, timestamp) as f64;
            let lower = next.run_hours - elapsed - SLACK_HOURS;
            if current < lower {
                direction = Some(RunHoursDirection::Low);
            } else if current > next.run_hours {
                direction = Some(RunHoursDirection::High);
            }
        }
    }

    match direction {
        None => RunHoursCheck::VALID,
        Some(_) if run_hour_start => RunHoursCheck::VALID,
        Some(d) => RunHoursCheck::invalid(Some(d)),
    }
}

/// Read-only access to neighbouring readings of the same chiller.
pub trait ReadingHistory {
    /// Latest reading strictly before `at` that carries a run-hours value.
    fn previous_run_hours(&self, chiller_id: &str, at: DateTime<Utc>) -> Option<RunHoursSample>;

    /// Earliest reading strictly after `at` that carries a run-hours value.
    fn next_run_hours(&self, chiller_id: &str, at: DateTime<Utc>) -> Option<RunHoursSample>;
}

/// History with no neighbours; every reading is checked on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl ReadingHistory for NoHistory {
    fn previous_run_hours(&self, _: &str, _: DateTime<Utc>) -> Option<RunHoursSample> {
        None
    }

    fn next_run_hours(&self, _: &str, _: DateTime<Utc>) -> Option<RunHoursSample> {
        None
    }
}

/// History over an in-memory set of readings.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    samples: Vec<(String, RunHoursSample)>,
}

impl InMemoryHistory {
    pub fn new<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> Self {
        let mut samples: Vec<(String, RunHoursSample)> = readings
            .into_iter()
            .filter_map(|r| {
                let run_hours = r.run_hours.filter(|v| v.is_finite())?;
                Some((
                    r.chiller_id.clone(),
                    RunHoursSample {
                        timestamp: r.reading_date,
                        run_hours,
                    },
                ))
            })
            .collect();
        samples.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.timestamp.cmp(&b.1.timestamp)));
        Self { samples }
    }

    fn for_chiller<'s>(
        &'s self,
        chiller_id: &'s str,
    ) -> impl Iterator<Item = RunHoursSample> + 's {
        self.samples
            .iter()
            .filter(move |(id, _)| id == chiller_id)
            .map(|(_, s)| *s)
    }
}

impl ReadingHistory for InMemoryHistory {
    fn previous_run_hours(&self, chiller_id: &str, at: DateTime<Utc>) -> Option<RunHoursSample> {
        self.for_chiller(chiller_id).filter(|s| s.timestamp < at).last()
    }

    fn next_run_hours(&self, chiller_id: &str, at: DateTime<Utc>) -> Option<RunHoursSample> {
        self.for_chiller(chiller_id).find(|s| s.timestamp > at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn sample(hours_after: i64, run_hours: f64) -> RunHoursSample {
        RunHoursSample {
            timestamp: t0() + Duration::hours(hours_after),
            run_hours,
        }
    }

    #[test]
    fn hours_between_truncates_partial_hours() {
        let later = t0() + Duration::minutes(179);
        assert_eq!(hours_between(later, t0()), 2);
        assert_eq!(hours_between(t0(), later), -2);
    }

    #[test]
    fn upper_bound_is_inclusive() {
        // 24h elapsed, previous 1000 -> bound 1032
        let now = t0() + Duration::hours(24);
        let prev = Some(sample(0, 1000.0));
        assert!(validate_run_hours(Some(1032.0), now, false, prev, None).is_valid);
        let over = validate_run_hours(Some(1033.0), now, false, prev, None);
        assert_eq!(over, RunHoursCheck::invalid(Some(RunHoursDirection::High)));
    }

    #[test]
    fn below_previous_is_low() {
        let now = t0() + Duration::hours(24);
        let res = validate_run_hours(Some(999.0), now, false, Some(sample(0, 1000.0)), None);
        assert_eq!(res.direction, Some(RunHoursDirection::Low));
    }

    #[test]
    fn next_reading_bounds() {
        let now = t0();
        let next = Some(sample(48, 2000.0));
        // lower = 2000 - 48 - 8 = 1944
        assert!(validate_run_hours(Some(1944.0), now, false, None, next).is_valid);
        let low = validate_run_hours(Some(1943.0), now, false, None, next);
        assert_eq!(low.direction, Some(RunHoursDirection::Low));
        let high = validate_run_hours(Some(2001.0), now, false, None, next);
        assert_eq!(high.direction, Some(RunHoursDirection::High));
    }

    #[test]
    fn low_against_previous_takes_priority() {
        let now = t0() + Duration::hours(10);
        // below previous (Low) and above next (High) at once
        let res = validate_run_hours(
            Some(500.0),
            now,
            false,
            Some(sample(0, 600.0)),
            Some(sample(20, 400.0)),
        );
        assert_eq!(res.direction, Some(RunHoursDirection::Low));
    }

    #[test]
    fn restart_flag_overrides_violation() {
        let now = t0() + Duration::hours(24);
        let res = validate_run_hours(Some(3.0), now, true, Some(sample(0, 1000.0)), None);
        assert!(res.is_valid);
        assert_eq!(res.direction, None);
    }

    #[test]
    fn missing_value_is_invalid_without_direction() {
        let res = validate_run_hours(None, t0(), true, None, None);
        assert_eq!(res, RunHoursCheck::invalid(None));
        assert!(!validate_run_hours(Some(f64::NAN), t0(), false, None, None).is_valid);
    }

    #[test]
    fn history_picks_adjacent_readings_with_values() {
        let mk = |id: &str, h: i64, rh: Option<f64>| Reading {
            chiller_id: id.into(),
            reading_date: t0() + Duration::hours(h),
            run_hours: rh,
            ..Default::default()
        };
        let readings = vec![
            mk("a", 0, Some(100.0)),
            mk("a", 10, Some(110.0)),
            mk("a", 20, None),
            mk("b", 25, Some(5.0)),
            mk("a", 30, Some(130.0)),
        ];
        let history = InMemoryHistory::new(&readings);
        let at = t0() + Duration::hours(20);
        assert_eq!(history.previous_run_hours("a", at).unwrap().run_hours, 110.0);
        assert_eq!(history.next_run_hours("a", at).unwrap().run_hours, 130.0);
        assert!(history.previous_run_hours("b", at).is_none());
    }
}
