//! Chiller and company performance summaries over enriched readings.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reading::{DerivedFields, EnrichedReading};

/// Half-open interval `[start, end)`. An open side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at < e)
    }
}

/// Average of each contributing loss term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LossBreakdown {
    pub cond_inlet: f64,
    pub cond_approach: f64,
    pub evap_temp: f64,
    pub evap_approach: f64,
    pub non_condensables: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChillerSummary {
    pub chiller_id: String,
    pub reading_count: usize,
    /// Mean `effLoss` in percent.
    pub average_loss: f64,
    pub target_cost: f64,
    pub actual_cost: f64,
    pub loss_cost: f64,
    #[serde(rename = "KWHLoss")]
    pub kwh_loss: f64,
    #[serde(rename = "BTULoss")]
    pub btu_loss: f64,
    #[serde(rename = "CO2")]
    pub co2: f64,
    pub breakdown: LossBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub company: String,
    /// Chillers with at least one reading in range.
    pub chiller_count: usize,
    pub reading_count: usize,
    /// Mean of per-chiller average losses.
    pub average_loss: f64,
    pub target_cost: f64,
    pub actual_cost: f64,
    pub loss_cost: f64,
    #[serde(rename = "KWHLoss")]
    pub kwh_loss: f64,
    #[serde(rename = "BTULoss")]
    pub btu_loss: f64,
    /// Tons, rounded to a whole number.
    #[serde(rename = "CO2")]
    pub co2: f64,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn sum_rounded(derived: &[&DerivedFields], pick: fn(&DerivedFields) -> Option<f64>) -> f64 {
    round_to(derived.iter().filter_map(|d| pick(d)).sum(), 2)
}

fn mean_of(derived: &[&DerivedFields], pick: fn(&DerivedFields) -> Option<f64>) -> f64 {
    mean(derived.iter().filter_map(|d| pick(d)))
}

/// Summarizes the readings of `chiller_id` that fall in `range`.
pub fn summarize_chiller(
    chiller_id: &str,
    readings: &[EnrichedReading],
    range: &DateRange,
) -> ChillerSummary {
    let derived: Vec<&DerivedFields> = readings
        .iter()
        .filter(|r| r.reading.chiller_id == chiller_id && range.contains(r.reading.reading_date))
        .map(|r| &r.derived)
        .collect();

    ChillerSummary {
        chiller_id: chiller_id.to_string(),
        reading_count: derived.len(),
        average_loss: mean_of(&derived, |d| d.eff_loss),
        target_cost: sum_rounded(&derived, |d| d.target_cost),
        actual_cost: sum_rounded(&derived, |d| d.actual_cost),
        loss_cost: sum_rounded(&derived, |d| d.loss_cost),
        kwh_loss: sum_rounded(&derived, |d| d.kwh_loss),
        btu_loss: sum_rounded(&derived, |d| d.btu_loss),
        co2: sum_rounded(&derived, |d| d.co2),
        breakdown: LossBreakdown {
            cond_inlet: mean_of(&derived, |d| d.cond_inlet_loss),
            cond_approach: mean_of(&derived, |d| d.cond_app_loss),
            evap_temp: mean_of(&derived, |d| d.evap_temp_loss),
            evap_approach: mean_of(&derived, |d| d.efl_evap_app_loss),
            non_condensables: mean_of(&derived, |d| d.non_cond_loss),
            delta: mean_of(&derived, |d| d.delta_loss),
        },
    }
}

/// Rolls chiller summaries up to company level. Chillers without readings in
/// range do not count toward the average.
pub fn summarize_company(company: &str, chillers: &[ChillerSummary]) -> CompanySummary {
    let active: Vec<&ChillerSummary> = chillers.iter().filter(|c| c.reading_count > 0).collect();
    let total = |pick: fn(&ChillerSummary) -> f64| -> f64 { active.iter().map(|c| pick(c)).sum() };

    CompanySummary {
        company: company.to_string(),
        chiller_count: active.len(),
        reading_count: active.iter().map(|c| c.reading_count).sum(),
        average_loss: mean(active.iter().map(|c| c.average_loss)),
        target_cost: round_to(total(|c| c.target_cost), 2),
        actual_cost: round_to(total(|c| c.actual_cost), 2),
        loss_cost: round_to(total(|c| c.loss_cost), 2),
        kwh_loss: round_to(total(|c| c.kwh_loss), 2),
        btu_loss: round_to(total(|c| c.btu_loss), 2),
        co2: round_to(total(|c| c.co2), 0),
    }
}

impl fmt::Display for ChillerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Chiller {} ({} readings) ---", self.chiller_id, self.reading_count)?;
        writeln!(f, "Average loss:      {:.2}%", self.average_loss)?;
        writeln!(f, "  cond inlet:      {:.2}%", self.breakdown.cond_inlet)?;
        writeln!(f, "  cond approach:   {:.2}%", self.breakdown.cond_approach)?;
        writeln!(f, "  evap temp:       {:.2}%", self.breakdown.evap_temp)?;
        writeln!(f, "  evap approach:   {:.2}%", self.breakdown.evap_approach)?;
        writeln!(f, "  non-cond:        {:.2}%", self.breakdown.non_condensables)?;
        writeln!(f, "  delta:           {:.2}%", self.breakdown.delta)?;
        writeln!(
            f,
            "Cost target/actual/loss: {:.2} / {:.2} / {:.2}",
            self.target_cost, self.actual_cost, self.loss_cost
        )?;
        writeln!(f, "Energy loss:       {:.2} kWh ({:.2} BTU)", self.kwh_loss, self.btu_loss)?;
        write!(f, "CO2:               {:.2} t", self.co2)
    }
}

impl fmt::Display for CompanySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== {} ({} chillers, {} readings) ===",
            self.company, self.chiller_count, self.reading_count
        )?;
        writeln!(f, "Average loss:      {:.2}%", self.average_loss)?;
        writeln!(
            f,
            "Cost target/actual/loss: {:.2} / {:.2} / {:.2}",
            self.target_cost, self.actual_cost, self.loss_cost
        )?;
        writeln!(f, "Energy loss:       {:.2} kWh ({:.2} BTU)", self.kwh_loss, self.btu_loss)?;
        write!(f, "CO2:               {:.0} t", self.co2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Reading;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn enriched(id: &str, day: i64, eff_loss: f64, loss_cost: f64) -> EnrichedReading {
        EnrichedReading {
            reading: Reading {
                chiller_id: id.into(),
                reading_date: t0() + Duration::days(day),
                ..Reading::default()
            },
            derived: DerivedFields {
                eff_loss: Some(eff_loss),
                loss_cost: Some(loss_cost),
                co2: Some(0.6),
                ..DerivedFields::default()
            },
        }
    }

    #[test]
    fn range_is_half_open() {
        let r = DateRange::new(Some(t0()), Some(t0() + Duration::days(1)));
        assert!(r.contains(t0()));
        assert!(!r.contains(t0() + Duration::days(1)));
        assert!(DateRange::default().contains(t0() - Duration::days(900)));
    }

    #[test]
    fn chiller_summary_filters_and_rounds() {
        let readings = vec![
            enriched("a", 0, 4.0, 10.004),
            enriched("a", 1, 8.0, 10.004),
            enriched("b", 1, 50.0, 99.0),
            enriched("a", 40, 90.0, 99.0),
        ];
        let range = DateRange::new(None, Some(t0() + Duration::days(30)));
        let s = summarize_chiller("a", &readings, &range);
        assert_eq!(s.reading_count, 2);
        assert_eq!(s.average_loss, 6.0);
        assert_eq!(s.loss_cost, 20.01);
        assert_eq!(s.target_cost, 0.0);
    }

    #[test]
    fn company_average_is_mean_of_chiller_averages() {
        let mut readings = vec![enriched("a", 0, 10.0, 1.0)];
        readings.extend((0..3).map(|d| enriched("b", d, 20.0, 1.0)));
        let range = DateRange::default();
        let chillers = [
            summarize_chiller("a", &readings, &range),
            summarize_chiller("b", &readings, &range),
            summarize_chiller("idle", &readings, &range),
        ];
        let company = summarize_company("Acme", &chillers);
        assert_eq!(company.average_loss, 15.0);
        assert_eq!(company.chiller_count, 2);
        assert_eq!(company.reading_count, 4);
        assert_eq!(company.loss_cost, 4.0);
        // 0.6 + 1.8 = 2.4 -> 2
        assert_eq!(company.co2, 2.0);
    }

    #[test]
    fn co2_reported_in_tons() {
        let readings: Vec<_> = (0..5).map(|d| enriched("a", d, 10.0, 1.0)).collect();
        let chillers = [summarize_chiller("a", &readings, &DateRange::default())];
        let company = summarize_company("Acme", &chillers);
        // 5 * 0.6 = 3 t
        assert_eq!(company.co2, 3.0);
        assert!(company.to_string().ends_with("CO2:               3 t"));
        assert!(chillers[0].to_string().contains("3.00 t"));
    }
}
