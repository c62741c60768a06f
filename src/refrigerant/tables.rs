use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// One point of a refrigerant saturation curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaturationRecord {
    #[serde(rename = "refrigerant")]
    pub refrigerant_name: String,
    pub pressure_psig: f64,
    pub temperature_f: f64,
}

/// Gauge correction for a site elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeCorrectionRecord {
    pub feet: f64,
    pub correction_psig: f64,
}

/// Read-only query contract of the reference store.
///
/// Implementations backed by a remote store report a failed or timed out
/// query as `None`; the lookup layer turns that into `ConversionNotFound`.
pub trait ReferenceTables {
    /// Record with the largest pressure not exceeding `pressure_psig`.
    fn saturation_at_or_below_pressure(
        &self,
        refrigerant: &str,
        pressure_psig: f64,
    ) -> Option<SaturationRecord>;

    /// Record with the largest temperature not exceeding `temperature_f`.
    fn saturation_at_or_below_temperature(
        &self,
        refrigerant: &str,
        temperature_f: f64,
    ) -> Option<SaturationRecord>;

    /// Smallest record with `feet >= feet`.
    fn altitude_at_or_above(&self, feet: f64) -> Option<AltitudeCorrectionRecord>;

    /// Largest record with `feet <= feet`.
    fn altitude_at_or_below(&self, feet: f64) -> Option<AltitudeCorrectionRecord>;
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("reference table io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("reference table csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Default, Clone)]
struct Curve {
    by_pressure: Vec<SaturationRecord>,
    by_temperature: Vec<SaturationRecord>,
}

/// Reference tables held in memory, sorted once on construction.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTables {
    curves: HashMap<String, Curve>,
    altitude: Vec<AltitudeCorrectionRecord>,
}

fn curve_key(refrigerant: &str) -> String {
    refrigerant.trim().to_uppercase()
}

impl InMemoryTables {
    pub fn new(
        saturation: impl IntoIterator<Item = SaturationRecord>,
        altitude: impl IntoIterator<Item = AltitudeCorrectionRecord>,
    ) -> Self {
        let mut curves: HashMap<String, Curve> = HashMap::new();
        for rec in saturation {
            if !rec.pressure_psig.is_finite() || !rec.temperature_f.is_finite() {
                continue;
            }
            let curve = curves.entry(curve_key(&rec.refrigerant_name)).or_default();
            curve.by_pressure.push(rec.clone());
            curve.by_temperature.push(rec);
        }
        for curve in curves.values_mut() {
            curve
                .by_pressure
                .sort_by(|a, b| a.pressure_psig.total_cmp(&b.pressure_psig));
            curve
                .by_temperature
                .sort_by(|a, b| a.temperature_f.total_cmp(&b.temperature_f));
        }

        let mut altitude: Vec<_> = altitude
            .into_iter()
            .filter(|r| r.feet.is_finite() && r.correction_psig.is_finite())
            .collect();
        altitude.sort_by(|a, b| a.feet.total_cmp(&b.feet));

        Self { curves, altitude }
    }

    /// Loads both tables from CSV files with headers
    /// `refrigerant,pressure_psig,temperature_f` and `feet,correction_psig`.
    pub fn from_csv_paths(saturation: &Path, altitude: &Path) -> Result<Self, TableError> {
        let sat = read_csv::<SaturationRecord>(saturation)?;
        let alt = read_csv::<AltitudeCorrectionRecord>(altitude)?;
        debug!(
            saturation_rows = sat.len(),
            altitude_rows = alt.len(),
            "loaded reference tables"
        );
        Ok(Self::new(sat, alt))
    }

    pub fn refrigerants(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.curves.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn read_csv<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, TableError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

impl ReferenceTables for InMemoryTables {
    fn saturation_at_or_below_pressure(
        &self,
        refrigerant: &str,
        pressure_psig: f64,
    ) -> Option<SaturationRecord> {
        let curve = self.curves.get(&curve_key(refrigerant))?;
        let idx = curve
            .by_pressure
            .partition_point(|r| r.pressure_psig <= pressure_psig);
        idx.checked_sub(1).map(|i| curve.by_pressure[i].clone())
    }

    fn saturation_at_or_below_temperature(
        &self,
        refrigerant: &str,
        temperature_f: f64,
    ) -> Option<SaturationRecord> {
        let curve = self.curves.get(&curve_key(refrigerant))?;
        let idx = curve
            .by_temperature
            .partition_point(|r| r.temperature_f <= temperature_f);
        idx.checked_sub(1).map(|i| curve.by_temperature[i].clone())
    }

    fn altitude_at_or_above(&self, feet: f64) -> Option<AltitudeCorrectionRecord> {
        let idx = self.altitude.partition_point(|r| r.feet < feet);
        self.altitude.get(idx).copied()
    }

    fn altitude_at_or_below(&self, feet: f64) -> Option<AltitudeCorrectionRecord> {
        let idx = self.altitude.partition_point(|r| r.feet <= feet);
        idx.checked_sub(1).map(|i| self.altitude[i])
    }
}
