use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::chiller::ChillerConfig;
use crate::config::{ConfigError, ReferenceConfig};
use crate::conversion;
use crate::engine::LossEngine;
use crate::error::EngineError;
use crate::reading::EnrichedReading;
use crate::refrigerant::{InMemoryTables, TableError};
use crate::report::{
    summarize_chiller, summarize_company, ChillerSummary, CompanySummary, DateRange,
};
use crate::run_hours::InMemoryHistory;
use crate::sanitize::{reading_from_payload, sanitize};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reference table error: {0}")]
    Table(#[from] TableError),
    #[error("reading {index}: {source}")]
    Reading { index: usize, source: EngineError },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub fn load_tables(reference: &ReferenceConfig) -> Result<InMemoryTables, AppError> {
    let tables =
        InMemoryTables::from_csv_paths(&reference.saturation_csv, &reference.altitude_csv)?;
    info!(refrigerants = tables.refrigerants().len(), "reference tables loaded");
    Ok(tables)
}

pub fn load_chiller(path: &Path) -> Result<ChillerConfig, AppError> {
    let chiller: ChillerConfig = read_json(path)?;
    chiller.validate()?;
    Ok(chiller)
}

/// Enriches a JSON array of reading payloads for one chiller. Run-hours
/// neighbours are taken from the same batch.
pub fn enrich_file(
    chiller: &ChillerConfig,
    readings_path: &Path,
    tables: &InMemoryTables,
) -> Result<Vec<EnrichedReading>, AppError> {
    let payloads: Vec<Map<String, Value>> = read_json(readings_path)?;
    let readings = payloads
        .into_iter()
        .enumerate()
        .map(|(index, p)| {
            reading_from_payload(p, chiller).map_err(|source| AppError::Reading { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let history = InMemoryHistory::new(&readings);
    let engine = LossEngine::new(tables, &history);
    let enriched = readings
        .iter()
        .enumerate()
        .map(|(index, r)| {
            engine
                .enrich(r, chiller)
                .map_err(|source| AppError::Reading { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let flagged = enriched
        .iter()
        .filter(|e| e.derived.valid_run_hours == Some(false))
        .count();
    if flagged > 0 {
        warn!(flagged, "readings with implausible run hours");
    }
    info!(chiller = %chiller.id, readings = enriched.len(), "enrichment complete");
    Ok(enriched)
}

pub fn sanitize_file(
    chiller: &ChillerConfig,
    payload_path: &Path,
) -> Result<Map<String, Value>, AppError> {
    let payload: Map<String, Value> = read_json(payload_path)?;
    Ok(sanitize(payload, chiller))
}

/// Per-chiller summaries in chiller-id order, plus the company roll-up.
pub fn report_file(
    enriched_path: &Path,
    company: &str,
    range: &DateRange,
) -> Result<(Vec<ChillerSummary>, CompanySummary), AppError> {
    let enriched: Vec<EnrichedReading> = read_json(enriched_path)?;
    let mut by_chiller: BTreeMap<&str, Vec<EnrichedReading>> = BTreeMap::new();
    for e in &enriched {
        by_chiller
            .entry(e.reading.chiller_id.as_str())
            .or_default()
            .push(e.clone());
    }
    let chillers: Vec<ChillerSummary> = by_chiller
        .iter()
        .map(|(id, readings)| summarize_chiller(id, readings, range))
        .collect();
    let summary = summarize_company(company, &chillers);
    Ok((chillers, summary))
}

/// Unit conversion for the `convert` subcommand.
pub fn convert(quantity: Quantity, from: &str, to: &str, value: f64) -> Result<f64, AppError> {
    let out = match quantity {
        Quantity::Temperature => conversion::convert_temperature_str(from, to, value)?,
        Quantity::Degrees => conversion::convert_degrees_str(from, to, value)?,
        Quantity::Pressure => conversion::convert_pressure_str(from, to, value)?,
    };
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Quantity {
    Temperature,
    /// Temperature difference, scale only.
    Degrees,
    Pressure,
}
