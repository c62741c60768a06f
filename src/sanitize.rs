//! Removal of fields that do not apply to a chiller's logging configuration.

use serde_json::{Map, Value};
use tracing::debug;

use crate::chiller::{AmpChoice, ChillerConfig, OilPressureMode, VoltageChoice};
use crate::error::EngineError;
use crate::reading::{Field, Reading};
use crate::timestamp::normalize_timestamp;

/// Extra payload keys read alongside a bare `readingDate`.
pub const READING_TIME_KEY: &str = "readingTime";
pub const TIMEZONE_KEY: &str = "timezone";

/// Raw fields the chiller's configuration says are not logged.
pub fn inapplicable_fields(chiller: &ChillerConfig) -> Vec<Field> {
    let mut out = Vec::new();
    if !chiller.high_pressure_refrig {
        out.push(Field::CondRefrigTemp);
    }
    if !chiller.use_evap_refrig_temp {
        out.push(Field::EvapRefrigTemp);
    }
    if chiller.amp_choice != AmpChoice::ThreePhase {
        out.extend([Field::AmpsPhase2, Field::AmpsPhase3]);
    }
    match chiller.voltage_choice {
        VoltageChoice::ThreePhase => {}
        VoltageChoice::SinglePhase => out.extend([Field::VoltsPhase2, Field::VoltsPhase3]),
        VoltageChoice::DoNotLog => {
            out.extend([Field::VoltsPhase1, Field::VoltsPhase2, Field::VoltsPhase3])
        }
    }
    match chiller.oil_pressure_mode {
        OilPressureMode::Differential => {
            out.extend([Field::OilPressureHigh, Field::OilPressureLow])
        }
        OilPressureMode::HighOnly => out.extend([Field::OilPressureDiff, Field::OilPressureLow]),
        OilPressureMode::HighAndLow => out.push(Field::OilPressureDiff),
        OilPressureMode::DoNotLog => out.extend([
            Field::OilPressureDiff,
            Field::OilPressureHigh,
            Field::OilPressureLow,
        ]),
    }
    if !chiller.have_bearing_temp {
        out.push(Field::BearingTemp);
    }
    if !chiller.have_purge {
        out.push(Field::PurgeTime);
    }
    if !chiller.use_run_hours {
        out.extend([Field::RunHours, Field::RunHourStart]);
    }
    out
}

/// Drops inapplicable raw fields and every derived field from `payload`.
pub fn sanitize(mut payload: Map<String, Value>, chiller: &ChillerConfig) -> Map<String, Value> {
    let before = payload.len();
    for field in inapplicable_fields(chiller).into_iter().chain(Field::DERIVED) {
        payload.remove(field.as_str());
    }
    debug!(removed = before - payload.len(), "sanitized reading payload");
    payload
}

/// Sanitizes `payload` and builds a [`Reading`] from what remains.
///
/// A `readingDate` that is not RFC 3339 is combined with the optional
/// `readingTime` and `timezone` keys into a UTC instant.
pub fn reading_from_payload(
    payload: Map<String, Value>,
    chiller: &ChillerConfig,
) -> Result<Reading, EngineError> {
    let mut payload = sanitize(payload, chiller);
    let time = payload.remove(READING_TIME_KEY);
    let zone = payload.remove(TIMEZONE_KEY);

    let date = match payload.get(Field::ReadingDate.as_str()) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(EngineError::InvalidTimestamp(format!(
                "readingDate must be a string, got {other}"
            )))
        }
        None => return Err(EngineError::InvalidTimestamp("readingDate is missing".into())),
    };
    let ts = normalize_timestamp(
        &date,
        time.as_ref().and_then(Value::as_str),
        zone.as_ref().and_then(Value::as_str),
    )?;
    payload.insert(Field::ReadingDate.as_str().into(), Value::String(ts.to_rfc3339()));

    let mut reading: Reading = serde_json::from_value(Value::Object(payload))
        .map_err(|e| EngineError::Validation(format!("malformed reading: {e}")))?;
    if reading.chiller_id.is_empty() {
        reading.chiller_id = chiller.id.clone();
    }
    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn payload(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn volts_and_derived_dropped_when_voltage_not_logged() {
        let chiller = ChillerConfig {
            voltage_choice: VoltageChoice::DoNotLog,
            ..ChillerConfig::default()
        };
        let mut raw = payload(json!({
            "voltsPhase1": 460.0,
            "voltsPhase2": 461.0,
            "voltsPhase3": 459.0,
            "ampsPhase1": 100.0,
        }));
        for field in Field::DERIVED {
            raw.insert(field.as_str().into(), json!(1.0));
        }
        let clean = sanitize(raw, &chiller);
        assert_eq!(clean.len(), 1);
        assert!(clean.contains_key("ampsPhase1"));
    }

    #[test]
    fn flags_control_optional_sensors() {
        let chiller = ChillerConfig {
            high_pressure_refrig: false,
            have_purge: true,
            amp_choice: AmpChoice::SinglePhase,
            oil_pressure_mode: OilPressureMode::HighOnly,
            ..ChillerConfig::default()
        };
        let clean = sanitize(
            payload(json!({
                "condRefrigTemp": 95.0,
                "evapRefrigTemp": 40.0,
                "ampsPhase1": 10.0,
                "ampsPhase2": 10.0,
                "oilPressureHigh": 60.0,
                "oilPressureDiff": 20.0,
                "bearingTemp": 150.0,
                "purgeTime": 3.0,
                "runHours": 100.0,
            })),
            &chiller,
        );
        let mut keys: Vec<&str> = clean.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["ampsPhase1", "oilPressureHigh", "purgeTime", "runHours"]);
    }

    #[test]
    fn payload_becomes_reading_with_utc_timestamp() {
        let chiller = ChillerConfig {
            id: "ch-7".into(),
            ..ChillerConfig::default()
        };
        let reading = reading_from_payload(
            payload(json!({
                "readingDate": "2024-05-01",
                "readingTime": "06:00",
                "timezone": "CDT",
                "condInletTemp": 86.5,
                "condInletLoss": 99.0,
            })),
            &chiller,
        )
        .unwrap();
        assert_eq!(reading.chiller_id, "ch-7");
        assert_eq!(reading.reading_date, Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap());
        assert_eq!(reading.cond_inlet_temp, Some(86.5));
    }

    #[test]
    fn missing_or_bad_date_is_rejected() {
        let chiller = ChillerConfig::default();
        let err = reading_from_payload(payload(json!({"condInletTemp": 80.0})), &chiller);
        assert!(matches!(err, Err(EngineError::InvalidTimestamp(_))));
        let err = reading_from_payload(
            payload(json!({"readingDate": "2024-05-01", "timezone": "XYZ"})),
            &chiller,
        );
        assert!(matches!(err, Err(EngineError::InvalidTimestamp(_))));
    }
}
