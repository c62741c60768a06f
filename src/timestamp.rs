//! Reading timestamp normalization to UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::EngineError;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const TIME_FORMATS: [&str; 4] = ["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// UTC offset in hours for a North American or universal zone abbreviation.
pub fn offset_hours(abbrev: &str) -> Option<i32> {
    let hours = match abbrev.trim().to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "Z" => 0,
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        "AKST" => -9,
        "AKDT" => -8,
        "HST" => -10,
        _ => return None,
    };
    Some(hours)
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
}

fn parse_time(time: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())
}

/// Combines a local date, optional wall-clock time and zone abbreviation into
/// a UTC instant. A full RFC 3339 `date` is accepted as is and the other parts
/// are ignored. Missing time means midnight, missing zone means UTC.
pub fn normalize_timestamp(
    date: &str,
    time: Option<&str>,
    tz_abbrev: Option<&str>,
) -> Result<DateTime<Utc>, EngineError> {
    let date = date.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Ok(dt.with_timezone(&Utc));
    }

    let day = parse_date(date)
        .ok_or_else(|| EngineError::InvalidTimestamp(format!("unrecognised date {date:?}")))?;
    let clock = match time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => parse_time(t)
            .ok_or_else(|| EngineError::InvalidTimestamp(format!("unrecognised time {t:?}")))?,
        None => NaiveTime::MIN,
    };
    let zone = tz_abbrev.map(str::trim).filter(|z| !z.is_empty()).unwrap_or("UTC");
    let hours = offset_hours(zone)
        .ok_or_else(|| EngineError::InvalidTimestamp(format!("unsupported timezone {zone:?}")))?;
    let offset = FixedOffset::east_opt(hours * 3600)
        .ok_or_else(|| EngineError::InvalidTimestamp(format!("offset out of range for {zone}")))?;

    offset
        .from_local_datetime(&NaiveDateTime::new(day, clock))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| EngineError::InvalidTimestamp(format!("ambiguous local time in {zone}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_time_with_zone_becomes_utc() {
        let ts = normalize_timestamp("2024-07-04", Some("14:30"), Some("EDT")).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 7, 4, 18, 30, 0).unwrap());
        let us = normalize_timestamp("01/15/2024", Some("7:05 AM"), Some("pst")).unwrap();
        assert_eq!(us, Utc.with_ymd_and_hms(2024, 1, 15, 15, 5, 0).unwrap());
    }

    #[test]
    fn defaults_to_midnight_utc() {
        let ts = normalize_timestamp("2024-02-29", None, None).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn rfc3339_passes_through() {
        let ts = normalize_timestamp("2024-03-01T10:00:00-06:00", Some("ignored"), None).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap());
    }

    #[test]
    fn bad_parts_are_invalid_timestamps() {
        for (d, t, z) in [
            ("2024-13-01", None, None),
            ("2024-01-01", Some("25:99"), None),
            ("2024-01-01", Some("10:00"), Some("CEST")),
        ] {
            assert!(matches!(
                normalize_timestamp(d, t, z),
                Err(EngineError::InvalidTimestamp(_))
            ));
        }
    }
}
