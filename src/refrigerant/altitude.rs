use tracing::debug;

use super::tables::ReferenceTables;

/// Gauge correction (psi) for a site elevation.
///
/// Both bracketing records are fetched and the one whose `feet` is closer to
/// the query wins; ties go to the higher record. With one bracket that record
/// is used, with none the correction is 0. Sea level skips the table.
pub fn find_altitude_correction(tables: &dyn ReferenceTables, feet: f64) -> f64 {
    if feet == 0.0 {
        return 0.0;
    }
    let top = tables.altitude_at_or_above(feet);
    let bottom = tables.altitude_at_or_below(feet);
    let chosen = match (top, bottom) {
        (Some(t), Some(b)) => {
            if (t.feet - feet).abs() <= (feet - b.feet).abs() {
                Some(t)
            } else {
                Some(b)
            }
        }
        (Some(t), None) => Some(t),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    debug!(feet, ?chosen, "altitude correction");
    chosen.map_or(0.0, |r| r.correction_psig)
}
