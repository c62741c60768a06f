//! Refrigerant saturation curve and altitude correction lookups.

pub mod altitude;
pub mod saturation;
pub mod tables;

pub use altitude::find_altitude_correction;
pub use saturation::{
    find_by_pressure, find_by_temperature, saturation_pressure, saturation_temperature,
};
pub use tables::{
    AltitudeCorrectionRecord, InMemoryTables, ReferenceTables, SaturationRecord, TableError,
};
