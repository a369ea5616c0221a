//! The EV registration record type and its field conventions.

use serde::Serialize;

/// Powertrain label used by the source dataset for battery-electric vehicles.
pub const BEV_TYPE: &str = "Battery Electric Vehicle (BEV)";
/// Powertrain label used by the source dataset for plug-in hybrids.
pub const PHEV_TYPE: &str = "Plug-in Hybrid Electric Vehicle (PHEV)";
/// CAFV status string marking a vehicle as eligible.
pub const CAFV_ELIGIBLE: &str = "Clean Alternative Fuel Vehicle Eligible";

/// One vehicle registration row.
///
/// Numeric fields use 0 as a "missing" sentinel: `model_year == 0` and
/// `electric_range == 0` are excluded from means and extents downstream,
/// never from counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvRecord {
    pub vin: String,
    pub county: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub model_year: u16,
    pub make: String,
    pub model: String,
    pub ev_type: String,
    pub cafv_eligibility: String,
    pub electric_range: u32,
    pub base_msrp: u32,
    pub legislative_district: u16,
    pub dol_vehicle_id: String,
    pub vehicle_location: String,
    pub electric_utility: String,
    pub census_tract: String,

    /// (longitude, latitude) extracted from `vehicle_location`, present only
    /// when the descriptor matched the `POINT (<lon> <lat>)` pattern.
    pub coordinates: Option<(f64, f64)>,
}

impl EvRecord {
    /// Rows without both a make and a model carry no analytical value and
    /// are dropped during ingestion.
    pub fn is_retained(&self) -> bool {
        !self.make.is_empty() && !self.model.is_empty()
    }

    pub fn is_bev(&self) -> bool {
        self.ev_type == BEV_TYPE
    }

    pub fn is_phev(&self) -> bool {
        self.ev_type == PHEV_TYPE
    }

    pub fn is_cafv_eligible(&self) -> bool {
        self.cafv_eligibility == CAFV_ELIGIBLE
    }
}

/// Extracts a (longitude, latitude) pair from a `POINT (<lon> <lat>)`
/// location descriptor. Anything that does not match the pattern exactly
/// yields `None`; a record never carries a zero/garbage coordinate pair.
pub fn parse_point(location: &str) -> Option<(f64, f64)> {
    let inner = location
        .trim()
        .strip_prefix("POINT (")?
        .strip_suffix(')')?;
    let (lon, lat) = inner.split_once(' ')?;
    let lon: f64 = lon.parse().ok()?;
    let lat: f64 = lat.parse().ok()?;
    Some((lon, lat))
}
