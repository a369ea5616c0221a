//! CSV ingestion for EV registration exports.
//!
//! Maps the dataset's named columns onto [`EvRecord`], defaulting missing or
//! unparseable fields to their sentinels (0 / empty string) instead of
//! failing the row. Rows without both a make and a model are dropped.

use anyhow::Result;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::record::{EvRecord, parse_point};

const COL_VIN: &str = "VIN (1-10)";
const COL_COUNTY: &str = "County";
const COL_CITY: &str = "City";
const COL_STATE: &str = "State";
const COL_POSTAL_CODE: &str = "Postal Code";
const COL_MODEL_YEAR: &str = "Model Year";
const COL_MAKE: &str = "Make";
const COL_MODEL: &str = "Model";
const COL_EV_TYPE: &str = "Electric Vehicle Type";
const COL_CAFV: &str = "Clean Alternative Fuel Vehicle (CAFV) Eligibility";
const COL_ELECTRIC_RANGE: &str = "Electric Range";
const COL_BASE_MSRP: &str = "Base MSRP";
const COL_LEGISLATIVE_DISTRICT: &str = "Legislative District";
const COL_DOL_VEHICLE_ID: &str = "DOL Vehicle ID";
const COL_VEHICLE_LOCATION: &str = "Vehicle Location";
const COL_ELECTRIC_UTILITY: &str = "Electric Utility";
const COL_CENSUS_TRACT: &str = "2020 Census Tract";

/// Column-name to index lookup built once from the header row.
struct HeaderIndex(HashMap<String, usize>);

impl HeaderIndex {
    fn new(headers: &csv::StringRecord) -> Self {
        Self(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.trim().to_string(), i))
                .collect(),
        )
    }

    fn text(&self, row: &csv::StringRecord, name: &str) -> String {
        self.0
            .get(name)
            .and_then(|&i| row.get(i))
            .unwrap_or("")
            .trim()
            .to_string()
    }

    fn number<T: std::str::FromStr + Default>(&self, row: &csv::StringRecord, name: &str) -> T {
        self.0
            .get(name)
            .and_then(|&i| row.get(i))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default()
    }
}

fn record_from_row(index: &HeaderIndex, row: &csv::StringRecord) -> EvRecord {
    let vehicle_location = index.text(row, COL_VEHICLE_LOCATION);
    let coordinates = parse_point(&vehicle_location);

    EvRecord {
        vin: index.text(row, COL_VIN),
        county: index.text(row, COL_COUNTY),
        city: index.text(row, COL_CITY),
        state: index.text(row, COL_STATE),
        postal_code: index.text(row, COL_POSTAL_CODE),
        model_year: index.number(row, COL_MODEL_YEAR),
        make: index.text(row, COL_MAKE),
        model: index.text(row, COL_MODEL),
        ev_type: index.text(row, COL_EV_TYPE),
        cafv_eligibility: index.text(row, COL_CAFV),
        electric_range: index.number(row, COL_ELECTRIC_RANGE),
        base_msrp: index.number(row, COL_BASE_MSRP),
        legislative_district: index.number(row, COL_LEGISLATIVE_DISTRICT),
        dol_vehicle_id: index.text(row, COL_DOL_VEHICLE_ID),
        vehicle_location,
        electric_utility: index.text(row, COL_ELECTRIC_UTILITY),
        census_tract: index.text(row, COL_CENSUS_TRACT),
        coordinates,
    }
}

/// Parses EV registration records from CSV text.
///
/// Rows missing a make or model are dropped; every other field defaults to
/// its sentinel rather than erroring.
///
/// # Errors
///
/// Returns an error only when the underlying reader or CSV framing fails,
/// never for individual field contents.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<EvRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let index = HeaderIndex::new(rdr.headers()?);

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for result in rdr.records() {
        let row = result?;
        let record = record_from_row(&index, &row);
        if record.is_retained() {
            records.push(record);
        } else {
            dropped += 1;
        }
    }

    debug!(kept = records.len(), dropped, "CSV parse complete");
    Ok(records)
}

/// Loads and parses records from a CSV file on disk.
pub fn load_records(path: &str) -> Result<Vec<EvRecord>> {
    let file = File::open(Path::new(path))?;
    let records = parse_records(file)?;
    info!(path, records = records.len(), "Loaded EV registration data");
    Ok(records)
}
