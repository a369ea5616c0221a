//! Side-by-side comparison of selected manufacturers.

use crate::analyzers::aggregate::pct;
use crate::analyzers::reduce::{mean, rollup_count};
use crate::analyzers::types::{
    ComparisonReport, CountyCount, EligibilityComparison, ManufacturerComparison,
    ModelCountComparison, RangeComparison, TimeSeriesPoint, TopCountyComparison, TrendComparison,
    TypeMixComparison,
};
use crate::record::EvRecord;
use std::collections::HashSet;

/// Computes comparison metrics for one manufacturer over the full working
/// set.
///
/// A manufacturer with no matching records gets the all-zero/empty shape so
/// one unknown name never poisons a multi-manufacturer comparison.
pub fn manufacturer_comparison(records: &[EvRecord], manufacturer: &str) -> ManufacturerComparison {
    let rows: Vec<&EvRecord> = records.iter().filter(|r| r.make == manufacturer).collect();

    if rows.is_empty() {
        return ManufacturerComparison {
            manufacturer: manufacturer.to_string(),
            ..Default::default()
        };
    }

    let total_vehicles = rows.len();

    let ranges: Vec<f64> = rows
        .iter()
        .filter(|r| r.electric_range > 0)
        .map(|r| r.electric_range as f64)
        .collect();
    let avg_range = mean(&ranges).map_or(0, |m| m.round() as u32);

    let bev_count = rows.iter().filter(|r| r.is_bev()).count();
    let phev_count = rows.iter().filter(|r| r.is_phev()).count();
    let bev_percentage = pct(bev_count, total_vehicles).round() as u32;
    let phev_percentage = pct(phev_count, total_vehicles).round() as u32;

    let eligible_count = rows.iter().filter(|r| r.is_cafv_eligible()).count();
    let cafv_eligible_percentage = pct(eligible_count, total_vehicles).round() as u32;

    let unique_models = rows
        .iter()
        .map(|r| r.model.as_str())
        .collect::<HashSet<_>>()
        .len();

    // Mean over all model years, year-0 sentinels included, matching the
    // whole-set summary convention rather than the profile's year>0 rule.
    let years: Vec<f64> = rows.iter().map(|r| r.model_year as f64).collect();
    let avg_model_year = mean(&years).map_or(0, |m| m.round() as u16);

    let mut top_counties: Vec<CountyCount> = rollup_count(&rows, |r| r.county.clone())
        .into_iter()
        .map(|(county, count)| CountyCount { county, count })
        .collect();
    top_counties.sort_by(|a, b| b.count.cmp(&a.count));
    top_counties.truncate(3);

    let mut yearly_trends: Vec<TimeSeriesPoint> = rollup_count(&rows, |r| r.model_year)
        .into_iter()
        .map(|(year, count)| TimeSeriesPoint { year, count })
        .collect();
    yearly_trends.sort_by_key(|p| p.year);

    ManufacturerComparison {
        manufacturer: manufacturer.to_string(),
        total_vehicles,
        avg_range,
        bev_percentage,
        phev_percentage,
        cafv_eligible_percentage,
        unique_models,
        avg_model_year,
        top_counties,
        yearly_trends,
    }
}

/// Back-derives a count from a rounded percentage. Reproduces the accepted
/// ±1 drift of the original report format; do not replace with the true
/// count.
fn count_from_pct(percentage: u32, total: usize) -> usize {
    ((percentage as f64 / 100.0) * total as f64).round() as usize
}

/// Projects per-manufacturer comparisons into six parallel tables, one per
/// metric family, keyed by manufacturer in input order.
pub fn comparison_report(records: &[EvRecord], manufacturers: &[String]) -> ComparisonReport {
    let comparisons: Vec<ManufacturerComparison> = manufacturers
        .iter()
        .map(|m| manufacturer_comparison(records, m))
        .collect();

    let range_comparison = comparisons
        .iter()
        .map(|c| RangeComparison {
            manufacturer: c.manufacturer.clone(),
            avg_range: c.avg_range,
        })
        .collect();

    let type_comparison = comparisons
        .iter()
        .map(|c| TypeMixComparison {
            manufacturer: c.manufacturer.clone(),
            bev: count_from_pct(c.bev_percentage, c.total_vehicles),
            phev: count_from_pct(c.phev_percentage, c.total_vehicles),
        })
        .collect();

    let eligibility_comparison = comparisons
        .iter()
        .map(|c| {
            let eligible = count_from_pct(c.cafv_eligible_percentage, c.total_vehicles);
            EligibilityComparison {
                manufacturer: c.manufacturer.clone(),
                eligible,
                not_eligible: c.total_vehicles - eligible,
            }
        })
        .collect();

    let models_comparison = comparisons
        .iter()
        .map(|c| ModelCountComparison {
            manufacturer: c.manufacturer.clone(),
            unique_models: c.unique_models,
        })
        .collect();

    let trends_comparison = comparisons
        .iter()
        .map(|c| TrendComparison {
            manufacturer: c.manufacturer.clone(),
            data: c.yearly_trends.clone(),
        })
        .collect();

    let geo_comparison = comparisons
        .iter()
        .map(|c| match c.top_counties.first() {
            Some(top) => TopCountyComparison {
                manufacturer: c.manufacturer.clone(),
                top_county: top.county.clone(),
                count: top.count,
            },
            None => TopCountyComparison {
                manufacturer: c.manufacturer.clone(),
                top_county: "N/A".to_string(),
                count: 0,
            },
        })
        .collect();

    ComparisonReport {
        manufacturers: manufacturers.to_vec(),
        range_comparison,
        type_comparison,
        eligibility_comparison,
        models_comparison,
        trends_comparison,
        geo_comparison,
    }
}
