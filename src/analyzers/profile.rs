//! Deep single-manufacturer analysis.

use crate::analyzers::aggregate::pct;
use crate::analyzers::reduce::{bin, extent, mean, rollup, rollup_count};
use crate::analyzers::types::{
    EvTypeBreakdown, EvTypeGroup, ManufacturerProfile, ModelStats, ProfileSummary, RangeBucket,
    RangeStats, ShareRow, YearlyRegistration,
};
use crate::record::EvRecord;

/// Number of bins in a profile's electric range histogram.
const RANGE_BIN_COUNT: usize = 10;

fn positive_ranges(rows: &[&EvRecord]) -> Vec<f64> {
    rows.iter()
        .filter(|r| r.electric_range > 0)
        .map(|r| r.electric_range as f64)
        .collect()
}

fn share_rows<K: ToString>(counts: Vec<(K, usize)>, total: usize) -> Vec<ShareRow> {
    counts
        .into_iter()
        .map(|(key, count)| ShareRow {
            label: key.to_string(),
            count,
            percentage: pct(count, total),
        })
        .collect()
}

fn sorted_desc(mut rows: Vec<ShareRow>) -> Vec<ShareRow> {
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

fn model_breakdown(rows: &[&EvRecord], total: usize) -> Vec<ModelStats> {
    let mut breakdown: Vec<ModelStats> = rollup(rows, |r| r.model.clone(), |vehicles| {
        let count = vehicles.len();
        let ranges: Vec<f64> = vehicles
            .iter()
            .filter(|r| r.electric_range > 0)
            .map(|r| r.electric_range as f64)
            .collect();
        let years: Vec<f64> = vehicles.iter().map(|r| r.model_year as f64).collect();

        ModelStats {
            model: String::new(),
            count,
            percentage: pct(count, total),
            avg_range: mean(&ranges).map_or(0, |m| m.round() as u32),
            avg_year: mean(&years).map_or(0, |m| m.round() as u16),
            bev_count: vehicles.iter().filter(|r| r.is_bev()).count(),
            phev_count: vehicles.iter().filter(|r| r.is_phev()).count(),
        }
    })
    .into_iter()
    .map(|(model, mut stats)| {
        stats.model = model;
        stats
    })
    .collect();

    breakdown.sort_by(|a, b| b.count.cmp(&a.count));
    breakdown
}

fn yearly_registrations(rows: &[&EvRecord]) -> Vec<YearlyRegistration> {
    let mut yearly: Vec<YearlyRegistration> = rollup(rows, |r| r.model_year, |vehicles| {
        let mut models: Vec<String> = Vec::new();
        for v in vehicles {
            if !models.iter().any(|m| m == &v.model) {
                models.push(v.model.clone());
            }
        }
        (vehicles.len(), models)
    })
    .into_iter()
    .map(|(year, (count, models))| YearlyRegistration { year, count, models })
    .collect();

    yearly.sort_by_key(|y| y.year);
    yearly
}

fn range_stats(rows: &[&EvRecord]) -> RangeStats {
    let ranges = positive_ranges(rows);
    let Some((min, max)) = extent(&ranges) else {
        return RangeStats::default();
    };

    let range_distribution = bin(&ranges, 0.0, max, RANGE_BIN_COUNT)
        .into_iter()
        .map(|b| RangeBucket {
            range: format!("{}-{}", b.lower.round() as i64, b.upper.round() as i64),
            count: b.count,
        })
        .collect();

    RangeStats {
        avg_range: mean(&ranges).map_or(0, |m| m.round() as u32),
        min_range: min as u32,
        max_range: max as u32,
        range_distribution,
    }
}

fn ev_type_group(vehicles: &[&EvRecord], total: usize) -> EvTypeGroup {
    let ranges = positive_ranges(vehicles);
    EvTypeGroup {
        count: vehicles.len(),
        percentage: pct(vehicles.len(), total),
        avg_range: mean(&ranges).map_or(0, |m| m.round() as u32),
    }
}

fn profile_summary(
    rows: &[&EvRecord],
    models: &[ModelStats],
    counties: &[ShareRow],
    cities: &[ShareRow],
    yearly: &[YearlyRegistration],
) -> ProfileSummary {
    // First maximum wins during the scan of the ascending year list.
    let peak_registration_year = yearly
        .iter()
        .fold(None::<(u16, usize)>, |best, y| match best {
            Some((_, count)) if y.count > count => Some((y.year, y.count)),
            None => Some((y.year, y.count)),
            best => best,
        })
        .map_or(0, |(year, _)| year);

    let years: Vec<u16> = rows
        .iter()
        .map(|r| r.model_year)
        .filter(|&y| y > 0)
        .collect();
    let year_values: Vec<f64> = years.iter().map(|&y| y as f64).collect();
    let (oldest, newest) = extent(&years).unwrap_or((0, 0));

    ProfileSummary {
        most_popular_model: models.first().map_or(String::new(), |m| m.model.clone()),
        most_popular_county: counties.first().map_or(String::new(), |c| c.label.clone()),
        most_popular_city: cities.first().map_or(String::new(), |c| c.label.clone()),
        peak_registration_year,
        avg_model_year: mean(&year_values).map_or(0, |m| m.round() as u16),
        newest_model_year: newest,
        oldest_model_year: oldest,
    }
}

/// Builds the full single-manufacturer profile over the working set.
///
/// A manufacturer with no matching records yields the fully-empty profile
/// shape; callers detect the zero `total_vehicles` and render "no data".
pub fn manufacturer_profile(records: &[EvRecord], manufacturer: &str) -> ManufacturerProfile {
    let rows: Vec<&EvRecord> = records.iter().filter(|r| r.make == manufacturer).collect();

    if rows.is_empty() {
        return ManufacturerProfile {
            manufacturer: manufacturer.to_string(),
            ..Default::default()
        };
    }

    let total_vehicles = rows.len();

    let model_breakdown = model_breakdown(&rows, total_vehicles);
    let county_distribution = sorted_desc(share_rows(
        rollup_count(&rows, |r| r.county.clone()),
        total_vehicles,
    ));
    let city_distribution = sorted_desc(share_rows(
        rollup_count(&rows, |r| r.city.clone()),
        total_vehicles,
    ));
    let yearly_registrations = yearly_registrations(&rows);
    let range_stats = range_stats(&rows);

    let bev: Vec<&EvRecord> = rows.iter().copied().filter(|r| r.is_bev()).collect();
    let phev: Vec<&EvRecord> = rows.iter().copied().filter(|r| r.is_phev()).collect();
    let ev_type_breakdown = EvTypeBreakdown {
        bev: ev_type_group(&bev, total_vehicles),
        phev: ev_type_group(&phev, total_vehicles),
    };

    // CAFV rows keep first-seen order; the other distributions rank by count.
    let cafv_breakdown = share_rows(
        rollup_count(&rows, |r| r.cafv_eligibility.clone()),
        total_vehicles,
    );
    let electric_utilities = sorted_desc(share_rows(
        rollup_count(&rows, |r| r.electric_utility.clone()),
        total_vehicles,
    ));
    let legislative_districts = sorted_desc(share_rows(
        rollup_count(&rows, |r| r.legislative_district),
        total_vehicles,
    ));

    let summary_stats = profile_summary(
        &rows,
        &model_breakdown,
        &county_distribution,
        &city_distribution,
        &yearly_registrations,
    );

    ManufacturerProfile {
        manufacturer: manufacturer.to_string(),
        total_vehicles,
        model_breakdown,
        county_distribution,
        city_distribution,
        yearly_registrations,
        range_stats,
        ev_type_breakdown,
        cafv_breakdown,
        electric_utilities,
        legislative_districts,
        summary_stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BEV_TYPE, PHEV_TYPE};

    fn record(
        make: &str,
        model: &str,
        year: u16,
        range: u32,
        ev_type: &str,
        county: &str,
        city: &str,
    ) -> EvRecord {
        EvRecord {
            make: make.to_string(),
            model: model.to_string(),
            model_year: year,
            electric_range: range,
            ev_type: ev_type.to_string(),
            county: county.to_string(),
            city: city.to_string(),
            electric_utility: "PSE".to_string(),
            legislative_district: 41,
            ..Default::default()
        }
    }

    fn tesla_records() -> Vec<EvRecord> {
        vec![
            record("Tesla", "Model 3", 2020, 250, BEV_TYPE, "King", "Seattle"),
            record("Tesla", "Model 3", 2021, 263, BEV_TYPE, "King", "Bellevue"),
            record("Tesla", "Model Y", 2021, 300, BEV_TYPE, "Pierce", "Tacoma"),
            record("Toyota", "Prius Prime", 2021, 25, PHEV_TYPE, "King", "Seattle"),
        ]
    }

    #[test]
    fn test_empty_profile_shape() {
        let records = tesla_records();
        let profile = manufacturer_profile(&records, "DeLorean");

        assert_eq!(profile.manufacturer, "DeLorean");
        assert_eq!(profile.total_vehicles, 0);
        assert!(profile.model_breakdown.is_empty());
        assert!(profile.county_distribution.is_empty());
        assert!(profile.city_distribution.is_empty());
        assert!(profile.yearly_registrations.is_empty());
        assert_eq!(profile.range_stats, RangeStats::default());
        assert_eq!(profile.ev_type_breakdown, EvTypeBreakdown::default());
        assert!(profile.cafv_breakdown.is_empty());
        assert_eq!(profile.summary_stats, ProfileSummary::default());
    }

    #[test]
    fn test_model_breakdown_sorted_desc_by_count() {
        let records = tesla_records();
        let profile = manufacturer_profile(&records, "Tesla");

        assert_eq!(profile.total_vehicles, 3);
        assert_eq!(profile.model_breakdown.len(), 2);

        let top = &profile.model_breakdown[0];
        assert_eq!(top.model, "Model 3");
        assert_eq!(top.count, 2);
        assert!((top.percentage - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(top.avg_range, 257); // mean(250, 263) = 256.5
        assert_eq!(top.avg_year, 2021); // mean(2020, 2021) = 2020.5
        assert_eq!(top.bev_count, 2);
        assert_eq!(top.phev_count, 0);
    }

    #[test]
    fn test_yearly_registrations_ascending_with_distinct_models() {
        let records = tesla_records();
        let profile = manufacturer_profile(&records, "Tesla");

        let years: Vec<u16> = profile.yearly_registrations.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2020, 2021]);

        let y2021 = &profile.yearly_registrations[1];
        assert_eq!(y2021.count, 2);
        assert_eq!(y2021.models, vec!["Model 3".to_string(), "Model Y".to_string()]);
    }

    #[test]
    fn test_range_stats_and_histogram() {
        let records = tesla_records();
        let profile = manufacturer_profile(&records, "Tesla");
        let stats = &profile.range_stats;

        assert_eq!(stats.avg_range, 271); // mean(250, 263, 300) = 271
        assert_eq!(stats.min_range, 250);
        assert_eq!(stats.max_range, 300);
        assert_eq!(stats.range_distribution.len(), 10);

        // Bins span [0, 300]; all three ranges land in the top two bins.
        let total: usize = stats.range_distribution.iter().map(|b| b.count).sum();
        assert_eq!(total, 3);
        assert_eq!(stats.range_distribution[0].range, "0-30");
        assert_eq!(stats.range_distribution[0].count, 0);
        assert_eq!(stats.range_distribution[9].count, 1);
    }

    #[test]
    fn test_range_stats_all_zero_when_no_positive_ranges() {
        let records = vec![record("Tesla", "Model 3", 2023, 0, BEV_TYPE, "King", "Seattle")];
        let profile = manufacturer_profile(&records, "Tesla");

        assert_eq!(profile.range_stats, RangeStats::default());
    }

    #[test]
    fn test_ev_type_breakdown_restricted_means() {
        let mut records = tesla_records();
        records.push(record("Tesla", "Roadster", 2012, 0, BEV_TYPE, "King", "Seattle"));
        let profile = manufacturer_profile(&records, "Tesla");

        let bev = &profile.ev_type_breakdown.bev;
        assert_eq!(bev.count, 4);
        assert_eq!(bev.percentage, 100.0);
        // The zero-range Roadster is excluded from the BEV mean.
        assert_eq!(bev.avg_range, 271);

        let phev = &profile.ev_type_breakdown.phev;
        assert_eq!(phev.count, 0);
        assert_eq!(phev.avg_range, 0);
    }

    #[test]
    fn test_summary_picks_firsts_and_peak_year() {
        let records = tesla_records();
        let profile = manufacturer_profile(&records, "Tesla");
        let summary = &profile.summary_stats;

        assert_eq!(summary.most_popular_model, "Model 3");
        assert_eq!(summary.most_popular_county, "King");
        assert_eq!(summary.most_popular_city, "Seattle");
        assert_eq!(summary.peak_registration_year, 2021);
        assert_eq!(summary.oldest_model_year, 2020);
        assert_eq!(summary.newest_model_year, 2021);
        assert_eq!(summary.avg_model_year, 2021); // mean(2020, 2021, 2021)
    }

    #[test]
    fn test_peak_year_tie_resolves_to_first_scanned() {
        let records = vec![
            record("Nissan", "Leaf", 2019, 150, BEV_TYPE, "King", "Seattle"),
            record("Nissan", "Leaf", 2021, 212, BEV_TYPE, "King", "Seattle"),
        ];
        let profile = manufacturer_profile(&records, "Nissan");

        assert_eq!(profile.summary_stats.peak_registration_year, 2019);
    }

    #[test]
    fn test_summary_years_exclude_zero_sentinels() {
        let records = vec![
            record("Nissan", "Leaf", 0, 150, BEV_TYPE, "King", "Seattle"),
            record("Nissan", "Leaf", 2019, 150, BEV_TYPE, "King", "Seattle"),
        ];
        let profile = manufacturer_profile(&records, "Nissan");
        let summary = &profile.summary_stats;

        assert_eq!(summary.avg_model_year, 2019);
        assert_eq!(summary.oldest_model_year, 2019);
        assert_eq!(summary.newest_model_year, 2019);
    }

    #[test]
    fn test_distribution_percentages_sum_to_100() {
        let records = tesla_records();
        let profile = manufacturer_profile(&records, "Tesla");

        let county_total: f64 = profile.county_distribution.iter().map(|c| c.percentage).sum();
        assert!((county_total - 100.0).abs() < 1e-9);

        let cafv_total: f64 = profile.cafv_breakdown.iter().map(|c| c.percentage).sum();
        assert!((cafv_total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_legislative_districts_labeled_by_number() {
        let records = tesla_records();
        let profile = manufacturer_profile(&records, "Tesla");

        assert_eq!(profile.legislative_districts.len(), 1);
        assert_eq!(profile.legislative_districts[0].label, "41");
        assert_eq!(profile.legislative_districts[0].count, 3);
    }
}
