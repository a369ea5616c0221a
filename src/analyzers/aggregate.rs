//! The primary query set over a working set of registration records.

use chrono::Utc;
use std::collections::HashSet;

use crate::analyzers::reduce::{bin, extent, mean, rollup_count};
use crate::analyzers::types::{
    ChartRow, DashboardReport, DataFilters, SummaryStats, TimeSeriesPoint,
};
use crate::record::EvRecord;

/// Number of bins in the whole-set electric range histogram.
const RANGE_BIN_COUNT: usize = 20;

/// Share of `part` in `total` as a percentage, guarded to 0 for an empty
/// total so empty working sets never produce NaN.
pub(crate) fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Read-only query interface over an immutable working set.
///
/// Every query is a pure function of the borrowed records; nothing is cached
/// between calls. Deriving a filtered view produces a new record vector for
/// a fresh `Aggregator` rather than mutating this one.
pub struct Aggregator<'a> {
    records: &'a [EvRecord],
}

impl<'a> Aggregator<'a> {
    pub fn new(records: &'a [EvRecord]) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EvRecord] {
        self.records
    }

    /// Count and share per distinct powertrain type, first-seen order.
    pub fn ev_type_distribution(&self) -> Vec<ChartRow> {
        let total = self.records.len();
        rollup_count(self.records, |r| r.ev_type.clone())
            .into_iter()
            .map(|(label, value)| ChartRow {
                label,
                value,
                percentage: Some(pct(value, total)),
            })
            .collect()
    }

    /// Manufacturers ranked by registration count, descending, truncated to
    /// `limit`. Ties keep first-seen order.
    pub fn top_manufacturers(&self, limit: usize) -> Vec<ChartRow> {
        let mut rows: Vec<ChartRow> = rollup_count(self.records, |r| r.make.clone())
            .into_iter()
            .map(|(label, value)| ChartRow {
                label,
                value,
                percentage: None,
            })
            .collect();
        rows.sort_by(|a, b| b.value.cmp(&a.value));
        rows.truncate(limit);
        rows
    }

    /// Counties ranked by registration count, descending, truncated to
    /// `limit`.
    pub fn county_distribution(&self, limit: usize) -> Vec<ChartRow> {
        let mut rows: Vec<ChartRow> = rollup_count(self.records, |r| r.county.clone())
            .into_iter()
            .map(|(label, value)| ChartRow {
                label,
                value,
                percentage: None,
            })
            .collect();
        rows.sort_by(|a, b| b.value.cmp(&a.value));
        rows.truncate(limit);
        rows
    }

    /// Registrations per model year, ascending. Year-0 sentinels appear if
    /// present; callers filter beforehand when they want them gone.
    pub fn time_series(&self) -> Vec<TimeSeriesPoint> {
        let mut points: Vec<TimeSeriesPoint> = rollup_count(self.records, |r| r.model_year)
            .into_iter()
            .map(|(year, count)| TimeSeriesPoint { year, count })
            .collect();
        points.sort_by_key(|p| p.year);
        points
    }

    /// Twenty equal-width bins over the extent of the positive electric
    /// ranges. Empty when no record has a positive range.
    pub fn range_distribution(&self) -> Vec<ChartRow> {
        let ranges: Vec<f64> = self
            .records
            .iter()
            .filter(|r| r.electric_range > 0)
            .map(|r| r.electric_range as f64)
            .collect();

        let Some((min, max)) = extent(&ranges) else {
            return Vec::new();
        };

        bin(&ranges, min, max, RANGE_BIN_COUNT)
            .into_iter()
            .map(|b| ChartRow {
                label: format!("{}-{}", b.lower.round() as i64, b.upper.round() as i64),
                value: b.count,
                percentage: None,
            })
            .collect()
    }

    /// Count and share per distinct CAFV eligibility string, first-seen
    /// order.
    pub fn cafv_distribution(&self) -> Vec<ChartRow> {
        let total = self.records.len();
        rollup_count(self.records, |r| r.cafv_eligibility.clone())
            .into_iter()
            .map(|(label, value)| ChartRow {
                label,
                value,
                percentage: Some(pct(value, total)),
            })
            .collect()
    }

    /// Headline numbers for the whole working set.
    ///
    /// The year extent intentionally includes year-0 sentinels; only the
    /// mean range excludes its missing-value sentinel.
    pub fn summary_stats(&self) -> SummaryStats {
        let ranges: Vec<f64> = self
            .records
            .iter()
            .filter(|r| r.electric_range > 0)
            .map(|r| r.electric_range as f64)
            .collect();
        let avg_range = mean(&ranges).map_or(0, |m| m.round() as u32);

        let unique_manufacturers = self
            .records
            .iter()
            .map(|r| r.make.as_str())
            .collect::<HashSet<_>>()
            .len();
        let unique_models = self
            .records
            .iter()
            .map(|r| r.model.as_str())
            .collect::<HashSet<_>>()
            .len();

        let years: Vec<u16> = self.records.iter().map(|r| r.model_year).collect();
        let year_range = extent(&years).unwrap_or((0, 0));

        SummaryStats {
            total_vehicles: self.records.len(),
            avg_range,
            unique_manufacturers,
            unique_models,
            year_range,
        }
    }

    /// Derives a new working set matching every supplied predicate.
    /// Record order is preserved; the original set is untouched.
    pub fn filter(&self, filters: &DataFilters) -> Vec<EvRecord> {
        self.records
            .iter()
            .filter(|r| {
                if let Some(make) = &filters.make {
                    if r.make != *make {
                        return false;
                    }
                }
                if let Some(makes) = &filters.makes {
                    if !makes.is_empty() && !makes.contains(&r.make) {
                        return false;
                    }
                }
                if let Some(ev_type) = &filters.ev_type {
                    if r.ev_type != *ev_type {
                        return false;
                    }
                }
                if let Some(county) = &filters.county {
                    if r.county != *county {
                        return false;
                    }
                }
                if let Some((min_year, max_year)) = filters.year_range {
                    if r.model_year < min_year || r.model_year > max_year {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect()
    }

    /// Distinct non-empty manufacturer names, alphabetical. Feeds selection
    /// lists in consumers.
    pub fn manufacturers(&self) -> Vec<String> {
        let mut makes: Vec<String> = self
            .records
            .iter()
            .filter(|r| !r.make.is_empty())
            .map(|r| r.make.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        makes.sort();
        makes
    }

    /// [min, max] over model years greater than 0, `None` when the set has
    /// no usable year. Feeds year-range selection in consumers.
    pub fn available_year_range(&self) -> Option<(u16, u16)> {
        let years: Vec<u16> = self
            .records
            .iter()
            .map(|r| r.model_year)
            .filter(|&y| y > 0)
            .collect();
        extent(&years)
    }

    /// Assembles the full dashboard payload from the primary queries.
    pub fn dashboard_report(&self, top_makes: usize, top_counties: usize) -> DashboardReport {
        DashboardReport {
            schema_version: 1,
            generated_at: Utc::now(),
            summary: self.summary_stats(),
            ev_type_distribution: self.ev_type_distribution(),
            top_manufacturers: self.top_manufacturers(top_makes),
            county_distribution: self.county_distribution(top_counties),
            time_series: self.time_series(),
            range_distribution: self.range_distribution(),
            cafv_eligibility: self.cafv_distribution(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{BEV_TYPE, PHEV_TYPE};

    fn record(make: &str, model: &str, year: u16, range: u32, ev_type: &str) -> EvRecord {
        EvRecord {
            make: make.to_string(),
            model: model.to_string(),
            model_year: year,
            electric_range: range,
            ev_type: ev_type.to_string(),
            ..Default::default()
        }
    }

    fn sample_records() -> Vec<EvRecord> {
        vec![
            record("Tesla", "Model 3", 2020, 250, BEV_TYPE),
            record("Tesla", "Model Y", 2021, 300, BEV_TYPE),
            record("Nissan", "Leaf", 2019, 150, BEV_TYPE),
        ]
    }

    #[test]
    fn test_pct_guards_zero_total() {
        assert_eq!(pct(10, 0), 0.0);
        assert_eq!(pct(1, 4), 25.0);
    }

    #[test]
    fn test_top_manufacturers_scenario() {
        let records = sample_records();
        let top = Aggregator::new(&records).top_manufacturers(2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].label, "Tesla");
        assert_eq!(top[0].value, 2);
        assert_eq!(top[1].label, "Nissan");
        assert_eq!(top[1].value, 1);
    }

    #[test]
    fn test_top_manufacturers_ties_keep_first_seen_order() {
        let records = vec![
            record("Kia", "EV6", 2022, 310, BEV_TYPE),
            record("Ford", "Mustang Mach-E", 2022, 270, BEV_TYPE),
        ];
        let top = Aggregator::new(&records).top_manufacturers(10);

        assert_eq!(top[0].label, "Kia");
        assert_eq!(top[1].label, "Ford");
    }

    #[test]
    fn test_top_manufacturers_truncates_to_distinct_count() {
        let records = sample_records();
        let top = Aggregator::new(&records).top_manufacturers(10);
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_summary_stats_scenario() {
        let records = sample_records();
        let stats = Aggregator::new(&records).summary_stats();

        assert_eq!(stats.total_vehicles, 3);
        assert_eq!(stats.avg_range, 233);
        assert_eq!(stats.unique_manufacturers, 2);
        assert_eq!(stats.unique_models, 3);
        assert_eq!(stats.year_range, (2019, 2021));
    }

    #[test]
    fn test_summary_stats_year_range_keeps_zero_sentinel() {
        let mut records = sample_records();
        records.push(record("Fiat", "500e", 0, 87, BEV_TYPE));
        let stats = Aggregator::new(&records).summary_stats();

        assert_eq!(stats.year_range, (0, 2021));
    }

    #[test]
    fn test_summary_stats_excludes_zero_range_from_mean() {
        let records = vec![
            record("Tesla", "Model 3", 2020, 200, BEV_TYPE),
            record("Toyota", "Prius Prime", 2020, 0, PHEV_TYPE),
        ];
        let stats = Aggregator::new(&records).summary_stats();

        assert_eq!(stats.avg_range, 200);
    }

    #[test]
    fn test_empty_working_set_yields_zeroes() {
        let records: Vec<EvRecord> = Vec::new();
        let agg = Aggregator::new(&records);

        assert!(agg.ev_type_distribution().is_empty());
        assert!(agg.top_manufacturers(10).is_empty());
        assert!(agg.time_series().is_empty());
        assert!(agg.range_distribution().is_empty());
        assert!(agg.cafv_distribution().is_empty());
        assert_eq!(agg.summary_stats(), SummaryStats::default());
        assert_eq!(agg.available_year_range(), None);
    }

    #[test]
    fn test_ev_type_distribution_percentages_sum_to_100() {
        let records = vec![
            record("Tesla", "Model 3", 2020, 250, BEV_TYPE),
            record("Toyota", "Prius Prime", 2021, 25, PHEV_TYPE),
            record("Toyota", "RAV4 Prime", 2021, 42, PHEV_TYPE),
        ];
        let rows = Aggregator::new(&records).ev_type_distribution();

        let total: f64 = rows.iter().filter_map(|r| r.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_ev_type_distribution_first_seen_order() {
        let records = vec![
            record("Toyota", "Prius Prime", 2021, 25, PHEV_TYPE),
            record("Tesla", "Model 3", 2020, 250, BEV_TYPE),
            record("Toyota", "RAV4 Prime", 2021, 42, PHEV_TYPE),
        ];
        let rows = Aggregator::new(&records).ev_type_distribution();

        assert_eq!(rows[0].label, PHEV_TYPE);
        assert_eq!(rows[1].label, BEV_TYPE);
    }

    #[test]
    fn test_time_series_sorted_ascending_no_duplicates() {
        let records = vec![
            record("Tesla", "Model Y", 2021, 300, BEV_TYPE),
            record("Nissan", "Leaf", 2019, 150, BEV_TYPE),
            record("Tesla", "Model 3", 2021, 250, BEV_TYPE),
            record("Chevrolet", "Bolt EV", 2020, 259, BEV_TYPE),
        ];
        let points = Aggregator::new(&records).time_series();

        let years: Vec<u16> = points.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
        assert_eq!(points[2].count, 2);
    }

    #[test]
    fn test_range_distribution_has_twenty_bins_and_counts_all_values() {
        let records: Vec<EvRecord> = (1..=40)
            .map(|i| record("Tesla", "Model 3", 2020, i * 10, BEV_TYPE))
            .collect();
        let bins = Aggregator::new(&records).range_distribution();

        assert_eq!(bins.len(), 20);
        let total: usize = bins.iter().map(|b| b.value).sum();
        assert_eq!(total, 40);
    }

    #[test]
    fn test_range_distribution_labels_bounds() {
        let records = vec![
            record("Nissan", "Leaf", 2019, 100, BEV_TYPE),
            record("Tesla", "Model S", 2020, 300, BEV_TYPE),
        ];
        let bins = Aggregator::new(&records).range_distribution();

        assert_eq!(bins[0].label, "100-110");
        assert_eq!(bins[19].label, "290-300");
        assert_eq!(bins[0].value, 1);
        assert_eq!(bins[19].value, 1);
    }

    #[test]
    fn test_filter_predicates_are_anded() {
        let records = sample_records();
        let agg = Aggregator::new(&records);

        let filtered = agg.filter(&DataFilters {
            make: Some("Tesla".to_string()),
            year_range: Some((2021, 2021)),
            ..Default::default()
        });

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].model, "Model Y");
    }

    #[test]
    fn test_filter_empty_makes_list_is_unconstrained() {
        let records = sample_records();
        let agg = Aggregator::new(&records);

        let filtered = agg.filter(&DataFilters {
            makes: Some(Vec::new()),
            ..Default::default()
        });

        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_filter_makes_membership() {
        let records = sample_records();
        let agg = Aggregator::new(&records);

        let filtered = agg.filter(&DataFilters {
            makes: Some(vec!["Nissan".to_string()]),
            ..Default::default()
        });

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].make, "Nissan");
    }

    #[test]
    fn test_filter_preserves_order_and_input() {
        let records = sample_records();
        let agg = Aggregator::new(&records);

        let filtered = agg.filter(&DataFilters::default());
        assert_eq!(filtered, records);
    }

    #[test]
    fn test_manufacturers_sorted_distinct() {
        let records = sample_records();
        let makes = Aggregator::new(&records).manufacturers();
        assert_eq!(makes, vec!["Nissan".to_string(), "Tesla".to_string()]);
    }

    #[test]
    fn test_available_year_range_skips_zero_years() {
        let mut records = sample_records();
        records.push(record("Fiat", "500e", 0, 87, BEV_TYPE));

        let range = Aggregator::new(&records).available_year_range();
        assert_eq!(range, Some((2019, 2021)));
    }

    #[test]
    fn test_queries_are_idempotent() {
        let records = sample_records();
        let agg = Aggregator::new(&records);

        assert_eq!(agg.summary_stats(), agg.summary_stats());
        assert_eq!(agg.top_manufacturers(5), agg.top_manufacturers(5));
        assert_eq!(agg.range_distribution(), agg.range_distribution());
        assert_eq!(records, sample_records());
    }
}
