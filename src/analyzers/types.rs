//! Derived aggregate types produced by the analysis queries.
//!
//! All of these are recomputed on demand from the current working set and
//! serialized as JSON report payloads; none are cached or persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A labeled count, optionally with its share of the working set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub label: String,
    pub value: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// Registration count for one model year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub year: u16,
    pub count: usize,
}

/// Whole-working-set headline numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_vehicles: usize,
    pub avg_range: u32,
    pub unique_manufacturers: usize,
    pub unique_models: usize,
    /// [min, max] model year over all records, year-0 sentinels included.
    pub year_range: (u16, u16),
}

/// Predicates applied when deriving a new working set. Every field is
/// optional; omitted or empty predicates impose no constraint, supplied
/// predicates are ANDed.
#[derive(Debug, Clone, Default)]
pub struct DataFilters {
    pub make: Option<String>,
    pub makes: Option<Vec<String>>,
    pub ev_type: Option<String>,
    pub county: Option<String>,
    /// Inclusive [min, max] model year bounds.
    pub year_range: Option<(u16, u16)>,
}

/// Registration count for one county.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountyCount {
    pub county: String,
    pub count: usize,
}

/// Per-manufacturer metrics used by the side-by-side comparison view.
///
/// A manufacturer absent from the working set yields the all-zero/empty
/// shape rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerComparison {
    pub manufacturer: String,
    pub total_vehicles: usize,
    pub avg_range: u32,
    pub bev_percentage: u32,
    pub phev_percentage: u32,
    pub cafv_eligible_percentage: u32,
    pub unique_models: usize,
    pub avg_model_year: u16,
    pub top_counties: Vec<CountyCount>,
    pub yearly_trends: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeComparison {
    pub manufacturer: String,
    pub avg_range: u32,
}

/// BEV/PHEV counts back-computed from rounded percentages; ±1 drift from
/// the true counts is accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeMixComparison {
    pub manufacturer: String,
    pub bev: usize,
    pub phev: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityComparison {
    pub manufacturer: String,
    pub eligible: usize,
    pub not_eligible: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCountComparison {
    pub manufacturer: String,
    pub unique_models: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendComparison {
    pub manufacturer: String,
    pub data: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCountyComparison {
    pub manufacturer: String,
    pub top_county: String,
    pub count: usize,
}

/// Six parallel comparison tables, each keyed by manufacturer in the order
/// the manufacturers were requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub manufacturers: Vec<String>,
    pub range_comparison: Vec<RangeComparison>,
    pub type_comparison: Vec<TypeMixComparison>,
    pub eligibility_comparison: Vec<EligibilityComparison>,
    pub models_comparison: Vec<ModelCountComparison>,
    pub trends_comparison: Vec<TrendComparison>,
    pub geo_comparison: Vec<TopCountyComparison>,
}

/// One model's slice of a manufacturer profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    pub model: String,
    pub count: usize,
    pub percentage: f64,
    pub avg_range: u32,
    pub avg_year: u16,
    pub bev_count: usize,
    pub phev_count: usize,
}

/// A labeled count with its share of the profiled manufacturer's total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareRow {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyRegistration {
    pub year: u16,
    pub count: usize,
    /// Distinct model names registered that year, first-seen order.
    pub models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeBucket {
    pub range: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeStats {
    pub avg_range: u32,
    pub min_range: u32,
    pub max_range: u32,
    pub range_distribution: Vec<RangeBucket>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvTypeGroup {
    pub count: usize,
    pub percentage: f64,
    pub avg_range: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvTypeBreakdown {
    pub bev: EvTypeGroup,
    pub phev: EvTypeGroup,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub most_popular_model: String,
    pub most_popular_county: String,
    pub most_popular_city: String,
    pub peak_registration_year: u16,
    pub avg_model_year: u16,
    pub newest_model_year: u16,
    pub oldest_model_year: u16,
}

/// Deep single-manufacturer analysis. Every sub-aggregation is computed
/// independently from the manufacturer's filtered records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerProfile {
    pub manufacturer: String,
    pub total_vehicles: usize,
    pub model_breakdown: Vec<ModelStats>,
    pub county_distribution: Vec<ShareRow>,
    pub city_distribution: Vec<ShareRow>,
    pub yearly_registrations: Vec<YearlyRegistration>,
    pub range_stats: RangeStats,
    pub ev_type_breakdown: EvTypeBreakdown,
    pub cafv_breakdown: Vec<ShareRow>,
    pub electric_utilities: Vec<ShareRow>,
    pub legislative_districts: Vec<ShareRow>,
    pub summary_stats: ProfileSummary,
}

/// Full dashboard payload: the summary plus every primary distribution,
/// stamped with a schema version and generation time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub summary: SummaryStats,
    pub ev_type_distribution: Vec<ChartRow>,
    pub top_manufacturers: Vec<ChartRow>,
    pub county_distribution: Vec<ChartRow>,
    pub time_series: Vec<TimeSeriesPoint>,
    pub range_distribution: Vec<ChartRow>,
    pub cafv_eligibility: Vec<ChartRow>,
}
