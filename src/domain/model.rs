use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 查詢編號，由引擎依序遞增配發
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueryId(pub u64);

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q-{}", self.0)
    }
}

/// A raw user question together with the moment it arrived.
#[derive(Debug, Clone)]
pub struct Query {
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self::at(text, Utc::now())
    }

    pub fn at(text: impl Into<String>, received_at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            received_at,
        }
    }
}

/// `(minLon, minLat, maxLon, maxLat)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub const fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// 邊界包含在內
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    pub fn is_well_formed(&self) -> bool {
        self.min_lat <= self.max_lat && self.min_lon <= self.max_lon
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatStatus {
    Active,
    Inactive,
    Maintenance,
}

impl FloatStatus {
    pub const ALL: [FloatStatus; 3] = [
        FloatStatus::Active,
        FloatStatus::Inactive,
        FloatStatus::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FloatStatus::Active => "active",
            FloatStatus::Inactive => "inactive",
            FloatStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for FloatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The seven canonical variables, in canonical declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableId {
    Temperature,
    Salinity,
    Pressure,
    DissolvedOxygen,
    Ph,
    Nitrate,
    Chlorophyll,
}

impl VariableId {
    pub const ALL: [VariableId; 7] = [
        VariableId::Temperature,
        VariableId::Salinity,
        VariableId::Pressure,
        VariableId::DissolvedOxygen,
        VariableId::Ph,
        VariableId::Nitrate,
        VariableId::Chlorophyll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariableId::Temperature => "temperature",
            VariableId::Salinity => "salinity",
            VariableId::Pressure => "pressure",
            VariableId::DissolvedOxygen => "dissolved_oxygen",
            VariableId::Ph => "ph",
            VariableId::Nitrate => "nitrate",
            VariableId::Chlorophyll => "chlorophyll",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        *at >= self.start && *at <= self.end
    }
}

/// Depth in metres, `min < max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthRange {
    pub min_m: f64,
    pub max_m: f64,
}

impl DepthRange {
    /// 深度轉壓力的近似係數 (dbar / m)
    pub const DBAR_PER_METRE: f64 = 1.02;

    pub fn new(min_m: f64, max_m: f64) -> Option<Self> {
        (min_m >= 0.0 && min_m < max_m).then_some(Self { min_m, max_m })
    }

    pub fn contains_pressure(&self, pressure_dbar: f64) -> bool {
        pressure_dbar >= self.min_m * Self::DBAR_PER_METRE
            && pressure_dbar <= self.max_m * Self::DBAR_PER_METRE
    }
}

/// Structured filter produced once per query by the extractor.
///
/// An unset region means global scope, an empty variable list means all seven
/// canonical variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParameters {
    pub region: Option<String>,
    pub bbox: Option<BoundingBox>,
    pub variables: Vec<VariableId>,
    pub status: Option<FloatStatus>,
    pub comparison_regions: Option<Vec<String>>,
    pub depth_range: Option<DepthRange>,
    pub date_range: Option<DateRange>,
    pub wmo_id: Option<String>,
}

impl QueryParameters {
    pub fn is_comparison(&self) -> bool {
        self.comparison_regions
            .as_ref()
            .map(|regions| regions.len() >= 2)
            .unwrap_or(false)
    }

    /// 未指定變數時回傳全部七個
    pub fn effective_variables(&self) -> Vec<VariableId> {
        if self.variables.is_empty() {
            VariableId::ALL.to_vec()
        } else {
            self.variables.clone()
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.region.is_none()
            && self.bbox.is_none()
            && self.variables.is_empty()
            && self.status.is_none()
            && self.comparison_regions.is_none()
            && self.depth_range.is_none()
            && self.date_range.is_none()
            && self.wmo_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Float {
    pub id: i64,
    pub wmo_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: FloatStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub float_id: i64,
    pub cycle_number: u32,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
}

/// One depth level of a profile. QC flag `4` marks a value as bad.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Measurement {
    pub id: i64,
    pub profile_id: i64,
    pub pressure: Option<f64>,
    pub depth: Option<f64>,
    pub temperature: Option<f64>,
    pub salinity: Option<f64>,
    pub dissolved_oxygen: Option<f64>,
    pub ph: Option<f64>,
    pub nitrate: Option<f64>,
    pub chlorophyll: Option<f64>,
    pub pressure_qc: Option<String>,
    pub temperature_qc: Option<String>,
    pub salinity_qc: Option<String>,
}

impl Measurement {
    const BAD_QC: &'static str = "4";

    /// Value of `variable`, or `None` when missing, non-finite or flagged bad.
    pub fn value(&self, variable: VariableId) -> Option<f64> {
        let (raw, qc) = match variable {
            VariableId::Temperature => (self.temperature, self.temperature_qc.as_deref()),
            VariableId::Salinity => (self.salinity, self.salinity_qc.as_deref()),
            VariableId::Pressure => (self.pressure, self.pressure_qc.as_deref()),
            VariableId::DissolvedOxygen => (self.dissolved_oxygen, None),
            VariableId::Ph => (self.ph, None),
            VariableId::Nitrate => (self.nitrate, None),
            VariableId::Chlorophyll => (self.chlorophyll, None),
        };

        if qc.map(str::trim) == Some(Self::BAD_QC) {
            return None;
        }
        raw.filter(|v| v.is_finite())
    }
}

/// Descriptive statistics for one variable. `count == 0` means "no data".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VariableStatistic {
    pub count: u64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub stddev: Option<f64>,
}

impl VariableStatistic {
    pub fn no_data() -> Self {
        Self::default()
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoExtent {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoExtent {
    pub fn lat_extent(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_extent(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub float_count: u64,
    pub profile_count: u64,
    pub measurement_count: u64,
    pub lat_extent: f64,
    pub lon_extent: f64,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    pub variable_statistics: BTreeMap<VariableId, VariableStatistic>,
    pub sample_float_ids: Vec<i64>,
}

impl AggregationResult {
    /// 零筆符合浮標時的結果，每個變數都是 "no data"
    pub fn empty(variables: &[VariableId]) -> Self {
        Self {
            float_count: 0,
            profile_count: 0,
            measurement_count: 0,
            lat_extent: 0.0,
            lon_extent: 0.0,
            date_start: None,
            date_end: None,
            variable_statistics: variables
                .iter()
                .map(|id| (*id, VariableStatistic::no_data()))
                .collect(),
            sample_float_ids: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.float_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDifference {
    pub baseline_region: String,
    pub other_region: String,
    /// `None` when both means are equal.
    pub higher_region: Option<String>,
    /// `other.mean - baseline.mean`
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub regions: Vec<(String, AggregationResult)>,
    pub differences: BTreeMap<VariableId, Vec<RegionDifference>>,
    /// Union of per-region float ids.
    pub total_float_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighlightSet {
    pub float_ids: BTreeSet<i64>,
    pub source_query_id: Option<QueryId>,
}

impl HighlightSet {
    pub fn is_empty(&self) -> bool {
        self.float_ids.is_empty()
    }
}
