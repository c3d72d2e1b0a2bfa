use crate::domain::model::{
    BoundingBox, DateRange, DepthRange, Float, FloatStatus, GeoExtent, QueryParameters,
    VariableId, VariableStatistic,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Float-level filter, applied in a single pass by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatFilter {
    pub bbox: Option<BoundingBox>,
    pub status: Option<FloatStatus>,
    pub wmo_id: Option<String>,
    /// Floats must have at least one profile inside this window.
    pub date_range: Option<DateRange>,
}

/// Restricts which profiles and measurements of the selected floats count.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeasurementScope {
    pub date_range: Option<DateRange>,
    pub depth_range: Option<DepthRange>,
}

impl From<&QueryParameters> for FloatFilter {
    fn from(params: &QueryParameters) -> Self {
        Self {
            bbox: params.bbox,
            status: params.status,
            wmo_id: params.wmo_id.clone(),
            date_range: params.date_range,
        }
    }
}

impl From<&QueryParameters> for MeasurementScope {
    fn from(params: &QueryParameters) -> Self {
        Self {
            date_range: params.date_range,
            depth_range: params.depth_range,
        }
    }
}

/// Read-only data-access collaborator.
///
/// Implementations must push aggregation down (or stream measurements with
/// constant state per variable); callers never receive raw measurement rows.
/// Any error returned here is a collaborator fault.
#[async_trait]
pub trait FloatStore: Send + Sync {
    async fn list_floats(&self, filter: &FloatFilter) -> Result<Vec<Float>>;

    async fn profile_count(&self, float_ids: &[i64], scope: &MeasurementScope) -> Result<u64>;

    async fn measurement_count(&self, float_ids: &[i64], scope: &MeasurementScope)
        -> Result<u64>;

    async fn variable_statistics(
        &self,
        float_ids: &[i64],
        variables: &[VariableId],
        scope: &MeasurementScope,
    ) -> Result<BTreeMap<VariableId, VariableStatistic>>;

    async fn geographic_extent(
        &self,
        float_ids: &[i64],
        scope: &MeasurementScope,
    ) -> Result<Option<GeoExtent>>;

    async fn date_range(
        &self,
        float_ids: &[i64],
        scope: &MeasurementScope,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>>;
}
