use crate::domain::model::{AggregationResult, QueryParameters, VariableStatistic};
use crate::domain::ports::{FloatFilter, FloatStore, MeasurementScope};
use crate::utils::error::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Aggregation plus the complete, ascending list of matching float ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedAggregation {
    pub result: AggregationResult,
    pub float_ids: Vec<i64>,
}

pub struct AggregationEngine<S: FloatStore> {
    store: Arc<S>,
    sample_size: usize,
}

impl<S: FloatStore> Clone for AggregationEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sample_size: self.sample_size,
        }
    }
}

impl<S: FloatStore> AggregationEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_sample_size(store, DEFAULT_SAMPLE_SIZE)
    }

    pub fn with_sample_size(store: Arc<S>, sample_size: usize) -> Self {
        Self { store, sample_size }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn aggregate(&self, params: &QueryParameters) -> Result<AggregationResult> {
        Ok(self.aggregate_scoped(params).await?.result)
    }

    pub async fn aggregate_scoped(&self, params: &QueryParameters) -> Result<ScopedAggregation> {
        let variables = params.effective_variables();
        let filter = FloatFilter::from(params);
        let scope = MeasurementScope::from(params);

        // 單次過濾；BTreeSet 保證每個浮標只算一次且順序穩定
        let floats = self.store.list_floats(&filter).await?;
        let float_ids: Vec<i64> = floats
            .iter()
            .map(|f| f.id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        tracing::debug!(
            "Matched {} floats (region={:?}, status={:?})",
            float_ids.len(),
            params.region,
            params.status
        );

        if float_ids.is_empty() {
            return Ok(ScopedAggregation {
                result: AggregationResult::empty(&variables),
                float_ids,
            });
        }

        // 各項彙總彼此獨立，可同時發出；全部完成後才組裝結果
        let (profile_count, measurement_count, mut statistics, extent, dates) = tokio::try_join!(
            self.store.profile_count(&float_ids, &scope),
            self.store.measurement_count(&float_ids, &scope),
            self.store.variable_statistics(&float_ids, &variables, &scope),
            self.store.geographic_extent(&float_ids, &scope),
            self.store.date_range(&float_ids, &scope),
        )?;

        // 只保留要求的變數，缺少的補上 "no data"
        statistics.retain(|id, _| variables.contains(id));
        for id in &variables {
            statistics
                .entry(*id)
                .or_insert_with(VariableStatistic::no_data);
        }

        let result = AggregationResult {
            float_count: float_ids.len() as u64,
            profile_count,
            measurement_count,
            lat_extent: extent.map(|e| e.lat_extent()).unwrap_or(0.0),
            lon_extent: extent.map(|e| e.lon_extent()).unwrap_or(0.0),
            date_start: dates.map(|(start, _)| start),
            date_end: dates.map(|(_, end)| end),
            variable_statistics: statistics,
            sample_float_ids: float_ids.iter().take(self.sample_size).copied().collect(),
        };

        Ok(ScopedAggregation { result, float_ids })
    }
}
