use crate::core::aggregation::{AggregationEngine, ScopedAggregation};
use crate::domain::catalog::Catalog;
use crate::domain::model::{
    AggregationResult, ComparisonResult, QueryParameters, RegionDifference, VariableId,
};
use crate::domain::ports::FloatStore;
use crate::utils::error::{FloatChatError, Result};
use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Comparison plus the union of matching float ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedComparison {
    pub result: ComparisonResult,
    pub float_ids: Vec<i64>,
}

pub struct ComparisonOrchestrator<S: FloatStore> {
    engine: AggregationEngine<S>,
    catalog: Arc<Catalog>,
}

impl<S: FloatStore> ComparisonOrchestrator<S> {
    pub fn new(engine: AggregationEngine<S>, catalog: Arc<Catalog>) -> Self {
        Self { engine, catalog }
    }

    pub async fn compare(
        &self,
        region_names: &[String],
        base: &QueryParameters,
    ) -> Result<ComparisonResult> {
        Ok(self.compare_scoped(region_names, base).await?.result)
    }

    pub async fn compare_scoped(
        &self,
        region_names: &[String],
        base: &QueryParameters,
    ) -> Result<ScopedComparison> {
        if region_names.len() < 2 {
            return Err(FloatChatError::processing(format!(
                "A comparison needs at least two regions, got {}",
                region_names.len()
            )));
        }

        // 每個區域套用相同的變數/狀態條件，只替換 bbox
        let mut per_region_params = Vec::with_capacity(region_names.len());
        for name in region_names {
            let region = self.catalog.region(name).ok_or_else(|| {
                FloatChatError::processing(format!("Unknown region: {}", name))
            })?;

            per_region_params.push(QueryParameters {
                region: Some(region.name.clone()),
                bbox: Some(region.bbox),
                comparison_regions: None,
                ..base.clone()
            });
        }

        let aggregations: Vec<ScopedAggregation> = try_join_all(
            per_region_params
                .iter()
                .map(|params| self.engine.aggregate_scoped(params)),
        )
        .await?;

        let union: BTreeSet<i64> = aggregations
            .iter()
            .flat_map(|agg| agg.float_ids.iter().copied())
            .collect();

        let regions: Vec<(String, AggregationResult)> = per_region_params
            .iter()
            .zip(aggregations)
            .map(|(params, agg)| (params.region.clone().unwrap_or_default(), agg.result))
            .collect();

        let differences = compute_differences(&regions, &base.effective_variables());

        for (variable, diffs) in &differences {
            for diff in diffs {
                tracing::debug!(
                    "{}: {} vs {} delta={:.3} higher={:?}",
                    variable,
                    diff.baseline_region,
                    diff.other_region,
                    diff.delta,
                    diff.higher_region
                );
            }
        }

        Ok(ScopedComparison {
            result: ComparisonResult {
                regions,
                differences,
                total_float_count: union.len() as u64,
            },
            float_ids: union.into_iter().collect(),
        })
    }
}

/// Differences of every later region against the first one.
pub fn compute_differences(
    regions: &[(String, AggregationResult)],
    variables: &[VariableId],
) -> BTreeMap<VariableId, Vec<RegionDifference>> {
    let mut differences = BTreeMap::new();
    let Some((baseline_name, baseline)) = regions.first() else {
        return differences;
    };

    for variable in variables {
        let Some(base_mean) = mean_of(baseline, *variable) else {
            continue;
        };

        let diffs: Vec<RegionDifference> = regions[1..]
            .iter()
            .filter_map(|(name, result)| {
                let other_mean = mean_of(result, *variable)?;
                let delta = other_mean - base_mean;
                let higher_region = if other_mean > base_mean {
                    Some(name.clone())
                } else if base_mean > other_mean {
                    Some(baseline_name.clone())
                } else {
                    None
                };

                Some(RegionDifference {
                    baseline_region: baseline_name.clone(),
                    other_region: name.clone(),
                    higher_region,
                    delta,
                })
            })
            .collect();

        if !diffs.is_empty() {
            differences.insert(*variable, diffs);
        }
    }

    differences
}

fn mean_of(result: &AggregationResult, variable: VariableId) -> Option<f64> {
    result
        .variable_statistics
        .get(&variable)
        .filter(|stat| stat.has_data())
        .and_then(|stat| stat.mean)
}
