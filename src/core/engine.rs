use crate::core::aggregation::{AggregationEngine, DEFAULT_SAMPLE_SIZE};
use crate::core::comparison::ComparisonOrchestrator;
use crate::core::extractor::{ParameterExtractor, QueryContext};
use crate::core::highlight::HighlightBroadcaster;
use crate::core::insight::InsightSynthesizer;
use crate::core::recommend::{RecommendationGenerator, MAX_RECOMMENDATIONS};
use crate::core::relevance::{Relevance, RelevanceGate};
use crate::domain::catalog::Catalog;
use crate::domain::model::{
    AggregationResult, ComparisonResult, Query, QueryId, QueryParameters,
};
use crate::domain::ports::FloatStore;
use crate::utils::error::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub sample_size: usize,
    pub max_recommendations: usize,
    /// `run` reuses the last answered region when a follow-up names none.
    pub carry_region: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            max_recommendations: MAX_RECOMMENDATIONS,
            carry_region: false,
        }
    }
}

/// Outcome of gate + extraction only, without touching the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Interpretation {
    Accepted {
        parameters: QueryParameters,
    },
    Rejected {
        message: String,
        suggestions: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum QueryResult {
    Single(AggregationResult),
    Comparison(ComparisonResult),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub query_id: QueryId,
    pub question: String,
    pub parameters: QueryParameters,
    pub result: QueryResult,
    pub insight: String,
    pub recommendations: Vec<String>,
    pub highlighted_float_ids: Vec<i64>,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Rejected {
        message: String,
        suggestions: Vec<String>,
    },
    Answered(Box<QueryResponse>),
}

impl QueryOutcome {
    pub fn response(&self) -> Option<&QueryResponse> {
        match self {
            QueryOutcome::Answered(response) => Some(response),
            QueryOutcome::Rejected { .. } => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, QueryOutcome::Rejected { .. })
    }
}

/// 查詢引擎：閘門 → 參數擷取 → 彙總/比較 → 摘要與建議 → 高亮
pub struct QueryEngine<S: FloatStore> {
    catalog: Arc<Catalog>,
    gate: RelevanceGate,
    extractor: ParameterExtractor,
    aggregator: AggregationEngine<S>,
    comparison: ComparisonOrchestrator<S>,
    insight: InsightSynthesizer,
    recommender: RecommendationGenerator,
    highlights: HighlightBroadcaster,
    settings: EngineSettings,
    last_region: Mutex<Option<String>>,
    next_query_id: AtomicU64,
}

impl<S: FloatStore> QueryEngine<S> {
    pub fn new(store: Arc<S>, catalog: Arc<Catalog>) -> Self {
        Self::with_settings(store, catalog, EngineSettings::default())
    }

    pub fn with_settings(store: Arc<S>, catalog: Arc<Catalog>, settings: EngineSettings) -> Self {
        let aggregator = AggregationEngine::with_sample_size(store, settings.sample_size);

        Self {
            gate: RelevanceGate::new(Arc::clone(&catalog)),
            extractor: ParameterExtractor::new(Arc::clone(&catalog)),
            comparison: ComparisonOrchestrator::new(aggregator.clone(), Arc::clone(&catalog)),
            aggregator,
            insight: InsightSynthesizer::new(Arc::clone(&catalog)),
            recommender: RecommendationGenerator::with_limit(
                Arc::clone(&catalog),
                settings.max_recommendations,
            ),
            highlights: HighlightBroadcaster::new(),
            settings,
            last_region: Mutex::new(None),
            next_query_id: AtomicU64::new(1),
            catalog,
        }
    }

    /// Shares an existing highlight cell, e.g. one also held by a map view.
    pub fn with_highlights(mut self, highlights: HighlightBroadcaster) -> Self {
        self.highlights = highlights;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn highlights(&self) -> &HighlightBroadcaster {
        &self.highlights
    }

    pub fn interpret(&self, raw: &str) -> Interpretation {
        self.interpret_query(&Query::new(raw), &QueryContext::default())
    }

    pub fn interpret_query(&self, query: &Query, context: &QueryContext) -> Interpretation {
        match self.gate.classify(&query.text) {
            Relevance::Reject {
                reason,
                suggestions,
            } => Interpretation::Rejected {
                message: reason,
                suggestions,
            },
            Relevance::Accept => Interpretation::Accepted {
                parameters: self.extractor.extract_with_context(query, context),
            },
        }
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Runs a question; with `carry_region` enabled the previous region is
    /// offered as context.
    pub async fn run(&self, raw: &str) -> Result<QueryOutcome> {
        let context = if self.settings.carry_region {
            QueryContext {
                carry_region: self
                    .last_region
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone(),
            }
        } else {
            QueryContext::default()
        };
        self.run_query(&Query::new(raw), &context).await
    }

    pub async fn run_with_context(&self, raw: &str, context: &QueryContext) -> Result<QueryOutcome> {
        self.run_query(&Query::new(raw), context).await
    }

    pub async fn run_query(&self, query: &Query, context: &QueryContext) -> Result<QueryOutcome> {
        let started = Instant::now();
        let query_id = QueryId(self.next_query_id.fetch_add(1, Ordering::SeqCst));
        tracing::info!("🔎 {} received: {:?}", query_id, query.text);

        let parameters = match self.interpret_query(query, context) {
            Interpretation::Rejected {
                message,
                suggestions,
            } => {
                return Ok(QueryOutcome::Rejected {
                    message,
                    suggestions,
                });
            }
            Interpretation::Accepted { parameters } => parameters,
        };

        let (result, float_ids, insight, recommendations) =
            match parameters.comparison_regions.as_deref() {
                Some(regions) if parameters.is_comparison() => {
                    let scoped = self.comparison.compare_scoped(regions, &parameters).await?;
                    let insight = self.insight.render_comparison(&scoped.result);
                    let recommendations = self
                        .recommender
                        .recommend_for_comparison(&parameters, &scoped.result);
                    (
                        QueryResult::Comparison(scoped.result),
                        scoped.float_ids,
                        insight,
                        recommendations,
                    )
                }
                _ => {
                    let scoped = self.aggregator.aggregate_scoped(&parameters).await?;
                    let insight = self.insight.render(&scoped.result);
                    let recommendations = self.recommender.recommend(&parameters, &scoped.result);
                    (
                        QueryResult::Single(scoped.result),
                        scoped.float_ids,
                        insight,
                        recommendations,
                    )
                }
            };

        // 沒有結果時保留上一次的高亮
        if !float_ids.is_empty() {
            self.highlights.publish(float_ids.iter().copied(), query_id);
        }

        if self.settings.carry_region && parameters.region.is_some() {
            *self
                .last_region
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = parameters.region.clone();
        }

        let processing_time_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "✅ {} answered: {} floats highlighted in {} ms",
            query_id,
            float_ids.len(),
            processing_time_ms
        );

        Ok(QueryOutcome::Answered(Box::new(QueryResponse {
            query_id,
            question: query.text.clone(),
            parameters,
            result,
            insight,
            recommendations,
            highlighted_float_ids: float_ids,
            processing_time_ms,
        })))
    }
}
