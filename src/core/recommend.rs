use crate::domain::catalog::Catalog;
use crate::domain::model::{
    AggregationResult, ComparisonResult, FloatStatus, QueryParameters, VariableId,
};
use std::sync::Arc;

pub const MIN_RECOMMENDATIONS: usize = 3;
pub const MAX_RECOMMENDATIONS: usize = 4;

/// Follow-up suggestions, each phrased so it can be submitted again as-is.
#[derive(Debug, Clone)]
pub struct RecommendationGenerator {
    catalog: Arc<Catalog>,
    limit: usize,
}

impl RecommendationGenerator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_limit(catalog, MAX_RECOMMENDATIONS)
    }

    /// `limit` is clamped into `3..=4`.
    pub fn with_limit(catalog: Arc<Catalog>, limit: usize) -> Self {
        Self {
            catalog,
            limit: limit.clamp(MIN_RECOMMENDATIONS, MAX_RECOMMENDATIONS),
        }
    }

    pub fn recommend(&self, params: &QueryParameters, result: &AggregationResult) -> Vec<String> {
        self.build(params, result.is_empty())
    }

    pub fn recommend_for_comparison(
        &self,
        params: &QueryParameters,
        comparison: &ComparisonResult,
    ) -> Vec<String> {
        self.build(params, comparison.total_float_count == 0)
    }

    fn build(&self, params: &QueryParameters, no_floats: bool) -> Vec<String> {
        let mut out = Suggestions::new(self.limit);
        let subject = self.subject(&params.variables);
        let compared: &[String] = params.comparison_regions.as_deref().unwrap_or(&[]);
        let comparing = params.is_comparison();

        // 1. 單一區域：與下一個區域比較
        if !comparing {
            if let Some(next) = params
                .region
                .as_deref()
                .and_then(|region| self.catalog.next_region(region))
            {
                let current = params.region.as_deref().unwrap_or_default();
                out.push(format!(
                    "compare {} between {} and {}{}",
                    subject.as_deref().unwrap_or("ocean conditions"),
                    current,
                    next.name,
                    status_suffix(params.status)
                ));
            }
        }

        // 2. 恰好一個變數：加入下一個變數
        if let [only] = params.variables.as_slice() {
            if let Some(next) = self.next_variable(*only) {
                let pair = format!("{} and {}", self.term(*only), self.term(next));
                if comparing {
                    out.push(format!(
                        "compare {} between {}{}",
                        pair,
                        join_regions(compared),
                        status_suffix(params.status)
                    ));
                } else {
                    out.push(format!(
                        "show {}{}{}",
                        pair,
                        scope_suffix(params.region.as_deref()),
                        status_suffix(params.status)
                    ));
                }
            }
        }

        // 3. 未指定狀態：只看 active 浮標
        if params.status.is_none() {
            if comparing {
                out.push(format!(
                    "compare {} between {} for active floats",
                    subject.as_deref().unwrap_or("ocean conditions"),
                    join_regions(compared)
                ));
            } else {
                out.push(match subject.as_deref() {
                    Some(subject) => format!(
                        "{} from active floats{}",
                        subject,
                        scope_suffix(params.region.as_deref())
                    ),
                    None => format!("show active floats{}", scope_suffix(params.region.as_deref())),
                });
            }
        }

        // 4. 比較中：縮小到其中一個區域
        if comparing {
            for region in compared {
                out.push(self.single_region_query(subject.as_deref(), region, params.status));
            }
        }

        if out.is_full() {
            return out.into_vec();
        }

        // Fallbacks, only used to reach the minimum.
        if no_floats {
            if let Some(status) = params.status {
                tracing::debug!("No floats with status '{}', suggesting any status", status);
                out.push(self.single_region_query(
                    subject.as_deref(),
                    params.region.as_deref().unwrap_or_default(),
                    None,
                ));
            }
        }

        let fallback_subject = subject.unwrap_or_else(|| self.default_subject());
        for region in self.catalog.regions() {
            if out.len() >= MIN_RECOMMENDATIONS {
                break;
            }
            let already_scoped = params.region.as_deref() == Some(region.name.as_str())
                || compared.iter().any(|name| name == &region.name);
            if !already_scoped {
                out.push(format!(
                    "what is the average {} in {}",
                    fallback_subject, region.name
                ));
            }
        }

        for info in self.catalog.variables() {
            if out.len() >= MIN_RECOMMENDATIONS {
                break;
            }
            if !params.variables.contains(&info.id) {
                out.push(format!("what is the average {} across all floats", self.term(info.id)));
            }
        }

        out.into_vec()
    }

    fn single_region_query(
        &self,
        subject: Option<&str>,
        region: &str,
        status: Option<FloatStatus>,
    ) -> String {
        let status = status.map(|s| format!("{} ", s)).unwrap_or_default();
        match subject {
            Some(subject) => format!(
                "{} from {}floats{}",
                subject,
                status,
                scope_suffix(Some(region).filter(|r| !r.is_empty()))
            ),
            None => format!(
                "show {}floats{}",
                status,
                scope_suffix(Some(region).filter(|r| !r.is_empty()))
            ),
        }
    }

    /// 下一個尚未被要求的變數（依標準順序，循環）
    fn next_variable(&self, current: VariableId) -> Option<VariableId> {
        let ids: Vec<VariableId> = self.catalog.variables().iter().map(|v| v.id).collect();
        let position = ids.iter().position(|id| *id == current)?;
        (1..ids.len())
            .map(|offset| ids[(position + offset) % ids.len()])
            .find(|id| *id != current)
    }

    fn subject(&self, variables: &[VariableId]) -> Option<String> {
        if variables.is_empty() {
            return None;
        }
        let terms: Vec<String> = variables.iter().map(|id| self.term(*id)).collect();
        Some(terms.join(" and "))
    }

    fn default_subject(&self) -> String {
        self.catalog
            .variables()
            .first()
            .map(|info| self.term(info.id))
            .unwrap_or_else(|| VariableId::Temperature.as_str().to_string())
    }

    /// The first alias, which the extractor is guaranteed to recognize.
    fn term(&self, id: VariableId) -> String {
        self.catalog
            .variable(id)
            .and_then(|info| info.aliases.first().cloned())
            .unwrap_or_else(|| id.as_str().replace('_', " "))
    }
}

fn scope_suffix(region: Option<&str>) -> String {
    region.map(|r| format!(" in {}", r)).unwrap_or_default()
}

fn status_suffix(status: Option<FloatStatus>) -> String {
    status
        .map(|s| format!(" for {} floats", s))
        .unwrap_or_default()
}

fn join_regions(regions: &[String]) -> String {
    match regions {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Ordered, deduplicated, capped list.
struct Suggestions {
    items: Vec<String>,
    limit: usize,
}

impl Suggestions {
    fn new(limit: usize) -> Self {
        Self {
            items: Vec::with_capacity(limit),
            limit,
        }
    }

    fn push(&mut self, suggestion: String) {
        if self.items.len() < self.limit && !self.items.contains(&suggestion) {
            self.items.push(suggestion);
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}
