use crate::domain::catalog::{find_term, normalize, Catalog};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const REJECTION_MESSAGE: &str = "I can only help with oceanographic data from ARGO floats. \
Try asking about temperature, salinity or other ocean measurements in a specific region.";

const DENYLIST: [&str; 17] = [
    "weather", "stock", "news", "sports", "movie", "music", "recipe", "game", "joke", "story",
    "song", "hello", "hi", "hey", "thanks", "thank you", "bye",
];

const OCEAN_KEYWORDS: [&str; 7] = ["float", "profile", "ocean", "buoy", "argo", "sea", "marine"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Relevance {
    Accept,
    Reject {
        reason: String,
        suggestions: Vec<String>,
    },
}

impl Relevance {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Relevance::Accept)
    }
}

/// 判斷問題是否屬於海洋資料範疇；任何領域詞都會蓋過黑名單
#[derive(Debug, Clone)]
pub struct RelevanceGate {
    catalog: Arc<Catalog>,
}

impl RelevanceGate {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn classify(&self, text: &str) -> Relevance {
        let normalized = normalize(text);

        if self.has_domain_term(&normalized) {
            return Relevance::Accept;
        }

        match DENYLIST
            .iter()
            .find(|term| find_term(&normalized, term).is_some())
        {
            Some(term) => {
                tracing::info!("🚫 Rejected off-topic query (matched '{}')", term);
                Relevance::Reject {
                    reason: REJECTION_MESSAGE.to_string(),
                    suggestions: self.example_queries(),
                }
            }
            None => Relevance::Accept,
        }
    }

    fn has_domain_term(&self, normalized: &str) -> bool {
        self.catalog.mentions_any_alias(normalized)
            || OCEAN_KEYWORDS
                .iter()
                .any(|keyword| find_term(normalized, keyword).is_some())
    }

    /// Four accepted example queries drawn from the tables.
    pub fn example_queries(&self) -> Vec<String> {
        let regions = self.catalog.regions();
        let variables = self.catalog.variables();
        let region = |i: usize| regions.get(i % regions.len().max(1)).map(|r| r.name.as_str());
        let variable = |i: usize| {
            variables
                .get(i % variables.len().max(1))
                .map(|v| v.display_name.to_lowercase())
        };

        let mut examples = Vec::new();
        if let (Some(var), Some(reg)) = (variable(0), region(0)) {
            examples.push(format!("what is the average {} in {}", var, reg));
        }
        if let (Some(var), Some(a), Some(b)) = (variable(1), region(2), region(1)) {
            examples.push(format!("compare {} between {} and {}", var, a, b));
        }
        if let Some(reg) = region(4) {
            examples.push(format!("show active floats in {}", reg));
        }
        if let (Some(var), Some(reg)) = (variable(3), region(3)) {
            examples.push(format!("{} levels in {}", var, reg));
        }
        examples
    }
}
