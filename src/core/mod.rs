pub mod aggregation;
pub mod comparison;
pub mod engine;
pub mod extractor;
pub mod highlight;
pub mod insight;
pub mod recommend;
pub mod relevance;
pub mod stats;

pub use crate::domain::ports::FloatStore;
pub use crate::utils::error::Result;
pub use engine::{EngineSettings, Interpretation, QueryEngine, QueryOutcome, QueryResponse, QueryResult};
pub use extractor::QueryContext;
pub use highlight::HighlightBroadcaster;
