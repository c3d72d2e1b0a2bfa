pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::TomlConfig;

pub use crate::adapters::{load_directory, InMemoryStore};
pub use crate::core::{
    EngineSettings, HighlightBroadcaster, Interpretation, QueryContext, QueryEngine, QueryOutcome,
    QueryResponse, QueryResult,
};
pub use crate::domain::catalog::Catalog;
pub use crate::domain::ports::FloatStore;
pub use crate::utils::error::{FloatChatError, Result};
