use crate::utils::error::{FloatChatError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "floatchat")]
#[command(about = "Ask questions about ARGO float data in plain English")]
pub struct CliConfig {
    /// The question, e.g. "average temperature in pacific ocean"
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Directory holding floats.csv, profiles.csv and measurements.csv
    #[arg(long)]
    pub data_dir: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, help = "Print the full response as JSON")]
    pub json: bool,

    #[arg(long, help = "Only run the relevance gate and parameter extraction")]
    pub interpret_only: bool,

    /// Region carried over from a previous question
    #[arg(long)]
    pub region: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn question_text(&self) -> String {
        self.question.join(" ")
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.question.iter().all(|word| word.trim().is_empty()) {
            return Err(FloatChatError::MissingConfigError {
                field: "question".to_string(),
            });
        }

        if let Some(dir) = &self.data_dir {
            validate_path("data_dir", dir)?;
        }
        if let Some(path) = &self.config {
            validate_path("config", path)?;
        }
        if let Some(region) = &self.region {
            validate_non_empty_string("region", region)?;
        }

        Ok(())
    }
}
