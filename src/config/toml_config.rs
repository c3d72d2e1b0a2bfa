use crate::core::aggregation::DEFAULT_SAMPLE_SIZE;
use crate::core::engine::EngineSettings;
use crate::core::recommend::{MAX_RECOMMENDATIONS, MIN_RECOMMENDATIONS};
use crate::domain::catalog::{normalize, Catalog, Region, VariableInfo};
use crate::domain::model::{BoundingBox, VariableId};
use crate::utils::error::{FloatChatError, Result};
use crate::utils::validation::{
    validate_aliases, validate_bbox, validate_non_empty_string, validate_path, validate_range,
    validate_unique_names, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_DATA_DIRECTORY: &str = "./data";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub engine: EngineConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
    /// 取代內建的區域表
    pub regions: Option<Vec<RegionConfig>>,
    /// 依變數 id 覆寫內建的變數表
    pub variables: Option<Vec<VariableConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_size: usize,
    pub max_recommendations: usize,
    /// Reuse the previous query's region when a follow-up names none.
    pub carry_region: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            max_recommendations: MAX_RECOMMENDATIONS,
            carry_region: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub directory: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_DATA_DIRECTORY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    /// `[minLon, minLat, maxLon, maxLat]`
    pub bbox: [f64; 4],
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableConfig {
    pub id: VariableId,
    pub display_name: String,
    pub unit: String,
    pub aliases: Vec<String>,
}

impl RegionConfig {
    fn bounding_box(&self) -> BoundingBox {
        let [min_lon, min_lat, max_lon, max_lat] = self.bbox;
        BoundingBox::new(min_lon, min_lat, max_lon, max_lat)
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(FloatChatError::ConfigError {
                message: format!("Config file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(FloatChatError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| FloatChatError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FLOATCHAT_DATA})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            sample_size: self.engine.sample_size,
            max_recommendations: self.engine.max_recommendations,
            carry_region: self.engine.carry_region,
        }
    }

    pub fn data_directory(&self) -> PathBuf {
        PathBuf::from(&self.data.directory)
    }

    /// Region and variable tables with any configured overrides applied.
    pub fn catalog(&self) -> Catalog {
        let regions = self.regions.as_ref().map(|entries| {
            entries
                .iter()
                .map(|entry| Region {
                    name: entry.name.clone(),
                    bbox: entry.bounding_box(),
                    aliases: entry.aliases.iter().map(|a| normalize(a)).collect(),
                })
                .collect()
        });

        let variables = self.variables.as_ref().map(|entries| {
            entries
                .iter()
                .map(|entry| VariableInfo {
                    id: entry.id,
                    display_name: entry.display_name.clone(),
                    unit: entry.unit.clone(),
                    aliases: entry.aliases.iter().map(|a| normalize(a)).collect(),
                })
                .collect()
        });

        Catalog::with_tables(regions, variables)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_range(
            "engine.sample_size",
            self.engine.sample_size,
            1,
            DEFAULT_SAMPLE_SIZE,
        )?;
        validate_range(
            "engine.max_recommendations",
            self.engine.max_recommendations,
            MIN_RECOMMENDATIONS,
            MAX_RECOMMENDATIONS,
        )?;

        validate_path("data.directory", &self.data.directory)?;

        if let Some(level) = &self.logging.level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(FloatChatError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: format!("Valid levels: {}", LOG_LEVELS.join(", ")),
                });
            }
        }

        if let Some(regions) = &self.regions {
            if regions.len() < 2 {
                return Err(FloatChatError::ConfigValidationError {
                    field: "regions".to_string(),
                    message: "At least two regions are required for comparisons".to_string(),
                });
            }
            validate_unique_names("regions", regions.iter().map(|r| r.name.as_str()))?;

            for (index, region) in regions.iter().enumerate() {
                let field = format!("regions[{}]", index);
                validate_non_empty_string(&format!("{}.name", field), &region.name)?;
                validate_bbox(&format!("{}.bbox", field), &region.bounding_box())?;
                validate_aliases(&format!("{}.aliases", field), &region.aliases)?;
            }
        }

        if let Some(variables) = &self.variables {
            validate_unique_names("variables", variables.iter().map(|v| v.id.as_str()))?;

            for variable in variables {
                let field = format!("variables.{}", variable.id);
                validate_non_empty_string(&format!("{}.display_name", field), &variable.display_name)?;
                validate_aliases(&format!("{}.aliases", field), &variable.aliases)?;
            }
        }

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[engine]
sample_size = 5
carry_region = true

[data]
directory = "./argo-export"

[logging]
level = "debug"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.engine.sample_size, 5);
        assert_eq!(config.engine.max_recommendations, MAX_RECOMMENDATIONS);
        assert!(config.engine.carry_region);
        assert_eq!(config.data_directory(), PathBuf::from("./argo-export"));
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.engine_settings(), EngineSettings::default());
        assert_eq!(config.catalog(), Catalog::builtin());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FLOATCHAT_TEST_DATA_DIR", "/srv/argo");

        let toml_content = r#"
[data]
directory = "${FLOATCHAT_TEST_DATA_DIR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.data.directory, "/srv/argo");

        std::env::remove_var("FLOATCHAT_TEST_DATA_DIR");

        let config = TomlConfig::from_toml_str(
            "[data]\ndirectory = \"${FLOATCHAT_TEST_SURELY_UNSET}\"\n",
        )
        .unwrap();
        assert_eq!(config.data.directory, "${FLOATCHAT_TEST_SURELY_UNSET}");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str("[engine]\nmax_recommendations = 6\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, FloatChatError::InvalidConfigValueError { ref field, .. } if field == "engine.max_recommendations"));

        let config = TomlConfig::from_toml_str("[engine]\nsample_size = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_region_table_override() {
        let toml_content = r#"
[[regions]]
name = "Coral Sea"
bbox = [142.0, -30.0, 165.0, -8.0]
aliases = ["coral", "Coral Sea"]

[[regions]]
name = "Tasman Sea"
bbox = [147.0, -50.0, 175.0, -30.0]
aliases = ["tasman"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        config.validate().unwrap();

        let catalog = config.catalog();
        assert_eq!(catalog.regions().len(), 2);
        assert_eq!(catalog.region("coral sea").unwrap().aliases, vec!["coral", "coral sea"]);
        assert_eq!(catalog.next_region("Tasman Sea").unwrap().name, "Coral Sea");
        assert_eq!(catalog.variables().len(), VariableId::ALL.len());
    }

    #[test]
    fn test_punctuated_aliases_match_queries() {
        let toml_content = r#"
[[regions]]
name = "St. Helena Basin"
bbox = [-20.0, -25.0, 0.0, -10.0]
aliases = ["St. Helena", "helena-basin"]

[[regions]]
name = "Tasman Sea"
bbox = [147.0, -50.0, 175.0, -30.0]
aliases = ["tasman"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        config.validate().unwrap();

        let catalog = config.catalog();
        let helena = catalog.region("St. Helena Basin").unwrap();
        assert_eq!(helena.aliases, vec!["st helena", "helena basin"]);

        for question in [
            "temperature near St. Helena",
            "salinity in the helena-basin",
            "floats in st. helena basin",
        ] {
            let text = normalize(question);
            assert_eq!(
                catalog.match_region(&text).map(|r| r.name.as_str()),
                Some("St. Helena Basin"),
                "{}",
                question
            );
        }
    }

    #[test]
    fn test_punctuation_only_alias_rejected() {
        let toml_content = r#"
[[regions]]
name = "Coral Sea"
bbox = [142.0, -30.0, 165.0, -8.0]
aliases = ["..."]

[[regions]]
name = "Tasman Sea"
bbox = [147.0, -50.0, 175.0, -30.0]
aliases = ["tasman"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_antimeridian_region_rejected() {
        let toml_content = r#"
[[regions]]
name = "Fiji Basin"
bbox = [170.0, -25.0, -170.0, -10.0]
aliases = ["fiji"]

[[regions]]
name = "Coral Sea"
bbox = [142.0, -30.0, 165.0, -8.0]
aliases = ["coral"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("regions[0].bbox"));
    }

    #[test]
    fn test_variable_override_and_unknown_id() {
        let toml_content = r#"
[[variables]]
id = "temperature"
display_name = "Sea Temperature"
unit = "°C"
aliases = ["temperature", "sst"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        config.validate().unwrap();
        let catalog = config.catalog();
        let info = catalog.variable(VariableId::Temperature).unwrap();
        assert_eq!(info.display_name, "Sea Temperature");
        assert_eq!(
            catalog.variable(VariableId::Salinity).unwrap().display_name,
            "Salinity"
        );

        let unknown = "[[variables]]\nid = \"turbidity\"\ndisplay_name = \"T\"\nunit = \"NTU\"\naliases = [\"t\"]\n";
        assert!(matches!(
            TomlConfig::from_toml_str(unknown),
            Err(FloatChatError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\nmax_recommendations = 3").unwrap();

        let config = TomlConfig::from_file(file.path()).unwrap();
        assert_eq!(config.engine_settings().max_recommendations, 3);

        let err = TomlConfig::from_file("/no/such/floatchat.toml").unwrap_err();
        assert!(matches!(err, FloatChatError::ConfigError { .. }));
        assert!(err.to_string().contains("/no/such/floatchat.toml"));
        assert!(!err.is_retryable());
    }
}
