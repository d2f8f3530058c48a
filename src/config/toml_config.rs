use crate::utils::error::{LocatorError, Result};
use crate::utils::validation::{
    validate_dataset_extension, validate_path, validate_positive_distance, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `.json` or `.csv` dataset.
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Meters.
    pub default_max_distance: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LocatorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LocatorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PHARMACY_DATASET})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LocatorError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("store.path", &self.store.path)?;
        validate_dataset_extension("store.path", &self.store.path)?;

        if let Some(distance) = self.search.default_max_distance {
            validate_positive_distance("search.default_max_distance", distance)?;
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
[store]
path = "./data/pharmacies.json"

[search]
default_max_distance = 5000.0

[logging]
json = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.store.path, "./data/pharmacies.json");
        assert_eq!(config.search.default_max_distance, Some(5000.0));
        assert!(config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_optional_sections_default() {
        let config = TomlConfig::from_toml_str("[store]\npath = \"p.csv\"\n").unwrap();
        assert_eq!(config.search.default_max_distance, None);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PHARMACY_LOCATOR_TEST_DATASET", "/srv/pharmacies.csv");

        let config =
            TomlConfig::from_toml_str("[store]\npath = \"${PHARMACY_LOCATOR_TEST_DATASET}\"\n")
                .unwrap();
        assert_eq!(config.store.path, "/srv/pharmacies.csv");

        std::env::remove_var("PHARMACY_LOCATOR_TEST_DATASET");
    }

    #[test]
    fn test_unset_env_var_is_left_in_place() {
        let config =
            TomlConfig::from_toml_str("[store]\npath = \"${PHARMACY_LOCATOR_UNSET_VAR}.json\"\n")
                .unwrap();
        assert_eq!(config.store.path, "${PHARMACY_LOCATOR_UNSET_VAR}.json");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            "[store]\npath = \"pharmacies.xml\"\n[search]\ndefault_max_distance = 100.0\n",
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            "[store]\npath = \"pharmacies.json\"\n[search]\ndefault_max_distance = -1.0\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_store_section_fails() {
        assert!(TomlConfig::from_toml_str("[search]\n").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[store]\npath = \"file-test.json\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.store.path, "file-test.json");
    }
}
