use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// TOML 設定檔。所有區段皆可省略，未設定的值交由預設值或命令列決定。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: Option<SourceConfig>,
    pub input: Option<InputConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: Option<String>,
    pub components: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    pub profile_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub taught_courses_file: Option<String>,
    pub curriculums_file: Option<String>,
    pub report_file: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_HOST})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn profile_ids(&self) -> Vec<String> {
        self.input
            .as_ref()
            .and_then(|input| input.profile_ids.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[source]
base_url = "https://api.example.com"
components = "curriculum_context,price_text"
timeout_seconds = 20

[source.headers]
user-agent = "curriculum-etl"

[input]
profile_ids = ["jane-doe", "john-roe"]

[output]
path = "./out"
curriculums_file = "curricula.json"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let source = config.source.as_ref().unwrap();

        assert_eq!(source.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(source.timeout_seconds, Some(20));
        assert_eq!(
            source.headers.as_ref().unwrap().get("user-agent").map(String::as_str),
            Some("curriculum-etl")
        );
        assert_eq!(config.profile_ids(), vec!["jane-doe", "john-roe"]);

        let output = config.output.as_ref().unwrap();
        assert_eq!(output.curriculums_file.as_deref(), Some("curricula.json"));
        assert!(output.taught_courses_file.is_none());
    }

    #[test]
    fn test_empty_toml_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.source.is_none());
        assert!(config.profile_ids().is_empty());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CURRICULUM_ETL_TEST_HOST", "https://mirror.example.com");

        let toml_content = r#"
[source]
base_url = "${CURRICULUM_ETL_TEST_HOST}"
components = "${CURRICULUM_ETL_UNSET_VAR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let source = config.source.unwrap();
        assert_eq!(source.base_url.as_deref(), Some("https://mirror.example.com"));
        assert_eq!(
            source.components.as_deref(),
            Some("${CURRICULUM_ETL_UNSET_VAR}")
        );

        std::env::remove_var("CURRICULUM_ETL_TEST_HOST");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("[source\nbase_url = 1");
        assert!(matches!(
            result,
            Err(EtlError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[input]\nprofile_ids = [\"jane-doe\"]\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.profile_ids(), vec!["jane-doe"]);
    }
}
