#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::http::{DEFAULT_BASE_URL, DEFAULT_COMPONENTS};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_name, validate_non_empty_string, validate_path, validate_positive_number,
    validate_url, Validate,
};
use std::collections::HashMap;
use toml_config::TomlConfig;

pub const DEFAULT_OUTPUT_PATH: &str = ".";
pub const TAUGHT_COURSES_FILE: &str = "taught_courses.json";
pub const CURRICULUMS_FILE: &str = "curriculums.json";
pub const REPORT_FILE: &str = "run_report.json";

/// 合併命令列、設定檔與預設值之後的最終設定
#[derive(Debug, Clone, PartialEq)]
pub struct EtlConfig {
    pub base_url: String,
    pub components: String,
    pub timeout_seconds: Option<u64>,
    pub headers: HashMap<String, String>,
    pub output_path: String,
    pub taught_courses_file: String,
    pub curriculums_file: String,
    pub report_file: String,
    pub profile_ids: Vec<String>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            components: DEFAULT_COMPONENTS.to_string(),
            timeout_seconds: None,
            headers: HashMap::new(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            taught_courses_file: TAUGHT_COURSES_FILE.to_string(),
            curriculums_file: CURRICULUMS_FILE.to_string(),
            report_file: REPORT_FILE.to_string(),
            profile_ids: Vec::new(),
        }
    }
}

impl EtlConfig {
    /// 以設定檔的值覆蓋預設值
    pub fn apply_toml(&mut self, toml: &TomlConfig) {
        if let Some(source) = &toml.source {
            if let Some(base_url) = &source.base_url {
                self.base_url = base_url.clone();
            }
            if let Some(components) = &source.components {
                self.components = components.clone();
            }
            if source.timeout_seconds.is_some() {
                self.timeout_seconds = source.timeout_seconds;
            }
            if let Some(headers) = &source.headers {
                self.headers.extend(headers.clone());
            }
        }

        if let Some(output) = &toml.output {
            if let Some(path) = &output.path {
                self.output_path = path.clone();
            }
            if let Some(file) = &output.taught_courses_file {
                self.taught_courses_file = file.clone();
            }
            if let Some(file) = &output.curriculums_file {
                self.curriculums_file = file.clone();
            }
            if let Some(file) = &output.report_file {
                self.report_file = file.clone();
            }
        }

        let profile_ids = toml.profile_ids();
        if !profile_ids.is_empty() {
            self.profile_ids = profile_ids;
        }
    }
}

impl ConfigProvider for EtlConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn components(&self) -> &str {
        &self.components
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    fn extra_headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn taught_courses_file(&self) -> &str {
        &self.taught_courses_file
    }

    fn curriculums_file(&self) -> &str {
        &self.curriculums_file
    }
}

impl Validate for EtlConfig {
    fn validate(&self) -> Result<()> {
        validate_url("source.base_url", &self.base_url)?;
        validate_non_empty_string("source.components", &self.components)?;
        if let Some(timeout) = self.timeout_seconds {
            validate_positive_number("source.timeout_seconds", timeout, 1)?;
        }
        validate_path("output.path", &self.output_path)?;
        validate_file_name("output.taught_courses_file", &self.taught_courses_file)?;
        validate_file_name("output.curriculums_file", &self.curriculums_file)?;
        validate_file_name("output.report_file", &self.report_file)?;
        Ok(())
    }
}
