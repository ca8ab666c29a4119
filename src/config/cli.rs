use super::toml_config::TomlConfig;
use super::EtlConfig;
use crate::utils::error::Result;
use crate::utils::validation::parse_id_list;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "curriculum-etl")]
#[command(about = "Fetch instructor courses and curriculums, then save them as JSON")]
pub struct CliConfig {
    /// Comma-separated instructor profile IDs. Prompted for when omitted.
    #[arg(long, value_delimiter = ',')]
    pub profile_ids: Vec<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Landing-page components requested for each course
    #[arg(long)]
    pub components: Option<String>,

    /// Per-request timeout; no timeout when omitted
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Directory that receives the JSON files
    #[arg(long)]
    pub output_path: Option<String>,

    /// Only fetch taught courses
    #[arg(long)]
    pub skip_curriculums: bool,

    /// Also write the run report as JSON
    #[arg(long)]
    pub report: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// 預設值 → 設定檔 → 命令列，後者覆蓋前者
    pub fn resolve(&self) -> Result<EtlConfig> {
        let mut config = EtlConfig::default();

        if let Some(path) = &self.config {
            tracing::info!("📁 Loading configuration from: {}", path);
            config.apply_toml(&TomlConfig::from_file(path)?);
        }

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(components) = &self.components {
            config.components = components.clone();
        }
        if self.timeout_seconds.is_some() {
            config.timeout_seconds = self.timeout_seconds;
        }
        if let Some(output_path) = &self.output_path {
            config.output_path = output_path.clone();
        }

        let profile_ids = parse_id_list(&self.profile_ids.join(","));
        if !profile_ids.is_empty() {
            config.profile_ids = profile_ids;
        }

        Ok(config)
    }
}
