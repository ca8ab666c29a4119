pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::adapters::{http::HttpCourseApi, storage::LocalStorage};
pub use crate::config::EtlConfig;
pub use crate::core::orchestrator::BatchOrchestrator;
pub use crate::utils::error::{EtlError, Result};
