use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub fetch: FetchConfig,
    pub heuristics: HeuristicsConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub db_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_body_bytes: usize,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct HeuristicsConfig {
    pub brands: Vec<BrandConfig>,
    /// Skip the title rule when the URL is hosted on one of the brand's own domains.
    pub brand_domain_check: bool,
}

/// A brand whose name at the start of a page title marks impersonation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandConfig {
    pub name: String,
    pub domains: Vec<String>,
}

impl BrandConfig {
    pub fn new(name: &str, domains: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            domains: domains.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_concurrent_checks: usize,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            brands: default_brands(),
            brand_domain_check: false,
        }
    }
}

pub fn default_brands() -> Vec<BrandConfig> {
    vec![
        BrandConfig::new("Facebook", &["facebook.com", "fb.com", "messenger.com"]),
        BrandConfig::new("Twitter", &["twitter.com", "x.com", "t.co"]),
        BrandConfig::new("LinkedIn", &["linkedin.com", "lnkd.in"]),
        BrandConfig::new("Instagram", &["instagram.com"]),
    ]
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
