use std::{env, time::Duration};

use super::env::{
    default_brands, AppConfig, BrandConfig, ConfigError, DirectoryConfig, FetchConfig,
    HeuristicsConfig, LoggingConfig, PipelineConfig,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "blacklist.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let fetch = FetchConfig {
            timeout: Duration::from_millis(parse_or("FETCH_TIMEOUT_MS", 10_000)),
            max_body_bytes: parse_or("FETCH_MAX_BODY_BYTES", 2_000_000),
            user_agent: env::var("FETCH_USER_AGENT")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| format!("phishguard/{}", env!("CARGO_PKG_VERSION"))),
        };

        let brands = match env::var("BRAND_TITLES") {
            Ok(value) if !value.trim().is_empty() => parse_brands(&value)?,
            _ => default_brands(),
        };
        let brand_domain_check = match env::var("BRAND_DOMAIN_CHECK") {
            Ok(value) => parse_bool("BRAND_DOMAIN_CHECK", &value)?,
            Err(_) => false,
        };

        let pipeline = PipelineConfig {
            max_concurrent_checks: parse_or::<usize>("MAX_CONCURRENT_CHECKS", 4).max(1),
        };

        Ok(Self {
            directories,
            logging,
            fetch,
            heuristics: HeuristicsConfig {
                brands,
                brand_domain_check,
            },
            pipeline,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Parses `Facebook=facebook.com,fb.com;Twitter=twitter.com`. A brand may omit
/// its domain list (`Facebook`), in which case the domain check never exempts it.
pub(super) fn parse_brands(value: &str) -> Result<Vec<BrandConfig>, ConfigError> {
    let mut brands = Vec::new();
    for part in value.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, domains) = match part.split_once('=') {
            Some((name, domains)) => (name.trim(), domains),
            None => (part, ""),
        };
        if name.is_empty() {
            return Err(ConfigError::Invalid {
                key: "BRAND_TITLES",
                reason: format!("entry `{part}` has no brand name"),
            });
        }
        let domains = domains
            .split(',')
            .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        brands.push(BrandConfig {
            name: name.to_string(),
            domains,
        });
    }
    Ok(brands)
}

pub(super) fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("`{other}` is not a boolean"),
        }),
    }
}
