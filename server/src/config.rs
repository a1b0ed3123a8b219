use std::time::Duration;

use anyhow::{Context, Result};
use platform_db::DatabaseSettings;
use platform_source::{DEFAULT_SOURCE_URL, SourceConfig};

const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub source: SourceConfig,
    /// Empty means any origin may read the org chart.
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let url = std::env::var("EMPLOYEE_SOURCE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE_URL.into());

        let timeout_secs = match std::env::var("EMPLOYEE_SOURCE_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid EMPLOYEE_SOURCE_TIMEOUT_SECS {raw:?}"))?,
            Err(_) => DEFAULT_SOURCE_TIMEOUT_SECS,
        };

        let cors_allowed_origins =
            parse_origins(&std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        Ok(Self {
            database: DatabaseSettings::from_env(),
            source: SourceConfig {
                url,
                timeout: Duration::from_secs(timeout_secs),
            },
            cors_allowed_origins,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" http://localhost:5173 ,, https://chart.example.com"),
            ["http://localhost:5173", "https://chart.example.com"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn defaults_point_at_the_public_feed() {
        let config = AppConfig::default();
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
        assert!(config.cors_allowed_origins.is_empty());
    }
}
