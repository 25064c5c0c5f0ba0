pub mod team;

use anyhow::Context;
use std::path::PathBuf;

const DEFAULT_COLLAGE_OUTPUT_DIR: &str = "collages";
const DEFAULT_PHOTO_DIR: &str = "photos";

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: Option<String>,
    pub sentry_dsn: Option<String>,
    pub stats_provider_base_url: Option<String>,
    pub stats_provider_api_key: Option<String>,
    pub stats_dir: Option<String>,
    pub photo_base_url: Option<String>,
    pub photo_dir: Option<String>,
    pub collage_output_dir: Option<String>,
    pub team_config_path: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            stats_provider_base_url: std::env::var("STATS_PROVIDER_BASE_URL").ok(),
            stats_provider_api_key: std::env::var("STATS_PROVIDER_API_KEY").ok(),
            stats_dir: non_empty_var("STATS_DIR"),
            photo_base_url: non_empty_var("PHOTO_BASE_URL"),
            photo_dir: non_empty_var("PHOTO_DIR"),
            collage_output_dir: non_empty_var("COLLAGE_OUTPUT_DIR"),
            team_config_path: non_empty_var("TEAM_CONFIG_PATH"),
        })
    }

    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL is required")
    }

    pub fn require_stats_provider_base_url(&self) -> anyhow::Result<&str> {
        self.stats_provider_base_url
            .as_deref()
            .context("STATS_PROVIDER_BASE_URL is required (or set STATS_DIR)")
    }

    pub fn collage_output_dir(&self) -> PathBuf {
        PathBuf::from(
            self.collage_output_dir
                .as_deref()
                .unwrap_or(DEFAULT_COLLAGE_OUTPUT_DIR),
        )
    }

    pub fn photo_dir(&self) -> PathBuf {
        PathBuf::from(self.photo_dir.as_deref().unwrap_or(DEFAULT_PHOTO_DIR))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}
