use std::sync::Arc;
use teamday_core::config::Settings;
use teamday_core::imaging::photos::{DirectoryPhotoSource, HttpPhotoSource, PhotoSource};
use teamday_core::imaging::svg::SvgCollageRenderer;
use teamday_core::imaging::{CollageImageProvider, ImageProvider};
use teamday_core::ingest::file::FileStatsProvider;
use teamday_core::ingest::provider::HttpJsonStatsProvider;
use teamday_core::ingest::StatsProvider;

/// Local exports in `STATS_DIR` take precedence over the HTTP provider.
pub fn build_stats_provider(settings: &Settings) -> anyhow::Result<Arc<dyn StatsProvider>> {
    if let Some(dir) = settings.stats_dir.as_deref() {
        return Ok(Arc::new(FileStatsProvider::new(dir)));
    }
    Ok(Arc::new(HttpJsonStatsProvider::from_settings(settings)?))
}

pub fn build_image_provider(settings: &Settings) -> anyhow::Result<Arc<dyn ImageProvider>> {
    let photos: Box<dyn PhotoSource> = match settings.photo_base_url.as_deref() {
        Some(base_url) => Box::new(HttpPhotoSource::new(base_url)?),
        None => Box::new(DirectoryPhotoSource::new(settings.photo_dir())),
    };
    let renderer = SvgCollageRenderer::new(settings.collage_output_dir());
    Ok(Arc::new(CollageImageProvider::new(photos, renderer)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            database_url: None,
            sentry_dsn: None,
            stats_provider_base_url: None,
            stats_provider_api_key: None,
            stats_dir: None,
            photo_base_url: None,
            photo_dir: None,
            collage_output_dir: None,
            team_config_path: None,
        }
    }

    #[test]
    fn stats_dir_selects_file_provider() {
        let mut s = settings();
        s.stats_dir = Some("exports".to_string());
        s.stats_provider_base_url = Some("https://stats.example.com".to_string());
        let provider = build_stats_provider(&s).unwrap();
        assert_eq!(provider.provider_name(), "local_json_file");
    }

    #[test]
    fn falls_back_to_http_provider() {
        let mut s = settings();
        s.stats_provider_base_url = Some("https://stats.example.com".to_string());
        let provider = build_stats_provider(&s).unwrap();
        assert_eq!(provider.provider_name(), "external_http_json");
    }

    #[test]
    fn missing_stats_source_is_an_error() {
        assert!(build_stats_provider(&settings()).is_err());
    }
}
