use crate::domain::player::DailyStats;
use crate::ingest::provider::{validate, StatsProvider};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Reads `{dir}/{YYYY-MM-DD}.json` exports. A missing file means no data for that day.
#[derive(Debug, Clone)]
pub struct FileStatsProvider {
    dir: PathBuf,
}

impl FileStatsProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }
}

#[async_trait::async_trait]
impl StatsProvider for FileStatsProvider {
    fn provider_name(&self) -> &'static str {
        "local_json_file"
    }

    async fn fetch_daily_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>> {
        let path = self.path_for(date);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no stats export for date");
                return Ok(None);
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read stats export {}", path.display()))
            }
        };

        let stats = serde_json::from_str::<DailyStats>(&text)
            .with_context(|| format!("stats export {} is not valid DailyStats", path.display()))?;
        validate(&stats, date)?;
        Ok(Some(stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileStatsProvider::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert!(provider.fetch_daily_stats(date).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_export_for_date() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let body = json!({
            "date": date,
            "players": [
                {"id": 7, "info": {"name": "Lev", "primary_position": "G"}, "stats": {"total_points": 11}}
            ]
        });
        std::fs::write(dir.path().join("2026-10-18.json"), body.to_string()).unwrap();

        let provider = FileStatsProvider::new(dir.path());
        let stats = provider.fetch_daily_stats(date).await.unwrap().unwrap();
        assert_eq!(stats.players.len(), 1);
        assert_eq!(stats.players[0].id, "7");
    }

    #[tokio::test]
    async fn malformed_export_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        std::fs::write(dir.path().join("2026-10-18.json"), "{not json").unwrap();

        let provider = FileStatsProvider::new(dir.path());
        assert!(provider.fetch_daily_stats(date).await.is_err());
    }
}
