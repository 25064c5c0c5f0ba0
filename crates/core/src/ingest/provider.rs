use crate::config::Settings;
use crate::domain::player::{DailyStats, PlayerRecord};
use crate::ingest::error::ProviderHttpError;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/daily_stats";
const DEFAULT_RETRIES: u32 = 3;
const MAX_BACKOFF_SHIFT: u32 = 5;

/// Source of one day's player statistics.
///
/// `Ok(None)` means the provider has no data for the date; any other failure is an error.
#[async_trait::async_trait]
pub trait StatsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_daily_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>>;
}

#[derive(Debug, Clone)]
pub struct HttpJsonStatsProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonStatsProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_stats_provider_base_url()?.to_string();
        let api_key = settings.stats_provider_api_key.clone();

        let timeout_secs = std::env::var("STATS_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("STATS_PROVIDER_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let path = std::env::var("STATS_PROVIDER_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build stats provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries: retries.max(1),
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(&self, date: NaiveDate) -> Result<Option<DailyStats>> {
        let res = self
            .http
            .get(self.url())
            .headers(self.headers()?)
            .query(&[("date", date.to_string())])
            .send()
            .await
            .context("stats provider request failed")?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let text = res
            .text()
            .await
            .context("failed to read stats provider response")?;

        if !status.is_success() {
            return Err(ProviderHttpError {
                provider: self.provider_name(),
                status: status.as_u16(),
                body_json: serde_json::from_str(&text).ok(),
                body: text,
            }
            .into());
        }

        let parsed = serde_json::from_str::<DailyStats>(&text)
            .with_context(|| format!("stats provider response is not valid DailyStats: {text}"))?;
        Ok(Some(parsed))
    }
}

#[async_trait::async_trait]
impl StatsProvider for HttpJsonStatsProvider {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_daily_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(date).await {
                Ok(Some(stats)) => {
                    validate(&stats, date)?;
                    return Ok(Some(stats));
                }
                Ok(None) => return Ok(None),
                Err(err) => {
                    if !is_retryable(&err) || attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = backoff_for(attempt);
                    tracing::warn!(attempt, ?backoff, error = %err, "stats provider fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// 1s, 2s, 4s, ... capped at 32s.
fn backoff_for(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT))
}

/// Retries transport failures and throttling/server statuses. Client statuses and
/// unparseable bodies fail immediately.
fn is_retryable(err: &anyhow::Error) -> bool {
    if let Some(http) = err.downcast_ref::<ProviderHttpError>() {
        return http.is_retryable();
    }
    err.downcast_ref::<reqwest::Error>()
        .is_some_and(|e| !e.is_builder() && !e.is_decode())
}

pub(crate) fn validate(stats: &DailyStats, expected: NaiveDate) -> Result<()> {
    anyhow::ensure!(
        stats.date == expected,
        "stats provider date mismatch: expected {expected}, got {}",
        stats.date
    );

    for player in &stats.players {
        validate_player(player)?;
    }

    Ok(())
}

fn validate_player(player: &PlayerRecord) -> Result<()> {
    anyhow::ensure!(!player.id.trim().is_empty(), "player id must be non-empty");
    anyhow::ensure!(
        !player.info.name.trim().is_empty(),
        "player name must be non-empty (id={})",
        player.id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider(base_url: &str, path: &str) -> HttpJsonStatsProvider {
        HttpJsonStatsProvider {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
            api_key: Some("secret".to_string()),
            path: path.to_string(),
            retries: 1,
        }
    }

    #[test]
    fn url_joins_base_and_path() {
        assert_eq!(
            provider("https://stats.example.com/", "v1/daily_stats").url(),
            "https://stats.example.com/v1/daily_stats"
        );
        assert_eq!(
            provider("https://stats.example.com", "/v2/day").url(),
            "https://stats.example.com/v2/day"
        );
    }

    #[test]
    fn headers_carry_api_key() {
        let headers = provider("http://x", "/").headers().unwrap();
        assert_eq!(headers.get("x-api-key").unwrap().to_str().unwrap(), "secret");
    }

    #[test]
    fn validate_rejects_date_mismatch() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let stats: DailyStats = serde_json::from_value(json!({
            "date": "2026-10-17",
            "players": []
        }))
        .unwrap();
        assert!(validate(&stats, date).is_err());
    }

    #[test]
    fn validate_rejects_blank_player_name() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let stats: DailyStats = serde_json::from_value(json!({
            "date": date,
            "players": [
                {"id": 1, "info": {"name": "  ", "primary_position": "G"}, "stats": {"total_points": 4}}
            ]
        }))
        .unwrap();
        assert!(validate(&stats, date).is_err());
    }

    #[test]
    fn validate_accepts_well_formed_day() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let stats: DailyStats = serde_json::from_value(json!({
            "date": date,
            "players": [
                {"id": 1, "info": {"name": "Lev", "primary_position": "G"}, "stats": {"total_points": 4}}
            ]
        }))
        .unwrap();
        validate(&stats, date).unwrap();
    }

    #[test]
    fn only_throttling_and_server_errors_are_retryable() {
        let err = |status| ProviderHttpError {
            provider: "test",
            status,
            body: String::new(),
            body_json: None,
        };
        assert!(err(429).is_retryable());
        assert!(err(503).is_retryable());
        assert!(!err(401).is_retryable());
        assert!(!err(400).is_retryable());
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_for(1), Duration::from_secs(1));
        assert_eq!(backoff_for(2), Duration::from_secs(2));
        assert_eq!(backoff_for(4), Duration::from_secs(8));
        assert_eq!(backoff_for(64), Duration::from_secs(32));
        assert_eq!(backoff_for(u32::MAX), Duration::from_secs(32));
    }

    #[test]
    fn http_status_errors_follow_status_policy() {
        let err = |status| {
            anyhow::Error::new(ProviderHttpError {
                provider: "test",
                status,
                body: String::new(),
                body_json: None,
            })
        };
        assert!(is_retryable(&err(502)));
        assert!(!is_retryable(&err(403)));
    }

    #[test]
    fn malformed_payload_is_not_retried() {
        let err = serde_json::from_str::<DailyStats>("{not json")
            .context("stats provider response is not valid DailyStats")
            .unwrap_err();
        assert!(!is_retryable(&err));
        assert!(!is_retryable(&anyhow::anyhow!("stats provider date mismatch")));
    }

    #[tokio::test]
    async fn connection_failures_are_retried() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/v1/daily_stats")
            .send()
            .await
            .context("stats provider request failed")
            .unwrap_err();
        assert!(is_retryable(&err));
    }
}
