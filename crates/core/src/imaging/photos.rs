use crate::imaging::Photo;
use crate::ingest::error::ProviderHttpError;
use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const PHOTO_EXTENSIONS: [(&str, &str); 3] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
];

#[async_trait::async_trait]
pub trait PhotoSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_photo(&self, player_id: &str) -> Result<Option<Photo>>;
}

/// GET `{base_url}/{player_id}` with the id escaped as a single path segment;
/// 404 means the player has no photo.
#[derive(Debug, Clone)]
pub struct HttpPhotoSource {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpPhotoSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid PHOTO_BASE_URL {base_url:?}"))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "PHOTO_BASE_URL {base_url} cannot carry a path"
        );

        let timeout_secs = std::env::var("PHOTO_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build photo http client")?;

        Ok(Self { http, base_url })
    }

    fn url(&self, player_id: &str) -> Result<Url> {
        anyhow::ensure!(
            !matches!(player_id, "" | "." | ".."),
            "refusing photo lookup for player id {player_id:?}"
        );

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("photo base url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .push(player_id);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl PhotoSource for HttpPhotoSource {
    fn source_name(&self) -> &'static str {
        "http"
    }

    async fn fetch_photo(&self, player_id: &str) -> Result<Option<Photo>> {
        let res = self
            .http
            .get(self.url(player_id)?)
            .send()
            .await
            .context("photo request failed")?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderHttpError {
                provider: "photo_http",
                status: status.as_u16(),
                body_json: None,
                body,
            }
            .into());
        }

        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        anyhow::ensure!(
            content_type.starts_with("image/"),
            "photo response for {player_id} is not an image ({content_type})"
        );

        let bytes = res.bytes().await.context("failed to read photo body")?;
        if bytes.is_empty() {
            return Ok(None);
        }

        Ok(Some(Photo {
            player_id: player_id.to_string(),
            content_type,
            bytes: bytes.to_vec(),
        }))
    }
}

/// Looks up `{dir}/{player_id}.png|jpg|jpeg`.
#[derive(Debug, Clone)]
pub struct DirectoryPhotoSource {
    dir: PathBuf,
}

impl DirectoryPhotoSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl PhotoSource for DirectoryPhotoSource {
    fn source_name(&self) -> &'static str {
        "directory"
    }

    async fn fetch_photo(&self, player_id: &str) -> Result<Option<Photo>> {
        anyhow::ensure!(
            !player_id.is_empty() && !player_id.contains(['/', '\\', '.']),
            "refusing photo lookup for player id {player_id:?}"
        );

        for (ext, content_type) in PHOTO_EXTENSIONS {
            let path = self.dir.join(format!("{player_id}.{ext}"));
            match tokio::fs::read(&path).await {
                Ok(bytes) if bytes.is_empty() => continue,
                Ok(bytes) => {
                    return Ok(Some(Photo {
                        player_id: player_id.to_string(),
                        content_type: content_type.to_string(),
                        bytes,
                    }))
                }
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to read photo {}", path.display()))
                }
            }
        }

        Ok(None)
    }
}
