pub mod photos;
pub mod svg;

use crate::domain::team::TeamSlots;
use crate::imaging::photos::PhotoSource;
use crate::imaging::svg::SvgCollageRenderer;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub player_id: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Handle to a rendered collage. The file belongs to the caller once returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollageResult {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub photos_embedded: usize,
}

#[async_trait::async_trait]
pub trait ImageProvider: Send + Sync {
    async fn fetch_player_photo(&self, player_id: &str, player_name: &str)
        -> Result<Option<Photo>>;

    /// `photos` is keyed by player id; `players` carries every selected slot,
    /// including players without a photo.
    async fn create_collage(
        &self,
        photos: &BTreeMap<String, Photo>,
        players: &TeamSlots,
        date: NaiveDate,
        total_points: f64,
    ) -> Result<Option<CollageResult>>;
}

/// Photo lookup from a [`PhotoSource`] plus SVG rendering.
pub struct CollageImageProvider {
    photos: Box<dyn PhotoSource>,
    renderer: SvgCollageRenderer,
}

impl CollageImageProvider {
    pub fn new(photos: Box<dyn PhotoSource>, renderer: SvgCollageRenderer) -> Self {
        Self { photos, renderer }
    }
}

#[async_trait::async_trait]
impl ImageProvider for CollageImageProvider {
    async fn fetch_player_photo(
        &self,
        player_id: &str,
        player_name: &str,
    ) -> Result<Option<Photo>> {
        // Photos are best-effort: a broken source must not sink the whole collage.
        match self.photos.fetch_photo(player_id).await {
            Ok(photo) => {
                if photo.is_none() {
                    tracing::debug!(player_id, player_name, source = self.photos.source_name(), "no photo found");
                }
                Ok(photo)
            }
            Err(err) => {
                tracing::warn!(
                    player_id,
                    player_name,
                    source = self.photos.source_name(),
                    error = %err,
                    "photo fetch failed; rendering placeholder"
                );
                Ok(None)
            }
        }
    }

    async fn create_collage(
        &self,
        photos: &BTreeMap<String, Photo>,
        players: &TeamSlots,
        date: NaiveDate,
        total_points: f64,
    ) -> Result<Option<CollageResult>> {
        self.renderer
            .render_to_file(photos, players, date, total_points)
            .await
    }
}
