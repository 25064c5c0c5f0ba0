pub mod grouping;

use crate::config::team::TeamConfig;
use crate::domain::player::format_points;
use crate::domain::team::Team;
use crate::imaging::{CollageResult, ImageProvider};
use crate::ingest::StatsProvider;
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use grouping::{group_players_by_position, select_best_players, PositionGroups};

/// Picks the team of the day and hands it to the image provider for the collage.
///
/// Holds no state between calls besides its collaborators and the static team config.
pub struct TeamSelector {
    stats: Arc<dyn StatsProvider>,
    images: Arc<dyn ImageProvider>,
    config: TeamConfig,
}

impl TeamSelector {
    pub fn new(
        stats: Arc<dyn StatsProvider>,
        images: Arc<dyn ImageProvider>,
        config: TeamConfig,
    ) -> Self {
        Self {
            stats,
            images,
            config,
        }
    }

    pub fn config(&self) -> &TeamConfig {
        &self.config
    }

    /// Returns `Ok(None)` when the stats provider has nothing for `date`.
    pub async fn get_team_of_day(&self, date: NaiveDate) -> Result<Option<Team>> {
        let Some(daily) = self.stats.fetch_daily_stats(date).await? else {
            tracing::error!(%date, provider = self.stats.provider_name(), "no daily stats available");
            return Ok(None);
        };

        tracing::info!(%date, players = daily.players.len(), "daily stats received");

        let groups = group_players_by_position(&daily.players, &self.config.positions);
        let group_sizes = groups
            .iter()
            .map(|(pos, players)| format!("{pos}: {}", players.len()))
            .collect::<Vec<_>>()
            .join(", ");
        tracing::info!(%date, groups = %group_sizes, "players grouped by position");

        let players = select_best_players(&groups, &self.config.roster);
        let team = Team::new(daily.date, players);

        tracing::info!(
            %date,
            slots = team.players.len(),
            required = self.config.roster.total_slots(),
            total_points = %format_points(team.total_points),
            "team of the day selected"
        );
        for (slot, player) in team.players.iter() {
            tracing::info!(
                slot,
                player = %player.name(),
                points = %format_points(player.total_points()),
                "roster"
            );
        }

        Ok(Some(team))
    }

    /// Fetches a photo per selected player and asks the image provider to compose them.
    ///
    /// Players without a photo stay in the roster passed to the renderer. `team` itself is
    /// left untouched; display positions are attached to a copy.
    pub async fn create_team_collage(&self, team: &Team) -> Result<Option<CollageResult>> {
        let mut players = team.players.clone();
        for (slot, player) in players.iter_mut() {
            player.info.position = self
                .config
                .positions
                .resolve(&player.info.primary_position)
                .map(str::to_string);
            if player.info.position.is_none() {
                tracing::warn!(
                    slot,
                    code = %player.info.primary_position,
                    "unknown position code in team; no display position"
                );
            }
        }

        let mut photos = BTreeMap::new();
        for (_, player) in players.iter() {
            if let Some(photo) = self
                .images
                .fetch_player_photo(&player.id, player.name())
                .await?
            {
                photos.insert(player.id.clone(), photo);
            }
        }

        if photos.len() != players.len() {
            tracing::warn!(
                date = %team.date,
                photos = photos.len(),
                players = players.len(),
                "could not get photos for every player"
            );
        }

        self.images
            .create_collage(&photos, &players, team.date, team.total_points)
            .await
    }
}
