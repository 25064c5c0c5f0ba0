use crate::domain::player::{PlayerInfo, PlayerRecord, PlayerStats};
use crate::domain::team::{Team, TeamSlots};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A persisted team together with its snapshot metadata.
#[derive(Debug, Clone, Serialize)]
pub struct StoredTeam {
    pub snapshot_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub provider: String,
    pub collage_path: Option<String>,
    pub team: Team,
}

pub async fn persist_team(
    pool: &sqlx::PgPool,
    team: &Team,
    provider: &str,
    collage_path: Option<&str>,
) -> anyhow::Result<Uuid> {
    let snapshot_id = Uuid::new_v4();
    let generated_at = Utc::now();

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    sqlx::query(
        "INSERT INTO team_snapshots (id, match_date, generated_at, provider, total_points, collage_path) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .persistent(false)
    .bind(snapshot_id)
    .bind(team.date)
    .bind(generated_at)
    .bind(provider)
    .bind(team.total_points)
    .bind(collage_path)
    .execute(&mut *tx)
    .await
    .context("insert team_snapshots failed")?;

    for (slot_order, (slot, player)) in team.players.iter().enumerate() {
        insert_player(&mut tx, snapshot_id, slot_order as i32, slot, player).await?;
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(snapshot_id)
}

async fn insert_player(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    snapshot_id: Uuid,
    slot_order: i32,
    slot: &str,
    player: &PlayerRecord,
) -> anyhow::Result<()> {
    let stats = serde_json::to_value(&player.stats).context("player stats serialize failed")?;

    sqlx::query(
        "INSERT INTO team_snapshot_players \
         (snapshot_id, slot_order, slot, player_id, name, primary_position, total_points, stats) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .persistent(false)
    .bind(snapshot_id)
    .bind(slot_order)
    .bind(slot)
    .bind(&player.id)
    .bind(&player.info.name)
    .bind(&player.info.primary_position)
    .bind(player.stats.total_points)
    .bind(stats)
    .execute(&mut **tx)
    .await
    .context("insert team_snapshot_players failed")?;

    Ok(())
}

/// Latest snapshot for `date`, or the latest overall when `date` is `None`.
pub async fn fetch_team(
    pool: &sqlx::PgPool,
    date: Option<NaiveDate>,
) -> anyhow::Result<Option<StoredTeam>> {
    let row = match date {
        Some(d) => {
            sqlx::query_as::<_, (Uuid, NaiveDate, DateTime<Utc>, String, Option<String>)>(
                "SELECT id, match_date, generated_at, provider, collage_path \
                 FROM team_snapshots \
                 WHERE match_date = $1 \
                 ORDER BY generated_at DESC \
                 LIMIT 1",
            )
            .bind(d)
            .fetch_optional(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, (Uuid, NaiveDate, DateTime<Utc>, String, Option<String>)>(
                "SELECT id, match_date, generated_at, provider, collage_path \
                 FROM team_snapshots \
                 ORDER BY match_date DESC, generated_at DESC \
                 LIMIT 1",
            )
            .fetch_optional(pool)
            .await?
        }
    };

    let Some((snapshot_id, match_date, generated_at, provider, collage_path)) = row else {
        return Ok(None);
    };

    let players = fetch_players(pool, snapshot_id).await?;

    Ok(Some(StoredTeam {
        snapshot_id,
        generated_at,
        provider,
        collage_path,
        team: Team::new(match_date, players),
    }))
}

async fn fetch_players(pool: &sqlx::PgPool, snapshot_id: Uuid) -> anyhow::Result<TeamSlots> {
    let rows = sqlx::query_as::<_, (String, String, String, String, serde_json::Value)>(
        "SELECT slot, player_id, name, primary_position, stats \
         FROM team_snapshot_players \
         WHERE snapshot_id = $1 \
         ORDER BY slot_order ASC",
    )
    .bind(snapshot_id)
    .fetch_all(pool)
    .await?;

    let mut out = TeamSlots::new();
    for (slot, id, name, primary_position, stats) in rows {
        let stats = serde_json::from_value::<PlayerStats>(stats).with_context(|| {
            format!("invalid stats in DB for snapshot_id={snapshot_id}, slot={slot}")
        })?;
        out.insert(
            slot,
            PlayerRecord {
                id,
                info: PlayerInfo {
                    name,
                    primary_position,
                    position: None,
                },
                stats,
            },
        );
    }
    Ok(out)
}
