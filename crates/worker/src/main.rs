use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use std::path::Path;
use teamday_core::config::team::TeamConfig;
use teamday_core::config::Settings;
use teamday_core::domain::player::format_points;
use teamday_core::domain::team::Team;
use teamday_core::selection::TeamSelector;
use teamday_core::storage::lock::MatchDateLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod providers;

#[derive(Debug, Parser)]
#[command(name = "teamday_worker")]
struct Args {
    /// Match date (YYYY-MM-DD). Defaults to yesterday in MATCH_DAY_UTC_OFFSET_HOURS.
    #[arg(long)]
    date: Option<String>,

    /// Do everything except writing to the database.
    #[arg(long)]
    dry_run: bool,

    /// Select the team but do not render a collage.
    #[arg(long)]
    skip_collage: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let date = teamday_core::time::match_day::resolve_match_date(
        args.date.as_deref(),
        chrono::Utc::now(),
        teamday_core::time::match_day::utc_offset_hours_from_env(),
    )?;

    if let Err(err) = run(&settings, &args, date).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(%date, error = %err, "team of the day run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(settings: &Settings, args: &Args, date: NaiveDate) -> anyhow::Result<()> {
    let config = TeamConfig::load(settings.team_config_path.as_deref().map(Path::new))?;
    let stats = providers::build_stats_provider(settings)?;
    let provider = stats.provider_name();
    let images = providers::build_image_provider(settings)?;
    let selector = TeamSelector::new(stats, images, config);

    if args.dry_run {
        let Some(team) = selector.get_team_of_day(date).await? else {
            tracing::warn!(%date, dry_run = true, "no team selected");
            return Ok(());
        };
        let collage_path = render_collage(&selector, &team, args.skip_collage).await;
        log_summary(&team, collage_path.as_deref(), true);
        return Ok(());
    }

    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    teamday_core::storage::migrate(&pool).await?;

    let Some(lock) = MatchDateLock::try_acquire(&pool, date).await? else {
        tracing::warn!(%date, "match date lock not acquired; another run in progress");
        return Ok(());
    };

    let result = select_and_persist(&pool, &selector, date, provider, args.skip_collage).await;

    report_unlock(date, lock.release().await);
    result
}

/// Returns true only when the lock was held and is now free.
fn report_unlock(date: NaiveDate, outcome: anyhow::Result<bool>) -> bool {
    match outcome {
        Ok(true) => true,
        Ok(false) => {
            tracing::warn!(%date, "match date lock was no longer held at release");
            false
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::warn!(%date, error = %err, "match date lock release failed");
            false
        }
    }
}

async fn select_and_persist(
    pool: &sqlx::PgPool,
    selector: &TeamSelector,
    date: NaiveDate,
    provider: &str,
    skip_collage: bool,
) -> anyhow::Result<()> {
    let Some(team) = selector.get_team_of_day(date).await? else {
        tracing::warn!(%date, "no team selected; nothing persisted");
        return Ok(());
    };

    let collage_path = render_collage(selector, &team, skip_collage).await;

    let snapshot_id = teamday_core::storage::teams::persist_team(
        pool,
        &team,
        provider,
        collage_path.as_deref(),
    )
    .await?;

    tracing::info!(%date, %snapshot_id, "persisted team snapshot");
    log_summary(&team, collage_path.as_deref(), false);
    Ok(())
}

/// A failed collage is reported but does not discard the selected team.
async fn render_collage(selector: &TeamSelector, team: &Team, skip: bool) -> Option<String> {
    if skip {
        return None;
    }

    match selector.create_team_collage(team).await {
        Ok(Some(collage)) => Some(collage.path.display().to_string()),
        Ok(None) => {
            tracing::warn!(date = %team.date, "image provider returned no collage");
            None
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(date = %team.date, error = %err, "collage creation failed");
            None
        }
    }
}

fn log_summary(team: &Team, collage_path: Option<&str>, dry_run: bool) {
    tracing::info!(
        date = %team.date,
        dry_run,
        players = team.players.len(),
        total_points = %format_points(team.total_points),
        collage = collage_path.unwrap_or("-"),
        "team of the day ready"
    );
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
