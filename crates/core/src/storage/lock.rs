use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use sqlx::pool::PoolConnection;
use sqlx::Postgres;

// "TEAMDA"; xor-ed with the day number so every match date gets its own key.
const LOCK_NAMESPACE: i64 = 0x5445_414D_4441;

fn lock_key_for_date(date: NaiveDate) -> i64 {
    LOCK_NAMESPACE ^ (date.num_days_from_ce() as i64)
}

/// Postgres advisory lock for one match date.
///
/// Advisory locks belong to the session that took them, so the guard keeps that
/// pooled connection checked out until [`MatchDateLock::release`]. Dropping the
/// guard unreleased closes the connection instead of returning it to the pool,
/// which ends the session and frees the lock server-side.
#[derive(Debug)]
pub struct MatchDateLock {
    conn: Option<PoolConnection<Postgres>>,
    date: NaiveDate,
    key: i64,
}

impl MatchDateLock {
    /// `Ok(None)` when another session already holds the lock for `date`.
    pub async fn try_acquire(pool: &sqlx::PgPool, date: NaiveDate) -> anyhow::Result<Option<Self>> {
        let key = lock_key_for_date(date);
        let mut conn = pool
            .acquire()
            .await
            .context("failed to check out connection for advisory lock")?;

        let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
            .persistent(false)
            .bind(key)
            .fetch_one(&mut *conn)
            .await
            .with_context(|| format!("failed to acquire advisory lock (key={key})"))?;

        if !acquired.0 {
            return Ok(None);
        }

        tracing::debug!(%date, key, "match date lock acquired");
        Ok(Some(Self {
            conn: Some(conn),
            date,
            key,
        }))
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Unlocks on the session that took the lock.
    ///
    /// Returns what `pg_advisory_unlock` reported: `false` means the session no longer
    /// held the lock.
    pub async fn release(mut self) -> anyhow::Result<bool> {
        let key = self.key;
        let Some(mut conn) = self.conn.take() else {
            return Ok(false);
        };

        let released: (bool,) = sqlx::query_as("SELECT pg_advisory_unlock($1)")
            .persistent(false)
            .bind(key)
            .fetch_one(&mut *conn)
            .await
            .with_context(|| format!("failed to release advisory lock (key={key})"))?;

        Ok(released.0)
    }
}

impl Drop for MatchDateLock {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!(date = %self.date, key = self.key, "match date lock dropped unreleased; closing its connection");
            drop(conn.detach());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_keys_differ_per_date() {
        let a = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_ne!(lock_key_for_date(a), lock_key_for_date(b));
        assert_eq!(lock_key_for_date(a), lock_key_for_date(a));
    }

    // Needs a live Postgres; runs only when TEST_DATABASE_URL is set.
    #[tokio::test]
    async fn guard_holds_lock_until_released_on_its_own_session() {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            return;
        };
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(3)
            .connect(&url)
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2001, 2, 3).unwrap();

        let lock = MatchDateLock::try_acquire(&pool, date).await.unwrap().unwrap();
        assert_eq!(lock.date(), date);

        // Another pooled session cannot take it while the guard lives.
        assert!(MatchDateLock::try_acquire(&pool, date).await.unwrap().is_none());

        // Unlocking from a different session must not free it either.
        let (other_unlock,): (bool,) = sqlx::query_as("SELECT pg_advisory_unlock($1)")
            .bind(lock_key_for_date(date))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(!other_unlock);

        assert!(lock.release().await.unwrap());

        let again = MatchDateLock::try_acquire(&pool, date).await.unwrap().unwrap();
        assert!(again.release().await.unwrap());
    }
}
