use anyhow::Context;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

const DEFAULT_UTC_OFFSET_HOURS: i32 = 3;

/// Resolves which day to build the team for.
///
/// An explicit `YYYY-MM-DD` wins. Otherwise the previous calendar day in the
/// given UTC offset: a day's stats are complete only once it is over.
pub fn resolve_match_date(
    date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
    utc_offset_hours: i32,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = date_arg {
        return NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD"));
    }

    let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
        .with_context(|| format!("invalid UTC offset {utc_offset_hours}h"))?;
    let today = now_utc.with_timezone(&offset).date_naive();
    Ok(today - Duration::days(1))
}

/// `MATCH_DAY_UTC_OFFSET_HOURS`, defaulting to UTC+3.
pub fn utc_offset_hours_from_env() -> i32 {
    std::env::var("MATCH_DAY_UTC_OFFSET_HOURS")
        .ok()
        .and_then(|s| s.parse::<i32>().ok())
        .unwrap_or(DEFAULT_UTC_OFFSET_HOURS)
}
