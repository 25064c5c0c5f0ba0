use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One day's worth of player statistics as handed over by a stats provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub players: Vec<PlayerRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub info: PlayerInfo,
    pub stats: PlayerStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    /// Provider position code, resolved to a display name through the position map.
    pub primary_position: String,
    /// Display position, only filled in for collage rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_points: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PlayerRecord {
    pub fn total_points(&self) -> f64 {
        self.stats.total_points
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }
}

// Providers are inconsistent about numeric vs string ids.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

/// Renders points without a trailing `.0` for whole numbers.
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 && points.abs() < 1e15 {
        format!("{}", points as i64)
    } else {
        format!("{points:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_numeric_ids_and_keeps_extra_stats() {
        let v = json!({
            "date": "2026-10-18",
            "players": [
                {
                    "id": 4117,
                    "info": {"name": "Ivanov", "primary_position": "D"},
                    "stats": {"total_points": 12.5, "goals": 1, "assists": 2}
                },
                {
                    "id": "p-9",
                    "info": {"name": "Petrov", "primary_position": "F"},
                    "stats": {"total_points": 3}
                }
            ]
        });

        let parsed: DailyStats = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.players.len(), 2);
        assert_eq!(parsed.players[0].id, "4117");
        assert_eq!(parsed.players[0].stats.extra.get("goals"), Some(&json!(1)));
        assert_eq!(parsed.players[1].id, "p-9");
        assert_eq!(parsed.players[1].total_points(), 3.0);
        assert!(parsed.players[1].info.position.is_none());
    }

    #[test]
    fn rejects_missing_total_points() {
        let v = json!({
            "id": 1,
            "info": {"name": "Nobody", "primary_position": "G"},
            "stats": {"saves": 10}
        });
        assert!(serde_json::from_value::<PlayerRecord>(v).is_err());
    }

    #[test]
    fn format_points_drops_trailing_zero() {
        assert_eq!(format_points(42.0), "42");
        assert_eq!(format_points(7.3), "7.3");
        assert_eq!(format_points(-3.0), "-3");
    }
}
