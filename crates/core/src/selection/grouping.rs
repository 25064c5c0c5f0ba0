use crate::config::team::{PositionMap, RosterComposition};
use crate::domain::player::PlayerRecord;
use crate::domain::team::{slot_key, TeamSlots};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Eligible players per display position, best first.
pub type PositionGroups<'a> = BTreeMap<&'a str, Vec<&'a PlayerRecord>>;

/// Groups eligible players by display position and sorts each group by points, descending.
///
/// A player is eligible when its position code is known and it scored more than zero.
/// Equal scores keep their input order.
pub fn group_players_by_position<'a>(
    players: &'a [PlayerRecord],
    positions: &'a PositionMap,
) -> PositionGroups<'a> {
    let mut groups: PositionGroups<'a> = BTreeMap::new();

    for player in players {
        let Some(position) = positions.resolve(&player.info.primary_position) else {
            tracing::debug!(
                player_id = %player.id,
                code = %player.info.primary_position,
                "unknown position code; skipping player"
            );
            continue;
        };
        // NaN scores are treated as non-positive.
        if !(player.total_points() > 0.0) {
            continue;
        }

        tracing::debug!(
            player = %player.name(),
            position,
            points = player.total_points(),
            "player added to position group"
        );
        groups.entry(position).or_default().push(player);
    }

    for (position, group) in groups.iter_mut() {
        // sort_by is stable.
        group.sort_by(|a, b| {
            b.total_points()
                .partial_cmp(&a.total_points())
                .unwrap_or(Ordering::Equal)
        });
        if let Some(best) = group.first() {
            tracing::debug!(
                position,
                player = %best.name(),
                points = best.total_points(),
                "position leader"
            );
        }
    }

    groups
}

/// Fills roster slots from the sorted groups, in declared roster order.
///
/// Positions with fewer eligible players than required are under-filled; positions
/// with none get no slot at all.
pub fn select_best_players(groups: &PositionGroups<'_>, roster: &RosterComposition) -> TeamSlots {
    let mut selected = TeamSlots::new();

    for entry in roster.entries() {
        let Some(group) = groups.get(entry.position.as_str()) else {
            continue;
        };

        for (idx, player) in group.iter().take(entry.count as usize).enumerate() {
            let slot = slot_key(&entry.position, entry.count, idx + 1);
            tracing::info!(
                slot = %slot,
                player = %player.name(),
                points = player.total_points(),
                "player selected"
            );
            selected.insert(slot, (*player).clone());
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::team::TeamConfig;
    use crate::domain::player::{PlayerInfo, PlayerStats};

    fn player(id: &str, code: &str, points: f64) -> PlayerRecord {
        PlayerRecord {
            id: id.to_string(),
            info: PlayerInfo {
                name: format!("Player {id}"),
                primary_position: code.to_string(),
                position: None,
            },
            stats: PlayerStats {
                total_points: points,
                extra: Default::default(),
            },
        }
    }

    fn ids(group: &[&PlayerRecord]) -> Vec<String> {
        group.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn excludes_unknown_codes_and_non_positive_scores() {
        let config = TeamConfig::default();
        let players = vec![
            player("1", "D", 5.0),
            player("2", "D", 0.0),
            player("3", "D", -2.0),
            player("4", "X", 50.0),
            player("5", "D", f64::NAN),
        ];

        let groups = group_players_by_position(&players, &config.positions);
        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups["DEF"]), vec!["1"]);
    }

    #[test]
    fn sorts_descending_and_keeps_input_order_on_ties() {
        let config = TeamConfig::default();
        let players = vec![
            player("a", "M", 10.0),
            player("b", "M", 30.0),
            player("c", "M", 10.0),
            player("d", "M", 20.0),
            player("e", "M", 30.0),
        ];

        let groups = group_players_by_position(&players, &config.positions);
        assert_eq!(ids(&groups["MID"]), vec!["b", "e", "d", "a", "c"]);
    }

    #[test]
    fn names_slots_by_rank_only_for_multi_player_positions() {
        let config = TeamConfig::default();
        let players = vec![
            player("g1", "G", 3.0),
            player("g2", "G", 9.0),
            player("d1", "D", 10.0),
            player("d2", "D", 30.0),
            player("d3", "D", 20.0),
        ];

        let groups = group_players_by_position(&players, &config.positions);
        let selected = select_best_players(&groups, &config.roster);

        let keys: Vec<_> = selected.keys().collect();
        assert_eq!(keys, vec!["GK", "DEF1", "DEF2", "DEF3"]);
        assert_eq!(selected.get("GK").unwrap().id, "g2");
        assert_eq!(selected.get("DEF1").unwrap().id, "d2");
        assert_eq!(selected.get("DEF3").unwrap().id, "d1");
    }

    #[test]
    fn zero_count_positions_select_nobody() {
        let config = TeamConfig::from_json_str(
            r#"{"positions": {"G": "GK", "F": "FWD"},
                "roster": [{"position": "GK", "count": 0}, {"position": "FWD", "count": 2}]}"#,
        )
        .unwrap();
        let players = vec![player("g", "G", 9.0), player("f", "F", 1.0)];

        let groups = group_players_by_position(&players, &config.positions);
        let selected = select_best_players(&groups, &config.roster);
        assert_eq!(selected.keys().collect::<Vec<_>>(), vec!["FWD1"]);
    }
}
