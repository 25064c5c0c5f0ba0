use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Static selection config: how provider position codes map to display
/// positions, and how many players each display position contributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub positions: PositionMap,
    pub roster: RosterComposition,
}

/// Provider position code -> display position name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionMap(BTreeMap<String, String>);

/// Required player count per display position, in declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterComposition(Vec<RosterEntry>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub position: String,
    pub count: u32,
}

impl PositionMap {
    pub fn new(codes: impl IntoIterator<Item = (String, String)>) -> Self {
        Self(codes.into_iter().collect())
    }

    pub fn resolve(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    pub fn has_display_name(&self, name: &str) -> bool {
        self.0.values().any(|v| v == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl RosterComposition {
    pub fn new(entries: impl IntoIterator<Item = (String, u32)>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(position, count)| RosterEntry { position, count })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.0
    }

    pub fn count_for(&self, position: &str) -> Option<u32> {
        self.0
            .iter()
            .find(|e| e.position == position)
            .map(|e| e.count)
    }

    pub fn total_slots(&self) -> u32 {
        self.0.iter().map(|e| e.count).sum()
    }
}

impl Default for TeamConfig {
    /// Football 1-4-4-2.
    fn default() -> Self {
        let positions = PositionMap::new(
            [("G", "GK"), ("D", "DEF"), ("M", "MID"), ("F", "FWD")]
                .into_iter()
                .map(|(code, name)| (code.to_string(), name.to_string())),
        );
        let roster = RosterComposition::new(
            [("GK", 1), ("DEF", 4), ("MID", 4), ("FWD", 2)]
                .into_iter()
                .map(|(name, count)| (name.to_string(), count)),
        );
        Self { positions, roster }
    }
}

impl TeamConfig {
    /// Loads config from a JSON file, or the built-in default when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read team config {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("invalid team config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let config = serde_json::from_str::<Self>(text).context("team config is not valid JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.positions.is_empty(), "position map must be non-empty");
        ensure!(
            !self.roster.entries().is_empty(),
            "roster composition must be non-empty"
        );

        let mut seen = BTreeSet::new();
        for entry in self.roster.entries() {
            ensure!(
                seen.insert(entry.position.as_str()),
                "duplicate roster position: {}",
                entry.position
            );
            ensure!(
                self.positions.has_display_name(&entry.position),
                "roster position {} has no code in the position map",
                entry.position
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_is_four_four_two() {
        let config = TeamConfig::default();
        config.validate().unwrap();
        assert_eq!(config.roster.total_slots(), 11);
        assert_eq!(config.positions.resolve("G"), Some("GK"));
        assert_eq!(config.roster.count_for("DEF"), Some(4));
        let order: Vec<_> = config
            .roster
            .entries()
            .iter()
            .map(|e| e.position.as_str())
            .collect();
        assert_eq!(order, vec!["GK", "DEF", "MID", "FWD"]);
    }

    #[test]
    fn parses_and_keeps_declared_roster_order() {
        let text = r#"{
            "positions": {"1": "Goalie", "2": "Defender", "3": "Forward"},
            "roster": [
                {"position": "Forward", "count": 3},
                {"position": "Defender", "count": 2},
                {"position": "Goalie", "count": 1}
            ]
        }"#;
        let config = TeamConfig::from_json_str(text).unwrap();
        let order: Vec<_> = config
            .roster
            .entries()
            .iter()
            .map(|e| e.position.as_str())
            .collect();
        assert_eq!(order, vec!["Forward", "Defender", "Goalie"]);
        assert_eq!(config.positions.resolve("3"), Some("Forward"));
    }

    #[test]
    fn rejects_roster_position_without_code() {
        let text = r#"{
            "positions": {"G": "GK"},
            "roster": [{"position": "GK", "count": 1}, {"position": "DEF", "count": 4}]
        }"#;
        assert!(TeamConfig::from_json_str(text).is_err());
    }

    #[test]
    fn rejects_duplicate_roster_position() {
        let text = r#"{
            "positions": {"G": "GK"},
            "roster": [{"position": "GK", "count": 1}, {"position": "GK", "count": 1}]
        }"#;
        assert!(TeamConfig::from_json_str(text).is_err());
    }

    #[test]
    fn rejects_negative_counts() {
        let text = r#"{
            "positions": {"G": "GK"},
            "roster": [{"position": "GK", "count": -1}]
        }"#;
        assert!(TeamConfig::from_json_str(text).is_err());
    }

    #[test]
    fn load_reads_file_and_falls_back_to_default() {
        assert_eq!(TeamConfig::load(None).unwrap(), TeamConfig::default());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"positions": {{"G": "GK"}}, "roster": [{{"position": "GK", "count": 2}}]}}"#
        )
        .unwrap();
        let config = TeamConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.roster.count_for("GK"), Some(2));
    }
}
