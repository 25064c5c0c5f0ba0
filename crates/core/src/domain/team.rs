use crate::domain::player::PlayerRecord;
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Team {
    pub date: NaiveDate,
    pub players: TeamSlots,
    pub total_points: f64,
}

impl Team {
    /// Builds a team, deriving `total_points` from the selected players.
    pub fn new(date: NaiveDate, players: TeamSlots) -> Self {
        let total_points = players.values().map(PlayerRecord::total_points).sum();
        Self {
            date,
            players,
            total_points,
        }
    }
}

/// Selected players keyed by slot, iterated in the order they were filled (roster order).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamSlots {
    slots: Vec<(String, PlayerRecord)>,
}

impl TeamSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the player for `slot`. Replacing keeps the original position.
    pub fn insert(&mut self, slot: impl Into<String>, player: PlayerRecord) {
        let slot = slot.into();
        match self.slots.iter_mut().find(|(key, _)| *key == slot) {
            Some(entry) => entry.1 = player,
            None => self.slots.push((slot, player)),
        }
    }

    pub fn get(&self, slot: &str) -> Option<&PlayerRecord> {
        self.slots
            .iter()
            .find(|(key, _)| key == slot)
            .map(|(_, player)| player)
    }

    pub fn contains_key(&self, slot: &str) -> bool {
        self.get(slot).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlayerRecord)> {
        self.slots.iter().map(|(key, player)| (key.as_str(), player))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut PlayerRecord)> {
        self.slots
            .iter_mut()
            .map(|(key, player)| (key.as_str(), player))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.slots.iter().map(|(_, player)| player)
    }
}

impl FromIterator<(String, PlayerRecord)> for TeamSlots {
    fn from_iter<T: IntoIterator<Item = (String, PlayerRecord)>>(iter: T) -> Self {
        let mut out = Self::new();
        for (slot, player) in iter {
            out.insert(slot, player);
        }
        out
    }
}

impl Serialize for TeamSlots {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for (slot, player) in &self.slots {
            map.serialize_entry(slot, player)?;
        }
        map.end()
    }
}

/// Slot name for the `rank`-th (1-based) player of a position.
///
/// A position that takes a single player is keyed by the bare position name,
/// otherwise the rank is appended (`DEF1`, `DEF2`, ...).
pub fn slot_key(position: &str, required: u32, rank: usize) -> String {
    if required == 1 {
        position.to_string()
    } else {
        format!("{position}{rank}")
    }
}
