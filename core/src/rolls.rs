//! Shop snapshots and the per-player roll records built from them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Level, PlayerId, SpeciesId};

/// Number of simultaneous draws shown by one shop.
pub const SHOP_SLOTS: usize = 6;

/// Contents of one player's shop at a single observation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SnapshotParts")]
pub struct ShopSnapshot {
    slots: Vec<Option<SpeciesId>>,
}

#[derive(Deserialize)]
struct SnapshotParts {
    slots: Vec<Option<SpeciesId>>,
}

impl From<SnapshotParts> for ShopSnapshot {
    fn from(parts: SnapshotParts) -> Self {
        Self::new(parts.slots)
    }
}

impl ShopSnapshot {
    /// Creates a snapshot, keeping at most [`SHOP_SLOTS`] slots.
    #[must_use]
    pub fn new(mut slots: Vec<Option<SpeciesId>>) -> Self {
        slots.truncate(SHOP_SLOTS);
        Self { slots }
    }

    /// Raw slots, empty ones included.
    #[must_use]
    pub fn slots(&self) -> &[Option<SpeciesId>] {
        &self.slots
    }

    /// Species in occupied slots, duplicates included.
    pub fn species(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Distinct species present.
    #[must_use]
    pub fn distinct(&self) -> BTreeSet<SpeciesId> {
        self.species().collect()
    }

    /// Reports whether every slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// Rolls observed while a player sat at one level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBucket {
    /// Genuine rolls counted at this level.
    pub roll_count: u32,
    /// Times each species occupied a slot in a counted roll.
    pub seen: BTreeMap<SpeciesId, u32>,
}

impl LevelBucket {
    /// Counts one roll showing `snapshot`.
    pub fn record(&mut self, snapshot: &ShopSnapshot) {
        self.roll_count = self.roll_count.saturating_add(1);
        for species in snapshot.species() {
            let count = self.seen.entry(species).or_insert(0);
            *count = count.saturating_add(1);
        }
    }
}

/// Roll history of one player.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRolls {
    last_seen: Option<ShopSnapshot>,
    levels: BTreeMap<Level, LevelBucket>,
}

impl PlayerRolls {
    /// Last snapshot observed for the player, counted or not.
    #[must_use]
    pub fn last_seen(&self) -> Option<&ShopSnapshot> {
        self.last_seen.as_ref()
    }

    /// Stores the snapshot the next observation is compared against.
    pub fn set_last_seen(&mut self, snapshot: ShopSnapshot) {
        self.last_seen = Some(snapshot);
    }

    /// Bucket for `level`, created on first use.
    pub fn bucket_mut(&mut self, level: Level) -> &mut LevelBucket {
        self.levels.entry(level).or_default()
    }

    /// Bucket for `level`, if any roll was counted there.
    #[must_use]
    pub fn bucket(&self, level: Level) -> Option<&LevelBucket> {
        self.levels.get(&level)
    }

    /// Iterates buckets in ascending level order.
    pub fn levels(&self) -> impl Iterator<Item = (Level, &LevelBucket)> {
        self.levels.iter().map(|(level, bucket)| (*level, bucket))
    }

    /// Rolls counted across every level.
    #[must_use]
    pub fn total_rolls(&self) -> u32 {
        self.levels
            .values()
            .fold(0, |total, bucket| total.saturating_add(bucket.roll_count))
    }

    /// Appearances per species across every level.
    #[must_use]
    pub fn seen_totals(&self) -> BTreeMap<SpeciesId, u32> {
        let mut totals = BTreeMap::new();
        for bucket in self.levels.values() {
            for (species, count) in &bucket.seen {
                let total = totals.entry(*species).or_insert(0_u32);
                *total = total.saturating_add(*count);
            }
        }
        totals
    }
}

/// Roll histories for every observed player.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRecords {
    players: BTreeMap<PlayerId, PlayerRolls>,
}

impl RollRecords {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// History of `player`, if observed.
    #[must_use]
    pub fn player(&self, player: PlayerId) -> Option<&PlayerRolls> {
        self.players.get(&player)
    }

    /// History of `player`, created on first use.
    pub fn player_mut(&mut self, player: PlayerId) -> &mut PlayerRolls {
        self.players.entry(player).or_default()
    }

    /// Iterates histories in player order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &PlayerRolls)> {
        self.players.iter().map(|(player, rolls)| (*player, rolls))
    }

    /// Forgets the history of `player`.
    pub fn clear_player(&mut self, player: PlayerId) {
        let _ = self.players.remove(&player);
    }

    /// Forgets every history.
    pub fn clear(&mut self) {
        self.players.clear();
    }

    /// Reports whether no player was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
