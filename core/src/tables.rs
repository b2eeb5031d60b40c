//! Normalized lookup tables indexed by exhaustive rarity and stage enumerations.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Level, Rarity, Stage};

/// Number of optional extra pick rounds a session may enable.
pub const EXTRA_PICK_ROUNDS: usize = 3;

/// Dense table holding one value per [`Rarity`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RarityTable<T> {
    values: [T; Rarity::COUNT],
}

impl<T> RarityTable<T> {
    /// Creates a table from values listed in [`Rarity::ALL`] order.
    #[must_use]
    pub const fn new(values: [T; Rarity::COUNT]) -> Self {
        Self { values }
    }

    /// Builds a table by evaluating `f` for every rarity.
    #[must_use]
    pub fn from_fn(mut f: impl FnMut(Rarity) -> T) -> Self {
        Self {
            values: Rarity::ALL.map(&mut f),
        }
    }

    /// Entry for the provided rarity.
    #[must_use]
    pub fn get(&self, rarity: Rarity) -> &T {
        &self.values[rarity.index()]
    }

    /// Mutable entry for the provided rarity.
    pub fn get_mut(&mut self, rarity: Rarity) -> &mut T {
        &mut self.values[rarity.index()]
    }

    /// Iterates `(rarity, entry)` pairs in ascending rarity order.
    pub fn iter(&self) -> impl Iterator<Item = (Rarity, &T)> {
        Rarity::ALL.into_iter().zip(self.values.iter())
    }
}

/// Dense table holding one value per [`Stage`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageTable<T> {
    values: [T; Stage::COUNT],
}

impl<T> StageTable<T> {
    /// Creates a table from the two-star and three-star entries.
    #[must_use]
    pub const fn new(two_star: T, three_star: T) -> Self {
        Self {
            values: [two_star, three_star],
        }
    }

    /// Entry for the provided stage.
    #[must_use]
    pub fn get(&self, stage: Stage) -> &T {
        &self.values[stage.index()]
    }

    /// Mutable entry for the provided stage.
    pub fn get_mut(&mut self, stage: Stage) -> &mut T {
        &mut self.values[stage.index()]
    }

    /// Iterates `(stage, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &T)> {
        Stage::ALL.into_iter().zip(self.values.iter())
    }
}

impl StageTable<u32> {
    /// Saturating sum of both stages.
    #[must_use]
    pub fn sum(&self) -> u32 {
        self.values[0].saturating_add(self.values[1])
    }
}

/// Table keyed by rarity and then stage.
pub type RarityStageTable<T> = RarityTable<StageTable<T>>;

impl<T: Copy> RarityTable<StageTable<T>> {
    /// Value stored for the `(rarity, stage)` pair.
    #[must_use]
    pub fn at(&self, rarity: Rarity, stage: Stage) -> T {
        *self.get(rarity).get(stage)
    }
}

/// Shop odds per player level, expressed in percent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OddsTable {
    rows: Vec<RarityTable<f64>>,
}

impl OddsTable {
    /// Creates a table whose first row describes level 1.
    #[must_use]
    pub fn new(rows: Vec<RarityTable<f64>>) -> Self {
        Self { rows }
    }

    /// Number of level rows stored.
    #[must_use]
    pub fn levels(&self) -> usize {
        self.rows.len()
    }

    /// Draw chance of `rarity` at `level`, in percent.
    ///
    /// Level 0 has no odds. Levels beyond the table reuse the last row.
    /// Negative or non-finite entries read as zero.
    #[must_use]
    pub fn draw_chance_percent(&self, level: Level, rarity: Rarity) -> f64 {
        let Some(row_index) = usize::from(level.get()).checked_sub(1) else {
            return 0.0;
        };
        let row = self.rows.get(row_index).or_else(|| self.rows.last());
        let value = row.map_or(0.0, |row| *row.get(rarity));
        if value.is_finite() {
            value.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Draw chance of `rarity` at `level` as a fraction in `[0, 1]`.
    #[must_use]
    pub fn draw_chance(&self, level: Level, rarity: Rarity) -> f64 {
        self.draw_chance_percent(level, rarity) / 100.0
    }
}

/// Constants describing the wild-pool boost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WildBoost {
    /// Boost granted while a PvE round is active.
    pub pve_bonus: f64,
    /// Boost granted per star of wild units owned.
    pub per_star_bonus: f64,
}

/// Static tables describing the shop.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameTables {
    /// Draw chances per level and rarity.
    pub odds: OddsTable,
    /// Copies of each species placed in the pool.
    pub copies_per_species: RarityStageTable<u32>,
    /// Ordinary species present in every session.
    pub base_species: RarityStageTable<u32>,
    /// Wild species present in every session.
    pub wild_base_species: RarityStageTable<u32>,
    /// Gold price of one base copy in the shop.
    pub shop_cost: RarityTable<u32>,
    /// Wild boost constants.
    pub wild_boost: WildBoost,
    /// Gold spent per shop refresh.
    pub cost_per_refresh: f64,
}

/// One optional extra pick round that adds species to a single rarity tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraPickRound {
    /// Whether the round took place this session.
    pub enabled: bool,
    /// Tier receiving the extra species.
    pub rarity: Rarity,
    /// Stage of the extra species.
    pub stage: Stage,
    /// Species added when enabled.
    pub species: i32,
}

/// Session-specific pool additions.
///
/// Counts are signed so that malformed upstream data can be clamped rather
/// than wrapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Ordinary species added by regional unlocks.
    pub regional_species: RarityStageTable<i32>,
    /// Wild species added by regional unlocks.
    pub regional_wild_species: RarityStageTable<i32>,
    /// Extra pick rounds.
    pub extra_picks: [ExtraPickRound; EXTRA_PICK_ROUNDS],
}

impl Default for SessionConfig {
    fn default() -> Self {
        let round = |rarity| ExtraPickRound {
            enabled: false,
            rarity,
            stage: Stage::ThreeStar,
            species: 1,
        };
        Self {
            regional_species: RarityTable::default(),
            regional_wild_species: RarityTable::default(),
            extra_picks: [
                round(Rarity::Uncommon),
                round(Rarity::Rare),
                round(Rarity::Epic),
            ],
        }
    }
}

impl SessionConfig {
    /// Reports the first negative count, if any.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tables = [
            ("regional_species", &self.regional_species),
            ("regional_wild_species", &self.regional_wild_species),
        ];
        for (field, table) in tables {
            for (_, stages) in table.iter() {
                for (_, value) in stages.iter() {
                    if *value < 0 {
                        return Err(ConfigError::NegativeCount {
                            field,
                            value: i64::from(*value),
                        });
                    }
                }
            }
        }
        for round in &self.extra_picks {
            if round.species < 0 {
                return Err(ConfigError::NegativeCount {
                    field: "extra_picks.species",
                    value: i64::from(round.species),
                });
            }
        }
        Ok(())
    }
}

/// Pool sizes for one rarity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolEntry {
    /// Species in the pool per stage.
    pub species: StageTable<u32>,
    /// Copies of each species per stage.
    pub copies_per_species: StageTable<u32>,
}

impl PoolEntry {
    /// Copies in the pool for `stage`.
    #[must_use]
    pub fn total_copies(&self, stage: Stage) -> u32 {
        self.species
            .get(stage)
            .saturating_mul(*self.copies_per_species.get(stage))
    }

    /// Copies across both stages.
    #[must_use]
    pub fn grand_total(&self) -> u32 {
        self.total_copies(Stage::TwoStar)
            .saturating_add(self.total_copies(Stage::ThreeStar))
    }

    /// Species across both stages.
    #[must_use]
    pub fn species_total(&self) -> u32 {
        self.species.sum()
    }
}

/// Ordinary and wild pools for every rarity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pools {
    /// Ordinary shop pool.
    pub ordinary: RarityTable<PoolEntry>,
    /// Wild pool drawn through the wild boost.
    pub wild: RarityTable<PoolEntry>,
}
