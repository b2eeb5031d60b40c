#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the roll-odds engine.
//!
//! This crate defines the vocabulary that connects the session controller,
//! the static game tables and the pure systems. The session owns every piece
//! of mutable state ([`EntitlementSet`], [`RollRecords`], tracked [`Target`]
//! values) and hands read-only views to the systems, which answer with
//! derived values such as [`Pools`], [`Availability`] or
//! [`ProbabilityResult`]. Nothing in this crate performs I/O.

mod entitlement;
mod error;
mod rolls;
mod species;
mod tables;

use serde::{Deserialize, Serialize};

pub use entitlement::{
    EntitlementSet, EntitlementSlot, Entitlements, Resolution, UnlockContext, UnlockSignature,
};
pub use error::{ConfigError, ResolveError};
pub use rolls::{LevelBucket, PlayerRolls, RollRecords, ShopSnapshot, SHOP_SLOTS};
pub use species::{
    EvolutionFamily, EvolutionForm, FamilyId, GatingFlag, SpeciesId, SpeciesRecord, SpeciesTable,
    TagSet, TypeTag,
};
pub use tables::{
    ExtraPickRound, GameTables, OddsTable, PoolEntry, Pools, RarityStageTable, RarityTable,
    SessionConfig, StageTable, WildBoost, EXTRA_PICK_ROUNDS,
};

/// Tier of a species governing its draw chance and pool size.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Cheapest tier, dominant at low levels.
    Common,
    /// Second tier.
    Uncommon,
    /// Third tier.
    Rare,
    /// Fourth tier.
    Epic,
    /// Highest shop tier.
    Ultra,
}

impl Rarity {
    /// Number of rarity tiers offered by the shop.
    pub const COUNT: usize = 5;

    /// Every rarity in ascending order.
    pub const ALL: [Rarity; Rarity::COUNT] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Ultra,
    ];

    /// Dense index used by [`RarityTable`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase label used in manifests and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Ultra => "ultra",
        }
    }
}

/// Highest evolution stage an evolution family can reach.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Family caps at two stars.
    TwoStar,
    /// Family caps at three stars.
    ThreeStar,
}

impl Stage {
    /// Number of stages.
    pub const COUNT: usize = 2;

    /// Both stages in ascending order.
    pub const ALL: [Stage; Stage::COUNT] = [Stage::TwoStar, Stage::ThreeStar];

    /// Dense index used by [`StageTable`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Base copies required to fully evolve a family capped at this stage.
    #[must_use]
    pub const fn copies_needed_for_max(self) -> u32 {
        match self {
            Self::TwoStar => 3,
            Self::ThreeStar => 9,
        }
    }

    /// Maps a family's `max_stars` value onto a stage.
    ///
    /// Anything at or below two stars is treated as [`Stage::TwoStar`].
    #[must_use]
    pub const fn from_max_stars(max_stars: u8) -> Self {
        if max_stars <= 2 {
            Self::TwoStar
        } else {
            Self::ThreeStar
        }
    }
}

/// Seat index of a player within a session (0..8).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PlayerId(u8);

impl PlayerId {
    /// Creates a new player identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Player level, which selects the row of the odds table.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Level(u8);

impl Level {
    /// Creates a new level wrapper.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric level.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Evolution family a player is trying to complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Family being tracked.
    pub family: FamilyId,
    /// Rarity of the family.
    pub rarity: Rarity,
    /// Highest stage the family reaches.
    pub stage: Stage,
    /// Whether the family only appears through the wild pool.
    pub is_wild: bool,
    /// Copies of the family held by anyone or otherwise removed from the pool.
    pub copies_consumed: u32,
    /// Copies held by the tracked player, counted in base-form units.
    pub copies_owned: u32,
}

impl Target {
    /// Copies required to fully evolve the family.
    #[must_use]
    pub const fn copies_needed_for_max(&self) -> u32 {
        self.stage.copies_needed_for_max()
    }
}

/// Why a species is or is not currently obtainable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvailabilityReason {
    /// The species is not gated by any entitlement.
    Ungated,
    /// A resolved regional slot unlocks the species.
    RegionalPresent,
    /// A resolved additional slot unlocks the species.
    AdditionalPresent,
    /// The species needs a regional unlock that was not observed.
    RegionalNotPresent,
    /// The species needs an additional unlock that was not observed.
    AdditionalNotPresent,
    /// The species accepts either unlock and neither was observed.
    NotInAnyEntitlement,
    /// The species is missing from the species table.
    UnknownSpecies,
}

impl AvailabilityReason {
    /// Stable kebab-case label for display and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ungated => "ungated",
            Self::RegionalPresent => "regional-present",
            Self::AdditionalPresent => "additional-present",
            Self::RegionalNotPresent => "regional-not-present",
            Self::AdditionalNotPresent => "additional-not-present",
            Self::NotInAnyEntitlement => "not-in-any-entitlement",
            Self::UnknownSpecies => "unknown-species",
        }
    }
}

/// Answer to an availability query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Availability {
    /// Whether the species can currently appear in the shop.
    pub available: bool,
    /// Explanation for the verdict.
    pub reason: AvailabilityReason,
}

impl Availability {
    /// Builds a positive verdict.
    #[must_use]
    pub const fn available(reason: AvailabilityReason) -> Self {
        Self {
            available: true,
            reason,
        }
    }

    /// Builds a negative verdict.
    #[must_use]
    pub const fn unavailable(reason: AvailabilityReason) -> Self {
        Self {
            available: false,
            reason,
        }
    }
}

/// Terminal state reached while evaluating a target.
///
/// The variants are mutually exclusive and checked in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Probabilities were computed from the pools.
    Computed,
    /// The target's species cannot appear this session.
    Unavailable(AvailabilityReason),
    /// The tracked player already owns every copy required.
    Maxed,
    /// The target is wild but no wild species exists for its rarity and stage.
    ImpossibleWildTarget,
}

/// Probability and expected-cost estimate for one tracked target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbabilityResult {
    /// Terminal state of the evaluation.
    pub outcome: Outcome,
    /// Chance that a single shop slot shows the target.
    pub per_slot: f64,
    /// Chance that at least one of the six slots shows the target.
    pub per_refresh: f64,
    /// Chance of seeing the target at least once within `n` refreshes.
    pub over_n: f64,
    /// Refreshes needed to reach the requested confidence, or infinity.
    pub expected_refreshes: f64,
    /// Gold spent on those refreshes, or infinity.
    pub expected_cost: f64,
    /// Copies of the target still in the pool.
    pub remaining: u32,
    /// Copies of the target the pool starts with.
    pub capacity: u32,
    /// Draw chance of the target's rarity at the current level, in percent.
    pub draw_chance_percent: f64,
    /// Effective wild boost in `[0, 1]`.
    pub boost: f64,
    /// Copies the tracked player still needs.
    pub copies_missing: u32,
    /// Shop gold needed to buy the missing copies.
    pub purchase_cost_to_max: u32,
}

impl ProbabilityResult {
    /// Result with every probability at zero and infinite expected cost.
    #[must_use]
    pub const fn zero(outcome: Outcome) -> Self {
        Self {
            outcome,
            per_slot: 0.0,
            per_refresh: 0.0,
            over_n: 0.0,
            expected_refreshes: f64::INFINITY,
            expected_cost: f64::INFINITY,
            remaining: 0,
            capacity: 0,
            draw_chance_percent: 0.0,
            boost: 0.0,
            copies_missing: 0,
            purchase_cost_to_max: 0,
        }
    }

    /// Whether the target is unobtainable this session.
    #[must_use]
    pub const fn unavailable(&self) -> bool {
        matches!(self.outcome, Outcome::Unavailable(_))
    }

    /// Whether the tracked player has already maxed the target.
    #[must_use]
    pub const fn maxed(&self) -> bool {
        matches!(self.outcome, Outcome::Maxed)
    }

    /// Whether a wild target has no wild representative to draw.
    #[must_use]
    pub const fn impossible_wild_target(&self) -> bool {
        matches!(self.outcome, Outcome::ImpossibleWildTarget)
    }

    /// Availability reason when the target is unavailable.
    #[must_use]
    pub const fn reason(&self) -> Option<AvailabilityReason> {
        match self.outcome {
            Outcome::Unavailable(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Live modifiers applied on top of the pools when evaluating targets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionModifiers {
    /// Level of the tracked player.
    pub level: Level,
    /// Whether the current round is a PvE round, which grants the wild base bonus.
    pub pve_round_active: bool,
    /// Total stars of wild units owned by the tracked player.
    pub wild_stars_owned: u32,
    /// Ordinary copies visible on boards and benches, per stage.
    pub visible_reduction: StageTable<u32>,
    /// Wild copies visible on boards and benches, per stage.
    pub wild_visible_reduction: StageTable<u32>,
}

impl Default for SessionModifiers {
    fn default() -> Self {
        Self {
            level: Level::new(1),
            pve_round_active: false,
            wild_stars_owned: 0,
            visible_reduction: StageTable::default(),
            wild_visible_reduction: StageTable::default(),
        }
    }
}
