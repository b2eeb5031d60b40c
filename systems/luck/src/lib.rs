#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Luck statistics comparing observed shop appearances with expectations.
//!
//! Expectations use species counts rather than copy counts, so they estimate
//! which species shows up and ignore pool depletion over a session. Wild
//! exclusive, joker and unknown species are counted separately and never
//! contribute to the score.

use roll_odds_core::{
    OddsTable, PlayerRolls, Pools, Rarity, RarityTable, SpeciesId, SpeciesTable, SHOP_SLOTS,
};

/// Relative deviation beyond which a single species is notable.
pub const NOTABLE_DEVIATION: f64 = 0.3;

/// Score, in percent, beyond which the aggregate leaves the neutral bucket.
pub const LUCK_BUCKET_PERCENT: f64 = 10.0;

/// Per-species classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeciesLuck {
    /// Seen notably more often than expected.
    NotablyLucky,
    /// Within the notable band.
    AsExpected,
    /// Seen notably less often than expected.
    NotablyUnlucky,
}

/// Qualitative bucket of the aggregate score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LuckBucket {
    /// Score above the positive bound.
    Lucky,
    /// Score within the bounds.
    Neutral,
    /// Score below the negative bound.
    Unlucky,
}

/// Observed and expected appearances of one species.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeciesLuckEntry {
    /// Species observed.
    pub species: SpeciesId,
    /// Rarity of the species.
    pub rarity: Rarity,
    /// Appearances counted in rolls.
    pub seen: u32,
    /// Appearances the odds predict.
    pub expected: f64,
    /// `(seen - expected) / expected`, or zero without an expectation.
    pub deviation: f64,
    /// Classification of `deviation`.
    pub luck: SpeciesLuck,
}

/// Observed and expected appearances summed over one rarity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RarityLuck {
    /// Appearances counted in rolls.
    pub seen: u32,
    /// Appearances the odds predict.
    pub expected: f64,
}

/// Luck summary for one player.
#[derive(Clone, Debug, PartialEq)]
pub struct LuckStats {
    /// Rolls counted across every level.
    pub total_rolls: u32,
    /// Scored species, luckiest first.
    pub species: Vec<SpeciesLuckEntry>,
    /// Scored totals per rarity.
    pub by_rarity: RarityTable<RarityLuck>,
    /// Appearances across scored species.
    pub total_seen: u32,
    /// Expected appearances across scored species.
    pub total_expected: f64,
    /// Aggregate deviation in percent.
    pub score_percent: f64,
    /// Bucket of `score_percent`.
    pub bucket: LuckBucket,
    /// Appearances of wild exclusive species.
    pub wild_seen: u32,
    /// Appearances of joker species.
    pub joker_seen: u32,
    /// Appearances of species missing from the species table.
    pub unknown_seen: u32,
}

impl LuckStats {
    /// Scored species seen notably more often than expected.
    pub fn notably_lucky(&self) -> impl Iterator<Item = &SpeciesLuckEntry> {
        self.species
            .iter()
            .filter(|entry| entry.luck == SpeciesLuck::NotablyLucky)
    }

    /// Scored species seen notably less often than expected.
    pub fn notably_unlucky(&self) -> impl Iterator<Item = &SpeciesLuckEntry> {
        self.species
            .iter()
            .filter(|entry| entry.luck == SpeciesLuck::NotablyUnlucky)
    }
}

/// Computes luck statistics from one player's roll history.
///
/// `pools` supplies the species count per rarity across both stages and
/// `odds` the draw chance for every level the player rolled at.
#[must_use]
pub fn compute_luck(
    rolls: &PlayerRolls,
    species: &SpeciesTable,
    pools: &Pools,
    odds: &OddsTable,
) -> LuckStats {
    let expected_by_rarity = RarityTable::from_fn(|rarity| {
        let species_total = pools.ordinary.get(rarity).species_total();
        if species_total == 0 {
            return 0.0;
        }
        let slots_at_rarity = rolls.levels().fold(0.0, |total, (level, bucket)| {
            total
                + f64::from(bucket.roll_count)
                    * SHOP_SLOTS as f64
                    * odds.draw_chance(level, rarity)
        });
        slots_at_rarity / f64::from(species_total)
    });

    let mut by_rarity = RarityTable::<RarityLuck>::default();
    let mut entries = Vec::new();
    let mut wild_seen = 0_u32;
    let mut joker_seen = 0_u32;
    let mut unknown_seen = 0_u32;

    for (id, seen) in rolls.seen_totals() {
        if seen == 0 {
            continue;
        }
        let Some(record) = species.get(id) else {
            unknown_seen = unknown_seen.saturating_add(seen);
            continue;
        };
        if record.wild_exclusive {
            wild_seen = wild_seen.saturating_add(seen);
            continue;
        }
        if record.joker {
            joker_seen = joker_seen.saturating_add(seen);
            continue;
        }

        let expected = *expected_by_rarity.get(record.rarity);
        let deviation = relative_deviation(f64::from(seen), expected);
        entries.push(SpeciesLuckEntry {
            species: id,
            rarity: record.rarity,
            seen,
            expected,
            deviation,
            luck: classify_species(deviation),
        });

        let rarity = by_rarity.get_mut(record.rarity);
        rarity.seen = rarity.seen.saturating_add(seen);
        rarity.expected += expected;
    }

    entries.sort_by(|left, right| {
        right
            .deviation
            .total_cmp(&left.deviation)
            .then_with(|| left.species.cmp(&right.species))
    });

    let total_seen = entries
        .iter()
        .fold(0_u32, |total, entry| total.saturating_add(entry.seen));
    let total_expected: f64 = entries.iter().map(|entry| entry.expected).sum();
    let score_percent = relative_deviation(f64::from(total_seen), total_expected) * 100.0;

    LuckStats {
        total_rolls: rolls.total_rolls(),
        species: entries,
        by_rarity,
        total_seen,
        total_expected,
        score_percent,
        bucket: bucket_for(score_percent),
        wild_seen,
        joker_seen,
        unknown_seen,
    }
}

fn relative_deviation(seen: f64, expected: f64) -> f64 {
    if expected > 0.0 {
        (seen - expected) / expected
    } else {
        0.0
    }
}

fn classify_species(deviation: f64) -> SpeciesLuck {
    if deviation > NOTABLE_DEVIATION {
        SpeciesLuck::NotablyLucky
    } else if deviation < -NOTABLE_DEVIATION {
        SpeciesLuck::NotablyUnlucky
    } else {
        SpeciesLuck::AsExpected
    }
}

fn bucket_for(score_percent: f64) -> LuckBucket {
    if score_percent > LUCK_BUCKET_PERCENT {
        LuckBucket::Lucky
    } else if score_percent < -LUCK_BUCKET_PERCENT {
        LuckBucket::Unlucky
    } else {
        LuckBucket::Neutral
    }
}
