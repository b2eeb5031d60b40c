#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Roll classifier separating genuine shop rerolls from partial purchases.
//!
//! Snapshots for one player must be classified in arrival order, since every
//! verdict compares the current snapshot with the previous one.

use roll_odds_core::{Level, PlayerId, RollRecords, ShopSnapshot};

/// New species needed before a snapshot change counts as a reroll.
pub const DEFAULT_ROLL_THRESHOLD: usize = 3;

/// Classification of one snapshot transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollVerdict {
    /// First non-empty snapshot after an empty or missing one, counted as a roll.
    InitialRoll,
    /// Enough slots changed to count as a reroll.
    Reroll {
        /// Distinct species absent from the previous snapshot.
        new_appearances: usize,
    },
    /// A purchase or a no-op; nothing was counted.
    NotARoll {
        /// Distinct species absent from the previous snapshot.
        new_appearances: usize,
    },
    /// The shop showed nothing; only stored for the next comparison.
    EmptyShop,
}

impl RollVerdict {
    /// Whether the transition incremented the roll count.
    #[must_use]
    pub const fn counted(&self) -> bool {
        matches!(self, Self::InitialRoll | Self::Reroll { .. })
    }
}

/// Classifies shop transitions with a tunable change threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RollClassifier {
    threshold: usize,
}

impl Default for RollClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ROLL_THRESHOLD)
    }
}

impl RollClassifier {
    /// Creates a classifier counting transitions with at least `threshold` new species.
    #[must_use]
    pub const fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Minimum new species for a reroll.
    #[must_use]
    pub const fn threshold(&self) -> usize {
        self.threshold
    }

    /// Classifies `current` against the player's last snapshot and records counted rolls.
    ///
    /// A counted roll adds one appearance for every occupied slot of
    /// `current`, duplicates included, to the bucket for `level`. The
    /// snapshot always becomes the player's last seen snapshot.
    pub fn classify(
        &self,
        records: &mut RollRecords,
        player: PlayerId,
        current: ShopSnapshot,
        level: Level,
    ) -> RollVerdict {
        let rolls = records.player_mut(player);

        let verdict = if current.is_empty() {
            RollVerdict::EmptyShop
        } else {
            match rolls.last_seen().filter(|previous| !previous.is_empty()) {
                None => RollVerdict::InitialRoll,
                Some(previous) => {
                    let seen_before = previous.distinct();
                    let new_appearances = current.distinct().difference(&seen_before).count();
                    if new_appearances >= self.threshold {
                        RollVerdict::Reroll { new_appearances }
                    } else {
                        RollVerdict::NotARoll { new_appearances }
                    }
                }
            }
        };

        if verdict.counted() {
            rolls.bucket_mut(level).record(&current);
        }
        rolls.set_last_seen(current);
        verdict
    }
}
