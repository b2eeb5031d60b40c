#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Probability engine estimating the odds and cost of finding a tracked target.
//!
//! Every shop refresh performs [`SHOP_SLOTS`] independent slot draws. A slot
//! first picks a rarity from the level's odds row, then either the ordinary
//! pool or, with probability equal to the wild boost, the wild pool. The
//! engine turns that model into per-slot, per-refresh and multi-refresh
//! probabilities plus the refreshes needed to reach a requested confidence.

mod owned;

use roll_odds_core::{
    Availability, GameTables, Outcome, PoolEntry, Pools, ProbabilityResult, SessionModifiers,
    Stage, StageTable, Target, WildBoost, SHOP_SLOTS,
};

pub use owned::{copies_owned, wild_stars_owned};

/// Evaluates targets against one set of static tables.
#[derive(Clone, Copy, Debug)]
pub struct ProbabilityEngine<'a> {
    tables: &'a GameTables,
}

impl<'a> ProbabilityEngine<'a> {
    /// Creates an engine reading odds, costs and boost constants from `tables`.
    #[must_use]
    pub const fn new(tables: &'a GameTables) -> Self {
        Self { tables }
    }

    /// Estimates the chance of finding `target` and the cost of doing so.
    ///
    /// Terminal states are checked in order: an unavailable species, a target
    /// the tracked player already maxed, then a wild target with no wild
    /// species to draw. Each short-circuits with zero probabilities. A maxed
    /// target needs no further refreshes, so its expected refreshes and cost
    /// are zero; the other two report an infinite expected cost.
    #[must_use]
    pub fn evaluate(
        &self,
        target: &Target,
        pools: &Pools,
        availability: Availability,
        modifiers: &SessionModifiers,
        refreshes: u32,
        confidence_percent: f64,
    ) -> ProbabilityResult {
        let copies_missing = target
            .copies_needed_for_max()
            .saturating_sub(target.copies_owned);
        let purchase_cost_to_max =
            copies_missing.saturating_mul(*self.tables.shop_cost.get(target.rarity));

        if !availability.available {
            return ProbabilityResult {
                copies_missing,
                purchase_cost_to_max,
                ..ProbabilityResult::zero(Outcome::Unavailable(availability.reason))
            };
        }

        if copies_missing == 0 {
            return ProbabilityResult {
                expected_refreshes: 0.0,
                expected_cost: 0.0,
                ..ProbabilityResult::zero(Outcome::Maxed)
            };
        }

        let draw_chance_percent = self
            .tables
            .odds
            .draw_chance_percent(modifiers.level, target.rarity);
        let draw_chance = draw_chance_percent / 100.0;
        let boost = wild_boost(
            modifiers.pve_round_active,
            modifiers.wild_stars_owned,
            self.tables.wild_boost,
        );

        let pool = if target.is_wild {
            pools.wild.get(target.rarity)
        } else {
            pools.ordinary.get(target.rarity)
        };
        let capacity = *pool.copies_per_species.get(target.stage);
        let remaining = capacity.saturating_sub(target.copies_consumed);

        let partial = ProbabilityResult {
            remaining,
            capacity,
            draw_chance_percent,
            boost,
            copies_missing,
            purchase_cost_to_max,
            ..ProbabilityResult::zero(Outcome::Computed)
        };

        let per_slot = if target.is_wild {
            if *pool.species.get(target.stage) == 0 {
                return ProbabilityResult {
                    outcome: Outcome::ImpossibleWildTarget,
                    ..partial
                };
            }
            let wild_remaining = net_total(pool, &modifiers.wild_visible_reduction);
            share(boost * draw_chance, remaining, wild_remaining)
        } else {
            let denominator = net_total(pool, &modifiers.visible_reduction);
            share((1.0 - boost) * draw_chance, remaining, denominator)
        };

        let per_refresh = per_refresh(per_slot);
        let expected_refreshes = expected_refreshes(per_refresh, confidence_percent);

        ProbabilityResult {
            per_slot,
            per_refresh,
            over_n: over_refreshes(per_refresh, refreshes),
            expected_refreshes,
            expected_cost: expected_cost(expected_refreshes, self.tables.cost_per_refresh),
            ..partial
        }
    }
}

/// Chance that a wild unit replaces an ordinary draw, clamped to `[0, 1]`.
///
/// NaN constants read as zero.
#[must_use]
pub fn wild_boost(pve_round_active: bool, wild_stars_owned: u32, constants: WildBoost) -> f64 {
    let base = if pve_round_active {
        non_nan(constants.pve_bonus)
    } else {
        0.0
    };
    let boost = base + non_nan(constants.per_star_bonus) * f64::from(wild_stars_owned);
    non_nan(boost).clamp(0.0, 1.0)
}

/// Chance that at least one of the shop slots shows the target.
#[must_use]
pub fn per_refresh(per_slot: f64) -> f64 {
    let per_slot = non_nan(per_slot).clamp(0.0, 1.0);
    1.0 - (1.0 - per_slot).powi(SHOP_SLOTS as i32)
}

/// Chance of at least one success within `refreshes` refreshes.
#[must_use]
pub fn over_refreshes(per_refresh: f64, refreshes: u32) -> f64 {
    let per_refresh = non_nan(per_refresh).clamp(0.0, 1.0);
    1.0 - (1.0 - per_refresh).powf(f64::from(refreshes))
}

/// Refreshes needed before the cumulative success chance reaches the confidence.
///
/// Returns infinity when a refresh can never succeed or full certainty is
/// requested from an uncertain refresh.
#[must_use]
pub fn expected_refreshes(per_refresh: f64, confidence_percent: f64) -> f64 {
    let per_refresh = non_nan(per_refresh);
    if per_refresh <= 0.0 {
        return f64::INFINITY;
    }

    let confidence = (non_nan(confidence_percent) / 100.0).clamp(0.0, 1.0);
    if confidence <= 0.0 {
        return 0.0;
    }
    if per_refresh >= 1.0 {
        return 1.0;
    }
    if confidence >= 1.0 {
        return f64::INFINITY;
    }

    (-confidence).ln_1p() / (-per_refresh).ln_1p()
}

/// Gold needed for `refreshes` refreshes; infinity propagates unchanged.
#[must_use]
pub fn expected_cost(refreshes: f64, cost_per_refresh: f64) -> f64 {
    if refreshes.is_infinite() {
        return f64::INFINITY;
    }
    refreshes * non_nan(cost_per_refresh).max(0.0)
}

/// Copies across both stages of `pool`, each reduced by the copies visible elsewhere.
fn net_total(pool: &PoolEntry, reduction: &StageTable<u32>) -> u32 {
    Stage::ALL.into_iter().fold(0, |total: u32, stage| {
        total.saturating_add(
            pool.total_copies(stage)
                .saturating_sub(*reduction.get(stage)),
        )
    })
}

fn share(weight: f64, remaining: u32, denominator: u32) -> f64 {
    if remaining == 0 || denominator == 0 || weight <= 0.0 {
        return 0.0;
    }
    (weight * f64::from(remaining) / f64::from(denominator)).clamp(0.0, 1.0)
}

fn non_nan(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}
