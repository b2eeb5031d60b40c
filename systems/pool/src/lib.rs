#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure pool calculator that sizes the ordinary and wild shop pools.

use roll_odds_core::{GameTables, Pools, Rarity, SessionConfig, Stage};

/// Computes per-rarity, per-stage pool sizes for the current session.
///
/// Species counts start from the static base tables, then receive the
/// session's regional additions and every enabled extra pick round. Copies per
/// species are shared between the ordinary and the wild pool. Negative
/// session inputs are clamped to zero.
#[must_use]
pub fn compute_pools(tables: &GameTables, config: &SessionConfig) -> Pools {
    let mut pools = Pools::default();

    for rarity in Rarity::ALL {
        let ordinary = pools.ordinary.get_mut(rarity);
        let wild = pools.wild.get_mut(rarity);

        for stage in Stage::ALL {
            let copies = tables.copies_per_species.at(rarity, stage);
            *ordinary.copies_per_species.get_mut(stage) = copies;
            *wild.copies_per_species.get_mut(stage) = copies;

            *ordinary.species.get_mut(stage) = tables
                .base_species
                .at(rarity, stage)
                .saturating_add(non_negative(config.regional_species.at(rarity, stage)));
            *wild.species.get_mut(stage) = tables
                .wild_base_species
                .at(rarity, stage)
                .saturating_add(non_negative(config.regional_wild_species.at(rarity, stage)));
        }
    }

    for round in config.extra_picks.iter().filter(|round| round.enabled) {
        let species = pools
            .ordinary
            .get_mut(round.rarity)
            .species
            .get_mut(round.stage);
        *species = species.saturating_add(non_negative(round.species));
    }

    pools
}

fn non_negative(value: i32) -> u32 {
    value.max(0).unsigned_abs()
}
