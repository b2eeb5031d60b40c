//! Tallies derived from a player's owned units.

use roll_odds_core::{FamilyId, SpeciesId, SpeciesTable, TypeTag};

/// Base copies of `family` represented by the owned units.
///
/// Each owned form contributes its `cost`, so an evolved unit counts for every
/// copy merged into it. Unknown species are ignored.
#[must_use]
pub fn copies_owned(species: &SpeciesTable, family: FamilyId, owned: &[SpeciesId]) -> u32 {
    let Some(family) = species.family(family) else {
        return 0;
    };
    owned
        .iter()
        .filter_map(|unit| family.form(*unit))
        .fold(0, |total, form| total.saturating_add(form.cost))
}

/// Total star level of the owned wild units.
#[must_use]
pub fn wild_stars_owned(species: &SpeciesTable, owned: &[SpeciesId]) -> u32 {
    owned
        .iter()
        .filter(|unit| {
            species
                .get(**unit)
                .is_some_and(|record| record.wild_exclusive || record.tags.contains(TypeTag::Wild))
        })
        .filter_map(|unit| species.family_of(*unit).and_then(|family| family.star_of(*unit)))
        .fold(0, u32::saturating_add)
}
