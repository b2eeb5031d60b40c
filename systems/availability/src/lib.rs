#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Availability resolver that reconciles unlock-slot observations into species.
//!
//! Unlock slots are only observed as an [`UnlockSignature`] (rarity plus type
//! tags). The resolver maps each signature onto the species that could stand
//! behind it, keeps previously resolved slots stable across noisy observation
//! batches, and answers whether a gated species is currently obtainable.

use std::collections::{BTreeMap, BTreeSet};

use roll_odds_core::{
    Availability, AvailabilityReason, EntitlementSet, EntitlementSlot, Entitlements, GatingFlag,
    Resolution, ResolveError, SpeciesId, SpeciesTable, UnlockContext, UnlockSignature,
};

/// Largest slot-count change that still allows a batch to merge.
pub const MAX_MERGE_SLOT_DELTA: usize = 2;

/// How an observation batch was folded into an entitlement set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The batch described a different region and replaced every slot.
    Replaced {
        /// Slots in the new set.
        slots: usize,
    },
    /// The batch extended the existing set.
    Merged {
        /// Slots appended by the batch.
        added: usize,
    },
}

/// Resolver bound to the static species table.
#[derive(Clone, Copy, Debug)]
pub struct AvailabilityResolver<'a> {
    species: &'a SpeciesTable,
}

impl<'a> AvailabilityResolver<'a> {
    /// Creates a resolver reading from `species`.
    #[must_use]
    pub const fn new(species: &'a SpeciesTable) -> Self {
        Self { species }
    }

    /// Folds an observation batch into the entitlement set for `context`.
    ///
    /// The batch replaces the set outright when it shares fewer than half of
    /// the existing signatures or when the slot count moved by more than
    /// [`MAX_MERGE_SLOT_DELTA`]. Otherwise only signatures the set does not
    /// already hold are appended, and existing slots keep their resolution.
    /// Signatures are compared as a multiset, so two identical unlocks stay
    /// two slots.
    pub fn merge_batch(
        &self,
        set: &mut EntitlementSet,
        batch: &[UnlockSignature],
        context: UnlockContext,
    ) -> MergeOutcome {
        if should_replace(set, batch) {
            let slots = batch
                .iter()
                .enumerate()
                .map(|(index, signature)| self.build_slot(index, signature.clone(), context))
                .collect::<Vec<_>>();
            let count = slots.len();
            set.replace(slots);
            return MergeOutcome::Replaced { slots: count };
        }

        let mut unmatched = signature_counts(set.slots().iter().map(EntitlementSlot::signature));
        let mut added = 0;
        for signature in batch {
            if take_one(&mut unmatched, signature) {
                continue;
            }
            let slot = self.build_slot(set.len(), signature.clone(), context);
            set.push(slot);
            added += 1;
        }

        MergeOutcome::Merged { added }
    }

    /// Base-form species matching `signature` and gated by `context`.
    #[must_use]
    pub fn candidates(
        &self,
        signature: &UnlockSignature,
        context: UnlockContext,
    ) -> BTreeSet<SpeciesId> {
        self.species
            .iter()
            .filter(|record| record.rarity == signature.rarity())
            .filter(|record| gating_matches(record.gating, context))
            .filter(|record| record.tags.without_wild() == *signature.tags())
            .filter(|record| self.species.is_base_form(record.id))
            .map(|record| record.id)
            .collect()
    }

    /// Picks a candidate without user input when the choice is unambiguous.
    ///
    /// A single candidate wins outright. With several candidates, the only
    /// one that has no unevolved predecessor wins. Anything else stays
    /// [`Resolution::Unresolved`].
    #[must_use]
    pub fn auto_resolution(&self, candidates: &BTreeSet<SpeciesId>) -> Resolution {
        if candidates.len() == 1 {
            return candidates
                .first()
                .map_or(Resolution::Unresolved, |species| {
                    Resolution::AutoResolved(*species)
                });
        }

        let mut true_bases = candidates.iter().copied().filter(|candidate| {
            self.species
                .get(*candidate)
                .is_some_and(|record| record.predecessor.is_none())
        });
        match (true_bases.next(), true_bases.next()) {
            (Some(species), None) => Resolution::AutoResolved(species),
            _ => Resolution::Unresolved,
        }
    }

    /// Reports whether `species` can currently appear in the shop.
    ///
    /// Evolved forms inherit the answer of their family's base form.
    #[must_use]
    pub fn is_available(&self, species: SpeciesId, entitlements: &Entitlements) -> Availability {
        let base = self.species.base_form_of(species).unwrap_or(species);
        let Some(record) = self.species.get(base) else {
            return Availability::unavailable(AvailabilityReason::UnknownSpecies);
        };

        let regional = entitlements.regional.contains_resolved(base);
        let additional = entitlements.additional.contains_resolved(base);

        match record.gating {
            GatingFlag::Ungated => Availability::available(AvailabilityReason::Ungated),
            GatingFlag::Regional if regional => {
                Availability::available(AvailabilityReason::RegionalPresent)
            }
            GatingFlag::Regional => {
                Availability::unavailable(AvailabilityReason::RegionalNotPresent)
            }
            GatingFlag::Additional if additional => {
                Availability::available(AvailabilityReason::AdditionalPresent)
            }
            GatingFlag::Additional => {
                Availability::unavailable(AvailabilityReason::AdditionalNotPresent)
            }
            GatingFlag::Both if regional => {
                Availability::available(AvailabilityReason::RegionalPresent)
            }
            GatingFlag::Both if additional => {
                Availability::available(AvailabilityReason::AdditionalPresent)
            }
            GatingFlag::Both => Availability::unavailable(AvailabilityReason::NotInAnyEntitlement),
        }
    }

    fn build_slot(
        &self,
        index: usize,
        signature: UnlockSignature,
        context: UnlockContext,
    ) -> EntitlementSlot {
        let candidates = self.candidates(&signature, context);
        let resolution = self.auto_resolution(&candidates);
        let mut slot = EntitlementSlot::new(signature, candidates);
        // auto resolutions are always drawn from the candidate set
        let _ = slot.resolve(index, resolution);
        slot
    }
}

/// Records the user's pick for an ambiguous slot.
pub fn confirm(
    set: &mut EntitlementSet,
    index: usize,
    species: SpeciesId,
) -> Result<(), ResolveError> {
    set.resolve(index, Resolution::UserConfirmed(species))
}

fn gating_matches(gating: GatingFlag, context: UnlockContext) -> bool {
    match context {
        UnlockContext::Regional => matches!(gating, GatingFlag::Regional | GatingFlag::Both),
        UnlockContext::Additional => matches!(gating, GatingFlag::Additional | GatingFlag::Both),
    }
}

fn should_replace(set: &EntitlementSet, batch: &[UnlockSignature]) -> bool {
    if set.len().abs_diff(batch.len()) > MAX_MERGE_SLOT_DELTA {
        return true;
    }

    let mut remaining = signature_counts(batch.iter());
    let overlap = set
        .slots()
        .iter()
        .filter(|slot| take_one(&mut remaining, slot.signature()))
        .count();
    overlap * 2 < set.len()
}

fn signature_counts<'s>(
    signatures: impl Iterator<Item = &'s UnlockSignature>,
) -> BTreeMap<UnlockSignature, usize> {
    let mut counts = BTreeMap::new();
    for signature in signatures {
        *counts.entry(signature.clone()).or_insert(0) += 1;
    }
    counts
}

fn take_one(counts: &mut BTreeMap<UnlockSignature, usize>, signature: &UnlockSignature) -> bool {
    match counts.get_mut(signature) {
        Some(count) if *count > 0 => {
            *count -= 1;
            true
        }
        _ => false,
    }
}
