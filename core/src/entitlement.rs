//! Unlock slots observed during a session and their resolution state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Rarity, ResolveError, SpeciesId, TagSet};

/// Session unlock mechanism an observation batch belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnlockContext {
    /// Regional unlocks granted by the current region.
    Regional,
    /// Unlocks granted by additional pick rounds.
    Additional,
}

/// Identity-free fingerprint of an observed unlock slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnlockSignature {
    rarity: Rarity,
    tags: TagSet,
}

impl UnlockSignature {
    /// Creates a signature, dropping the wild meta-tag so it never affects matching.
    #[must_use]
    pub fn new(rarity: Rarity, tags: TagSet) -> Self {
        Self {
            rarity,
            tags: tags.without_wild(),
        }
    }

    /// Rarity shown on the slot.
    #[must_use]
    pub const fn rarity(&self) -> Rarity {
        self.rarity
    }

    /// Type tags shown on the slot, without the wild meta-tag.
    #[must_use]
    pub const fn tags(&self) -> &TagSet {
        &self.tags
    }
}

/// Resolution state of a single slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// No single candidate stands out and nobody picked one.
    Unresolved,
    /// The resolver found exactly one plausible candidate.
    AutoResolved(SpeciesId),
    /// The user picked a candidate explicitly.
    UserConfirmed(SpeciesId),
}

impl Resolution {
    /// Species referenced by the resolution, if any.
    #[must_use]
    pub const fn species(&self) -> Option<SpeciesId> {
        match self {
            Self::Unresolved => None,
            Self::AutoResolved(species) | Self::UserConfirmed(species) => Some(*species),
        }
    }
}

/// One observed unlock slot with its candidate species.
///
/// A non-[`Resolution::Unresolved`] state always references a member of
/// [`EntitlementSlot::candidates`]. Deserialization rejects slots that break
/// this.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SlotParts")]
pub struct EntitlementSlot {
    signature: UnlockSignature,
    candidates: BTreeSet<SpeciesId>,
    resolution: Resolution,
}

impl EntitlementSlot {
    /// Creates an unresolved slot.
    #[must_use]
    pub fn new(signature: UnlockSignature, candidates: BTreeSet<SpeciesId>) -> Self {
        Self {
            signature,
            candidates,
            resolution: Resolution::Unresolved,
        }
    }

    /// Signature the slot was observed with.
    #[must_use]
    pub const fn signature(&self) -> &UnlockSignature {
        &self.signature
    }

    /// Species that could stand behind the slot.
    #[must_use]
    pub const fn candidates(&self) -> &BTreeSet<SpeciesId> {
        &self.candidates
    }

    /// Current resolution state.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Species the slot resolved to, if any.
    #[must_use]
    pub const fn resolved_species(&self) -> Option<SpeciesId> {
        self.resolution.species()
    }

    /// Applies `resolution` after checking that it references a candidate.
    ///
    /// `index` is only used to describe the slot in the returned error.
    pub fn resolve(&mut self, index: usize, resolution: Resolution) -> Result<(), ResolveError> {
        if let Some(species) = resolution.species() {
            if !self.candidates.contains(&species) {
                return Err(ResolveError::NotACandidate { index, species });
            }
        }
        self.resolution = resolution;
        Ok(())
    }
}

#[derive(Deserialize)]
struct SlotParts {
    signature: UnlockSignature,
    candidates: BTreeSet<SpeciesId>,
    resolution: Resolution,
}

impl TryFrom<SlotParts> for EntitlementSlot {
    type Error = ResolveError;

    fn try_from(parts: SlotParts) -> Result<Self, Self::Error> {
        if let Some(species) = parts.resolution.species() {
            if !parts.candidates.contains(&species) {
                return Err(ResolveError::StaleResolution { species });
            }
        }
        Ok(Self {
            signature: parts.signature,
            candidates: parts.candidates,
            resolution: parts.resolution,
        })
    }
}

/// Ordered unlock slots observed for one [`UnlockContext`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementSet {
    slots: Vec<EntitlementSlot>,
}

impl EntitlementSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots in observation order.
    #[must_use]
    pub fn slots(&self) -> &[EntitlementSlot] {
        &self.slots
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Reports whether no slot was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Appends a slot.
    pub fn push(&mut self, slot: EntitlementSlot) {
        self.slots.push(slot);
    }

    /// Replaces every slot.
    pub fn replace(&mut self, slots: Vec<EntitlementSlot>) {
        self.slots = slots;
    }

    /// Removes every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Resolves the slot at `index`.
    pub fn resolve(&mut self, index: usize, resolution: Resolution) -> Result<(), ResolveError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ResolveError::SlotOutOfRange { index, len })?;
        slot.resolve(index, resolution)
    }

    /// Reports whether any resolved slot references `species`.
    #[must_use]
    pub fn contains_resolved(&self, species: SpeciesId) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.resolved_species() == Some(species))
    }

    /// Resolved species in slot order.
    pub fn resolved_species(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.slots.iter().filter_map(EntitlementSlot::resolved_species)
    }
}

/// Regional and additional entitlement sets owned by one session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlements {
    /// Slots observed through regional unlocks.
    pub regional: EntitlementSet,
    /// Slots observed through additional pick rounds.
    pub additional: EntitlementSet,
}

impl Entitlements {
    /// Set for `context`.
    #[must_use]
    pub const fn get(&self, context: UnlockContext) -> &EntitlementSet {
        match context {
            UnlockContext::Regional => &self.regional,
            UnlockContext::Additional => &self.additional,
        }
    }

    /// Mutable set for `context`.
    pub fn get_mut(&mut self, context: UnlockContext) -> &mut EntitlementSet {
        match context {
            UnlockContext::Regional => &mut self.regional,
            UnlockContext::Additional => &mut self.additional,
        }
    }

    /// Empties both sets.
    pub fn clear(&mut self) {
        self.regional.clear();
        self.additional.clear();
    }
}
