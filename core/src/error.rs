//! Error types surfaced by table validation and slot resolution.

use thiserror::Error;

use crate::{FamilyId, SpeciesId};

/// Static or session configuration that cannot be used as given.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A count that must be non-negative was negative.
    #[error("{field} must be non-negative, got {value}")]
    NegativeCount {
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: i64,
    },
    /// A referenced species does not exist.
    #[error("unknown species {0:?}")]
    UnknownSpecies(SpeciesId),
    /// A referenced family does not exist.
    #[error("unknown evolution family {0:?}")]
    UnknownFamily(FamilyId),
    /// A species identifier was defined twice.
    #[error("species {0:?} is defined more than once")]
    DuplicateSpecies(SpeciesId),
    /// A family identifier was defined twice.
    #[error("evolution family {0:?} is defined more than once")]
    DuplicateFamily(FamilyId),
    /// A family lists no forms.
    #[error("evolution family {0:?} has no forms")]
    EmptyFamily(FamilyId),
    /// A species and a family disagree about membership.
    #[error("species {species:?} does not belong to family {family:?}")]
    FamilyMismatch {
        /// Species named in the disagreement.
        species: SpeciesId,
        /// Family named in the disagreement.
        family: FamilyId,
    },
}

/// Rejected attempt to resolve an entitlement slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The slot index does not exist in the entitlement set.
    #[error("slot {index} is out of range for {len} slots")]
    SlotOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of slots in the set.
        len: usize,
    },
    /// The species is not among the slot's candidates.
    #[error("species {species:?} is not a candidate for slot {index}")]
    NotACandidate {
        /// Slot index.
        index: usize,
        /// Rejected species.
        species: SpeciesId,
    },
    /// A stored resolution names a species outside its slot's candidates.
    #[error("stored resolution names species {species:?} outside the slot's candidates")]
    StaleResolution {
        /// Species named by the stored resolution.
        species: SpeciesId,
    },
}
