//! Static species and evolution-family definitions.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Rarity, Stage};

/// Unique identifier assigned to a species (one evolution form).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SpeciesId(u32);

impl SpeciesId {
    /// Creates a new species identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an evolution family.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FamilyId(u32);

impl FamilyId {
    /// Creates a new family identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Type tags (synergies) carried by species.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum TypeTag {
    Normal,
    Grass,
    Fire,
    Water,
    Electric,
    Fighting,
    Psychic,
    Dark,
    Steel,
    Ground,
    Poison,
    Dragon,
    Field,
    Monster,
    Human,
    Aquatic,
    Bug,
    Flying,
    Flora,
    Rock,
    Ghost,
    Fairy,
    Ice,
    Fossil,
    Sound,
    Artificial,
    Baby,
    Light,
    Amorphous,
    Gourmet,
    /// Meta-tag marking wild units; ignored by unlock signatures.
    Wild,
}

/// Canonical, ordered set of type tags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagSet(BTreeSet<TypeTag>);

impl TagSet {
    /// Returns a copy of the set with the wild meta-tag removed.
    #[must_use]
    pub fn without_wild(&self) -> Self {
        Self(
            self.0
                .iter()
                .copied()
                .filter(|tag| *tag != TypeTag::Wild)
                .collect(),
        )
    }

    /// Reports whether the set contains `tag`.
    #[must_use]
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.0.contains(&tag)
    }

    /// Iterates tags in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.0.iter().copied()
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Reports whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<TypeTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = TypeTag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Session unlock mechanism that gates a species.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatingFlag {
    /// Always in the pool.
    #[default]
    #[serde(rename = "none")]
    Ungated,
    /// Needs a regional unlock.
    Regional,
    /// Needs an additional-pick unlock.
    Additional,
    /// Needs either unlock.
    Both,
}

/// One form within an evolution family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionForm {
    /// Species of this form.
    pub species: SpeciesId,
    /// Base copies one unit of this form represents.
    pub cost: u32,
}

/// Ordered evolution chain sharing a single `max_stars` value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionFamily {
    /// Identifier of the family.
    pub id: FamilyId,
    /// Forms from unevolved to fully evolved.
    pub forms: Vec<EvolutionForm>,
    /// Highest star level the family reaches.
    pub max_stars: u8,
}

impl EvolutionFamily {
    /// Stage derived from `max_stars`.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        Stage::from_max_stars(self.max_stars)
    }

    /// First form, which is the one sold in the shop.
    #[must_use]
    pub fn base(&self) -> Option<SpeciesId> {
        self.forms.first().map(|form| form.species)
    }

    /// Form entry for `species`, if it belongs to this family.
    #[must_use]
    pub fn form(&self, species: SpeciesId) -> Option<&EvolutionForm> {
        self.forms.iter().find(|form| form.species == species)
    }

    /// Star level (1-based position) of `species` within the family.
    #[must_use]
    pub fn star_of(&self, species: SpeciesId) -> Option<u32> {
        self.forms
            .iter()
            .position(|form| form.species == species)
            .and_then(|index| u32::try_from(index + 1).ok())
    }
}

/// Static description of a single species.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    /// Identifier of the species.
    pub id: SpeciesId,
    /// Display name.
    pub name: String,
    /// Family the species evolves within.
    pub family: FamilyId,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Type tags, possibly including [`TypeTag::Wild`].
    pub tags: TagSet,
    /// Unlock gating.
    pub gating: GatingFlag,
    /// Whether the species is only drawn through the wild pool.
    pub wild_exclusive: bool,
    /// Whether the species is a joker or shares its identity with another entry.
    pub joker: bool,
    /// Unevolved predecessor offered outside this family, if any.
    pub predecessor: Option<SpeciesId>,
}

/// Validated lookup over every species and family.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpeciesTable {
    species: BTreeMap<SpeciesId, SpeciesRecord>,
    families: BTreeMap<FamilyId, EvolutionFamily>,
}

impl SpeciesTable {
    /// Builds a table after checking every cross-reference.
    pub fn new(
        families: Vec<EvolutionFamily>,
        records: Vec<SpeciesRecord>,
    ) -> Result<Self, ConfigError> {
        let mut species = BTreeMap::new();
        for record in records {
            let id = record.id;
            if species.insert(id, record).is_some() {
                return Err(ConfigError::DuplicateSpecies(id));
            }
        }

        let mut family_map = BTreeMap::new();
        for family in families {
            if family.forms.is_empty() {
                return Err(ConfigError::EmptyFamily(family.id));
            }
            for form in &family.forms {
                let record = species
                    .get(&form.species)
                    .ok_or(ConfigError::UnknownSpecies(form.species))?;
                if record.family != family.id {
                    return Err(ConfigError::FamilyMismatch {
                        species: form.species,
                        family: family.id,
                    });
                }
            }
            let id = family.id;
            if family_map.insert(id, family).is_some() {
                return Err(ConfigError::DuplicateFamily(id));
            }
        }

        for record in species.values() {
            let family = family_map
                .get(&record.family)
                .ok_or(ConfigError::UnknownFamily(record.family))?;
            if family.form(record.id).is_none() {
                return Err(ConfigError::FamilyMismatch {
                    species: record.id,
                    family: record.family,
                });
            }
            if let Some(predecessor) = record.predecessor {
                if !species.contains_key(&predecessor) {
                    return Err(ConfigError::UnknownSpecies(predecessor));
                }
            }
        }

        Ok(Self {
            species,
            families: family_map,
        })
    }

    /// Record for `id`.
    #[must_use]
    pub fn get(&self, id: SpeciesId) -> Option<&SpeciesRecord> {
        self.species.get(&id)
    }

    /// Family for `id`.
    #[must_use]
    pub fn family(&self, id: FamilyId) -> Option<&EvolutionFamily> {
        self.families.get(&id)
    }

    /// Family containing `species`.
    #[must_use]
    pub fn family_of(&self, species: SpeciesId) -> Option<&EvolutionFamily> {
        self.get(species)
            .and_then(|record| self.families.get(&record.family))
    }

    /// Reports whether `species` is the first form of its family.
    #[must_use]
    pub fn is_base_form(&self, species: SpeciesId) -> bool {
        self.family_of(species)
            .and_then(EvolutionFamily::base)
            .is_some_and(|base| base == species)
    }

    /// First form of the family containing `species`.
    #[must_use]
    pub fn base_form_of(&self, species: SpeciesId) -> Option<SpeciesId> {
        self.family_of(species).and_then(EvolutionFamily::base)
    }

    /// Iterates species records in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &SpeciesRecord> {
        self.species.values()
    }

    /// Iterates families in identifier order.
    pub fn families(&self) -> impl Iterator<Item = &EvolutionFamily> {
        self.families.values()
    }

    /// Number of species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Reports whether the table holds no species.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}
