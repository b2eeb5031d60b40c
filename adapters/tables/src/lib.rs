#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Loads the static shop tables and species roster from a TOML manifest.
//!
//! Stage pairs in the manifest are written as `[two_star, three_star]`. A
//! default manifest is embedded in the crate so a session can be built
//! without touching the filesystem.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use roll_odds_core::{
    EvolutionFamily, EvolutionForm, FamilyId, GameTables, GatingFlag, OddsTable, Rarity,
    RarityTable, SpeciesId, SpeciesRecord, SpeciesTable, StageTable, TypeTag, WildBoost,
};
use serde::Deserialize;
use tracing::debug;

/// Manifest format version understood by the loader.
pub const SUPPORTED_MANIFEST_VERSION: u32 = 1;

const DEFAULT_MANIFEST: &str = include_str!("../assets/tables.toml");
const MAX_STARS: u8 = 3;

/// Static tables together with the species roster they describe.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticTables {
    /// Odds, pool sizes, prices and wild boost constants.
    pub game: GameTables,
    /// Validated species and evolution families.
    pub species: SpeciesTable,
}

impl StaticTables {
    /// Loads the manifest embedded in this crate.
    pub fn from_default_manifest() -> Result<Self> {
        Self::from_manifest_str(DEFAULT_MANIFEST).context("embedded tables manifest is invalid")
    }

    /// Loads tables from the manifest located at the provided path.
    pub fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read tables manifest at {}",
                manifest_path.display()
            )
        })?;
        Self::from_manifest_str(&contents)
            .with_context(|| format!("invalid tables manifest at {}", manifest_path.display()))
    }

    /// Parses and validates manifest contents.
    pub fn from_manifest_str(contents: &str) -> Result<Self> {
        let tables = parse_manifest(contents)?;
        debug!(
            species = tables.species.len(),
            levels = tables.game.odds.levels(),
            "loaded static tables"
        );
        Ok(tables)
    }

    /// Splits the tables into the parts a session is created from.
    #[must_use]
    pub fn into_parts(self) -> (GameTables, SpeciesTable) {
        (self.game, self.species)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    version: u32,
    cost_per_refresh: f64,
    odds: OddsSection,
    copies: PerRarity<[u32; 2]>,
    species_counts: PerRarity<[u32; 2]>,
    wild_species_counts: PerRarity<[u32; 2]>,
    shop_cost: PerRarity<u32>,
    wild_boost: BoostSection,
    #[serde(default)]
    family: Vec<FamilyEntry>,
    #[serde(default)]
    species: Vec<SpeciesEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OddsSection {
    levels: Vec<[f64; Rarity::COUNT]>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PerRarity<T> {
    common: T,
    uncommon: T,
    rare: T,
    epic: T,
    ultra: T,
}

impl<T> PerRarity<T> {
    fn into_table<U>(self, mut convert: impl FnMut(T) -> U) -> RarityTable<U> {
        RarityTable::new([
            convert(self.common),
            convert(self.uncommon),
            convert(self.rare),
            convert(self.epic),
            convert(self.ultra),
        ])
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BoostSection {
    pve_bonus: f64,
    per_star_bonus: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FamilyEntry {
    id: u32,
    max_stars: u8,
    forms: Vec<FormEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FormEntry {
    species: u32,
    cost: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpeciesEntry {
    id: u32,
    name: String,
    family: u32,
    rarity: Rarity,
    #[serde(default)]
    types: Vec<TypeTag>,
    #[serde(default)]
    gating: GatingFlag,
    #[serde(default)]
    wild: bool,
    #[serde(default)]
    joker: bool,
    predecessor: Option<u32>,
}

fn parse_manifest(contents: &str) -> Result<StaticTables> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse tables manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported tables manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let odds = parse_odds(manifest.odds)?;
    if !manifest.cost_per_refresh.is_finite() || manifest.cost_per_refresh < 0.0 {
        bail!(
            "cost_per_refresh must be a non-negative number, got {}",
            manifest.cost_per_refresh
        );
    }
    let wild_boost = parse_boost(manifest.wild_boost)?;

    let game = GameTables {
        odds,
        copies_per_species: manifest.copies.into_table(stages),
        base_species: manifest.species_counts.into_table(stages),
        wild_base_species: manifest.wild_species_counts.into_table(stages),
        shop_cost: manifest.shop_cost.into_table(|cost| cost),
        wild_boost,
        cost_per_refresh: manifest.cost_per_refresh,
    };

    let families = manifest
        .family
        .into_iter()
        .map(parse_family)
        .collect::<Result<Vec<_>>>()?;
    let records = manifest.species.into_iter().map(species_record).collect();
    let species =
        SpeciesTable::new(families, records).context("species roster failed validation")?;
    check_family_rarities(&species)?;

    Ok(StaticTables { game, species })
}

fn stages([two_star, three_star]: [u32; 2]) -> StageTable<u32> {
    StageTable::new(two_star, three_star)
}

fn parse_odds(section: OddsSection) -> Result<OddsTable> {
    if section.levels.is_empty() {
        bail!("odds table must list at least one level");
    }
    let mut rows = Vec::with_capacity(section.levels.len());
    for (index, row) in section.levels.into_iter().enumerate() {
        for (rarity, percent) in Rarity::ALL.into_iter().zip(row) {
            if !(0.0..=100.0).contains(&percent) {
                bail!(
                    "odds for level {} and {rarity:?} must be a percentage, got {percent}",
                    index + 1
                );
            }
        }
        rows.push(RarityTable::new(row));
    }
    Ok(OddsTable::new(rows))
}

fn parse_boost(section: BoostSection) -> Result<WildBoost> {
    for (name, value) in [
        ("pve_bonus", section.pve_bonus),
        ("per_star_bonus", section.per_star_bonus),
    ] {
        if !(0.0..=1.0).contains(&value) {
            bail!("wild_boost.{name} must lie between 0 and 1, got {value}");
        }
    }
    Ok(WildBoost {
        pve_bonus: section.pve_bonus,
        per_star_bonus: section.per_star_bonus,
    })
}

fn parse_family(entry: FamilyEntry) -> Result<EvolutionFamily> {
    let id = entry.id;
    if entry.max_stars == 0 || entry.max_stars > MAX_STARS {
        bail!(
            "family {id} has max_stars {}; expected 1 to {MAX_STARS}",
            entry.max_stars
        );
    }
    if entry.forms.len() > usize::from(entry.max_stars) {
        bail!(
            "family {id} lists {} forms but only reaches {} stars",
            entry.forms.len(),
            entry.max_stars
        );
    }
    if let Some(form) = entry.forms.iter().find(|form| form.cost == 0) {
        bail!("form {} of family {id} must cost at least one copy", form.species);
    }
    Ok(EvolutionFamily {
        id: FamilyId::new(id),
        forms: entry
            .forms
            .into_iter()
            .map(|form| EvolutionForm {
                species: SpeciesId::new(form.species),
                cost: form.cost,
            })
            .collect(),
        max_stars: entry.max_stars,
    })
}

fn species_record(entry: SpeciesEntry) -> SpeciesRecord {
    let wild_tag = entry.wild.then_some(TypeTag::Wild);
    SpeciesRecord {
        id: SpeciesId::new(entry.id),
        name: entry.name,
        family: FamilyId::new(entry.family),
        rarity: entry.rarity,
        tags: entry.types.into_iter().chain(wild_tag).collect(),
        gating: entry.gating,
        wild_exclusive: entry.wild,
        joker: entry.joker,
        predecessor: entry.predecessor.map(SpeciesId::new),
    }
}

fn check_family_rarities(species: &SpeciesTable) -> Result<()> {
    for family in species.families() {
        let mut rarities = family
            .forms
            .iter()
            .filter_map(|form| species.get(form.species))
            .map(|record| record.rarity);
        let Some(first) = rarities.next() else {
            continue;
        };
        if let Some(other) = rarities.find(|rarity| *rarity != first) {
            bail!(
                "family {} mixes {first:?} and {other:?} forms",
                family.id.get()
            );
        }
    }
    Ok(())
}
