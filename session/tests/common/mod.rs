use roll_odds_core::{
    EvolutionFamily, EvolutionForm, FamilyId, GameTables, GatingFlag, OddsTable, Rarity,
    RarityTable, SpeciesId, SpeciesRecord, SpeciesTable, StageTable, TypeTag, WildBoost,
};
use roll_odds_session::Session;

pub const FIRE_FAMILY: FamilyId = FamilyId::new(1);
pub const WATER_FAMILY: FamilyId = FamilyId::new(2);
pub const GRASS_FAMILY: FamilyId = FamilyId::new(3);
pub const WILD_FAMILY: FamilyId = FamilyId::new(4);

pub const FIRE: SpeciesId = SpeciesId::new(100);
pub const FIRE_EVOLVED: SpeciesId = SpeciesId::new(101);
pub const FIRE_FINAL: SpeciesId = SpeciesId::new(102);
pub const WATER: SpeciesId = SpeciesId::new(200);
pub const GRASS: SpeciesId = SpeciesId::new(300);
pub const WILD: SpeciesId = SpeciesId::new(400);
pub const WILD_EVOLVED: SpeciesId = SpeciesId::new(401);
pub const DARK_A: SpeciesId = SpeciesId::new(500);
pub const DARK_B: SpeciesId = SpeciesId::new(600);

struct RosterEntry {
    family: u32,
    forms: &'static [u32],
    rarity: Rarity,
    tags: &'static [TypeTag],
    gating: GatingFlag,
}

const ROSTER: &[RosterEntry] = &[
    RosterEntry {
        family: 1,
        forms: &[100, 101, 102],
        rarity: Rarity::Rare,
        tags: &[TypeTag::Fire],
        gating: GatingFlag::Regional,
    },
    RosterEntry {
        family: 2,
        forms: &[200, 201],
        rarity: Rarity::Common,
        tags: &[TypeTag::Water],
        gating: GatingFlag::Ungated,
    },
    RosterEntry {
        family: 3,
        forms: &[300, 301, 302],
        rarity: Rarity::Rare,
        tags: &[TypeTag::Grass],
        gating: GatingFlag::Additional,
    },
    RosterEntry {
        family: 4,
        forms: &[400, 401, 402],
        rarity: Rarity::Rare,
        tags: &[TypeTag::Wild, TypeTag::Rock],
        gating: GatingFlag::Ungated,
    },
    RosterEntry {
        family: 5,
        forms: &[500, 501, 502],
        rarity: Rarity::Epic,
        tags: &[TypeTag::Dark],
        gating: GatingFlag::Regional,
    },
    RosterEntry {
        family: 6,
        forms: &[600, 601, 602],
        rarity: Rarity::Epic,
        tags: &[TypeTag::Dark],
        gating: GatingFlag::Regional,
    },
];

pub fn species_table() -> SpeciesTable {
    let mut families = Vec::new();
    let mut records = Vec::new();
    for entry in ROSTER {
        families.push(EvolutionFamily {
            id: FamilyId::new(entry.family),
            forms: entry
                .forms
                .iter()
                .zip([1, 3, 9])
                .map(|(species, cost)| EvolutionForm {
                    species: SpeciesId::new(*species),
                    cost,
                })
                .collect(),
            max_stars: u8::try_from(entry.forms.len()).expect("short family"),
        });
        for species in entry.forms {
            records.push(SpeciesRecord {
                id: SpeciesId::new(*species),
                name: format!("species-{species}"),
                family: FamilyId::new(entry.family),
                rarity: entry.rarity,
                tags: entry.tags.iter().copied().collect(),
                gating: entry.gating,
                wild_exclusive: entry.tags.contains(&TypeTag::Wild),
                joker: false,
                predecessor: None,
            });
        }
    }
    SpeciesTable::new(families, records).expect("valid species table")
}

pub fn game_tables() -> GameTables {
    GameTables {
        odds: OddsTable::new(vec![
            RarityTable::new([100.0, 0.0, 0.0, 0.0, 0.0]),
            RarityTable::new([70.0, 30.0, 0.0, 0.0, 0.0]),
            RarityTable::new([50.0, 35.0, 15.0, 0.0, 0.0]),
            RarityTable::new([35.0, 35.0, 25.0, 5.0, 0.0]),
            RarityTable::new([20.0, 30.0, 35.0, 14.0, 1.0]),
        ]),
        copies_per_species: RarityTable::new([
            StageTable::new(27, 27),
            StageTable::new(24, 24),
            StageTable::new(18, 18),
            StageTable::new(12, 12),
            StageTable::new(10, 10),
        ]),
        base_species: RarityTable::new([
            StageTable::new(2, 11),
            StageTable::new(3, 12),
            StageTable::new(1, 9),
            StageTable::new(2, 8),
            StageTable::new(3, 6),
        ]),
        wild_base_species: RarityTable::new([
            StageTable::new(0, 1),
            StageTable::new(1, 1),
            StageTable::new(0, 1),
            StageTable::new(0, 0),
            StageTable::new(0, 0),
        ]),
        shop_cost: RarityTable::new([1, 2, 3, 4, 5]),
        wild_boost: WildBoost {
            pve_bonus: 0.05,
            per_star_bonus: 0.01,
        },
        cost_per_refresh: 1.0,
    }
}

pub fn session() -> Session {
    Session::new(game_tables(), species_table())
}
