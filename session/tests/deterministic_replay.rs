mod common;

use common::{
    session, DARK_A, DARK_B, FIRE, FIRE_EVOLVED, FIRE_FAMILY, FIRE_FINAL, GRASS, WATER,
    WATER_FAMILY, WILD, WILD_EVOLVED, WILD_FAMILY,
};
use roll_odds_core::{
    Level, PlayerId, Rarity, RarityStageTable, ShopSnapshot, SpeciesId, StageTable, TypeTag,
    UnlockContext, UnlockSignature,
};
use roll_odds_session::{apply, query, serialize, Command, Event};

fn shop(ids: &[SpeciesId]) -> ShopSnapshot {
    ShopSnapshot::new(ids.iter().copied().map(Some).collect())
}

fn signature(rarity: Rarity, tag: TypeTag) -> UnlockSignature {
    UnlockSignature::new(rarity, [tag].into_iter().collect())
}

fn script() -> Vec<Command> {
    let tracked = PlayerId::new(0);
    let rival = PlayerId::new(1);
    let mut visible = RarityStageTable::<u32>::default();
    *visible.get_mut(Rarity::Rare) = StageTable::new(3, 12);

    vec![
        Command::ObserveUnlocks {
            context: UnlockContext::Regional,
            batch: vec![
                signature(Rarity::Rare, TypeTag::Fire),
                signature(Rarity::Epic, TypeTag::Dark),
            ],
        },
        Command::ConfirmSlot {
            context: UnlockContext::Regional,
            index: 1,
            species: DARK_B,
        },
        Command::TrackTarget {
            family: FIRE_FAMILY,
        },
        Command::TrackTarget {
            family: WATER_FAMILY,
        },
        Command::TrackTarget {
            family: WILD_FAMILY,
        },
        Command::ObserveRound {
            level: Level::new(5),
            pve_round_active: true,
        },
        Command::ObserveVisibleCopies {
            ordinary: visible,
            wild: RarityStageTable::default(),
        },
        Command::ObserveOwnedUnits {
            player: tracked,
            units: vec![FIRE_EVOLVED, FIRE],
        },
        Command::SetCopiesConsumed {
            family: FIRE_FAMILY,
            copies: 5,
        },
        Command::ObserveShop {
            player: tracked,
            snapshot: shop(&[FIRE, WATER, GRASS, WILD, DARK_B, WATER]),
            level: Level::new(5),
        },
        Command::ObserveShop {
            player: rival,
            snapshot: shop(&[WATER, WATER, WATER]),
            level: Level::new(4),
        },
        Command::ObserveShop {
            player: tracked,
            snapshot: shop(&[FIRE, WATER, GRASS, WILD, DARK_B, FIRE_EVOLVED]),
            level: Level::new(5),
        },
        Command::ObserveShop {
            player: tracked,
            snapshot: shop(&[DARK_A, FIRE_FINAL, WILD_EVOLVED, GRASS, GRASS, FIRE]),
            level: Level::new(5),
        },
        Command::ObserveShop {
            player: tracked,
            snapshot: shop(&[WATER, DARK_B, GRASS, WATER, WATER, WILD]),
            level: Level::new(6),
        },
        Command::ObserveUnlocks {
            context: UnlockContext::Regional,
            batch: vec![
                signature(Rarity::Rare, TypeTag::Fire),
                signature(Rarity::Epic, TypeTag::Dark),
                signature(Rarity::Rare, TypeTag::Grass),
            ],
        },
    ]
}

struct Replay {
    events: Vec<Event>,
    state: Vec<u8>,
    evaluations: Vec<query::TargetEvaluation>,
    luck_score: f64,
}

fn replay() -> Replay {
    let mut session = session();
    let mut events = Vec::new();
    for command in script() {
        apply(&mut session, command, &mut events);
    }
    Replay {
        events,
        state: serialize(&query::persisted_state(&session)).expect("encode state"),
        evaluations: query::evaluate_targets(&session, 20, 90.0),
        luck_score: query::luck(&session, PlayerId::new(0)).score_percent,
    }
}

#[test]
fn replaying_the_same_observations_is_deterministic() {
    let first = replay();
    let second = replay();

    assert_eq!(first.events, second.events);
    assert_eq!(first.state, second.state, "persisted bytes must match");
    assert_eq!(first.evaluations, second.evaluations);
    assert_eq!(first.luck_score.to_bits(), second.luck_score.to_bits());
}

#[test]
fn replay_classifies_the_scripted_rolls() {
    let run = replay();

    let verdicts: Vec<_> = run
        .events
        .iter()
        .filter_map(|event| match event {
            Event::ShopClassified { verdict, .. } => Some(verdict.counted()),
            _ => None,
        })
        .collect();
    assert_eq!(verdicts, vec![true, true, false, true, true]);

    let merges = run
        .events
        .iter()
        .filter(|event| matches!(event, Event::EntitlementsMerged { .. }))
        .count();
    assert_eq!(merges, 2, "both unlock batches extend the regional set");
}

#[test]
fn replay_evaluates_each_tracked_target() {
    let run = replay();

    assert_eq!(run.evaluations.len(), 3);
    let fire = run.evaluations[0].result;
    assert_eq!(fire.remaining, 13);
    assert_eq!(run.evaluations[0].target.copies_owned, 4);
    assert_eq!(fire.copies_missing, 5);
    let denominator = 180.0 - 15.0;
    assert!((fire.per_slot - 0.95 * 0.35 * 13.0 / denominator).abs() < 1e-12);

    let wild = run.evaluations[2].result;
    assert!(run.evaluations[2].target.is_wild);
    assert!((wild.boost - 0.05).abs() < 1e-12);
    assert!(wild.per_slot > 0.0);
}
