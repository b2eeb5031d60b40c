mod common;

use common::{
    session, DARK_A, DARK_B, FIRE, FIRE_EVOLVED, FIRE_FAMILY, FIRE_FINAL, GRASS, GRASS_FAMILY,
    WATER, WATER_FAMILY, WILD, WILD_EVOLVED, WILD_FAMILY,
};
use roll_odds_core::{
    AvailabilityReason, ConfigError, FamilyId, Level, Outcome, PlayerId, Rarity,
    RarityStageTable, Resolution, ResolveError, SessionConfig, ShopSnapshot, SpeciesId, Stage,
    StageTable, TypeTag, UnlockContext, UnlockSignature,
};
use roll_odds_session::{
    apply, deserialize, query, restore_or_default, serialize, Command, Event, PersistedState,
    Session,
};
use roll_odds_system_rolls::RollVerdict;

const TRACKED: PlayerId = PlayerId::new(0);

fn run(session: &mut Session, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(session, command, &mut events);
    events
}

fn signature(rarity: Rarity, tag: TypeTag) -> UnlockSignature {
    UnlockSignature::new(rarity, [tag].into_iter().collect())
}

fn unlock_fire(session: &mut Session) -> Vec<Event> {
    run(
        session,
        Command::ObserveUnlocks {
            context: UnlockContext::Regional,
            batch: vec![signature(Rarity::Rare, TypeTag::Fire)],
        },
    )
}

fn shop(ids: &[SpeciesId]) -> ShopSnapshot {
    ShopSnapshot::new(ids.iter().copied().map(Some).collect())
}

#[test]
fn regional_unlock_makes_gated_species_available() {
    let mut session = session();
    assert_eq!(
        query::availability(&session, FIRE).reason,
        AvailabilityReason::RegionalNotPresent
    );

    let events = unlock_fire(&mut session);

    assert_eq!(
        events,
        vec![Event::EntitlementsMerged {
            context: UnlockContext::Regional,
            added: 1,
        }]
    );
    let availability = query::availability(&session, FIRE_FINAL);
    assert!(availability.available, "evolved forms follow their base");
    assert_eq!(availability.reason, AvailabilityReason::RegionalPresent);
    assert_eq!(
        query::availability(&session, WATER).reason,
        AvailabilityReason::Ungated
    );
    assert_eq!(
        query::availability(&session, GRASS).reason,
        AvailabilityReason::AdditionalNotPresent
    );
}

#[test]
fn gated_target_evaluates_to_unavailable() {
    let mut session = session();
    let _ = run(&mut session, Command::TrackTarget { family: FIRE_FAMILY });

    let evaluations = query::evaluate_targets(&session, 10, 90.0);

    assert_eq!(evaluations.len(), 1);
    let result = evaluations[0].result;
    assert_eq!(
        result.outcome,
        Outcome::Unavailable(AvailabilityReason::RegionalNotPresent)
    );
    assert_eq!(result.per_refresh, 0.0);
    assert!(result.expected_cost.is_infinite());
}

#[test]
fn tracked_target_uses_pools_and_modifiers() {
    let mut session = session();
    let _ = unlock_fire(&mut session);
    let events = run(&mut session, Command::TrackTarget { family: FIRE_FAMILY });
    let _ = run(
        &mut session,
        Command::SetCopiesConsumed {
            family: FIRE_FAMILY,
            copies: 2,
        },
    );
    let _ = run(
        &mut session,
        Command::ObserveRound {
            level: Level::new(5),
            pve_round_active: false,
        },
    );

    let Some(Event::TargetTracked { target }) = events.first() else {
        panic!("expected a tracked target, got {events:?}");
    };
    assert_eq!(target.rarity, Rarity::Rare);
    assert_eq!(target.stage, Stage::ThreeStar);
    assert!(!target.is_wild);

    let evaluation = query::evaluate_targets(&session, 10, 90.0)[0];
    let per_slot: f64 = 0.35 * 16.0 / 180.0;
    let per_refresh = 1.0 - (1.0 - per_slot).powi(6);
    assert_eq!(evaluation.result.outcome, Outcome::Computed);
    assert!((evaluation.result.per_slot - per_slot).abs() < 1e-12);
    assert!((evaluation.result.per_refresh - per_refresh).abs() < 1e-12);
    assert!(
        (evaluation.result.over_n - (1.0 - (1.0 - per_refresh).powi(10))).abs() < 1e-9,
        "over ten refreshes"
    );
}

#[test]
fn owned_units_mark_target_maxed() {
    let mut session = session();
    let _ = unlock_fire(&mut session);
    let _ = run(&mut session, Command::TrackTarget { family: FIRE_FAMILY });

    let _ = run(
        &mut session,
        Command::ObserveOwnedUnits {
            player: TRACKED,
            units: vec![FIRE_EVOLVED, FIRE_EVOLVED, FIRE, FIRE, FIRE],
        },
    );

    assert_eq!(query::targets(&session)[0].copies_owned, 9);
    let result = query::evaluate_targets(&session, 10, 90.0)[0].result;
    assert!(result.maxed());
    assert_eq!(result.per_refresh, 0.0);
    assert_eq!(result.expected_cost, 0.0, "a maxed target costs nothing more");
}

#[test]
fn owned_units_of_other_players_are_ignored_until_tracked() {
    let mut session = session();
    let _ = run(&mut session, Command::TrackTarget { family: FIRE_FAMILY });
    let other = PlayerId::new(3);
    let _ = run(
        &mut session,
        Command::ObserveOwnedUnits {
            player: other,
            units: vec![FIRE_EVOLVED],
        },
    );
    assert_eq!(query::targets(&session)[0].copies_owned, 0);

    let _ = run(&mut session, Command::SetTrackedPlayer { player: other });

    assert_eq!(query::targets(&session)[0].copies_owned, 3);
    assert_eq!(query::tracked_player(&session), other);
}

#[test]
fn wild_units_raise_the_boost() {
    let mut session = session();
    let _ = run(
        &mut session,
        Command::ObserveOwnedUnits {
            player: TRACKED,
            units: vec![WILD_EVOLVED, WATER],
        },
    );
    let _ = run(
        &mut session,
        Command::ObserveRound {
            level: Level::new(5),
            pve_round_active: true,
        },
    );

    let modifiers = query::modifiers(&session, Rarity::Rare);

    assert_eq!(modifiers.wild_stars_owned, 2);
    assert!(modifiers.pve_round_active);
    assert_eq!(modifiers.level, Level::new(5));
}

#[test]
fn tracked_wild_target_draws_from_the_wild_pool() {
    let mut session = session();
    let events = run(&mut session, Command::TrackTarget { family: WILD_FAMILY });
    let Some(Event::TargetTracked { target }) = events.first() else {
        panic!("expected a tracked target, got {events:?}");
    };
    assert!(target.is_wild);

    let _ = run(
        &mut session,
        Command::ObserveOwnedUnits {
            player: TRACKED,
            units: vec![WILD_EVOLVED, WILD],
        },
    );
    let _ = run(
        &mut session,
        Command::ObserveRound {
            level: Level::new(5),
            pve_round_active: true,
        },
    );
    let _ = run(
        &mut session,
        Command::SetCopiesConsumed {
            family: WILD_FAMILY,
            copies: 5,
        },
    );
    let mut wild = RarityStageTable::<u32>::default();
    *wild.get_mut(Rarity::Rare) = StageTable::new(0, 6);
    let _ = run(
        &mut session,
        Command::ObserveVisibleCopies {
            ordinary: RarityStageTable::default(),
            wild,
        },
    );

    let evaluation = query::evaluate_targets(&session, 10, 90.0)[0];
    assert_eq!(evaluation.target.copies_owned, 4);
    let result = evaluation.result;
    assert_eq!(result.outcome, Outcome::Computed);
    assert_eq!(result.remaining, 13);
    assert!((result.boost - 0.08).abs() < 1e-12, "boost {}", result.boost);
    let per_slot: f64 = 0.08 * 0.35 * 13.0 / 12.0;
    assert!((result.per_slot - per_slot).abs() < 1e-12, "per slot {}", result.per_slot);
    assert_eq!(result.copies_missing, 5);
}

#[test]
fn ambiguous_slot_waits_for_confirmation() {
    let mut session = session();
    let _ = run(
        &mut session,
        Command::ObserveUnlocks {
            context: UnlockContext::Regional,
            batch: vec![signature(Rarity::Epic, TypeTag::Dark)],
        },
    );
    let slot = &query::entitlements(&session).regional.slots()[0];
    assert_eq!(slot.resolution(), Resolution::Unresolved);
    assert_eq!(slot.candidates().len(), 2);
    assert!(!query::availability(&session, DARK_A).available);

    let rejected = run(
        &mut session,
        Command::ConfirmSlot {
            context: UnlockContext::Regional,
            index: 0,
            species: FIRE,
        },
    );
    assert_eq!(
        rejected,
        vec![Event::SlotConfirmationRejected {
            context: UnlockContext::Regional,
            error: ResolveError::NotACandidate {
                index: 0,
                species: FIRE,
            },
        }]
    );

    let confirmed = run(
        &mut session,
        Command::ConfirmSlot {
            context: UnlockContext::Regional,
            index: 0,
            species: DARK_B,
        },
    );
    assert_eq!(
        confirmed,
        vec![Event::SlotConfirmed {
            context: UnlockContext::Regional,
            index: 0,
            species: DARK_B,
        }]
    );
    assert!(query::availability(&session, DARK_B).available);
    assert!(!query::availability(&session, DARK_A).available);
}

#[test]
fn additional_unlocks_are_kept_apart_from_regional() {
    let mut session = session();
    let _ = run(
        &mut session,
        Command::ObserveUnlocks {
            context: UnlockContext::Additional,
            batch: vec![signature(Rarity::Rare, TypeTag::Grass)],
        },
    );

    assert!(query::entitlements(&session).regional.is_empty());
    assert_eq!(
        query::family_availability(&session, GRASS_FAMILY).reason,
        AvailabilityReason::AdditionalPresent
    );
    assert_eq!(
        query::family_availability(&session, FamilyId::new(99)).reason,
        AvailabilityReason::UnknownSpecies
    );
}

#[test]
fn shop_observations_feed_roll_records() {
    let mut session = session();
    let level = Level::new(4);

    let first = run(
        &mut session,
        Command::ObserveShop {
            player: TRACKED,
            snapshot: shop(&[FIRE, WATER, GRASS, DARK_A, DARK_B]),
            level,
        },
    );
    let purchase = run(
        &mut session,
        Command::ObserveShop {
            player: TRACKED,
            snapshot: shop(&[FIRE, WATER, GRASS, DARK_A, FIRE_EVOLVED]),
            level,
        },
    );

    assert_eq!(
        first,
        vec![Event::ShopClassified {
            player: TRACKED,
            level,
            verdict: RollVerdict::InitialRoll,
        }]
    );
    assert_eq!(
        purchase,
        vec![Event::ShopClassified {
            player: TRACKED,
            level,
            verdict: RollVerdict::NotARoll { new_appearances: 1 },
        }]
    );
    let rolls = query::roll_records(&session)
        .player(TRACKED)
        .expect("player observed");
    assert_eq!(rolls.total_rolls(), 1);
    assert_eq!(query::luck(&session, TRACKED).total_rolls, 1);
    assert_eq!(query::luck(&session, PlayerId::new(7)).total_rolls, 0);
}

#[test]
fn roll_threshold_can_be_tuned() {
    let mut session = session();
    let _ = run(&mut session, Command::SetRollThreshold { threshold: 1 });
    let level = Level::new(4);
    let _ = run(
        &mut session,
        Command::ObserveShop {
            player: TRACKED,
            snapshot: shop(&[FIRE, WATER]),
            level,
        },
    );

    let events = run(
        &mut session,
        Command::ObserveShop {
            player: TRACKED,
            snapshot: shop(&[FIRE, GRASS]),
            level,
        },
    );

    assert_eq!(query::roll_threshold(&session), 1);
    assert!(matches!(
        events.as_slice(),
        [Event::ShopClassified {
            verdict: RollVerdict::Reroll { new_appearances: 1 },
            ..
        }]
    ));
}

#[test]
fn clear_rolls_targets_one_player_or_all() {
    let mut session = session();
    let other = PlayerId::new(4);
    for player in [TRACKED, other] {
        let _ = run(
            &mut session,
            Command::ObserveShop {
                player,
                snapshot: shop(&[FIRE, WATER, GRASS]),
                level: Level::new(3),
            },
        );
    }
    let _ = unlock_fire(&mut session);

    let events = run(
        &mut session,
        Command::ClearRolls {
            player: Some(TRACKED),
        },
    );
    assert_eq!(
        events,
        vec![Event::RollsCleared {
            player: Some(TRACKED)
        }]
    );
    assert!(query::roll_records(&session).player(TRACKED).is_none());
    assert!(query::roll_records(&session).player(other).is_some());

    let _ = run(&mut session, Command::ClearRolls { player: None });
    assert!(query::roll_records(&session).is_empty());
    assert_eq!(
        query::entitlements(&session).regional.len(),
        1,
        "clearing rolls keeps entitlements"
    );
}

#[test]
fn new_game_resets_session_state_together() {
    let mut session = session();
    let _ = unlock_fire(&mut session);
    let _ = run(&mut session, Command::TrackTarget { family: FIRE_FAMILY });
    let _ = run(
        &mut session,
        Command::SetCopiesConsumed {
            family: FIRE_FAMILY,
            copies: 4,
        },
    );
    let _ = run(
        &mut session,
        Command::ObserveOwnedUnits {
            player: TRACKED,
            units: vec![FIRE],
        },
    );
    let mut config = SessionConfig::default();
    config.extra_picks[1].enabled = true;
    let _ = run(&mut session, Command::ConfigurePools { config });
    let _ = run(
        &mut session,
        Command::ObserveShop {
            player: TRACKED,
            snapshot: shop(&[FIRE, WATER, GRASS]),
            level: Level::new(3),
        },
    );

    let events = run(&mut session, Command::NewGame);

    assert_eq!(events.first(), Some(&Event::GameReset));
    assert!(matches!(events.get(1), Some(Event::PoolsRecomputed { .. })));
    assert!(query::entitlements(&session).regional.is_empty());
    assert!(query::roll_records(&session).is_empty());
    assert_eq!(query::config(&session), &SessionConfig::default());
    assert_eq!(
        query::pools(&session)
            .ordinary
            .get(Rarity::Rare)
            .species
            .get(Stage::ThreeStar),
        &9
    );
    let target = query::targets(&session)[0];
    assert_eq!(target.family, FIRE_FAMILY);
    assert_eq!(target.copies_consumed, 0);
    assert_eq!(target.copies_owned, 0);
}

#[test]
fn invalid_pool_configuration_is_rejected() {
    let mut session = session();
    let mut config = SessionConfig::default();
    config.extra_picks[0].species = -1;

    let events = run(&mut session, Command::ConfigurePools { config });

    assert_eq!(
        events,
        vec![Event::PoolConfigurationRejected {
            error: ConfigError::NegativeCount {
                field: "extra_picks.species",
                value: -1,
            },
        }]
    );
    assert_eq!(query::config(&session), &SessionConfig::default());
}

#[test]
fn enabled_extra_pick_grows_the_pool() {
    let mut session = session();
    let mut config = SessionConfig::default();
    config.extra_picks[1].enabled = true;

    let events = run(&mut session, Command::ConfigurePools { config });

    let Some(Event::PoolsRecomputed { pools }) = events.first() else {
        panic!("expected recomputed pools, got {events:?}");
    };
    assert_eq!(pools.ordinary.get(Rarity::Rare).species.get(Stage::ThreeStar), &10);
    assert_eq!(query::pools(&session), pools);
}

#[test]
fn tracking_is_idempotent_and_reversible() {
    let mut session = session();
    let _ = run(&mut session, Command::TrackTarget { family: WATER_FAMILY });
    let repeated = run(&mut session, Command::TrackTarget { family: WATER_FAMILY });
    assert!(repeated.is_empty());
    assert_eq!(query::targets(&session).len(), 1);
    assert_eq!(query::targets(&session)[0].stage, Stage::TwoStar);

    let rejected = run(
        &mut session,
        Command::TrackTarget {
            family: FamilyId::new(42),
        },
    );
    assert_eq!(
        rejected,
        vec![Event::TargetRejected {
            family: FamilyId::new(42),
            error: ConfigError::UnknownFamily(FamilyId::new(42)),
        }]
    );

    let removed = run(&mut session, Command::UntrackTarget { family: WATER_FAMILY });
    assert_eq!(
        removed,
        vec![Event::TargetUntracked {
            family: WATER_FAMILY
        }]
    );
    assert!(query::targets(&session).is_empty());
}

#[test]
fn persisted_state_restores_into_fresh_session() {
    let mut original = session();
    let _ = unlock_fire(&mut original);
    let _ = run(&mut original, Command::TrackTarget { family: FIRE_FAMILY });
    let _ = run(
        &mut original,
        Command::ObserveShop {
            player: TRACKED,
            snapshot: shop(&[FIRE, WATER, GRASS]),
            level: Level::new(3),
        },
    );

    let state = query::persisted_state(&original);
    let bytes = serialize(&state).expect("encode state");
    let decoded = deserialize(&bytes).expect("decode state");
    assert_eq!(decoded, state);

    let mut restored = session();
    let events = run(&mut restored, Command::RestoreState { state: decoded });

    assert_eq!(events, vec![Event::StateRestored]);
    assert_eq!(query::persisted_state(&restored), state);
    assert!(query::availability(&restored, FIRE).available);
    assert_eq!(
        query::evaluate_targets(&restored, 5, 75.0),
        query::evaluate_targets(&original, 5, 75.0)
    );
}

#[test]
fn tampered_resolution_is_not_restored() {
    let mut original = session();
    let _ = unlock_fire(&mut original);
    let mut bytes = serialize(&query::persisted_state(&original)).expect("encode state");

    let mut resolved = 1_u32.to_le_bytes().to_vec();
    resolved.extend_from_slice(&FIRE.get().to_le_bytes());
    let position = bytes
        .windows(resolved.len())
        .rposition(|window| window == resolved.as_slice())
        .expect("auto-resolved fire slot is encoded");
    bytes[position + 4..position + 8].copy_from_slice(&DARK_A.get().to_le_bytes());

    assert!(deserialize(&bytes).is_err(), "resolution outside candidates must fail");
    let state = restore_or_default(&bytes);
    assert_eq!(state, PersistedState::default());

    let mut restored = session();
    let _ = run(&mut restored, Command::RestoreState { state });
    assert!(!query::availability(&restored, DARK_A).available);
    assert!(!query::availability(&restored, FIRE).available);
}

#[test]
fn unreadable_state_falls_back_to_default() {
    assert_eq!(restore_or_default(b"not a session"), PersistedState::default());
    assert_eq!(restore_or_default(&[]), PersistedState::default());
}
