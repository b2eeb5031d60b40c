#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session controller owning every piece of mutable roll-odds state.
//!
//! A [`Session`] is created by the caller and mutated only through [`apply`],
//! which consumes one [`Command`] and reports what changed as [`Event`]s.
//! Everything else reads the session through the [`query`] module, which
//! never mutates and can be called between any two commands.

mod persist;

use std::collections::BTreeMap;

use roll_odds_core::{
    ConfigError, Entitlements, FamilyId, GameTables, Level, PlayerId, Pools, RarityStageTable,
    ResolveError, RollRecords, SessionConfig, ShopSnapshot, SpeciesId, SpeciesTable, Target,
    UnlockContext, UnlockSignature,
};
use roll_odds_system_availability::{confirm, AvailabilityResolver, MergeOutcome};
use roll_odds_system_pool::compute_pools;
use roll_odds_system_probability::copies_owned;
use roll_odds_system_rolls::{RollClassifier, RollVerdict};
use tracing::{debug, info};

pub use persist::{deserialize, restore_or_default, serialize, PersistError, PersistedState};

/// Commands accepted by [`apply`].
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts a new game, clearing entitlements, pool overrides, roll records
    /// and owned units in one step. Tracked targets stay but lose their counts.
    NewGame,
    /// Replaces the session-specific pool additions.
    ConfigurePools {
        /// New pool configuration.
        config: SessionConfig,
    },
    /// Folds an unlock observation batch into the entitlements of one context.
    ObserveUnlocks {
        /// Unlock mechanism the batch was observed through.
        context: UnlockContext,
        /// Signatures shown by the unlock slots.
        batch: Vec<UnlockSignature>,
    },
    /// Records the user's pick for an ambiguous unlock slot.
    ConfirmSlot {
        /// Unlock mechanism owning the slot.
        context: UnlockContext,
        /// Index of the slot within its set.
        index: usize,
        /// Species the user picked.
        species: SpeciesId,
    },
    /// Classifies the next shop snapshot observed for a player.
    ObserveShop {
        /// Player owning the shop.
        player: PlayerId,
        /// Shop contents.
        snapshot: ShopSnapshot,
        /// Level of the player when the snapshot was taken.
        level: Level,
    },
    /// Replaces the units a player owns on board and bench.
    ObserveOwnedUnits {
        /// Player owning the units.
        player: PlayerId,
        /// Species of every owned unit.
        units: Vec<SpeciesId>,
    },
    /// Updates the level and round type of the tracked player.
    ObserveRound {
        /// Level of the tracked player.
        level: Level,
        /// Whether the current round is a PvE round.
        pve_round_active: bool,
    },
    /// Replaces the copies visible outside the pool.
    ObserveVisibleCopies {
        /// Ordinary copies visible per rarity and stage.
        ordinary: RarityStageTable<u32>,
        /// Wild copies visible per rarity and stage.
        wild: RarityStageTable<u32>,
    },
    /// Selects the player whose owned units feed target evaluation.
    SetTrackedPlayer {
        /// Player to track.
        player: PlayerId,
    },
    /// Starts tracking an evolution family.
    TrackTarget {
        /// Family to track.
        family: FamilyId,
    },
    /// Stops tracking an evolution family.
    UntrackTarget {
        /// Family to forget.
        family: FamilyId,
    },
    /// Sets how many copies of a tracked family left the pool.
    SetCopiesConsumed {
        /// Tracked family.
        family: FamilyId,
        /// Copies held by anyone or otherwise removed.
        copies: u32,
    },
    /// Changes the number of new species that marks a reroll.
    SetRollThreshold {
        /// New threshold.
        threshold: usize,
    },
    /// Forgets roll records without touching entitlements.
    ClearRolls {
        /// Player to clear, or every player when absent.
        player: Option<PlayerId>,
    },
    /// Replaces entitlements, roll records and targets with persisted state.
    RestoreState {
        /// State to install.
        state: PersistedState,
    },
}

/// Events emitted by [`apply`].
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A new game started and every session-scoped record was cleared.
    GameReset,
    /// Pools were recomputed from the current configuration.
    PoolsRecomputed {
        /// Freshly computed pools.
        pools: Pools,
    },
    /// A pool configuration was rejected and the previous one kept.
    PoolConfigurationRejected {
        /// Validation failure.
        error: ConfigError,
    },
    /// An unlock batch replaced every slot of its context.
    EntitlementsReplaced {
        /// Context that was replaced.
        context: UnlockContext,
        /// Slots in the new set.
        slots: usize,
    },
    /// An unlock batch extended its context.
    EntitlementsMerged {
        /// Context that was extended.
        context: UnlockContext,
        /// Slots appended.
        added: usize,
    },
    /// A slot was resolved by the user.
    SlotConfirmed {
        /// Context owning the slot.
        context: UnlockContext,
        /// Index of the slot.
        index: usize,
        /// Species the slot now refers to.
        species: SpeciesId,
    },
    /// A slot confirmation was rejected and the slot left unchanged.
    SlotConfirmationRejected {
        /// Context owning the slot.
        context: UnlockContext,
        /// Reason for the rejection.
        error: ResolveError,
    },
    /// A shop snapshot was classified.
    ShopClassified {
        /// Player owning the shop.
        player: PlayerId,
        /// Level bucket the snapshot was attributed to.
        level: Level,
        /// Classification result.
        verdict: RollVerdict,
    },
    /// A family started being tracked.
    TargetTracked {
        /// Target derived from the family.
        target: Target,
    },
    /// A family could not be tracked.
    TargetRejected {
        /// Requested family.
        family: FamilyId,
        /// Reason for the rejection.
        error: ConfigError,
    },
    /// A family stopped being tracked.
    TargetUntracked {
        /// Forgotten family.
        family: FamilyId,
    },
    /// Roll records were cleared.
    RollsCleared {
        /// Cleared player, or every player when absent.
        player: Option<PlayerId>,
    },
    /// Persisted state was installed.
    StateRestored,
}

/// Explicit, caller-owned session state.
#[derive(Debug)]
pub struct Session {
    tables: GameTables,
    species: SpeciesTable,
    config: SessionConfig,
    pools: Pools,
    entitlements: Entitlements,
    rolls: RollRecords,
    classifier: RollClassifier,
    targets: Vec<Target>,
    owned: BTreeMap<PlayerId, Vec<SpeciesId>>,
    tracked_player: PlayerId,
    level: Level,
    pve_round_active: bool,
    visible: RarityStageTable<u32>,
    wild_visible: RarityStageTable<u32>,
}

impl Session {
    /// Creates an empty session over the provided static tables.
    #[must_use]
    pub fn new(tables: GameTables, species: SpeciesTable) -> Self {
        let config = SessionConfig::default();
        let pools = compute_pools(&tables, &config);
        Self {
            tables,
            species,
            config,
            pools,
            entitlements: Entitlements::default(),
            rolls: RollRecords::new(),
            classifier: RollClassifier::default(),
            targets: Vec::new(),
            owned: BTreeMap::new(),
            tracked_player: PlayerId::new(0),
            level: Level::new(1),
            pve_round_active: false,
            visible: RarityStageTable::default(),
            wild_visible: RarityStageTable::default(),
        }
    }

    fn owned_units(&self, player: PlayerId) -> &[SpeciesId] {
        self.owned
            .get(&player)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn recompute_pools(&mut self, out_events: &mut Vec<Event>) {
        self.pools = compute_pools(&self.tables, &self.config);
        out_events.push(Event::PoolsRecomputed { pools: self.pools });
    }

    fn refresh_owned_copies(&mut self) {
        let owned = self
            .owned
            .get(&self.tracked_player)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for target in &mut self.targets {
            target.copies_owned = copies_owned(&self.species, target.family, owned);
        }
    }

    fn build_target(&self, family_id: FamilyId) -> Result<Target, ConfigError> {
        let family = self
            .species
            .family(family_id)
            .ok_or(ConfigError::UnknownFamily(family_id))?;
        let base = family.base().ok_or(ConfigError::EmptyFamily(family_id))?;
        let record = self
            .species
            .get(base)
            .ok_or(ConfigError::UnknownSpecies(base))?;
        Ok(Target {
            family: family_id,
            rarity: record.rarity,
            stage: family.stage(),
            is_wild: record.wild_exclusive,
            copies_consumed: 0,
            copies_owned: copies_owned(
                &self.species,
                family_id,
                self.owned_units(self.tracked_player),
            ),
        })
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.entitlements.clear();
        self.rolls.clear();
        self.owned.clear();
        self.config = SessionConfig::default();
        self.pve_round_active = false;
        self.visible = RarityStageTable::default();
        self.wild_visible = RarityStageTable::default();
        for target in &mut self.targets {
            target.copies_consumed = 0;
            target.copies_owned = 0;
        }
        out_events.push(Event::GameReset);
        self.recompute_pools(out_events);
    }
}

/// Applies the provided command to the session.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::NewGame => {
            info!(targets = session.targets.len(), "starting a new game");
            session.reset(out_events);
        }
        Command::ConfigurePools { config } => match config.validate() {
            Ok(()) => {
                session.config = config;
                session.recompute_pools(out_events);
            }
            Err(error) => {
                debug!(%error, "rejected pool configuration");
                out_events.push(Event::PoolConfigurationRejected { error });
            }
        },
        Command::ObserveUnlocks { context, batch } => {
            let resolver = AvailabilityResolver::new(&session.species);
            let set = session.entitlements.get_mut(context);
            match resolver.merge_batch(set, &batch, context) {
                MergeOutcome::Replaced { slots } => {
                    info!(?context, slots, "unlock batch replaced entitlements");
                    out_events.push(Event::EntitlementsReplaced { context, slots });
                }
                MergeOutcome::Merged { added } => {
                    debug!(?context, added, "unlock batch merged into entitlements");
                    out_events.push(Event::EntitlementsMerged { context, added });
                }
            }
        }
        Command::ConfirmSlot {
            context,
            index,
            species,
        } => match confirm(session.entitlements.get_mut(context), index, species) {
            Ok(()) => out_events.push(Event::SlotConfirmed {
                context,
                index,
                species,
            }),
            Err(error) => {
                debug!(?context, %error, "rejected slot confirmation");
                out_events.push(Event::SlotConfirmationRejected { context, error });
            }
        },
        Command::ObserveShop {
            player,
            snapshot,
            level,
        } => {
            let verdict = session
                .classifier
                .classify(&mut session.rolls, player, snapshot, level);
            debug!(
                player = player.get(),
                level = level.get(),
                ?verdict,
                "classified shop snapshot"
            );
            out_events.push(Event::ShopClassified {
                player,
                level,
                verdict,
            });
        }
        Command::ObserveOwnedUnits { player, units } => {
            let _ = session.owned.insert(player, units);
            if player == session.tracked_player {
                session.refresh_owned_copies();
            }
        }
        Command::ObserveRound {
            level,
            pve_round_active,
        } => {
            session.level = level;
            session.pve_round_active = pve_round_active;
        }
        Command::ObserveVisibleCopies { ordinary, wild } => {
            session.visible = ordinary;
            session.wild_visible = wild;
        }
        Command::SetTrackedPlayer { player } => {
            session.tracked_player = player;
            session.refresh_owned_copies();
        }
        Command::TrackTarget { family } => {
            if session.targets.iter().any(|target| target.family == family) {
                return;
            }
            match session.build_target(family) {
                Ok(target) => {
                    session.targets.push(target);
                    out_events.push(Event::TargetTracked { target });
                }
                Err(error) => out_events.push(Event::TargetRejected { family, error }),
            }
        }
        Command::UntrackTarget { family } => {
            let before = session.targets.len();
            session.targets.retain(|target| target.family != family);
            if session.targets.len() != before {
                out_events.push(Event::TargetUntracked { family });
            }
        }
        Command::SetCopiesConsumed { family, copies } => {
            for target in session
                .targets
                .iter_mut()
                .filter(|target| target.family == family)
            {
                target.copies_consumed = copies;
            }
        }
        Command::SetRollThreshold { threshold } => {
            session.classifier = RollClassifier::new(threshold);
        }
        Command::ClearRolls { player } => {
            match player {
                Some(player) => session.rolls.clear_player(player),
                None => session.rolls.clear(),
            }
            out_events.push(Event::RollsCleared { player });
        }
        Command::RestoreState { state } => {
            session.entitlements = state.entitlements;
            session.rolls = state.rolls;
            session.targets = state.targets;
            session.refresh_owned_copies();
            out_events.push(Event::StateRestored);
        }
    }
}

/// Read-only queries over a [`Session`].
pub mod query {
    use roll_odds_core::{
        Availability, AvailabilityReason, Entitlements, FamilyId, GameTables, PlayerId,
        PlayerRolls, Pools, ProbabilityResult, Rarity, RollRecords, SessionConfig,
        SessionModifiers, SpeciesId, SpeciesTable, Target,
    };
    use roll_odds_system_availability::AvailabilityResolver;
    use roll_odds_system_luck::{compute_luck, LuckStats};
    use roll_odds_system_probability::{wild_stars_owned, ProbabilityEngine};

    use super::{PersistedState, Session};

    /// Static tables the session was created with.
    #[must_use]
    pub fn tables(session: &Session) -> &GameTables {
        &session.tables
    }

    /// Static species table the session was created with.
    #[must_use]
    pub fn species(session: &Session) -> &SpeciesTable {
        &session.species
    }

    /// Current pool configuration.
    #[must_use]
    pub fn config(session: &Session) -> &SessionConfig {
        &session.config
    }

    /// Pools computed from the current configuration.
    #[must_use]
    pub fn pools(session: &Session) -> &Pools {
        &session.pools
    }

    /// Regional and additional entitlement sets.
    #[must_use]
    pub fn entitlements(session: &Session) -> &Entitlements {
        &session.entitlements
    }

    /// Roll records of every observed player.
    #[must_use]
    pub fn roll_records(session: &Session) -> &RollRecords {
        &session.rolls
    }

    /// Tracked targets in tracking order.
    #[must_use]
    pub fn targets(session: &Session) -> &[Target] {
        &session.targets
    }

    /// Player whose owned units feed target evaluation.
    #[must_use]
    pub fn tracked_player(session: &Session) -> PlayerId {
        session.tracked_player
    }

    /// New species needed before a shop change counts as a reroll.
    #[must_use]
    pub fn roll_threshold(session: &Session) -> usize {
        session.classifier.threshold()
    }

    /// Whether `species` can currently appear in the shop.
    #[must_use]
    pub fn availability(session: &Session, species: SpeciesId) -> Availability {
        AvailabilityResolver::new(&session.species).is_available(species, &session.entitlements)
    }

    /// Whether the base form of `family` can currently appear in the shop.
    #[must_use]
    pub fn family_availability(session: &Session, family: FamilyId) -> Availability {
        session
            .species
            .family(family)
            .and_then(|family| family.base())
            .map_or(
                Availability::unavailable(AvailabilityReason::UnknownSpecies),
                |base| availability(session, base),
            )
    }

    /// Modifiers applying to a target of `rarity` for the tracked player.
    #[must_use]
    pub fn modifiers(session: &Session, rarity: Rarity) -> SessionModifiers {
        SessionModifiers {
            level: session.level,
            pve_round_active: session.pve_round_active,
            wild_stars_owned: wild_stars_owned(
                &session.species,
                session.owned_units(session.tracked_player),
            ),
            visible_reduction: *session.visible.get(rarity),
            wild_visible_reduction: *session.wild_visible.get(rarity),
        }
    }

    /// Estimates the odds of finding `target` within `refreshes` refreshes.
    #[must_use]
    pub fn evaluate(
        session: &Session,
        target: &Target,
        refreshes: u32,
        confidence_percent: f64,
    ) -> ProbabilityResult {
        ProbabilityEngine::new(&session.tables).evaluate(
            target,
            &session.pools,
            family_availability(session, target.family),
            &modifiers(session, target.rarity),
            refreshes,
            confidence_percent,
        )
    }

    /// Result of evaluating one tracked target.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct TargetEvaluation {
        /// Evaluated target.
        pub target: Target,
        /// Estimate for the target.
        pub result: ProbabilityResult,
    }

    /// Evaluates every tracked target in tracking order.
    #[must_use]
    pub fn evaluate_targets(
        session: &Session,
        refreshes: u32,
        confidence_percent: f64,
    ) -> Vec<TargetEvaluation> {
        session
            .targets
            .iter()
            .map(|target| TargetEvaluation {
                target: *target,
                result: evaluate(session, target, refreshes, confidence_percent),
            })
            .collect()
    }

    /// Luck statistics of `player`; empty when the player was never observed.
    #[must_use]
    pub fn luck(session: &Session, player: PlayerId) -> LuckStats {
        let empty = PlayerRolls::default();
        let rolls = session.rolls.player(player).unwrap_or(&empty);
        compute_luck(rolls, &session.species, &session.pools, &session.tables.odds)
    }

    /// Copy of the state that survives a restart.
    #[must_use]
    pub fn persisted_state(session: &Session) -> PersistedState {
        PersistedState {
            entitlements: session.entitlements.clone(),
            rolls: session.rolls.clone(),
            targets: session.targets.clone(),
        }
    }
}
