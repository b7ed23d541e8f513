use crate::command::{Command, TurnOrders};
use crate::error::{CommandError, InvariantViolation};
use crate::snapshot;
use crate::state::{ArmyLocation, ArmyStatus, CityId, GameState, SideId};
use crate::systems::victory::VictoryReason;
use crate::systems::{combat, economy, events, logistics, movement, naval, victory};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Where the turn cycle stands. Snapshots are produced and accepted
/// only at these boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    AwaitingOrders { side: SideId },
    GameOver { winner: SideId, reason: VictoryReason },
}

#[derive(Error, Debug)]
pub enum TurnError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// What one submitted turn did.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    /// Commands that bounced, each with its reason. The rest applied.
    pub rejected: Vec<(Command, CommandError)>,
    /// The turn log produced while resolving.
    pub log: Vec<String>,
    pub checksum: u64,
}

/// A full game: the world plus the phase machine over it.
///
/// `submit` is the only way forward. Each call takes one side's
/// complete orders, resolves that side's marches and sailing, and at
/// the end of the second side's turn closes out the month: supply,
/// raiding, income, events and the victory check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub state: GameState,
    pub phase: Phase,
}

impl Game {
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            phase: Phase::AwaitingOrders { side: SideId::North },
        }
    }

    pub fn current_side(&self) -> Option<SideId> {
        match self.phase {
            Phase::AwaitingOrders { side } => Some(side),
            Phase::GameOver { .. } => None,
        }
    }

    pub fn winner(&self) -> Option<(SideId, VictoryReason)> {
        match self.phase {
            Phase::GameOver { winner, reason } => Some((winner, reason)),
            Phase::AwaitingOrders { .. } => None,
        }
    }

    /// Submit one side's turn. Individual bad commands are rejected
    /// and reported without sinking the batch; a resolution that
    /// breaks an engine invariant discards the whole turn instead of
    /// committing a corrupt state.
    pub fn submit(&mut self, orders: &TurnOrders) -> Result<SubmitReport, TurnError> {
        let side = match self.phase {
            Phase::GameOver { .. } => return Err(CommandError::GameOver.into()),
            Phase::AwaitingOrders { side } => side,
        };
        if orders.side != side {
            return Err(CommandError::NotYourTurn { side: orders.side }.into());
        }

        // Resolve against a copy; commit only a state that still
        // holds together.
        let mut next = self.state.clone();
        next.turn_log.clear();

        let mut rejected = Vec::new();
        for cmd in &orders.commands {
            if let Err(e) = execute_command(&mut next, side, cmd) {
                log::warn!("Rejected command for {side}: {e}");
                rejected.push((cmd.clone(), e));
            }
        }

        naval::resolve_fleet(&mut next, side)?;
        movement::resolve_moves(&mut next, side)?;

        let mut verdict = None;
        if side == SideId::South {
            verdict = close_month(&mut next);
        }

        snapshot::validate_state(&next)?;

        self.state = next;
        self.phase = match verdict {
            Some((winner, reason)) => Phase::GameOver { winner, reason },
            None => Phase::AwaitingOrders {
                side: side.opponent(),
            },
        };

        Ok(SubmitReport {
            rejected,
            log: self.state.turn_log.clone(),
            checksum: self.state.checksum(),
        })
    }
}

/// End-of-month housekeeping, in fixed order: supply and attrition,
/// commerce raiding, income, army reset, random events, then the
/// victory check against the advanced date.
fn close_month(state: &mut GameState) -> Option<(SideId, VictoryReason)> {
    logistics::run_supply_tick(state);
    naval::run_raid_tick(state);
    economy::run_income_tick(state);

    for id in state.armies_of(SideId::North).into_iter().chain(state.armies_of(SideId::South)) {
        if let Some(a) = state.armies.get_mut(&id) {
            a.acted = false;
            a.orders = None;
            if a.status == ArmyStatus::Retreating {
                a.status = ArmyStatus::Active;
            }
        }
    }

    events::run_events_tick(state);
    state.advance_month();
    victory::check(state)
}

/// Apply one command. Marches and sailing orders queue; the rest act
/// immediately. Any error leaves the state exactly as it was.
fn execute_command(state: &mut GameState, side: SideId, cmd: &Command) -> Result<(), CommandError> {
    match cmd {
        Command::Move { army, to } => queue_march(state, side, *army, *to),
        Command::RailMove { army, to } => rail_move(state, side, *army, *to),
        Command::CancelOrders { army } => {
            let a = state.army_mut(*army)?;
            if a.side != side {
                return Err(CommandError::NotYourArmy { army: *army, side });
            }
            a.orders = None;
            Ok(())
        }
        Command::Fortify { city } => combat::fortify(state, side, *city),
        Command::Recruit { city } => economy::recruit(state, side, *city),
        Command::Resupply { army } => economy::resupply(state, side, *army),
        Command::Combine { from, into } => combine(state, side, *from, *into),
        Command::AssignCommander { army, commander } => {
            economy::assign_commander(state, side, *army, commander)
        }
        Command::Drill { army } => economy::drill(state, side, *army),
        Command::MoveFleet { to } => queue_sail(state, side, *to),
        Command::BuildShip { port, kind } => naval::build_ship(state, side, *port, *kind),
        Command::RepairFleet => naval::repair_fleet(state, side),
        Command::Bombard { city } => naval::bombard(state, side, *city),
        Command::Invade { city } => naval::invade(state, side, *city),
    }
}

fn queue_march(
    state: &mut GameState,
    side: SideId,
    army: crate::state::ArmyId,
    to: CityId,
) -> Result<(), CommandError> {
    let (owner, acted, from) = {
        let a = state.army(army)?;
        (a.side, a.acted, a.location)
    };
    if owner != side {
        return Err(CommandError::NotYourArmy { army, side });
    }
    if acted {
        return Err(CommandError::AlreadyActed(army));
    }
    let from = match from {
        ArmyLocation::InCity(c) => c,
        ArmyLocation::RailTransit { .. } => return Err(CommandError::AlreadyActed(army)),
    };
    if !state.rail.linked(from, to) {
        return Err(CommandError::IllegalDestination { from, to });
    }
    let hostile = state.city(to)?.owner != Some(side);
    if hostile && state.config.winter_campaign_ban && state.date.month == 1 {
        return Err(CommandError::NoCampaignsInJanuary);
    }
    state.army_mut(army)?.orders = Some(to);
    Ok(())
}

/// Board the trains. Throughput left after earlier boardings this turn
/// caps how much of the army travels; anything over the cap stays
/// behind as city garrison rather than bouncing the order.
fn rail_move(
    state: &mut GameState,
    side: SideId,
    army: crate::state::ArmyId,
    to: CityId,
) -> Result<(), CommandError> {
    let (owner, acted, strength, from) = {
        let a = state.army(army)?;
        (a.side, a.acted, a.strength, a.location)
    };
    if owner != side {
        return Err(CommandError::NotYourArmy { army, side });
    }
    if acted {
        return Err(CommandError::AlreadyActed(army));
    }
    let from = match from {
        ArmyLocation::InCity(c) => c,
        ArmyLocation::RailTransit { .. } => return Err(CommandError::AlreadyActed(army)),
    };
    if state.city(to)?.owner != Some(side) || from == to {
        return Err(CommandError::IllegalDestination { from, to });
    }
    if !friendly_rail_path(state, side, from, to) {
        return Err(CommandError::IllegalDestination { from, to });
    }

    let capacity = logistics::train_capacity(state, side);
    let in_transit: u32 = state
        .armies
        .values()
        .filter(|a| a.side == side && matches!(a.location, ArmyLocation::RailTransit { .. }))
        .map(|a| a.strength)
        .sum();
    let available = capacity.saturating_sub(in_transit);
    if available == 0 {
        return Err(CommandError::OverRailCapacity { capacity });
    }

    let moved = strength.min(available);
    let left_behind = strength - moved;
    if left_behind > 0 {
        state.city_mut(from)?.garrison += left_behind;
        state.log(format!(
            "{left_behind} troops are left holding the depot; the trains carry {moved}"
        ));
    }
    let a = state.army_mut(army)?;
    a.strength = moved;
    a.location = ArmyLocation::RailTransit { from, to };
    a.acted = true;
    a.orders = None;
    Ok(())
}

/// True when an all-friendly rail route joins the two cities.
fn friendly_rail_path(state: &GameState, side: SideId, from: CityId, to: CityId) -> bool {
    let mut seen: FxHashSet<CityId> = FxHashSet::default();
    let mut frontier: VecDeque<CityId> = VecDeque::new();
    seen.insert(from);
    frontier.push_back(from);
    while let Some(at) = frontier.pop_front() {
        if at == to {
            return true;
        }
        for &n in state.rail.neighbors(at) {
            if seen.contains(&n) {
                continue;
            }
            if state.cities.get(&n).map(|c| c.owner) == Some(Some(side)) {
                seen.insert(n);
                frontier.push_back(n);
            }
        }
    }
    false
}

fn combine(
    state: &mut GameState,
    side: SideId,
    from: crate::state::ArmyId,
    into: crate::state::ArmyId,
) -> Result<(), CommandError> {
    let a = state.army(from)?;
    let b = state.army(into)?;
    if a.side != side || b.side != side {
        return Err(CommandError::NotYourArmy { army: from, side });
    }
    match (a.city(), b.city()) {
        (Some(x), Some(y)) if x == y => movement::merge_armies(state, from, into),
        _ => Err(CommandError::IllegalDestination {
            from: a.city().unwrap_or(0),
            to: b.city().unwrap_or(0),
        }),
    }
}

fn queue_sail(
    state: &mut GameState,
    side: SideId,
    to: crate::state::FleetDestination,
) -> Result<(), CommandError> {
    if state.side(side).fleet.is_empty() {
        return Err(CommandError::FleetNotInPort);
    }
    if let crate::state::FleetDestination::Port(c) = to {
        if !state.city(c)?.is_port {
            return Err(CommandError::IllegalDestination { from: c, to: c });
        }
    }
    state.side_mut(side).fleet.orders = Some(to);
    Ok(())
}
