use crate::state::{ArmyId, CityId, FleetDestination, ShipKind, SideId};
use serde::{Deserialize, Serialize};

/// One batch of commands from one side for the current turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOrders {
    pub side: SideId,
    pub commands: Vec<Command>,
}

/// Everything a player (or AI) can ask for in a turn.
///
/// Marches and fleet movement are queued and executed in initiative
/// order when the turn resolves; the rest take effect immediately on
/// submission, or are rejected with the state untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// March to an adjacent city. Resolves this turn, battles included.
    Move { army: ArmyId, to: CityId },
    /// Board trains for a friendly city reachable over friendly track.
    /// The army departs now and arrives when the next turn resolves.
    RailMove { army: ArmyId, to: CityId },
    /// Withdraw a queued march.
    CancelOrders { army: ArmyId },
    /// Raise the fortification level of a held city.
    Fortify { city: CityId },
    /// Raise a new army at a held city.
    Recruit { city: CityId },
    /// Buy supply for an army from the treasury.
    Resupply { army: ArmyId },
    /// Merge a co-located army into another.
    Combine { from: ArmyId, into: ArmyId },
    /// Replace an army's commander from the reserve pool.
    AssignCommander { army: ArmyId, commander: String },
    /// Spend the turn training instead of marching.
    Drill { army: ArmyId },
    /// Send the fleet to a port or to the raiding station.
    MoveFleet { to: FleetDestination },
    /// Lay down a ship at a held port.
    BuildShip { port: CityId, kind: ShipKind },
    /// Patch up the fleet's hulls in a friendly port.
    RepairFleet,
    /// Shell a coastal city the fleet is standing off.
    Bombard { city: CityId },
    /// Put a landing force ashore at a coastal city, expending a ship.
    Invade { city: CityId },
}
