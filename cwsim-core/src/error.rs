use crate::state::{ArmyId, CityId, SideId};
use thiserror::Error;

/// Rejection of a player command. The state is untouched when one of
/// these comes back; the player can correct and resubmit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("It is not {side}'s turn")]
    NotYourTurn { side: SideId },
    #[error("No such army: {0}")]
    NoSuchArmy(ArmyId),
    #[error("No such city: {0}")]
    NoSuchCity(CityId),
    #[error("Army {army} does not belong to {side}")]
    NotYourArmy { army: ArmyId, side: SideId },
    #[error("City {city} is not held by {side}")]
    NotYourCity { city: CityId, side: SideId },
    #[error("No rail link from {from} to {to}")]
    IllegalDestination { from: CityId, to: CityId },
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u32, available: u32 },
    #[error("Recruit cap reached ({cap} per turn)")]
    RecruitCapReached { cap: u32 },
    #[error("Rail capacity exhausted ({capacity} this turn)")]
    OverRailCapacity { capacity: u32 },
    #[error("Army {0} has already acted this turn")]
    AlreadyActed(ArmyId),
    #[error("Fortifications at {city} are already at the maximum level")]
    MaxFortification { city: CityId },
    #[error("No campaigns may begin in January")]
    NoCampaignsInJanuary,
    #[error("Fleet is not in a friendly port")]
    FleetNotInPort,
    #[error("Fleet is at its maximum of {cap} ships")]
    FleetFull { cap: usize },
    #[error("Ironclads are not available before {year}")]
    IroncladsUnavailable { year: i32 },
    #[error("Army {army} is cut off from supply")]
    ArmyCutOff { army: ArmyId },
    #[error("Commander {0:?} is not in the reserve pool")]
    NoSuchCommander(String),
    #[error("The war is over")]
    GameOver,
}

/// Failure loading a snapshot. Nothing is applied when one of these
/// comes back.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Bad save archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("Inconsistent snapshot: {0}")]
    Inconsistent(String),
}

/// An impossible state detected during turn resolution. The turn that
/// produced it is discarded rather than committed.
#[derive(Error, Debug)]
#[error("Engine invariant violated: {0}")]
pub struct InvariantViolation(pub String);
