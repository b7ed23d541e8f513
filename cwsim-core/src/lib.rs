//! Deterministic turn-based American Civil War campaign engine.
//!
//! The crate is organized around a single owned [`GameState`] that the
//! turn orchestrator advances one side at a time:
//!
//! - [`state`] holds the world: cities, armies, fleets, treasuries and
//!   the serialized RNG that makes replays exact.
//! - [`systems`] are the pure-ish tick functions: combat, movement,
//!   supply, economy, naval actions, random events and victory checks.
//! - [`turn`] validates a [`TurnOrders`] batch against the current
//!   phase, applies it to a working copy of the state and commits only
//!   if the result passes invariant validation.
//! - [`snapshot`] serializes the whole game to JSON inside a zip
//!   archive and refuses to load anything inconsistent.
//! - [`ai`] supplies scripted opponents over the same command surface
//!   a human player uses.
//!
//! Everything random flows through [`rng::GameRng`], whose state lives
//! inside [`GameState`], so two games started from the same seed and
//! fed the same orders stay bit-identical.

pub mod ai;
pub mod command;
pub mod config;
pub mod error;
pub mod map;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod state;
pub mod systems;
pub mod testing;
pub mod turn;

pub use command::{Command, TurnOrders};
pub use config::SimConfig;
pub use error::{CommandError, InvariantViolation, SnapshotError};
pub use state::{Army, ArmyId, City, CityId, Date, Fleet, GameState, Ship, ShipKind, SideId};
pub use systems::VictoryReason;
pub use turn::{Game, Phase, SubmitReport, TurnError};
