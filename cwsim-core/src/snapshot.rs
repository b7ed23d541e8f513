//! Snapshot serialization and the consistency checks guarding it.
//!
//! A snapshot is the whole [`Game`] (world plus phase) as one JSON
//! document; save files wrap that document in a deflate-compressed
//! archive. Loading validates before anything is applied, so a
//! corrupt file can never half-install itself.

use crate::error::{InvariantViolation, SnapshotError};
use crate::state::{ArmyLocation, FleetLocation, GameState, ShipKind, SideId};
use crate::turn::Game;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const SNAPSHOT_ENTRY: &str = "snapshot.json";

/// Structural consistency of a world state. Run on every turn commit
/// and on every snapshot load.
pub fn validate_state(state: &GameState) -> Result<(), InvariantViolation> {
    if state.sides.len() != 2 {
        return Err(InvariantViolation("both sides must be present".into()));
    }

    let mut occupied: FxHashSet<u16> = FxHashSet::default();
    for (id, army) in &state.armies {
        if *id != army.id {
            return Err(InvariantViolation(format!("army {id} misfiled as {}", army.id)));
        }
        if army.strength == 0 {
            return Err(InvariantViolation(format!("army {id} has zero strength")));
        }
        if army.supply > state.config.supply_max {
            return Err(InvariantViolation(format!("army {id} oversupplied")));
        }
        match army.location {
            ArmyLocation::InCity(c) => {
                let Some(city) = state.cities.get(&c) else {
                    return Err(InvariantViolation(format!("army {id} in missing city {c}")));
                };
                if city.owner != Some(army.side) {
                    return Err(InvariantViolation(format!(
                        "army {id} of {} standing in unheld city {c}",
                        army.side
                    )));
                }
                if !occupied.insert(c) {
                    return Err(InvariantViolation(format!("two armies share city {c}")));
                }
            }
            ArmyLocation::RailTransit { from, to } => {
                if !state.cities.contains_key(&from) || !state.cities.contains_key(&to) {
                    return Err(InvariantViolation(format!(
                        "army {id} in transit between missing cities"
                    )));
                }
            }
        }
    }

    for (id, city) in &state.cities {
        if city.fort_level > state.config.fort_max {
            return Err(InvariantViolation(format!("city {id} over-fortified")));
        }
    }

    for side in SideId::BOTH {
        let s = state.side(side);
        if let Some(capital) = s.capital {
            match state.cities.get(&capital) {
                Some(c) if c.owner == Some(side) => {}
                _ => {
                    return Err(InvariantViolation(format!(
                        "{side} capital {capital} is not a held city"
                    )))
                }
            }
        }
        if !s.fleet.is_empty() {
            if let FleetLocation::Port(c) = s.fleet.location {
                if !state.cities.contains_key(&c) {
                    return Err(InvariantViolation(format!(
                        "{side} fleet in missing port {c}"
                    )));
                }
            }
            for ship in &s.fleet.ships {
                let max = match ship.kind {
                    ShipKind::Wooden => state.config.wooden_integrity,
                    ShipKind::Ironclad => state.config.ironclad_integrity,
                };
                if ship.integrity == 0 || ship.integrity > max {
                    return Err(InvariantViolation(format!(
                        "{side} ship with impossible integrity {}",
                        ship.integrity
                    )));
                }
            }
        }
    }

    Ok(())
}

pub fn to_json(game: &Game) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(game)?)
}

pub fn from_json(json: &str) -> Result<Game, SnapshotError> {
    let game: Game = serde_json::from_str(json)?;
    validate_state(&game.state).map_err(|e| SnapshotError::Inconsistent(e.to_string()))?;
    Ok(game)
}

/// Write a save file: the snapshot JSON, deflated.
pub fn save(game: &Game, path: &Path) -> Result<(), SnapshotError> {
    let json = to_json(game)?;
    let file = File::create(path)?;
    let mut archive = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    archive.start_file(SNAPSHOT_ENTRY, options)?;
    archive.write_all(json.as_bytes())?;
    archive.finish()?;
    Ok(())
}

/// Read a save file back into a validated game.
pub fn load(path: &Path) -> Result<Game, SnapshotError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut entry = archive.by_name(SNAPSHOT_ENTRY)?;
    let mut json = String::new();
    entry.read_to_string(&mut json)?;
    from_json(&json)
}
