use crate::state::{FleetLocation, GameState, Ship, ShipKind, SideId};

/// Cities a side must hold before European agents will deal with it.
const DIPLOMACY_CITY_FLOOR: usize = 12;
const EMANCIPATION: &str = "emancipation";

/// Month-close random happenings, at most one per side per month.
/// The draw probability climbs as the war grinds on. Everything here
/// goes through the ordinary state mutations and the turn log, and the
/// same seed always deals the same hand.
pub fn run_events_tick(state: &mut GameState) {
    let years = (state.date.year - state.start_date.year).max(0) as f64 + 1.0;
    let p = (state.config.event_chance_per_year * years).min(state.config.event_chance_cap);

    for side in SideId::BOTH {
        if !state.rng.chance(p) {
            continue;
        }
        match side {
            SideId::North => north_event(state),
            SideId::South => south_event(state),
        }
    }
}

/// Multiply every army of a side, never below one man standing.
fn scale_armies(state: &mut GameState, side: SideId, factor: f64) {
    let cap = state.config.max_army_strength;
    for id in state.armies_of(side) {
        let a = state.army_mut(id).expect("army listed");
        a.strength = (((a.strength as f64 * factor) as u32).max(1)).min(cap);
    }
}

/// Bog down one randomly chosen army for the coming month.
fn storm_delay(state: &mut GameState, side: SideId) {
    let ids = state.armies_of(side);
    if ids.is_empty() {
        return;
    }
    let pick = ids[state.rng.below(ids.len() as u32) as usize];
    let name = {
        let a = state.army_mut(pick).expect("army listed");
        a.acted = true;
        a.orders = None;
        a.commander.name.clone()
    };
    state.log(format!("Storms mire the roads; {name}'s army cannot march"));
}

/// One-shot: after 1862 the war becomes a war on slavery, worth a
/// hundred points of moral standing each way.
fn emancipation(state: &mut GameState) {
    let fired = state
        .side(SideId::North)
        .events_fired
        .iter()
        .any(|e| e == EMANCIPATION);
    if state.date.year <= 1862 || fired {
        return;
    }
    state.side_mut(SideId::North).victory_points += 100;
    state.side_mut(SideId::South).victory_points -= 100;
    state
        .side_mut(SideId::North)
        .events_fired
        .push(EMANCIPATION.to_string());
    state.log("The Emancipation Proclamation transforms the cause".to_string());
}

/// A recaptured town with nobody watching it riots back out of the
/// war. Capitals never riot.
fn riot(state: &mut GameState) {
    let pick = state.city_ids().into_iter().find(|&id| {
        let c = &state.cities[&id];
        c.owner.is_some()
            && c.owner != c.original_owner
            && c.garrison == 0
            && state.army_in(id).is_none()
            && state.side(SideId::North).capital != Some(id)
            && state.side(SideId::South).capital != Some(id)
    });
    if let Some(id) = pick {
        let name = {
            let c = state.city_mut(id).expect("city listed");
            c.owner = None;
            c.name.clone()
        };
        state.log(format!("Riots drive the occupation out of {name}"));
    }
}

/// New ships need a berth. A fleet already afloat keeps its station;
/// an empty one is re-berthed at the side's lowest-numbered held
/// port. No held port means nowhere to deliver ships at all.
fn berth_for_new_ships(state: &mut GameState, side: SideId) -> bool {
    let afloat = !state.side(side).fleet.is_empty();
    let berthed = match state.side(side).fleet.location {
        FleetLocation::Port(c) => {
            state.cities.get(&c).map(|city| city.owner) == Some(Some(side))
        }
        FleetLocation::HighSeas => true,
    };
    if afloat || berthed {
        return true;
    }
    let port = state
        .cities
        .values()
        .filter(|c| c.is_port && c.owner == Some(side))
        .map(|c| c.id)
        .min();
    match port {
        Some(p) => {
            state.side_mut(side).fleet.location = FleetLocation::Port(p);
            true
        }
        None => false,
    }
}

fn cities_held(state: &GameState, side: SideId) -> usize {
    state
        .cities
        .values()
        .filter(|c| c.owner == Some(side))
        .count()
}

fn north_event(state: &mut GameState) {
    match state.rng.below(7) {
        0 => {
            if state.side(SideId::North).fleet.ships.len() < state.config.fleet_cap
                && berth_for_new_ships(state, SideId::North)
            {
                let integrity = state.config.wooden_integrity;
                state.side_mut(SideId::North).fleet.ships.push(Ship {
                    kind: ShipKind::Wooden,
                    integrity,
                });
                state.log("Northern shipyards launch a new warship".to_string());
            }
        }
        1 => {
            scale_armies(state, SideId::North, 1.1);
            state.log("A wave of volunteers swells the Union armies".to_string());
        }
        2 => emancipation(state),
        3 => {
            state.credit(SideId::North, 100);
            state.log("Wealthy Unionists underwrite the war effort".to_string());
        }
        4 => {
            scale_armies(state, SideId::South, 0.92);
            state.log("Desertion thins the rebel ranks".to_string());
        }
        5 => {
            for id in state.armies_of(SideId::North) {
                let a = state.army_mut(id).expect("army listed");
                if a.experience < 9 {
                    a.experience = (a.experience + 2).min(9);
                }
            }
            state.log("Repeating rifles reach the Union infantry".to_string());
        }
        _ => storm_delay(state, SideId::North),
    }
}

fn south_event(state: &mut GameState) {
    match state.rng.below(7) {
        0 => {
            let room = state
                .config
                .fleet_cap
                .saturating_sub(state.side(SideId::South).fleet.ships.len());
            if room > 0 && berth_for_new_ships(state, SideId::South) {
                let integrity = state.config.wooden_integrity;
                for _ in 0..room.min(2) {
                    state.side_mut(SideId::South).fleet.ships.push(Ship {
                        kind: ShipKind::Wooden,
                        integrity,
                    });
                }
                state.log("English yards deliver blockade runners to the South".to_string());
            }
        }
        1 => {
            if cities_held(state, SideId::South) >= DIPLOMACY_CITY_FLOOR {
                // The weakest army gets the foreign professionals
                let pick = state
                    .armies_of(SideId::South)
                    .into_iter()
                    .min_by_key(|&id| (state.armies[&id].strength, id));
                if let Some(id) = pick {
                    let cap = state.config.max_army_strength;
                    let a = state.army_mut(id).expect("army listed");
                    a.strength = (a.strength + 100).min(cap);
                    a.experience = a.experience.max(8);
                    state.log("European mercenaries take the field for the South".to_string());
                }
            }
        }
        2 => {
            if cities_held(state, SideId::South) >= DIPLOMACY_CITY_FLOOR {
                state.credit(SideId::South, 100);
                state.log("A European loan reaches the Confederate treasury".to_string());
            }
        }
        3 => {
            state.credit(SideId::South, 100);
            state.log("Cotton runs the blockade and sells high".to_string());
        }
        4 => {
            scale_armies(state, SideId::North, 0.9);
            state.log("Union enlistments expire and regiments go home".to_string());
        }
        5 => riot(state),
        _ => storm_delay(state, SideId::South),
    }
}
