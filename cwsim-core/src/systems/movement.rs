use crate::error::CommandError;
use crate::state::{ArmyId, ArmyLocation, ArmyStatus, CityId, GameState, SideId};
use crate::systems::combat::{self, BattleWinner, Defender};

/// Initiative key for one army: low keys march first. A random slot,
/// pushed later for big slow columns and starving armies, pulled
/// earlier for sharp commanders. The army id tails the key so equal
/// draws stay deterministic.
fn initiative_key(state: &mut GameState, id: ArmyId) -> u32 {
    let (supply, strength, rating) = {
        let a = &state.armies[&id];
        (a.supply, a.strength, a.commander.rating)
    };
    if supply < 1 {
        return 900 + id;
    }
    let mut key = (4 + (state.rng.next_f64() * 4.0) as u32) * 100 + id;
    if strength > 400 {
        key += 100;
    }
    if rating as f64 > 10.0 * state.rng.next_f64() {
        key = key.saturating_sub(100 * (rating as u32 / 2));
    }
    key.max(100 + id)
}

/// Execute every queued march for `side`, in initiative order, landing
/// rail transits first. Battles, captures and retreats all happen
/// here.
pub fn resolve_moves(state: &mut GameState, side: SideId) -> Result<(), CommandError> {
    // Rail transits from last turn land before the marching columns
    // set out. An army that boarded this very turn has acted set and
    // stays on the trains until next time.
    for id in state.armies_of(side) {
        let transit = match state.army(id)? {
            a if a.acted => None,
            a => match a.location {
                ArmyLocation::RailTransit { to, .. } => Some(to),
                ArmyLocation::InCity(_) => None,
            },
        };
        if let Some(to) = transit {
            let name = state.army(id)?.commander.name.clone();
            state.army_mut(id)?.acted = true;
            state.log(format!("{name}'s army detrains at city {to}"));
            arrive(state, id, to)?;
        }
    }

    let mut keyed: Vec<(u32, ArmyId)> = Vec::new();
    for id in state.armies_of(side) {
        if state.army(id)?.orders.is_some() {
            let key = initiative_key(state, id);
            keyed.push((key, id));
        }
    }
    keyed.sort_unstable();

    for (_, id) in keyed {
        // Earlier battles this turn may have destroyed the army
        let Some(army) = state.armies.get(&id) else {
            continue;
        };
        let Some(dest) = army.orders else { continue };
        let from = army.city();

        {
            let a = state.army_mut(id)?;
            a.orders = None;
            a.supply = a.supply.saturating_sub(1);
        }
        march(state, id, from, dest)?;
    }

    Ok(())
}

/// A force put ashore by the fleet fights for the town with no line of
/// retreat: it takes the city or it is lost.
pub fn contest_landing(
    state: &mut GameState,
    id: ArmyId,
    city: CityId,
) -> Result<(), CommandError> {
    march(state, id, None, city)
}

/// One army marching on one city. The fight repeats while defenders
/// hold ("no decision yet"); a beaten attacker withdraws to where it
/// came from.
fn march(
    state: &mut GameState,
    id: ArmyId,
    from: Option<CityId>,
    dest: CityId,
) -> Result<(), CommandError> {
    let side = state.army(id)?.side;
    let owner = state.city(dest)?.owner;

    if owner == Some(side) {
        return arrive(state, id, dest);
    }

    loop {
        let defender = match state.army_in(dest) {
            Some(d) if state.army(d)?.side != side => Defender::Army(d),
            _ if state.city(dest)?.garrison > 0 => Defender::Garrison(dest),
            _ => {
                // Undefended: walk in
                return arrive(state, id, dest);
            }
        };

        let report = combat::battle(state, id, defender, dest)?;

        match report.winner {
            BattleWinner::Attacker => {
                // A winning column can still bleed out taking the
                // field; with nobody left to occupy the ground the
                // defender simply holds what remains.
                if !state.armies.contains_key(&id) {
                    return Ok(());
                }
                if let Defender::Army(d) = defender {
                    if state.armies.contains_key(&d) {
                        beaten_defender(state, d, dest, id)?;
                    }
                }
                // Loop again in case another force (a garrison behind
                // the army) still bars the gate
                if state.army_in(dest).is_none() && state.city(dest)?.garrison == 0 {
                    return arrive(state, id, dest);
                }
            }
            BattleWinner::Defender => {
                // Withdraw; a sharp defender may harry the column on
                // its way out
                if !state.armies.contains_key(&id) {
                    return Ok(());
                }
                let loser_strength = state.army(id)?.strength;
                let winner_strength = match defender {
                    Defender::Army(d) => state.army(d)?.strength,
                    Defender::Garrison(c) => state.city(c)?.garrison,
                };
                if combat::should_surrender(state, loser_strength, winner_strength) {
                    crush(state, id)?;
                    return Ok(());
                }
                if let Defender::Army(d) = defender {
                    let rating = state.army(d)?.commander.rating;
                    if rating as f64 > 11.0 * state.rng.next_f64() {
                        let pursuit = (loser_strength / 20).max(1);
                        state.log("The pursuit cuts into the retreating column".to_string());
                        if state.damage_army(id, pursuit)? {
                            return Ok(());
                        }
                    }
                }
                if let Some(origin) = from {
                    state.army_mut(id)?.location = ArmyLocation::InCity(origin);
                    state.army_mut(id)?.status = ArmyStatus::Retreating;
                } else {
                    crush(state, id)?;
                }
                return Ok(());
            }
        }
    }
}

/// Losing defender: retreat to the best friendly neighbor, or give up.
fn beaten_defender(
    state: &mut GameState,
    id: ArmyId,
    at: CityId,
    victor: ArmyId,
) -> Result<(), CommandError> {
    let side = state.army(id)?.side;
    let strength = state.army(id)?.strength;
    let victor_strength = state.army(victor)?.strength;

    if combat::should_surrender(state, strength, victor_strength) {
        crush(state, id)?;
        return Ok(());
    }

    match combat::retreat_destination(state, at, side) {
        Some(to) => {
            let penalty = (strength as f64 * state.config.retreat_penalty) as u32;
            if state.damage_army(id, penalty.max(1))? {
                return Ok(());
            }
            let to_name = state.city(to)?.name.clone();
            let name = state.army(id)?.commander.name.clone();
            {
                let a = state.army_mut(id)?;
                a.status = ArmyStatus::Retreating;
                a.orders = None;
            }
            // Retreating into a friendly column merges the two
            move_or_merge(state, id, to)?;
            state.log(format!("{name} falls back on {to_name}"));
            Ok(())
        }
        None => {
            crush(state, id)?;
            Ok(())
        }
    }
}

/// Army destroyed outright. The victor's cause takes the credit.
fn crush(state: &mut GameState, id: ArmyId) -> Result<(), CommandError> {
    let (side, strength, name) = {
        let a = state.army(id)?;
        (a.side, a.strength, a.commander.name.clone())
    };
    let vp = state.config.annihilation_vp;
    state.side_mut(side.opponent()).victory_points += vp;
    state.side_mut(side).casualties += strength as u64;
    state.armies.remove(&id);
    state.log(format!("{name}'s army surrenders; the command is lost"));
    Ok(())
}

/// Put an army in a city it is entitled to enter, capturing hostile
/// ground and merging with any friendly column already there.
pub fn arrive(state: &mut GameState, id: ArmyId, dest: CityId) -> Result<(), CommandError> {
    let side = state.army(id)?.side;
    if state.city(dest)?.owner != Some(side) {
        let had_fight = state.city(dest)?.garrison > 0;
        state.capture_city(dest, side)?;
        if had_fight {
            let c = state.city_mut(dest)?;
            c.fort_level = c.fort_level.saturating_sub(1);
        }
    }
    move_or_merge(state, id, dest)
}

/// At most one army per city per side: landing on a friendly column
/// combines the two under the better commander.
fn move_or_merge(state: &mut GameState, id: ArmyId, dest: CityId) -> Result<(), CommandError> {
    if let Some(other) = state.army_in(dest) {
        if other != id && state.army(other)?.side == state.army(id)?.side {
            return merge_armies(state, id, other);
        }
    }
    state.army_mut(id)?.location = ArmyLocation::InCity(dest);
    Ok(())
}

/// Fold `from` into `into`: pooled strength capped, the better
/// commander takes the combined command, experience blended pro-rata.
pub fn merge_armies(state: &mut GameState, from: ArmyId, into: ArmyId) -> Result<(), CommandError> {
    let cap = state.config.max_army_strength;
    let (from_strength, from_exp, from_supply, from_cmd) = {
        let a = state.army(from)?;
        (a.strength, a.experience, a.supply, a.commander.clone())
    };
    let (into_strength, into_exp, into_supply, into_cmd) = {
        let a = state.army(into)?;
        (a.strength, a.experience, a.supply, a.commander.clone())
    };

    let total = (from_strength + into_strength).min(cap);
    let exp = ((from_strength as u64 * from_exp as u64 + into_strength as u64 * into_exp as u64)
        / (from_strength + into_strength).max(1) as u64) as u8;
    let (winner_cmd, loser_cmd) = if from_cmd.rating > into_cmd.rating {
        (from_cmd, into_cmd)
    } else {
        (into_cmd, from_cmd)
    };

    let side = state.army(into)?.side;
    state.side_mut(side).commander_pool.push(loser_cmd);
    state
        .side_mut(side)
        .commander_pool
        .sort_by(|a, b| b.rating.cmp(&a.rating).then(a.name.cmp(&b.name)));

    {
        let a = state.army_mut(into)?;
        a.strength = total;
        a.experience = exp;
        a.supply = from_supply.max(into_supply).min(10);
        a.commander = winner_cmd;
    }
    state.armies.remove(&from);
    Ok(())
}
