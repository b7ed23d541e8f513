use crate::error::CommandError;
use crate::map::{self, blockaded};
use crate::state::{ArmyId, CityId, GameState, SideId};
use crate::systems::logistics;

/// Month-close bookkeeping: recompute each side's income from the
/// ground it holds, pay it into the treasury, settle commerce-raid
/// losses, and reset the per-turn recruiting counter.
pub fn run_income_tick(state: &mut GameState) {
    for side in SideId::BOTH {
        let mut income = state.controlled_value(side);
        if let Some(capital) = state.side(side).capital {
            if state.cities.get(&capital).and_then(|c| c.owner) == Some(side) {
                income += state.config.capital_income_bonus;
            }
        }
        let raided = state.side(side).raid_losses.min(income);
        if raided > 0 {
            state.log(format!(
                "Commerce raiders cost {side} {raided} in shipping this month"
            ));
        }
        income -= raided;

        let s = state.side_mut(side);
        s.income = income;
        s.raid_losses = 0;
        s.recruits_this_turn = 0;
        state.credit(side, income);
    }
}

/// Raise troops at a held city. A city cut off from the rail net can
/// only scrape together a third of the normal muster; a friendly army
/// already in the city absorbs the recruits instead of a new command
/// being formed.
pub fn recruit(state: &mut GameState, side: SideId, city: CityId) -> Result<(), CommandError> {
    let (owner, is_port, value, name) = {
        let c = state.city(city)?;
        (c.owner, c.is_port, c.victory_value, c.name.clone())
    };
    if owner != Some(side) {
        return Err(CommandError::NotYourCity { city, side });
    }
    if is_port && blockaded(state, city, side) {
        return Err(CommandError::IllegalDestination { from: city, to: city });
    }
    let cap = state.config.recruit_cap_per_turn;
    if state.side(side).recruits_this_turn >= cap {
        return Err(CommandError::RecruitCapReached { cap });
    }
    state.spend(side, state.config.recruit_cost)?;

    let mut strength =
        state.config.recruit_base_strength + state.config.recruit_city_value_scale * value;
    if !map::supplied_cities(state, side).contains(&city) {
        strength /= 3;
    }
    let mut supply = 3 + state.rng.below(5) as u8;
    if side == SideId::North {
        supply = (supply + 2).min(state.config.supply_max);
    }

    state.side_mut(side).recruits_this_turn += 1;

    match state.army_in(city) {
        Some(existing) if state.army(existing)?.side == side => {
            let max = state.config.max_army_strength;
            let a = state.army_mut(existing)?;
            a.strength = (a.strength + strength).min(max);
            let commander = a.commander.name.clone();
            state.log(format!("{strength} recruits march to reinforce {commander}"));
        }
        _ => {
            state.spawn_army(side, city, strength, supply);
            state.log(format!("{side} raises a new army of {strength} at {name}"));
        }
    }
    Ok(())
}

/// Buy an army's supply level back up to the field cap.
pub fn resupply(state: &mut GameState, side: SideId, army: ArmyId) -> Result<(), CommandError> {
    let (owner, supply, strength) = {
        let a = state.army(army)?;
        (a.side, a.supply, a.strength)
    };
    if owner != side {
        return Err(CommandError::NotYourArmy { army, side });
    }
    if state.army(army)?.status == crate::state::ArmyStatus::Cutoff {
        return Err(CommandError::ArmyCutOff { army });
    }
    let cap = state.config.supply_field_cap;
    if supply >= cap {
        return Ok(());
    }
    // The wagons ride the same rails the troop trains do
    let haul = logistics::supply_haul_levels(state, side, strength);
    if haul == 0 {
        let capacity = logistics::train_capacity(state, side);
        return Err(CommandError::OverRailCapacity { capacity });
    }
    let levels = (cap - supply).min(haul);
    let cost = (state.config.resupply_cost * strength as f64 * levels as f64).ceil() as u32;
    state.spend(side, cost)?;
    state.army_mut(army)?.supply = supply + levels;
    Ok(())
}

/// Hand an army to a commander from the reserve pool. The relieved
/// commander goes back in the pool; the shake-up costs the army an
/// experience level.
pub fn assign_commander(
    state: &mut GameState,
    side: SideId,
    army: ArmyId,
    commander: &str,
) -> Result<(), CommandError> {
    if state.army(army)?.side != side {
        return Err(CommandError::NotYourArmy { army, side });
    }
    let pool = &mut state.side_mut(side).commander_pool;
    let idx = pool
        .iter()
        .position(|c| c.name == commander)
        .ok_or_else(|| CommandError::NoSuchCommander(commander.to_string()))?;
    let incoming = pool.remove(idx);

    let outgoing = {
        let a = state.army_mut(army)?;
        let out = std::mem::replace(&mut a.commander, incoming);
        a.experience = a.experience.saturating_sub(1);
        out
    };
    let new_name = state.army(army)?.commander.name.clone();
    let pool = &mut state.side_mut(side).commander_pool;
    pool.push(outgoing);
    pool.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.name.cmp(&b.name)));
    state.log(format!("{new_name} takes over the army"));
    Ok(())
}

/// Spend the turn on the drill field. Green armies sharpen up, but no
/// commander can train troops past their own standard.
pub fn drill(state: &mut GameState, side: SideId, army: ArmyId) -> Result<(), CommandError> {
    let a = state.army(army)?;
    if a.side != side {
        return Err(CommandError::NotYourArmy { army, side });
    }
    if a.acted {
        return Err(CommandError::AlreadyActed(army));
    }
    let a = state.army_mut(army)?;
    if a.experience < 6 && a.experience < a.commander.rating {
        a.experience += 1;
    }
    a.acted = true;
    a.orders = None;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Commander;
    use crate::testing::GameStateBuilder;

    #[test]
    fn income_counts_held_ground_and_capital_bonus() {
        let mut state = GameStateBuilder::new()
            .with_city(1, "Washington", Some(SideId::North), 25, false)
            .with_city(2, "Baltimore", Some(SideId::North), 20, false)
            .with_capital(SideId::North, 1)
            .with_cash(SideId::North, 0)
            .build();
        run_income_tick(&mut state);
        let bonus = state.config.capital_income_bonus;
        assert_eq!(state.side(SideId::North).income, 45 + bonus);
        assert_eq!(state.side(SideId::North).cash, 45 + bonus);
    }

    #[test]
    fn raid_losses_come_out_of_income_once() {
        let mut state = GameStateBuilder::new()
            .with_city(1, "Charleston", Some(SideId::South), 20, false)
            .with_cash(SideId::South, 0)
            .build();
        state.side_mut(SideId::South).raid_losses = 5;
        run_income_tick(&mut state);
        assert_eq!(state.side(SideId::South).income, 15);
        assert_eq!(state.side(SideId::South).raid_losses, 0);
    }

    #[test]
    fn recruit_over_cap_is_rejected_cleanly() {
        let mut state = GameStateBuilder::new()
            .with_city(1, "Atlanta", Some(SideId::South), 25, false)
            .with_cash(SideId::South, 10_000)
            .build();
        let cap = state.config.recruit_cap_per_turn;
        for _ in 0..cap {
            recruit(&mut state, SideId::South, 1).unwrap();
        }
        let cash_before = state.side(SideId::South).cash;
        let armies_before = state.armies.len();

        let err = recruit(&mut state, SideId::South, 1).unwrap_err();
        assert_eq!(err, CommandError::RecruitCapReached { cap });
        // The rejection left everything untouched
        assert_eq!(state.side(SideId::South).cash, cash_before);
        assert_eq!(state.armies.len(), armies_before);
    }

    #[test]
    fn recruit_without_funds_is_rejected() {
        let mut state = GameStateBuilder::new()
            .with_city(1, "Atlanta", Some(SideId::South), 25, false)
            .with_cash(SideId::South, 10)
            .build();
        let err = recruit(&mut state, SideId::South, 1).unwrap_err();
        assert!(matches!(err, CommandError::InsufficientFunds { .. }));
        assert_eq!(state.side(SideId::South).cash, 10);
    }

    #[test]
    fn recruits_reinforce_an_army_already_in_the_city() {
        let builder = GameStateBuilder::new()
            .with_city(1, "Richmond", Some(SideId::South), 30, false)
            .with_cash(SideId::South, 1000)
            .with_army(SideId::South, 1, 100);
        let id = builder.last_army();
        let mut state = builder.build();
        recruit(&mut state, SideId::South, 1).unwrap();
        assert!(state.army(id).unwrap().strength > 100);
        assert_eq!(state.armies.len(), 1);
    }

    #[test]
    fn cutoff_city_raises_a_third_rate_muster() {
        // City 1 has a capital source; isolated city 2 has nothing
        let mut state = GameStateBuilder::new()
            .with_city(1, "Richmond", Some(SideId::South), 10, false)
            .with_city(2, "Knoxville", Some(SideId::South), 10, false)
            .with_capital(SideId::South, 1)
            .with_cash(SideId::South, 1000)
            .build();
        recruit(&mut state, SideId::South, 2).unwrap();
        let id = state.armies_of(SideId::South)[0];
        let full = state.config.recruit_base_strength
            + state.config.recruit_city_value_scale * 10;
        assert_eq!(state.army(id).unwrap().strength, full / 3);
    }

    #[test]
    fn resupply_refuses_a_cutoff_army() {
        let builder = GameStateBuilder::new()
            .with_city(1, "Vicksburg", Some(SideId::South), 15, false)
            .with_army(SideId::South, 1, 100);
        let id = builder.last_army();
        let mut state = builder.build();
        state.army_mut(id).unwrap().status = crate::state::ArmyStatus::Cutoff;
        let err = resupply(&mut state, SideId::South, id).unwrap_err();
        assert_eq!(err, CommandError::ArmyCutOff { army: id });
    }

    #[test]
    fn resupply_charges_by_strength_and_levels() {
        let builder = GameStateBuilder::new()
            .with_city(1, "Richmond", Some(SideId::South), 30, false)
            .with_cash(SideId::South, 1000)
            .with_army(SideId::South, 1, 200);
        let id = builder.last_army();
        let mut state = builder.build();
        state.army_mut(id).unwrap().supply = 1;
        resupply(&mut state, SideId::South, id).unwrap();
        assert_eq!(state.army(id).unwrap().supply, state.config.supply_field_cap);
        // 0.1 * 200 * 4 levels
        assert_eq!(state.side(SideId::South).cash, 1000 - 80);
    }

    #[test]
    fn resupply_is_throttled_by_the_rail_net() {
        let builder = GameStateBuilder::new()
            .with_city(1, "Richmond", Some(SideId::South), 30, false)
            .with_city(2, "Petersburg", Some(SideId::South), 10, false)
            .with_link(1, 2)
            .with_cash(SideId::South, 1000)
            .with_army(SideId::South, 1, 200);
        let field = builder.last_army();
        let builder = builder.with_army(SideId::South, 2, 60);
        let riders = builder.last_army();
        let mut state = builder.build();
        state.army_mut(field).unwrap().supply = 1;
        state.army_mut(riders).unwrap().location =
            crate::state::ArmyLocation::RailTransit { from: 2, to: 1 };

        // 60 men aboard the trains leave throughput for one level only
        resupply(&mut state, SideId::South, field).unwrap();
        assert_eq!(state.army(field).unwrap().supply, 2);
        assert_eq!(state.side(SideId::South).cash, 1000 - 20);

        // A full net hauls nothing at all
        state.army_mut(riders).unwrap().strength = 70;
        let err = resupply(&mut state, SideId::South, field).unwrap_err();
        assert_eq!(err, CommandError::OverRailCapacity { capacity: 70 });
    }

    #[test]
    fn commander_swap_goes_through_the_pool() {
        let builder = GameStateBuilder::new()
            .with_city(1, "Richmond", Some(SideId::South), 30, false)
            .with_army(SideId::South, 1, 100);
        let id = builder.last_army();
        let mut state = builder.build();
        state.side_mut(SideId::South).commander_pool.push(Commander {
            name: "Lee".to_string(),
            rating: 10,
        });
        state.army_mut(id).unwrap().experience = 4;

        assign_commander(&mut state, SideId::South, id, "Lee").unwrap();
        let a = state.army(id).unwrap();
        assert_eq!(a.commander.name, "Lee");
        assert_eq!(a.experience, 3);
        // The relieved commander is available again
        assert_eq!(state.side(SideId::South).commander_pool.len(), 1);
    }

    #[test]
    fn unknown_commander_is_rejected() {
        let builder = GameStateBuilder::new()
            .with_city(1, "Richmond", Some(SideId::South), 30, false)
            .with_army(SideId::South, 1, 100);
        let id = builder.last_army();
        let mut state = builder.build();
        let err = assign_commander(&mut state, SideId::South, id, "Napoleon").unwrap_err();
        assert!(matches!(err, CommandError::NoSuchCommander(_)));
    }

    #[test]
    fn drill_is_bounded_by_the_commander() {
        let builder = GameStateBuilder::new()
            .with_city(1, "Richmond", Some(SideId::South), 30, false)
            .with_army(SideId::South, 1, 100);
        let id = builder.last_army();
        let mut state = builder.build();
        state.army_mut(id).unwrap().experience = 5;
        state.army_mut(id).unwrap().commander.rating = 5;
        drill(&mut state, SideId::South, id).unwrap();
        // rating 5 commander cannot train past experience 5
        assert_eq!(state.army(id).unwrap().experience, 5);
        assert!(state.army(id).unwrap().acted);
    }
}
