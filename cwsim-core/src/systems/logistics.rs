use crate::map::{self, blockaded};
use crate::state::{ArmyLocation, ArmyStatus, GameState, SideId};

/// Monthly supply pass for both sides: recompute the cutoff set from
/// rail reachability, attrit the armies caught outside it, and apply
/// winter and blockade drains. Runs once at month close, after both
/// sides have moved.
pub fn run_supply_tick(state: &mut GameState) {
    for side in SideId::BOTH {
        let supplied = map::supplied_cities(state, side);
        let winter = state.config.winter_months.contains(&state.date.month);

        for id in state.armies_of(side) {
            let (location, strength) = {
                let a = &state.armies[&id];
                (a.location, a.strength)
            };

            // Columns aboard trains are supplied by definition; they
            // are riding the very network supply flows over.
            let city = match location {
                ArmyLocation::InCity(c) => c,
                ArmyLocation::RailTransit { .. } => {
                    let a = state.army_mut(id).expect("army listed");
                    a.status = ArmyStatus::Active;
                    a.cutoff_turns = 0;
                    continue;
                }
            };

            if supplied.contains(&city) {
                let a = state.army_mut(id).expect("army listed");
                a.status = ArmyStatus::Active;
                a.cutoff_turns = 0;
            } else {
                let name = {
                    let a = state.army_mut(id).expect("army listed");
                    a.status = ArmyStatus::Cutoff;
                    a.cutoff_turns += 1;
                    a.supply = a.supply.saturating_sub(1);
                    a.commander.name.clone()
                };
                let losses =
                    ((strength as f64 * state.config.cutoff_attrition) as u32).max(1);
                state.log(format!(
                    "{name}'s army is cut off and loses {losses} to attrition"
                ));
                if state
                    .damage_army(id, losses)
                    .expect("army listed")
                {
                    continue;
                }
            }

            let (is_port, port_blockaded) = match state.cities.get(&city) {
                Some(c) => (c.is_port, c.is_port && blockaded(state, city, side)),
                None => (false, false),
            };

            // Winter bites everyone the sea cannot reach
            if winter && !is_port {
                let a = state.army_mut(id).expect("army listed");
                a.supply = a.supply.saturating_sub(1);
            }
            // An enemy squadron off the harbor starves the garrison
            if port_blockaded {
                let a = state.army_mut(id).expect("army listed");
                a.supply = a.supply.saturating_sub(1);
            }

            // Quartermasters top supplies back up when the treasury
            // and the rail net allow it
            let (supply, status) = {
                let a = &state.armies[&id];
                (a.supply, a.status)
            };
            if status == ArmyStatus::Active && supply < state.config.supply_field_cap {
                let haul = supply_haul_levels(state, side, strength);
                let levels = (state.config.supply_field_cap - supply).min(haul);
                let cost =
                    (state.config.resupply_cost * strength as f64 * levels as f64) as u32;
                if levels > 0 && state.spend(side, cost).is_ok() {
                    state.army_mut(id).expect("army listed").supply = supply + levels;
                }
            }
        }
    }
}

/// Rail throughput for a side this turn: the base capacity flexed by
/// how much of its original network it still holds, never worse than
/// half nor better than double the base.
pub fn train_capacity(state: &GameState, side: SideId) -> u32 {
    let base = match side {
        SideId::North => state.config.north_rail_capacity,
        SideId::South => state.config.south_rail_capacity,
    };
    let original: i64 = state
        .cities
        .values()
        .filter(|c| c.original_owner == Some(side))
        .count() as i64;
    let held: i64 = state
        .cities
        .values()
        .filter(|c| c.owner == Some(side))
        .count() as i64;
    let flexed = base as i64 + 5 * (held - original);
    flexed.clamp(base as i64 / 2, base as i64 * 2) as u32
}

/// Men one capacity unit can keep in supplies for one level.
const SUPPLY_WAGON_MEN: u32 = 20;

/// Supply levels the railroads can still haul to an army this turn:
/// whatever throughput the boarded transits have left over, at one
/// capacity unit per level per wagon-load of men.
pub fn supply_haul_levels(state: &GameState, side: SideId, strength: u32) -> u8 {
    let capacity = train_capacity(state, side);
    let in_transit: u32 = state
        .armies
        .values()
        .filter(|a| a.side == side && matches!(a.location, ArmyLocation::RailTransit { .. }))
        .map(|a| a.strength)
        .sum();
    let remaining = capacity.saturating_sub(in_transit);
    let per_level = (strength / SUPPLY_WAGON_MEN).max(1);
    (remaining / per_level).min(u8::MAX as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::GameStateBuilder;

    fn cutoff_state() -> (GameState, crate::state::ArmyId) {
        // capital(1) - enemy(2) - army at friendly(3)
        let builder = GameStateBuilder::new()
            .with_city(1, "Richmond", Some(SideId::South), 30, false)
            .with_city(2, "Petersburg", Some(SideId::North), 10, false)
            .with_city(3, "Norfolk", Some(SideId::South), 15, false)
            .with_capital(SideId::South, 1)
            .with_link(1, 2)
            .with_link(2, 3)
            .with_army(SideId::South, 3, 100);
        let id = builder.last_army();
        (builder.build(), id)
    }

    #[test]
    fn unreachable_army_is_marked_cutoff_and_attrits() {
        let (mut state, id) = cutoff_state();
        run_supply_tick(&mut state);
        let a = state.army(id).unwrap();
        assert_eq!(a.status, ArmyStatus::Cutoff);
        assert_eq!(a.cutoff_turns, 1);
        // 10% of 100
        assert_eq!(a.strength, 90);
    }

    #[test]
    fn supply_tick_is_idempotent_on_the_cutoff_set() {
        let (mut state, id) = cutoff_state();
        run_supply_tick(&mut state);
        run_supply_tick(&mut state);
        let a = state.army(id).unwrap();
        assert_eq!(a.cutoff_turns, 2);
        // 100 -> 90 -> 81
        assert_eq!(a.strength, 81);
    }

    #[test]
    fn relieved_army_recovers() {
        let (mut state, id) = cutoff_state();
        run_supply_tick(&mut state);
        state.capture_city(2, SideId::South).unwrap();
        run_supply_tick(&mut state);
        let a = state.army(id).unwrap();
        assert_eq!(a.status, ArmyStatus::Active);
        assert_eq!(a.cutoff_turns, 0);
        assert_eq!(a.strength, 90);
    }

    #[test]
    fn supplied_army_tops_back_up_from_the_treasury() {
        let builder = GameStateBuilder::new()
            .with_city(1, "Washington", Some(SideId::North), 25, false)
            .with_capital(SideId::North, 1)
            .with_cash(SideId::North, 1000)
            .with_army(SideId::North, 1, 100);
        let id = builder.last_army();
        let mut state = builder.build();
        state.army_mut(id).unwrap().supply = 1;

        run_supply_tick(&mut state);
        let cap = state.config.supply_field_cap;
        assert_eq!(state.army(id).unwrap().supply, cap);
        assert!(state.side(SideId::North).cash < 1000);
    }

    #[test]
    fn quartermasters_are_bound_by_rail_throughput() {
        let builder = GameStateBuilder::new()
            .with_city(1, "Washington", Some(SideId::North), 25, false)
            .with_capital(SideId::North, 1)
            .with_cash(SideId::North, 1000)
            .with_army(SideId::North, 1, 100);
        let id = builder.last_army();
        let builder = builder.with_army(SideId::North, 1, 115);
        let riders = builder.last_army();
        let mut state = builder.build();
        state.army_mut(id).unwrap().supply = 1;
        state.army_mut(riders).unwrap().location =
            crate::state::ArmyLocation::RailTransit { from: 1, to: 1 };

        // The transit eats all but five capacity: one level hauled
        run_supply_tick(&mut state);
        assert_eq!(state.army(id).unwrap().supply, 2);
        assert_eq!(state.side(SideId::North).cash, 1000 - 10);
    }

    #[test]
    fn winter_drains_inland_armies() {
        let builder = GameStateBuilder::new()
            .date(1861, 12)
            .with_city(1, "Nashville", Some(SideId::South), 15, false)
            .with_capital(SideId::South, 1)
            .with_cash(SideId::South, 0)
            .with_army(SideId::South, 1, 100);
        let id = builder.last_army();
        let mut state = builder.build();

        run_supply_tick(&mut state);
        assert_eq!(state.army(id).unwrap().supply, 4);
    }

    #[test]
    fn capacity_flexes_with_city_control() {
        let mut builder = GameStateBuilder::new();
        for i in 1..=6u16 {
            builder = builder.with_city(i, "town", Some(SideId::South), 5, false);
        }
        let mut state = builder.build();
        let base = state.config.south_rail_capacity;
        assert_eq!(train_capacity(&state, SideId::South), base);

        // Losing ground chokes the net; conquest opens it up
        for i in 1..=6u16 {
            state.city_mut(i).unwrap().owner = Some(SideId::North);
        }
        assert_eq!(train_capacity(&state, SideId::South), base - 30);
        let north_base = state.config.north_rail_capacity;
        assert_eq!(train_capacity(&state, SideId::North), north_base + 30);
    }

    #[test]
    fn capacity_is_clamped_to_half_and_double() {
        let mut builder = GameStateBuilder::new();
        for i in 1..=40u16 {
            builder = builder.with_city(i, "town", Some(SideId::South), 5, false);
        }
        let mut state = builder.build();
        let base = state.config.south_rail_capacity;
        // South loses all forty original cities: floored at half
        for i in 1..=40u16 {
            state.city_mut(i).unwrap().owner = Some(SideId::North);
        }
        assert_eq!(train_capacity(&state, SideId::South), base / 2);
        // North gained forty: capped at double
        let north_base = state.config.north_rail_capacity;
        assert_eq!(train_capacity(&state, SideId::North), north_base * 2);
    }
}
