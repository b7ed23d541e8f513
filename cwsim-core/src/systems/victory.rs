use crate::state::{GameState, SideId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryReason {
    /// The enemy seat of government has fallen.
    CapitalFallen,
    /// Enough of the map's worth is held outright.
    Territory,
    /// The enemy has no army left in the field.
    Annihilation,
    /// The strength ratio has become hopeless.
    ForceRatio,
    /// Time expired; the higher score takes the decision.
    TimeExpired,
}

/// Month-close victory check. North is examined first, so a state
/// that somehow satisfies both sides at once resolves the same way
/// every run.
pub fn check(state: &GameState) -> Option<(SideId, VictoryReason)> {
    let total = state.total_city_value() as f64;

    for side in SideId::BOTH {
        let enemy = side.opponent();

        if state.side(enemy).capital.is_none() {
            return Some((side, VictoryReason::CapitalFallen));
        }
        if state.controlled_value(side) as f64 >= state.config.victory_fraction * total {
            return Some((side, VictoryReason::Territory));
        }
        let enemy_strength = state.total_strength(enemy);
        if enemy_strength == 0 && state.date.months_since(state.start_date) > 0 {
            return Some((side, VictoryReason::Annihilation));
        }
        if enemy_strength > 0
            && state.total_strength(side) as f64
                > state.config.force_ratio_victory * enemy_strength as f64
        {
            return Some((side, VictoryReason::ForceRatio));
        }
    }

    if state.date.months_since(state.start_date) >= state.config.turn_limit_months as i32 {
        let north = state.side(SideId::North).victory_points;
        let south = state.side(SideId::South).victory_points;
        // A drawn war is a war the secession survived
        let winner = if north > south {
            SideId::North
        } else {
            SideId::South
        };
        return Some((winner, VictoryReason::TimeExpired));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Date;
    use crate::testing::GameStateBuilder;

    fn contested() -> GameStateBuilder {
        GameStateBuilder::new()
            .with_city(1, "Washington", Some(SideId::North), 25, false)
            .with_city(2, "Richmond", Some(SideId::South), 30, false)
            .with_capital(SideId::North, 1)
            .with_capital(SideId::South, 2)
            .with_army(SideId::North, 1, 100)
            .with_army(SideId::South, 2, 100)
    }

    #[test]
    fn no_winner_in_a_balanced_war() {
        let state = contested().build();
        assert_eq!(check(&state), None);
    }

    #[test]
    fn fallen_capital_ends_the_war() {
        let mut state = contested().build();
        state.side_mut(SideId::South).capital = None;
        assert_eq!(check(&state), Some((SideId::North, VictoryReason::CapitalFallen)));
    }

    #[test]
    fn territory_fraction_ends_the_war() {
        // North holds the full 55 points of map value. Both capitals
        // still stand, so the territory rule decides.
        let mut state = contested().build();
        state.city_mut(2).unwrap().owner = Some(SideId::North);
        let verdict = check(&state);
        assert_eq!(verdict, Some((SideId::North, VictoryReason::Territory)));
    }

    #[test]
    fn annihilation_needs_an_elapsed_month() {
        let mut state = contested().build();
        let ids = state.armies_of(SideId::South);
        for id in ids {
            state.armies.remove(&id);
        }
        assert_eq!(check(&state), None);
        state.date = Date::new(1861, 8);
        assert_eq!(check(&state), Some((SideId::North, VictoryReason::Annihilation)));
    }

    #[test]
    fn crushing_force_ratio_ends_the_war() {
        let mut state = contested().build();
        let id = state.armies_of(SideId::North)[0];
        state.army_mut(id).unwrap().strength = 100 * 7;
        assert_eq!(check(&state), Some((SideId::North, VictoryReason::ForceRatio)));
    }

    #[test]
    fn time_expiry_goes_to_the_higher_score() {
        let mut state = contested().build();
        state.date = Date::new(1866, 7);
        state.side_mut(SideId::North).victory_points = 400;
        state.side_mut(SideId::South).victory_points = 200;
        assert_eq!(check(&state), Some((SideId::North, VictoryReason::TimeExpired)));
    }

    #[test]
    fn a_drawn_score_at_the_limit_goes_to_the_south() {
        let mut state = contested().build();
        state.date = Date::new(1866, 7);
        state.side_mut(SideId::North).victory_points = 300;
        state.side_mut(SideId::South).victory_points = 300;
        assert_eq!(check(&state), Some((SideId::South, VictoryReason::TimeExpired)));
    }
}
