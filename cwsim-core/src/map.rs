use crate::state::{CityId, FleetLocation, GameState, SideId};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Undirected rail adjacency over the city graph. The network itself
/// never changes during a war; what changes is who holds the cities
/// along a route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RailNetwork {
    links: HashMap<CityId, Vec<CityId>>,
}

impl RailNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an undirected link. Idempotent.
    pub fn link(&mut self, a: CityId, b: CityId) {
        let fwd = self.links.entry(a).or_default();
        if !fwd.contains(&b) {
            fwd.push(b);
            fwd.sort_unstable();
        }
        let rev = self.links.entry(b).or_default();
        if !rev.contains(&a) {
            rev.push(a);
            rev.sort_unstable();
        }
    }

    /// Neighbors in ascending id order.
    pub fn neighbors(&self, city: CityId) -> &[CityId] {
        self.links.get(&city).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn linked(&self, a: CityId, b: CityId) -> bool {
        self.neighbors(a).contains(&b)
    }
}

/// Whether an enemy fleet is sitting at this port.
pub fn blockaded(state: &GameState, city: CityId, owner: SideId) -> bool {
    let enemy = owner.opponent();
    let fleet = &state.side(enemy).fleet;
    !fleet.is_empty() && fleet.location == FleetLocation::Port(city)
}

/// The set of cities a side can supply.
///
/// Fixed-point reachability: breadth-first search from the side's
/// supply sources (its capital, its fortified cities, and its
/// unblockaded ports) expanding only through friendly-held cities.
/// Independent of iteration order, so running it twice in a turn
/// yields the same cut.
pub fn supplied_cities(state: &GameState, side: SideId) -> FxHashSet<CityId> {
    let mut reached: FxHashSet<CityId> = FxHashSet::default();
    let mut frontier: VecDeque<CityId> = VecDeque::new();

    for id in state.city_ids() {
        let city = &state.cities[&id];
        if city.owner != Some(side) {
            continue;
        }
        let is_source = state.side(side).capital == Some(id)
            || city.fort_level > 0
            || (city.is_port && !blockaded(state, id, side));
        if is_source {
            reached.insert(id);
            frontier.push_back(id);
        }
    }

    while let Some(at) = frontier.pop_front() {
        for &next in state.rail.neighbors(at) {
            if reached.contains(&next) {
                continue;
            }
            let Some(city) = state.cities.get(&next) else {
                continue;
            };
            if city.owner == Some(side) {
                reached.insert(next);
                frontier.push_back(next);
            }
        }
    }

    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Ship, ShipKind};
    use crate::testing::GameStateBuilder;

    #[test]
    fn links_are_undirected_and_sorted() {
        let mut net = RailNetwork::new();
        net.link(3, 1);
        net.link(3, 2);
        net.link(3, 2);
        assert_eq!(net.neighbors(3), &[1, 2]);
        assert!(net.linked(1, 3));
        assert_eq!(net.neighbors(9), &[] as &[CityId]);
    }

    #[test]
    fn capital_chain_is_supplied() {
        // capital(1) - 2 - 3, all friendly
        let state = GameStateBuilder::new()
            .with_city(1, "Washington", Some(SideId::North), 25, false)
            .with_city(2, "Harrisburg", Some(SideId::North), 10, false)
            .with_city(3, "Pittsburgh", Some(SideId::North), 15, false)
            .with_capital(SideId::North, 1)
            .with_link(1, 2)
            .with_link(2, 3)
            .build();
        let supplied = supplied_cities(&state, SideId::North);
        assert!(supplied.contains(&1));
        assert!(supplied.contains(&2));
        assert!(supplied.contains(&3));
    }

    #[test]
    fn enemy_city_breaks_the_chain() {
        // capital(1) - enemy(2) - friendly(3): 3 is cut off
        let state = GameStateBuilder::new()
            .with_city(1, "Washington", Some(SideId::North), 25, false)
            .with_city(2, "Manassas", Some(SideId::South), 5, false)
            .with_city(3, "Lexington", Some(SideId::North), 5, false)
            .with_capital(SideId::North, 1)
            .with_link(1, 2)
            .with_link(2, 3)
            .build();
        let supplied = supplied_cities(&state, SideId::North);
        assert!(supplied.contains(&1));
        assert!(!supplied.contains(&3));
    }

    #[test]
    fn unblockaded_port_is_its_own_source() {
        let state = GameStateBuilder::new()
            .with_city(1, "Washington", Some(SideId::North), 25, false)
            .with_city(9, "New Orleans", Some(SideId::North), 30, true)
            .with_capital(SideId::North, 1)
            .build();
        // No rail to the capital at all, but it has the sea.
        let supplied = supplied_cities(&state, SideId::North);
        assert!(supplied.contains(&9));
    }

    #[test]
    fn blockade_silences_a_port_source() {
        let mut state = GameStateBuilder::new()
            .with_city(1, "Richmond", Some(SideId::South), 30, false)
            .with_city(9, "Charleston", Some(SideId::South), 20, true)
            .with_capital(SideId::South, 1)
            .build();
        state.side_mut(SideId::North).fleet.location = FleetLocation::Port(9);
        state.side_mut(SideId::North).fleet.ships.push(Ship {
            kind: ShipKind::Wooden,
            integrity: 10,
        });
        let supplied = supplied_cities(&state, SideId::South);
        assert!(!supplied.contains(&9));
    }
}
