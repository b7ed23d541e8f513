use crate::config::SimConfig;
use crate::map::RailNetwork;
use crate::rng::GameRng;
use crate::state::{
    Army, ArmyId, ArmyLocation, ArmyStatus, City, CityId, Commander, Date, Fleet, FleetLocation,
    GameState, SideId, SideState,
};
use std::collections::HashMap;

pub struct GameStateBuilder {
    state: GameState,
}

impl GameStateBuilder {
    pub fn new() -> Self {
        let mut sides = HashMap::new();
        for side in SideId::BOTH {
            sides.insert(
                side,
                SideState {
                    cash: 1000, // Default generous treasury for testing
                    income: 0,
                    victory_points: 0,
                    capital: None,
                    human: false,
                    fleet: Fleet {
                        location: FleetLocation::Port(0),
                        ships: Vec::new(),
                        orders: None,
                    },
                    commander_pool: Vec::new(),
                    battles_won: 0,
                    casualties: 0,
                    recruits_this_turn: 0,
                    raid_losses: 0,
                    events_fired: Vec::new(),
                },
            );
        }
        Self {
            state: GameState {
                date: Date::default(),
                start_date: Date::default(),
                rng_seed: 0,
                rng: GameRng::new(0),
                config: SimConfig::default(),
                rail: RailNetwork::new(),
                cities: HashMap::new(),
                armies: HashMap::new(),
                next_army_id: 1,
                sides,
                turn_log: Vec::new(),
            },
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.state.rng_seed = seed;
        self.state.rng = GameRng::new(seed);
        self
    }

    pub fn date(mut self, year: i32, month: u8) -> Self {
        self.state.date = Date::new(year, month);
        self
    }

    pub fn config(mut self, config: SimConfig) -> Self {
        self.state.config = config;
        self
    }

    pub fn with_city(
        mut self,
        id: CityId,
        name: &str,
        owner: Option<SideId>,
        value: u32,
        port: bool,
    ) -> Self {
        self.state.cities.insert(
            id,
            City {
                id,
                name: name.to_string(),
                x: id as i32,
                y: id as i32,
                owner,
                original_owner: owner,
                victory_value: value,
                fort_level: 0,
                is_port: port,
                garrison: 0,
            },
        );
        self
    }

    pub fn with_fort(mut self, city: CityId, level: u8) -> Self {
        if let Some(c) = self.state.cities.get_mut(&city) {
            c.fort_level = level;
        }
        self
    }

    pub fn with_link(mut self, a: CityId, b: CityId) -> Self {
        self.state.rail.link(a, b);
        self
    }

    pub fn with_capital(mut self, side: SideId, city: CityId) -> Self {
        self.state.side_mut(side).capital = Some(city);
        self
    }

    pub fn with_cash(mut self, side: SideId, cash: u32) -> Self {
        self.state.side_mut(side).cash = cash;
        self
    }

    /// Army with a middling commander, ready to act.
    pub fn with_army(mut self, side: SideId, city: CityId, strength: u32) -> Self {
        let id = self.state.next_army_id;
        self.state.next_army_id += 1;
        self.state.armies.insert(
            id,
            Army {
                id,
                side,
                location: ArmyLocation::InCity(city),
                strength,
                commander: Commander {
                    name: format!("General #{id}"),
                    rating: 5,
                },
                experience: 2,
                supply: 5,
                status: ArmyStatus::Active,
                orders: None,
                acted: false,
                cutoff_turns: 0,
            },
        );
        self
    }

    /// Id of the most recently added army.
    pub fn last_army(&self) -> ArmyId {
        self.state.next_army_id - 1
    }

    pub fn build(mut self) -> GameState {
        // An empty fleet starts with a placeholder berth; re-berth it
        // at a real held port so anything that later grants ships
        // leaves a consistent state behind.
        for side in SideId::BOTH {
            let stale = match self.state.sides[&side].fleet.location {
                FleetLocation::Port(c) => !self.state.cities.contains_key(&c),
                FleetLocation::HighSeas => false,
            };
            if stale {
                let port = self
                    .state
                    .cities
                    .values()
                    .filter(|c| c.is_port && c.owner == Some(side))
                    .map(|c| c.id)
                    .min();
                if let Some(p) = port {
                    let s = self.state.sides.get_mut(&side).expect("both sides present");
                    s.fleet.location = FleetLocation::Port(p);
                }
            }
        }
        self.state
    }
}

impl Default for GameStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
