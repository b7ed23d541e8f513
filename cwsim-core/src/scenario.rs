//! The standard July 1861 campaign setup.
//!
//! Forty cities, the rail links between them, the opening armies and
//! fleets, and each side's commander roster.

use crate::config::SimConfig;
use crate::map::RailNetwork;
use crate::rng::GameRng;
use crate::state::{
    Army, ArmyLocation, ArmyStatus, City, CityId, Commander, Date, Fleet, FleetLocation,
    GameState, Ship, ShipKind, SideId, SideState,
};
use std::collections::HashMap;

const N: Option<SideId> = Some(SideId::North);
const S: Option<SideId> = Some(SideId::South);

/// id, x, y (y grows southward), name, owner, value, fort, port, links
#[allow(clippy::type_complexity)]
const CITIES: &[(CityId, i32, i32, &str, Option<SideId>, u32, u8, bool, &[CityId])] = &[
    (1, 74, 36, "Washington", N, 25, 1, true, &[2, 6, 39, 40]),
    (2, 76, 33, "Baltimore", N, 20, 0, true, &[1, 3, 6]),
    (3, 80, 30, "Philadelphia", N, 20, 0, true, &[2, 4, 6]),
    (4, 84, 26, "New York", N, 30, 0, true, &[3, 5, 8]),
    (5, 90, 20, "Boston", N, 20, 0, true, &[4]),
    (6, 72, 30, "Harrisburg", N, 10, 0, false, &[1, 2, 3, 7]),
    (7, 64, 29, "Pittsburgh", N, 15, 0, false, &[6, 8, 9, 16]),
    (8, 70, 20, "Buffalo", N, 10, 0, false, &[4, 7, 9]),
    (9, 58, 24, "Cleveland", N, 10, 0, false, &[7, 8, 10, 13]),
    (10, 54, 30, "Columbus", N, 10, 0, false, &[9, 11, 12, 16]),
    (11, 48, 34, "Cincinnati", N, 15, 0, false, &[10, 12, 15, 19]),
    (12, 42, 30, "Indianapolis", N, 10, 0, false, &[10, 11, 13, 15]),
    (13, 38, 22, "Chicago", N, 20, 0, false, &[9, 12, 14, 17]),
    (14, 30, 36, "St. Louis", N, 20, 0, false, &[13, 17, 18]),
    (15, 44, 40, "Louisville", N, 10, 0, false, &[11, 12, 19, 35]),
    (16, 60, 33, "Wheeling", N, 5, 0, false, &[7, 10]),
    (17, 34, 28, "Springfield", None, 5, 0, false, &[13, 14, 18]),
    (18, 32, 44, "Cairo", None, 5, 0, true, &[14, 17, 34]),
    (19, 48, 40, "Lexington", None, 5, 0, false, &[11, 15, 20, 35]),
    (20, 54, 48, "Knoxville", None, 5, 0, false, &[19, 24, 35, 36]),
    (21, 74, 44, "Richmond", S, 30, 1, false, &[22, 23, 39]),
    (22, 74, 47, "Petersburg", S, 10, 0, false, &[21, 23, 24]),
    (23, 78, 46, "Norfolk", S, 15, 0, true, &[21, 22]),
    (24, 70, 53, "Raleigh", S, 10, 0, false, &[20, 22, 25, 26]),
    (25, 72, 58, "Wilmington", S, 10, 0, true, &[24, 26]),
    (26, 64, 59, "Columbia", S, 10, 0, false, &[24, 25, 27, 29]),
    (27, 68, 62, "Charleston", S, 20, 0, true, &[26, 28]),
    (28, 64, 67, "Savannah", S, 15, 0, true, &[27, 29]),
    (29, 55, 63, "Atlanta", S, 25, 0, false, &[26, 28, 30, 36]),
    (30, 48, 68, "Montgomery", S, 15, 0, false, &[29, 31]),
    (31, 44, 74, "Mobile", S, 15, 0, true, &[30, 32]),
    (32, 34, 78, "New Orleans", S, 30, 0, true, &[31, 33, 38]),
    (33, 30, 66, "Vicksburg", S, 15, 1, true, &[32, 34, 37, 38]),
    (34, 32, 54, "Memphis", S, 15, 0, true, &[18, 33, 35, 37]),
    (35, 44, 50, "Nashville", S, 15, 0, false, &[15, 19, 20, 34, 36]),
    (36, 50, 55, "Chattanooga", S, 15, 0, false, &[20, 29, 35]),
    (37, 24, 58, "Little Rock", S, 10, 0, false, &[33, 34, 38]),
    (38, 22, 70, "Shreveport", S, 10, 0, false, &[32, 33, 37]),
    (39, 74, 40, "Fredericksburg", S, 5, 0, false, &[1, 21, 40]),
    (40, 72, 38, "Manassas", S, 5, 0, false, &[1, 39]),
];

/// name, rating, opening post (None = reserve pool)
const NORTH_COMMANDERS: &[(&str, u8, Option<CityId>)] = &[
    ("McDowell", 5, Some(1)),
    ("Patterson", 3, Some(6)),
    ("Fremont", 4, Some(14)),
    ("Buell", 5, Some(11)),
    ("McClellan", 6, None),
    ("Grant", 9, None),
    ("Sherman", 8, None),
    ("Thomas", 8, None),
    ("Meade", 7, None),
    ("Sheridan", 8, None),
    ("Rosecrans", 6, None),
    ("Hooker", 5, None),
    ("Burnside", 4, None),
    ("Pope", 4, None),
];

const SOUTH_COMMANDERS: &[(&str, u8, Option<CityId>)] = &[
    ("Beauregard", 7, Some(40)),
    ("J. Johnston", 7, Some(39)),
    ("A.S. Johnston", 7, Some(35)),
    ("Magruder", 5, Some(23)),
    ("Lee", 10, None),
    ("Jackson", 9, None),
    ("Longstreet", 8, None),
    ("Forrest", 9, None),
    ("Stuart", 7, None),
    ("Hardee", 6, None),
    ("Early", 6, None),
    ("Hood", 5, None),
    ("Bragg", 4, None),
    ("Pemberton", 4, None),
];

/// commander post city -> opening strength
fn opening_strength(side: SideId, city: CityId) -> u32 {
    match side {
        SideId::North => match city {
            1 => 350,
            6 => 180,
            14 => 200,
            11 => 150,
            _ => 100,
        },
        SideId::South => match city {
            40 => 220,
            39 => 120,
            35 => 200,
            23 => 100,
            _ => 100,
        },
    }
}

fn side_state(
    side: SideId,
    capital: CityId,
    human: bool,
    fleet: Fleet,
    roster: &[(&str, u8, Option<CityId>)],
) -> SideState {
    let mut pool: Vec<Commander> = roster
        .iter()
        .filter(|(_, _, post)| post.is_none())
        .map(|(name, rating, _)| Commander {
            name: (*name).to_string(),
            rating: *rating,
        })
        .collect();
    pool.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.name.cmp(&b.name)));
    SideState {
        cash: 0,
        income: 0,
        victory_points: 0,
        capital: Some(capital),
        human,
        fleet,
        commander_pool: pool,
        battles_won: 0,
        casualties: 0,
        recruits_this_turn: 0,
        raid_losses: 0,
        events_fired: Vec::new(),
    }
}

/// Build the standard campaign opening.
///
/// `human` marks which sides expect player orders; AI fills the rest.
pub fn standard_1861(seed: u64, config: SimConfig, human_north: bool, human_south: bool) -> GameState {
    let mut cities = HashMap::new();
    let mut rail = RailNetwork::new();

    for &(id, x, y, name, owner, value, fort, port, links) in CITIES {
        cities.insert(
            id,
            City {
                id,
                name: name.to_string(),
                x,
                y,
                owner,
                original_owner: owner,
                victory_value: value,
                fort_level: fort,
                is_port: port,
                garrison: 0,
            },
        );
        for &other in links {
            rail.link(id, other);
        }
    }

    let north_fleet = Fleet {
        location: FleetLocation::Port(2),
        ships: vec![
            Ship { kind: ShipKind::Wooden, integrity: 10 },
            Ship { kind: ShipKind::Wooden, integrity: 10 },
            Ship { kind: ShipKind::Wooden, integrity: 10 },
            Ship { kind: ShipKind::Wooden, integrity: 10 },
        ],
        orders: None,
    };
    let south_fleet = Fleet {
        location: FleetLocation::Port(27),
        ships: vec![
            Ship { kind: ShipKind::Wooden, integrity: 10 },
            Ship { kind: ShipKind::Wooden, integrity: 10 },
        ],
        orders: None,
    };

    let mut sides = HashMap::new();
    sides.insert(
        SideId::North,
        side_state(SideId::North, 1, human_north, north_fleet, NORTH_COMMANDERS),
    );
    sides.insert(
        SideId::South,
        side_state(SideId::South, 21, human_south, south_fleet, SOUTH_COMMANDERS),
    );

    let mut state = GameState {
        date: Date::default(),
        start_date: Date::default(),
        rng_seed: seed,
        rng: GameRng::new(seed),
        config,
        rail,
        cities,
        armies: HashMap::new(),
        next_army_id: 1,
        sides,
        turn_log: Vec::new(),
    };

    for (side, roster) in [
        (SideId::North, NORTH_COMMANDERS),
        (SideId::South, SOUTH_COMMANDERS),
    ] {
        for &(name, rating, post) in roster {
            let Some(city) = post else { continue };
            let id = state.next_army_id;
            state.next_army_id += 1;
            state.armies.insert(
                id,
                Army {
                    id,
                    side,
                    location: ArmyLocation::InCity(city),
                    strength: opening_strength(side, city),
                    commander: Commander {
                        name: name.to_string(),
                        rating,
                    },
                    experience: 2,
                    supply: 5,
                    status: ArmyStatus::Active,
                    orders: None,
                    acted: false,
                    cutoff_turns: 0,
                },
            );
        }
    }

    // Opening treasury: the value of everything you hold, plus a war chest
    for side in SideId::BOTH {
        let value = state.controlled_value(side);
        let income = value;
        let s = state.side_mut(side);
        s.cash = value + 100;
        s.income = income;
        s.victory_points = value as i64;
    }

    state
}
