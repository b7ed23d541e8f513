use crate::config::SimConfig;
use crate::error::CommandError;
use crate::map::RailNetwork;
use crate::rng::GameRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A month in the war. Turns advance one month at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date {
    pub year: i32,
    pub month: u8, // 1-12
}

impl Date {
    pub fn new(year: i32, month: u8) -> Self {
        Self { year, month }
    }

    pub fn next_month(&self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    /// Whole months elapsed since `start` (0 for the same month).
    pub fn months_since(&self, start: Date) -> i32 {
        (self.year - start.year) * 12 + self.month as i32 - start.month as i32
    }

    fn month_name(&self) -> &'static str {
        match self.month {
            1 => "January",
            2 => "February",
            3 => "March",
            4 => "April",
            5 => "May",
            6 => "June",
            7 => "July",
            8 => "August",
            9 => "September",
            10 => "October",
            11 => "November",
            _ => "December",
        }
    }
}

impl Default for Date {
    fn default() -> Self {
        // First full month of the war
        Self::new(1861, 7)
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

pub type CityId = u16;
pub type ArmyId = u32;

/// One of the two belligerents. Neutral cities have no `SideId`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SideId {
    North,
    South,
}

impl SideId {
    pub fn opponent(&self) -> SideId {
        match self {
            SideId::North => SideId::South,
            SideId::South => SideId::North,
        }
    }

    pub const BOTH: [SideId; 2] = [SideId::North, SideId::South];
}

impl std::fmt::Display for SideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SideId::North => write!(f, "North"),
            SideId::South => write!(f, "South"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    /// Map coordinates, used only for AI direction heuristics.
    pub x: i32,
    pub y: i32,
    pub owner: Option<SideId>,
    /// Allegiance at the start of the war. Riot events can flip a
    /// recaptured city back toward its original loyalty.
    pub original_owner: Option<SideId>,
    /// Worth in victory points and monthly income.
    pub victory_value: u32,
    /// 0 (open) through the configured maximum (entrenched).
    pub fort_level: u8,
    pub is_port: bool,
    /// Militia strength holding the city when no army is present.
    /// Rail moves clipped by capacity leave their excess here.
    pub garrison: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commander {
    pub name: String,
    /// 1 (plodding) through 10 (brilliant).
    pub rating: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmyLocation {
    InCity(CityId),
    /// Aboard trains; lands at `to` when the next turn resolves.
    RailTransit { from: CityId, to: CityId },
}

/// Supply posture, recomputed every month by the logistics pass.
/// `Cutoff` is never player-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmyStatus {
    Active,
    Cutoff,
    Retreating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Army {
    pub id: ArmyId,
    pub side: SideId,
    pub location: ArmyLocation,
    /// Hundreds of men. Reaching 0 destroys the army.
    pub strength: u32,
    pub commander: Commander,
    /// 0-10, earned in battle and drill.
    pub experience: u8,
    /// 0-10 supply levels.
    pub supply: u8,
    pub status: ArmyStatus,
    /// Queued march order, executed in initiative order at resolution.
    pub orders: Option<CityId>,
    /// Set when the army spent its turn on something other than a march
    /// (fortifying, drilling, boarding a train).
    pub acted: bool,
    /// Consecutive full turns spent cut off, for attrition scaling.
    pub cutoff_turns: u32,
}

impl Army {
    pub fn city(&self) -> Option<CityId> {
        match self.location {
            ArmyLocation::InCity(c) => Some(c),
            ArmyLocation::RailTransit { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipKind {
    Wooden,
    Ironclad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub kind: ShipKind,
    /// Remaining hull. Damage persists between battles; only the
    /// repair action at a friendly port restores it. 0 means sunk.
    pub integrity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FleetLocation {
    Port(CityId),
    /// Commerce raiding station off the enemy coast.
    HighSeas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FleetDestination {
    Port(CityId),
    HighSeas,
}

/// Each side operates a single fleet, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
    pub location: FleetLocation,
    pub ships: Vec<Ship>,
    pub orders: Option<FleetDestination>,
}

impl Fleet {
    pub fn strength(&self) -> u32 {
        self.ships.iter().map(|s| s.integrity as u32).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideState {
    /// Treasury, thousands of dollars.
    pub cash: u32,
    /// Last computed monthly income.
    pub income: u32,
    pub victory_points: i64,
    pub capital: Option<CityId>,
    pub human: bool,
    pub fleet: Fleet,
    /// Unassigned commanders, best-rated first.
    pub commander_pool: Vec<Commander>,
    pub battles_won: u32,
    pub casualties: u64,
    /// Recruits raised this month, against the per-turn cap.
    pub recruits_this_turn: u32,
    /// Income skimmed by enemy commerce raiders last month.
    pub raid_losses: u32,
    /// One-shot political events already fired for this side.
    pub events_fired: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub date: Date,
    pub start_date: Date,
    pub rng_seed: u64,
    /// Current RNG (must be deterministic for replay).
    pub rng: GameRng,
    pub config: SimConfig,
    pub rail: RailNetwork,
    pub cities: HashMap<CityId, City>,
    pub armies: HashMap<ArmyId, Army>,
    pub next_army_id: ArmyId,
    pub sides: HashMap<SideId, SideState>,
    /// Ordered human-readable record of everything this turn did.
    pub turn_log: Vec<String>,
}

impl GameState {
    // --- Queries ---

    pub fn city(&self, id: CityId) -> Result<&City, CommandError> {
        self.cities.get(&id).ok_or(CommandError::NoSuchCity(id))
    }

    pub fn city_mut(&mut self, id: CityId) -> Result<&mut City, CommandError> {
        self.cities.get_mut(&id).ok_or(CommandError::NoSuchCity(id))
    }

    pub fn army(&self, id: ArmyId) -> Result<&Army, CommandError> {
        self.armies.get(&id).ok_or(CommandError::NoSuchArmy(id))
    }

    pub fn army_mut(&mut self, id: ArmyId) -> Result<&mut Army, CommandError> {
        self.armies.get_mut(&id).ok_or(CommandError::NoSuchArmy(id))
    }

    pub fn side(&self, id: SideId) -> &SideState {
        &self.sides[&id]
    }

    pub fn side_mut(&mut self, id: SideId) -> &mut SideState {
        self.sides.get_mut(&id).expect("both sides must exist")
    }

    /// Army ids of a side, sorted for deterministic iteration.
    pub fn armies_of(&self, side: SideId) -> Vec<ArmyId> {
        let mut ids: Vec<ArmyId> = self
            .armies
            .values()
            .filter(|a| a.side == side)
            .map(|a| a.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// The army standing in a city, if any. At most one per city.
    pub fn army_in(&self, city: CityId) -> Option<ArmyId> {
        let mut found: Option<ArmyId> = None;
        for a in self.armies.values() {
            if a.city() == Some(city) && found.map_or(true, |f| a.id < f) {
                found = Some(a.id);
            }
        }
        found
    }

    pub fn total_strength(&self, side: SideId) -> u32 {
        self.armies
            .values()
            .filter(|a| a.side == side)
            .map(|a| a.strength)
            .sum()
    }

    /// Victory value of all cities a side holds.
    pub fn controlled_value(&self, side: SideId) -> u32 {
        self.cities
            .values()
            .filter(|c| c.owner == Some(side))
            .map(|c| c.victory_value)
            .sum()
    }

    pub fn total_city_value(&self) -> u32 {
        self.cities.values().map(|c| c.victory_value).sum()
    }

    /// City ids sorted for deterministic iteration.
    pub fn city_ids(&self) -> Vec<CityId> {
        let mut ids: Vec<CityId> = self.cities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    // --- Mutations ---

    pub fn log(&mut self, line: String) {
        log::info!("{line}");
        self.turn_log.push(line);
    }

    /// Debit a treasury, rejecting without change if short.
    pub fn spend(&mut self, side: SideId, amount: u32) -> Result<(), CommandError> {
        let cash = self.side(side).cash;
        if cash < amount {
            return Err(CommandError::InsufficientFunds {
                required: amount,
                available: cash,
            });
        }
        self.side_mut(side).cash = cash - amount;
        Ok(())
    }

    /// Credit a treasury, clamped to the configured cap.
    pub fn credit(&mut self, side: SideId, amount: u32) {
        let cap = self.config.cash_cap;
        let s = self.side_mut(side);
        s.cash = (s.cash + amount).min(cap);
    }

    /// Flip a city to `side`, scoring victory points and handling
    /// capital falls. The only path by which ownership changes.
    pub fn capture_city(&mut self, city_id: CityId, side: SideId) -> Result<(), CommandError> {
        let (name, value, previous) = {
            let c = self.city(city_id)?;
            (c.name.clone(), c.victory_value, c.owner)
        };
        if previous == Some(side) {
            return Ok(());
        }

        {
            let c = self.city_mut(city_id)?;
            c.owner = Some(side);
            c.garrison = 0;
        }
        self.side_mut(side).victory_points += value as i64;

        let enemy = side.opponent();
        if self.side(enemy).capital == Some(city_id) {
            self.side_mut(side).victory_points += 100;
            self.side_mut(enemy).victory_points -= 100;
            self.side_mut(enemy).capital = None;
            self.log(format!("{side} has taken the enemy capital at {name}!"));
        } else {
            self.log(format!("{side} captures {name}"));
        }
        Ok(())
    }

    /// Inflict losses on an army, removing it at zero strength.
    /// Returns true if the army was destroyed.
    pub fn damage_army(&mut self, id: ArmyId, losses: u32) -> Result<bool, CommandError> {
        let (side, strength, name) = {
            let a = self.army(id)?;
            (a.side, a.strength, a.commander.name.clone())
        };
        let losses = losses.min(strength);
        self.side_mut(side).casualties += losses as u64;
        if losses >= strength {
            self.armies.remove(&id);
            self.log(format!("{name}'s army has been destroyed"));
            Ok(true)
        } else {
            self.army_mut(id)?.strength = strength - losses;
            Ok(false)
        }
    }

    /// New army at a city, drawing the best commander from the pool.
    pub fn spawn_army(&mut self, side: SideId, city: CityId, strength: u32, supply: u8) -> ArmyId {
        let id = self.next_army_id;
        self.next_army_id += 1;
        let commander = {
            let pool = &mut self.side_mut(side).commander_pool;
            if pool.is_empty() {
                Commander {
                    name: format!("Brigadier #{id}"),
                    rating: 3,
                }
            } else {
                pool.remove(0)
            }
        };
        self.armies.insert(
            id,
            Army {
                id,
                side,
                location: ArmyLocation::InCity(city),
                strength,
                commander,
                experience: 1,
                supply,
                status: ArmyStatus::Active,
                orders: None,
                acted: true,
                cutoff_turns: 0,
            },
        );
        id
    }

    pub fn advance_month(&mut self) {
        self.date = self.date.next_month();
    }

    /// Deterministic checksum over the whole state, for desync
    /// detection between replays. Identical states produce identical
    /// checksums; HashMap order never leaks in.
    pub fn checksum(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        self.date.hash(&mut hasher);
        self.rng.state().hash(&mut hasher);

        for side in SideId::BOTH {
            let s = self.side(side);
            side.hash(&mut hasher);
            s.cash.hash(&mut hasher);
            s.income.hash(&mut hasher);
            s.victory_points.hash(&mut hasher);
            s.capital.hash(&mut hasher);
            s.recruits_this_turn.hash(&mut hasher);
            s.raid_losses.hash(&mut hasher);
            for ship in &s.fleet.ships {
                ship.integrity.hash(&mut hasher);
                matches!(ship.kind, ShipKind::Ironclad).hash(&mut hasher);
            }
            match s.fleet.location {
                FleetLocation::Port(c) => c.hash(&mut hasher),
                FleetLocation::HighSeas => u16::MAX.hash(&mut hasher),
            }
        }

        for id in self.city_ids() {
            let c = &self.cities[&id];
            id.hash(&mut hasher);
            c.owner.hash(&mut hasher);
            c.fort_level.hash(&mut hasher);
            c.garrison.hash(&mut hasher);
        }

        let mut army_ids: Vec<ArmyId> = self.armies.keys().copied().collect();
        army_ids.sort_unstable();
        for id in army_ids {
            let a = &self.armies[&id];
            id.hash(&mut hasher);
            a.side.hash(&mut hasher);
            a.strength.hash(&mut hasher);
            a.supply.hash(&mut hasher);
            a.experience.hash(&mut hasher);
            match a.location {
                ArmyLocation::InCity(c) => c.hash(&mut hasher),
                ArmyLocation::RailTransit { from, to } => {
                    from.hash(&mut hasher);
                    to.hash(&mut hasher);
                }
            }
        }

        hasher.finish()
    }
}
