//! Scripted campaign strategist.
//!
//! Pure scoring over the visible state: every candidate command gets a
//! tiered integer score and the best positive score per army wins.
//! Priorities, highest first: hold the capital, relieve cut-off
//! armies, press attacks with good odds, grab undefended ground, then
//! drill whoever is idle.

use super::{AiPlayer, VisibleState};
use crate::command::Command;
use crate::map;
use crate::state::{ArmyStatus, CityId, FleetDestination, FleetLocation, GameState, ShipKind, SideId};

const DEFEND_CAPITAL: i32 = 10_000;
const RELIEVE_CUTOFF: i32 = 8_000;
const PRESS_ATTACK: i32 = 2_000;
const OPPORTUNIST: i32 = 1_500;
const EVEN_ATTACK: i32 = 500;

/// Cash kept back so a lost city or a raid does not bankrupt the side.
const RESERVE: u32 = 150;

#[derive(Default)]
pub struct Strategist;

impl Strategist {
    pub fn new() -> Self {
        Self
    }

    /// Score a march by `army` into `dest`. Negative means worse than
    /// standing still.
    fn score_move(&self, view: &VisibleState, army: crate::state::ArmyId, dest: CityId) -> i32 {
        let g = view.game;
        let side = view.side;
        let us = &g.armies[&army];
        let Some(city) = g.cities.get(&dest) else {
            return i32::MIN;
        };

        if city.owner == Some(side) {
            // Friendly ground is only worth marching to in an emergency.
            let capital = g.side(side).capital;
            if capital == Some(dest) && capital_threatened(g, side) {
                return DEFEND_CAPITAL;
            }
            if us.status == ArmyStatus::Cutoff
                && map::supplied_cities(g, side).contains(&dest)
            {
                return RELIEVE_CUTOFF;
            }
            return i32::MIN;
        }

        let defence = defending_strength(g, side, dest);
        let mut score = if defence == 0 {
            OPPORTUNIST
        } else {
            let fort_mult = 1.0 + f64::from(city.fort_level);
            let odds = f64::from(us.strength) / (fort_mult * f64::from(defence));
            if odds >= 2.0 {
                PRESS_ATTACK
            } else if odds >= 1.0 {
                EVEN_ATTACK
            } else {
                return -1_000;
            }
        };

        score += city.victory_value as i32 * 3 + i32::from(city.fort_level) * 4;

        // One hop of lookahead: ground that opens more enemy ground is
        // worth more than a dead end.
        for &beyond in g.rail.neighbors(dest) {
            if let Some(next) = g.cities.get(&beyond) {
                if next.owner != Some(side) {
                    score += next.victory_value as i32;
                }
            }
        }

        if us.supply < 1 {
            score -= 400;
        }
        score
    }

    fn plan_fleet(&self, view: &VisibleState, out: &mut Vec<Command>) {
        let g = view.game;
        let side = view.side;
        let fleet = &g.side(side).fleet;
        let cash = g.side(side).cash;

        if fleet.is_empty() {
            if cash >= g.config.wooden_ship_cost + RESERVE {
                if let Some(port) = best_own_port(g, side) {
                    out.push(Command::BuildShip {
                        port,
                        kind: ShipKind::Wooden,
                    });
                }
            }
            return;
        }

        let hurt = fleet.ships.iter().any(|s| {
            s.integrity
                < match s.kind {
                    ShipKind::Wooden => g.config.wooden_integrity,
                    ShipKind::Ironclad => g.config.ironclad_integrity,
                }
        });
        match fleet.location {
            FleetLocation::Port(here) => {
                let friendly = g.cities.get(&here).map(|c| c.owner) == Some(Some(side));
                if friendly && hurt {
                    out.push(Command::RepairFleet);
                    return;
                }
                if !friendly {
                    if let Some(city) = g.cities.get(&here) {
                        if city.owner == Some(side.opponent()) {
                            out.push(Command::Bombard { city: here });
                            return;
                        }
                    }
                }
                if let Some(target) = best_enemy_port(g, side) {
                    if fleet.strength() > g.side(side.opponent()).fleet.strength() {
                        out.push(Command::MoveFleet {
                            to: FleetDestination::Port(target),
                        });
                        return;
                    }
                }
                if side == SideId::South {
                    // Commerce raiding is the weaker navy's trade.
                    out.push(Command::MoveFleet {
                        to: FleetDestination::HighSeas,
                    });
                }
            }
            FleetLocation::HighSeas => {
                if hurt {
                    if let Some(port) = best_own_port(g, side) {
                        out.push(Command::MoveFleet {
                            to: FleetDestination::Port(port),
                        });
                    }
                }
            }
        }
    }
}

impl AiPlayer for Strategist {
    fn name(&self) -> &'static str {
        "Strategist"
    }

    fn plan_turn(&mut self, view: &VisibleState) -> Vec<Command> {
        let g = view.game;
        let side = view.side;
        let mut out = Vec::new();
        let mut cash = g.side(side).cash;

        // Armies running on empty wagons come first; the order simply
        // bounces if the treasury cannot cover it.
        for id in g.armies_of(side) {
            let army = &g.armies[&id];
            if army.status != ArmyStatus::Cutoff && army.supply < 2 {
                out.push(Command::Resupply { army: id });
            }
        }

        // Dig in at a threatened capital before spending on anything else.
        if let Some(capital) = g.side(side).capital {
            let city = &g.cities[&capital];
            if capital_threatened(g, side)
                && city.fort_level < g.config.fort_max
                && cash >= g.config.fort_cost + RESERVE
            {
                out.push(Command::Fortify { city: capital });
                cash -= g.config.fort_cost;
            }
        }

        let armies = g.armies_of(side);
        let enemy_armies = g.armies_of(side.opponent()).len();
        let mut recruits = 0;
        while armies.len() + recruits < enemy_armies + 2
            && recruits < g.config.recruit_cap_per_turn as usize
            && cash >= g.config.recruit_cost + RESERVE
        {
            let Some(town) = best_recruiting_ground(g, side) else {
                break;
            };
            out.push(Command::Recruit { city: town });
            cash -= g.config.recruit_cost;
            recruits += 1;
        }

        self.plan_fleet(view, &mut out);

        let ban = g.config.winter_campaign_ban && g.date.month == 1;
        for id in armies {
            if g.armies[&id].acted {
                continue;
            }
            let Some(at) = g.armies[&id].city() else {
                continue;
            };
            let mut best: Option<(i32, CityId)> = None;
            for &dest in g.rail.neighbors(at) {
                let hostile = g.cities.get(&dest).map(|c| c.owner) != Some(Some(side));
                if hostile && ban {
                    continue;
                }
                let score = self.score_move(view, id, dest);
                if score > 0 && best.map_or(true, |(b, _)| score > b) {
                    best = Some((score, dest));
                }
            }
            if let Some((_, dest)) = best {
                out.push(Command::Move { army: id, to: dest });
            } else if g.armies[&id].experience < 6
                && g.armies[&id].experience < g.armies[&id].commander.rating
            {
                out.push(Command::Drill { army: id });
            }
        }

        out
    }
}

/// Strength an attacker would face at `city`: the enemy army there, or
/// the garrison behind its walls.
fn defending_strength(g: &GameState, side: SideId, city: CityId) -> u32 {
    if let Some(occupant) = g.army_in(city) {
        if g.armies[&occupant].side != side {
            return g.armies[&occupant].strength;
        }
    }
    g.cities[&city].garrison
}

/// An enemy army one march from the capital counts as a threat.
fn capital_threatened(g: &GameState, side: SideId) -> bool {
    let Some(capital) = g.side(side).capital else {
        return false;
    };
    g.rail
        .neighbors(capital)
        .iter()
        .any(|&n| {
            g.army_in(n)
                .is_some_and(|id| g.armies[&id].side != side)
        })
}

/// Highest-value held city that is still in supply; recruits raised
/// out of supply arrive at a third of their strength.
fn best_recruiting_ground(g: &GameState, side: SideId) -> Option<CityId> {
    let supplied = map::supplied_cities(g, side);
    g.city_ids()
        .into_iter()
        .filter(|id| g.cities[id].owner == Some(side) && supplied.contains(id))
        .max_by_key(|id| (g.cities[id].victory_value, std::cmp::Reverse(*id)))
}

fn best_own_port(g: &GameState, side: SideId) -> Option<CityId> {
    g.city_ids()
        .into_iter()
        .filter(|id| {
            let c = &g.cities[id];
            c.is_port && c.owner == Some(side) && !map::blockaded(g, *id, side)
        })
        .max_by_key(|id| (g.cities[id].victory_value, std::cmp::Reverse(*id)))
}

fn best_enemy_port(g: &GameState, side: SideId) -> Option<CityId> {
    g.city_ids()
        .into_iter()
        .filter(|id| {
            let c = &g.cities[id];
            c.is_port && c.owner == Some(side.opponent())
        })
        .max_by_key(|id| (g.cities[id].victory_value, std::cmp::Reverse(*id)))
}
