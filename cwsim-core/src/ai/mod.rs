//! AI opponents.
//!
//! An [`AiPlayer`] sees the world through a [`VisibleState`] and a
//! list of currently legal commands, and answers with a command batch
//! for the turn. Implementations must be deterministic for a given
//! seed so replays and lockstep play hold together.

pub mod strategist;

use crate::command::Command;
use crate::state::{ArmyStatus, FleetDestination, GameState, SideId};
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;

pub use strategist::Strategist;

/// What one side can see when planning. The campaign is played on an
/// open map, so this is a filtered window only in the sense that the
/// planner is told whose turn it is.
pub struct VisibleState<'a> {
    pub side: SideId,
    pub game: &'a GameState,
}

impl<'a> VisibleState<'a> {
    pub fn new(game: &'a GameState, side: SideId) -> Self {
        Self { side, game }
    }
}

/// Commands a side could legally issue right now. Deterministic order:
/// armies ascending, cities ascending within each army.
pub fn legal_commands(view: &VisibleState) -> Vec<Command> {
    let g = view.game;
    let side = view.side;
    let mut out = Vec::new();

    for id in g.armies_of(side) {
        let army = &g.armies[&id];
        if army.acted {
            continue;
        }
        let Some(at) = army.city() else { continue };
        for &to in g.rail.neighbors(at) {
            let Some(city) = g.cities.get(&to) else {
                continue;
            };
            let hostile = city.owner != Some(side);
            if hostile && g.config.winter_campaign_ban && g.date.month == 1 {
                continue;
            }
            out.push(Command::Move { army: id, to });
        }
        if army.status != ArmyStatus::Cutoff && army.supply < g.config.supply_field_cap {
            out.push(Command::Resupply { army: id });
        }
        if army.experience < 6 && army.experience < army.commander.rating {
            out.push(Command::Drill { army: id });
        }
    }

    let cash = g.side(side).cash;
    for id in g.city_ids() {
        let city = &g.cities[&id];
        if city.owner != Some(side) {
            continue;
        }
        if city.fort_level < g.config.fort_max && cash >= g.config.fort_cost {
            out.push(Command::Fortify { city: id });
        }
        if g.side(side).recruits_this_turn < g.config.recruit_cap_per_turn
            && cash >= g.config.recruit_cost
        {
            out.push(Command::Recruit { city: id });
        }
    }

    if !g.side(side).fleet.is_empty() {
        for id in g.city_ids() {
            if g.cities[&id].is_port {
                out.push(Command::MoveFleet {
                    to: FleetDestination::Port(id),
                });
            }
        }
        out.push(Command::MoveFleet {
            to: FleetDestination::HighSeas,
        });
    }

    out
}

/// AI decision-making trait.
pub trait AiPlayer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce this side's command batch for the turn. May be empty
    /// to pass.
    fn plan_turn(&mut self, view: &VisibleState) -> Vec<Command>;
}

/// Random AI for exploration and soak testing: picks a handful of
/// legal commands at random.
pub struct RandomAi {
    rng: rand::rngs::StdRng,
}

impl RandomAi {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }
}

impl AiPlayer for RandomAi {
    fn name(&self) -> &'static str {
        "RandomAi"
    }

    fn plan_turn(&mut self, view: &VisibleState) -> Vec<Command> {
        let available = legal_commands(view);
        if available.is_empty() {
            return vec![];
        }
        let picks = self.rng.gen_range(0..=3usize.min(available.len()));
        available
            .choose_multiple(&mut self.rng, picks)
            .cloned()
            .collect()
    }
}
