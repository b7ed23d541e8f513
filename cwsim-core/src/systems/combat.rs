use crate::error::CommandError;
use crate::state::{ArmyId, CityId, GameState, SideId};

/// Garrison militia fight as if led by a plodding colonel.
const GARRISON_RATING: u8 = 3;
const GARRISON_EXPERIENCE: u8 = 2;

/// Who is standing in the contested city.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defender {
    Army(ArmyId),
    Garrison(CityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleWinner {
    Attacker,
    Defender,
}

#[derive(Debug, Clone)]
pub struct BattleReport {
    pub winner: BattleWinner,
    pub attacker_losses: u32,
    pub defender_losses: u32,
    pub defender_destroyed: bool,
}

struct Combatant {
    strength: u32,
    rating: u8,
    experience: u8,
    supply: u8,
}

/// Attacker battle score, per the field manual:
/// strength base capped by the rating ceiling, leadership and
/// experience when the army is big enough to maneuver, small armies
/// and starving armies at half effect, and a bonus or penalty for
/// the odds.
fn attack_score(cfg: &crate::config::SimConfig, us: &Combatant, them_strength: u32) -> f64 {
    let cap = cfg.combat_rating_cap;
    let mut x = (0.01 * us.strength as f64).min(cap);

    let ratio = us.strength as f64 / them_strength.max(1) as f64;
    if ratio > 0.2 {
        x += 0.3 * us.rating as f64 * 0.5 + 0.3 * us.experience as f64 * 0.5;
    }
    if us.experience > 8 {
        x += 1.0;
    }
    if us.strength < cfg.small_army_threshold {
        x /= 2.0;
    }

    if ratio > 10.0 {
        x = cap;
    } else if ratio > 3.0 {
        x += 2.0;
    } else if ratio <= 0.2 {
        x = 1.0;
    } else if ratio <= 0.5 {
        x = (x - 2.0).max(1.0);
    }

    if us.supply < 1 {
        x /= 2.0;
    }
    x.min(cap)
}

/// Defender battle score. Slightly better base than the attacker,
/// and the fortification multiplier on top.
fn defense_score(
    cfg: &crate::config::SimConfig,
    us: &Combatant,
    them_strength: u32,
    fort_level: u8,
) -> f64 {
    let cap = cfg.combat_rating_cap;
    let mut x1 = 0.013 * us.strength as f64 + 1.0;

    let ratio = us.strength as f64 / them_strength.max(1) as f64;
    if ratio > 0.2 {
        x1 += 0.3 * us.rating as f64 * 0.5 + 0.3 * us.experience as f64 * 0.5;
    }
    if us.experience > 8 {
        x1 += 1.0;
    }
    if us.strength < cfg.small_army_threshold {
        x1 /= 2.0;
    }

    // Odds from the defender's point of view
    let attacker_ratio = them_strength as f64 / us.strength.max(1) as f64;
    if attacker_ratio > 10.0 {
        x1 = cap;
    } else if attacker_ratio > 1.5 {
        x1 += 2.0;
    } else if attacker_ratio < 0.5 {
        x1 *= 0.8;
    }

    if us.supply < 1 {
        x1 /= 2.0;
    }
    x1 *= 1.0 + fort_level as f64;
    x1.min(cap * (1.0 + fort_level as f64))
}

/// The grapple: paired rolls against the two scores until exactly one
/// side lands a decision. A bounded number of indecisive rounds goes
/// to whoever is dug in.
fn grapple(state: &mut GameState, x: f64, x1: f64) -> BattleWinner {
    let scale = x.max(x1) + 1.0;
    for _ in 0..state.config.grapple_max_rounds {
        let star = scale * state.rng.next_f64();
        let fin = scale * state.rng.next_f64();
        let hit = star <= x;
        let hit1 = fin <= x1;
        match (hit, hit1) {
            (true, false) => return BattleWinner::Attacker,
            (false, true) => return BattleWinner::Defender,
            _ => continue,
        }
    }
    BattleWinner::Defender
}

fn combatant_from_army(state: &GameState, id: ArmyId) -> Result<Combatant, CommandError> {
    let a = state.army(id)?;
    Ok(Combatant {
        strength: a.strength,
        rating: a.commander.rating,
        experience: a.experience,
        supply: a.supply,
    })
}

/// Resolve one battle for a contested city. Casualties are applied and
/// experience awarded here; what happens to the loser (retreat,
/// surrender, withdrawal) is the caller's problem.
pub fn battle(
    state: &mut GameState,
    attacker: ArmyId,
    defender: Defender,
    city: CityId,
) -> Result<BattleReport, CommandError> {
    let atk = combatant_from_army(state, attacker)?;
    let def = match defender {
        Defender::Army(id) => combatant_from_army(state, id)?,
        Defender::Garrison(c) => Combatant {
            strength: state.city(c)?.garrison,
            rating: GARRISON_RATING,
            experience: GARRISON_EXPERIENCE,
            supply: 5,
        },
    };
    let fort_level = state.city(city)?.fort_level;
    let city_name = state.city(city)?.name.clone();
    let attacker_side = state.army(attacker)?.side;

    let cfg = state.config.clone();
    let x = attack_score(&cfg, &atk, def.strength);
    let x1 = defense_score(&cfg, &def, atk.strength, fort_level);
    let winner = grapple(state, x, x1);

    // Defender losses scale with the attacking mass, attacker losses
    // with the defending mass; fortifications shelter the defender and
    // bleed the attacker.
    let mut def_pct = 0.01 * cfg.defender_casualty_factor - 0.03 * fort_level as f64;
    if winner == BattleWinner::Attacker {
        def_pct *= 1.3;
    }
    let def_pct = def_pct.clamp(0.01, 0.9);

    let mut atk_pct = 0.01 * cfg.attacker_casualty_factor + 0.02 * fort_level as f64;
    if winner == BattleWinner::Defender {
        atk_pct *= 1.5;
    }
    let atk_pct = atk_pct.clamp(0.01, 0.9);

    let killd_raw = state
        .rng
        .normal(atk.strength as f64 * def_pct, atk.strength as f64 * def_pct * 0.3)
        .max(1.0);
    let killa_raw = state
        .rng
        .normal(def.strength as f64 * atk_pct, def.strength as f64 * atk_pct * 0.3)
        .max(1.0);

    // Cross-mix so a lopsided roll cannot produce absurd exchanges
    let mut killa = 0.8 * killa_raw + 0.2 * killd_raw;
    let mut killd = 0.8 * killd_raw + 0.2 * killa_raw;
    killa = killa.min(9.0 * killd);
    killd = killd.min(5.0 * killa);

    let attacker_losses = (killa as u32).clamp(1, atk.strength.saturating_sub(1).max(1));
    // The defender keeps a rump unless the caller decides otherwise
    let defender_losses = (killd as u32).clamp(1, def.strength.saturating_sub(1).max(1));

    state.log(format!(
        "Battle of {city_name}: attacker loses {attacker_losses}, defender loses {defender_losses}"
    ));

    state.damage_army(attacker, attacker_losses)?;
    let defender_destroyed = match defender {
        Defender::Army(id) => {
            let destroyed = state.damage_army(id, defender_losses)?;
            if !destroyed && winner == BattleWinner::Defender {
                let a = state.army_mut(id)?;
                a.experience = (a.experience + 1).min(10);
            }
            destroyed
        }
        Defender::Garrison(c) => {
            let g = &mut state.city_mut(c)?.garrison;
            *g = g.saturating_sub(defender_losses);
            *g == 0 && winner == BattleWinner::Attacker
        }
    };

    match winner {
        BattleWinner::Attacker => {
            state.side_mut(attacker_side).battles_won += 1;
            if let Ok(a) = state.army_mut(attacker) {
                a.experience = (a.experience + 1).min(10);
            }
        }
        BattleWinner::Defender => {
            state.side_mut(attacker_side.opponent()).battles_won += 1;
        }
    }

    Ok(BattleReport {
        winner,
        attacker_losses,
        defender_losses,
        defender_destroyed,
    })
}

/// A beaten army below this fraction of the victor's strength gives up
/// the fight rather than retreat.
pub fn should_surrender(state: &GameState, loser_strength: u32, winner_strength: u32) -> bool {
    (loser_strength as f64) < state.config.surrender_ratio * winner_strength as f64
}

/// Best adjacent friendly city to fall back on: highest value first,
/// lowest id to break ties. None means the army has nowhere to go.
pub fn retreat_destination(state: &GameState, from: CityId, side: SideId) -> Option<CityId> {
    let mut best: Option<(u32, CityId)> = None;
    for &n in state.rail.neighbors(from) {
        let Some(city) = state.cities.get(&n) else {
            continue;
        };
        if city.owner != Some(side) {
            continue;
        }
        let key = (city.victory_value, n);
        match best {
            Some((v, id)) if v > key.0 || (v == key.0 && id < key.1) => {}
            _ => best = Some(key),
        }
    }
    best.map(|(_, id)| id)
}

/// Raise a city's works one level. Any army present spends its turn
/// digging.
pub fn fortify(state: &mut GameState, side: SideId, city: CityId) -> Result<(), CommandError> {
    let (owner, fort_level, name) = {
        let c = state.city(city)?;
        (c.owner, c.fort_level, c.name.clone())
    };
    if owner != Some(side) {
        return Err(CommandError::NotYourCity { city, side });
    }
    if fort_level >= state.config.fort_max {
        return Err(CommandError::MaxFortification { city });
    }
    state.spend(side, state.config.fort_cost)?;
    state.city_mut(city)?.fort_level += 1;
    if let Some(army) = state.army_in(city) {
        if state.army(army)?.side == side {
            let a = state.army_mut(army)?;
            a.acted = true;
            a.orders = None;
        }
    }
    state.log(format!("{side} fortifies {name}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::GameStateBuilder;

    #[test]
    fn overwhelming_odds_cap_the_attacker_score() {
        let cfg = crate::config::SimConfig::default();
        let big = Combatant {
            strength: 1000,
            rating: 5,
            experience: 5,
            supply: 5,
        };
        let x = attack_score(&cfg, &big, 50);
        assert_eq!(x, cfg.combat_rating_cap);
    }

    #[test]
    fn hopeless_odds_floor_the_attacker_score() {
        let cfg = crate::config::SimConfig::default();
        let tiny = Combatant {
            strength: 100,
            rating: 9,
            experience: 9,
            supply: 5,
        };
        let x = attack_score(&cfg, &tiny, 1000);
        assert_eq!(x, 1.0);
    }

    #[test]
    fn starvation_halves_the_score() {
        let cfg = crate::config::SimConfig::default();
        let fed = Combatant {
            strength: 200,
            rating: 5,
            experience: 5,
            supply: 5,
        };
        let starving = Combatant {
            strength: 200,
            rating: 5,
            experience: 5,
            supply: 0,
        };
        assert!(attack_score(&cfg, &starving, 200) < attack_score(&cfg, &fed, 200));
    }

    #[test]
    fn forts_multiply_the_defense_score() {
        let cfg = crate::config::SimConfig::default();
        let def = Combatant {
            strength: 200,
            rating: 5,
            experience: 5,
            supply: 5,
        };
        let open = defense_score(&cfg, &def, 200, 0);
        let dug_in = defense_score(&cfg, &def, 200, 2);
        assert!(dug_in > 2.0 * open);
    }

    #[test]
    fn exhausted_grapple_goes_to_the_defender() {
        // Forced draw: both scores zero means every round is (false, false)
        let mut state = GameStateBuilder::new().seed(5).build();
        assert_eq!(grapple(&mut state, 0.0, 0.0), BattleWinner::Defender);
    }

    #[test]
    fn battle_bleeds_both_sides() {
        let builder = GameStateBuilder::new()
            .seed(11)
            .with_city(1, "Manassas", Some(SideId::South), 5, false)
            .with_army(SideId::South, 1, 200);
        let defender = builder.last_army();
        let builder = builder
            .with_city(2, "Washington", Some(SideId::North), 25, false)
            .with_link(1, 2)
            .with_army(SideId::North, 2, 220);
        let attacker = builder.last_army();
        let mut state = builder.build();

        let report = battle(&mut state, attacker, Defender::Army(defender), 1).unwrap();
        assert!(report.attacker_losses >= 1);
        assert!(report.defender_losses >= 1);
        let total: u32 = state.armies.values().map(|a| a.strength).sum();
        assert!(total < 420);
    }

    #[test]
    fn surrender_threshold_uses_config_ratio() {
        let state = GameStateBuilder::new().build();
        assert!(should_surrender(&state, 30, 200));
        assert!(!should_surrender(&state, 100, 200));
    }

    #[test]
    fn retreat_prefers_the_richest_friendly_city() {
        let state = GameStateBuilder::new()
            .with_city(1, "Nashville", Some(SideId::South), 15, false)
            .with_city(2, "Memphis", Some(SideId::South), 15, false)
            .with_city(3, "Chattanooga", Some(SideId::South), 20, false)
            .with_city(4, "Louisville", Some(SideId::North), 10, false)
            .with_link(1, 2)
            .with_link(1, 3)
            .with_link(1, 4)
            .build();
        assert_eq!(retreat_destination(&state, 1, SideId::South), Some(3));
    }

    #[test]
    fn no_friendly_neighbor_means_no_retreat() {
        let state = GameStateBuilder::new()
            .with_city(1, "Vicksburg", Some(SideId::South), 15, false)
            .with_city(2, "Memphis", Some(SideId::North), 15, false)
            .with_link(1, 2)
            .build();
        assert_eq!(retreat_destination(&state, 1, SideId::South), None);
    }

    #[test]
    fn fortify_charges_and_raises_level() {
        let mut state = GameStateBuilder::new()
            .with_city(1, "Richmond", Some(SideId::South), 30, false)
            .with_cash(SideId::South, 500)
            .build();
        fortify(&mut state, SideId::South, 1).unwrap();
        assert_eq!(state.city(1).unwrap().fort_level, 1);
        assert_eq!(state.side(SideId::South).cash, 300);
    }

    #[test]
    fn fortify_rejects_at_max_level() {
        let mut state = GameStateBuilder::new()
            .with_city(1, "Richmond", Some(SideId::South), 30, false)
            .with_fort(1, 2)
            .with_cash(SideId::South, 500)
            .build();
        let err = fortify(&mut state, SideId::South, 1).unwrap_err();
        assert_eq!(err, CommandError::MaxFortification { city: 1 });
        assert_eq!(state.side(SideId::South).cash, 500);
    }

    #[test]
    fn fortify_rejects_enemy_city() {
        let mut state = GameStateBuilder::new()
            .with_city(1, "Washington", Some(SideId::North), 25, false)
            .build();
        let err = fortify(&mut state, SideId::South, 1).unwrap_err();
        assert!(matches!(err, CommandError::NotYourCity { .. }));
    }
}
