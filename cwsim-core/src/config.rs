use serde::{Deserialize, Serialize};

/// Simulation configuration.
///
/// Every tunable threshold lives here with its 1861-campaign default.
/// Army strengths are in hundreds of men (a strength of 70 is a
/// 7,000-man army); money is in thousands of dollars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    // --- Logistics ---
    /// Fraction of strength lost per full turn spent cut off.
    pub cutoff_attrition: f64,
    /// Maximum supply level an army can carry.
    pub supply_max: u8,
    /// Supply level auto-resupply tops up to each month.
    pub supply_field_cap: u8,
    /// Cost per strength-point-supply-level of resupply.
    pub resupply_cost: f64,
    /// Months in which non-port armies burn an extra supply level.
    pub winter_months: [u8; 3],
    /// Base rail throughput (strength per turn) per side.
    pub north_rail_capacity: u32,
    pub south_rail_capacity: u32,

    // --- Combat ---
    /// Cap on any single battle score.
    pub combat_rating_cap: f64,
    /// Attacker base casualty percentage factor.
    pub attacker_casualty_factor: f64,
    /// Defender base casualty percentage factor.
    pub defender_casualty_factor: f64,
    /// Armies below this strength fight at half effect.
    pub small_army_threshold: u32,
    /// Paired-roll rounds before a battle defaults to the defender.
    pub grapple_max_rounds: u32,
    /// Loser may surrender below this fraction of the winner's strength.
    pub surrender_ratio: f64,
    /// Strength fraction lost on retreat.
    pub retreat_penalty: f64,
    /// Victory points for destroying an army outright.
    pub annihilation_vp: i64,
    /// No new attack orders may be issued in January.
    pub winter_campaign_ban: bool,

    // --- Fortification ---
    pub fort_cost: u32,
    pub fort_max: u8,

    // --- Economy ---
    pub recruit_cost: u32,
    pub recruit_cap_per_turn: u32,
    /// New army strength = base + value scaling of the recruiting city.
    pub recruit_base_strength: u32,
    pub recruit_city_value_scale: u32,
    pub max_army_strength: u32,
    pub capital_income_bonus: u32,
    pub cash_cap: u32,

    // --- Naval ---
    pub wooden_ship_cost: u32,
    pub ironclad_cost: u32,
    pub ironclad_available_year: i32,
    pub fleet_cap: usize,
    pub wooden_integrity: u8,
    pub ironclad_integrity: u8,
    pub repair_cost_per_point: u32,
    /// Largest fraction of enemy income a commerce raider can skim.
    pub raid_income_cap: f64,
    /// Strength of the army a naval invasion puts ashore.
    pub invasion_strength: u32,

    // --- Events ---
    /// Per-war-year growth of the monthly event probability.
    pub event_chance_per_year: f64,
    pub event_chance_cap: f64,

    // --- Victory ---
    /// Fraction of total city victory value that wins outright.
    pub victory_fraction: f64,
    /// Months from the July 1861 start until time expires.
    pub turn_limit_months: u32,
    /// Total-strength ratio that ends the war on its own.
    pub force_ratio_victory: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cutoff_attrition: 0.10,
            supply_max: 10,
            supply_field_cap: 5,
            resupply_cost: 0.1,
            winter_months: [12, 1, 2],
            north_rail_capacity: 120,
            south_rail_capacity: 70,

            combat_rating_cap: 12.0,
            attacker_casualty_factor: 20.0,
            defender_casualty_factor: 25.0,
            small_army_threshold: 15,
            grapple_max_rounds: 32,
            surrender_ratio: 0.2,
            retreat_penalty: 0.1,
            annihilation_vp: 25,
            winter_campaign_ban: true,

            fort_cost: 200,
            fort_max: 2,

            recruit_cost: 100,
            recruit_cap_per_turn: 3,
            recruit_base_strength: 33,
            recruit_city_value_scale: 3,
            max_army_strength: 1250,
            capital_income_bonus: 100,
            cash_cap: 19999,

            wooden_ship_cost: 100,
            ironclad_cost: 200,
            ironclad_available_year: 1862,
            fleet_cap: 10,
            wooden_integrity: 10,
            ironclad_integrity: 20,
            repair_cost_per_point: 10,
            raid_income_cap: 0.3,
            invasion_strength: 35,

            event_chance_per_year: 0.06,
            event_chance_cap: 0.9,

            victory_fraction: 0.6,
            turn_limit_months: 60,
            force_ratio_victory: 6.0,
        }
    }
}
