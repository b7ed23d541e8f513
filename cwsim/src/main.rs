use anyhow::{Context, Result};
use clap::Parser;
use cwsim_core::ai::{AiPlayer, RandomAi, Strategist, VisibleState};
use cwsim_core::{scenario, snapshot, Game, Phase, SideId, SimConfig, TurnOrders};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World seed
    #[arg(long, default_value_t = 1861)]
    seed: u64,

    /// Number of months to run
    #[arg(short, long, default_value_t = 60)]
    months: u32,

    /// AI for the Union side (strategist, random)
    #[arg(long, default_value = "strategist")]
    north_ai: String,

    /// AI for the Confederate side (strategist, random)
    #[arg(long, default_value = "strategist")]
    south_ai: String,

    /// Resume from a saved campaign instead of the 1861 opening
    #[arg(long)]
    load: Option<PathBuf>,

    /// Save the campaign here when the run ends
    #[arg(long)]
    save: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn make_ai(name: &str, seed: u64) -> Result<Box<dyn AiPlayer>> {
    match name {
        "strategist" => Ok(Box::new(Strategist::new())),
        "random" => Ok(Box::new(RandomAi::new(seed))),
        other => anyhow::bail!("unknown AI '{other}' (expected strategist or random)"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let mut game = match &args.load {
        Some(path) => {
            let game = snapshot::load(path)
                .with_context(|| format!("loading campaign from {}", path.display()))?;
            log::info!("Resumed campaign at {}", game.state.date);
            game
        }
        None => {
            log::info!("Opening the 1861 campaign, seed {}", args.seed);
            Game::new(scenario::standard_1861(
                args.seed,
                SimConfig::default(),
                false,
                false,
            ))
        }
    };

    let mut north = make_ai(&args.north_ai, args.seed)?;
    let mut south = make_ai(&args.south_ai, args.seed.wrapping_add(1))?;

    for _ in 0..args.months {
        for _ in SideId::BOTH {
            let Some(side) = game.current_side() else { break };
            let ai: &mut Box<dyn AiPlayer> = match side {
                SideId::North => &mut north,
                SideId::South => &mut south,
            };
            let commands = ai.plan_turn(&VisibleState::new(&game.state, side));
            let report = game.submit(&TurnOrders { side, commands })?;
            for line in &report.log {
                log::debug!("{line}");
            }
            if !report.rejected.is_empty() {
                log::debug!("{side}: {} orders refused", report.rejected.len());
            }
        }

        let north_side = game.state.side(SideId::North);
        let south_side = game.state.side(SideId::South);
        log::info!(
            "{} | Union {} pts, ${}, {} men | Confederacy {} pts, ${}, {} men",
            game.state.date,
            north_side.victory_points,
            north_side.cash,
            game.state.total_strength(SideId::North),
            south_side.victory_points,
            south_side.cash,
            game.state.total_strength(SideId::South),
        );

        if let Phase::GameOver { winner, reason } = game.phase {
            log::info!("The war is over: {winner} wins ({reason:?})");
            break;
        }
    }

    if game.winner().is_none() {
        log::info!("Run ended at {} with the war still on", game.state.date);
    }

    if let Some(path) = &args.save {
        snapshot::save(&game, path)
            .with_context(|| format!("saving campaign to {}", path.display()))?;
        log::info!("Campaign saved to {}", path.display());
    }

    Ok(())
}
