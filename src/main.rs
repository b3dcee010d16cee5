//! Chain Defense - headless runner
//!
//! Plays one seeded run to its result with a simple auto-pilot and prints the
//! summary as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use chain_defense::consts::SIM_DT;
use chain_defense::meta::MetaStat;
use chain_defense::{MetaProgress, Run, RunConfig, RunEvent, RunSummary, Tuning};

/// Give up after this many simulated minutes
const MAX_RUN_MINUTES: u32 = 30;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run seed
    #[arg(default_value_t = 12345)]
    seed: u32,
    /// Meta progress JSON file to load, bank into and save
    meta: Option<PathBuf>,
}

fn main() -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Chain Defense (headless) starting...");

    let args = Args::parse();

    let mut meta = args
        .meta
        .as_deref()
        .map(MetaProgress::load_or_default)
        .unwrap_or_default();
    for stat in MetaStat::ALL {
        log::debug!("Meta {:?} at level {}", stat, meta.level(stat));
    }

    let config = RunConfig {
        seed: args.seed,
        modifiers: meta.run_modifiers(),
    };
    let summary = play(Run::new(config, Tuning::default()));

    if let Some(path) = &args.meta {
        meta.bank(&summary);
        meta.save(path)
            .with_context(|| format!("Failed to save meta progress to {}", path.display()))?;
    }

    let json = serde_json::to_string_pretty(&summary).context("Failed to encode run summary")?;
    println!("{json}");
    Ok(())
}

/// Drive the run until it produces a result
fn play(mut run: Run) -> RunSummary {
    let max_steps = MAX_RUN_MINUTES * 60 * 60;
    for _ in 0..max_steps {
        steer(&mut run);
        run.advance(SIM_DT);

        for event in run.drain_events() {
            match event {
                RunEvent::UpgradeOffer(choices) => {
                    if let Some(id) = choices.first() {
                        run.choose_upgrade(id);
                    }
                }
                RunEvent::SpecialBonusOffer(choices) => {
                    if let Some(choice) = choices.first() {
                        log::info!("Taking {} bonus '{}'", choice.rarity.as_str(), choice.label);
                        run.choose_special_bonus(&choice.id);
                    }
                }
                RunEvent::Result(summary) => return summary,
            }
        }
    }
    log::warn!("Run did not finish within {MAX_RUN_MINUTES} simulated minutes");
    run.summary()
}

/// Chase lane pickups when there are any, otherwise track the chain head
fn steer(run: &mut Run) {
    let state = run.state();
    let target_x = state
        .special_pickups
        .first()
        .map(|p| p.pos.x)
        .unwrap_or_else(|| state.worm.head_pos().x);
    let dx = target_x - state.player.pos.x;
    let input = if dx.abs() < 4.0 { 0.0 } else { dx.signum() };
    run.set_movement(input);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["chain-defense"]).unwrap();
        assert_eq!(args.seed, 12345);
        assert!(args.meta.is_none());

        let args = Args::try_parse_from(["chain-defense", "7", "meta.json"]).unwrap();
        assert_eq!(args.seed, 7);
        assert_eq!(args.meta, Some(PathBuf::from("meta.json")));
    }

    #[test]
    fn test_args_reject_bad_seed() {
        assert!(Args::try_parse_from(["chain-defense", "abc"]).is_err());
        assert!(Args::try_parse_from(["chain-defense", "-3"]).is_err());
    }
}
