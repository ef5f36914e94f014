//! Headless battle runner
//!
//! Drives the kernel tick by tick and prints a JSON summary, the whole
//! external surface the simulation needs.

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use zborow::battle::{BattleSim, BattleStatus, Scenario, UnitReport, Weather};
use zborow::core::config::BattleConfig;

#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run a headless battle and output a JSON summary")]
struct Args {
    /// Map width in cells
    #[arg(long, default_value_t = 60)]
    width: u32,

    /// Map height in cells
    #[arg(long, default_value_t = 60)]
    height: u32,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Battlefield weather
    #[arg(long, value_enum, default_value_t = WeatherArg::Clear)]
    weather: WeatherArg,

    /// Maximum ticks before timeout (draw)
    #[arg(long, default_value_t = 2000)]
    max_ticks: u64,

    /// Pretty-print the JSON summary
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WeatherArg {
    Clear,
    Rain,
    Fog,
}

impl From<WeatherArg> for Weather {
    fn from(arg: WeatherArg) -> Self {
        match arg {
            WeatherArg::Clear => Weather::Clear,
            WeatherArg::Rain => Weather::Rain,
            WeatherArg::Fog => Weather::Fog,
        }
    }
}

/// JSON output structure
#[derive(Serialize)]
struct Summary {
    ticks: u64,
    weather: Weather,
    status: BattleStatus,
    units: Vec<UnitReport>,
}

fn main() -> zborow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let scenario = Scenario::historical(args.width, args.height, args.weather.into(), args.seed);
    let mut sim = BattleSim::from_scenario(&scenario, BattleConfig::default())?;

    let mut status = sim.status().clone();
    for _ in 0..args.max_ticks {
        status = sim.advance_tick();
        if status.is_finished() {
            break;
        }
    }

    let summary = Summary {
        ticks: sim.tick(),
        weather: sim.weather(),
        status,
        units: sim.state(),
    };
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{rendered}");
    Ok(())
}
