use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::info;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use junction_sim::simulation::{
    Command, GreenStrategyKind, JunctionId, SimConfig, SimWorld, Side, VehicleKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TopologyArg {
    /// Two coordinated junctions on one East-West road
    Corridor,
    /// One junction with incident-aware arbitration
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Adaptive,
    Density,
    Linear,
}

#[derive(Parser)]
#[command(name = "junction_sim")]
#[command(about = "Headless adaptive traffic-signal simulation")]
struct Cli {
    /// Road layout to simulate
    #[arg(long, value_enum, default_value = "corridor")]
    topology: TopologyArg,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "3600")]
    ticks: u32,

    /// Time delta per tick in seconds [default: the preset's 60 Hz tick]
    #[arg(long)]
    delta: Option<f32>,

    /// Place a vehicle before starting, e.g. 0:W:1:car (repeatable)
    #[arg(long = "vehicle", value_name = "J:SIDE:LANE:CLASS")]
    vehicles: Vec<String>,

    /// Place an incident before starting, e.g. 1:E:2 or 1:E:2@700,390 (repeatable)
    #[arg(long = "incident", value_name = "J:SIDE:LANE[@X,Y]")]
    incidents: Vec<String>,

    /// Clear the incident nearest to a point once --clear-after has elapsed (repeatable)
    #[arg(long = "clear-at", value_name = "X,Y")]
    clear_at: Vec<String>,

    /// Simulated seconds before --clear-at commands are issued
    #[arg(long, default_value_t = 10.0)]
    clear_after: f32,

    /// Number of vehicles to place on random entry lanes
    #[arg(long, default_value = "0")]
    random: usize,

    /// Seed for --random placement
    #[arg(long)]
    seed: Option<u64>,

    /// Green-time sizing strategy (defaults to the topology's preset)
    #[arg(long, value_enum)]
    green_strategy: Option<StrategyArg>,

    /// Minimum green time in seconds
    #[arg(long)]
    min_green: Option<f32>,

    /// Maximum green time in seconds
    #[arg(long)]
    max_green: Option<f32>,

    /// Yellow time in seconds
    #[arg(long)]
    yellow: Option<f32>,

    /// Print a summary every this many simulated seconds
    #[arg(long)]
    report_every: Option<f32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    run_headless(&cli, config)
}

/// Start from the topology preset and apply command-line overrides
fn build_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match cli.topology {
        TopologyArg::Corridor => SimConfig::corridor(),
        TopologyArg::Single => SimConfig::single_junction(),
    };

    if let Some(strategy) = cli.green_strategy {
        config.green_strategy = match strategy {
            StrategyArg::Adaptive => GreenStrategyKind::Adaptive,
            StrategyArg::Density => GreenStrategyKind::DensityScaled,
            StrategyArg::Linear => GreenStrategyKind::Linear,
        };
    }
    if let Some(min_green) = cli.min_green {
        config.timing.min_green = min_green;
    }
    if let Some(max_green) = cli.max_green {
        config.timing.max_green = max_green;
    }
    if let Some(yellow) = cli.yellow {
        config.timing.yellow = yellow;
    }

    if config.timing.min_green > config.timing.max_green {
        bail!(
            "Minimum green ({}s) exceeds maximum green ({}s)",
            config.timing.min_green,
            config.timing.max_green
        );
    }
    if let Some(delta) = cli.delta {
        config.tick_dt = delta;
    }
    if config.tick_dt <= 0.0 {
        bail!("Tick delta must be positive, got {}", config.tick_dt);
    }
    if cli.report_every.is_some_and(|interval| interval <= 0.0) {
        bail!("Report interval must be positive");
    }

    Ok(config)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli, config: SimConfig) -> Result<()> {
    let topology = config.topology;
    let delta = config.tick_dt;
    let mut world = SimWorld::new(config);

    for spec in &cli.vehicles {
        let command =
            Command::parse_vehicle(spec).with_context(|| format!("Invalid --vehicle '{spec}'"))?;
        world
            .apply(command)
            .with_context(|| format!("Could not place vehicle '{spec}'"))?;
    }
    for spec in &cli.incidents {
        let command =
            Command::parse_incident(spec).with_context(|| format!("Invalid --incident '{spec}'"))?;
        world
            .apply(command)
            .with_context(|| format!("Could not place incident '{spec}'"))?;
    }
    let clears = cli
        .clear_at
        .iter()
        .map(|spec| {
            Command::parse_clear_at(spec).with_context(|| format!("Invalid --clear-at '{spec}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    if cli.random > 0 {
        let mut rng = match cli.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        place_random_vehicles(&mut world, &mut rng, cli.random)?;
    }

    info!(
        "Running {:?} topology for {} ticks of {:.4}s",
        topology, cli.ticks, delta
    );
    println!("Initial state:");
    world.print_summary();
    println!();

    world.start();

    let mut clears = Some(clears);
    let mut next_report = cli.report_every;
    for tick in 1..=cli.ticks {
        if world.time >= cli.clear_after {
            for command in clears.take().into_iter().flatten() {
                world.submit(command);
            }
        }

        world.tick(delta);

        if let (Some(at), Some(interval)) = (next_report, cli.report_every) {
            if world.time >= at {
                println!(
                    "--- After tick {} ({:.1}s simulated time) ---",
                    tick, world.time
                );
                world.print_summary();
                println!();
                next_report = Some(at + interval);
            }
        }
    }

    println!("=== Final State ===");
    world.print_summary();
    world.log_final_stats();
    Ok(())
}

/// Queue `count` vehicles of random classes on random legal entry lanes
fn place_random_vehicles(world: &mut SimWorld, rng: &mut StdRng, count: usize) -> Result<()> {
    let junctions = world.intersections().len();
    for _ in 0..count {
        let junction = JunctionId(rng.random_range(0..junctions));
        let side = *Side::ALL.choose(rng).context("No sides to choose from")?;
        let kind = *VehicleKind::ALL
            .choose(rng)
            .context("No vehicle classes to choose from")?;
        world
            .place_vehicle(junction, side, side.entry_lane(), kind)
            .with_context(|| format!("Could not place random {kind} on junction {}", junction.0))?;
    }
    Ok(())
}
