//! Run a traffic scenario through the closed-loop simulator and print the
//! safety report.
//!
//! Usage:
//!   cargo run -p airsep-sim --bin simulate -- --scenario head-on --duration 600

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use airsep_sim::scenario::ScenarioKind;
use airsep_sim::Simulator;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scenario to run: head-on, random, high-density
    #[arg(long, default_value = "head-on")]
    scenario: String,

    /// Aircraft count for the random scenarios
    #[arg(long, default_value_t = 20)]
    aircraft: usize,

    /// Simulated duration in seconds
    #[arg(long, default_value_t = 600.0)]
    duration: f64,

    /// Update rate in Hz
    #[arg(long, default_value_t = 1.0)]
    rate: f64,

    /// Print per-aircraft state snapshots after the run
    #[arg(long)]
    dump_state: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("airsep_sim=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let scenario: ScenarioKind = args.scenario.parse()?;

    let mut sim = Simulator::with_frequency(args.rate)?;
    sim.airspace.create_default_sectors((0.0, 200.0), (0.0, 200.0));
    for aircraft in scenario.build(args.aircraft) {
        sim.add_aircraft(aircraft);
    }

    tracing::info!(
        scenario = %args.scenario,
        aircraft = sim.aircraft().len(),
        duration = args.duration,
        "starting simulation"
    );

    sim.run(args.duration);

    println!("{}", sim.report());
    println!("{}", serde_json::to_string_pretty(&sim.status())?);

    if args.dump_state {
        for aircraft in sim.aircraft() {
            println!("{}", serde_json::to_string_pretty(&aircraft.state_snapshot())?);
        }
    }

    Ok(())
}
