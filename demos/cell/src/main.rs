mod library;
mod systems;

use clap::{Parser, Subcommand};
use petrisim::core::{monte_carlo, MonteCarloOpts, RngPolicy, Summary};

use crate::library::BusStation;
use crate::systems::Layout;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    system: System,

    /// Number of independent runs
    #[arg(short, long, default_value_t = 10)]
    runs: usize,

    /// Random seed. Runs are seeded from system entropy if omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Continue one random stream across runs instead of seeding each run
    #[arg(long)]
    shared_rng: bool,

    /// Run sequentially even with per-run streams
    #[arg(long)]
    sequential: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum System {
    /// Parts flow through three robot stations and two machine groups
    Manufacturing {
        #[arg(short, long, value_enum, default_value_t = Layout::Dynamic)]
        layout: Layout,

        /// Mean time between part arrivals
        #[arg(short, long, default_value_t = 40.0)]
        arrival: f64,

        #[arg(long, default_value_t = 100_000.0)]
        horizon: f64,
    },
    /// Two cities connected by a pair of buses
    Transport {
        /// Mean time between passenger arrivals
        #[arg(short, long, default_value_t = 0.5)]
        arrival: f64,

        /// Passengers a bus waits for before leaving
        #[arg(long, default_value_t = 20)]
        seats: u64,

        /// Queue length beyond which newcomers leave
        #[arg(long, default_value_t = 30)]
        max_queue: u64,

        #[arg(long, default_value_t = 600.0)]
        horizon: f64,
    },
}

fn main() -> anyhow::Result<()> {
    if std::env::var("CELL_LOG").is_ok() {
        let env = env_logger::Env::new()
            .filter("CELL_LOG")
            .write_style("CELL_LOG_STYLE");
        env_logger::init_from_env(env);
    }

    let args = Args::parse();
    anyhow::ensure!(args.runs > 0, "at least one run is required");
    let rng = if args.shared_rng {
        RngPolicy::Shared { seed: args.seed }
    } else {
        RngPolicy::PerRun { seed: args.seed }
    };
    let opts = |horizon| {
        MonteCarloOpts::builder()
            .horizon(horizon)
            .runs(args.runs)
            .rng(rng)
            .parallel(!args.sequential)
            .build()
    };

    let summary = match args.system {
        System::Manufacturing {
            layout,
            arrival,
            horizon,
        } => {
            log::info!("manufacturing cell, {layout:?} layout, arrivals every {arrival}");
            monte_carlo(
                || systems::manufacturing(layout, arrival),
                &systems::manufacturing_probes(),
                &opts(horizon),
            )?
        }
        System::Transport {
            arrival,
            seats,
            max_queue,
            horizon,
        } => {
            let params = BusStation {
                arrival_mean: arrival,
                seats,
                max_queue,
                ..Default::default()
            };
            log::info!("transport system: {}", serde_json::to_string(&params)?);
            monte_carlo(
                || systems::transport(&params),
                &systems::transport_probes(),
                &opts(horizon),
            )?
        }
    };
    report(&summary, args.json)
}

fn report(summary: &Summary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    println!("{} runs, {} stalled", summary.runs, summary.stalled);
    for (name, estimate) in &summary.estimates {
        println!("{name}: {:.3} (std dev {:.3})", estimate.mean, estimate.std_dev);
    }
    Ok(())
}
