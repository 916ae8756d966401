use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    author = "Alexander Heilmeier <alexander.heilmeier@tum.de>",
    name = "race-cli",
    about = "Headless harness for the tick-driven circuit race simulator"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging
    #[clap(short, long)]
    pub debug: bool,

    /// Stream race snapshots and simulate in real time (scaled by the real-time factor)
    #[clap(short, long)]
    pub watch: bool,

    /// Shuffle the starting grid with the seeded random source instead of using roster order
    #[clap(long)]
    pub shuffle_grid: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set the seed of the random source, batch runs use seed, seed + 1, ...
    #[clap(short, long, default_value = "0")]
    pub seed: u64,

    /// Set a built-in circuit (monaco, silverstone, spa, monza, suzuka, cota), default loop if unset
    #[clap(short, long)]
    pub circuit: Option<String>,

    /// Set path to a circuit file (.json record or .csv waypoints with x_m,y_m columns); a CSV file
    /// replaces only the geometry of the selected circuit
    #[clap(long)]
    pub circuit_file: Option<PathBuf>,

    /// Set the parameter preset (realistic, balanced, chaos)
    #[clap(short, long, default_value = "realistic")]
    pub preset: String,

    /// Set path to a JSON configuration file, missing fields are taken from the preset
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Set path to a JSON team roster file, built-in roster if unset
    #[clap(long)]
    pub teams: Option<PathBuf>,

    /// Override the number of race laps
    #[clap(short, long)]
    pub laps: Option<u32>,

    /// Set number of simulation runs (run in parallel, ignored in watch mode)
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set simulation timestep size in seconds, should be in the range [0.001, 1.0]
    #[clap(short, long, default_value = "0.0166667")]
    pub timestep_size: f64,

    /// Abort the race after this number of ticks
    #[clap(long)]
    pub max_ticks: Option<u64>,

    /// Set real-time factor (only relevant in watch mode)
    #[clap(short, long, default_value = "1.0")]
    pub realtime_factor: f64,

    /// Write the result table of the (first) race to this file
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}
