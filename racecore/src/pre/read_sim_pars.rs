use crate::core::circuit::CircuitPars;
use crate::core::driver::TeamPars;
use crate::pre::presets::Preset;
use crate::pre::sim_config::SimConfig;
use crate::pre::sim_opts::SimOpts;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::path::Path;

const BUILTIN_TEAMS: &str = include_str!("../../input/teams.json");

/// SimPars is used to store all parameters that are required to set up a race.
#[derive(Debug, Clone)]
pub struct SimPars {
    pub sim_config: SimConfig,
    pub circuit_pars: CircuitPars,
    pub teams: Vec<TeamPars>,
}

fn open_file(filepath: &Path, description: &str) -> anyhow::Result<File> {
    OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open {} file {}!",
            description,
            filepath.display()
        ))
}

fn read_json<T: DeserializeOwned>(filepath: &Path, description: &str) -> anyhow::Result<T> {
    let fh = open_file(filepath, description)?;
    let pars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse {} file {}!",
        description,
        filepath.display()
    ))?;
    Ok(pars)
}

/// read_sim_config reads a JSON configuration file. Fields that are not contained in the file are
/// taken from the Realistic preset. The configuration is validated before it is returned.
pub fn read_sim_config(filepath: &Path) -> anyhow::Result<SimConfig> {
    let sim_config: SimConfig = read_json(filepath, "configuration")?;
    sim_config.validate().context(format!(
        "Invalid configuration in file {}!",
        filepath.display()
    ))?;
    Ok(sim_config)
}

/// read_circuit_pars reads a JSON circuit definition.
pub fn read_circuit_pars(filepath: &Path) -> anyhow::Result<CircuitPars> {
    read_json(filepath, "circuit")
}

#[derive(Debug, Deserialize)]
struct CsvWaypoint {
    x_m: f64,
    y_m: f64,
}

/// read_circuit_csv reads the waypoints of a circuit from a CSV file with the columns `x_m` and
/// `y_m`.
pub fn read_circuit_csv(filepath: &Path) -> anyhow::Result<Vec<[f64; 2]>> {
    let fh = open_file(filepath, "circuit CSV")?;
    let mut csv_reader = csv::Reader::from_reader(&fh);
    let mut waypoints = vec![];

    for result in csv_reader.deserialize() {
        let waypoint: CsvWaypoint = result.context(format!(
            "Failed to parse circuit CSV file {}!",
            filepath.display()
        ))?;
        waypoints.push([waypoint.x_m, waypoint.y_m]);
    }

    Ok(waypoints)
}

/// read_teams reads a JSON team roster.
pub fn read_teams(filepath: &Path) -> anyhow::Result<Vec<TeamPars>> {
    read_json(filepath, "team roster")
}

/// builtin_teams returns the team roster embedded into the library (ten teams, twenty drivers).
pub fn builtin_teams() -> anyhow::Result<Vec<TeamPars>> {
    serde_json::from_str(BUILTIN_TEAMS).context("Failed to parse built-in team roster!")
}

/// read_sim_pars assembles the race parameters from the command line options: preset or
/// configuration file, lap override, circuit selection and team roster.
pub fn read_sim_pars(sim_opts: &SimOpts) -> anyhow::Result<SimPars> {
    // configuration
    let mut sim_config = match &sim_opts.config {
        Some(filepath) => read_sim_config(filepath)?,
        None => Preset::from_name(&sim_opts.preset)?.config(),
    };

    if let Some(laps) = sim_opts.laps {
        sim_config.race_laps = laps;
    }
    sim_config.validate()?;

    // circuit
    let circuit_pars = match &sim_opts.circuit_file {
        Some(filepath) if is_csv(filepath) => {
            CircuitPars::named(sim_opts.circuit.as_deref())?
                .with_waypoints(read_circuit_csv(filepath)?)
        }
        Some(filepath) => read_circuit_pars(filepath)?,
        None => CircuitPars::named(sim_opts.circuit.as_deref())?,
    };

    // teams
    let teams = match &sim_opts.teams {
        Some(filepath) => read_teams(filepath)?,
        None => builtin_teams()?,
    };

    Ok(SimPars {
        sim_config,
        circuit_pars,
        teams,
    })
}

fn is_csv(filepath: &Path) -> bool {
    filepath
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
}
