use clap::Parser;
use log::{error, info};
use racecore::core::handle_race::{handle_race, RunPars};
use racecore::interfaces::render_interface::RaceState;
use racecore::post::race_result::RaceResult;
use racecore::pre::read_sim_pars::read_sim_pars;
use racecore::pre::sim_opts::SimOpts;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::thread;
use std::time::Instant;

/// print_race_state prints a one-line leaderboard of a race snapshot.
fn print_race_state(race_state: &RaceState) {
    let top: Vec<String> = race_state
        .car_states
        .iter()
        .take(5)
        .map(|car| format!("P{} {} {:+.1}s", car.position, car.short, car.gap_to_ahead_s))
        .collect();

    println!(
        "Lap {:>2}/{} {:>8.1}s | {}",
        race_state.cur_lap.min(race_state.race_laps),
        race_state.race_laps,
        race_state.race_time,
        top.join(" | ")
    );

    for event in race_state.recent_events.iter().take(1) {
        println!("    {}", event);
    }
}

/// check_results verifies every race result and fails with a non-zero exit code if any check
/// failed.
fn check_results(race_results: &[RaceResult]) -> anyhow::Result<()> {
    let mut no_failures = 0;

    for (run, race_result) in race_results.iter().enumerate() {
        for failure in race_result.verify() {
            error!("Run {}: {}", run, failure);
            no_failures += 1;
        }
    }

    if no_failures > 0 {
        anyhow::bail!("{} race result check(s) failed!", no_failures);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    let default_level = if sim_opts.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    // get simulation parameters
    let sim_pars = read_sim_pars(&sim_opts)?;
    let run_pars = RunPars {
        seed: sim_opts.seed,
        shuffle_grid: sim_opts.shuffle_grid,
        timestep_size: sim_opts.timestep_size,
        max_ticks: sim_opts.max_ticks,
        realtime_factor: sim_opts.realtime_factor,
    };

    info!(
        "Simulating {} laps with {} teams (preset {}, seed {}) with a time step size of {:.4}s",
        sim_pars.sim_config.race_laps,
        sim_pars.teams.len(),
        sim_opts.preset,
        sim_opts.seed,
        sim_opts.timestep_size
    );

    // EXECUTION -----------------------------------------------------------------------------------
    let t_start = Instant::now();

    let race_results = if sim_opts.watch {
        // WATCH CASE - simulate in real time on a separate thread and print the snapshots
        let (tx, rx) = flume::unbounded();
        let sim_pars_thread = sim_pars.clone();

        let sim_thread =
            thread::spawn(move || handle_race(&sim_pars_thread, &run_pars, Some(&tx)));

        for race_state in rx.iter() {
            print_race_state(&race_state);
            if race_state.final_result.is_some() {
                break;
            }
        }

        let race_result = sim_thread
            .join()
            .map_err(|_| anyhow::anyhow!("Simulation thread panicked!"))??;
        vec![race_result]
    } else if sim_opts.no_sim_runs > 1 {
        // BATCH CASE - independent seeded races in parallel
        let seeds: Vec<u64> = (0..sim_opts.no_sim_runs as u64)
            .map(|run| sim_opts.seed.wrapping_add(run))
            .collect();

        seeds
            .par_iter()
            .map(|&seed| handle_race(&sim_pars, &RunPars { seed, ..run_pars }, None))
            .collect::<anyhow::Result<Vec<RaceResult>>>()?
    } else {
        vec![handle_race(&sim_pars, &run_pars, None)?]
    };

    info!(
        "Execution time: {}ms for {} run(s)",
        t_start.elapsed().as_millis(),
        race_results.len()
    );

    // POST-PROCESSING -----------------------------------------------------------------------------
    if race_results.len() > 1 {
        let mut winner_tally: BTreeMap<String, u32> = BTreeMap::new();
        for race_result in race_results.iter() {
            if let Some(winner) = race_result.winner() {
                *winner_tally.entry(winner.short.to_owned()).or_insert(0) += 1;
            }
        }

        let mut tally: Vec<(String, u32)> = winner_tally.into_iter().collect();
        tally.sort_by(|a, b| b.1.cmp(&a.1));

        println!("RESULT: Wins over {} runs", race_results.len());
        for (short, wins) in tally.iter() {
            println!("{} {:4}", short, wins);
        }
    } else if let Some(race_result) = race_results.first() {
        race_result.print_result();
    }

    if let Some(race_result) = race_results.first() {
        if let Some(path) = &sim_opts.output {
            let out_path = race_result.write_result_to_file(Some(path))?;
            info!("Result written to {}", out_path.display());
        }
    }

    check_results(&race_results)
}
