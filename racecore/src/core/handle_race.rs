use crate::core::circuit::{Circuit, CircuitPars};
use crate::core::driver::entrants_from_teams;
use crate::core::race::{shuffle_grid, Race};
use crate::interfaces::render_interface::{RaceState, MAX_UPDATE_FREQUENCY};
use crate::post::race_result::RaceResult;
use crate::pre::read_sim_pars::SimPars;
use anyhow::Context;
use flume::Sender;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::thread::sleep;
use std::time::{Duration, Instant};

/// * `seed` - Seed of the random source of the race
/// * `shuffle_grid` - Shuffle the starting grid instead of using roster order
/// * `timestep_size` - (s) Real time per tick, scaled by the simulation speed inside the race
/// * `max_ticks` - Abort the race after this number of ticks
/// * `realtime_factor` - Real-time scaling, only relevant if snapshots are sent
#[derive(Debug, Clone, Copy)]
pub struct RunPars {
    pub seed: u64,
    pub shuffle_grid: bool,
    pub timestep_size: f64,
    pub max_ticks: Option<u64>,
    pub realtime_factor: f64,
}

impl Default for RunPars {
    fn default() -> Self {
        RunPars {
            seed: 0,
            shuffle_grid: false,
            timestep_size: 1.0 / 60.0,
            max_ticks: None,
            realtime_factor: 1.0,
        }
    }
}

/// create_circuit builds the circuit from its parameters. A circuit that cannot be constructed is
/// replaced by the embedded default loop.
fn create_circuit(circuit_pars: &CircuitPars) -> anyhow::Result<Circuit> {
    match Circuit::new(circuit_pars) {
        Ok(circuit) => Ok(circuit),
        Err(err) => {
            warn!("Invalid circuit ({}), falling back to the default loop", err);
            let default_pars = CircuitPars::named(None)?;
            Ok(Circuit::new(&default_pars)?)
        }
    }
}

/// handle_race creates and simulates a race on the basis of the inserted parameters, and returns
/// the results for post-processing. If a sender is inserted, the race is simulated in real time
/// and snapshots are sent at most at `MAX_UPDATE_FREQUENCY`.
pub fn handle_race(
    sim_pars: &SimPars,
    run_pars: &RunPars,
    tx: Option<&Sender<RaceState>>,
) -> anyhow::Result<RaceResult> {
    anyhow::ensure!(
        run_pars.timestep_size > 0.0 && run_pars.timestep_size.is_finite(),
        "Time step size must be positive, got {}!",
        run_pars.timestep_size
    );
    anyhow::ensure!(
        run_pars.realtime_factor > 0.0,
        "Real-time factor must be positive, got {}!",
        run_pars.realtime_factor
    );

    let circuit = create_circuit(&sim_pars.circuit_pars)?;
    let mut entrants = entrants_from_teams(&sim_pars.teams);
    let mut rng = ChaCha8Rng::seed_from_u64(run_pars.seed);
    if run_pars.shuffle_grid {
        shuffle_grid(&mut entrants, &mut rng);
    }

    let mut race = Race::new(circuit, entrants, &sim_pars.sim_config, rng)?;
    race.start();

    let mut last_logged_lap = race.cur_lap();
    let mut t_race_update_snapshot = f64::NEG_INFINITY;

    while !race.is_finished() {
        if run_pars.max_ticks.map_or(false, |max| race.no_ticks() >= max) {
            warn!(
                "Aborting race after {} ticks in lap {}",
                race.no_ticks(),
                race.cur_lap()
            );
            break;
        }

        let t_start = Instant::now();
        race.tick(run_pars.timestep_size)?;

        if race.cur_lap() > last_logged_lap {
            last_logged_lap = race.cur_lap();
            if let Some(leader) = race.leader() {
                debug!(
                    "Leader {} started lap {} at {:.3}s",
                    leader.short(),
                    last_logged_lap,
                    race.race_time()
                );
            }
        }

        let tx = match tx {
            Some(tx) => tx,
            None => continue,
        };

        if race.race_time() > t_race_update_snapshot + 1.0 / MAX_UPDATE_FREQUENCY - 0.001 {
            tx.send(RaceState::from_race(&race)?)
                .context("Failed to send race state!")?;
            t_race_update_snapshot = race.race_time();
        }

        // sleep until time step is finished in real-time as well
        let t_step = Duration::from_secs_f64(run_pars.timestep_size / run_pars.realtime_factor);
        match t_step.checked_sub(t_start.elapsed()) {
            Some(t_sleep) => sleep(t_sleep),
            None => warn!("Could not keep up with real-time!"),
        }
    }

    let race_result = RaceResult::from_race(&race);

    // after the real-time loop finishes, send the final result once
    if let Some(tx) = tx {
        let mut final_state = RaceState::from_race(&race)?;
        final_state.final_result = Some(race_result.clone());
        tx.send(final_state)
            .context("Failed to send final race result!")?;
    }

    info!(
        "Simulated {} ticks, race time {:.3}s",
        race.no_ticks(),
        race.race_time()
    );

    Ok(race_result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pre::read_sim_pars::builtin_teams;
    use crate::pre::sim_config::SimConfig;

    fn sim_pars(race_laps: u32) -> SimPars {
        let mut sim_config = SimConfig::default();
        sim_config.race_laps = race_laps;
        SimPars {
            sim_config,
            circuit_pars: CircuitPars::named(Some("monza")).unwrap(),
            teams: builtin_teams().unwrap(),
        }
    }

    #[test]
    fn headless_race_runs_to_the_finish() {
        let run_pars = RunPars {
            timestep_size: 0.1,
            ..RunPars::default()
        };
        let result = handle_race(&sim_pars(2), &run_pars, None).unwrap();
        assert!(result.finished);
        assert!(result.verify().is_empty());
    }

    #[test]
    fn max_ticks_aborts_the_race() {
        let run_pars = RunPars {
            max_ticks: Some(10),
            ..RunPars::default()
        };
        let result = handle_race(&sim_pars(5), &run_pars, None).unwrap();
        assert!(!result.finished);
        assert_eq!(result.no_ticks, 10);
        assert!(result.verify().iter().any(|f| f == "race did not finish"));
    }

    #[test]
    fn degenerate_circuit_falls_back_to_default_loop() {
        let mut pars = sim_pars(1);
        pars.circuit_pars = pars.circuit_pars.with_waypoints(vec![[0.0, 0.0], [1.0, 1.0]]);
        let run_pars = RunPars {
            max_ticks: Some(1),
            ..RunPars::default()
        };
        let result = handle_race(&pars, &run_pars, None).unwrap();
        assert_eq!(result.circuit_name, "Custom circuit");
    }

    #[test]
    fn snapshots_end_with_final_result() {
        let (tx, rx) = flume::unbounded();
        let run_pars = RunPars {
            timestep_size: 0.5,
            realtime_factor: 1.0e6,
            ..RunPars::default()
        };
        let result = handle_race(&sim_pars(1), &run_pars, Some(&tx)).unwrap();

        let states: Vec<RaceState> = rx.try_iter().collect();
        assert!(states.len() > 1);
        let last = states.last().unwrap();
        assert_eq!(last.final_result.as_ref(), Some(&result));
        assert!(states[..states.len() - 1]
            .iter()
            .all(|state| state.final_result.is_none()));
    }

    #[test]
    fn zero_timestep_is_rejected() {
        let run_pars = RunPars {
            timestep_size: 0.0,
            ..RunPars::default()
        };
        assert!(handle_race(&sim_pars(1), &run_pars, None).is_err());
    }
}
