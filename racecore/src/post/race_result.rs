use crate::core::race::Race;
use crate::core::race_event::{format_lap_time, CompetitorRef, EventKind, RaceEvent, RaceEventKind};
use crate::core::tireset::Compound;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// * `position` - Final position
/// * `grid_position` - Starting position
/// * `id` - Car number
/// * `short` - Driver short code
/// * `team` - Team name
/// * `laps_completed` - Completed laps
/// * `gap_s` - (s) Gap to the winner
/// * `best_lap_time` - (s) Fastest lap of the competitor
/// * `pit_stops` - Number of pit stops
/// * `compound` - Compound mounted at the end of the race
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub position: u32,
    pub grid_position: u32,
    pub id: u32,
    pub short: String,
    pub team: String,
    pub laps_completed: u32,
    pub gap_s: f64,
    pub best_lap_time: Option<f64>,
    pub pit_stops: u32,
    pub compound: Compound,
}

/// RaceResult contains all race information that is required for post-processing the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceResult {
    pub circuit_name: String,
    pub race_laps: u32,
    pub finished: bool,
    pub race_time: f64,
    pub no_ticks: u64,
    pub standings: Vec<Standing>,
    pub fastest_lap: Option<(CompetitorRef, f64)>,
    pub event_counts: BTreeMap<EventKind, usize>,
    pub recent_events: Vec<RaceEvent>,
}

impl RaceResult {
    pub fn from_race<R: Rng>(race: &Race<R>) -> RaceResult {
        let standings = race
            .ranked_roster()
            .iter()
            .map(|c| Standing {
                position: c.position,
                grid_position: c.grid_position,
                id: c.id(),
                short: c.short().to_owned(),
                team: c.entrant.team.to_owned(),
                laps_completed: c.total_laps_completed,
                gap_s: c.gap_to_leader_s,
                best_lap_time: c.best_lap_time,
                pit_stops: c.pit_stops,
                compound: c.tireset.compound,
            })
            .collect();

        RaceResult {
            circuit_name: race.circuit().name().to_owned(),
            race_laps: race.sim_config().race_laps,
            finished: race.is_finished(),
            race_time: race.race_time(),
            no_ticks: race.no_ticks(),
            standings,
            fastest_lap: race.fastest_lap().map(|(c, t)| (c.to_owned(), t)),
            event_counts: race.event_counts().to_owned(),
            recent_events: race.event_log().iter().cloned().collect(),
        }
    }

    pub fn winner(&self) -> Option<&Standing> {
        self.standings.first()
    }

    pub fn event_count(&self, kind: EventKind) -> usize {
        self.event_counts.get(&kind).copied().unwrap_or(0)
    }

    /// verify checks the final state of a race and returns a description of every failed check.
    /// An empty list means the race result is consistent.
    pub fn verify(&self) -> Vec<String> {
        let mut failures = vec![];

        if !self.finished {
            failures.push(String::from("race did not finish"));
        }

        for (idx, standing) in self.standings.iter().enumerate() {
            if standing.position != idx as u32 + 1 {
                failures.push(format!(
                    "{} is ranked at index {} but holds position {}",
                    standing.short, idx, standing.position
                ));
            }
        }

        if let Some(winner) = self.winner() {
            if self.finished && winner.laps_completed < self.race_laps {
                failures.push(format!(
                    "winner {} completed only {} of {} laps",
                    winner.short, winner.laps_completed, self.race_laps
                ));
            }
            if winner.gap_s != 0.0 {
                failures.push(format!("winner has a non-zero gap of {:.3}s", winner.gap_s));
            }
        }

        if self
            .standings
            .windows(2)
            .any(|pair| pair[1].gap_s < pair[0].gap_s)
        {
            failures.push(String::from("gaps to the winner are not non-decreasing"));
        }

        let no_starts = self.event_count(EventKind::RaceStart);
        if no_starts != 1 {
            failures.push(format!("expected one race start event, found {}", no_starts));
        }

        let no_ends = self.event_count(EventKind::RaceEnd);
        if self.finished && no_ends != 1 {
            failures.push(format!("expected one race end event, found {}", no_ends));
        }

        for event in self.recent_events.iter() {
            if let RaceEventKind::RaceEnd { margin_seconds, .. } = event.kind {
                if margin_seconds < 0.0 {
                    failures.push(format!("negative winning margin {:.3}s", margin_seconds));
                }
            }
        }

        failures
    }

    /// write_result_to_file writes the result table to a text file. Without a path the file is
    /// written to output/last_run.txt. Returns the path of the written file.
    pub fn write_result_to_file(&self, path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let out_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let out_dir = Path::new("output");
                std::fs::create_dir_all(out_dir)?;
                out_dir.join("last_run.txt")
            }
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&out_path)?;
        write!(file, "{}", self)?;
        file.flush()?;

        Ok(out_path)
    }

    /// print_result prints the result table to the console output.
    pub fn print_result(&self) {
        println!("{}", self);
    }
}

impl fmt::Display for RaceResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "RESULT: {} laps on {} ({:.3}s race time)",
            self.race_laps, self.circuit_name, self.race_time
        )?;
        writeln!(
            f,
            "pos, grid,  no, drv, {:<20}, laps, {:>9}, {:>8}, stops, tires",
            "team", "gap", "best"
        )?;

        for s in self.standings.iter() {
            let best = s.best_lap_time.map_or(String::from("-"), format_lap_time);
            writeln!(
                f,
                "{:3}, {:4}, {:3}, {}, {:<20}, {:4}, {:>8.3}s, {:>8}, {:5}, {}",
                s.position,
                s.grid_position,
                s.id,
                s.short,
                s.team,
                s.laps_completed,
                s.gap_s,
                best,
                s.pit_stops,
                s.compound
            )?;
        }

        if let Some((competitor, lap_time)) = &self.fastest_lap {
            writeln!(
                f,
                "RESULT: Fastest lap {} by {}",
                format_lap_time(*lap_time),
                competitor
            )?;
        }

        write!(f, "RESULT: Events")?;
        for (kind, count) in self.event_counts.iter() {
            write!(f, " {:?}={}", kind, count)?;
        }
        writeln!(f)?;

        for event in self.recent_events.iter().rev() {
            writeln!(f, "{}", event)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::circuit::{Circuit, CircuitPars};
    use crate::core::driver::entrants_from_teams;
    use crate::pre::read_sim_pars::builtin_teams;
    use crate::pre::sim_config::SimConfig;

    fn finished_result() -> RaceResult {
        let mut cfg = SimConfig::default();
        cfg.race_laps = 3;
        let circuit = Circuit::new(&CircuitPars::named(None).unwrap()).unwrap();
        let entrants = entrants_from_teams(&builtin_teams().unwrap());
        let mut race = Race::with_seed(circuit, entrants, &cfg, 7).unwrap();
        race.start();
        while !race.is_finished() {
            race.tick(0.05).unwrap();
        }
        RaceResult::from_race(&race)
    }

    #[test]
    fn finished_race_verifies() {
        let result = finished_result();
        assert_eq!(result.verify(), Vec::<String>::new());
        assert_eq!(result.standings.len(), 20);
        assert_eq!(result.event_count(EventKind::RaceEnd), 1);
    }

    #[test]
    fn tampered_result_fails_verification() {
        let mut result = finished_result();
        result.standings.swap(0, 1);
        result.finished = false;

        let failures = result.verify();
        assert!(failures.iter().any(|f| f == "race did not finish"));
        assert!(failures.iter().any(|f| f.contains("holds position")));
    }

    #[test]
    fn table_lists_every_competitor() {
        let result = finished_result();
        let table = result.to_string();
        for standing in result.standings.iter() {
            assert!(table.contains(&standing.short));
        }
        assert!(table.contains("RaceEnd=1"));
    }
}
