use crate::core::circuit::Circuit;
use crate::core::competitor::{AdvanceOutcome, Competitor};
use crate::core::driver::Entrant;
use crate::core::event_log::EventLog;
use crate::core::race_event::{Climber, CompetitorRef, EventKind, RaceEvent, RaceEventKind};
use crate::error::{ConfigError, RaceError};
use crate::pre::sim_config::SimConfig;
use helpers::general::{argsort, SortOrder};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Lateral display offset of cars running close together on the same lap.
const CLOSE_CAR_OFFSET: f64 = 15.0;
/// (laps) Progress difference below which two cars count as running close together.
const CLOSE_CAR_GAP: f64 = 0.05;
/// Fraction of the lap the leader must have covered before its current lap is used to estimate
/// the lap time.
const MIN_LAP_FRACTION_FOR_ESTIMATE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceStatus {
    NotStarted,
    Running,
    Finished,
}

/// estimate_seconds_per_lap returns the time scale used to convert progress gaps into seconds:
/// the leader's last completed lap if there is one, otherwise an extrapolation of its current lap
/// once it covered at least `MIN_LAP_FRACTION_FOR_ESTIMATE` of it, otherwise the theoretical lap
/// time.
pub fn estimate_seconds_per_lap(leader: &Competitor, theoretical_lap_time: f64) -> f64 {
    if let Some(last_lap_time) = leader.last_lap_time.filter(|t| *t > 0.0) {
        return last_lap_time;
    }

    let lap_fraction = leader.lap_fraction();
    if leader.lap_time_elapsed > 0.0 && lap_fraction >= MIN_LAP_FRACTION_FOR_ESTIMATE {
        leader.lap_time_elapsed / lap_fraction
    } else {
        theoretical_lap_time
    }
}

/// shuffle_grid randomizes the starting order of the entrants.
pub fn shuffle_grid<R: Rng + ?Sized>(entrants: &mut [Entrant], rng: &mut R) {
    entrants.shuffle(rng);
}

/// Race is the orchestrator of a race session. It owns the circuit, the competitors (always kept
/// in rank order) and the event log. All randomness of the session is drawn from `rng`, such that
/// a fixed seed reproduces an identical race.
#[derive(Debug)]
pub struct Race<R: Rng = ChaCha8Rng> {
    circuit: Circuit,
    sim_config: SimConfig,
    roster: Vec<Competitor>,
    status: RaceStatus,
    race_time: f64,
    no_ticks: u64,
    event_log: EventLog,
    event_counts: BTreeMap<EventKind, usize>,
    fastest_lap: Option<(CompetitorRef, f64)>,
    rng: R,
}

impl Race<ChaCha8Rng> {
    /// with_seed creates a race whose random source is a ChaCha8 generator seeded with `seed`.
    pub fn with_seed(
        circuit: Circuit,
        entrants: Vec<Entrant>,
        sim_config: &SimConfig,
        seed: u64,
    ) -> Result<Race<ChaCha8Rng>, RaceError> {
        Race::new(
            circuit,
            entrants,
            sim_config,
            ChaCha8Rng::seed_from_u64(seed),
        )
    }
}

impl<R: Rng> Race<R> {
    /// new creates the race and forms the starting grid. The entrants start in the given order,
    /// i.e. the first entrant is on pole.
    pub fn new(
        circuit: Circuit,
        entrants: Vec<Entrant>,
        sim_config: &SimConfig,
        mut rng: R,
    ) -> Result<Race<R>, RaceError> {
        sim_config.validate()?;

        if entrants.is_empty() {
            return Err(ConfigError::EmptyRoster.into());
        }

        let roster: Vec<Competitor> = entrants
            .into_iter()
            .enumerate()
            .map(|(idx, entrant)| Competitor::new(entrant, idx as u32 + 1, sim_config, &mut rng))
            .collect();

        Ok(Race {
            circuit,
            sim_config: sim_config.to_owned(),
            roster,
            status: RaceStatus::NotStarted,
            race_time: 0.0,
            no_ticks: 0,
            event_log: EventLog::new(sim_config.event_log_capacity),
            event_counts: BTreeMap::new(),
            fastest_lap: None,
            rng,
        })
    }

    /// start releases the field. Calling it again has no effect.
    pub fn start(&mut self) {
        if self.status != RaceStatus::NotStarted {
            warn!("Race was already started, ignoring start request");
            return;
        }

        self.status = RaceStatus::Running;
        self.push_event(1, RaceEventKind::RaceStart);
        info!(
            "Race started on {} with {} competitors over {} laps",
            self.circuit.name(),
            self.roster.len(),
            self.sim_config.race_laps
        );
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// tick advances the race by `dt` real seconds (scaled by the simulation speed). Ticks before
    /// the start or after the finish do nothing, whatever `dt` is.
    pub fn tick(&mut self, dt: f64) -> Result<(), RaceError> {
        if self.status != RaceStatus::Running {
            return Ok(());
        }

        if !dt.is_finite() || dt < 0.0 {
            return Err(RaceError::InvalidTimestep(dt));
        }

        let dt_sim = dt * self.sim_config.simulation_speed;
        self.race_time += dt_sim;
        self.no_ticks += 1;

        // advance every competitor, no competitor reads another one's state in this phase
        let mut outcomes: Vec<AdvanceOutcome> = Vec::with_capacity(self.roster.len());
        for competitor in self.roster.iter_mut() {
            outcomes.push(competitor.advance(
                dt_sim,
                &self.circuit,
                &self.sim_config,
                &mut self.rng,
            ));
        }

        let mut pending = self.collect_pit_events(&outcomes);
        pending.extend(self.collect_fastest_laps(&outcomes));

        // re-rank, ties keep the previous order
        let overtakes = self.rerank();
        self.update_gaps();
        let blue_flags = self.collect_blue_flags();

        let cur_lap = self.cur_lap();
        for kind in overtakes
            .into_iter()
            .chain(pending.into_iter())
            .chain(blue_flags.into_iter())
        {
            self.push_event(cur_lap, kind);
        }

        if cur_lap > self.sim_config.race_laps {
            self.finish();
        }

        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (RANKING AND GAPS) ------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// rerank sorts the roster by total progress and assigns the new positions. It returns an
    /// overtake for every adjacent pair whose order flipped compared to the previous ranking.
    fn rerank(&mut self) -> Vec<RaceEventKind> {
        let total_progress: Vec<f64> = self.roster.iter().map(|c| c.total_progress()).collect();
        let order = argsort(&total_progress, SortOrder::Descending);

        let mut slots: Vec<Option<Competitor>> = self.roster.drain(..).map(Some).collect();
        self.roster = order.iter().filter_map(|&idx| slots[idx].take()).collect();

        // positions still hold the ranking of the previous tick at this point
        let overtakes = self
            .roster
            .windows(2)
            .filter(|pair| pair[0].position > pair[1].position)
            .map(|pair| RaceEventKind::Overtake {
                passer: CompetitorRef::from(&pair[0]),
                passed: CompetitorRef::from(&pair[1]),
            })
            .collect();

        for (idx, competitor) in self.roster.iter_mut().enumerate() {
            competitor.position = idx as u32 + 1;
        }

        overtakes
    }

    /// update_gaps computes the gaps in laps and seconds and the lateral display offsets.
    fn update_gaps(&mut self) {
        let theoretical = self
            .sim_config
            .theoretical_lap_time(self.circuit.segment_count());
        let seconds_per_lap = match self.roster.first() {
            Some(leader) => estimate_seconds_per_lap(leader, theoretical),
            None => return,
        };
        let leader_progress = self.roster[0].total_progress();

        for idx in 0..self.roster.len() {
            let (ahead_progress, ahead_lap, ahead_frac) = if idx > 0 {
                let ahead = &self.roster[idx - 1];
                (ahead.total_progress(), Some(ahead.lap), ahead.progress)
            } else {
                (leader_progress, None, 0.0)
            };

            let competitor = &mut self.roster[idx];
            competitor.gap_to_leader = leader_progress - competitor.total_progress();
            competitor.gap_to_ahead = ahead_progress - competitor.total_progress();
            competitor.gap_to_leader_s = competitor.gap_to_leader * seconds_per_lap;
            competitor.gap_to_ahead_s = competitor.gap_to_ahead * seconds_per_lap;

            competitor.lateral_offset = match ahead_lap {
                Some(lap)
                    if lap == competitor.lap
                        && (ahead_frac - competitor.progress).abs() < CLOSE_CAR_GAP =>
                {
                    if idx % 2 == 0 {
                        CLOSE_CAR_OFFSET
                    } else {
                        -CLOSE_CAR_OFFSET
                    }
                }
                _ => 0.0,
            };
        }
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (EVENT DETECTION) -------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn collect_pit_events(&self, outcomes: &[AdvanceOutcome]) -> Vec<RaceEventKind> {
        let mut events = vec![];

        for (competitor, outcome) in self.roster.iter().zip(outcomes.iter()) {
            if outcome.pit_exit {
                events.push(RaceEventKind::PitExit {
                    competitor: CompetitorRef::from(competitor),
                    compound: competitor.tireset.compound,
                });
            }

            if let Some(pit_call) = outcome.pit_call {
                debug!(
                    "{} pits in lap {} for {} tires",
                    competitor.short(),
                    competitor.lap,
                    pit_call.compound
                );
                events.push(RaceEventKind::PitEntry {
                    competitor: CompetitorRef::from(competitor),
                    compound: pit_call.compound,
                    stop_time: pit_call.stop_time,
                });
            }
        }

        events
    }

    /// collect_fastest_laps compares every lap completed in this tick against the race-wide
    /// fastest lap. The very first completed lap only sets the reference.
    fn collect_fastest_laps(&mut self, outcomes: &[AdvanceOutcome]) -> Vec<RaceEventKind> {
        let mut events = vec![];

        for (competitor, outcome) in self.roster.iter().zip(outcomes.iter()) {
            if outcome.laps_completed == 0 {
                continue;
            }
            let lap_time = match competitor.last_lap_time {
                Some(lap_time) if lap_time > 0.0 => lap_time,
                _ => continue,
            };

            match self.fastest_lap {
                None => self.fastest_lap = Some((CompetitorRef::from(competitor), lap_time)),
                Some((_, fastest)) if lap_time < fastest => {
                    self.fastest_lap = Some((CompetitorRef::from(competitor), lap_time));
                    events.push(RaceEventKind::FastestLap {
                        competitor: CompetitorRef::from(competitor),
                        lap_time,
                    });
                }
                _ => {}
            }
        }

        events
    }

    /// collect_blue_flags returns a blue flag for each competitor that has just fallen a further
    /// full lap behind the leader.
    fn collect_blue_flags(&mut self) -> Vec<RaceEventKind> {
        let mut events = vec![];
        let leader = match self.roster.first() {
            Some(leader) => CompetitorRef::from(leader),
            None => return events,
        };

        for competitor in self.roster.iter_mut().skip(1) {
            let laps_down = competitor.gap_to_leader.max(0.0).floor() as u32;

            if laps_down > competitor.laps_down {
                events.push(RaceEventKind::BlueFlag {
                    lapped: CompetitorRef::from(&*competitor),
                    lapping: leader.clone(),
                });
            }
            competitor.laps_down = laps_down;
        }

        events
    }

    /// finish ends the race and emits the race end summary.
    fn finish(&mut self) {
        self.status = RaceStatus::Finished;

        let winner = CompetitorRef::from(&self.roster[0]);
        let margin_seconds = self.roster.get(1).map_or(0.0, |second| second.gap_to_leader_s);
        let climbers = self.notable_climbers();

        info!(
            "Race finished after {:.3}s, {} wins by {:.3}s",
            self.race_time, winner, margin_seconds
        );

        let cur_lap = self.cur_lap();
        self.push_event(
            cur_lap,
            RaceEventKind::RaceEnd {
                winner,
                margin_seconds,
                climbers,
            },
        );
    }

    /// notable_climbers returns the competitors with the largest gains from their grid slot, at
    /// most `max_notable_climbers` of them, each with at least `notable_climber_min_gain`.
    fn notable_climbers(&self) -> Vec<Climber> {
        let mut climbers: Vec<Climber> = self
            .roster
            .iter()
            .filter(|c| c.grid_position >= c.position + self.sim_config.notable_climber_min_gain)
            .map(|c| Climber {
                competitor: CompetitorRef::from(c),
                positions_gained: c.grid_position - c.position,
            })
            .collect();

        climbers.sort_by(|a, b| b.positions_gained.cmp(&a.positions_gained));
        climbers.truncate(self.sim_config.max_notable_climbers);
        climbers
    }

    fn push_event(&mut self, lap: u32, kind: RaceEventKind) {
        let event = RaceEvent::new(lap, self.race_time, kind);
        debug!("{}", event);
        *self.event_counts.entry(event.event_kind()).or_insert(0) += 1;
        self.event_log.push(event);
    }

    // ---------------------------------------------------------------------------------------------
    // GETTERS -------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn status(&self) -> RaceStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == RaceStatus::Finished
    }

    pub fn leader(&self) -> Option<&Competitor> {
        self.roster.first()
    }

    /// ranked_roster returns all competitors in rank order.
    pub fn ranked_roster(&self) -> &[Competitor] {
        &self.roster
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// event_counts returns the number of events per kind since the race was created, including
    /// events already evicted from the event log.
    pub fn event_counts(&self) -> &BTreeMap<EventKind, usize> {
        &self.event_counts
    }

    pub fn fastest_lap(&self) -> Option<(&CompetitorRef, f64)> {
        self.fastest_lap.as_ref().map(|(c, t)| (c, *t))
    }

    pub fn race_time(&self) -> f64 {
        self.race_time
    }

    pub fn no_ticks(&self) -> u64 {
        self.no_ticks
    }

    /// cur_lap returns the current lap of the leader.
    pub fn cur_lap(&self) -> u32 {
        self.roster.first().map_or(1, |leader| leader.lap)
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn sim_config(&self) -> &SimConfig {
        &self.sim_config
    }
}
