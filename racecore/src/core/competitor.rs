use crate::core::circuit::{Circuit, Point};
use crate::core::driver::Entrant;
use crate::core::tireset::{next_compound, starting_compound, Compound, Tireset};
use crate::pre::sim_config::{GridPars, SimConfig};
use helpers::general::lap_frac;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompetitorStatus {
    Running,
    Pit,
    OutLap,
}

/// Pit stop called at a lap boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitCall {
    pub compound: Compound,
    pub stop_time: f64,
}

/// AdvanceOutcome reports what happened to a competitor during one step, such that the race can
/// derive its events without diffing the complete competitor state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdvanceOutcome {
    pub laps_completed: u32,
    pub pit_call: Option<PitCall>,
    pub pit_exit: bool,
}

/// grid_slot returns the starting progress and lateral offset of a 1-based grid position. The grid
/// is two-wide: odd slots on the left (pole side), even slots on the right and slightly further
/// back.
pub fn grid_slot(grid_position: u32, grid_pars: &GridPars) -> (f64, f64) {
    let row = grid_position.saturating_sub(1) / 2;
    let progress = -grid_pars.row_spacing * row as f64;

    if grid_position % 2 == 1 {
        (progress, -grid_pars.lateral_offset)
    } else {
        (progress - grid_pars.stagger, grid_pars.lateral_offset)
    }
}

/// Competitor is one car-driver pair in the race. It owns its pace state and moves itself forward
/// in `advance`, everything that depends on the other competitors (position, gaps) is written by
/// the race after all competitors advanced.
///
/// * `entrant` - Identity (driver, team, tier, synergy class)
/// * `grid_position` - Starting slot (1-based)
/// * `position` - Current rank (1-based)
/// * `progress` - Fraction of the current lap, negative on the grid before the start line
/// * `lap` - Current lap (starts at 1)
/// * `total_laps_completed` - Number of completed laps
/// * `tireset` - Mounted tires
/// * `fuel_fraction_burned` - Fraction of the starting fuel load burned so far
/// * `lap_time_elapsed` - (s) Time spent in the current lap
/// * `last_lap_time` - (s) Time of the last completed lap
/// * `best_lap_time` - (s) Fastest completed lap
/// * `gap_to_leader` - (laps) Total progress gap to the leader
/// * `gap_to_ahead` - (laps) Total progress gap to the car directly ahead
/// * `gap_to_leader_s` - (s) Gap to the leader
/// * `gap_to_ahead_s` - (s) Gap to the car directly ahead
/// * `assist_available` - Close enough to the car ahead to use the speed assist
/// * `assist_active` - Assist available and inside a speed zone
/// * `in_pit` - Currently serving a pit stop
/// * `pit_time_remaining` - (s) Remaining pit stop time
/// * `pit_stops` - Number of pit stops made
/// * `lateral_offset` - Sideways display offset from the racing line
#[derive(Debug, Clone, Serialize)]
pub struct Competitor {
    pub entrant: Entrant,
    pub grid_position: u32,
    pub position: u32,
    pub progress: f64,
    pub lap: u32,
    pub total_laps_completed: u32,
    pub tireset: Tireset,
    pub fuel_fraction_burned: f64,
    pub lap_time_elapsed: f64,
    pub last_lap_time: Option<f64>,
    pub best_lap_time: Option<f64>,
    pub gap_to_leader: f64,
    pub gap_to_ahead: f64,
    pub gap_to_leader_s: f64,
    pub gap_to_ahead_s: f64,
    pub assist_available: bool,
    pub assist_active: bool,
    pub in_pit: bool,
    pub pit_time_remaining: f64,
    pub pit_stops: u32,
    pub lateral_offset: f64,
    pace_multiplier: f64,
    lap_noise: f64,
    #[serde(skip)]
    pub(crate) laps_down: u32,
}

impl Competitor {
    pub fn new<R: Rng + ?Sized>(
        entrant: Entrant,
        grid_position: u32,
        sim_config: &SimConfig,
        rng: &mut R,
    ) -> Competitor {
        let (progress, lateral_offset) = grid_slot(grid_position, &sim_config.grid);

        Competitor {
            entrant,
            grid_position,
            position: grid_position,
            progress,
            lap: 1,
            total_laps_completed: 0,
            tireset: Tireset::new(starting_compound(grid_position, rng)),
            fuel_fraction_burned: 0.0,
            lap_time_elapsed: 0.0,
            last_lap_time: None,
            best_lap_time: None,
            gap_to_leader: 0.0,
            gap_to_ahead: 0.0,
            gap_to_leader_s: 0.0,
            gap_to_ahead_s: 0.0,
            assist_available: false,
            assist_active: false,
            in_pit: false,
            pit_time_remaining: 0.0,
            pit_stops: 0,
            lateral_offset,
            pace_multiplier: 1.0,
            lap_noise: 0.0,
            laps_down: 0,
        }
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// advance moves the competitor forward by `dt` simulated seconds. It reads the gap to the car
    /// ahead as it was set by the race in the previous tick but never touches other competitors.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        dt: f64,
        circuit: &Circuit,
        sim_config: &SimConfig,
        rng: &mut R,
    ) -> AdvanceOutcome {
        let mut outcome = AdvanceOutcome::default();

        // pit lane traversal
        if self.in_pit {
            self.pit_time_remaining -= dt;
            if self.pit_time_remaining <= 0.0 {
                self.in_pit = false;
                self.pit_time_remaining = 0.0;
                outcome.pit_exit = true;
            }
        }

        self.update_assist(circuit, sim_config);
        self.pace_multiplier = self.calc_pace_multiplier(circuit, sim_config);

        // progress integration, the part of dt before the line crossing belongs to the old lap
        let progress_rate = sim_config.base_speed * self.pace_multiplier
            / circuit.segment_count() as f64
            * sim_config.ticks_per_second;
        let mut dt_remaining = dt;

        while self.progress + progress_rate * dt_remaining >= 1.0 {
            let dt_to_line = ((1.0 - self.progress) / progress_rate)
                .max(0.0)
                .min(dt_remaining);
            self.lap_time_elapsed += dt_to_line;
            dt_remaining -= dt_to_line;
            self.progress = (self.progress + progress_rate * dt_to_line - 1.0).max(0.0);

            self.complete_lap(sim_config, rng);
            outcome.laps_completed += 1;

            if let Some(pit_call) = self.decide_pit_stop(sim_config, rng) {
                outcome.pit_call = Some(pit_call);
            }
        }

        self.progress += progress_rate * dt_remaining;
        self.lap_time_elapsed += dt_remaining;

        outcome
    }

    // ---------------------------------------------------------------------------------------------
    // PACE MODEL ----------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// update_assist evaluates the speed assist. It is available from the configured lap on if the
    /// car ahead is within the detection threshold, and active while available and inside a speed
    /// zone. The leader has no car ahead and therefore never gets it.
    pub fn update_assist(&mut self, circuit: &Circuit, sim_config: &SimConfig) {
        self.assist_available = self.position > 1
            && self.lap >= sim_config.assist.enabled_from_lap
            && self.gap_to_ahead_s <= sim_config.assist.detection_threshold;
        self.assist_active = self.assist_available && circuit.in_speed_zone(self.progress);
    }

    /// calc_pace_multiplier composes the pace multiplier in a fixed order: tier and synergy scale
    /// the base pace, tire and fuel penalties are subtracted, the assist boost is added, and the
    /// result is scaled by the lap noise and the pit lane penalty. The result is clamped into
    /// `[min_pace_multiplier, max_pace_multiplier]`.
    pub fn calc_pace_multiplier(&self, circuit: &Circuit, sim_config: &SimConfig) -> f64 {
        let mut pace = 1.0;
        pace *= sim_config.tier_modifiers.get(self.entrant.tier);
        pace *= sim_config.synergy_modifiers.get(self.entrant.synergy);
        pace -= self.tireset.penalty(sim_config, circuit.wear_multiplier());
        pace -= self.fuel_penalty(sim_config);

        if self.assist_active {
            pace += sim_config.assist.speed_boost;
        }

        pace *= 1.0 + self.lap_noise;

        if self.in_pit {
            pace *= sim_config.pit.speed_penalty;
        }

        pace.max(sim_config.min_pace_multiplier)
            .min(sim_config.max_pace_multiplier)
    }

    /// fuel_penalty decreases linearly from `fuel_start_penalty` with a full tank to zero once the
    /// fuel is burned.
    pub fn fuel_penalty(&self, sim_config: &SimConfig) -> f64 {
        sim_config.fuel_start_penalty * (1.0 - self.fuel_fraction_burned)
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (LAP AND PIT HANDLING) --------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn complete_lap<R: Rng + ?Sized>(&mut self, sim_config: &SimConfig, rng: &mut R) {
        self.lap += 1;
        self.total_laps_completed += 1;
        self.tireset.drive_lap();
        self.fuel_fraction_burned =
            (self.fuel_fraction_burned + sim_config.fuel_burn_fraction_per_lap()).min(1.0);

        // lap noise is drawn once per lap
        let variance = sim_config.lap_variance;
        self.lap_noise = Uniform::new_inclusive(-variance, variance).sample(rng);

        let lap_time = self.lap_time_elapsed;
        if self.best_lap_time.map_or(true, |best| lap_time < best) {
            self.best_lap_time = Some(lap_time);
        }
        self.last_lap_time = Some(lap_time);
        self.lap_time_elapsed = 0.0;
    }

    /// decide_pit_stop is evaluated once per lap boundary. Past the tire cliff the stop is likely,
    /// within the pit window before it less so. No stops are made in the first lap or in the last
    /// `last_laps_no_pit` laps.
    fn decide_pit_stop<R: Rng + ?Sized>(
        &mut self,
        sim_config: &SimConfig,
        rng: &mut R,
    ) -> Option<PitCall> {
        if self.in_pit
            || self.lap <= 1
            || self.lap >= sim_config.race_laps.saturating_sub(sim_config.pit.last_laps_no_pit)
        {
            return None;
        }

        let chance = if self.tireset.past_cliff(sim_config) {
            sim_config.pit.chance_after_cliff
        } else if self.tireset.near_cliff(sim_config) {
            sim_config.pit.chance_near_cliff
        } else {
            return None;
        };

        if !rng.gen_bool(chance) {
            return None;
        }

        let variance = sim_config.pit.variance;
        let stop_time = sim_config.pit.base_time
            + Uniform::new_inclusive(-variance, variance).sample(rng);
        let compound = next_compound(self.tireset.compound, rng);

        self.tireset = Tireset::new(compound);
        self.in_pit = true;
        self.pit_time_remaining = stop_time;
        self.pit_stops += 1;

        Some(PitCall {
            compound,
            stop_time,
        })
    }

    // ---------------------------------------------------------------------------------------------
    // GETTERS -------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn id(&self) -> u32 {
        self.entrant.id
    }

    pub fn short(&self) -> &str {
        &self.entrant.short
    }

    pub fn pace_multiplier(&self) -> f64 {
        self.pace_multiplier
    }

    /// total_progress returns the race progress in laps, i.e. completed laps plus lap fraction.
    pub fn total_progress(&self) -> f64 {
        (self.lap - 1) as f64 + self.progress
    }

    pub fn status(&self) -> CompetitorStatus {
        if self.in_pit {
            CompetitorStatus::Pit
        } else if self.pit_stops > 0 && self.tireset.age <= 2 {
            CompetitorStatus::OutLap
        } else {
            CompetitorStatus::Running
        }
    }

    /// display_position returns the circuit coordinates including the lateral display offset.
    pub fn display_position(&self, circuit: &Circuit) -> Point {
        circuit.offset_position_at(self.progress, self.lateral_offset)
    }

    /// lap_fraction returns the progress reduced into `[0, 1)`.
    pub fn lap_fraction(&self) -> f64 {
        lap_frac(self.progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::circuit::{CircuitPars, SpeedZone};
    use crate::core::driver::{SynergyClass, Tier};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn circuit_with_zone() -> Circuit {
        Circuit::new(&CircuitPars {
            waypoints: vec![[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]],
            speed_zones: vec![SpeedZone {
                start: 0.1,
                end: 0.3,
            }],
            wear_multiplier: 1.0,
            info: None,
        })
        .unwrap()
    }

    fn entrant(tier: Tier, synergy: SynergyClass) -> Entrant {
        Entrant {
            id: 44,
            name: String::from("Test Driver"),
            short: String::from("TST"),
            team: String::from("Test Team"),
            tier,
            synergy,
            color: String::from("#00D2BE"),
        }
    }

    fn competitor(grid_position: u32) -> Competitor {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        Competitor::new(
            entrant(Tier::B, SynergyClass::Neutral),
            grid_position,
            &SimConfig::default(),
            &mut rng,
        )
    }

    #[test]
    fn grid_is_two_wide_and_staggered() {
        let grid = SimConfig::default().grid;
        let (p1, o1) = grid_slot(1, &grid);
        let (p2, o2) = grid_slot(2, &grid);
        let (p5, o5) = grid_slot(5, &grid);

        assert_abs_diff_eq!(p1, 0.0);
        assert_abs_diff_eq!(p2, -0.005, epsilon = 1e-12);
        assert_abs_diff_eq!(p5, -0.030, epsilon = 1e-12);
        assert_abs_diff_eq!(o1, -10.0);
        assert_abs_diff_eq!(o2, 10.0);
        assert_abs_diff_eq!(o5, -10.0);
    }

    #[test]
    fn assist_needs_gap_and_zone() {
        let cfg = SimConfig::default();
        let circuit = circuit_with_zone();
        let mut car = competitor(2);
        car.gap_to_ahead_s = 0.5;
        car.lap = 2;
        car.progress = 0.2;

        car.update_assist(&circuit, &cfg);
        assert!(car.assist_available);
        assert!(car.assist_active);

        car.progress = 0.5;
        car.update_assist(&circuit, &cfg);
        assert!(car.assist_available);
        assert!(!car.assist_active);
    }

    #[test]
    fn assist_is_disabled_in_first_lap_and_beyond_threshold() {
        let cfg = SimConfig::default();
        let circuit = circuit_with_zone();
        let mut car = competitor(2);
        car.gap_to_ahead_s = 0.5;
        car.progress = 0.2;

        car.update_assist(&circuit, &cfg);
        assert!(!car.assist_available);

        car.lap = 3;
        car.gap_to_ahead_s = 1.5;
        car.update_assist(&circuit, &cfg);
        assert!(!car.assist_available);
        assert!(!car.assist_active);
    }

    #[test]
    fn assist_boost_raises_pace() {
        let cfg = SimConfig::default();
        let circuit = circuit_with_zone();
        let mut car = competitor(2);
        let base = car.calc_pace_multiplier(&circuit, &cfg);

        car.assist_active = true;
        let boosted = car.calc_pace_multiplier(&circuit, &cfg);
        assert_abs_diff_eq!(boosted - base, cfg.assist.speed_boost, epsilon = 1e-12);
    }

    #[test]
    fn fresh_car_pace_is_tier_synergy_minus_fuel() {
        let cfg = SimConfig::default();
        let circuit = circuit_with_zone();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let car = Competitor::new(entrant(Tier::S, SynergyClass::High), 1, &cfg, &mut rng);

        assert_abs_diff_eq!(
            car.calc_pace_multiplier(&circuit, &cfg),
            1.04 * 1.02 - 0.04,
            epsilon = 1e-12
        );
    }

    #[test]
    fn pit_lane_slows_the_car() {
        let cfg = SimConfig::default();
        let circuit = circuit_with_zone();
        let mut car = competitor(3);
        let racing = car.calc_pace_multiplier(&circuit, &cfg);

        car.in_pit = true;
        assert_abs_diff_eq!(
            car.calc_pace_multiplier(&circuit, &cfg),
            racing * cfg.pit.speed_penalty,
            epsilon = 1e-12
        );
    }

    #[test]
    fn pit_stop_ends_after_stop_time() {
        let cfg = SimConfig::default();
        let circuit = circuit_with_zone();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut car = competitor(3);
        car.in_pit = true;
        car.pit_time_remaining = 0.05;
        car.pit_stops = 1;

        let outcome = car.advance(1.0 / 60.0, &circuit, &cfg, &mut rng);
        assert!(!outcome.pit_exit);
        assert_eq!(car.status(), CompetitorStatus::Pit);

        let mut exited = false;
        for _ in 0..5 {
            exited |= car.advance(1.0 / 60.0, &circuit, &cfg, &mut rng).pit_exit;
        }
        assert!(exited);
        assert!(!car.in_pit);
        assert_eq!(car.status(), CompetitorStatus::OutLap);
    }

    #[test]
    fn lap_crossing_updates_lap_state() {
        let cfg = SimConfig::default();
        let circuit = circuit_with_zone();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut car = competitor(1);
        car.progress = 0.999;
        car.lap_time_elapsed = 80.0;

        let outcome = car.advance(1.0, &circuit, &cfg, &mut rng);
        assert_eq!(outcome.laps_completed, 1);
        assert_eq!(car.lap, 2);
        assert_eq!(car.total_laps_completed, 1);
        assert_eq!(car.tireset.age, 1);
        let last_lap_time = car.last_lap_time.unwrap();
        assert!(last_lap_time > 80.0 && last_lap_time < 80.1);
        assert_eq!(car.best_lap_time, Some(last_lap_time));
        assert_abs_diff_eq!(last_lap_time + car.lap_time_elapsed, 81.0, epsilon = 1e-9);
        assert_abs_diff_eq!(car.fuel_fraction_burned, 0.05, epsilon = 1e-12);
        assert!(car.progress >= 0.0 && car.progress < 1.0);
        assert!(car.lap_noise.abs() <= cfg.lap_variance);
    }

    #[test]
    fn crossing_step_is_split_between_laps() {
        let cfg = SimConfig::default();
        let circuit = circuit_with_zone();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut car = competitor(1);
        car.lap = 4;
        car.progress = 0.99;
        car.lap_time_elapsed = 75.0;

        car.advance(0.5, &circuit, &cfg, &mut rng);

        let progress_rate = cfg.base_speed * car.pace_multiplier()
            / circuit.segment_count() as f64
            * cfg.ticks_per_second;
        let dt_to_line = 0.01 / progress_rate;
        assert!(dt_to_line < 0.5);
        assert_abs_diff_eq!(car.last_lap_time.unwrap(), 75.0 + dt_to_line, epsilon = 1e-9);
        assert_abs_diff_eq!(car.lap_time_elapsed, 0.5 - dt_to_line, epsilon = 1e-9);
        assert_abs_diff_eq!(car.progress, progress_rate * (0.5 - dt_to_line), epsilon = 1e-9);
    }

    #[test]
    fn worn_tires_trigger_pit_stop_mid_race() {
        let mut cfg = SimConfig::default();
        cfg.pit.chance_after_cliff = 1.0;
        let circuit = circuit_with_zone();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut car = competitor(1);
        car.lap = 8;
        car.progress = 0.9999;
        car.tireset = Tireset {
            compound: Compound::Soft,
            age: 15,
        };

        let outcome = car.advance(1.0, &circuit, &cfg, &mut rng);
        let pit_call = outcome.pit_call.unwrap();
        assert_ne!(pit_call.compound, Compound::Soft);
        assert!(pit_call.stop_time >= cfg.pit.base_time - cfg.pit.variance);
        assert!(pit_call.stop_time <= cfg.pit.base_time + cfg.pit.variance);
        assert!(car.in_pit);
        assert_eq!(car.tireset.age, 0);
        assert_eq!(car.pit_stops, 1);
        assert_eq!(car.status(), CompetitorStatus::Pit);
    }

    #[test]
    fn no_pit_stops_in_final_laps() {
        let mut cfg = SimConfig::default();
        cfg.pit.chance_after_cliff = 1.0;
        let circuit = circuit_with_zone();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut car = competitor(1);
        car.lap = cfg.race_laps - cfg.pit.last_laps_no_pit - 1;
        car.progress = 0.9999;
        car.tireset = Tireset {
            compound: Compound::Soft,
            age: 30,
        };

        let outcome = car.advance(1.0, &circuit, &cfg, &mut rng);
        assert_eq!(outcome.laps_completed, 1);
        assert!(outcome.pit_call.is_none());
        assert!(!car.in_pit);
    }

    #[test]
    fn negative_grid_progress_resolves_on_circuit() {
        let circuit = circuit_with_zone();
        let car = competitor(6);
        assert!(car.progress < 0.0);

        let pos = car.display_position(&circuit);
        assert!(pos.x.is_finite() && pos.y.is_finite());
        assert!(car.lap_fraction() > 0.9);
        assert_abs_diff_eq!(car.total_progress(), car.progress);
    }

    proptest! {
        #[test]
        fn pace_stays_within_bounds(
            age in 0u32..500,
            burned in 0.0f64..=1.0,
            noise in -0.01f64..0.01,
            in_pit in any::<bool>(),
            assist in any::<bool>(),
            tier_idx in 0usize..5,
        ) {
            let cfg = SimConfig::default();
            let circuit = circuit_with_zone();
            let tiers = [Tier::S, Tier::A, Tier::B, Tier::C, Tier::D];
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let mut car = Competitor::new(entrant(tiers[tier_idx], SynergyClass::High), 12, &cfg, &mut rng);
            car.tireset.age = age;
            car.fuel_fraction_burned = burned;
            car.lap_noise = noise;
            car.in_pit = in_pit;
            car.assist_active = assist;

            let pace = car.calc_pace_multiplier(&circuit, &cfg);
            prop_assert!(pace > 0.0);
            prop_assert!(pace <= 1.2);
        }
    }
}
