use crate::core::driver::{SynergyClass, Tier};
use crate::core::tireset::TireConfig;
use crate::error::ConfigError;
use crate::pre::presets::Preset;
use serde::{Deserialize, Serialize};

/// * `base_time` - (s) Base pit stop duration
/// * `variance` - (s) Symmetric random variance around the base duration
/// * `speed_penalty` - Pace multiplier while the car is in the pits
/// * `window_laps` - Laps before the tire cliff from which on an early stop is possible
/// * `chance_after_cliff` - Probability per lap to pit once past the cliff
/// * `chance_near_cliff` - Probability per lap to pit within the window before the cliff
/// * `last_laps_no_pit` - No pit stops are made within the last N laps
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PitPars {
    pub base_time: f64,
    pub variance: f64,
    pub speed_penalty: f64,
    pub window_laps: u32,
    pub chance_after_cliff: f64,
    pub chance_near_cliff: f64,
    pub last_laps_no_pit: u32,
}

/// * `detection_threshold` - (s) Maximum gap to the car ahead to become eligible
/// * `speed_boost` - Pace added while the assist is active
/// * `enabled_from_lap` - First lap in which the assist may be used
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AssistPars {
    pub detection_threshold: f64,
    pub speed_boost: f64,
    pub enabled_from_lap: u32,
}

/// * `row_spacing` - (lap fraction) Distance between two grid rows
/// * `stagger` - (lap fraction) Additional set-back of the second car in a row
/// * `lateral_offset` - Sideways offset of the grid slots from the racing line
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GridPars {
    pub row_spacing: f64,
    pub stagger: f64,
    pub lateral_offset: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TierModifiers {
    #[serde(rename = "S")]
    pub s: f64,
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "B")]
    pub b: f64,
    #[serde(rename = "C")]
    pub c: f64,
    #[serde(rename = "D")]
    pub d: f64,
}

impl TierModifiers {
    pub fn get(&self, tier: Tier) -> f64 {
        match tier {
            Tier::S => self.s,
            Tier::A => self.a,
            Tier::B => self.b,
            Tier::C => self.c,
            Tier::D => self.d,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SynergyModifiers {
    pub high: f64,
    pub neutral: f64,
    pub low: f64,
}

impl SynergyModifiers {
    pub fn get(&self, synergy: SynergyClass) -> f64 {
        match synergy {
            SynergyClass::High => self.high,
            SynergyClass::Neutral => self.neutral,
            SynergyClass::Low => self.low,
        }
    }
}

/// SimConfig holds every tunable of the simulation. It is created once (from a preset or a JSON
/// file), validated, and then handed by reference to the race and its competitors.
///
/// * `race_laps` - Total number of race laps
/// * `simulation_speed` - Multiplier applied to the real-time step before it enters a tick
/// * `ticks_per_second` - Frames per simulated second that `base_speed` refers to
/// * `base_speed` - Waypoint segments covered per frame at pace multiplier 1.0
/// * `tire_cliff_penalty` - Pace loss added once the tire is past its cliff
/// * `max_tire_penalty` - Cap of the combined tire pace loss
/// * `fuel_start_penalty` - Pace loss with a full tank
/// * `fuel_burn_per_lap` - Pace regained per lap as fuel burns off
/// * `lap_variance` - Half-width of the uniform lap-to-lap pace noise
/// * `min_pace_multiplier` - Floor of the pace multiplier (must be positive)
/// * `max_pace_multiplier` - Ceiling of the pace multiplier
/// * `event_log_capacity` - Number of race events kept in the event log
/// * `notable_climber_min_gain` - Positions gained from the grid to count as notable climber
/// * `max_notable_climbers` - Number of climbers listed in the race end summary
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub race_laps: u32,
    pub simulation_speed: f64,
    pub ticks_per_second: f64,
    pub base_speed: f64,
    pub tires: TireConfig,
    pub tire_cliff_penalty: f64,
    pub max_tire_penalty: f64,
    pub fuel_start_penalty: f64,
    pub fuel_burn_per_lap: f64,
    pub pit: PitPars,
    pub tier_modifiers: TierModifiers,
    pub synergy_modifiers: SynergyModifiers,
    pub lap_variance: f64,
    pub assist: AssistPars,
    pub min_pace_multiplier: f64,
    pub max_pace_multiplier: f64,
    pub grid: GridPars,
    pub event_log_capacity: usize,
    pub notable_climber_min_gain: u32,
    pub max_notable_climbers: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Preset::Realistic.config()
    }
}

fn check(
    field: &'static str,
    value: f64,
    valid: bool,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if valid && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check(field, value, value >= 0.0, ">= 0")
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check(field, value, value > 0.0, "> 0")
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check(field, value, (0.0..=1.0).contains(&value), "in [0, 1]")
}

fn check_fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
    check(field, value, (0.0..1.0).contains(&value), "in [0, 1)")
}

impl SimConfig {
    /// validate rejects out-of-range parameters. It is called whenever a configuration is loaded,
    /// such that the simulation itself never has to deal with them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("race_laps", self.race_laps as f64, self.race_laps > 0, ">= 1")?;
        check_positive("simulation_speed", self.simulation_speed)?;
        check_positive("ticks_per_second", self.ticks_per_second)?;
        check_positive("base_speed", self.base_speed)?;

        for (field, pars) in [
            ("tires.soft.deg_rate", &self.tires.soft),
            ("tires.medium.deg_rate", &self.tires.medium),
            ("tires.hard.deg_rate", &self.tires.hard),
        ]
        .iter()
        {
            check_non_negative(*field, pars.deg_rate)?;
        }

        check_non_negative("tire_cliff_penalty", self.tire_cliff_penalty)?;
        check_fraction("max_tire_penalty", self.max_tire_penalty)?;
        check_fraction("fuel_start_penalty", self.fuel_start_penalty)?;
        check_non_negative("fuel_burn_per_lap", self.fuel_burn_per_lap)?;

        check_non_negative("pit.base_time", self.pit.base_time)?;
        check(
            "pit.variance",
            self.pit.variance,
            self.pit.variance >= 0.0 && self.pit.variance <= self.pit.base_time,
            "in [0, pit.base_time]",
        )?;
        check(
            "pit.speed_penalty",
            self.pit.speed_penalty,
            self.pit.speed_penalty > 0.0 && self.pit.speed_penalty <= 1.0,
            "in (0, 1]",
        )?;
        check_probability("pit.chance_after_cliff", self.pit.chance_after_cliff)?;
        check_probability("pit.chance_near_cliff", self.pit.chance_near_cliff)?;

        for (field, value) in [
            ("tier_modifiers.S", self.tier_modifiers.s),
            ("tier_modifiers.A", self.tier_modifiers.a),
            ("tier_modifiers.B", self.tier_modifiers.b),
            ("tier_modifiers.C", self.tier_modifiers.c),
            ("tier_modifiers.D", self.tier_modifiers.d),
            ("synergy_modifiers.high", self.synergy_modifiers.high),
            ("synergy_modifiers.neutral", self.synergy_modifiers.neutral),
            ("synergy_modifiers.low", self.synergy_modifiers.low),
        ]
        .iter()
        {
            check_positive(*field, *value)?;
        }

        check_fraction("lap_variance", self.lap_variance)?;
        check_non_negative("assist.detection_threshold", self.assist.detection_threshold)?;
        check_non_negative("assist.speed_boost", self.assist.speed_boost)?;

        check(
            "max_pace_multiplier",
            self.max_pace_multiplier,
            self.max_pace_multiplier > 0.0 && self.max_pace_multiplier <= 1.2,
            "in (0, 1.2]",
        )?;
        check(
            "min_pace_multiplier",
            self.min_pace_multiplier,
            self.min_pace_multiplier > 0.0 && self.min_pace_multiplier <= self.max_pace_multiplier,
            "in (0, max_pace_multiplier]",
        )?;

        check_non_negative("grid.row_spacing", self.grid.row_spacing)?;
        check_non_negative("grid.stagger", self.grid.stagger)?;
        check(
            "event_log_capacity",
            self.event_log_capacity as f64,
            self.event_log_capacity > 0,
            ">= 1",
        )?;

        Ok(())
    }

    /// theoretical_lap_time returns the lap time (s) at pace multiplier 1.0 on a circuit with the
    /// given number of waypoint segments.
    pub fn theoretical_lap_time(&self, segment_count: usize) -> f64 {
        segment_count as f64 / (self.base_speed * self.ticks_per_second)
    }

    /// fuel_burn_fraction_per_lap returns the fraction of the starting fuel load burned per lap.
    pub fn fuel_burn_fraction_per_lap(&self) -> f64 {
        if self.fuel_start_penalty > 0.0 {
            (self.fuel_burn_per_lap / self.fuel_start_penalty).min(1.0)
        } else {
            1.0
        }
    }
}
