use crate::pre::sim_config::SimConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
}

impl Compound {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compound::Soft => "SOFT",
            Compound::Medium => "MEDIUM",
            Compound::Hard => "HARD",
        }
    }

    /// The two compounds a team may switch to when pitting off this one.
    pub fn alternatives(&self) -> [Compound; 2] {
        match self {
            Compound::Soft => [Compound::Medium, Compound::Hard],
            Compound::Medium => [Compound::Hard, Compound::Soft],
            Compound::Hard => [Compound::Medium, Compound::Soft],
        }
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// * `deg_rate` - Pace loss per lap of tire age (fraction of base pace)
/// * `cliff_lap` - Tire age (laps) from which on the cliff penalty applies
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct CompoundPars {
    pub deg_rate: f64,
    pub cliff_lap: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TireConfig {
    pub soft: CompoundPars,
    pub medium: CompoundPars,
    pub hard: CompoundPars,
}

impl TireConfig {
    pub fn for_compound(&self, compound: Compound) -> &CompoundPars {
        match compound {
            Compound::Soft => &self.soft,
            Compound::Medium => &self.medium,
            Compound::Hard => &self.hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tireset {
    pub compound: Compound,
    pub age: u32,
}

impl Tireset {
    pub fn new(compound: Compound) -> Tireset {
        Tireset { compound, age: 0 }
    }

    /// drive_lap increases the tire age by one lap.
    pub fn drive_lap(&mut self) {
        self.age += 1;
    }

    /// penalty returns the current pace loss due to tire degradation as a fraction of base pace.
    ///
    /// * linear part: `age * deg_rate * wear_multiplier`
    /// * cliff part: fixed `tire_cliff_penalty` once `age >= cliff_lap`
    ///
    /// The sum is capped at `max_tire_penalty`, i.e. tire age has no upper bound but degradation
    /// has.
    pub fn penalty(&self, sim_config: &SimConfig, wear_multiplier: f64) -> f64 {
        let pars = sim_config.tires.for_compound(self.compound);
        let mut penalty = self.age as f64 * pars.deg_rate * wear_multiplier;

        if self.past_cliff(sim_config) {
            penalty += sim_config.tire_cliff_penalty;
        }

        penalty.min(sim_config.max_tire_penalty)
    }

    pub fn past_cliff(&self, sim_config: &SimConfig) -> bool {
        self.age >= sim_config.tires.for_compound(self.compound).cliff_lap
    }

    /// near_cliff is true if the tire age lies within `window_laps` before the cliff (or beyond).
    pub fn near_cliff(&self, sim_config: &SimConfig) -> bool {
        let cliff_lap = sim_config.tires.for_compound(self.compound).cliff_lap;
        self.age >= cliff_lap.saturating_sub(sim_config.pit.window_laps)
    }
}

/// starting_compound picks the tire a car starts the race on. The top ten start on softs, the rest
/// choose between medium and soft.
pub fn starting_compound<R: Rng + ?Sized>(grid_position: u32, rng: &mut R) -> Compound {
    if grid_position <= 10 {
        Compound::Soft
    } else if rng.gen_bool(0.5) {
        Compound::Medium
    } else {
        Compound::Soft
    }
}

/// next_compound picks the compound fitted at a pit stop.
pub fn next_compound<R: Rng + ?Sized>(current: Compound, rng: &mut R) -> Compound {
    let [first, second] = current.alternatives();
    if rng.gen_bool(0.5) {
        first
    } else {
        second
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn penalty_is_linear_before_cliff() {
        let cfg = SimConfig::default();
        let mut tireset = Tireset::new(Compound::Medium);
        for _ in 0..10 {
            tireset.drive_lap();
        }
        assert_abs_diff_eq!(tireset.penalty(&cfg, 1.0), 10.0 * 0.002, epsilon = 1e-12);
        assert_abs_diff_eq!(tireset.penalty(&cfg, 1.4), 10.0 * 0.002 * 1.4, epsilon = 1e-12);
    }

    #[test]
    fn cliff_adds_fixed_penalty() {
        let cfg = SimConfig::default();
        let tireset = Tireset {
            compound: Compound::Soft,
            age: 12,
        };
        assert!(tireset.past_cliff(&cfg));
        assert_abs_diff_eq!(
            tireset.penalty(&cfg, 1.0),
            12.0 * 0.004 + cfg.tire_cliff_penalty,
            epsilon = 1e-12
        );
    }

    #[test]
    fn penalty_never_exceeds_cap() {
        let cfg = SimConfig::default();
        for compound in [Compound::Soft, Compound::Medium, Compound::Hard].iter() {
            for age in [0u32, 5, 30, 200, 10_000].iter() {
                let tireset = Tireset {
                    compound: *compound,
                    age: *age,
                };
                assert!(tireset.penalty(&cfg, 1.4) <= cfg.max_tire_penalty);
            }
        }
    }

    #[test]
    fn near_cliff_respects_pit_window() {
        let cfg = SimConfig::default();
        let tireset = Tireset {
            compound: Compound::Soft,
            age: 10,
        };
        assert!(tireset.near_cliff(&cfg));
        assert!(!tireset.past_cliff(&cfg));

        let fresh = Tireset {
            compound: Compound::Soft,
            age: 9,
        };
        assert!(!fresh.near_cliff(&cfg));
    }

    #[test]
    fn pit_stop_always_changes_compound() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for current in [Compound::Soft, Compound::Medium, Compound::Hard].iter() {
            for _ in 0..20 {
                assert_ne!(next_compound(*current, &mut rng), *current);
            }
        }
    }

    #[test]
    fn front_of_grid_starts_on_softs() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for grid_position in 1..=10 {
            assert_eq!(starting_compound(grid_position, &mut rng), Compound::Soft);
        }
        for _ in 0..20 {
            assert_ne!(starting_compound(15, &mut rng), Compound::Hard);
        }
    }
}
