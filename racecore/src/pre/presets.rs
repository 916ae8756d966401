use crate::core::tireset::{CompoundPars, TireConfig};
use crate::error::ConfigError;
use crate::pre::sim_config::{
    AssistPars, GridPars, PitPars, SimConfig, SynergyModifiers, TierModifiers,
};

/// Built-in parameter sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Realistic,
    Balanced,
    Chaos,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Realistic, Preset::Balanced, Preset::Chaos];

    pub fn from_name(name: &str) -> Result<Preset, ConfigError> {
        Preset::ALL
            .iter()
            .copied()
            .find(|preset| preset.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_owned()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Realistic => "Realistic",
            Preset::Balanced => "Balanced",
            Preset::Chaos => "Chaos",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::Realistic => "Default simulation values",
            Preset::Balanced => "Tighter field, closer racing with reduced tier gaps",
            Preset::Chaos => "Fast tire wear, high variance, unpredictable races",
        }
    }

    pub fn config(&self) -> SimConfig {
        let realistic = realistic();
        match self {
            Preset::Realistic => realistic,
            Preset::Balanced => SimConfig {
                tires: tire_config([(0.003, 15), (0.0015, 25), (0.001, 35)]),
                tire_cliff_penalty: 0.08,
                max_tire_penalty: 0.15,
                fuel_start_penalty: 0.03,
                pit: PitPars {
                    base_time: 3.5,
                    variance: 0.5,
                    window_laps: 3,
                    chance_after_cliff: 0.7,
                    chance_near_cliff: 0.25,
                    ..realistic.pit.clone()
                },
                tier_modifiers: TierModifiers {
                    s: 1.02,
                    a: 1.01,
                    b: 1.00,
                    c: 0.99,
                    d: 0.98,
                },
                synergy_modifiers: SynergyModifiers {
                    high: 1.01,
                    neutral: 1.00,
                    low: 0.99,
                },
                lap_variance: 0.004,
                ..realistic
            },
            Preset::Chaos => SimConfig {
                race_laps: 15,
                tires: tire_config([(0.008, 6), (0.005, 10), (0.003, 15)]),
                tire_cliff_penalty: 0.15,
                max_tire_penalty: 0.30,
                fuel_start_penalty: 0.06,
                fuel_burn_per_lap: 0.003,
                pit: PitPars {
                    base_time: 3.0,
                    variance: 2.0,
                    window_laps: 1,
                    chance_after_cliff: 0.9,
                    chance_near_cliff: 0.5,
                    last_laps_no_pit: 2,
                    ..realistic.pit.clone()
                },
                tier_modifiers: TierModifiers {
                    s: 1.03,
                    a: 1.01,
                    b: 1.00,
                    c: 0.99,
                    d: 0.97,
                },
                synergy_modifiers: SynergyModifiers {
                    high: 1.03,
                    neutral: 1.00,
                    low: 0.97,
                },
                lap_variance: 0.010,
                ..realistic
            },
        }
    }
}

fn tire_config(pars: [(f64, u32); 3]) -> TireConfig {
    let [soft, medium, hard] = pars;
    TireConfig {
        soft: CompoundPars {
            deg_rate: soft.0,
            cliff_lap: soft.1,
        },
        medium: CompoundPars {
            deg_rate: medium.0,
            cliff_lap: medium.1,
        },
        hard: CompoundPars {
            deg_rate: hard.0,
            cliff_lap: hard.1,
        },
    }
}

fn realistic() -> SimConfig {
    SimConfig {
        race_laps: 20,
        simulation_speed: 1.0,
        ticks_per_second: 60.0,
        base_speed: 0.014,
        tires: tire_config([(0.004, 12), (0.002, 20), (0.001, 30)]),
        tire_cliff_penalty: 0.10,
        max_tire_penalty: 0.20,
        fuel_start_penalty: 0.04,
        fuel_burn_per_lap: 0.002,
        pit: PitPars {
            base_time: 4.0,
            variance: 1.0,
            speed_penalty: 0.3,
            window_laps: 2,
            chance_after_cliff: 0.8,
            chance_near_cliff: 0.3,
            last_laps_no_pit: 3,
        },
        tier_modifiers: TierModifiers {
            s: 1.04,
            a: 1.02,
            b: 1.00,
            c: 0.98,
            d: 0.95,
        },
        synergy_modifiers: SynergyModifiers {
            high: 1.02,
            neutral: 1.00,
            low: 0.98,
        },
        lap_variance: 0.005,
        assist: AssistPars {
            detection_threshold: 1.0,
            speed_boost: 0.08,
            enabled_from_lap: 2,
        },
        min_pace_multiplier: 0.05,
        max_pace_multiplier: 1.2,
        grid: GridPars {
            row_spacing: 0.015,
            stagger: 0.005,
            lateral_offset: 10.0,
        },
        event_log_capacity: 50,
        notable_climber_min_gain: 3,
        max_notable_climbers: 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_validate() {
        for preset in Preset::ALL.iter() {
            assert_eq!(preset.config().validate(), Ok(()), "{}", preset.name());
        }
    }

    #[test]
    fn presets_are_found_by_name() {
        assert_eq!(Preset::from_name("chaos"), Ok(Preset::Chaos));
        assert_eq!(Preset::from_name("Balanced"), Ok(Preset::Balanced));
        assert_eq!(
            Preset::from_name("sprint"),
            Err(ConfigError::UnknownPreset(String::from("sprint")))
        );
    }

    #[test]
    fn chaos_is_shorter_and_harsher() {
        let chaos = Preset::Chaos.config();
        let realistic = Preset::Realistic.config();
        assert!(chaos.race_laps < realistic.race_laps);
        assert!(chaos.tires.soft.deg_rate > realistic.tires.soft.deg_rate);
        assert!(chaos.tires.soft.cliff_lap < realistic.tires.soft.cliff_lap);
        assert_eq!(chaos.assist, realistic.assist);
    }
}
