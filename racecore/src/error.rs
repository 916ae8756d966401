use thiserror::Error;

/// CircuitError is returned if a circuit definition cannot be turned into a usable circuit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CircuitError {
    #[error("circuit needs at least 3 waypoints, got {waypoints}")]
    Degenerate { waypoints: usize },

    #[error("all circuit waypoints coincide, the circuit has zero length")]
    ZeroLength,

    #[error("waypoint {0} has a non-finite coordinate")]
    NonFiniteWaypoint(usize),

    #[error("unknown circuit '{0}'")]
    UnknownCircuit(String),

    #[error("invalid speed zone [{start}, {end}], bounds must lie in [0, 1) and differ")]
    InvalidSpeedZone { start: f64, end: f64 },

    #[error("wear multiplier must be positive and finite, got {0}")]
    InvalidWearMultiplier(f64),
}

/// ConfigError is returned by the configuration validation if some simulation parameter does not
/// fulfill the posed requirements.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("parameter {field} = {value} is out of range, expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("a race needs at least one entrant")]
    EmptyRoster,

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RaceError {
    #[error("time step must be finite and non-negative, got {0}")]
    InvalidTimestep(f64),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Circuit(#[from] CircuitError),
}
