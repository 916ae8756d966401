use serde::{Deserialize, Serialize};
use std::fmt;

/// Team performance tier, from championship contenders (S) to backmarkers (D).
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
}

impl Default for Tier {
    fn default() -> Self {
        Tier::B
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
        };
        write!(f, "{}", s)
    }
}

/// How well a driver's style matches the car characteristics.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SynergyClass {
    High,
    Neutral,
    Low,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DrivingStyle {
    Aggressive,
    Smooth,
    Adaptive,
}

impl Default for DrivingStyle {
    fn default() -> Self {
        DrivingStyle::Adaptive
    }
}

impl DrivingStyle {
    /// Preferred car (traction, balance) for the style.
    fn preference(&self) -> (i32, i32) {
        match self {
            DrivingStyle::Aggressive => (4, 0),
            DrivingStyle::Smooth => (2, 1),
            DrivingStyle::Adaptive => (3, 0),
        }
    }
}

/// * `balance` - Car balance, negative = understeer, positive = oversteer
/// * `cornering` - Cornering strength (descriptive only)
/// * `traction` - Traction level (1 - 5)
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct CarCharacteristics {
    #[serde(default)]
    pub balance: i32,
    #[serde(default)]
    pub cornering: i32,
    #[serde(default = "default_traction")]
    pub traction: i32,
}

fn default_traction() -> i32 {
    3
}

impl Default for CarCharacteristics {
    fn default() -> Self {
        CarCharacteristics {
            balance: 0,
            cornering: 0,
            traction: default_traction(),
        }
    }
}

impl SynergyClass {
    /// from_match derives the synergy class from the mismatch between driving style preference and
    /// car characteristics: a mismatch of at most 1 is high, at most 3 neutral, otherwise low.
    pub fn from_match(style: DrivingStyle, characteristics: &CarCharacteristics) -> SynergyClass {
        let (pref_traction, pref_balance) = style.preference();
        let mismatch = (characteristics.traction - pref_traction).abs()
            + (characteristics.balance - pref_balance).abs();

        if mismatch <= 1 {
            SynergyClass::High
        } else if mismatch <= 3 {
            SynergyClass::Neutral
        } else {
            SynergyClass::Low
        }
    }
}

/// * `number` - Car number, used as the competitor id
/// * `name` - Driver name, e.g. Valtteri Bottas
/// * `short` - Three-letter driver code, e.g. BOT
/// * `style` - Driving style, determines the synergy with the car
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DriverPars {
    pub number: u32,
    pub name: String,
    pub short: String,
    #[serde(default)]
    pub style: DrivingStyle,
}

/// * `name` - Team name
/// * `tier` - Performance tier
/// * `color` - Team color as CSS color string, e.g. #FF8000
/// * `characteristics` - Car characteristics
/// * `drivers` - Drivers racing for the team
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TeamPars {
    pub name: String,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub characteristics: CarCharacteristics,
    pub drivers: Vec<DriverPars>,
}

fn default_color() -> String {
    String::from("#FFFFFF")
}

/// Entrant is the flattened identity of one competitor, i.e. a driver together with the team
/// information relevant to the simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entrant {
    pub id: u32,
    pub name: String,
    pub short: String,
    pub team: String,
    pub tier: Tier,
    pub synergy: SynergyClass,
    pub color: String,
}

impl Entrant {
    pub fn new(driver: &DriverPars, team: &TeamPars) -> Entrant {
        Entrant {
            id: driver.number,
            name: driver.name.to_owned(),
            short: driver.short.to_owned(),
            team: team.name.to_owned(),
            tier: team.tier,
            synergy: SynergyClass::from_match(driver.style, &team.characteristics),
            color: team.color.to_owned(),
        }
    }
}

/// entrants_from_teams flattens the team records into the list of entrants in team order.
pub fn entrants_from_teams(teams: &[TeamPars]) -> Vec<Entrant> {
    teams
        .iter()
        .flat_map(|team| team.drivers.iter().map(move |driver| Entrant::new(driver, team)))
        .collect()
}
