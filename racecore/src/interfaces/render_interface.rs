use crate::core::competitor::CompetitorStatus;
use crate::core::race::{Race, RaceStatus};
use crate::core::race_event::RaceEvent;
use crate::core::tireset::Compound;
use crate::post::race_result::RaceResult;
use anyhow::Context;
use rand::Rng;

/// (Hz) Maximum rate at which snapshots are sent to a rendering collaborator.
pub const MAX_UPDATE_FREQUENCY: f64 = 20.0;
/// Number of recent events attached to every snapshot.
pub const SNAPSHOT_EVENTS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// parse converts a CSS color string, e.g. #FF8000, into RGB values.
    pub fn parse(color: &str) -> anyhow::Result<RgbColor> {
        let parsed = color
            .parse::<css_color_parser::Color>()
            .context(format!("Could not parse color {}!", color))?;

        Ok(RgbColor {
            r: parsed.r,
            g: parsed.g,
            b: parsed.b,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CarState {
    pub id: u32,
    pub short: String,
    pub team: String,
    pub color: RgbColor,
    pub position: u32,
    pub lap: u32,
    pub race_prog: f64,
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub compound: Compound,
    pub tire_age: u32,
    pub gap_to_ahead_s: f64,
    pub status: CompetitorStatus,
    pub assist_active: bool,
}

/// RaceState is a snapshot of the race as it is handed to a rendering collaborator. Cars are in
/// rank order.
#[derive(Debug, Clone)]
pub struct RaceState {
    pub race_time: f64,
    pub cur_lap: u32,
    pub race_laps: u32,
    pub status: RaceStatus,
    pub car_states: Vec<CarState>,
    pub recent_events: Vec<RaceEvent>,

    // final results payload (sent once when race finishes)
    pub final_result: Option<RaceResult>,
}

impl RaceState {
    pub fn from_race<R: Rng>(race: &Race<R>) -> anyhow::Result<RaceState> {
        let circuit = race.circuit();
        let mut car_states = Vec::with_capacity(race.ranked_roster().len());

        for c in race.ranked_roster().iter() {
            let pos = c.display_position(circuit);

            car_states.push(CarState {
                id: c.id(),
                short: c.short().to_owned(),
                team: c.entrant.team.to_owned(),
                color: RgbColor::parse(&c.entrant.color)?,
                position: c.position,
                lap: c.lap,
                race_prog: c.total_progress(),
                x: pos.x,
                y: pos.y,
                heading: circuit.heading_at(c.progress),
                compound: c.tireset.compound,
                tire_age: c.tireset.age,
                gap_to_ahead_s: c.gap_to_ahead_s,
                status: c.status(),
                assist_active: c.assist_active,
            });
        }

        Ok(RaceState {
            race_time: race.race_time(),
            cur_lap: race.cur_lap(),
            race_laps: race.sim_config().race_laps,
            status: race.status(),
            car_states,
            recent_events: race
                .event_log()
                .recent(Some(SNAPSHOT_EVENTS))
                .into_iter()
                .cloned()
                .collect(),
            final_result: None,
        })
    }
}
