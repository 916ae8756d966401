use crate::core::competitor::Competitor;
use crate::core::tireset::Compound;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Reference to a competitor inside an event, i.e. the id together with the short code for
/// display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetitorRef {
    pub id: u32,
    pub short: String,
}

impl From<&Competitor> for CompetitorRef {
    fn from(competitor: &Competitor) -> Self {
        CompetitorRef {
            id: competitor.id(),
            short: competitor.short().to_owned(),
        }
    }
}

impl fmt::Display for CompetitorRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.short)
    }
}

/// * `competitor` - Finisher who gained positions
/// * `positions_gained` - Grid position minus final position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Climber {
    pub competitor: CompetitorRef,
    pub positions_gained: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EventKind {
    RaceStart,
    Overtake,
    PitEntry,
    PitExit,
    FastestLap,
    BlueFlag,
    RaceEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RaceEventKind {
    RaceStart,
    Overtake {
        passer: CompetitorRef,
        passed: CompetitorRef,
    },
    PitEntry {
        competitor: CompetitorRef,
        compound: Compound,
        stop_time: f64,
    },
    PitExit {
        competitor: CompetitorRef,
        compound: Compound,
    },
    FastestLap {
        competitor: CompetitorRef,
        lap_time: f64,
    },
    BlueFlag {
        lapped: CompetitorRef,
        lapping: CompetitorRef,
    },
    RaceEnd {
        winner: CompetitorRef,
        margin_seconds: f64,
        climbers: Vec<Climber>,
    },
}

/// * `lap` - Lap of the leader at the time of the event
/// * `timestamp` - (s) Race time at which the event occurred
/// * `kind` - Event type together with its payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceEvent {
    pub lap: u32,
    pub timestamp: f64,
    pub kind: RaceEventKind,
}

impl RaceEvent {
    pub fn new(lap: u32, timestamp: f64, kind: RaceEventKind) -> RaceEvent {
        RaceEvent {
            lap,
            timestamp,
            kind,
        }
    }

    pub fn event_kind(&self) -> EventKind {
        match self.kind {
            RaceEventKind::RaceStart => EventKind::RaceStart,
            RaceEventKind::Overtake { .. } => EventKind::Overtake,
            RaceEventKind::PitEntry { .. } => EventKind::PitEntry,
            RaceEventKind::PitExit { .. } => EventKind::PitExit,
            RaceEventKind::FastestLap { .. } => EventKind::FastestLap,
            RaceEventKind::BlueFlag { .. } => EventKind::BlueFlag,
            RaceEventKind::RaceEnd { .. } => EventKind::RaceEnd,
        }
    }

    /// involved returns the competitors taking part in the event in their significant order, e.g.
    /// passer before passed or winner before the notable climbers.
    pub fn involved(&self) -> Vec<&CompetitorRef> {
        match &self.kind {
            RaceEventKind::RaceStart => vec![],
            RaceEventKind::Overtake { passer, passed } => vec![passer, passed],
            RaceEventKind::PitEntry { competitor, .. }
            | RaceEventKind::PitExit { competitor, .. }
            | RaceEventKind::FastestLap { competitor, .. } => vec![competitor],
            RaceEventKind::BlueFlag { lapped, lapping } => vec![lapped, lapping],
            RaceEventKind::RaceEnd {
                winner, climbers, ..
            } => std::iter::once(winner)
                .chain(climbers.iter().map(|climber| &climber.competitor))
                .collect(),
        }
    }
}

impl fmt::Display for RaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Lap {:>3} | {:>8.3}s | ", self.lap, self.timestamp)?;

        match &self.kind {
            RaceEventKind::RaceStart => write!(f, "Race start"),
            RaceEventKind::Overtake { passer, passed } => {
                write!(f, "{} overtakes {}", passer, passed)
            }
            RaceEventKind::PitEntry {
                competitor,
                compound,
                stop_time,
            } => write!(
                f,
                "{} pits for {} tires ({:.1}s)",
                competitor, compound, stop_time
            ),
            RaceEventKind::PitExit {
                competitor,
                compound,
            } => write!(f, "{} exits the pits on {} tires", competitor, compound),
            RaceEventKind::FastestLap {
                competitor,
                lap_time,
            } => write!(f, "{} sets fastest lap: {}", competitor, format_lap_time(*lap_time)),
            RaceEventKind::BlueFlag { lapped, lapping } => {
                write!(f, "Blue flag for {}, lapped by {}", lapped, lapping)
            }
            RaceEventKind::RaceEnd {
                winner,
                margin_seconds,
                climbers,
            } => {
                write!(f, "{} wins by {:.1}s", winner, margin_seconds)?;
                for climber in climbers.iter() {
                    write!(f, ", {} (+{})", climber.competitor, climber.positions_gained)?;
                }
                Ok(())
            }
        }
    }
}

/// format_lap_time formats a lap time as `M:SS.mmm`.
pub fn format_lap_time(lap_time: f64) -> String {
    let minutes = (lap_time / 60.0).floor();
    let seconds = lap_time - minutes * 60.0;
    format!("{}:{:06.3}", minutes as u32, seconds)
}

/// count_events returns the number of events per event kind.
pub fn count_events<'a, I>(events: I) -> BTreeMap<EventKind, usize>
where
    I: IntoIterator<Item = &'a RaceEvent>,
{
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(event.event_kind()).or_insert(0) += 1;
    }
    counts
}
