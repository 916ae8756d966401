use crate::error::CircuitError;
use helpers::general::{floor_index, lap_frac, wrap_angle};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Point in circuit coordinate space (canvas units, not display pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    fn offset(&self, dir: (f64, f64), dist: f64) -> Point {
        Point::new(self.x + dir.0 * dist, self.y + dir.1 * dist)
    }
}

/// * `start` - Lap fraction at which the zone begins
/// * `end` - Lap fraction at which the zone ends, `start > end` means the zone wraps through 0
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct SpeedZone {
    pub start: f64,
    pub end: f64,
}

impl SpeedZone {
    /// contains checks a lap fraction in `[0, 1)` against the zone, both bounds inclusive.
    pub fn contains(&self, frac: f64) -> bool {
        if self.start <= self.end {
            frac >= self.start && frac <= self.end
        } else {
            frac >= self.start || frac <= self.end
        }
    }

    /// length returns the lap fraction covered by the zone.
    pub fn length(&self) -> f64 {
        if self.start <= self.end {
            self.end - self.start
        } else {
            1.0 - self.start + self.end
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CircuitCategory {
    Street,
    Permanent,
}

/// Descriptive identity of a real-world circuit. None of these values enter the simulation.
///
/// * `name` - Circuit name, e.g. Circuit de Monaco
/// * `location` - Location, e.g. Monte Carlo, Monaco
/// * `length_km` - (km) Real length of the circuit
/// * `category` - Street or permanent circuit
/// * `famous_corners` - Names of well-known corners
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CircuitInfo {
    pub name: String,
    pub location: String,
    pub length_km: f64,
    pub category: CircuitCategory,
    #[serde(default)]
    pub famous_corners: Vec<String>,
}

fn default_wear_multiplier() -> f64 {
    1.0
}

/// Structured circuit definition as it is read from JSON.
///
/// * `waypoints` - Closed sequence of 2-D points, the last one connects to the first
/// * `speed_zones` - Zones in which the speed assist may be used
/// * `wear_multiplier` - Scales tire degradation on this circuit
/// * `info` - Identity of a real circuit (absent for custom circuits)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CircuitPars {
    pub waypoints: Vec<[f64; 2]>,
    #[serde(default)]
    pub speed_zones: Vec<SpeedZone>,
    #[serde(default = "default_wear_multiplier")]
    pub wear_multiplier: f64,
    #[serde(default)]
    pub info: Option<CircuitInfo>,
}

impl CircuitPars {
    /// with_waypoints replaces the geometry while keeping zones, wear and identity.
    pub fn with_waypoints(mut self, waypoints: Vec<[f64; 2]>) -> CircuitPars {
        self.waypoints = waypoints;
        self
    }
}

/// Circuit is the immutable geometry of the race track. All queries take a progress value that is
/// reduced modulo 1.0 with floor semantics, i.e. negative values (grid slots behind the line)
/// resolve to the end of the previous lap.
#[derive(Debug, Clone)]
pub struct Circuit {
    waypoints: Vec<Point>,
    speed_zones: Vec<SpeedZone>,
    wear_multiplier: f64,
    info: Option<CircuitInfo>,
}

impl Circuit {
    pub fn new(circuit_pars: &CircuitPars) -> Result<Circuit, CircuitError> {
        let n = circuit_pars.waypoints.len();
        if n < 3 {
            return Err(CircuitError::Degenerate { waypoints: n });
        }

        if let Some(idx) = circuit_pars
            .waypoints
            .iter()
            .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(CircuitError::NonFiniteWaypoint(idx));
        }

        let waypoints: Vec<Point> = circuit_pars
            .waypoints
            .iter()
            .map(|p| Point::new(p[0], p[1]))
            .collect();

        if (0..n).all(|i| segment_length(&waypoints, i) == 0.0) {
            return Err(CircuitError::ZeroLength);
        }

        for zone in circuit_pars.speed_zones.iter() {
            let in_range = |v: f64| (0.0..1.0).contains(&v);
            if !in_range(zone.start) || !in_range(zone.end) || zone.start == zone.end {
                return Err(CircuitError::InvalidSpeedZone {
                    start: zone.start,
                    end: zone.end,
                });
            }
        }

        let wear = circuit_pars.wear_multiplier;
        if !(wear.is_finite() && wear > 0.0) {
            return Err(CircuitError::InvalidWearMultiplier(wear));
        }

        Ok(Circuit {
            waypoints,
            speed_zones: circuit_pars.speed_zones.to_owned(),
            wear_multiplier: wear,
            info: circuit_pars.info.to_owned(),
        })
    }

    // ---------------------------------------------------------------------------------------------
    // ACCESSORS -----------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn waypoints(&self) -> &[Point] {
        &self.waypoints
    }

    /// segment_count returns the number of waypoint segments (equal to the waypoint count since
    /// the circuit is closed).
    pub fn segment_count(&self) -> usize {
        self.waypoints.len()
    }

    pub fn speed_zones(&self) -> &[SpeedZone] {
        &self.speed_zones
    }

    pub fn wear_multiplier(&self) -> f64 {
        self.wear_multiplier
    }

    pub fn info(&self) -> Option<&CircuitInfo> {
        self.info.as_ref()
    }

    pub fn name(&self) -> &str {
        self.info.as_ref().map_or("Custom circuit", |info| info.name.as_str())
    }

    pub fn is_real_circuit(&self) -> bool {
        self.info.is_some()
    }

    // ---------------------------------------------------------------------------------------------
    // GEOMETRY QUERIES ----------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// position_at returns the coordinates at the given progress by linear interpolation between
    /// the two bracketing waypoints.
    pub fn position_at(&self, progress: f64) -> Point {
        let n = self.waypoints.len();
        let (idx, t) = floor_index(progress * n as f64, n);
        let p1 = self.waypoints[idx];
        let p2 = self.waypoints[(idx + 1) % n];

        Point::new(p1.x + (p2.x - p1.x) * t, p1.y + (p2.y - p1.y) * t)
    }

    /// heading_at returns the direction of travel (rad) at the given progress. It blends the
    /// heading of the current segment into the one of the next segment, taking the short way
    /// around at the +-pi seam.
    pub fn heading_at(&self, progress: f64) -> f64 {
        let n = self.waypoints.len();
        let (idx, t) = floor_index(progress * n as f64, n);
        let angle_cur = self.segment_heading(idx);
        let angle_next = self.segment_heading((idx + 1) % n);

        angle_cur + wrap_angle(angle_next - angle_cur) * t
    }

    /// offset_position_at returns the position shifted perpendicular to the heading, positive
    /// offsets to the right-hand side of the direction of travel in screen coordinates (y down).
    pub fn offset_position_at(&self, progress: f64, lateral_offset: f64) -> Point {
        let pos = self.position_at(progress);
        let perp = self.heading_at(progress) + FRAC_PI_2;

        Point::new(
            pos.x + lateral_offset * perp.cos(),
            pos.y + lateral_offset * perp.sin(),
        )
    }

    /// in_speed_zone checks if the given progress lies within any speed zone.
    pub fn in_speed_zone(&self, progress: f64) -> bool {
        let frac = lap_frac(progress);
        self.speed_zones.iter().any(|zone| zone.contains(frac))
    }

    /// boundary_polylines returns the (left, right) track edges at `half_width` from the
    /// waypoints. The offset direction at each waypoint is the average of the normals of its two
    /// adjacent segments (bevel join). Each edge point lies at `half_width` from its waypoint
    /// along that averaged normal, its distance to the adjacent segments shrinks towards
    /// `half_width * cos(theta / 2)` at a corner with turning angle `theta`.
    pub fn boundary_polylines(&self, half_width: f64) -> (Vec<Point>, Vec<Point>) {
        let n = self.waypoints.len();
        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);

        for i in 0..n {
            let normal_in = self.segment_normal((i + n - 1) % n, false);
            let normal_out = self.segment_normal(i, true);

            let sum = (normal_in.0 + normal_out.0, normal_in.1 + normal_out.1);
            let norm = (sum.0 * sum.0 + sum.1 * sum.1).sqrt();

            // hairpins that fully reverse the direction cancel the normals out
            let dir = if norm > 1e-9 {
                (sum.0 / norm, sum.1 / norm)
            } else {
                normal_out
            };

            left.push(self.waypoints[i].offset(dir, half_width));
            right.push(self.waypoints[i].offset(dir, -half_width));
        }

        (left, right)
    }

    /// corner_indices returns the indices of all waypoints at which the heading changes by more
    /// than `threshold_deg`.
    pub fn corner_indices(&self, threshold_deg: f64) -> Vec<usize> {
        let n = self.waypoints.len();
        let threshold = threshold_deg.to_radians();

        (0..n)
            .filter(|&i| {
                let prev = (i + n - 1) % n;
                if segment_length(&self.waypoints, prev) == 0.0
                    || segment_length(&self.waypoints, i) == 0.0
                {
                    return false;
                }
                wrap_angle(self.segment_heading(i) - self.segment_heading(prev)).abs() > threshold
            })
            .collect()
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn segment_heading(&self, idx: usize) -> f64 {
        let n = self.waypoints.len();
        let p1 = self.waypoints[idx];
        let p2 = self.waypoints[(idx + 1) % n];
        (p2.y - p1.y).atan2(p2.x - p1.x)
    }

    /// segment_normal returns the unit normal (-dy, dx) of segment `idx`. A zero-length segment has
    /// no normal, in that case the nearest non-degenerate segment is used, searching forwards or
    /// backwards along the circuit. Construction guarantees that such a segment exists.
    fn segment_normal(&self, idx: usize, search_forward: bool) -> (f64, f64) {
        let n = self.waypoints.len();
        let mut cur = idx;

        for _ in 0..n {
            let p1 = self.waypoints[cur];
            let p2 = self.waypoints[(cur + 1) % n];
            let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
            let len = (dx * dx + dy * dy).sqrt();

            if len > 0.0 {
                return (-dy / len, dx / len);
            }

            cur = if search_forward {
                (cur + 1) % n
            } else {
                (cur + n - 1) % n
            };
        }

        (0.0, 0.0)
    }
}

fn segment_length(waypoints: &[Point], idx: usize) -> f64 {
    let p1 = waypoints[idx];
    let p2 = waypoints[(idx + 1) % waypoints.len()];
    ((p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2)).sqrt()
}
