//! Separation checks and pairwise conflict prediction.
//!
//! The detector extrapolates every aircraft pair over a bounded lookahead
//! horizon and reports pairs whose predicted closest approach falls below
//! the separation minima. The full conflict list is rebuilt on every call.

use serde::{Deserialize, Serialize};

use crate::aircraft::Aircraft;
use crate::models::{Position, Sector};
use crate::rules::SeparationRequirements;

/// Default lookahead horizon for conflict prediction, in seconds.
pub const DEFAULT_LOOKAHEAD_SECS: f64 = 300.0;

/// Predicted-conflict severity, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

/// A predicted loss of separation between two aircraft.
///
/// The vertical figure is the separation observed at the time sample of
/// minimum horizontal separation; it is not independently minimized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub aircraft1: String,
    pub aircraft2: String,
    /// Seconds until the predicted closest point of approach
    pub time_to_cpa: f64,
    /// Nautical miles at the CPA sample
    pub horizontal_separation_at_cpa: f64,
    /// Feet at the CPA sample
    pub vertical_separation_at_cpa: f64,
    pub severity: ConflictSeverity,
}

impl Conflict {
    /// Whether the conflict involves the given callsign.
    pub fn involves(&self, callsign: &str) -> bool {
        self.aircraft1 == callsign || self.aircraft2 == callsign
    }
}

/// Airspace structure: sector registry plus the conflict detector.
///
/// Holds the conflict list from the most recent detection pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Airspace {
    sectors: Vec<Sector>,
    conflicts: Vec<Conflict>,
}

impl Airspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sector(&mut self, sector: Sector) {
        self.sectors.push(sector);
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// First sector containing the position, if any.
    pub fn sector_at(&self, position: &Position) -> Option<&Sector> {
        self.sectors.iter().find(|s| s.contains(position))
    }

    /// Current separation between two aircraft.
    ///
    /// Returns (horizontal NM, vertical ft).
    pub fn check_separation(aircraft1: &Aircraft, aircraft2: &Aircraft) -> (f64, f64) {
        let horizontal = aircraft1.position.distance_to(&aircraft2.position);
        let vertical = aircraft1.position.vertical_separation(&aircraft2.position);
        (horizontal, vertical)
    }

    /// Whether two aircraft meet the separation minima right now.
    ///
    /// Separation is satisfied by either axis alone, inclusive of the
    /// minimum itself.
    pub fn is_separated(aircraft1: &Aircraft, aircraft2: &Aircraft) -> bool {
        let (horizontal, vertical) = Self::check_separation(aircraft1, aircraft2);

        let avg_altitude = (aircraft1.position.altitude + aircraft2.position.altitude) / 2.0;
        let req = SeparationRequirements::standard(avg_altitude);

        horizontal >= req.horizontal_nm || vertical >= req.vertical_ft
    }

    /// Scan all aircraft pairs for predicted conflicts within
    /// `lookahead_seconds`.
    ///
    /// Replaces the stored conflict list. O(n^2 * lookahead); acceptable
    /// only because aircraft counts and the horizon are bounded.
    pub fn detect_conflicts(
        &mut self,
        aircraft_list: &[Aircraft],
        lookahead_seconds: f64,
    ) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        for i in 0..aircraft_list.len() {
            for j in (i + 1)..aircraft_list.len() {
                if let Some(conflict) =
                    Self::check_pair_for_conflict(&aircraft_list[i], &aircraft_list[j], lookahead_seconds)
                {
                    conflicts.push(conflict);
                }
            }
        }

        self.conflicts = conflicts.clone();
        conflicts
    }

    /// Predict the closest approach of a pair over the horizon.
    fn check_pair_for_conflict(
        aircraft1: &Aircraft,
        aircraft2: &Aircraft,
        lookahead_seconds: f64,
    ) -> Option<Conflict> {
        let mut min_horizontal = f64::INFINITY;
        let mut vertical_at_min = f64::INFINITY;
        let mut time_at_min = 0.0;

        // Sample each whole second across the horizon.
        let time_steps = lookahead_seconds as u32;
        for t in 0..time_steps {
            let t = f64::from(t);
            let pos1 = aircraft1.predict_position(t);
            let pos2 = aircraft2.predict_position(t);

            let h_sep = pos1.distance_to(&pos2);
            if h_sep < min_horizontal {
                min_horizontal = h_sep;
                vertical_at_min = pos1.vertical_separation(&pos2);
                time_at_min = t;
            }
        }

        let avg_altitude = (aircraft1.position.altitude + aircraft2.position.altitude) / 2.0;
        let req = SeparationRequirements::standard(avg_altitude);

        if min_horizontal < req.horizontal_nm && vertical_at_min < req.vertical_ft {
            return Some(Conflict {
                aircraft1: aircraft1.callsign.clone(),
                aircraft2: aircraft2.callsign.clone(),
                time_to_cpa: time_at_min,
                horizontal_separation_at_cpa: min_horizontal,
                vertical_separation_at_cpa: vertical_at_min,
                severity: Self::calculate_severity(min_horizontal, time_at_min, &req),
            });
        }

        None
    }

    fn calculate_severity(
        h_sep: f64,
        time_to_cpa: f64,
        req: &SeparationRequirements,
    ) -> ConflictSeverity {
        if time_to_cpa < 60.0 || h_sep < req.horizontal_nm * 0.5 {
            ConflictSeverity::High
        } else if time_to_cpa < 180.0 || h_sep < req.horizontal_nm * 0.75 {
            ConflictSeverity::Medium
        } else {
            ConflictSeverity::Low
        }
    }

    /// Conflicts from the most recent detection pass.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Conflicts from the most recent pass involving a callsign.
    pub fn conflicts_for_aircraft(&self, callsign: &str) -> Vec<&Conflict> {
        self.conflicts.iter().filter(|c| c.involves(callsign)).collect()
    }

    /// Aircraft currently inside a sector.
    pub fn aircraft_in_sector<'a>(
        &self,
        sector: &Sector,
        aircraft_list: &'a [Aircraft],
    ) -> Vec<&'a Aircraft> {
        aircraft_list
            .iter()
            .filter(|ac| sector.contains(&ac.position))
            .collect()
    }

    /// Whether a sector is at or over its aircraft capacity.
    pub fn is_sector_full(&self, sector: &Sector, aircraft_list: &[Aircraft]) -> bool {
        self.aircraft_in_sector(sector, aircraft_list).len() >= sector.max_aircraft
    }

    /// Create a default four-sector layout (high/low, west/east) over the
    /// given area.
    pub fn create_default_sectors(&mut self, x_range: (f64, f64), y_range: (f64, f64)) {
        let x_mid = (x_range.0 + x_range.1) / 2.0;
        let splits = [
            ("HIGH_WEST", x_range.0, x_mid, 18_000.0, 45_000.0),
            ("HIGH_EAST", x_mid, x_range.1, 18_000.0, 45_000.0),
            ("LOW_WEST", x_range.0, x_mid, 1_000.0, 18_000.0),
            ("LOW_EAST", x_mid, x_range.1, 1_000.0, 18_000.0),
        ];

        for (name, x_min, x_max, altitude_min, altitude_max) in splits {
            self.add_sector(Sector {
                name: name.to_string(),
                x_min,
                x_max,
                y_min: y_range.0,
                y_max: y_range.1,
                altitude_min,
                altitude_max,
                max_aircraft: 20,
            });
        }
    }
}
