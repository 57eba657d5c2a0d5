//! Core geometric and airspace data models.

use serde::{Deserialize, Serialize};

/// 3D position in the airspace.
///
/// Horizontal coordinates are nautical miles on a flat plane;
/// altitude is feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub altitude: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, altitude: f64) -> Self {
        Self { x, y, altitude }
    }

    /// Horizontal distance to another position in nautical miles.
    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Vertical separation from another position in feet.
    pub fn vertical_separation(&self, other: &Position) -> f64 {
        (self.altitude - other.altitude).abs()
    }
}

/// Aircraft velocity vector.
///
/// Heading uses the aviation convention: 0 = north (+Y), 90 = east (+X),
/// canonical range [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// Speed in knots
    pub speed: f64,
    /// Heading in degrees
    pub heading: f64,
}

impl Velocity {
    pub fn new(speed: f64, heading: f64) -> Self {
        let mut velocity = Self { speed, heading };
        velocity.normalize_heading();
        velocity
    }

    /// Renormalize heading into [0, 360).
    pub fn normalize_heading(&mut self) {
        self.heading = self.heading.rem_euclid(360.0);
    }
}

/// Navigation waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Target altitude at the waypoint, if the flight plan specifies one
    pub altitude: Option<f64>,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, x: f64, y: f64, altitude: Option<f64>) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            altitude,
        }
    }
}

/// Aircraft flight phase. Advisory only: the kinematic model does not
/// branch on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AircraftStatus {
    Taxiing,
    Departing,
    #[default]
    Enroute,
    Arriving,
    Landed,
}

/// Rectangular airspace sector with a capacity limit.
///
/// Used for containment and capacity queries only; aircraft are never
/// physically constrained to a sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub name: String,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub altitude_min: f64,
    pub altitude_max: f64,
    pub max_aircraft: usize,
}

impl Sector {
    /// Check whether a position lies within the sector boundaries (inclusive).
    pub fn contains(&self, position: &Position) -> bool {
        self.x_min <= position.x
            && position.x <= self.x_max
            && self.y_min <= position.y
            && position.y <= self.y_max
            && self.altitude_min <= position.altitude
            && position.altitude <= self.altitude_max
    }
}
