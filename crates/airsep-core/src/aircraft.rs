//! Per-aircraft state and rate-limited kinematics.
//!
//! An aircraft converges toward pending target values (altitude, heading,
//! speed) at bounded rates each tick. Targets are set by ATC instructions
//! or adopted from the active flight-plan waypoint; they are cleared once
//! reached.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{AircraftStatus, Position, Velocity, Waypoint};

/// An aircraft under simulation.
///
/// Mutated each tick by [`Aircraft::update`] and by the resolution policy,
/// which only ever sets pending targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aircraft {
    /// Unique identifier, e.g. "UAL123"
    pub callsign: String,
    pub position: Position,
    pub velocity: Velocity,
    /// Ordered waypoints; the cursor only moves forward
    pub flight_plan: Vec<Waypoint>,
    /// Aircraft model tag, e.g. "B737"
    pub aircraft_type: String,
    pub status: AircraftStatus,
    /// Pending ATC targets, realized gradually by `update`
    pub target_altitude: Option<f64>,
    pub target_heading: Option<f64>,
    pub target_speed: Option<f64>,
    pub current_waypoint_index: usize,
    /// Elapsed simulation time in seconds
    pub time_in_simulation: f64,
}

impl Aircraft {
    /// Maximum climb rate in feet per minute
    pub const MAX_CLIMB_RATE: f64 = 2_000.0;
    /// Maximum descent rate in feet per minute
    pub const MAX_DESCENT_RATE: f64 = 2_000.0;
    /// Maximum turn rate in degrees per second
    pub const MAX_TURN_RATE: f64 = 3.0;
    /// Maximum speed change in knots per second
    pub const MAX_SPEED_CHANGE: f64 = 10.0;
    /// Minimum altitude in feet
    pub const MIN_ALTITUDE: f64 = 1_000.0;
    /// Maximum altitude in feet
    pub const MAX_ALTITUDE: f64 = 45_000.0;
    /// Minimum speed in knots
    pub const MIN_SPEED: f64 = 120.0;
    /// Maximum speed in knots
    pub const MAX_SPEED: f64 = 550.0;

    pub fn new(
        callsign: impl Into<String>,
        position: Position,
        velocity: Velocity,
        flight_plan: Vec<Waypoint>,
    ) -> Self {
        Self {
            callsign: callsign.into(),
            position,
            velocity,
            flight_plan,
            aircraft_type: "B737".to_string(),
            status: AircraftStatus::Enroute,
            target_altitude: None,
            target_heading: None,
            target_speed: None,
            current_waypoint_index: 0,
            time_in_simulation: 0.0,
        }
    }

    /// Set the aircraft model tag.
    pub fn with_aircraft_type(mut self, aircraft_type: impl Into<String>) -> Self {
        self.aircraft_type = aircraft_type.into();
        self
    }

    /// Set the initial flight phase.
    pub fn with_status(mut self, status: AircraftStatus) -> Self {
        self.status = status;
        self
    }

    /// Advance aircraft state by one time step of `time_delta` seconds.
    ///
    /// Applies, in order: altitude, heading, speed convergence toward
    /// pending targets, position integration, then waypoint progress.
    pub fn update(&mut self, time_delta: f64) {
        self.time_in_simulation += time_delta;

        self.update_altitude(time_delta);
        self.update_heading(time_delta);
        self.update_speed(time_delta);
        self.update_position(time_delta);
        self.check_waypoint_progress();
    }

    fn update_altitude(&mut self, time_delta: f64) {
        let Some(target) = self.target_altitude else {
            // Adopt the active waypoint's altitude as the new target.
            // Does not advance the waypoint cursor.
            if let Some(wp) = self.flight_plan.get(self.current_waypoint_index) {
                if let Some(altitude) = wp.altitude {
                    self.target_altitude = Some(altitude);
                }
            }
            return;
        };

        let diff = target - self.position.altitude;

        if diff.abs() < 10.0 {
            self.position.altitude = target;
            self.target_altitude = None;
            return;
        }

        let rate = if diff > 0.0 {
            Self::MAX_CLIMB_RATE
        } else {
            Self::MAX_DESCENT_RATE
        };
        let max_change = rate * (time_delta / 60.0);

        if diff.abs() <= max_change {
            self.position.altitude = target;
            self.target_altitude = None;
        } else {
            self.position.altitude += if diff > 0.0 { max_change } else { -max_change };
        }

        self.position.altitude = self
            .position
            .altitude
            .clamp(Self::MIN_ALTITUDE, Self::MAX_ALTITUDE);
    }

    fn update_heading(&mut self, time_delta: f64) {
        let Some(target) = self.target_heading else {
            if let Some(wp) = self.flight_plan.get(self.current_waypoint_index) {
                self.target_heading = Some(self.heading_to_waypoint(wp));
            }
            return;
        };

        let diff = shortest_heading_difference(self.velocity.heading, target);

        if diff.abs() < 0.5 {
            self.velocity.heading = target;
            self.target_heading = None;
            return;
        }

        let max_turn = Self::MAX_TURN_RATE * time_delta;

        if diff.abs() <= max_turn {
            self.velocity.heading = target;
            self.target_heading = None;
        } else {
            self.velocity.heading += if diff > 0.0 { max_turn } else { -max_turn };
        }

        self.velocity.normalize_heading();
    }

    fn update_speed(&mut self, time_delta: f64) {
        // No flight-plan-driven speed target exists; speed only changes
        // when an instruction sets a pending target.
        let Some(target) = self.target_speed else {
            return;
        };

        let diff = target - self.velocity.speed;

        if diff.abs() < 1.0 {
            self.velocity.speed = target;
            self.target_speed = None;
            return;
        }

        let max_change = Self::MAX_SPEED_CHANGE * time_delta;

        if diff.abs() <= max_change {
            self.velocity.speed = target;
            self.target_speed = None;
        } else {
            self.velocity.speed += if diff > 0.0 { max_change } else { -max_change };
        }

        self.velocity.speed = self.velocity.speed.clamp(Self::MIN_SPEED, Self::MAX_SPEED);
    }

    fn update_position(&mut self, time_delta: f64) {
        // knots to nautical miles over the step
        let distance = self.velocity.speed * (time_delta / 3600.0);
        let heading_rad = self.velocity.heading.to_radians();

        // heading 0 = north = +Y, heading 90 = east = +X
        self.position.x += distance * heading_rad.sin();
        self.position.y += distance * heading_rad.cos();
    }

    fn check_waypoint_progress(&mut self) {
        let Some(wp) = self.flight_plan.get(self.current_waypoint_index) else {
            return;
        };

        let distance = ((self.position.x - wp.x).powi(2) + (self.position.y - wp.y).powi(2)).sqrt();

        // Waypoint reached within 1 nautical mile
        if distance < 1.0 {
            self.current_waypoint_index += 1;
        }
    }

    fn heading_to_waypoint(&self, waypoint: &Waypoint) -> f64 {
        let dx = waypoint.x - self.position.x;
        let dy = waypoint.y - self.position.y;

        // atan2(dx, dy) measures from +Y (north), clockwise toward +X (east)
        dx.atan2(dy).to_degrees().rem_euclid(360.0)
    }

    /// Set a pending altitude target, clamped to the operating envelope.
    pub fn set_altitude(&mut self, altitude: f64) {
        self.target_altitude = Some(altitude.clamp(Self::MIN_ALTITUDE, Self::MAX_ALTITUDE));
    }

    /// Set a pending heading target, normalized to [0, 360).
    pub fn set_heading(&mut self, heading: f64) {
        self.target_heading = Some(heading.rem_euclid(360.0));
    }

    /// Set a pending speed target, clamped to the operating envelope.
    pub fn set_speed(&mut self, speed: f64) {
        self.target_speed = Some(speed.clamp(Self::MIN_SPEED, Self::MAX_SPEED));
    }

    /// Extrapolate position `time_ahead` seconds out at constant velocity.
    ///
    /// Altitude is held fixed. Used by the conflict detector; never
    /// advances real state.
    pub fn predict_position(&self, time_ahead: f64) -> Position {
        let distance = self.velocity.speed * (time_ahead / 3600.0);
        let heading_rad = self.velocity.heading.to_radians();

        Position {
            x: self.position.x + distance * heading_rad.sin(),
            y: self.position.y + distance * heading_rad.cos(),
            altitude: self.position.altitude,
        }
    }

    /// Current state as a plain key/value structure.
    pub fn state_snapshot(&self) -> Value {
        json!({
            "callsign": self.callsign,
            "position": {
                "x": self.position.x,
                "y": self.position.y,
                "altitude": self.position.altitude,
            },
            "velocity": {
                "speed": self.velocity.speed,
                "heading": self.velocity.heading,
            },
            "aircraft_type": self.aircraft_type,
            "status": self.status,
            "target_altitude": self.target_altitude,
            "target_heading": self.target_heading,
            "target_speed": self.target_speed,
            "current_waypoint": self.current_waypoint_index,
        })
    }
}

/// Shortest signed angular distance from `current` to `target`, in
/// [-180, 180]. Positive means turn right.
pub fn shortest_heading_difference(current: f64, target: f64) -> f64 {
    let mut diff = target - current;
    while diff > 180.0 {
        diff -= 360.0;
    }
    while diff < -180.0 {
        diff += 360.0;
    }
    diff
}
