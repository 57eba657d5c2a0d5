//! Pre-defined traffic scenarios for exercising the control loop.

use std::str::FromStr;

use rand::Rng;

use airsep_core::{Aircraft, Position, Velocity, Waypoint};

use crate::error::SimError;

const AIRLINES: &[&str] = &["UAL", "AAL", "DAL", "SWA", "JBU", "ASA", "FFT"];

/// Named scenarios selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Two aircraft at the same level closing head-on.
    HeadOn,
    /// Randomly scattered traffic across the sector grid.
    Random,
    /// Random traffic compressed into a narrow altitude band.
    HighDensity,
}

impl FromStr for ScenarioKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head-on" | "headon" => Ok(ScenarioKind::HeadOn),
            "random" => Ok(ScenarioKind::Random),
            "high-density" | "dense" => Ok(ScenarioKind::HighDensity),
            other => Err(SimError::UnknownScenario(other.to_string())),
        }
    }
}

impl ScenarioKind {
    pub fn build(self, aircraft_count: usize) -> Vec<Aircraft> {
        match self {
            ScenarioKind::HeadOn => head_on_conflict(),
            ScenarioKind::Random => random_traffic(&TrafficOptions {
                count: aircraft_count,
                ..TrafficOptions::default()
            }),
            ScenarioKind::HighDensity => high_density(aircraft_count),
        }
    }
}

/// Bounds for randomly generated traffic.
#[derive(Debug, Clone)]
pub struct TrafficOptions {
    pub count: usize,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub altitude_range: (f64, f64),
    pub speed_range: (f64, f64),
}

impl Default for TrafficOptions {
    fn default() -> Self {
        Self {
            count: 20,
            x_range: (0.0, 200.0),
            y_range: (0.0, 200.0),
            altitude_range: (20_000.0, 40_000.0),
            speed_range: (350.0, 500.0),
        }
    }
}

/// Two aircraft closing head-on at the same level. Guaranteed conflict
/// unless the controller intervenes.
pub fn head_on_conflict() -> Vec<Aircraft> {
    let eastbound = Aircraft::new(
        "UAL100",
        Position::new(50.0, 100.0, 35_000.0),
        Velocity::new(450.0, 90.0),
        vec![Waypoint::new("DEST1", 150.0, 100.0, Some(35_000.0))],
    );
    let westbound = Aircraft::new(
        "AAL200",
        Position::new(150.0, 100.0, 35_000.0),
        Velocity::new(450.0, 270.0),
        vec![Waypoint::new("DEST2", 50.0, 100.0, Some(35_000.0))],
    );
    vec![eastbound, westbound]
}

/// Random traffic inside the given bounds. Each aircraft gets a small
/// flight plan pointing away from its spawn point.
pub fn random_traffic(options: &TrafficOptions) -> Vec<Aircraft> {
    let mut rng = rand::rng();
    let mut fleet = Vec::with_capacity(options.count);

    for i in 0..options.count {
        let airline = AIRLINES[rng.random_range(0..AIRLINES.len())];
        let callsign = format!("{airline}{}", 100 + i);

        let position = Position::new(
            rng.random_range(options.x_range.0..options.x_range.1),
            rng.random_range(options.y_range.0..options.y_range.1),
            rng.random_range(options.altitude_range.0..options.altitude_range.1),
        );
        let velocity = Velocity::new(
            rng.random_range(options.speed_range.0..options.speed_range.1),
            rng.random_range(0.0..360.0),
        );

        let waypoint_count = rng.random_range(2..=3);
        let flight_plan = (0..waypoint_count)
            .map(|w| {
                Waypoint::new(
                    format!("WP{i}_{w}"),
                    rng.random_range(options.x_range.0..options.x_range.1),
                    rng.random_range(options.y_range.0..options.y_range.1),
                    None,
                )
            })
            .collect();

        fleet.push(Aircraft::new(callsign, position, velocity, flight_plan));
    }

    fleet
}

/// Random traffic packed into a small area and narrow altitude band, to
/// stress conflict detection and resolution.
pub fn high_density(count: usize) -> Vec<Aircraft> {
    random_traffic(&TrafficOptions {
        count,
        x_range: (0.0, 150.0),
        y_range: (0.0, 150.0),
        altitude_range: (30_000.0, 38_000.0),
        ..TrafficOptions::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use airsep_core::Airspace;

    #[test]
    fn scenario_names_parse() {
        assert_eq!("head-on".parse::<ScenarioKind>().unwrap(), ScenarioKind::HeadOn);
        assert_eq!("random".parse::<ScenarioKind>().unwrap(), ScenarioKind::Random);
        assert_eq!(
            "high-density".parse::<ScenarioKind>().unwrap(),
            ScenarioKind::HighDensity
        );
        assert!(matches!(
            "nope".parse::<ScenarioKind>(),
            Err(SimError::UnknownScenario(_))
        ));
    }

    #[test]
    fn head_on_pair_is_a_guaranteed_conflict() {
        let fleet = head_on_conflict();
        assert_eq!(fleet.len(), 2);
        assert_eq!(fleet[0].callsign, "UAL100");
        assert_eq!(fleet[1].callsign, "AAL200");

        // 100 NM apart closing at 900 kt combined; CPA inside a long
        // enough horizon.
        let mut airspace = Airspace::new();
        let conflicts = airspace.detect_conflicts(&fleet, 500.0);
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn random_traffic_stays_in_bounds() {
        let options = TrafficOptions::default();
        let fleet = random_traffic(&options);
        assert_eq!(fleet.len(), options.count);

        for aircraft in &fleet {
            assert!(aircraft.position.x >= options.x_range.0);
            assert!(aircraft.position.x < options.x_range.1);
            assert!(aircraft.position.altitude >= options.altitude_range.0);
            assert!(aircraft.position.altitude < options.altitude_range.1);
            assert!(!aircraft.flight_plan.is_empty());
        }
    }

    #[test]
    fn callsigns_are_unique() {
        let fleet = random_traffic(&TrafficOptions {
            count: 50,
            ..TrafficOptions::default()
        });
        let mut callsigns: Vec<_> = fleet.iter().map(|a| a.callsign.clone()).collect();
        callsigns.sort();
        callsigns.dedup();
        assert_eq!(callsigns.len(), 50);
    }

    #[test]
    fn high_density_band_is_narrow() {
        let fleet = high_density(30);
        for aircraft in &fleet {
            assert!(aircraft.position.altitude >= 30_000.0);
            assert!(aircraft.position.altitude < 38_000.0);
        }
    }
}
