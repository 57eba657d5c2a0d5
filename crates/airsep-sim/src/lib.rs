//! Closed-loop simulation driver.
//!
//! Owns the aircraft fleet and steps the control loop at a fixed rate:
//! kinematics, conflict detection, resolution, then safety bookkeeping.

pub mod error;
pub mod scenario;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use airsep_core::{
    safety_report, Aircraft, AircraftStatus, Airspace, AtcSystem, SafetyMetrics, SafetyMonitor,
    DEFAULT_LOOKAHEAD_SECS,
};

pub use error::SimError;

/// Point-in-time summary of a running simulation, suitable for JSON dumps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStatus {
    pub current_time: f64,
    pub aircraft_count: usize,
    pub active_conflicts: usize,
    pub active_violations: usize,
    pub instructions_issued: usize,
}

/// Fixed-rate closed-loop simulator.
pub struct Simulator {
    pub airspace: Airspace,
    pub atc: AtcSystem,
    pub monitor: SafetyMonitor,
    aircraft: Vec<Aircraft>,
    current_time: f64,
    time_step: f64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self {
            airspace: Airspace::new(),
            atc: AtcSystem::new(),
            monitor: SafetyMonitor::new(),
            aircraft: Vec::new(),
            current_time: 0.0,
            time_step: 1.0,
        }
    }
}

impl Simulator {
    /// 1 Hz update rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom update rate in Hz.
    pub fn with_frequency(frequency_hz: f64) -> Result<Self, SimError> {
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return Err(SimError::InvalidUpdateFrequency(frequency_hz));
        }
        Ok(Self {
            time_step: 1.0 / frequency_hz,
            ..Self::default()
        })
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn add_aircraft(&mut self, aircraft: Aircraft) {
        self.aircraft.push(aircraft);
    }

    /// Remove an aircraft from the fleet. Returns it if present.
    pub fn remove_aircraft(&mut self, callsign: &str) -> Option<Aircraft> {
        let index = self.aircraft.iter().position(|a| a.callsign == callsign)?;
        Some(self.aircraft.remove(index))
    }

    pub fn aircraft(&self) -> &[Aircraft] {
        &self.aircraft
    }

    pub fn get_aircraft(&self, callsign: &str) -> Option<&Aircraft> {
        self.aircraft.iter().find(|a| a.callsign == callsign)
    }

    /// Advance one tick.
    ///
    /// Order matters: aircraft move first, the controller reacts to
    /// conflicts predicted from the new states, and the monitor records
    /// outcomes last so it sees any instruction issued this tick.
    pub fn step(&mut self) {
        for aircraft in &mut self.aircraft {
            aircraft.update(self.time_step);
        }

        let conflicts = self
            .airspace
            .detect_conflicts(&self.aircraft, DEFAULT_LOOKAHEAD_SECS);
        if !conflicts.is_empty() {
            warn!(
                time = self.current_time,
                count = conflicts.len(),
                "conflicts predicted"
            );
        }

        let issued_before = self.atc.instructions().len();
        self.atc
            .update(&conflicts, &mut self.aircraft, self.current_time);
        for instruction in &self.atc.instructions()[issued_before..] {
            info!(
                callsign = %instruction.callsign,
                kind = instruction.kind.label(),
                "instruction issued"
            );
        }

        self.monitor.record_conflicts(conflicts.len());
        self.monitor.update(&self.aircraft, self.current_time);

        self.current_time += self.time_step;
    }

    /// Run for `duration` simulated seconds.
    pub fn run(&mut self, duration: f64) {
        let end_time = self.current_time + duration;
        while self.current_time < end_time {
            self.step();
            if (self.current_time / self.time_step).round() as u64 % 60 == 0 {
                debug!(time = self.current_time, "simulation progress");
            }
        }
    }

    pub fn metrics(&self) -> SafetyMetrics {
        self.monitor.calculate_metrics(Some(&self.atc))
    }

    pub fn report(&self) -> String {
        safety_report(&self.metrics(), self.monitor.violations())
    }

    pub fn status(&self) -> SimulationStatus {
        SimulationStatus {
            current_time: self.current_time,
            aircraft_count: self.aircraft.len(),
            active_conflicts: self.airspace.conflicts().len(),
            active_violations: self.monitor.active_violation_count(),
            instructions_issued: self.atc.instruction_count(),
        }
    }

    /// Count of aircraft not yet landed.
    pub fn airborne_count(&self) -> usize {
        self.aircraft
            .iter()
            .filter(|a| a.status != AircraftStatus::Landed)
            .count()
    }

    /// Clear all state back to time zero, keeping the configured rate and
    /// sectors.
    pub fn reset(&mut self) {
        self.aircraft.clear();
        self.atc = AtcSystem::new();
        self.monitor = SafetyMonitor::new();
        let mut airspace = Airspace::new();
        for sector in self.airspace.sectors() {
            airspace.add_sector(sector.clone());
        }
        self.airspace = airspace;
        self.current_time = 0.0;
    }
}
