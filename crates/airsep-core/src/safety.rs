//! Safety monitoring: separation violations, near misses, and metrics.
//!
//! The monitor re-scans all aircraft pairs each tick using actual current
//! separation, independently of the predictive detector. Violations are
//! tracked as an active map keyed by the canonical pair, indexing into an
//! append-only history.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::aircraft::Aircraft;
use crate::conflict::Airspace;
use crate::control::AtcSystem;
use crate::rules::SeparationRequirements;

/// Separated pairs below this multiple of the minimum count as near misses.
const NEAR_MISS_THRESHOLD: f64 = 1.5;
/// Horizontal ratio below which a violation is critical.
const CRITICAL_VIOLATION_RATIO: f64 = 0.5;
/// Horizontal ratio below which a violation is major.
const MAJOR_VIOLATION_RATIO: f64 = 0.75;

/// Violation severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    Minor,
    Major,
    Critical,
}

/// Record of a separation violation.
///
/// Separation fields hold the last observed values while the violation is
/// active; duration accumulates in whole ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationViolation {
    pub aircraft1: String,
    pub aircraft2: String,
    /// Simulation time the violation was first seen
    pub timestamp: f64,
    pub horizontal_separation: f64,
    pub vertical_separation: f64,
    pub duration: f64,
    pub severity: ViolationSeverity,
}

/// Point-in-time record of a separated-but-close encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearMiss {
    pub aircraft1: String,
    pub aircraft2: String,
    pub timestamp: f64,
    pub horizontal_separation: f64,
    pub vertical_separation: f64,
    /// Ratio of actual to minimum required separation
    pub min_separation_ratio: f64,
}

/// Aggregate safety metrics, derived on demand from the raw histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyMetrics {
    pub simulation_duration: f64,
    pub total_aircraft: usize,
    pub violation_count: usize,
    pub violation_duration_total: f64,
    /// Minimum horizontal separation recorded across all violations;
    /// `None` when no violation occurred
    pub min_separation_achieved: Option<f64>,
    pub near_miss_count: usize,
    /// Near misses per 100 aircraft seen
    pub near_miss_rate: f64,
    pub conflicts_detected: usize,
    /// Crude estimate: detected conflicts minus violations
    pub conflicts_resolved: usize,
    pub total_instructions: usize,
    pub instructions_per_aircraft: f64,
}

/// Canonical identifier for an unordered aircraft pair.
type PairKey = (String, String);

fn pair_key(a: &str, b: &str) -> PairKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Observes post-update aircraft state and accumulates safety records.
#[derive(Debug, Clone, Default)]
pub struct SafetyMonitor {
    /// Append-only violation history
    violations: Vec<SeparationViolation>,
    /// Currently violating pairs, indexing into the history
    active_violations: HashMap<PairKey, usize>,
    near_misses: Vec<NearMiss>,
    conflicts_detected: usize,
    aircraft_seen: HashSet<String>,
    simulation_start_time: Option<f64>,
    simulation_end_time: f64,
}

impl SafetyMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one tick's post-update aircraft state.
    pub fn update(&mut self, aircraft_list: &[Aircraft], current_time: f64) {
        if self.simulation_start_time.is_none() {
            self.simulation_start_time = Some(current_time);
        }
        self.simulation_end_time = current_time;

        for aircraft in aircraft_list {
            if !self.aircraft_seen.contains(&aircraft.callsign) {
                self.aircraft_seen.insert(aircraft.callsign.clone());
            }
        }

        self.check_violations(aircraft_list, current_time);
        self.check_near_misses(aircraft_list, current_time);
    }

    /// Feed the detector's per-tick conflict count into the cumulative
    /// total.
    pub fn record_conflicts(&mut self, detected: usize) {
        self.conflicts_detected += detected;
    }

    fn check_violations(&mut self, aircraft_list: &[Aircraft], current_time: f64) {
        let mut current: HashSet<PairKey> = HashSet::new();

        for i in 0..aircraft_list.len() {
            for j in (i + 1)..aircraft_list.len() {
                let ac1 = &aircraft_list[i];
                let ac2 = &aircraft_list[j];

                if Airspace::is_separated(ac1, ac2) {
                    continue;
                }

                let key = pair_key(&ac1.callsign, &ac2.callsign);
                let (h_sep, v_sep) = Airspace::check_separation(ac1, ac2);

                match self.active_violations.get(&key) {
                    Some(&index) => {
                        // Ongoing: tick-granularity duration, refresh the
                        // last observed separation
                        let record = &mut self.violations[index];
                        record.duration += 1.0;
                        record.horizontal_separation = h_sep;
                        record.vertical_separation = v_sep;
                    }
                    None => {
                        let severity = Self::classify_violation_severity(h_sep, ac1, ac2);
                        self.violations.push(SeparationViolation {
                            aircraft1: ac1.callsign.clone(),
                            aircraft2: ac2.callsign.clone(),
                            timestamp: current_time,
                            horizontal_separation: h_sep,
                            vertical_separation: v_sep,
                            duration: 0.0,
                            severity,
                        });
                        self.active_violations
                            .insert(key.clone(), self.violations.len() - 1);
                    }
                }

                current.insert(key);
            }
        }

        // Re-separated pairs leave the active map; history keeps the record
        // with its duration frozen.
        self.active_violations.retain(|key, _| current.contains(key));
    }

    fn check_near_misses(&mut self, aircraft_list: &[Aircraft], current_time: f64) {
        for i in 0..aircraft_list.len() {
            for j in (i + 1)..aircraft_list.len() {
                let ac1 = &aircraft_list[i];
                let ac2 = &aircraft_list[j];

                // Near misses only apply to separated pairs; violating
                // pairs are handled above, so the two sets stay disjoint.
                if !Airspace::is_separated(ac1, ac2) {
                    continue;
                }

                let (h_sep, v_sep) = Airspace::check_separation(ac1, ac2);
                let avg_altitude = (ac1.position.altitude + ac2.position.altitude) / 2.0;
                let req = SeparationRequirements::standard(avg_altitude);

                let h_ratio = h_sep / req.horizontal_nm;
                let v_ratio = if v_sep > 0.0 {
                    v_sep / req.vertical_ft
                } else {
                    // Zero vertical separation: margin rests entirely on
                    // the horizontal axis
                    f64::INFINITY
                };
                let min_ratio = h_ratio.min(v_ratio);

                if min_ratio < NEAR_MISS_THRESHOLD {
                    // Fresh point sample each tick; a sustained encounter
                    // yields one record per tick
                    self.near_misses.push(NearMiss {
                        aircraft1: ac1.callsign.clone(),
                        aircraft2: ac2.callsign.clone(),
                        timestamp: current_time,
                        horizontal_separation: h_sep,
                        vertical_separation: v_sep,
                        min_separation_ratio: min_ratio,
                    });
                }
            }
        }
    }

    fn classify_violation_severity(h_sep: f64, ac1: &Aircraft, ac2: &Aircraft) -> ViolationSeverity {
        let avg_altitude = (ac1.position.altitude + ac2.position.altitude) / 2.0;
        let req = SeparationRequirements::standard(avg_altitude);

        let h_ratio = h_sep / req.horizontal_nm;

        if h_ratio < CRITICAL_VIOLATION_RATIO {
            ViolationSeverity::Critical
        } else if h_ratio < MAJOR_VIOLATION_RATIO {
            ViolationSeverity::Major
        } else {
            ViolationSeverity::Minor
        }
    }

    /// Full violation history, including resolved violations.
    pub fn violations(&self) -> &[SeparationViolation] {
        &self.violations
    }

    /// Number of pairs violating as of the last update.
    pub fn active_violation_count(&self) -> usize {
        self.active_violations.len()
    }

    /// Whether a pair is violating as of the last update.
    pub fn is_pair_violating(&self, callsign1: &str, callsign2: &str) -> bool {
        self.active_violations
            .contains_key(&pair_key(callsign1, callsign2))
    }

    /// Full near-miss history.
    pub fn near_misses(&self) -> &[NearMiss] {
        &self.near_misses
    }

    /// Cumulative conflicts fed in via [`SafetyMonitor::record_conflicts`].
    pub fn conflicts_detected(&self) -> usize {
        self.conflicts_detected
    }

    /// Minimum horizontal separation recorded across the violation history.
    pub fn min_separation_achieved(&self) -> Option<f64> {
        self.violations
            .iter()
            .map(|v| v.horizontal_separation)
            .fold(None, |acc, h| {
                Some(match acc {
                    Some(current) => current.min(h),
                    None => h,
                })
            })
    }

    /// Recompute the aggregate metrics from the full histories.
    pub fn calculate_metrics(&self, atc_system: Option<&AtcSystem>) -> SafetyMetrics {
        let simulation_duration = self
            .simulation_start_time
            .map(|start| self.simulation_end_time - start)
            .unwrap_or(0.0);
        let total_aircraft = self.aircraft_seen.len();

        let violation_count = self.violations.len();
        let violation_duration_total = self.violations.iter().map(|v| v.duration).sum();

        let near_miss_count = self.near_misses.len();
        let near_miss_rate = if total_aircraft > 0 {
            (near_miss_count as f64 / total_aircraft as f64) * 100.0
        } else {
            0.0
        };

        let (total_instructions, instructions_per_aircraft) = match atc_system {
            Some(atc) => {
                let total = atc.instruction_count();
                let per_aircraft = if total_aircraft > 0 {
                    total as f64 / total_aircraft as f64
                } else {
                    0.0
                };
                (total, per_aircraft)
            }
            None => (0, 0.0),
        };

        SafetyMetrics {
            simulation_duration,
            total_aircraft,
            violation_count,
            violation_duration_total,
            min_separation_achieved: self.min_separation_achieved(),
            near_miss_count,
            near_miss_rate,
            conflicts_detected: self.conflicts_detected,
            conflicts_resolved: self.conflicts_detected.saturating_sub(violation_count),
            total_instructions,
            instructions_per_aircraft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Position, Velocity};

    fn aircraft(callsign: &str, x: f64, altitude: f64) -> Aircraft {
        Aircraft::new(
            callsign,
            Position::new(x, 0.0, altitude),
            Velocity::new(300.0, 0.0),
            Vec::new(),
        )
    }

    #[test]
    fn violation_lifecycle_tracks_duration_and_resolution() {
        let mut monitor = SafetyMonitor::new();

        // 2 NM apart at the same altitude below FL290: violating
        let fleet = vec![aircraft("A1", 0.0, 20_000.0), aircraft("B1", 2.0, 20_000.0)];
        monitor.update(&fleet, 0.0);
        assert_eq!(monitor.violations().len(), 1);
        assert_eq!(monitor.active_violation_count(), 1);
        assert!(monitor.is_pair_violating("B1", "A1"));
        assert!((monitor.violations()[0].duration - 0.0).abs() < 1e-12);

        // Still violating, slightly closer: duration accumulates and the
        // last observed separation refreshes
        let fleet = vec![aircraft("A1", 0.0, 20_000.0), aircraft("B1", 1.5, 20_000.0)];
        monitor.update(&fleet, 1.0);
        assert_eq!(monitor.violations().len(), 1);
        assert!((monitor.violations()[0].duration - 1.0).abs() < 1e-12);
        assert!((monitor.violations()[0].horizontal_separation - 1.5).abs() < 1e-12);

        // Separated again: dropped from the active map, history retained
        let fleet = vec![aircraft("A1", 0.0, 20_000.0), aircraft("B1", 8.0, 20_000.0)];
        monitor.update(&fleet, 2.0);
        assert_eq!(monitor.active_violation_count(), 0);
        assert_eq!(monitor.violations().len(), 1);
        assert!((monitor.violations()[0].duration - 1.0).abs() < 1e-12);
    }

    #[test]
    fn reentry_creates_a_new_history_record() {
        let mut monitor = SafetyMonitor::new();
        let close = vec![aircraft("A1", 0.0, 20_000.0), aircraft("B1", 2.0, 20_000.0)];
        let apart = vec![aircraft("A1", 0.0, 20_000.0), aircraft("B1", 10.0, 20_000.0)];

        monitor.update(&close, 0.0);
        monitor.update(&apart, 1.0);
        monitor.update(&close, 2.0);

        assert_eq!(monitor.violations().len(), 2);
        assert_eq!(monitor.active_violation_count(), 1);
    }

    #[test]
    fn violation_severity_thresholds() {
        let mut monitor = SafetyMonitor::new();

        // Below FL290 the horizontal minimum is 5 NM
        monitor.update(&[aircraft("A1", 0.0, 20_000.0), aircraft("B1", 2.0, 20_000.0)], 0.0);
        assert_eq!(monitor.violations()[0].severity, ViolationSeverity::Critical);

        let mut monitor = SafetyMonitor::new();
        monitor.update(&[aircraft("A1", 0.0, 20_000.0), aircraft("B1", 3.0, 20_000.0)], 0.0);
        assert_eq!(monitor.violations()[0].severity, ViolationSeverity::Major);

        let mut monitor = SafetyMonitor::new();
        monitor.update(&[aircraft("A1", 0.0, 20_000.0), aircraft("B1", 4.5, 20_000.0)], 0.0);
        assert_eq!(monitor.violations()[0].severity, ViolationSeverity::Minor);
    }

    #[test]
    fn near_miss_recorded_for_separated_but_close_pairs() {
        let mut monitor = SafetyMonitor::new();

        // 6 NM apart, co-altitude: separated, horizontal ratio 1.2
        let fleet = vec![aircraft("A1", 0.0, 20_000.0), aircraft("B1", 6.0, 20_000.0)];
        monitor.update(&fleet, 0.0);

        assert_eq!(monitor.near_misses().len(), 1);
        assert!(monitor.violations().is_empty());
        let near_miss = &monitor.near_misses()[0];
        assert!((near_miss.min_separation_ratio - 1.2).abs() < 1e-9);

        // Sustained encounter records a fresh sample each tick
        monitor.update(&fleet, 1.0);
        assert_eq!(monitor.near_misses().len(), 2);
    }

    #[test]
    fn zero_vertical_separation_relies_on_horizontal_ratio() {
        let mut monitor = SafetyMonitor::new();

        // v = 0 would make the vertical ratio zero; it must be ignored
        let fleet = vec![aircraft("A1", 0.0, 20_000.0), aircraft("B1", 5.5, 20_000.0)];
        monitor.update(&fleet, 0.0);
        assert_eq!(monitor.near_misses().len(), 1);
        assert!((monitor.near_misses()[0].min_separation_ratio - 1.1).abs() < 1e-9);
    }

    #[test]
    fn near_miss_and_violation_sets_are_disjoint_per_tick() {
        let mut monitor = SafetyMonitor::new();

        let fleet = vec![
            aircraft("VIO1", 0.0, 20_000.0),
            aircraft("VIO2", 3.0, 20_000.0),
            aircraft("NEAR1", 50.0, 20_000.0),
            aircraft("NEAR2", 56.0, 20_000.0),
        ];
        monitor.update(&fleet, 0.0);

        assert_eq!(monitor.violations().len(), 1);
        for near_miss in monitor.near_misses() {
            assert!(!(near_miss.aircraft1 == "VIO1" && near_miss.aircraft2 == "VIO2"));
        }
    }

    #[test]
    fn comfortably_separated_pairs_record_nothing() {
        let mut monitor = SafetyMonitor::new();
        let fleet = vec![aircraft("A1", 0.0, 20_000.0), aircraft("B1", 50.0, 20_000.0)];
        monitor.update(&fleet, 0.0);
        assert!(monitor.violations().is_empty());
        assert!(monitor.near_misses().is_empty());
    }

    #[test]
    fn metrics_recompute_from_history() {
        let mut monitor = SafetyMonitor::new();
        monitor.record_conflicts(3);

        let fleet = vec![aircraft("A1", 0.0, 20_000.0), aircraft("B1", 2.0, 20_000.0)];
        monitor.update(&fleet, 10.0);
        let fleet = vec![aircraft("A1", 0.0, 20_000.0), aircraft("B1", 1.8, 20_000.0)];
        monitor.update(&fleet, 11.0);

        let metrics = monitor.calculate_metrics(None);
        assert!((metrics.simulation_duration - 1.0).abs() < 1e-12);
        assert_eq!(metrics.total_aircraft, 2);
        assert_eq!(metrics.violation_count, 1);
        assert!((metrics.violation_duration_total - 1.0).abs() < 1e-12);
        assert_eq!(metrics.min_separation_achieved, Some(1.8));
        assert_eq!(metrics.conflicts_detected, 3);
        assert_eq!(metrics.conflicts_resolved, 2);
        assert_eq!(metrics.total_instructions, 0);
    }

    #[test]
    fn metrics_with_no_history_are_empty() {
        let monitor = SafetyMonitor::new();
        let metrics = monitor.calculate_metrics(None);
        assert_eq!(metrics.violation_count, 0);
        assert_eq!(metrics.min_separation_achieved, None);
        assert!((metrics.near_miss_rate - 0.0).abs() < 1e-12);
        assert_eq!(metrics.conflicts_resolved, 0);
    }

    #[test]
    fn near_miss_rate_is_per_hundred_aircraft() {
        let mut monitor = SafetyMonitor::new();
        let fleet = vec![aircraft("A1", 0.0, 20_000.0), aircraft("B1", 6.0, 20_000.0)];
        monitor.update(&fleet, 0.0);

        let metrics = monitor.calculate_metrics(None);
        assert_eq!(metrics.near_miss_count, 1);
        assert!((metrics.near_miss_rate - 50.0).abs() < 1e-9);
    }
}
