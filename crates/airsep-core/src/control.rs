//! Automated conflict-resolution policy and instruction log.
//!
//! Consumes the detector's conflict list each tick and issues corrective
//! instructions by setting pending targets on the affected aircraft. The
//! instruction log is append-only; entries are never mutated after issue.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::aircraft::Aircraft;
use crate::conflict::{Conflict, ConflictSeverity};
use crate::rules::SeparationRequirements;

/// Seconds within which a pair is not re-instructed.
const COOLDOWN_WINDOW_SECS: f64 = 60.0;
/// How many recent instructions the cooldown scan inspects.
const COOLDOWN_SCAN_DEPTH: usize = 20;
/// Degrees of the clockwise avoidance vector.
const AVOIDANCE_VECTOR_DEG: f64 = 30.0;
/// Knots added or removed by a speed resolution.
const SPEED_ADJUST_KT: f64 = 50.0;
/// Extra altitude margin beyond the vertical minimum, in feet.
const ALTITUDE_BUFFER_FT: f64 = 1_000.0;

/// Instruction priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Instruction kinds with their parameter payloads.
///
/// The resolution policy only ever issues the first three; the rest are
/// part of the instruction vocabulary for external issuers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstructionKind {
    AltitudeChange { new_altitude: f64 },
    HeadingChange { new_heading: f64 },
    SpeedChange { new_speed: f64 },
    Hold { duration_secs: f64 },
    DirectTo { waypoint: String },
    ClearedApproach,
}

impl InstructionKind {
    /// Stable label used for statistics and logging.
    pub fn label(&self) -> &'static str {
        match self {
            InstructionKind::AltitudeChange { .. } => "altitude_change",
            InstructionKind::HeadingChange { .. } => "heading_change",
            InstructionKind::SpeedChange { .. } => "speed_change",
            InstructionKind::Hold { .. } => "hold",
            InstructionKind::DirectTo { .. } => "direct_to",
            InstructionKind::ClearedApproach => "cleared_approach",
        }
    }
}

/// Why an instruction was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionReason {
    TrafficConflict,
    Sequencing,
    Weather,
}

/// A single issued ATC instruction. Immutable once logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ATCInstruction {
    pub callsign: String,
    /// Simulation time at issue, in seconds
    pub timestamp: f64,
    #[serde(flatten)]
    pub kind: InstructionKind,
    pub reason: InstructionReason,
    pub priority: Priority,
}

/// Instruction log summary, grouped by kind and priority.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstructionStats {
    pub total_instructions: usize,
    pub by_kind: BTreeMap<&'static str, usize>,
    pub by_priority: BTreeMap<&'static str, usize>,
}

/// The automated resolution policy engine.
#[derive(Debug, Clone, Default)]
pub struct AtcSystem {
    instructions: Vec<ATCInstruction>,
    instruction_count: usize,
}

impl AtcSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Act on one tick's conflict list.
    ///
    /// Low-severity conflicts are left to future ticks; a conflict that
    /// goes unresolved here is simply re-detected next tick.
    pub fn update(&mut self, conflicts: &[Conflict], aircraft_list: &mut [Aircraft], current_time: f64) {
        for conflict in conflicts {
            if matches!(conflict.severity, ConflictSeverity::High | ConflictSeverity::Medium) {
                self.resolve_conflict(conflict, aircraft_list, current_time);
            }
        }
    }

    /// Resolution strategies in preference order: altitude, then an
    /// unconditional avoidance vector, then speed. The speed branch is
    /// retained as the final strategy even though the vector step never
    /// fails today.
    fn resolve_conflict(
        &mut self,
        conflict: &Conflict,
        aircraft_list: &mut [Aircraft],
        current_time: f64,
    ) {
        let idx1 = aircraft_list
            .iter()
            .position(|ac| ac.callsign == conflict.aircraft1);
        let idx2 = aircraft_list
            .iter()
            .position(|ac| ac.callsign == conflict.aircraft2);

        // Unknown callsigns are a silent no-op; the conflict carries over.
        let (Some(idx1), Some(idx2)) = (idx1, idx2) else {
            return;
        };

        if self.recently_instructed(&conflict.aircraft1, &conflict.aircraft2, current_time) {
            return;
        }

        if self.try_altitude_resolution(idx1, idx2, conflict, aircraft_list, current_time) {
            return;
        }

        if self.try_heading_resolution(idx1, conflict, aircraft_list, current_time) {
            return;
        }

        self.try_speed_resolution(idx1, idx2, conflict, aircraft_list, current_time);
    }

    /// Shift the lower aircraft further down, or failing that, the higher
    /// aircraft further up, by the vertical minimum plus a buffer.
    fn try_altitude_resolution(
        &mut self,
        idx1: usize,
        idx2: usize,
        conflict: &Conflict,
        aircraft_list: &mut [Aircraft],
        current_time: f64,
    ) -> bool {
        let alt1 = aircraft_list[idx1].position.altitude;
        let alt2 = aircraft_list[idx2].position.altitude;

        let avg_altitude = (alt1 + alt2) / 2.0;
        let req = SeparationRequirements::standard(avg_altitude);
        let priority = Self::priority_for(conflict.severity);

        let (lower, higher) = if alt1 < alt2 { (idx1, idx2) } else { (idx2, idx1) };

        let descend_to = aircraft_list[lower].position.altitude - req.vertical_ft - ALTITUDE_BUFFER_FT;
        if descend_to >= Aircraft::MIN_ALTITUDE {
            let instruction = ATCInstruction {
                callsign: aircraft_list[lower].callsign.clone(),
                timestamp: current_time,
                kind: InstructionKind::AltitudeChange {
                    new_altitude: descend_to,
                },
                reason: InstructionReason::TrafficConflict,
                priority,
            };
            self.issue_instruction(instruction, &mut aircraft_list[lower]);
            return true;
        }

        let climb_to = aircraft_list[higher].position.altitude + req.vertical_ft + ALTITUDE_BUFFER_FT;
        if climb_to <= Aircraft::MAX_ALTITUDE {
            let instruction = ATCInstruction {
                callsign: aircraft_list[higher].callsign.clone(),
                timestamp: current_time,
                kind: InstructionKind::AltitudeChange {
                    new_altitude: climb_to,
                },
                reason: InstructionReason::TrafficConflict,
                priority,
            };
            self.issue_instruction(instruction, &mut aircraft_list[higher]);
            return true;
        }

        false
    }

    /// Vector the first-named aircraft 30 degrees clockwise. Always
    /// succeeds.
    fn try_heading_resolution(
        &mut self,
        idx1: usize,
        conflict: &Conflict,
        aircraft_list: &mut [Aircraft],
        current_time: f64,
    ) -> bool {
        let new_heading =
            (aircraft_list[idx1].velocity.heading + AVOIDANCE_VECTOR_DEG).rem_euclid(360.0);

        let instruction = ATCInstruction {
            callsign: aircraft_list[idx1].callsign.clone(),
            timestamp: current_time,
            kind: InstructionKind::HeadingChange { new_heading },
            reason: InstructionReason::TrafficConflict,
            priority: Self::priority_for(conflict.severity),
        };
        self.issue_instruction(instruction, &mut aircraft_list[idx1]);
        true
    }

    /// Slow the faster aircraft or speed up the slower one.
    fn try_speed_resolution(
        &mut self,
        idx1: usize,
        idx2: usize,
        _conflict: &Conflict,
        aircraft_list: &mut [Aircraft],
        current_time: f64,
    ) -> bool {
        let speed1 = aircraft_list[idx1].velocity.speed;
        let speed2 = aircraft_list[idx2].velocity.speed;

        let (target, new_speed) = if speed1 > speed2 {
            (idx1, (speed1 - SPEED_ADJUST_KT).max(Aircraft::MIN_SPEED))
        } else {
            (idx2, (speed2 + SPEED_ADJUST_KT).min(Aircraft::MAX_SPEED))
        };

        let instruction = ATCInstruction {
            callsign: aircraft_list[target].callsign.clone(),
            timestamp: current_time,
            kind: InstructionKind::SpeedChange { new_speed },
            reason: InstructionReason::TrafficConflict,
            priority: Priority::Medium,
        };
        self.issue_instruction(instruction, &mut aircraft_list[target]);
        true
    }

    fn priority_for(severity: ConflictSeverity) -> Priority {
        if severity == ConflictSeverity::High {
            Priority::High
        } else {
            Priority::Medium
        }
    }

    /// Append the instruction to the log and apply it as a pending target.
    ///
    /// Instructions take effect gradually: the kinematic model realizes the
    /// target over subsequent ticks.
    fn issue_instruction(&mut self, instruction: ATCInstruction, aircraft: &mut Aircraft) {
        match &instruction.kind {
            InstructionKind::AltitudeChange { new_altitude } => aircraft.set_altitude(*new_altitude),
            InstructionKind::HeadingChange { new_heading } => aircraft.set_heading(*new_heading),
            InstructionKind::SpeedChange { new_speed } => aircraft.set_speed(*new_speed),
            // Not issued by the policy; no pending-target effect.
            InstructionKind::Hold { .. }
            | InstructionKind::DirectTo { .. }
            | InstructionKind::ClearedApproach => {}
        }

        self.instructions.push(instruction);
        self.instruction_count += 1;
    }

    /// Whether either callsign was instructed within the cooldown window.
    ///
    /// Scans the newest instructions first and stops at the first entry
    /// older than the window.
    fn recently_instructed(&self, callsign1: &str, callsign2: &str, current_time: f64) -> bool {
        for instruction in self.instructions.iter().rev().take(COOLDOWN_SCAN_DEPTH) {
            if current_time - instruction.timestamp > COOLDOWN_WINDOW_SECS {
                break;
            }
            if instruction.callsign == callsign1 || instruction.callsign == callsign2 {
                return true;
            }
        }
        false
    }

    /// The full append-only instruction log.
    pub fn instructions(&self) -> &[ATCInstruction] {
        &self.instructions
    }

    /// Total instructions issued, including any pruned from the log.
    pub fn instruction_count(&self) -> usize {
        self.instruction_count
    }

    /// All instructions issued to a callsign.
    pub fn instructions_for_aircraft(&self, callsign: &str) -> Vec<&ATCInstruction> {
        self.instructions
            .iter()
            .filter(|inst| inst.callsign == callsign)
            .collect()
    }

    /// Instructions within `time_window` seconds of the newest entry.
    pub fn recent_instructions(&self, time_window: f64) -> Vec<&ATCInstruction> {
        let Some(latest) = self.instructions.last() else {
            return Vec::new();
        };
        let cutoff = latest.timestamp - time_window;
        self.instructions
            .iter()
            .filter(|inst| inst.timestamp >= cutoff)
            .collect()
    }

    /// Summary counts by kind and priority.
    pub fn statistics(&self) -> InstructionStats {
        let mut stats = InstructionStats {
            total_instructions: self.instructions.len(),
            ..InstructionStats::default()
        };

        for instruction in &self.instructions {
            *stats.by_kind.entry(instruction.kind.label()).or_insert(0) += 1;
            let priority = match instruction.priority {
                Priority::Low => "low",
                Priority::Medium => "medium",
                Priority::High => "high",
                Priority::Critical => "critical",
            };
            *stats.by_priority.entry(priority).or_insert(0) += 1;
        }

        stats
    }

    /// Drop log entries older than `before_time`. The cumulative
    /// instruction count is unaffected.
    pub fn clear_old_instructions(&mut self, before_time: f64) {
        self.instructions.retain(|inst| inst.timestamp >= before_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Position, Velocity};

    fn aircraft(callsign: &str, altitude: f64, heading: f64, speed: f64) -> Aircraft {
        Aircraft::new(
            callsign,
            Position::new(0.0, 0.0, altitude),
            Velocity::new(speed, heading),
            Vec::new(),
        )
    }

    fn conflict(a: &str, b: &str, severity: ConflictSeverity) -> Conflict {
        Conflict {
            aircraft1: a.to_string(),
            aircraft2: b.to_string(),
            time_to_cpa: 45.0,
            horizontal_separation_at_cpa: 1.0,
            vertical_separation_at_cpa: 0.0,
            severity,
        }
    }

    #[test]
    fn altitude_resolution_descends_the_lower_aircraft() {
        let mut fleet = vec![
            aircraft("UAL100", 35_000.0, 90.0, 450.0),
            aircraft("AAL200", 36_000.0, 270.0, 450.0),
        ];
        let mut atc = AtcSystem::new();
        atc.update(&[conflict("UAL100", "AAL200", ConflictSeverity::High)], &mut fleet, 10.0);

        assert_eq!(atc.instruction_count(), 1);
        let inst = &atc.instructions()[0];
        assert_eq!(inst.callsign, "UAL100");
        assert_eq!(inst.priority, Priority::High);
        // avg altitude 35500 is above FL290: 2000 ft minimum plus buffer
        assert_eq!(
            inst.kind,
            InstructionKind::AltitudeChange { new_altitude: 32_000.0 }
        );
        assert_eq!(fleet[0].target_altitude, Some(32_000.0));
        assert_eq!(fleet[1].target_altitude, None);
    }

    #[test]
    fn heading_vector_used_when_altitude_is_infeasible() {
        // Lower aircraft cannot descend below the floor and the higher one
        // cannot climb above the ceiling.
        let mut fleet = vec![
            aircraft("LOW1", 1_000.0, 0.0, 300.0),
            aircraft("HIGH1", 45_000.0, 180.0, 300.0),
        ];
        let mut atc = AtcSystem::new();
        atc.update(&[conflict("LOW1", "HIGH1", ConflictSeverity::Medium)], &mut fleet, 0.0);

        assert_eq!(atc.instruction_count(), 1);
        let inst = &atc.instructions()[0];
        assert_eq!(inst.callsign, "LOW1");
        assert_eq!(inst.kind, InstructionKind::HeadingChange { new_heading: 30.0 });
        assert_eq!(inst.priority, Priority::Medium);
        assert_eq!(fleet[0].target_heading, Some(30.0));
    }

    #[test]
    fn low_severity_conflicts_are_not_acted_on() {
        let mut fleet = vec![
            aircraft("A1", 20_000.0, 0.0, 300.0),
            aircraft("B1", 20_500.0, 180.0, 300.0),
        ];
        let mut atc = AtcSystem::new();
        atc.update(&[conflict("A1", "B1", ConflictSeverity::Low)], &mut fleet, 0.0);
        assert_eq!(atc.instruction_count(), 0);
    }

    #[test]
    fn cooldown_suppresses_repeat_instructions() {
        let mut fleet = vec![
            aircraft("A1", 35_000.0, 90.0, 450.0),
            aircraft("B1", 36_000.0, 270.0, 450.0),
        ];
        let mut atc = AtcSystem::new();
        let c = conflict("A1", "B1", ConflictSeverity::High);

        atc.update(&[c.clone()], &mut fleet, 0.0);
        atc.update(&[c.clone()], &mut fleet, 30.0);
        assert_eq!(atc.instruction_count(), 1);

        // Window expired: the pair may be instructed again
        atc.update(&[c], &mut fleet, 61.0);
        assert_eq!(atc.instruction_count(), 2);
    }

    #[test]
    fn unknown_callsign_is_a_silent_noop() {
        let mut fleet = vec![aircraft("A1", 35_000.0, 90.0, 450.0)];
        let mut atc = AtcSystem::new();
        atc.update(&[conflict("A1", "GHOST", ConflictSeverity::High)], &mut fleet, 0.0);
        assert_eq!(atc.instruction_count(), 0);
        assert_eq!(fleet[0].target_altitude, None);
    }

    #[test]
    fn speed_resolution_slows_the_faster_aircraft() {
        let mut fleet = vec![
            aircraft("FAST1", 20_000.0, 90.0, 500.0),
            aircraft("SLOW1", 21_000.0, 270.0, 300.0),
        ];
        let mut atc = AtcSystem::new();
        let c = conflict("FAST1", "SLOW1", ConflictSeverity::Medium);
        atc.try_speed_resolution(0, 1, &c, &mut fleet, 0.0);

        let inst = &atc.instructions()[0];
        assert_eq!(inst.callsign, "FAST1");
        assert_eq!(inst.kind, InstructionKind::SpeedChange { new_speed: 450.0 });
        assert_eq!(fleet[0].target_speed, Some(450.0));
    }

    #[test]
    fn statistics_group_by_kind_and_priority() {
        let mut fleet = vec![
            aircraft("A1", 35_000.0, 90.0, 450.0),
            aircraft("B1", 36_000.0, 270.0, 450.0),
            aircraft("C1", 1_000.0, 0.0, 300.0),
            aircraft("D1", 45_000.0, 180.0, 300.0),
        ];
        let mut atc = AtcSystem::new();
        atc.update(&[conflict("A1", "B1", ConflictSeverity::High)], &mut fleet, 0.0);
        atc.update(&[conflict("C1", "D1", ConflictSeverity::Medium)], &mut fleet, 0.0);

        let stats = atc.statistics();
        assert_eq!(stats.total_instructions, 2);
        assert_eq!(stats.by_kind.get("altitude_change"), Some(&1));
        assert_eq!(stats.by_kind.get("heading_change"), Some(&1));
        assert_eq!(stats.by_priority.get("high"), Some(&1));
        assert_eq!(stats.by_priority.get("medium"), Some(&1));
    }

    #[test]
    fn pruning_keeps_the_cumulative_count() {
        let mut fleet = vec![
            aircraft("A1", 35_000.0, 90.0, 450.0),
            aircraft("B1", 36_000.0, 270.0, 450.0),
        ];
        let mut atc = AtcSystem::new();
        atc.update(&[conflict("A1", "B1", ConflictSeverity::High)], &mut fleet, 0.0);
        atc.clear_old_instructions(100.0);

        assert!(atc.instructions().is_empty());
        assert_eq!(atc.instruction_count(), 1);
        assert!(atc.recent_instructions(300.0).is_empty());
    }

    #[test]
    fn instruction_queries_filter_by_callsign_and_window() {
        let mut fleet = vec![
            aircraft("A1", 35_000.0, 90.0, 450.0),
            aircraft("B1", 36_000.0, 270.0, 450.0),
            aircraft("C1", 35_000.0, 90.0, 450.0),
            aircraft("D1", 36_000.0, 270.0, 450.0),
        ];
        let mut atc = AtcSystem::new();
        atc.update(&[conflict("A1", "B1", ConflictSeverity::High)], &mut fleet, 0.0);
        atc.update(&[conflict("C1", "D1", ConflictSeverity::High)], &mut fleet, 500.0);

        assert_eq!(atc.instructions_for_aircraft("A1").len(), 1);
        assert_eq!(atc.instructions_for_aircraft("GHOST").len(), 0);
        // Only the newest instruction falls in a 60 s window of the latest
        assert_eq!(atc.recent_instructions(60.0).len(), 1);
    }
}
