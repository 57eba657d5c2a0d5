//! Core logic for closed-loop air-traffic separation management.
//!
//! The crate is split along the control loop: [`aircraft`] holds the
//! rate-limited kinematic model, [`conflict`] predicts losses of
//! separation inside a lookahead horizon, [`control`] issues resolution
//! instructions, and [`safety`] records what actually happened so that
//! [`report`] can grade the run.

pub mod aircraft;
pub mod conflict;
pub mod control;
pub mod models;
pub mod report;
pub mod rules;
pub mod safety;

pub use aircraft::{shortest_heading_difference, Aircraft};
pub use conflict::{Airspace, Conflict, ConflictSeverity, DEFAULT_LOOKAHEAD_SECS};
pub use control::{
    ATCInstruction, AtcSystem, InstructionKind, InstructionReason, InstructionStats, Priority,
};
pub use models::{AircraftStatus, Position, Sector, Velocity, Waypoint};
pub use report::{baseline_comparison, safety_report, SafetyRating};
pub use rules::SeparationRequirements;
pub use safety::{
    NearMiss, SafetyMetrics, SafetyMonitor, SeparationViolation, ViolationSeverity,
};
