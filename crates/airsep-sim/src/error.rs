//! Simulation driver errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Update frequency must be a positive, finite number of Hz.
    #[error("invalid update frequency: {0} Hz")]
    InvalidUpdateFrequency(f64),

    /// Scenario name not recognized.
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
}
