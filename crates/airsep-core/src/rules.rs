//! Separation minima profiles.

use serde::{Deserialize, Serialize};

/// Minimum separation standards for an aircraft pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeparationRequirements {
    /// Required horizontal separation in nautical miles
    pub horizontal_nm: f64,
    /// Required vertical separation in feet
    pub vertical_ft: f64,
}

impl SeparationRequirements {
    /// Standard enroute minima for the given altitude.
    ///
    /// 5 NM horizontal always; 1000 ft vertical below FL290, 2000 ft at
    /// or above.
    pub fn standard(altitude: f64) -> Self {
        if altitude < 29_000.0 {
            Self {
                horizontal_nm: 5.0,
                vertical_ft: 1_000.0,
            }
        } else {
            Self {
                horizontal_nm: 5.0,
                vertical_ft: 2_000.0,
            }
        }
    }

    /// Reduced terminal-area minima.
    pub fn terminal() -> Self {
        Self {
            horizontal_nm: 3.0,
            vertical_ft: 1_000.0,
        }
    }
}
