//! Textual safety reporting.
//!
//! Pure, deterministic formatting over [`SafetyMetrics`]; no algorithmic
//! logic lives here.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::safety::{SafetyMetrics, SeparationViolation, ViolationSeverity};

/// Overall safety rating derived from violation count and near-miss rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyRating {
    Safe,
    Acceptable,
    Marginal,
    Unsafe,
}

impl SafetyRating {
    pub fn from_metrics(metrics: &SafetyMetrics) -> Self {
        if metrics.violation_count > 0 {
            SafetyRating::Unsafe
        } else if metrics.near_miss_rate > 5.0 {
            SafetyRating::Marginal
        } else if metrics.near_miss_rate > 2.0 {
            SafetyRating::Acceptable
        } else {
            SafetyRating::Safe
        }
    }
}

impl std::fmt::Display for SafetyRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SafetyRating::Safe => "SAFE",
            SafetyRating::Acceptable => "ACCEPTABLE",
            SafetyRating::Marginal => "MARGINAL",
            SafetyRating::Unsafe => "UNSAFE",
        };
        f.write_str(label)
    }
}

/// Render the full safety report.
///
/// `violations` is the monitor's violation history, used to list the worst
/// events.
pub fn safety_report(metrics: &SafetyMetrics, violations: &[SeparationViolation]) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);
    let line = "-".repeat(60);

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "AIR TRAFFIC CONTROL SAFETY REPORT");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "Simulation Duration: {:.1} seconds ({:.1} minutes)",
        metrics.simulation_duration,
        metrics.simulation_duration / 60.0
    );
    let _ = writeln!(out, "Total Aircraft: {}", metrics.total_aircraft);
    let _ = writeln!(out);

    let _ = writeln!(out, "SEPARATION VIOLATIONS");
    let _ = writeln!(out, "{line}");
    let _ = writeln!(out, "Total Violations: {}", metrics.violation_count);
    let _ = writeln!(
        out,
        "Total Duration: {:.1} seconds",
        metrics.violation_duration_total
    );
    if let Some(min_separation) = metrics.min_separation_achieved {
        let _ = writeln!(out, "Minimum Separation: {min_separation:.2} NM");
        let _ = writeln!(out);
        let _ = writeln!(out, "Critical Violations:");
        for violation in violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Critical)
            .take(5)
        {
            let _ = writeln!(
                out,
                "  - {} & {}: {:.2} NM at t={:.0}s",
                violation.aircraft1,
                violation.aircraft2,
                violation.horizontal_separation,
                violation.timestamp
            );
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "NEAR MISSES");
    let _ = writeln!(out, "{line}");
    let _ = writeln!(out, "Count: {}", metrics.near_miss_count);
    let _ = writeln!(out, "Rate: {:.2} per 100 aircraft", metrics.near_miss_rate);
    let _ = writeln!(out);

    let _ = writeln!(out, "CONFLICT RESOLUTION");
    let _ = writeln!(out, "{line}");
    let _ = writeln!(out, "Conflicts Detected: {}", metrics.conflicts_detected);
    let _ = writeln!(out, "Conflicts Resolved: {}", metrics.conflicts_resolved);
    if metrics.conflicts_detected > 0 {
        let rate = (metrics.conflicts_resolved as f64 / metrics.conflicts_detected as f64) * 100.0;
        let _ = writeln!(out, "Resolution Rate: {rate:.1}%");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "CONTROLLER WORKLOAD");
    let _ = writeln!(out, "{line}");
    let _ = writeln!(out, "Total Instructions: {}", metrics.total_instructions);
    let _ = writeln!(
        out,
        "Instructions per Aircraft: {:.2}",
        metrics.instructions_per_aircraft
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "SAFETY ASSESSMENT");
    let _ = writeln!(out, "{line}");
    let _ = writeln!(
        out,
        "Overall Safety Rating: {}",
        SafetyRating::from_metrics(metrics)
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "THRESHOLD CHECKS");
    let _ = writeln!(out, "{line}");

    if metrics.violation_count == 0 {
        let _ = writeln!(out, "PASS: no separation violations");
    } else {
        let _ = writeln!(
            out,
            "FAIL: {} separation violation(s)",
            metrics.violation_count
        );
    }

    if metrics.near_miss_rate < 2.0 {
        let _ = writeln!(out, "PASS: near miss rate {:.1}% < 2%", metrics.near_miss_rate);
    } else if metrics.near_miss_rate < 5.0 {
        let _ = writeln!(out, "WARN: near miss rate {:.1}% < 5%", metrics.near_miss_rate);
    } else {
        let _ = writeln!(out, "FAIL: near miss rate {:.1}% >= 5%", metrics.near_miss_rate);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{rule}");

    out
}

/// Render the automated-vs-baseline comparison table.
pub fn baseline_comparison(current: &SafetyMetrics, baseline: &SafetyMetrics) -> String {
    let mut out = String::new();
    let rule = "=".repeat(70);

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "AUTOMATED vs BASELINE COMPARISON");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<35} | {:<12} | {:<12} | Delta",
        "Metric", "Auto", "Baseline"
    );
    let _ = writeln!(out, "{}", "-".repeat(70));

    let rows: [(&str, f64, f64, usize); 4] = [
        (
            "Separation Violations",
            current.violation_count as f64,
            baseline.violation_count as f64,
            0,
        ),
        (
            "Near Misses",
            current.near_miss_count as f64,
            baseline.near_miss_count as f64,
            0,
        ),
        (
            "Near Miss Rate (per 100)",
            current.near_miss_rate,
            baseline.near_miss_rate,
            2,
        ),
        (
            "Instructions per Aircraft",
            current.instructions_per_aircraft,
            baseline.instructions_per_aircraft,
            2,
        ),
    ];

    for (name, auto_value, baseline_value, precision) in rows {
        let delta = auto_value - baseline_value;
        let _ = writeln!(
            out,
            "{name:<35} | {auto_value:<12.precision$} | {baseline_value:<12.precision$} | {delta:+.precision$}",
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{rule}");

    out
}
