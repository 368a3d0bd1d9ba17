//! Delay estimation from a volume-to-capacity relationship.
//!
//! Two estimators coexist and are deliberately kept as separately named
//! strategies: the cycle-relative piecewise formula and the capacity-ratio
//! formula. Comparisons are only meaningful when both sides use the same
//! strategy, so callers pick one explicitly.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Maximum per-lane throughput, vehicles/hour/lane.
pub const SATURATION_FLOW_RATE: f64 = 1800.0;

/// Default signal cycle length in seconds.
pub const DEFAULT_CYCLE_S: f64 = 90.0;

/// Average delay for one approach using the cycle-relative piecewise
/// formula. Strict variant: non-positive green time is an error.
///
/// Capacity is the green share of the cycle times the saturation flow rate.
/// Undersaturated approaches (v/c < 1) see a fraction of half the green;
/// saturated ones accrue overflow delay proportional to (v/c - 1).
pub fn cycle_relative_delay(volume: f64, green_s: f64, cycle_s: f64) -> Result<f64> {
    if green_s <= 0.0 {
        return Err(Error::InvalidParameter(green_s));
    }

    let capacity = (green_s / cycle_s) * SATURATION_FLOW_RATE;
    if capacity <= 0.0 {
        return Ok(0.0);
    }

    let vc = volume / capacity;
    let delay = if vc < 1.0 {
        0.5 * (1.0 - vc) * (green_s / 2.0)
    } else {
        0.5 * green_s + (vc - 1.0) * green_s
    };

    Ok(delay.max(0.0))
}

/// Permissive variant for batch pipelines: a non-positive green time
/// degrades to `0.0` instead of failing, so one bad parameter cannot abort
/// a whole batch.
pub fn cycle_relative_delay_or_zero(volume: f64, green_s: f64, cycle_s: f64) -> f64 {
    match cycle_relative_delay(volume, green_s, cycle_s) {
        Ok(delay) => delay,
        Err(_) => {
            warn!(green_s, "Non-positive green time in delay calculation, using 0.0");
            0.0
        }
    }
}

/// Per-volume-reading estimator without an explicit cycle length.
///
/// Capacity is the green time converted to hours times the saturation flow
/// rate. Demand above capacity yields a percentage-style overflow delay;
/// demand below capacity a small queuing residual.
pub fn capacity_ratio_delay(volume: f64, green_s: f64) -> f64 {
    let capacity = (green_s / 3600.0) * SATURATION_FLOW_RATE;
    if capacity <= 0.0 {
        return 0.0;
    }

    if volume > capacity {
        ((volume - capacity) / capacity) * 100.0
    } else {
        (volume / capacity) * 10.0
    }
}

/// Which delay estimator a pipeline run uses. Both sides of a plan
/// comparison must share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayStrategy {
    /// Piecewise queueing formula relative to a 90 s cycle.
    #[default]
    CycleRelative,
    /// Direct capacity-ratio formula, no explicit cycle.
    CapacityRatio,
}

impl std::fmt::Display for DelayStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DelayStrategy::CycleRelative => "cycle-relative",
            DelayStrategy::CapacityRatio => "capacity-ratio",
        })
    }
}

impl DelayStrategy {
    /// Estimates delay for one observation. Uses the permissive degradation
    /// path so batch evaluation never aborts on a bad green time.
    pub fn estimate(self, volume: f64, green_s: f64) -> f64 {
        match self {
            DelayStrategy::CycleRelative => {
                cycle_relative_delay_or_zero(volume, green_s, DEFAULT_CYCLE_S)
            }
            DelayStrategy::CapacityRatio => capacity_ratio_delay(volume, green_s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_volume() {
        // v/c = 0: the piecewise formula still charges the empty-approach
        // floor of half the half-green
        let d = cycle_relative_delay(0.0, 30.0, DEFAULT_CYCLE_S).unwrap();
        assert!((d - 7.5).abs() < 1e-9);
        assert_eq!(capacity_ratio_delay(0.0, 30.0), 0.0);
    }

    #[test]
    fn test_cycle_relative_undersaturated() {
        // capacity = 30/90 * 1800 = 600; vc = 300/600 = 0.5
        let delay = cycle_relative_delay(300.0, 30.0, 90.0).unwrap();
        assert!((delay - 0.5 * 0.5 * 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_cycle_relative_oversaturated() {
        // capacity = 600; vc = 1200/600 = 2.0
        let delay = cycle_relative_delay(1200.0, 30.0, 90.0).unwrap();
        assert!((delay - (15.0 + 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_delay_grows_with_volume_once_saturated() {
        // cycle-relative: capacity 600 at green 30 / cycle 90
        let mut last = 0.0;
        for volume in [600.0, 900.0, 1200.0, 1500.0] {
            let delay = cycle_relative_delay(volume, 30.0, 90.0).unwrap();
            assert!(delay > last, "not increasing at volume {volume}");
            last = delay;
        }

        // capacity-ratio: capacity 15 at green 30
        let mut last = 0.0;
        for volume in [16.0, 30.0, 60.0, 120.0] {
            let delay = capacity_ratio_delay(volume, 30.0);
            assert!(delay > last, "not increasing at volume {volume}");
            last = delay;
        }
    }

    #[test]
    fn test_strict_rejects_non_positive_green() {
        assert!(matches!(
            cycle_relative_delay(100.0, 0.0, 90.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            cycle_relative_delay(100.0, -5.0, 90.0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_permissive_degrades_to_zero() {
        assert_eq!(cycle_relative_delay_or_zero(100.0, 0.0, 90.0), 0.0);
        assert_eq!(cycle_relative_delay_or_zero(100.0, -5.0, 90.0), 0.0);
    }

    #[test]
    fn test_capacity_ratio_zero_green_is_zero() {
        assert_eq!(capacity_ratio_delay(100.0, 0.0), 0.0);
    }

    #[test]
    fn test_capacity_ratio_overflow_regime() {
        // capacity = 30/3600 * 1800 = 15
        assert!((capacity_ratio_delay(30.0, 30.0) - 100.0).abs() < 1e-9);
        assert!((capacity_ratio_delay(15.0, 30.0) - 10.0).abs() < 1e-9);
        assert!((capacity_ratio_delay(7.5, 30.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_result_never_negative() {
        for volume in [0.0, 10.0, 500.0, 2000.0] {
            for green in [5.0, 30.0, 60.0] {
                assert!(cycle_relative_delay(volume, green, 90.0).unwrap() >= 0.0);
                assert!(capacity_ratio_delay(volume, green) >= 0.0);
            }
        }
    }
}
