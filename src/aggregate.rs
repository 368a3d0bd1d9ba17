//! Hourly volume aggregation.
//!
//! Reduces a cleaned count table into a dense 24-bin profile, one bin per
//! hour of day. Hours with no data are explicit zeros, and a fault in one
//! bin degrades only that bin.

use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::ingest::CountTable;

/// Dense per-hour volume profile. Always exactly 24 bins, indexed 0-23.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyVolumes(pub [f64; 24]);

impl HourlyVolumes {
    pub fn get(&self, hour: usize) -> f64 {
        self.0[hour]
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Iterates (hour, volume) pairs in hour order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.0.iter().copied().enumerate()
    }
}

/// Sums counts into hourly bins.
///
/// A structurally empty table cannot be aggregated. A non-finite sum in one
/// bin (counts are `f64`, so NaN can leak through arithmetic) is replaced by
/// `0.0` without disturbing the other 23 bins.
pub fn aggregate_by_hour(table: &CountTable) -> Result<HourlyVolumes> {
    if table.is_empty() {
        return Err(Error::EmptyInput("no rows to aggregate".to_owned()));
    }

    let mut bins = [0.0f64; 24];
    for (hour, bin) in bins.iter_mut().enumerate() {
        let sum: f64 = table
            .records()
            .iter()
            .filter(|r| r.hour() as usize == hour)
            .map(|r| r.count)
            .sum();

        *bin = if sum.is_finite() {
            sum
        } else {
            warn!(hour, "Non-finite hourly sum degraded to 0.0");
            0.0
        };
    }

    Ok(HourlyVolumes(bins))
}

/// Per-hour mean volume, used when deriving green times from demand.
/// Hours with no records are `0.0`.
pub fn mean_by_hour(table: &CountTable) -> Result<HourlyVolumes> {
    if table.is_empty() {
        return Err(Error::EmptyInput("no rows to aggregate".to_owned()));
    }

    let mut bins = [0.0f64; 24];
    for (hour, bin) in bins.iter_mut().enumerate() {
        let counts: Vec<f64> = table
            .records()
            .iter()
            .filter(|r| r.hour() as usize == hour)
            .map(|r| r.count)
            .collect();

        if counts.is_empty() {
            continue;
        }

        let mean = counts.iter().sum::<f64>() / counts.len() as f64;
        *bin = if mean.is_finite() {
            mean
        } else {
            warn!(hour, "Non-finite hourly mean degraded to 0.0");
            0.0
        };
    }

    Ok(HourlyVolumes(bins))
}
