//! Per-intersection working set of volume readings.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Volume readings and metadata collected for one intersection.
///
/// The id is fixed at construction; readings accumulate via
/// [`add_volume`](IntersectionData::add_volume).
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntersectionData {
    intersection_id: String,
    pub metadata: BTreeMap<String, String>,
    volumes: Vec<f64>,
    timestamps: Vec<NaiveDateTime>,
}

impl IntersectionData {
    pub fn new(intersection_id: impl Into<String>) -> Self {
        IntersectionData {
            intersection_id: intersection_id.into(),
            ..Default::default()
        }
    }

    pub fn with_volumes(intersection_id: impl Into<String>, volumes: Vec<f64>) -> Self {
        IntersectionData {
            intersection_id: intersection_id.into(),
            volumes,
            ..Default::default()
        }
    }

    pub fn intersection_id(&self) -> &str {
        &self.intersection_id
    }

    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    pub fn add_volume(&mut self, volume: f64, timestamp: Option<NaiveDateTime>) {
        self.volumes.push(volume);
        if let Some(ts) = timestamp {
            self.timestamps.push(ts);
        }
    }

    pub fn total_volume(&self) -> f64 {
        self.volumes.iter().sum()
    }

    /// Mean of all readings, `0.0` when there are none.
    pub fn average_volume(&self) -> f64 {
        if self.volumes.is_empty() {
            return 0.0;
        }
        self.total_volume() / self.volumes.len() as f64
    }
}

impl fmt::Display for IntersectionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self
            .metadata
            .get("location")
            .map(String::as_str)
            .unwrap_or("Unknown");
        write!(
            f,
            "Intersection {}: Location={}, Avg Volume={:.1}, Total Readings={}",
            self.intersection_id,
            location,
            self.average_volume(),
            self.volumes.len()
        )
    }
}
