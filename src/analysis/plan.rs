//! Signal timing plans and the pairwise merge that blends two of them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::mean_by_hour;
use crate::error::{Error, Result};
use crate::ingest::CountTable;

/// Green-time bounds (seconds) when deriving a plan from observed demand.
const MIN_GREEN_S: f64 = 20.0;
const MAX_GREEN_S: f64 = 60.0;
/// Clearance interval added on top of the greens when generating a plan.
const CLEARANCE_S: f64 = 10.0;
/// Fallback approach name when the source data carries none.
const DEFAULT_APPROACH: &str = "North";

/// Per-approach green-time allocation plus a cycle length.
///
/// `cycle_length` is informational: only plans built by [`generate_plan`]
/// guarantee cycle = total green + clearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingPlan {
    pub green_times: BTreeMap<String, f64>,
    pub cycle_length: f64,
    pub phase_durations: Vec<f64>,
}

impl TimingPlan {
    pub fn new(green_times: BTreeMap<String, f64>, cycle_length: f64) -> Self {
        TimingPlan {
            green_times,
            cycle_length,
            phase_durations: Vec::new(),
        }
    }

    pub fn add_phase_duration(&mut self, duration: f64) {
        self.phase_durations.push(duration);
    }

    /// Sum of all per-approach green times.
    pub fn total_green_time(&self) -> f64 {
        self.green_times.values().sum()
    }

    pub fn approach_count(&self) -> usize {
        self.green_times.len()
    }

    /// Blends two plans into a new one.
    ///
    /// Approaches present in both plans get the mean of the two greens; an
    /// approach present in only one plan keeps that plan's raw value (it is
    /// not averaged against an implicit zero). The cycle length is always
    /// the mean of the two. Neither input is mutated, and the result starts
    /// with no phase durations.
    ///
    /// Chained merges are pairwise left-folds: `a.merge(&b).merge(&c)` is
    /// not a simultaneous three-way average.
    pub fn merge(&self, other: &TimingPlan) -> TimingPlan {
        let mut combined = BTreeMap::new();

        for approach in self.green_times.keys().chain(other.green_times.keys()) {
            if combined.contains_key(approach) {
                continue;
            }
            let mine = self.green_times.get(approach).copied().unwrap_or(0.0);
            let theirs = other.green_times.get(approach).copied().unwrap_or(0.0);

            let green = if self.green_times.contains_key(approach)
                && other.green_times.contains_key(approach)
            {
                (mine + theirs) / 2.0
            } else if mine > 0.0 {
                mine
            } else {
                theirs
            };
            combined.insert(approach.clone(), green);
        }

        TimingPlan::new(combined, (self.cycle_length + other.cycle_length) / 2.0)
    }

    /// Merge against a tagged operand that may or may not be a plan.
    /// Anything other than a plan is a type mismatch.
    pub fn try_merge(&self, other: &PlanOperand) -> Result<TimingPlan> {
        match other {
            PlanOperand::Plan(plan) => Ok(self.merge(plan)),
            PlanOperand::Value(value) => Err(Error::TypeMismatch {
                found: json_type_name(value).to_owned(),
            }),
        }
    }
}

impl fmt::Display for TimingPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TimingPlan(cycle={:.1}s, approaches={})",
            self.cycle_length,
            self.approach_count()
        )
    }
}

/// Tagged merge operand: either a real plan or an arbitrary value that a
/// caller tried to combine with one.
#[derive(Debug, Clone)]
pub enum PlanOperand {
    Plan(TimingPlan),
    Value(serde_json::Value),
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Derives a timing plan from observed hourly demand.
///
/// Hourly mean volumes are mapped to green times (`volume * 0.1`, clamped to
/// [20, 60] seconds), one green per approach found in the data; sources with
/// no `approach` column get a single default approach. Alternative plans
/// scale every green by 1.2. The cycle length is the green total plus a
/// fixed clearance interval.
pub fn generate_plan(table: &CountTable, alternative: bool) -> Result<TimingPlan> {
    let hourly_means = mean_by_hour(table)?;

    let greens_by_hour: Vec<f64> = hourly_means
        .iter()
        .map(|(_, volume)| (volume * 0.1).clamp(MIN_GREEN_S, MAX_GREEN_S))
        .collect();

    let mut approaches: Vec<String> = Vec::new();
    for record in table.records() {
        if let Some(approach) = &record.approach {
            if !approaches.contains(approach) {
                approaches.push(approach.clone());
            }
        }
    }
    if approaches.is_empty() {
        approaches.push(DEFAULT_APPROACH.to_owned());
    }

    let scale = if alternative { 1.2 } else { 1.0 };
    let mut green_times = BTreeMap::new();
    for (idx, approach) in approaches.into_iter().enumerate() {
        let base = greens_by_hour[idx % greens_by_hour.len()];
        green_times.insert(approach, base * scale);
    }

    let cycle_length = green_times.values().sum::<f64>() + CLEARANCE_S;
    Ok(TimingPlan::new(green_times, cycle_length))
}
