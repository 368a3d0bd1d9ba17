//! Baseline-vs-alternative timing plan comparison.

use serde::Serialize;

use crate::analysis::delay::DelayStrategy;
use crate::analysis::plan::TimingPlan;
use crate::intersection::IntersectionData;

/// Green time assumed when a plan has no approaches at all.
const FALLBACK_GREEN_S: f64 = 30.0;

/// Aggregate comparison of two timing plans over a volume series.
/// Recomputed from scratch on every comparison.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ComparisonMetrics {
    pub baseline_avg_delay: f64,
    pub alternative_avg_delay: f64,
    pub avg_delay_reduction: f64,
    pub throughput_change_pct: f64,
    pub improvement_pct: f64,
}

/// Evaluates a volume series under two plans and derives comparison metrics.
///
/// Holds the per-observation delay series for each side; `compare` reduces
/// them. Until both sides have been computed, `compare` reports the all-zero
/// unevaluated sentinel rather than an error.
#[derive(Debug)]
pub struct PlanComparator {
    strategy: DelayStrategy,
    default_approach: String,
    baseline_delays: Vec<f64>,
    alternative_delays: Vec<f64>,
}

impl PlanComparator {
    pub fn new(strategy: DelayStrategy) -> Self {
        PlanComparator {
            strategy,
            default_approach: "North".to_owned(),
            baseline_delays: Vec::new(),
            alternative_delays: Vec::new(),
        }
    }

    pub fn with_default_approach(mut self, approach: impl Into<String>) -> Self {
        self.default_approach = approach.into();
        self
    }

    /// The green time a plan is evaluated at: the configured default
    /// approach if present, else the plan's first entry, else a fixed
    /// 30-second fallback.
    fn representative_green(&self, plan: &TimingPlan) -> f64 {
        plan.green_times
            .get(&self.default_approach)
            .or_else(|| plan.green_times.values().next())
            .copied()
            .unwrap_or(FALLBACK_GREEN_S)
    }

    /// Computes per-observation delays under the baseline plan, replacing
    /// any previous baseline series.
    pub fn compute_baseline_delays(&mut self, plan: &TimingPlan, volumes: &[f64]) -> &[f64] {
        let green = self.representative_green(plan);
        let strategy = self.strategy;
        self.baseline_delays = volumes.iter().map(|&v| strategy.estimate(v, green)).collect();
        &self.baseline_delays
    }

    /// Computes per-observation delays under the alternative plan, replacing
    /// any previous alternative series.
    pub fn compute_alternative_delays(&mut self, plan: &TimingPlan, volumes: &[f64]) -> &[f64] {
        let green = self.representative_green(plan);
        let strategy = self.strategy;
        self.alternative_delays = volumes.iter().map(|&v| strategy.estimate(v, green)).collect();
        &self.alternative_delays
    }

    /// Reduces both delay series into comparison metrics.
    ///
    /// Every division is guarded: a zero baseline average yields `0.0`
    /// percentages, and an empty series on either side yields the all-zero
    /// sentinel.
    pub fn compare(&self) -> ComparisonMetrics {
        if self.baseline_delays.is_empty() || self.alternative_delays.is_empty() {
            return ComparisonMetrics::default();
        }

        let baseline_avg = mean(&self.baseline_delays);
        let alternative_avg = mean(&self.alternative_delays);
        let avg_delay_reduction = baseline_avg - alternative_avg;

        let (throughput_change_pct, improvement_pct) = if baseline_avg > 0.0 {
            (
                (baseline_avg - alternative_avg) / baseline_avg * 100.0,
                avg_delay_reduction / baseline_avg * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        ComparisonMetrics {
            baseline_avg_delay: baseline_avg,
            alternative_avg_delay: alternative_avg,
            avg_delay_reduction,
            throughput_change_pct,
            improvement_pct,
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// One-shot comparison of two plans over a volume series.
pub fn compare_plans(
    baseline: &TimingPlan,
    alternative: &TimingPlan,
    volumes: &[f64],
    strategy: DelayStrategy,
) -> ComparisonMetrics {
    let mut comparator = PlanComparator::new(strategy);
    comparator.compute_baseline_delays(baseline, volumes);
    comparator.compute_alternative_delays(alternative, volumes);
    comparator.compare()
}

/// One-shot comparison over an intersection's collected readings.
pub fn compare_for_intersection(
    baseline: &TimingPlan,
    alternative: &TimingPlan,
    data: &IntersectionData,
    strategy: DelayStrategy,
) -> ComparisonMetrics {
    compare_plans(baseline, alternative, data.volumes(), strategy)
}
