//! Signal timing analysis.
//!
//! This module holds the delay estimators, the timing-plan entity with its
//! pairwise merge, and the baseline-vs-alternative plan comparator.

pub mod compare;
pub mod delay;
pub mod plan;
