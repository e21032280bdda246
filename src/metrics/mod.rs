//! Metrics for the club ladder
//!
//! Prometheus counters for every pending-match transition. Metrics are
//! observational only and never affect workflow decisions.

pub mod collector;

pub use collector::WorkflowMetrics;
