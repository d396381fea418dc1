//! Aggregation and derived statistics for stage profiling trees.
//!
//! This crate provides:
//! - Merging of partial measurement trees recorded by parallel or repeated runs
//! - Percent-of-total duration annotations
//! - A read-only view of the finished tree for renderers and serializers

pub mod aggregator;
pub mod config;
pub mod view;

pub use aggregator::MetricsAggregator;
pub use config::AggregatorConfig;
pub use view::{FinalizedMetrics, Walk};
