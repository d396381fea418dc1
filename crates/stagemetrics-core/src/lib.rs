//! Core types for stage profiling.
//!
//! This crate defines the metrics record an execution engine fills in while
//! a pipeline of processing stages runs: per-stage durations, named
//! counters, free-form annotations and nested sub-stage measurements.
//! Merging partial trees and deriving percentages lives in
//! `stagemetrics-analysis`.

pub mod error;
pub mod keys;
pub mod node;
pub mod shared;
pub mod unit;

pub use error::{Error, Result};
pub use keys::{ELEMENT_COUNT_ID, PERCENT_DURATION_KEY, TRAVERSER_COUNT_ID};
pub use node::{ConflictPolicy, MetricsNode, NodeId};
pub use shared::SharedMetrics;
pub use unit::TimeUnit;
