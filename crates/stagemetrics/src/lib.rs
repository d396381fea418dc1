//! Stagemetrics: hierarchical execution profiling for pipelines of stages.
//!
//! This is the main entry point for applications. It re-exports the node
//! model from `stagemetrics-core` and the aggregation from
//! `stagemetrics-analysis`.
//!
//! ```
//! use stagemetrics::prelude::*;
//! use std::time::Duration;
//!
//! let worker = |n: u64| {
//!     MetricsNode::new("0.0.0()", "Root")
//!         .with_duration(Duration::from_millis(4))
//!         .with_nested(
//!             MetricsNode::new("1.0.0()", "Filter")
//!                 .with_duration(Duration::from_millis(1))
//!                 .with_count(ELEMENT_COUNT_ID, n),
//!         )
//! };
//!
//! let metrics = MetricsAggregator::default()
//!     .aggregate(vec![worker(3), worker(5)])?
//!     .expect("two partials");
//! let filter = metrics.find("1.0.0()").unwrap();
//! assert_eq!(filter.count(ELEMENT_COUNT_ID), Some(8));
//! assert_eq!(filter.annotation(PERCENT_DURATION_KEY), Some("25"));
//! # Ok::<(), stagemetrics::core::Error>(())
//! ```

pub use stagemetrics_analysis as analysis;
pub use stagemetrics_core as core;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{
        ConflictPolicy, Error, MetricsNode, NodeId, Result, SharedMetrics, TimeUnit,
        ELEMENT_COUNT_ID, PERCENT_DURATION_KEY, TRAVERSER_COUNT_ID,
    };

    pub use crate::analysis::{AggregatorConfig, FinalizedMetrics, MetricsAggregator};
}
