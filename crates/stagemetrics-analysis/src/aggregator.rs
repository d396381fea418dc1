use std::collections::HashMap;

use stagemetrics_core::{Error, MetricsNode, NodeId, Result, PERCENT_DURATION_KEY};

use crate::config::AggregatorConfig;
use crate::view::FinalizedMetrics;

/// Merges partial measurement trees into one canonical tree and derives
/// percent-of-total durations over it.
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    config: AggregatorConfig,
}

impl MetricsAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Merge sibling nodes by id.
    ///
    /// Returns one node per distinct id, in the order each id was first
    /// seen. Every group is folded into a fresh node named after its first
    /// member, so duplicate ids nested inside a single member collapse too.
    /// No percentages are written; call
    /// [`annotate_percent`](Self::annotate_percent) on each returned root
    /// when several root ids are expected.
    pub fn merge(&self, nodes: Vec<MetricsNode>) -> Vec<MetricsNode> {
        let mut merged: Vec<MetricsNode> = Vec::new();
        let mut slots: HashMap<NodeId, usize> = HashMap::new();

        for node in nodes {
            let slot = *slots.entry(node.id().clone()).or_insert_with(|| {
                merged.push(node.empty_like());
                merged.len() - 1
            });
            tracing::trace!(id = %node.id(), "merging partial node");
            merged[slot].absorb(node, self.config.annotation_conflict);
        }

        for node in &mut merged {
            node.canonicalize(self.config.annotation_conflict);
        }
        merged
    }

    /// Produce the canonical tree for partial measurements of one stage.
    ///
    /// An empty input yields `Ok(None)`. Partials that do not all share one
    /// root id are rejected with [`Error::MixedRoots`].
    pub fn aggregate(&self, partials: Vec<MetricsNode>) -> Result<Option<FinalizedMetrics>> {
        let count = partials.len();
        let mut roots = self.merge(partials);

        if roots.len() > 1 {
            let ids = roots.iter().map(|n| n.id().clone()).collect();
            return Err(Error::MixedRoots(ids));
        }
        let Some(mut root) = roots.pop() else {
            tracing::debug!("no partial measurements to aggregate");
            return Ok(None);
        };

        tracing::debug!(
            id = %root.id(),
            partials = count,
            duration_ns = root.duration_ns(),
            "aggregated metrics tree"
        );

        if self.config.compute_percent {
            self.annotate_percent(&mut root);
        }
        Ok(Some(FinalizedMetrics::new(root)))
    }

    /// Like [`aggregate`](Self::aggregate), but orders partials by contributor
    /// key first, so the result does not depend on worker completion order.
    pub fn aggregate_ordered<K: Ord>(
        &self,
        mut partials: Vec<(K, MetricsNode)>,
    ) -> Result<Option<FinalizedMetrics>> {
        partials.sort_by(|a, b| a.0.cmp(&b.0));
        self.aggregate(partials.into_iter().map(|(_, node)| node).collect())
    }

    /// Write `percentDur` on every node relative to the root's duration.
    ///
    /// Existing values under that key are overwritten. A zero-duration root
    /// reports 0 everywhere.
    pub fn annotate_percent(&self, root: &mut MetricsNode) {
        let total = root.duration_ns();
        if total == 0 {
            tracing::warn!(id = %root.id(), "root has zero duration, reporting 0 percent");
        }
        annotate_node(root, total, self.config.percent_precision);
    }
}

fn annotate_node(node: &mut MetricsNode, total: u64, precision: u8) {
    node.for_each_mut(&mut |n| {
        let value = format_percent(percent_of(n.duration_ns(), total), precision);
        n.annotations_mut().insert(PERCENT_DURATION_KEY.to_string(), value);
    });
}

fn percent_of(duration_ns: u64, total_ns: u64) -> f64 {
    if total_ns == 0 {
        return 0.0;
    }
    duration_ns as f64 * 100.0 / total_ns as f64
}

/// Fixed-precision decimal with trailing zeros (and a bare dot) removed.
pub(crate) fn format_percent(value: f64, precision: u8) -> String {
    let mut s = format!("{:.*}", precision as usize, value);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagemetrics_core::{ConflictPolicy, ELEMENT_COUNT_ID};
    use std::time::Duration;

    fn stage(id: &str, nanos: u64) -> MetricsNode {
        MetricsNode::new(id, id.to_uppercase()).with_duration(Duration::from_nanos(nanos))
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(25.0, 2), "25");
        assert_eq!(format_percent(12.5, 2), "12.5");
        assert_eq!(format_percent(100.0 / 3.0, 2), "33.33");
        assert_eq!(format_percent(66.666, 0), "67");
        assert_eq!(format_percent(0.0, 2), "0");
    }

    #[test]
    fn test_merge_groups_by_id_in_first_seen_order() {
        let aggregator = MetricsAggregator::default();
        let merged = aggregator.merge(vec![stage("b", 1), stage("a", 2), stage("b", 3)]);

        let ids: Vec<_> = merged.iter().map(|n| n.id().as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(merged[0].duration_ns(), 4);
        assert_eq!(merged[1].duration_ns(), 2);
    }

    #[test]
    fn test_merge_takes_name_from_first_member() {
        let aggregator = MetricsAggregator::default();
        let merged = aggregator.merge(vec![
            MetricsNode::new("s", "First"),
            MetricsNode::new("s", "Second"),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name(), "First");
    }

    #[test]
    fn test_merge_permissive_on_different_counter_keys() {
        let aggregator = MetricsAggregator::default();
        let merged = aggregator.merge(vec![
            stage("s", 0).with_count(ELEMENT_COUNT_ID, 2),
            stage("s", 0).with_count("indexHits", 5),
        ]);
        assert_eq!(merged[0].count(ELEMENT_COUNT_ID), Some(2));
        assert_eq!(merged[0].count("indexHits"), Some(5));
    }

    #[test]
    fn test_first_wins_policy_from_config() {
        let aggregator = MetricsAggregator::new(AggregatorConfig {
            annotation_conflict: ConflictPolicy::FirstWins,
            ..AggregatorConfig::default()
        });
        let merged = aggregator.merge(vec![
            stage("s", 0).with_annotation("strategy", "scan"),
            stage("s", 0).with_annotation("strategy", "index"),
        ]);
        assert_eq!(merged[0].annotation("strategy"), Some("scan"));
    }

    #[test]
    fn test_first_wins_same_for_nested_duplicates_and_partials() {
        let policy = ConflictPolicy::FirstWins;
        let aggregator = MetricsAggregator::new(AggregatorConfig {
            annotation_conflict: policy,
            ..AggregatorConfig::default()
        });
        let child = |value: &str| stage("x", 5).with_annotation("index", value);

        let mut single = stage("root", 10);
        single.add_nested(child("first"), policy);
        single.add_nested(child("second"), policy);
        let from_nested = aggregator.aggregate(vec![single]).unwrap().unwrap();

        let from_partials = aggregator
            .aggregate(vec![
                stage("root", 10).with_nested(child("first")),
                stage("root", 0).with_nested(child("second")),
            ])
            .unwrap()
            .unwrap();

        assert_eq!(from_nested, from_partials);
        assert_eq!(
            from_nested.find("x").and_then(|n| n.annotation("index")),
            Some("first")
        );
    }

    #[test]
    fn test_merge_then_annotate_each_root() {
        let aggregator = MetricsAggregator::default();
        let mut roots = aggregator.merge(vec![
            stage("a", 40).with_nested(stage("a.1", 10)),
            stage("b", 8).with_nested(stage("b.1", 4)),
        ]);
        for root in &mut roots {
            aggregator.annotate_percent(root);
        }

        let percent = |root: &MetricsNode, id: &str| {
            root.find_nested(id)
                .and_then(|n| n.annotation(PERCENT_DURATION_KEY))
                .map(str::to_string)
        };
        assert_eq!(percent(&roots[0], "a.1").as_deref(), Some("25"));
        assert_eq!(percent(&roots[1], "b.1").as_deref(), Some("50"));
    }

    #[test]
    fn test_aggregate_empty_is_none() {
        let aggregator = MetricsAggregator::default();
        assert!(aggregator.aggregate(Vec::new()).unwrap().is_none());
    }

    #[test]
    fn test_aggregate_rejects_mixed_roots() {
        let aggregator = MetricsAggregator::default();
        let err = aggregator
            .aggregate(vec![stage("a", 1), stage("b", 1)])
            .unwrap_err();
        match err {
            Error::MixedRoots(ids) => assert_eq!(ids, vec![NodeId::from("a"), NodeId::from("b")]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_annotate_percent_overwrites_existing_value() {
        let aggregator = MetricsAggregator::default();
        let mut root = stage("root", 200)
            .with_nested(stage("child", 50).with_annotation(PERCENT_DURATION_KEY, "stale"));

        aggregator.annotate_percent(&mut root);

        assert_eq!(root.annotation(PERCENT_DURATION_KEY), Some("100"));
        assert_eq!(
            root.find_nested("child").and_then(|n| n.annotation(PERCENT_DURATION_KEY)),
            Some("25")
        );
    }

    #[test]
    fn test_compute_percent_can_be_disabled() {
        let aggregator = MetricsAggregator::new(AggregatorConfig {
            compute_percent: false,
            ..AggregatorConfig::default()
        });
        let finalized = aggregator.aggregate(vec![stage("root", 10)]).unwrap().unwrap();
        assert_eq!(finalized.annotation(PERCENT_DURATION_KEY), None);
    }
}
