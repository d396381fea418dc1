use serde::Serialize;
use stagemetrics_core::{MetricsNode, NodeId, TimeUnit, PERCENT_DURATION_KEY};

/// Read-only view of an aggregated metrics tree.
///
/// Only shared borrows of the nodes are handed out, so renderers and
/// serializers cannot change the tree. Use [`into_inner`](Self::into_inner)
/// to take ownership back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FinalizedMetrics {
    root: MetricsNode,
}

impl FinalizedMetrics {
    pub(crate) fn new(root: MetricsNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &MetricsNode {
        &self.root
    }

    pub fn id(&self) -> &NodeId {
        self.root.id()
    }

    pub fn name(&self) -> &str {
        self.root.name()
    }

    pub fn duration(&self, unit: TimeUnit) -> u64 {
        self.root.duration(unit)
    }

    pub fn count(&self, key: &str) -> Option<u64> {
        self.root.count(key)
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.root.annotation(key)
    }

    /// The root itself or the first node below it with this id.
    pub fn find(&self, id: &str) -> Option<&MetricsNode> {
        if self.root.id().as_str() == id {
            Some(&self.root)
        } else {
            self.root.find_nested(id)
        }
    }

    /// Parsed `percentDur` annotation of `node`.
    pub fn percent(node: &MetricsNode) -> Option<f64> {
        node.annotation(PERCENT_DURATION_KEY)?.parse().ok()
    }

    /// Pre-order walk over the whole tree yielding `(depth, node)`.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, &self.root)],
        }
    }

    /// Number of nodes in the tree, root included.
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn into_inner(self) -> MetricsNode {
        self.root
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a MetricsNode)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a MetricsNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.nested().iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tree() -> FinalizedMetrics {
        let leaf = |id: &str| MetricsNode::new(id, id).with_duration(Duration::from_millis(1));
        FinalizedMetrics::new(
            MetricsNode::new("root", "Root")
                .with_duration(Duration::from_millis(10))
                .with_nested(leaf("a").with_nested(leaf("a.1")).with_nested(leaf("a.2")))
                .with_nested(leaf("b")),
        )
    }

    #[test]
    fn test_walk_is_preorder_with_depth() {
        let metrics = tree();
        let visited: Vec<_> = metrics
            .walk()
            .map(|(depth, node)| (depth, node.id().as_str()))
            .collect();
        assert_eq!(
            visited,
            [(0, "root"), (1, "a"), (2, "a.1"), (2, "a.2"), (1, "b")]
        );
        assert_eq!(metrics.len(), 5);
    }

    #[test]
    fn test_find_includes_root() {
        let metrics = tree();
        assert_eq!(metrics.find("root").map(|n| n.name()), Some("Root"));
        assert_eq!(metrics.find("a.2").map(|n| n.id().as_str()), Some("a.2"));
        assert!(metrics.find("c").is_none());
        assert_eq!(metrics.duration(TimeUnit::Milliseconds), 10);
    }

    #[test]
    fn test_percent_parses_annotation() {
        let node = MetricsNode::new("a", "A").with_annotation(PERCENT_DURATION_KEY, "12.5");
        assert_eq!(FinalizedMetrics::percent(&node), Some(12.5));
        assert_eq!(FinalizedMetrics::percent(&MetricsNode::new("b", "B")), None);
    }
}
