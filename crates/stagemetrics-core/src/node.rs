//! The recursive metrics record for one measured stage.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::keys::{ELEMENT_COUNT_ID, TRAVERSER_COUNT_ID};
use crate::unit::TimeUnit;

/// Identifier of a measured stage, unique among its siblings.
///
/// Two nodes at the same tree position with equal ids are partial
/// measurements of one stage and are merged during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How conflicting annotation values are resolved when nodes are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// The value from the node merged last replaces earlier ones.
    #[default]
    LastWins,
    /// The first value recorded for a key is kept.
    FirstWins,
}

/// Performance statistics for one stage, with nested sub-stage measurements.
///
/// Leaves and composites share this one shape; a leaf simply has no nested
/// nodes. Counters and annotations keep insertion order for deterministic
/// iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsNode {
    id: NodeId,
    name: String,
    #[serde(default)]
    duration_ns: u64,
    #[serde(default)]
    counts: IndexMap<String, u64>,
    #[serde(default)]
    annotations: IndexMap<String, String>,
    #[serde(default)]
    nested: Vec<MetricsNode>,
    #[serde(skip)]
    started: Option<Instant>,
}

impl MetricsNode {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            duration_ns: 0,
            counts: IndexMap::new(),
            annotations: IndexMap::new(),
            nested: Vec::new(),
            started: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.set_duration(duration);
        self
    }

    pub fn with_count(mut self, key: impl Into<String>, value: u64) -> Self {
        self.set_count(key, value);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_annotation(key, value);
        self
    }

    /// Builder form of [`add_nested`](Self::add_nested); a duplicate id is
    /// merged with [`ConflictPolicy::LastWins`].
    pub fn with_nested(mut self, child: MetricsNode) -> Self {
        self.add_nested(child, ConflictPolicy::LastWins);
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored duration in the requested unit. Zero if the node was never timed.
    pub fn duration(&self, unit: TimeUnit) -> u64 {
        unit.convert_from_nanos(self.duration_ns)
    }

    pub fn duration_ns(&self) -> u64 {
        self.duration_ns
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.duration_ns)
    }

    /// Value of a counter, or `None` if it was never recorded.
    ///
    /// A counter explicitly set to zero returns `Some(0)`.
    pub fn count(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }

    /// Copy of all counters. Changes to the returned map do not reach the node.
    pub fn counts(&self) -> IndexMap<String, u64> {
        self.counts.clone()
    }

    /// Nested nodes in first-insertion order.
    pub fn nested(&self) -> &[MetricsNode] {
        &self.nested
    }

    /// Finds a node by id anywhere below this one.
    ///
    /// The search is pre-order over the whole subtree and returns the first
    /// match; `self` is not a candidate.
    pub fn find_nested(&self, id: &str) -> Option<&MetricsNode> {
        for child in &self.nested {
            if child.id.as_str() == id {
                return Some(child);
            }
            if let Some(found) = child.find_nested(id) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_nested_mut(&mut self, id: &str) -> Option<&mut MetricsNode> {
        for child in &mut self.nested {
            if child.id.as_str() == id {
                return Some(child);
            }
            if let Some(found) = child.find_nested_mut(id) {
                return Some(found);
            }
        }
        None
    }

    /// Visits this node and every node below it, pre-order.
    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut MetricsNode)) {
        f(self);
        for child in &mut self.nested {
            child.for_each_mut(f);
        }
    }

    pub fn annotations(&self) -> &IndexMap<String, String> {
        &self.annotations
    }

    /// Live handle on the annotations. Writes through it persist in the node.
    pub fn annotations_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.annotations
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Arms the timer. Restarting a running node discards the unfinished interval.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Adds the time since [`start`](Self::start) to the duration and disarms the timer.
    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.add_duration(started.elapsed());
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Stops the timer and records one traverser carrying `bulk` elements.
    pub fn finish(&mut self, bulk: u64) {
        self.stop();
        self.increment_count(TRAVERSER_COUNT_ID, 1);
        self.increment_count(ELEMENT_COUNT_ID, bulk);
    }

    pub fn add_duration(&mut self, duration: Duration) {
        self.duration_ns = self.duration_ns.saturating_add(saturating_nanos(duration));
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_ns = saturating_nanos(duration);
    }

    pub fn increment_count(&mut self, key: impl Into<String>, by: u64) {
        let slot = self.counts.entry(key.into()).or_insert(0);
        *slot = slot.saturating_add(by);
    }

    pub fn set_count(&mut self, key: impl Into<String>, value: u64) {
        self.counts.insert(key.into(), value);
    }

    /// Sets an annotation, returning the value it replaced.
    pub fn set_annotation(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.annotations.insert(key.into(), value.into())
    }

    /// Attaches a sub-stage measurement.
    ///
    /// A child whose id is already present among the direct children is
    /// merged into the existing one under `policy` rather than appended.
    /// Pass the policy the tree will later be aggregated with.
    pub fn add_nested(&mut self, child: MetricsNode, policy: ConflictPolicy) {
        match self.nested.iter_mut().find(|n| n.id == child.id) {
            Some(existing) => {
                tracing::trace!(parent = %self.id, child = %child.id, "merging duplicate nested node");
                existing.absorb(child, policy);
            }
            None => self.nested.push(child),
        }
    }

    /// Merges another measurement of the same stage into this one.
    ///
    /// Durations and counters are summed (a missing counter counts as zero),
    /// annotations are united under `policy`, and nested nodes are merged by
    /// id, keeping first-seen order. The name of `self` is kept.
    pub fn absorb(&mut self, other: MetricsNode, policy: ConflictPolicy) {
        let MetricsNode {
            duration_ns,
            counts,
            annotations,
            nested,
            ..
        } = other;

        self.duration_ns = self.duration_ns.saturating_add(duration_ns);

        for (key, value) in counts {
            self.increment_count(key, value);
        }

        for (key, value) in annotations {
            match policy {
                ConflictPolicy::LastWins => {
                    self.annotations.insert(key, value);
                }
                ConflictPolicy::FirstWins => {
                    self.annotations.entry(key).or_insert(value);
                }
            }
        }

        for child in nested {
            match self.nested.iter().position(|n| n.id == child.id) {
                Some(pos) => self.nested[pos].absorb(child, policy),
                None => self.nested.push(child),
            }
        }
    }

    /// Collapses nested nodes that share an id, at every level.
    ///
    /// Trees built through [`add_nested`](Self::add_nested) are already
    /// canonical; deserialized trees may not be.
    pub fn canonicalize(&mut self, policy: ConflictPolicy) {
        let nested = std::mem::take(&mut self.nested);
        for child in nested {
            match self.nested.iter().position(|n| n.id == child.id) {
                Some(pos) => self.nested[pos].absorb(child, policy),
                None => self.nested.push(child),
            }
        }
        for child in &mut self.nested {
            child.canonicalize(policy);
        }
    }

    /// Empty node carrying this node's identity, used as a merge accumulator.
    pub fn empty_like(&self) -> Self {
        Self::new(self.id.clone(), self.name.clone())
    }
}

impl PartialEq for MetricsNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.duration_ns == other.duration_ns
            && self.counts == other.counts
            && self.annotations == other.annotations
            && self.nested == other.nested
    }
}

impl Eq for MetricsNode {}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
