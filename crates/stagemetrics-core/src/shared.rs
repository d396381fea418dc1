//! A metrics node shared between workers behind a per-node lock.
//!
//! Prefer giving each worker its own [`MetricsNode`] and merging afterwards;
//! this handle is for engines that must update one node from several threads.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::node::{ConflictPolicy, MetricsNode, NodeId};

#[derive(Debug, Clone)]
pub struct SharedMetrics {
    inner: Arc<Mutex<MetricsNode>>,
}

impl SharedMetrics {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self::from_node(MetricsNode::new(id, name))
    }

    pub fn from_node(node: MetricsNode) -> Self {
        Self {
            inner: Arc::new(Mutex::new(node)),
        }
    }

    pub fn increment_count(&self, key: impl Into<String>, by: u64) {
        self.inner.lock().increment_count(key, by);
    }

    pub fn add_duration(&self, duration: Duration) {
        self.inner.lock().add_duration(duration);
    }

    pub fn set_annotation(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.inner.lock().set_annotation(key, value)
    }

    pub fn add_nested(&self, child: MetricsNode, policy: ConflictPolicy) {
        self.inner.lock().add_nested(child, policy);
    }

    /// Runs `f` with exclusive access, for updates that must land together.
    pub fn with<R>(&self, f: impl FnOnce(&mut MetricsNode) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    pub fn snapshot(&self) -> MetricsNode {
        self.inner.lock().clone()
    }

    /// Takes the node back once every other handle has been dropped.
    pub fn into_inner(self) -> Result<MetricsNode> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner()),
            Err(inner) => {
                let id = inner.lock().id().clone();
                Err(Error::StillShared(id))
            }
        }
    }
}
