use thiserror::Error;

use crate::node::NodeId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown time unit: {0}")]
    UnknownTimeUnit(String),

    #[error("Partials do not share one root id: {0:?}")]
    MixedRoots(Vec<NodeId>),

    #[error("Metrics node {0} is still shared by other handles")]
    StillShared(NodeId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
