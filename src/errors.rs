use crate::types::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("stage node {0} does not exist")]
    NodeMissing(NodeId),
    #[error("timeline '{0}' is already registered")]
    DuplicateTimeline(String),
    #[error("manifest parse error: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
