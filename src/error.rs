//! error.rs
//! The single error type shared by the contract model, the compiler and the pricer.

use crate::store::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    /// A composite has no time-anchored descendant, so its resolution time is undefined.
    #[error("Undefined resolution time at node {}: no anchored descendant", node.index())]
    UndefinedTime { node: NodeId },
    #[error("Shape mismatch: {msg}")]
    ShapeMismatch { msg: String },
    #[error("Evolution procedure resumed after its terminal yield")]
    ProcedureExhausted,
    #[error("Evolution procedure resumed before it was primed")]
    NotPrimed,
    #[error("Evolution procedure was already primed")]
    AlreadyPrimed,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unknown node {}", .0.index())]
    UnknownNode(NodeId),
    #[error("Cycle detected involving node {}", node.index())]
    CycleDetected { node: NodeId },
    #[error("Malformed program: {msg}")]
    Malformed { msg: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for PricingError {
    fn from(e: serde_json::Error) -> Self {
        PricingError::Serialization(e.to_string())
    }
}

pub type Result<T, E = PricingError> = std::result::Result<T, E>;
