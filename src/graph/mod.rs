//! Defines the contract graph built by callers.
pub mod dag;

// Re-export key types for convenient access
pub use dag::ContractGraph;
pub use crate::store::{Combinator, NodeId, NodeKind, Operand};
