//! Columnar storage for contract nodes.
pub mod registry;
pub mod types;

pub use registry::Registry;
pub use types::{Combinator, NodeId, NodeKind, Operand};
