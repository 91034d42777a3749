//! dag.rs
//! Wraps the low-level Registry with the contract construction API.

use crate::analysis::topology;
use crate::error::{PricingError, Result};
use crate::store::{Combinator, NodeId, NodeKind, Operand, Registry};
use serde::{Deserialize, Serialize};

/// An immutable-once-built contract expression graph.
///
/// Nodes are only ever appended; existing nodes never change. The same node
/// may be referenced by several composites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractGraph {
    pub(crate) store: Registry,
}

impl ContractGraph {
    pub fn new() -> Self { Self::default() }

    /// Adds a leaf observing the underlying price at `time` (in years from today).
    pub fn anchor(&mut self, time: f64) -> Result<NodeId> {
        if !time.is_finite() || time < 0.0 {
            return Err(PricingError::InvalidArgument(format!(
                "anchor time must be finite and non-negative, got {}",
                time
            )));
        }
        // Normalize -0.0 so bucket keys compare bitwise.
        Ok(self.store.add_node(NodeKind::Anchor { time: time + 0.0 }, &[]))
    }

    /// Adds a composite summing its operands elementwise.
    pub fn sum<I, O>(&mut self, operands: I) -> Result<NodeId>
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        self.add_composite(Combinator::Sum, operands)
    }

    /// Adds a composite taking the elementwise maximum of its operands.
    pub fn max<I, O>(&mut self, operands: I) -> Result<NodeId>
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        self.add_composite(Combinator::Max, operands)
    }

    fn add_composite<I, O>(&mut self, combinator: Combinator, operands: I) -> Result<NodeId>
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        let operands: Vec<Operand> = operands.into_iter().map(Into::into).collect();
        if operands.is_empty() {
            return Err(PricingError::InvalidArgument(format!(
                "{} needs at least one operand",
                combinator.name()
            )));
        }
        for op in &operands {
            match op {
                Operand::Node(id) if !self.store.contains(*id) => {
                    return Err(PricingError::UnknownNode(*id));
                }
                Operand::Constant(c) if !c.is_finite() => {
                    return Err(PricingError::InvalidArgument(format!("constant operand {} is not finite", c)));
                }
                _ => {}
            }
        }
        Ok(self.store.add_node(NodeKind::Composite(combinator), &operands))
    }

    /// The earliest time at which the node's value is knowable.
    pub fn resolution_time(&self, id: NodeId) -> Result<f64> {
        if !self.store.contains(id) {
            return Err(PricingError::UnknownNode(id));
        }
        self.store.resolution(id).ok_or(PricingError::UndefinedTime { node: id })
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        if !self.store.contains(id) {
            return Err(PricingError::UnknownNode(id));
        }
        Ok(self.store.kind(id))
    }

    pub fn operands(&self, id: NodeId) -> Result<&[Operand]> {
        if !self.store.contains(id) {
            return Err(PricingError::UnknownNode(id));
        }
        Ok(self.store.get_operands(id))
    }

    pub fn node_count(&self) -> usize { self.store.count() }

    // --- Serialization ---

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a graph and re-establishes the invariants `add_node` guarantees.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut graph: ContractGraph = serde_json::from_str(json)?;
        topology::check_references(&graph.store)?;
        for kind in &graph.store.kinds {
            if let NodeKind::Anchor { time } = kind {
                if !time.is_finite() || *time < 0.0 {
                    return Err(PricingError::InvalidArgument(format!(
                        "anchor time must be finite and non-negative, got {}",
                        time
                    )));
                }
            }
        }
        let order = topology::dependency_order(&graph.store)?;
        graph.store.rebuild_resolution(&order);
        Ok(graph)
    }
}
