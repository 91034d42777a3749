use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

/// The elementwise operator applied by a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combinator {
    Sum,
    Max,
}

impl Combinator {
    pub fn name(&self) -> &'static str {
        match self {
            Combinator::Sum => "Sum",
            Combinator::Max => "Max",
        }
    }
}

/// An input of a composite node: either another node or a scalar constant.
///
/// Constants are not nodes. They carry no resolution time and are broadcast
/// to the lattice width when evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Node(NodeId),
    Constant(f64),
}

impl From<NodeId> for Operand {
    fn from(id: NodeId) -> Self { Operand::Node(id) }
}

impl From<f64> for Operand {
    fn from(c: f64) -> Self { Operand::Constant(c) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The underlying price observed at `time`.
    Anchor { time: f64 },
    /// Operands live in the registry's flat operand array.
    Composite(Combinator),
}
