use super::types::*;
use serde::{Serialize, Deserialize};

/// Append-only columnar storage for contract nodes.
///
/// A node's operands may only reference nodes registered before it, so the
/// stored graph is acyclic by construction. Deserialized registries are
/// re-validated by `ContractGraph::from_json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    // Columnar Arrays
    pub(crate) kinds: Vec<NodeKind>,

    // Operand topology (CSR)
    pub(crate) operands_flat: Vec<Operand>,
    pub(crate) operand_ranges: Vec<(u32, u32)>, // (start, count)

    // Cached resolution times, rebuilt on load
    #[serde(skip)]
    pub(crate) resolution: Vec<Option<f64>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.kinds.len() }

    pub fn contains(&self, id: NodeId) -> bool { id.index() < self.kinds.len() }

    pub fn add_node(&mut self, kind: NodeKind, operands: &[Operand]) -> NodeId {
        let id = NodeId(self.kinds.len() as u32);

        // 1. Register Operands
        let start = self.operands_flat.len() as u32;
        let count = operands.len() as u32;
        self.operands_flat.extend_from_slice(operands);
        self.operand_ranges.push((start, count));

        // 2. Cache the resolution time; operands are already registered.
        let time = self.derive_resolution(&kind, operands);
        self.kinds.push(kind);
        self.resolution.push(time);

        id
    }

    #[inline(always)]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.kinds[id.index()]
    }

    #[inline(always)]
    pub fn get_operands(&self, id: NodeId) -> &[Operand] {
        let (start, count) = self.operand_ranges[id.index()];
        &self.operands_flat[start as usize..(start + count) as usize]
    }

    #[inline(always)]
    pub fn resolution(&self, id: NodeId) -> Option<f64> {
        self.resolution.get(id.index()).copied().flatten()
    }

    /// Recomputes the resolution column, visiting nodes in the given dependency order.
    pub(crate) fn rebuild_resolution(&mut self, order: &[NodeId]) {
        self.resolution = vec![None; self.kinds.len()];
        for &id in order {
            let time = self.derive_resolution(&self.kinds[id.index()], self.get_operands(id));
            self.resolution[id.index()] = time;
        }
    }

    fn derive_resolution(&self, kind: &NodeKind, operands: &[Operand]) -> Option<f64> {
        match kind {
            NodeKind::Anchor { time } => Some(*time),
            NodeKind::Composite(_) => operands
                .iter()
                .filter_map(|op| match op {
                    Operand::Node(child) => self.resolution(*child),
                    Operand::Constant(_) => None,
                })
                .reduce(f64::min),
        }
    }
}
