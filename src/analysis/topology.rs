use crate::error::{PricingError, Result};
use crate::store::{NodeId, NodeKind, Operand, Registry};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

/// Checks that every operand range and node reference of `registry` is in bounds
/// and that every composite has at least one operand.
///
/// Registries built through `add_node` always pass; this guards registries
/// that arrive through deserialization.
pub fn check_references(registry: &Registry) -> Result<()> {
    let count = registry.count();
    if registry.operand_ranges.len() != count {
        return Err(PricingError::Malformed {
            msg: format!("{} nodes but {} operand ranges", count, registry.operand_ranges.len()),
        });
    }
    for (i, &(start, len)) in registry.operand_ranges.iter().enumerate() {
        let end = start as usize + len as usize;
        if end > registry.operands_flat.len() {
            return Err(PricingError::Malformed {
                msg: format!("operand range of node {} ends at {} past {}", i, end, registry.operands_flat.len()),
            });
        }
        if len == 0 && matches!(registry.kinds[i], NodeKind::Composite(_)) {
            return Err(PricingError::InvalidArgument(format!("composite node {} has no operands", i)));
        }
        for op in &registry.operands_flat[start as usize..end] {
            if let Operand::Node(child) = op {
                if !registry.contains(*child) {
                    return Err(PricingError::UnknownNode(*child));
                }
            }
        }
    }
    Ok(())
}

/// Returns the nodes ordered so that every operand appears before its consumer.
///
/// Edges point Operand -> Composite. A cycle is reported with one node on it.
pub fn dependency_order(registry: &Registry) -> Result<Vec<NodeId>> {
    let count = registry.count();
    let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(count, registry.operands_flat.len());
    for _ in 0..count {
        graph.add_node(());
    }
    for i in 0..count {
        for op in registry.get_operands(NodeId::new(i)) {
            if let Operand::Node(child) = op {
                graph.add_edge(NodeIndex::new(child.index()), NodeIndex::new(i), ());
            }
        }
    }

    toposort(&graph, None)
        .map(|order| order.into_iter().map(|ix| NodeId::new(ix.index())).collect())
        .map_err(|cycle| PricingError::CycleDetected { node: NodeId::new(cycle.node_id().index()) })
}
