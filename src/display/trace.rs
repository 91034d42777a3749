use crate::graph::ContractGraph;
use crate::store::{NodeId, NodeKind, Operand};
use std::collections::HashMap;
use std::fmt::Write;

/// Renders the contract rooted at `target` as an indented tree, annotating
/// every node with its resolution time. Shared nodes are expanded once and
/// referenced afterwards.
pub fn format_contract(graph: &ContractGraph, target: NodeId) -> String {
    let mut tracer = Tracer { graph, visited_at_level: HashMap::new(), output: String::new() };

    if target.index() < graph.node_count() {
        let _ = writeln!(tracer.output, "CONTRACT from node {}:", target.index());
        let _ = writeln!(tracer.output, "--------------------------------------------------");
        tracer.trace_node(target, 1, "");
    } else {
        let _ = writeln!(tracer.output, "Error: Invalid Node ID {:?}", target);
    }
    tracer.output
}

struct Tracer<'a> {
    graph: &'a ContractGraph,
    visited_at_level: HashMap<NodeId, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_node(&mut self, node_id: NodeId, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(&node_id) {
            let _ = writeln!(self.output, "{}-> (Ref to L{} #{})", prefix, first_seen, node_id.index());
            return;
        }
        self.visited_at_level.insert(node_id, level);

        let time = match self.graph.resolution_time(node_id) {
            Ok(t) => format!("t={}", t),
            Err(_) => "t=?".to_string(),
        };
        let header = format!("[L{}] #{} ({})", level, node_id.index(), time);

        match self.graph.kind(node_id) {
            Ok(NodeKind::Anchor { time }) => {
                let _ = writeln!(self.output, "{}{} = At({})", prefix, header, time);
            }
            Ok(NodeKind::Composite(op)) => {
                let operands = self.graph.operands(node_id).unwrap_or(&[]);
                let _ = writeln!(self.output, "{}{} = {}", prefix, header, op.name());
                self.recurse_operands(prefix, operands, level);
            }
            Err(e) => {
                let _ = writeln!(self.output, "{}{} <{}>", prefix, header, e);
            }
        }
    }

    fn recurse_operands(&mut self, prefix: &str, operands: &[Operand], level: usize) {
        let stem = Self::build_child_stem(prefix);
        for (i, operand) in operands.iter().enumerate() {
            let connector = if i == operands.len() - 1 { "`--" } else { "|--" };
            let full_prefix = format!("{}{}", stem, connector);
            match operand {
                Operand::Node(child) => self.trace_node(*child, level + 1, &full_prefix),
                Operand::Constant(c) => {
                    let _ = writeln!(self.output, "{}Const({})", full_prefix, c);
                }
            }
        }
    }

    fn build_child_stem(prefix: &str) -> String {
        prefix.replace("|--", "|  ").replace("`--", "   ")
    }
}
