//! Human-readable listings of schedules and compiled programs.

use crate::analysis::schedule::Schedule;
use crate::compute::bytecode::{OpCode, Program, Slot};
use crate::graph::ContractGraph;
use crate::store::NodeKind;
use std::fmt::Write;

/// One line per instruction: offset, mnemonic and decoded argument.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();
    for pc in 0..program.len() {
        let Some((op, arg)) = program.instruction(pc) else { break };
        let detail = match op {
            OpCode::Drain => format!("while t > {}", program.drain_time(arg)),
            OpCode::Sum | OpCode::Max => program
                .layout(arg)
                .iter()
                .map(|slot| match slot {
                    Slot::Stack => "pop".to_string(),
                    Slot::Constant(c) => format!("const {}", c),
                    Slot::Continuation => "v".to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            OpCode::LoadPrice => "x".to_string(),
            OpCode::Yield | OpCode::Halt => String::new(),
        };
        let _ = writeln!(out, "{:>4} {:<10} {}", pc, op.name(), detail);
    }
    out.lines().map(str::trim_end).collect::<Vec<_>>().join("\n") + "\n"
}

/// One block per bucket, newest first, listing the scheduled occurrences.
pub fn format_schedule(schedule: &Schedule, graph: &ContractGraph) -> String {
    let mut out = String::new();
    for bucket in schedule.buckets() {
        let _ = writeln!(out, "t = {} ({} nodes)", bucket.time, bucket.nodes.len());
        for &node in &bucket.nodes {
            let label = match graph.kind(node) {
                Ok(NodeKind::Anchor { time }) => format!("At({})", time),
                Ok(NodeKind::Composite(op)) => op.name().to_string(),
                Err(e) => format!("<{}>", e),
            };
            let _ = writeln!(out, "    #{} {}", node.index(), label);
        }
    }
    out
}
