use crate::compute::bytecode::{OpCode, Program, Slot};
use crate::error::Result;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperandStats {
    /// Operands produced earlier in the same bucket.
    pub stacked: usize,
    /// Broadcast scalar constants.
    pub constants: usize,
    /// Operands read from the continuation `v` (resolved at a later time).
    pub continuations: usize,
}

#[derive(Debug, Clone)]
pub struct TelemetryReport {
    pub total_ops: usize,
    pub op_counts: HashMap<String, usize>,
    pub operands: OperandStats,
    /// Instructions at which a procedure can suspend (drains, yields and the final halt).
    pub suspension_points: usize,
    pub max_stack_depth: usize,
}

impl TelemetryReport {
    pub fn analyze(program: &Program) -> Result<Self> {
        let max_stack_depth = program.verify()?;

        let mut op_counts = HashMap::new();
        let mut operands = OperandStats::default();
        let mut suspension_points = 0;

        for pc in 0..program.len() {
            let Some((op, arg)) = program.instruction(pc) else { break };
            *op_counts.entry(op.name().to_string()).or_insert(0) += 1;

            match op {
                OpCode::Drain | OpCode::Yield | OpCode::Halt => suspension_points += 1,
                OpCode::Sum | OpCode::Max => {
                    for slot in program.layout(arg) {
                        match slot {
                            Slot::Stack => operands.stacked += 1,
                            Slot::Constant(_) => operands.constants += 1,
                            Slot::Continuation => operands.continuations += 1,
                        }
                    }
                }
                OpCode::LoadPrice => {}
            }
        }

        Ok(Self {
            total_ops: program.len(),
            op_counts,
            operands,
            suspension_points,
            max_stack_depth,
        })
    }
}
