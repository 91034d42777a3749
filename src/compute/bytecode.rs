use crate::analysis::schedule::Schedule;
use crate::error::{PricingError, Result};
use crate::graph::ContractGraph;
use crate::store::{Combinator, NodeId, NodeKind, Operand};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Suspend yielding `v` while the driver's time is later than `times[arg]`.
    Drain = 0,
    /// Push the current price vector `x`.
    LoadPrice = 1,
    /// Combine the operands described by `layouts[arg]`, push the result.
    Sum = 2,
    Max = 3,
    /// Suspend yielding the last evaluated value; clears the operand stack.
    Yield = 4,
    /// Yield `v` one final time and finish.
    Halt = 5,
}

impl OpCode {
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::Drain => "DRAIN",
            OpCode::LoadPrice => "LOAD_PRICE",
            OpCode::Sum => "SUM",
            OpCode::Max => "MAX",
            OpCode::Yield => "YIELD",
            OpCode::Halt => "HALT",
        }
    }

    fn combinator(op: Combinator) -> Self {
        match op {
            Combinator::Sum => OpCode::Sum,
            Combinator::Max => OpCode::Max,
        }
    }
}

/// Where a combinator finds one of its operands at run time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot {
    /// Evaluated earlier in the same bucket; popped from the operand stack.
    Stack,
    /// Broadcast scalar.
    Constant(f64),
    /// Resolved at a later time, so already folded into the continuation `v`.
    Continuation,
}

/// Decides how an operand of a composite resolving at `bucket_time` is read.
pub(crate) fn classify(graph: &ContractGraph, operand: &Operand, bucket_time: f64) -> Result<Slot> {
    match operand {
        Operand::Constant(c) => Ok(Slot::Constant(*c)),
        Operand::Node(child) => {
            let time = graph.resolution_time(*child)?;
            if time == bucket_time {
                Ok(Slot::Stack)
            } else if time > bucket_time {
                Ok(Slot::Continuation)
            } else {
                Err(PricingError::Malformed {
                    msg: format!("operand {} resolves at {} before its composite at {}", child.index(), time, bucket_time),
                })
            }
        }
    }
}

/// Checks that every operand read from the continuation is the node the
/// previous non-empty bucket carries forward.
///
/// A bucket hands on a single value: its last evaluated occurrence, which is
/// the first in traversal order. Any other late operand would silently read
/// the wrong node, so such contracts are rejected.
pub(crate) fn check_continuations(graph: &ContractGraph, schedule: &Schedule) -> Result<()> {
    let mut carried: Option<NodeId> = None;
    for bucket in schedule.buckets() {
        for &node in &bucket.nodes {
            if !matches!(graph.kind(node)?, NodeKind::Composite(_)) {
                continue;
            }
            for operand in graph.operands(node)? {
                let Operand::Node(child) = operand else { continue };
                if classify(graph, operand, bucket.time)? == Slot::Continuation && carried != Some(*child) {
                    let held = carried.map_or_else(|| "nothing".to_string(), |id| format!("node {}", id.index()));
                    return Err(PricingError::Malformed {
                        msg: format!(
                            "node {} at t={} reads late operand {}, but the continuation carries {}",
                            node.index(),
                            bucket.time,
                            child.index(),
                            held
                        ),
                    });
                }
            }
        }
        if let Some(&last) = bucket.nodes.first() {
            carried = Some(last);
        }
    }
    Ok(())
}

/// Structure-of-Arrays (SoA) layout for the evolution tape.
/// Instruction i is `ops[i]` with argument `args[i]`; arguments index the
/// program-owned `times` and `layouts` tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub(crate) ops: Vec<OpCode>,
    pub(crate) args: Vec<u32>,

    // Tables
    pub(crate) times: Vec<f64>,
    pub(crate) layouts: Vec<(u32, u32)>, // (start, count) into `slots`
    pub(crate) slots: Vec<Slot>,
}

impl Program {
    pub fn len(&self) -> usize { self.ops.len() }
    pub fn is_empty(&self) -> bool { self.ops.is_empty() }

    pub fn ops(&self) -> &[OpCode] { &self.ops }

    pub fn instruction(&self, pc: usize) -> Option<(OpCode, u32)> {
        Some((*self.ops.get(pc)?, *self.args.get(pc)?))
    }

    #[inline(always)]
    pub fn drain_time(&self, arg: u32) -> f64 {
        self.times[arg as usize]
    }

    #[inline(always)]
    pub fn layout(&self, arg: u32) -> &[Slot] {
        let (start, count) = self.layouts[arg as usize];
        &self.slots[start as usize..(start + count) as usize]
    }

    fn emit(&mut self, op: OpCode, arg: u32) {
        self.ops.push(op);
        self.args.push(arg);
    }

    /// Walks the tape once, checking every table reference and the operand
    /// stack discipline. Returns the maximum operand-stack depth.
    ///
    /// The engine indexes the tables directly, so a program must pass this
    /// check before it is run.
    pub fn verify(&self) -> Result<usize> {
        let malformed = |pc: usize, msg: &str| PricingError::Malformed { msg: format!("pc {}: {}", pc, msg) };

        if self.ops.len() != self.args.len() {
            return Err(malformed(0, "ops and args differ in length"));
        }
        for &(start, count) in &self.layouts {
            if start as usize + count as usize > self.slots.len() {
                return Err(malformed(0, "layout range out of bounds"));
            }
        }

        let mut depth = 0usize;
        let mut max_depth = 0usize;
        for (pc, (&op, &arg)) in self.ops.iter().zip(&self.args).enumerate() {
            match op {
                OpCode::Drain => {
                    if arg as usize >= self.times.len() {
                        return Err(malformed(pc, "drain time out of bounds"));
                    }
                    if depth != 0 {
                        return Err(malformed(pc, "drain with a non-empty operand stack"));
                    }
                }
                OpCode::LoadPrice => depth += 1,
                OpCode::Sum | OpCode::Max => {
                    if arg as usize >= self.layouts.len() {
                        return Err(malformed(pc, "layout out of bounds"));
                    }
                    let layout = self.layout(arg);
                    if layout.is_empty() {
                        return Err(malformed(pc, "combinator without operands"));
                    }
                    let pops = layout.iter().filter(|s| matches!(s, Slot::Stack)).count();
                    if pops > depth {
                        return Err(malformed(pc, "operand stack underflow"));
                    }
                    depth = depth - pops + 1;
                }
                OpCode::Yield => {
                    if depth == 0 {
                        return Err(malformed(pc, "yield with an empty operand stack"));
                    }
                    depth = 0;
                }
                OpCode::Halt => {
                    if pc + 1 != self.ops.len() {
                        return Err(malformed(pc, "halt before the end of the program"));
                    }
                    return Ok(max_depth);
                }
            }
            max_depth = max_depth.max(depth);
        }
        Err(malformed(self.ops.len(), "program does not end with halt"))
    }
}

pub struct Compiler<'a> {
    graph: &'a ContractGraph,
}

impl<'a> Compiler<'a> {
    pub fn new(graph: &'a ContractGraph) -> Self {
        Self { graph }
    }

    /// Lowers a schedule into a flat tape.
    ///
    /// Per bucket: one `Drain`, then the bucket's nodes in reverse traversal
    /// order (a post-order, so operands precede their composite), then a
    /// `Yield` if the bucket was non-empty. A single `Halt` closes the tape.
    pub fn compile(&self, schedule: &Schedule) -> Result<Program> {
        check_continuations(self.graph, schedule)?;
        let mut program = Program::default();

        for bucket in schedule.buckets() {
            let time_idx = program.times.len() as u32;
            program.times.push(bucket.time);
            program.emit(OpCode::Drain, time_idx);

            for &node in bucket.nodes.iter().rev() {
                match self.graph.kind(node)? {
                    NodeKind::Anchor { .. } => program.emit(OpCode::LoadPrice, 0),
                    NodeKind::Composite(op) => {
                        let start = program.slots.len() as u32;
                        for operand in self.graph.operands(node)? {
                            program.slots.push(classify(self.graph, operand, bucket.time)?);
                        }
                        let count = program.slots.len() as u32 - start;
                        let layout_idx = program.layouts.len() as u32;
                        program.layouts.push((start, count));
                        program.emit(OpCode::combinator(*op), layout_idx);
                    }
                }
            }

            if !bucket.nodes.is_empty() {
                program.emit(OpCode::Yield, 0);
            }
        }
        program.emit(OpCode::Halt, 0);

        let max_depth = program.verify()?;
        debug!(
            "Compiled {} buckets into {} instructions (max stack depth {})",
            schedule.buckets().len(),
            program.len(),
            max_depth
        );
        Ok(program)
    }
}
