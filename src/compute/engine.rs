use crate::compute::bytecode::{OpCode, Program};
use crate::compute::evolution::{gather, Frame, Machine, Step};
use crate::compute::kernel;
use crate::compute::ledger::Series;
use crate::error::{PricingError, Result};
use crate::store::Combinator;
use std::sync::Arc;

/// Executes a verified evolution tape.
///
/// The program counter only moves forward; `Drain` leaves it in place when it
/// suspends so the condition is re-checked against the next frame.
pub struct Engine {
    program: Arc<Program>,
    pc: usize,
    stack: Vec<Series>,
}

impl Engine {
    /// `program` must have passed `Program::verify`, which the compiler guarantees.
    pub fn new(program: Arc<Program>) -> Self {
        Self { program, pc: 0, stack: Vec::new() }
    }
}

impl Machine for Engine {
    fn run(&mut self, frame: &Frame) -> Result<Step> {
        let program = Arc::clone(&self.program);
        let width = frame.prices.len();

        loop {
            let (op, arg) = program.instruction(self.pc).ok_or_else(|| PricingError::Malformed {
                msg: format!("program counter {} ran past the end", self.pc),
            })?;

            match op {
                OpCode::Drain => {
                    if frame.time > program.drain_time(arg) {
                        return Ok(Step::Suspend(Arc::clone(&frame.values)));
                    }
                }
                OpCode::LoadPrice => self.stack.push(Arc::clone(&frame.prices)),
                OpCode::Sum | OpCode::Max => {
                    let combinator = if op == OpCode::Sum { Combinator::Sum } else { Combinator::Max };
                    let args = gather(program.layout(arg), &mut self.stack, &frame.values)?;
                    let result = kernel::combine(combinator, &args, width)?;
                    self.stack.push(result);
                }
                OpCode::Yield => {
                    let out = self.stack.pop().ok_or_else(|| PricingError::Malformed {
                        msg: format!("yield at pc {} with an empty stack", self.pc),
                    })?;
                    self.stack.clear();
                    self.pc += 1;
                    return Ok(Step::Suspend(out));
                }
                OpCode::Halt => return Ok(Step::Finish(Arc::clone(&frame.values))),
            }
            self.pc += 1;
        }
    }
}
