//! The compiled evolution and the resumable procedures it hands out.

use crate::analysis::schedule::{build_schedule, Schedule};
use crate::compute::bytecode::{check_continuations, Compiler, Program, Slot};
use crate::compute::engine::Engine;
use crate::compute::interpreter::ScheduleInterpreter;
use crate::compute::ledger::{Series, Value};
use crate::error::{PricingError, Result};
use crate::graph::ContractGraph;
use crate::store::NodeId;
use log::trace;
use smallvec::SmallVec;
use std::sync::Arc;

/// A resumable, single-use procedure driven by a backward-induction loop.
///
/// `prime` supplies the first `(time, prices, values)` triple and returns the
/// first yielded vector; each `resume` supplies the next triple and returns
/// the next yielded vector. After the terminal yield `is_done` is true and
/// any further `resume` fails with `ProcedureExhausted`.
pub trait EvolutionProcedure {
    fn prime(&mut self, time: f64, prices: Series, values: Series) -> Result<Series>;
    fn resume(&mut self, time: f64, prices: Series, values: Series) -> Result<Series>;
    fn is_done(&self) -> bool;
}

/// Which compiled form backs the procedures of an `Evolution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Realization {
    /// Walk the schedule directly, inspecting contract nodes as they are reached.
    Interpreted,
    /// Execute a flat instruction tape lowered from the schedule.
    #[default]
    Precompiled,
}

#[derive(Debug, Clone)]
enum Plan {
    Interpreted { graph: Arc<ContractGraph>, schedule: Arc<Schedule> },
    Precompiled(Arc<Program>),
}

/// The compiled artifact. Immutable and cheap to clone; every valuation
/// obtains its own procedure through [`Evolution::procedure`].
#[derive(Debug, Clone)]
pub struct Evolution {
    plan: Plan,
}

impl Evolution {
    pub fn compile(graph: &ContractGraph, schedule: Schedule, realization: Realization) -> Result<Self> {
        let plan = match realization {
            Realization::Interpreted => {
                check_continuations(graph, &schedule)?;
                Plan::Interpreted { graph: Arc::new(graph.clone()), schedule: Arc::new(schedule) }
            }
            Realization::Precompiled => Plan::Precompiled(Arc::new(Compiler::new(graph).compile(&schedule)?)),
        };
        Ok(Self { plan })
    }

    pub fn realization(&self) -> Realization {
        match self.plan {
            Plan::Interpreted { .. } => Realization::Interpreted,
            Plan::Precompiled(_) => Realization::Precompiled,
        }
    }

    /// The instruction tape, for the precompiled realization.
    pub fn program(&self) -> Option<&Program> {
        match &self.plan {
            Plan::Precompiled(program) => Some(program),
            Plan::Interpreted { .. } => None,
        }
    }

    /// The schedule being walked, for the interpreted realization.
    pub fn schedule(&self) -> Option<&Schedule> {
        match &self.plan {
            Plan::Interpreted { schedule, .. } => Some(schedule),
            Plan::Precompiled(_) => None,
        }
    }

    /// A fresh procedure, positioned before its first suspension point.
    pub fn procedure(&self) -> Box<dyn EvolutionProcedure + Send> {
        match &self.plan {
            Plan::Interpreted { graph, schedule } => Box::new(Coroutine::new(ScheduleInterpreter::new(
                Arc::clone(graph),
                Arc::clone(schedule),
            ))),
            Plan::Precompiled(program) => Box::new(Coroutine::new(Engine::new(Arc::clone(program)))),
        }
    }
}

/// Builds the schedule of `root` and compiles it with the default realization.
pub fn compile_evolution(graph: &ContractGraph, root: NodeId) -> Result<Evolution> {
    compile_evolution_with(graph, root, Realization::default())
}

pub fn compile_evolution_with(graph: &ContractGraph, root: NodeId, realization: Realization) -> Result<Evolution> {
    let schedule = build_schedule(graph, root)?;
    Evolution::compile(graph, schedule, realization)
}

// --- Shared procedure plumbing ---

/// The driver-supplied state `(t, x, v)`.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub time: f64,
    pub prices: Series,
    pub values: Series,
}

pub(crate) enum Step {
    Suspend(Series),
    Finish(Series),
}

/// A state machine that runs from its current position to the next suspension point.
pub(crate) trait Machine {
    fn run(&mut self, frame: &Frame) -> Result<Step>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Fresh,
    Suspended,
    Done,
}

/// Enforces the prime/resume protocol around a `Machine`.
pub(crate) struct Coroutine<M> {
    machine: M,
    status: Status,
}

impl<M: Machine> Coroutine<M> {
    pub fn new(machine: M) -> Self {
        Self { machine, status: Status::Fresh }
    }

    fn advance(&mut self, frame: Frame) -> Result<Series> {
        match self.machine.run(&frame) {
            Ok(Step::Suspend(out)) => {
                trace!("Suspended at t={} yielding {} values", frame.time, out.len());
                self.status = Status::Suspended;
                Ok(out)
            }
            Ok(Step::Finish(out)) => {
                trace!("Finished at t={} yielding {} values", frame.time, out.len());
                self.status = Status::Done;
                Ok(out)
            }
            // A failed step leaves the machine mid-bucket; it cannot be resumed.
            Err(e) => {
                self.status = Status::Done;
                Err(e)
            }
        }
    }
}

impl<M: Machine> EvolutionProcedure for Coroutine<M> {
    fn prime(&mut self, time: f64, prices: Series, values: Series) -> Result<Series> {
        if self.status != Status::Fresh {
            return Err(PricingError::AlreadyPrimed);
        }
        self.advance(Frame { time, prices, values })
    }

    fn resume(&mut self, time: f64, prices: Series, values: Series) -> Result<Series> {
        match self.status {
            Status::Fresh => Err(PricingError::NotPrimed),
            Status::Done => Err(PricingError::ProcedureExhausted),
            Status::Suspended => self.advance(Frame { time, prices, values }),
        }
    }

    fn is_done(&self) -> bool {
        self.status == Status::Done
    }
}

/// Resolves a combinator's slots to values, popping same-bucket operands off `stack`.
pub(crate) fn gather(slots: &[Slot], stack: &mut Vec<Series>, continuation: &Series) -> Result<SmallVec<[Value; 4]>> {
    let pops = slots.iter().filter(|s| matches!(s, Slot::Stack)).count();
    if pops > stack.len() {
        return Err(PricingError::Malformed {
            msg: format!("combinator needs {} stacked operands, {} available", pops, stack.len()),
        });
    }
    let mut popped = stack.split_off(stack.len() - pops).into_iter();

    let mut values = SmallVec::with_capacity(slots.len());
    for slot in slots {
        let value = match slot {
            Slot::Stack => popped.next().map(Value::Series).ok_or_else(|| PricingError::Malformed {
                msg: "operand stack exhausted".into(),
            })?,
            Slot::Constant(c) => Value::Scalar(*c),
            Slot::Continuation => Value::Series(Arc::clone(continuation)),
        };
        values.push(value);
    }
    Ok(values)
}
