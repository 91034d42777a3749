//! Direct interpretation of a schedule, one bucket at a time.

use crate::analysis::schedule::{Bucket, Schedule};
use crate::compute::bytecode::{classify, Slot};
use crate::compute::evolution::{gather, Frame, Machine, Step};
use crate::compute::kernel;
use crate::compute::ledger::Series;
use crate::error::{PricingError, Result};
use crate::graph::ContractGraph;
use crate::store::NodeKind;
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Drain,
    Combine,
}

/// Program counter: (bucket index, phase within the bucket).
pub struct ScheduleInterpreter {
    graph: Arc<ContractGraph>,
    schedule: Arc<Schedule>,
    bucket: usize,
    phase: Phase,
}

impl ScheduleInterpreter {
    pub fn new(graph: Arc<ContractGraph>, schedule: Arc<Schedule>) -> Self {
        Self { graph, schedule, bucket: 0, phase: Phase::Drain }
    }

    fn evaluate(&self, bucket: &Bucket, frame: &Frame) -> Result<Series> {
        let width = frame.prices.len();
        let mut stack: Vec<Series> = Vec::with_capacity(bucket.nodes.len());

        for &node in bucket.nodes.iter().rev() {
            let value = match self.graph.kind(node)? {
                NodeKind::Anchor { .. } => Arc::clone(&frame.prices),
                NodeKind::Composite(op) => {
                    let slots = self
                        .graph
                        .operands(node)?
                        .iter()
                        .map(|operand| classify(&self.graph, operand, bucket.time))
                        .collect::<Result<SmallVec<[Slot; 4]>>>()?;
                    let args = gather(&slots, &mut stack, &frame.values)?;
                    kernel::combine(*op, &args, width)?
                }
            };
            stack.push(value);
        }

        // The last node evaluated carries the bucket's value forward.
        stack.pop().ok_or_else(|| PricingError::Malformed {
            msg: format!("bucket at {} produced no value", bucket.time),
        })
    }
}

impl Machine for ScheduleInterpreter {
    fn run(&mut self, frame: &Frame) -> Result<Step> {
        let schedule = Arc::clone(&self.schedule);
        loop {
            let Some(bucket) = schedule.buckets().get(self.bucket) else {
                return Ok(Step::Finish(Arc::clone(&frame.values)));
            };
            match self.phase {
                Phase::Drain => {
                    if frame.time > bucket.time {
                        return Ok(Step::Suspend(Arc::clone(&frame.values)));
                    }
                    self.phase = Phase::Combine;
                }
                Phase::Combine => {
                    self.phase = Phase::Drain;
                    self.bucket += 1;
                    if !bucket.nodes.is_empty() {
                        return Ok(Step::Suspend(self.evaluate(bucket, frame)?));
                    }
                }
            }
        }
    }
}
