//! Groups the node occurrences of a contract into resolution-time buckets.

use crate::error::Result;
use crate::graph::ContractGraph;
use crate::store::{NodeId, NodeKind, Operand};
use log::debug;

/// The node occurrences that become computable at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub time: f64,
    /// Occurrences in traversal order. Evaluating them in reverse visits
    /// operands before their composite.
    pub nodes: Vec<NodeId>,
}

/// Buckets in strictly descending time order; the last one is always time `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    buckets: Vec<Bucket>,
}

impl Schedule {
    pub fn buckets(&self) -> &[Bucket] { &self.buckets }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.buckets.iter().map(|b| b.time)
    }

    pub fn get(&self, time: f64) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.time == time)
    }

    /// Total number of scheduled occurrences across all buckets.
    pub fn occurrences(&self) -> usize {
        self.buckets.iter().map(|b| b.nodes.len()).sum()
    }
}

/// Builds the schedule of everything reachable from `root`.
///
/// A node reachable along several paths is scheduled once per incoming
/// reference, so shared subexpressions are recomputed per occurrence.
/// Fails with `UndefinedTime` if any visited node has no resolution time.
pub fn build_schedule(graph: &ContractGraph, root: NodeId) -> Result<Schedule> {
    let mut buckets: Vec<Bucket> = vec![Bucket { time: 0.0, nodes: Vec::new() }];
    let mut work = vec![root];

    while let Some(node) = work.pop() {
        let time = graph.resolution_time(node)?;
        match buckets.iter_mut().find(|b| b.time == time) {
            Some(bucket) => bucket.nodes.push(node),
            None => buckets.push(Bucket { time, nodes: vec![node] }),
        }

        if let NodeKind::Composite(_) = graph.kind(node)? {
            work.extend(graph.operands(node)?.iter().filter_map(|op| match op {
                Operand::Node(child) => Some(*child),
                Operand::Constant(_) => None,
            }));
        }
    }

    // Backward induction order: later buckets fold into `v` before earlier ones read it.
    buckets.sort_by(|a, b| b.time.total_cmp(&a.time));

    let schedule = Schedule { buckets };
    debug!(
        "Scheduled {} occurrences from node {} into {} buckets",
        schedule.occurrences(),
        root.index(),
        schedule.buckets.len()
    );
    Ok(schedule)
}
