//! Values combinator contracts on a binomial lattice.
//!
//! A contract is a graph of time-anchored leaves combined by sums and maxima.
//! It is scheduled by resolution time, compiled into a resumable evolution
//! procedure and then driven backwards through a Cox–Ross–Rubinstein lattice:
//!
//! ```
//! use pecunia_core::{compile_evolution, present_value, ContractGraph, LatticeParams, Operand};
//!
//! let mut graph = ContractGraph::new();
//! let spot = graph.anchor(1.0)?;
//! let payoff = graph.sum([Operand::Node(spot), Operand::Constant(-1.0)])?;
//! let call = graph.max([Operand::Node(payoff), Operand::Constant(0.0)])?;
//!
//! let evolution = compile_evolution(&graph, call)?;
//! let pv = present_value(&evolution, &LatticeParams::new(1.0, 1.0, 0.02, 0.3))?;
//! assert!(pv > 0.12 && pv < 0.13);
//! # Ok::<(), pecunia_core::PricingError>(())
//! ```

pub mod analysis;
pub mod compute;
pub mod display;
pub mod error;
pub mod graph;
pub mod lattice;
pub mod store;

pub use analysis::{build_schedule, Schedule};
pub use compute::{compile_evolution, compile_evolution_with, Evolution, EvolutionProcedure, Realization, Series};
pub use error::{PricingError, Result};
pub use graph::ContractGraph;
pub use lattice::{present_value, LatticeParams};
pub use store::{Combinator, NodeId, Operand};
