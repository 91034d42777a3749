//! Compiles schedules into resumable evolution procedures.
pub mod bytecode;
pub mod engine;
pub mod evolution;
pub mod interpreter;
pub mod kernel;
pub mod ledger;

pub use bytecode::{Compiler, OpCode, Program, Slot};
pub use evolution::{compile_evolution, compile_evolution_with, Evolution, EvolutionProcedure, Realization};
pub use ledger::{Series, Value};
