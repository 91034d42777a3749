//! The binomial lattice pricer.
pub mod params;
pub mod pricer;
pub mod scenarios;
pub mod tree;

pub use params::{LatticeParams, DEFAULT_STEPS};
pub use pricer::{present_value, Driver};
pub use tree::BinomialTree;
