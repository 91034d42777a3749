//! Parallel valuation of independent parameter sets.

use crate::compute::evolution::Evolution;
use crate::error::Result;
use crate::lattice::params::LatticeParams;
use crate::lattice::pricer::present_value;
use log::debug;
use rayon::prelude::*;

/// Values every scenario against the same compiled contract.
///
/// Each scenario drives its own procedure, so no state is shared between
/// them. Results are returned in input order.
pub fn sweep(evolution: &Evolution, scenarios: &[LatticeParams]) -> Vec<Result<f64>> {
    debug!("Sweeping {} scenarios", scenarios.len());
    scenarios.par_iter().map(|params| present_value(evolution, params)).collect()
}

/// Values `base` once per volatility.
pub fn sweep_volatility(evolution: &Evolution, base: &LatticeParams, volatilities: &[f64]) -> Vec<Result<f64>> {
    let scenarios: Vec<LatticeParams> = volatilities.iter().map(|&vol| base.with_volatility(vol)).collect();
    sweep(evolution, &scenarios)
}
