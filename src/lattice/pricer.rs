//! Backward induction over the binomial lattice.

use crate::compute::evolution::{Evolution, EvolutionProcedure};
use crate::compute::kernel;
use crate::compute::ledger::Series;
use crate::error::{PricingError, Result};
use crate::lattice::params::LatticeParams;
use crate::lattice::tree::BinomialTree;
use log::debug;
use std::sync::Arc;

/// Drives one procedure, enforcing the shape contract on both sides of every suspension.
pub struct Driver<'a> {
    procedure: &'a mut dyn EvolutionProcedure,
}

impl<'a> Driver<'a> {
    pub fn new(procedure: &'a mut dyn EvolutionProcedure) -> Self {
        Self { procedure }
    }

    pub fn prime(&mut self, time: f64, prices: Series, values: Series) -> Result<Series> {
        check_frame(&prices, &values)?;
        let width = prices.len();
        let out = self.procedure.prime(time, prices, values)?;
        check_yield(out, width)
    }

    pub fn resume(&mut self, time: f64, prices: Series, values: Series) -> Result<Series> {
        check_frame(&prices, &values)?;
        let width = prices.len();
        let out = self.procedure.resume(time, prices, values)?;
        check_yield(out, width)
    }
}

fn check_frame(prices: &[f64], values: &[f64]) -> Result<()> {
    if prices.is_empty() || prices.len() != values.len() {
        return Err(PricingError::ShapeMismatch {
            msg: format!("price vector has length {}, value vector has length {}", prices.len(), values.len()),
        });
    }
    Ok(())
}

fn check_yield(out: Series, width: usize) -> Result<Series> {
    if out.len() != width {
        return Err(PricingError::ShapeMismatch {
            msg: format!("procedure yielded {} values for a level of width {}", out.len(), width),
        });
    }
    Ok(out)
}

/// Values the contract compiled into `evolution` on a CRR lattice.
///
/// The procedure is primed at expiry with zero continuation values, then
/// resumed once per level while walking back to time zero. The surviving
/// value at the apex is the present value.
pub fn present_value(evolution: &Evolution, params: &LatticeParams) -> Result<f64> {
    let tree = BinomialTree::new(params)?;
    debug!(
        "Valuing over {} steps: dt={}, u={}, d={}, p={}, z={}",
        tree.steps, tree.dt, tree.up, tree.down, tree.p, tree.discount
    );

    let mut procedure = evolution.procedure();
    let mut driver = Driver::new(procedure.as_mut());

    let mut x: Series = Arc::new(tree.terminal_prices());
    let zeros = Arc::new(vec![0.0; x.len()]);
    let mut v = driver.prime(tree.years_to_expiration, Arc::clone(&x), zeros)?;

    for level in 1..=tree.steps {
        let time = tree.level_time(level);
        let prices: Series = Arc::new(kernel::retreat(&x, tree.retreat));
        let values: Series = Arc::new(kernel::rollback(&v, tree.p, tree.q, tree.discount));
        v = driver.resume(time, Arc::clone(&prices), values)?;
        x = prices;
    }

    let pv = v.first().copied().ok_or_else(|| PricingError::ShapeMismatch {
        msg: "lattice apex holds no value".into(),
    })?;
    debug!("Present value {}", pv);
    Ok(pv)
}
