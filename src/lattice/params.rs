//! Valuation parameters for the binomial lattice.

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_STEPS: usize = 1_000;

fn default_steps() -> usize { DEFAULT_STEPS }

/// Market and discretization inputs of one valuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticeParams {
    pub years_to_expiration: f64,
    pub spot: f64,
    /// Continuously compounded risk-free rate.
    pub rate_of_return: f64,
    /// Annualized volatility of the underlying.
    pub volatility: f64,
    /// Lattice levels; accuracy improves roughly as `1/steps`.
    #[serde(default = "default_steps")]
    pub steps: usize,
}

impl LatticeParams {
    pub fn new(years_to_expiration: f64, spot: f64, rate_of_return: f64, volatility: f64) -> Self {
        Self { years_to_expiration, spot, rate_of_return, volatility, steps: DEFAULT_STEPS }
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(PricingError::InvalidArgument(msg));

        if !(self.years_to_expiration.is_finite() && self.years_to_expiration > 0.0) {
            return fail(format!("years_to_expiration must be > 0, got {}", self.years_to_expiration));
        }
        if !(self.spot.is_finite() && self.spot > 0.0) {
            return fail(format!("spot must be > 0, got {}", self.spot));
        }
        if !self.rate_of_return.is_finite() {
            return fail(format!("rate_of_return must be finite, got {}", self.rate_of_return));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return fail(format!("volatility must be >= 0, got {}", self.volatility));
        }
        if self.steps == 0 {
            return fail("steps must be a positive integer".to_string());
        }
        Ok(())
    }
}
