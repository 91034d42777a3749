//! Cox–Ross–Rubinstein lattice constants.

use crate::error::Result;
use crate::lattice::params::LatticeParams;
use log::debug;

/// Per-step factors of a recombining binomial lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinomialTree {
    pub years_to_expiration: f64,
    pub spot: f64,
    pub steps: usize,
    pub dt: f64,
    /// One-step discount factor `z = exp(-r dt)`.
    pub discount: f64,
    pub up: f64,
    pub down: f64,
    /// Risk-neutral probability of an up move.
    pub p: f64,
    pub q: f64,
    /// Factor mapping a level's prices (minus the top node) onto the previous level.
    pub retreat: f64,
}

impl BinomialTree {
    pub fn new(params: &LatticeParams) -> Result<Self> {
        params.validate()?;

        let steps = params.steps;
        let dt = params.years_to_expiration / steps as f64;
        let discount = (-params.rate_of_return * dt).exp();

        let up = (params.volatility * dt.sqrt()).exp();
        let down = 1.0 / up;

        // A volatility too small to move `up` off `down` collapses the lattice
        // onto the forward path: p would be undefined, so every node grows
        // deterministically at the rate.
        if up == down {
            let growth = (params.rate_of_return * dt).exp();
            return Ok(Self {
                years_to_expiration: params.years_to_expiration,
                spot: params.spot,
                steps,
                dt,
                discount,
                up: growth,
                down: growth,
                p: 1.0,
                q: 0.0,
                retreat: discount,
            });
        }

        let p = (1.0 / discount - down) / (up - down);
        if !(0.0..=1.0).contains(&p) {
            // Still risk-neutral in expectation; only the branch weights leave [0, 1].
            debug!("Risk-neutral probability {} outside [0, 1]; dt={} is coarse for this volatility", p, dt);
        }

        Ok(Self {
            years_to_expiration: params.years_to_expiration,
            spot: params.spot,
            steps,
            dt,
            discount,
            up,
            down,
            p,
            q: 1.0 - p,
            retreat: up,
        })
    }

    /// Prices at expiry, ascending: `spot·d^steps, …, spot·u^steps`.
    pub fn terminal_prices(&self) -> Vec<f64> {
        let n = self.steps;
        if self.up == self.down {
            return vec![self.spot * self.up.powf(n as f64); n + 1];
        }
        let log_up = self.up.ln();
        (0..=n)
            .map(|j| self.spot * (log_up * (2.0 * j as f64 - n as f64)).exp())
            .collect()
    }

    /// Time of lattice level `level`, counted back from expiry (`0` is expiry).
    /// The last level is exactly `0.0`.
    pub fn level_time(&self, level: usize) -> f64 {
        self.years_to_expiration * ((self.steps - level) as f64 / self.steps as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool { (a - b).abs() <= 1e-12 * b.abs().max(1.0) }

    #[test]
    fn test_crr_factors() {
        let tree = BinomialTree::new(&LatticeParams::new(1.0, 1.0, 0.02, 0.3).with_steps(4)).unwrap();
        assert_eq!(tree.dt, 0.25);
        assert!(close(tree.up * tree.down, 1.0));
        assert!(close(tree.p + tree.q, 1.0));
        // Risk-neutral: the expected one-step growth equals the rate.
        assert!(close(tree.p * tree.up + tree.q * tree.down, 1.0 / tree.discount));
        assert_eq!(tree.retreat, tree.up);
    }

    #[test]
    fn test_terminal_prices_are_geometric() {
        let tree = BinomialTree::new(&LatticeParams::new(1.0, 2.0, 0.02, 0.3).with_steps(3)).unwrap();
        let x = tree.terminal_prices();
        assert_eq!(x.len(), 4);
        assert!(close(x[0], 2.0 * tree.down.powi(3)));
        assert!(close(x[3], 2.0 * tree.up.powi(3)));
        for w in x.windows(2) {
            assert!(close(w[1] / w[0], tree.up * tree.up));
        }
    }

    #[test]
    fn test_level_times_end_at_zero() {
        let tree = BinomialTree::new(&LatticeParams::new(0.3, 1.0, 0.02, 0.3).with_steps(7)).unwrap();
        assert_eq!(tree.level_time(0), 0.3);
        assert_eq!(tree.level_time(7), 0.0);
    }

    #[test]
    fn test_zero_volatility_follows_forward() {
        let tree = BinomialTree::new(&LatticeParams::new(1.0, 1.0, 0.05, 0.0).with_steps(10)).unwrap();
        assert_eq!((tree.p, tree.q), (1.0, 0.0));
        let x = tree.terminal_prices();
        assert!(x.iter().all(|&xi| close(xi, 0.05f64.exp())));
    }

    #[test]
    fn test_coarse_lattice_keeps_risk_neutral_drift() {
        // One step, a high rate and a tiny volatility push p above one.
        let tree = BinomialTree::new(&LatticeParams::new(1.0, 1.0, 0.5, 0.01).with_steps(1)).unwrap();
        assert!(tree.p > 1.0 && tree.q < 0.0);
        assert!(close(tree.p + tree.q, 1.0));
        assert!(close(tree.p * tree.up + tree.q * tree.down, 1.0 / tree.discount));
    }

    #[test]
    fn test_vanishing_volatility_falls_back_to_forward() {
        let tree = BinomialTree::new(&LatticeParams::new(1.0, 1.0, 0.02, 1e-300)).unwrap();
        assert_eq!((tree.p, tree.q), (1.0, 0.0));
        assert_eq!(tree.up, tree.down);
        assert_eq!(tree.retreat, tree.discount);
    }
}
