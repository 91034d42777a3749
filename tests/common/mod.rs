//! Closed-form oracle and contract fixtures shared by the integration tests.
#![allow(dead_code)]

use pecunia_core::{ContractGraph, NodeId, Operand};

/// Abramowitz & Stegun 7.1.26; absolute error below 1.5e-7.
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t * (0.254_829_592 + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

fn ncdf(x: f64) -> f64 {
    (1.0 + erf(x * std::f64::consts::FRAC_1_SQRT_2)) * 0.5
}

/// Black–Scholes price of a European call.
pub fn black_scholes(years_to_expiration: f64, strike: f64, spot: f64, rate_of_return: f64, volatility: f64) -> f64 {
    let rt = rate_of_return * years_to_expiration;
    let sigma_t = volatility * years_to_expiration.sqrt();
    let z = (-rt).exp();
    if sigma_t.abs() < 1e-12 {
        return (spot - strike * z).max(0.0);
    }
    let d1 = ((spot / strike).ln() + rt) / sigma_t + sigma_t * 0.5;
    spot * ncdf(d1) - strike * z * ncdf(d1 - sigma_t)
}

pub fn zero_coupon_bond(expiry: f64) -> (ContractGraph, NodeId) {
    let mut graph = ContractGraph::new();
    let root = graph.anchor(expiry).unwrap();
    (graph, root)
}

/// `Max(Sum(At(expiry), -strike), 0)`
pub fn european_call(expiry: f64, strike: f64) -> (ContractGraph, NodeId) {
    let mut graph = ContractGraph::new();
    let spot = graph.anchor(expiry).unwrap();
    let payoff = graph.sum([Operand::Node(spot), Operand::Constant(-strike)]).unwrap();
    let root = graph.max([Operand::Node(payoff), Operand::Constant(0.0)]).unwrap();
    (graph, root)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn assert_rel_close(actual: f64, expected: f64, rel: f64) {
    let tol = rel * expected.abs().max(1e-12);
    assert!(
        (actual - expected).abs() <= tol,
        "actual={} expected={} rel_err={}",
        actual,
        expected,
        (actual - expected).abs() / expected.abs()
    );
}
