use crate::compute::ledger::{Series, Value};
use crate::error::{PricingError, Result};
use crate::store::Combinator;
use std::sync::Arc;
use wide::f64x4;

/// Applies `op` across `operands`, left to right, producing a vector of `width`.
///
/// Both evolution realizations call this, which keeps their outputs bitwise identical.
pub fn combine(op: Combinator, operands: &[Value], width: usize) -> Result<Series> {
    let (first, rest) = operands.split_first().ok_or_else(|| PricingError::Malformed {
        msg: format!("{} applied to no operands", op.name()),
    })?;
    for operand in operands {
        if let Some(len) = operand.len() {
            if len != width {
                return Err(PricingError::ShapeMismatch {
                    msg: format!("{} operand has length {}, lattice level has {}", op.name(), len, width),
                });
            }
        }
    }

    let mut out = first.to_vec(width);
    for operand in rest {
        match op {
            Combinator::Sum => {
                for (i, acc) in out.iter_mut().enumerate() { *acc += operand.get_at(i); }
            }
            Combinator::Max => {
                for (i, acc) in out.iter_mut().enumerate() { *acc = maximum(*acc, operand.get_at(i)); }
            }
        }
    }
    Ok(Arc::new(out))
}

/// Elementwise maximum that propagates NaN, unlike `f64::max`.
#[inline(always)]
fn maximum(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else if b > a {
        b
    } else {
        a
    }
}

/// Discounted expectation one lattice level back: `z * (p * v[1:] + q * v[:-1])`.
pub fn rollback(values: &[f64], p: f64, q: f64, z: f64) -> Vec<f64> {
    let len = values.len().saturating_sub(1);
    let mut out = Vec::with_capacity(len);

    let (vp, vq, vz) = (f64x4::splat(p), f64x4::splat(q), f64x4::splat(z));
    let mut i = 0;
    while i + 4 <= len {
        let up = f64x4::from([values[i + 1], values[i + 2], values[i + 3], values[i + 4]]);
        let down = f64x4::from([values[i], values[i + 1], values[i + 2], values[i + 3]]);
        out.extend_from_slice(&(vz * (vp * up + vq * down)).to_array());
        i += 4;
    }
    // Scalar tail
    for j in i..len {
        out.push(z * (p * values[j + 1] + q * values[j]));
    }
    out
}

/// Prices one lattice level back: every node but the top, scaled by `factor`.
pub fn retreat(prices: &[f64], factor: f64) -> Vec<f64> {
    let len = prices.len().saturating_sub(1);
    prices[..len].iter().map(|x| factor * x).collect()
}
