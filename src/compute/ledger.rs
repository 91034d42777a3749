//! ledger.rs
//! Operand values seen by the elementwise kernels.

use std::sync::Arc;

/// A lattice-wide vector. Shared, never mutated once produced.
pub type Series = Arc<Vec<f64>>;

/// The atomic unit of data in the kernels.
/// Constants stay scalar and are broadcast lazily, without allocation.
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(f64),
    Series(Series),
}

impl Value {
    /// `None` for a scalar, which fits any width.
    pub fn len(&self) -> Option<usize> {
        match self { Value::Scalar(_) => None, Value::Series(v) => Some(v.len()) }
    }

    #[inline(always)]
    pub fn get_at(&self, i: usize) -> f64 {
        match self {
            Value::Scalar(s) => *s,
            Value::Series(vec) => vec[i],
        }
    }

    pub fn to_vec(&self, width: usize) -> Vec<f64> {
        match self { Value::Scalar(s) => vec![*s; width], Value::Series(s) => s.to_vec() }
    }
}
